//! Authentication configuration.

use crate::error::AuthError;
use crate::rate_limiter::RateLimiterConfig;

/// Lifetime of a session token: 24 hours.
pub const TOKEN_VALIDITY_SECS: u64 = 24 * 60 * 60;

/// Configuration for the authentication service.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Shared HS256 secret used to sign and verify session tokens.
    pub jwt_secret: String,
    /// Session token lifetime in seconds.
    pub token_validity_secs: u64,
    /// Whether self-registration may request the `admin` role. On unless
    /// turned off.
    pub allow_admin_signup: bool,
    /// Login throttling.
    pub login_rate_limit: RateLimiterConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_validity_secs: TOKEN_VALIDITY_SECS,
            allow_admin_signup: true,
            login_rate_limit: RateLimiterConfig::default(),
        }
    }
}

impl AuthConfig {
    /// Create a new AuthConfig from environment variables
    ///
    /// # Environment Variables
    /// - `JWT_SECRET`: Token signing secret (required)
    /// - `ALLOW_ADMIN_SIGNUP`: Allow registering admins (default: true)
    /// - `LOGIN_MAX_ATTEMPTS`: Login attempts per window (default: 5)
    /// - `LOGIN_WINDOW_SECONDS`: Attempt window in seconds (default: 300)
    /// - `LOGIN_BAN_SECONDS`: Ban duration in seconds (default: 3600)
    pub fn from_env() -> Result<Self, AuthError> {
        let jwt_secret = std::env::var("JWT_SECRET")
            .map_err(|_| AuthError::Config("JWT_SECRET environment variable not set".into()))?;

        if jwt_secret.trim().is_empty() {
            return Err(AuthError::Config("JWT_SECRET must not be empty".into()));
        }

        let allow_admin_signup = std::env::var("ALLOW_ADMIN_SIGNUP")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(true);

        let defaults = RateLimiterConfig::default();
        let login_rate_limit = RateLimiterConfig {
            max_attempts: env_or("LOGIN_MAX_ATTEMPTS", defaults.max_attempts),
            window_seconds: env_or("LOGIN_WINDOW_SECONDS", defaults.window_seconds),
            ban_duration_seconds: env_or("LOGIN_BAN_SECONDS", defaults.ban_duration_seconds),
        };

        Ok(Self {
            jwt_secret,
            token_validity_secs: TOKEN_VALIDITY_SECS,
            allow_admin_signup,
            login_rate_limit,
        })
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear() {
        unsafe {
            for key in [
                "JWT_SECRET",
                "ALLOW_ADMIN_SIGNUP",
                "LOGIN_MAX_ATTEMPTS",
                "LOGIN_WINDOW_SECONDS",
                "LOGIN_BAN_SECONDS",
            ] {
                std::env::remove_var(key);
            }
        }
    }

    #[test]
    #[serial]
    fn missing_secret_is_a_config_error() {
        clear();
        assert!(matches!(AuthConfig::from_env(), Err(AuthError::Config(_))));
    }

    #[test]
    #[serial]
    fn defaults_apply_when_only_the_secret_is_set() {
        clear();
        unsafe {
            std::env::set_var("JWT_SECRET", "s3cret");
        }

        let config = AuthConfig::from_env().unwrap();
        assert_eq!(config.jwt_secret, "s3cret");
        assert_eq!(config.token_validity_secs, 86_400);
        assert!(config.allow_admin_signup);
        assert_eq!(config.login_rate_limit.max_attempts, 5);

        clear();
    }

    #[test]
    #[serial]
    fn overrides_are_read() {
        clear();
        unsafe {
            std::env::set_var("JWT_SECRET", "s3cret");
            std::env::set_var("ALLOW_ADMIN_SIGNUP", "false");
            std::env::set_var("LOGIN_MAX_ATTEMPTS", "3");
            std::env::set_var("LOGIN_BAN_SECONDS", "not-a-number");
        }

        let config = AuthConfig::from_env().unwrap();
        assert!(!config.allow_admin_signup);
        assert_eq!(config.login_rate_limit.max_attempts, 3);
        assert_eq!(config.login_rate_limit.ban_duration_seconds, 3600);

        clear();
    }
}
