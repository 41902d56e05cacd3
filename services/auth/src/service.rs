//! Authentication service: registration, login, token verification and
//! password management on top of a [`UserRepository`].

use std::net::IpAddr;

use chrono::Utc;
use common::error::DatabaseError;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::{AuthError, AuthResult};
use crate::jwt::{Identity, JwtService};
use crate::models::{NewUser, Role, User, UserProfile, UserSummary};
use crate::password;
use crate::rate_limiter::RateLimiter;
use crate::repositories::UserRepository;
use crate::validation;

/// Input for registration
#[derive(Debug, Clone, Default)]
pub struct RegisterInput {
    pub username: String,
    pub password: String,
    pub role: Option<Role>,
    pub email: Option<String>,
    pub full_name: Option<String>,
}

/// Successful login result
#[derive(Debug, Clone)]
pub struct LoginOutput {
    /// Signed session token
    pub token: String,
    pub user: UserSummary,
    /// Token lifetime in seconds
    pub expires_in: u64,
}

/// Accounts created by [`AuthService::seed_default_users`]:
/// (username, password, role, full name)
pub const DEFAULT_USERS: [(&str, &str, Role, &str); 2] = [
    ("admin", "admin123", Role::Admin, "Administrator"),
    ("customer", "customer123", Role::Customer, "Demo Customer"),
];

/// Authenticator
#[derive(Clone)]
pub struct AuthService<U> {
    users: U,
    jwt: JwtService,
    limiter: RateLimiter,
    config: AuthConfig,
}

impl<U: UserRepository> AuthService<U> {
    pub fn new(users: U, config: AuthConfig) -> AuthResult<Self> {
        let jwt = JwtService::new(&config)?;
        let limiter = RateLimiter::new(config.login_rate_limit.clone());

        Ok(Self {
            users,
            jwt,
            limiter,
            config,
        })
    }

    /// The credential store behind this service
    pub fn users(&self) -> &U {
        &self.users
    }

    /// Register a new user and return its public summary
    pub async fn register(&self, input: RegisterInput) -> AuthResult<UserSummary> {
        let username = input.username.trim().to_string();
        validation::validate_username(&username).map_err(AuthError::Validation)?;
        validation::validate_password(&input.password, "Password")
            .map_err(AuthError::Validation)?;

        let email = clean_optional(input.email);
        if let Some(email) = &email {
            validation::validate_email(email).map_err(AuthError::Validation)?;
        }

        let full_name = clean_optional(input.full_name);
        if let Some(full_name) = &full_name {
            validation::validate_full_name(full_name).map_err(AuthError::Validation)?;
        }

        let role = input.role.unwrap_or_default();
        if role.is_admin() && !self.config.allow_admin_signup {
            warn!("Rejected admin self-registration for {}", username);
            return Err(AuthError::Forbidden(
                "Admin accounts cannot be self-registered".into(),
            ));
        }

        if self.users.find_by_username(&username).await?.is_some() {
            return Err(AuthError::Conflict("Username already exists".into()));
        }

        let user = self
            .create_user(NewUser {
                username,
                password_hash: password::hash_password(&input.password)?,
                role,
                email,
                full_name,
            })
            .await?;

        info!("New user registered: {} ({})", user.username, user.role);
        Ok(UserSummary::from(&user))
    }

    async fn create_user(&self, new_user: NewUser) -> AuthResult<User> {
        // A concurrent registration can still win the unique index
        self.users.create(new_user).await.map_err(|e| match e {
            DatabaseError::Conflict(_) => AuthError::Conflict("Username already exists".into()),
            other => AuthError::Storage(other),
        })
    }

    /// Check credentials, stamp the last-login time and issue a token
    pub async fn login(&self, username: &str, password: &str) -> AuthResult<LoginOutput> {
        self.login_from(None, username, password).await
    }

    /// [`AuthService::login`] for a caller at `client`. Failed attempts
    /// are throttled per client and username.
    pub async fn login_from(
        &self,
        client: Option<IpAddr>,
        username: &str,
        password: &str,
    ) -> AuthResult<LoginOutput> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::Validation(
                "Username and password are required".into(),
            ));
        }

        let throttle_key = match client {
            Some(ip) => format!("{ip}|{username}"),
            None => format!("-|{username}"),
        };
        if self.limiter.is_blocked(&throttle_key).await {
            return Err(AuthError::RateLimited);
        }

        let user = match self.check_credentials(username, password).await? {
            Some(user) => user,
            None => {
                warn!("Login failed for {}", username);
                self.limiter.record_failure(&throttle_key).await;
                return Err(AuthError::InvalidCredentials);
            }
        };

        let now = Utc::now();
        self.users.record_login(user.id, now).await?;
        self.limiter.reset(&throttle_key).await;

        let token = self.jwt.issue(&user)?;
        info!("User logged in: {} ({})", user.username, user.role);

        Ok(LoginOutput {
            token,
            user: UserSummary::from(&user),
            expires_in: self.jwt.validity_secs(),
        })
    }

    /// The active user with this username and password, if any
    async fn check_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> AuthResult<Option<User>> {
        match self.users.find_by_username(username).await? {
            Some(user) if user.is_active => {
                Ok(password::verify_password(password, &user.password_hash)?.then_some(user))
            }
            _ => Ok(None),
        }
    }

    /// Verify a bearer token. `None` means the request carried no token.
    pub fn verify(&self, token: Option<&str>) -> AuthResult<Identity> {
        match token.map(str::trim) {
            None | Some("") => Err(AuthError::MissingToken),
            Some(token) => self.jwt.verify(token),
        }
    }

    /// Replace the password of `user_id` after checking the current one
    pub async fn change_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> AuthResult<()> {
        if current_password.is_empty() || new_password.is_empty() {
            return Err(AuthError::Validation(
                "Current password and new password are required".into(),
            ));
        }
        validation::validate_password(new_password, "New password")
            .map_err(AuthError::Validation)?;

        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AuthError::NotFound("User not found".into()))?;

        if !password::verify_password(current_password, &user.password_hash)? {
            return Err(AuthError::IncorrectPassword);
        }

        let hash = password::hash_password(new_password)?;
        if !self.users.update_password(user.id, &hash).await? {
            return Err(AuthError::NotFound("User not found".into()));
        }

        info!("Password changed for user: {}", user.username);
        Ok(())
    }

    pub async fn profile(&self, user_id: Uuid) -> AuthResult<UserProfile> {
        self.users
            .find_by_id(user_id)
            .await?
            .map(|user| UserProfile::from(&user))
            .ok_or_else(|| AuthError::NotFound("User not found".into()))
    }

    /// All users, newest first, without password hashes
    pub async fn list_users(&self) -> AuthResult<Vec<UserProfile>> {
        let users = self.users.list().await?;
        Ok(users.iter().map(UserProfile::from).collect())
    }

    pub async fn user_count(&self) -> AuthResult<u64> {
        Ok(self.users.count().await?)
    }

    /// Make sure the default admin and demo customer accounts exist.
    ///
    /// Returns the number of accounts created.
    pub async fn seed_default_users(&self) -> AuthResult<usize> {
        let mut created = 0;

        for (username, password, role, full_name) in DEFAULT_USERS {
            if self.users.find_by_username(username).await?.is_some() {
                continue;
            }

            self.create_user(NewUser {
                username: username.to_string(),
                password_hash: password::hash_password(password)?,
                role,
                email: None,
                full_name: Some(full_name.to_string()),
            })
            .await?;

            info!("Default {} user created (username: {})", role, username);
            created += 1;
        }

        Ok(created)
    }
}

fn clean_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
