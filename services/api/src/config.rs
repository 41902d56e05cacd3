//! Service settings
//!
//! Settings are layered with the `config` crate: built-in defaults, then
//! an optional `ride-ledger.toml` in the working directory, then
//! environment variables (`HOST`, `PORT`, `STORAGE`, `SEED_DEFAULT_USERS`,
//! `EXPOSE_INTERNAL_ERRORS`).

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::net::SocketAddr;

/// Where records and users are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl StorageBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageBackend::Postgres => "postgres",
            StorageBackend::Memory => "memory",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub storage: StorageBackend,
    /// Create the default admin and demo customer on startup
    pub seed_default_users: bool,
    /// Development mode: echo internal error details to clients
    pub expose_internal_errors: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 5000,
            storage: StorageBackend::Postgres,
            seed_default_users: true,
            expose_internal_errors: false,
        }
    }
}

impl Settings {
    /// Load settings from the optional config file and the environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_sources(Some("ride-ledger"))
    }

    fn from_sources(file: Option<&str>) -> Result<Self, ConfigError> {
        let defaults = Settings::default();

        let mut builder = Config::builder()
            .set_default("host", defaults.host)?
            .set_default("port", i64::from(defaults.port))?
            .set_default("storage", defaults.storage.as_str())?
            .set_default("seed_default_users", defaults.seed_default_users)?
            .set_default("expose_internal_errors", defaults.expose_internal_errors)?;

        if let Some(name) = file {
            builder = builder.add_source(File::with_name(name).required(false));
        }

        builder
            .add_source(Environment::default().try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Socket address to bind
    pub fn bind_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const KEYS: [&str; 5] = [
        "HOST",
        "PORT",
        "STORAGE",
        "SEED_DEFAULT_USERS",
        "EXPOSE_INTERNAL_ERRORS",
    ];

    fn clear() {
        unsafe {
            for key in KEYS {
                std::env::remove_var(key);
            }
        }
    }

    #[test]
    #[serial]
    fn defaults_without_environment() {
        clear();
        let settings = Settings::from_sources(None).unwrap();
        assert_eq!(settings.port, 5000);
        assert_eq!(settings.storage, StorageBackend::Postgres);
        assert!(settings.seed_default_users);
        assert!(!settings.expose_internal_errors);
        assert_eq!(settings.bind_addr().unwrap().port(), 5000);
    }

    #[test]
    #[serial]
    fn environment_overrides_defaults() {
        clear();
        unsafe {
            std::env::set_var("PORT", "8081");
            std::env::set_var("STORAGE", "memory");
            std::env::set_var("EXPOSE_INTERNAL_ERRORS", "true");
        }

        let settings = Settings::from_sources(None).unwrap();
        assert_eq!(settings.port, 8081);
        assert_eq!(settings.storage, StorageBackend::Memory);
        assert!(settings.expose_internal_errors);

        clear();
    }

    #[test]
    #[serial]
    fn unknown_storage_backend_is_rejected() {
        clear();
        unsafe {
            std::env::set_var("STORAGE", "mongodb");
        }

        assert!(Settings::from_sources(None).is_err());

        clear();
    }
}
