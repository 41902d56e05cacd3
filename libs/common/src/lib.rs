//! Common library for the Ride Ledger services
//!
//! This crate provides the PostgreSQL connection handle, the embedded
//! schema migrations and the storage error type shared by the auth and
//! API crates.
//!
//! ```rust,no_run
//! use common::database::{Database, DatabaseConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DatabaseConfig::from_env()?;
//!     let database = Database::open(&config).await?;
//!     database.migrate().await?;
//!     println!("Database status: {}", database.status().label());
//!     database.close().await;
//!     Ok(())
//! }
//! ```

pub mod database;
pub mod error;

pub use database::{ConnectionStatus, Database, DatabaseConfig};
pub use error::{DatabaseError, DatabaseResult};
