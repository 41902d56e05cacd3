//! Repositories for credential storage

pub mod user;

pub use user::{MemoryUserRepository, PgUserRepository, UserRepository};
