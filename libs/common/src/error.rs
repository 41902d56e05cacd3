//! Custom error types for the common library
//!
//! This module defines the storage error type shared by every repository
//! in the Ride Ledger services.

use sqlx::Error as SqlxError;
use sqlx::migrate::MigrateError;
use thiserror::Error;

/// Custom error type for database operations
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error occurred during database connection
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// Error occurred during database query execution
    #[error("Database query error: {0}")]
    Query(#[source] SqlxError),

    /// Error occurred during database migration
    #[error("Database migration error: {0}")]
    Migration(#[source] MigrateError),

    /// Configuration error
    #[error("Database configuration error: {0}")]
    Configuration(String),

    /// A unique constraint rejected the write
    #[error("Duplicate value: {0}")]
    Conflict(String),

    /// The connection handle was closed before the operation ran
    #[error("Database connection is closed")]
    Closed,
}

impl DatabaseError {
    /// Classify a query error, surfacing unique violations as [`DatabaseError::Conflict`].
    pub fn from_query(err: SqlxError) -> Self {
        match &err {
            SqlxError::Database(db_err) if db_err.is_unique_violation() => {
                DatabaseError::Conflict(db_err.message().to_string())
            }
            SqlxError::PoolClosed => DatabaseError::Closed,
            _ => DatabaseError::Query(err),
        }
    }
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_closed_maps_to_closed() {
        assert!(matches!(
            DatabaseError::from_query(SqlxError::PoolClosed),
            DatabaseError::Closed
        ));
    }

    #[test]
    fn row_not_found_stays_a_query_error() {
        assert!(matches!(
            DatabaseError::from_query(SqlxError::RowNotFound),
            DatabaseError::Query(_)
        ));
    }
}
