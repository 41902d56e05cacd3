//! Authentication error types.

use common::error::DatabaseError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Malformed or missing input
    #[error("{0}")]
    Validation(String),

    /// Unknown user, inactive user or wrong password. The message never
    /// says which.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Access token required")]
    MissingToken,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Current password is incorrect")]
    IncorrectPassword,

    /// Authenticated, but the role does not grant the operation
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Too many login attempts, try again later")]
    RateLimited,

    #[error("cryptography error: {0}")]
    Crypto(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Storage(#[from] DatabaseError),
}

impl AuthError {
    /// True for the errors that mean "not logged in" (401 semantics)
    pub fn is_unauthenticated(&self) -> bool {
        matches!(
            self,
            AuthError::InvalidCredentials
                | AuthError::MissingToken
                | AuthError::InvalidToken
                | AuthError::IncorrectPassword
        )
    }
}

pub type AuthResult<T> = Result<T, AuthError>;
