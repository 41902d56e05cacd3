//! Password hashing and verification using Argon2id.

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};

use crate::error::AuthError;

/// Hash a plaintext password into a PHC string with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Crypto(format!("Failed to hash password: {e}")))
}

/// Verify a plaintext password against a stored PHC hash.
///
/// Returns `Ok(false)` on mismatch and `Err(AuthError::Crypto)` if the
/// stored hash is malformed.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AuthError::Crypto(format!("invalid hash format: {e}")))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::Crypto(format!("verify error: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correct_password_matches() {
        let hash = hash_password("ride-on").unwrap();
        assert!(verify_password("ride-on", &hash).unwrap());
    }

    #[test]
    fn wrong_password_does_not_match() {
        let hash = hash_password("ride-on").unwrap();
        assert!(!verify_password("ride-off", &hash).unwrap());
    }

    #[test]
    fn hash_never_equals_plaintext() {
        let hash = hash_password("ride-on").unwrap();
        assert_ne!(hash, "ride-on");
        assert!(hash.starts_with("$argon2"));
    }

    #[test]
    fn same_password_is_salted_differently() {
        let first = hash_password("ride-on").unwrap();
        let second = hash_password("ride-on").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn malformed_hash_returns_error() {
        assert!(matches!(
            verify_password("pw", "not-a-hash"),
            Err(AuthError::Crypto(_))
        ));
    }
}
