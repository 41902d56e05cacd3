//! JWT service for session token issuance and verification
//!
//! Session tokens are HS256-signed and fully self-contained: verifying one
//! needs only the shared secret, never a store lookup. There is no
//! server-side session table, so a token stays valid until it expires.

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::models::{Role, User};

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: Uuid,
    /// Username at the time of issue
    pub username: String,
    /// User role
    pub role: Role,
    /// Issued at time
    pub iat: i64,
    /// Expiration time
    pub exp: i64,
}

/// Identity of an authenticated caller, derived from a verified token
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub user_id: Uuid,
    pub username: String,
    pub role: Role,
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            username: claims.username,
            role: claims.role,
        }
    }
}

/// JWT service
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    validity_secs: u64,
}

impl JwtService {
    /// Initialize a new JWT service
    pub fn new(config: &AuthConfig) -> Result<Self, AuthError> {
        if config.jwt_secret.is_empty() {
            return Err(AuthError::Config("JWT secret must not be empty".into()));
        }

        let secret = config.jwt_secret.as_bytes();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["sub", "exp", "iat"]);

        Ok(JwtService {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            validity_secs: config.token_validity_secs,
        })
    }

    /// Generate a session token for a user
    pub fn issue(&self, user: &User) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let validity = i64::try_from(self.validity_secs).unwrap_or(i64::MAX);

        self.sign(&Claims {
            sub: user.id,
            username: user.username.clone(),
            role: user.role,
            iat: now,
            exp: now.saturating_add(validity),
        })
    }

    fn sign(&self, claims: &Claims) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| AuthError::Crypto(format!("JWT encode: {e}")))
    }

    /// Validate a token and return the caller identity
    pub fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims.into())
            .map_err(|e| {
                debug!("Rejected session token: {}", e);
                AuthError::InvalidToken
            })
    }

    /// Token lifetime in seconds
    pub fn validity_secs(&self) -> u64 {
        self.validity_secs
    }
}
