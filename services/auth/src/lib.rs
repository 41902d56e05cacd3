//! Ride Ledger auth: password hashing, session tokens, the credential
//! store and the role policy shared by every HTTP route.

pub mod config;
pub mod error;
pub mod jwt;
pub mod models;
pub mod password;
pub mod policy;
pub mod rate_limiter;
pub mod repositories;
pub mod service;
pub mod validation;

pub use config::AuthConfig;
pub use error::{AuthError, AuthResult};
pub use jwt::{Identity, JwtService};
pub use models::{Role, User, UserProfile, UserSummary};
pub use policy::{Access, Operation};
pub use repositories::{MemoryUserRepository, PgUserRepository, UserRepository};
pub use service::{AuthService, LoginOutput, RegisterInput};
