//! Application state shared across handlers

use auth::{AuthService, UserRepository};
use common::database::Database;

use crate::config::{Settings, StorageBackend};
use crate::repositories::RideRepository;

/// Bounds every store handed to the router satisfies
pub trait Stores: Clone + Send + Sync + 'static {}

impl<T: Clone + Send + Sync + 'static> Stores for T {}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState<U, R> {
    pub auth: AuthService<U>,
    pub rides: R,
    /// Present for the PostgreSQL backend only
    pub database: Option<Database>,
    pub backend: StorageBackend,
    pub expose_internal_errors: bool,
}

impl<U, R> AppState<U, R>
where
    U: UserRepository + Stores,
    R: RideRepository + Stores,
{
    pub fn new(
        auth: AuthService<U>,
        rides: R,
        database: Option<Database>,
        settings: &Settings,
    ) -> Self {
        Self {
            auth,
            rides,
            database,
            backend: settings.storage,
            expose_internal_errors: settings.expose_internal_errors,
        }
    }
}
