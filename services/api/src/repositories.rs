//! Repositories for database operations

pub mod ride;

pub use ride::{MemoryRideRepository, PgRideRepository, RideRepository};
