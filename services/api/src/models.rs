//! API models for request and response payloads

use serde::{Deserialize, Serialize};

pub mod ride;

pub use ride::{NewRide, Ride, RideChanges, RidePayload, RideQuery, RideResponse};

/// Request for user registration
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub role: Option<String>,
    pub email: Option<String>,
    pub full_name: Option<String>,
}

/// Request for login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Request for a password change
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
}

/// Query for the monthly earnings view
#[derive(Debug, Default, Deserialize)]
pub struct MonthlyQuery {
    pub year: Option<i32>,
}

/// Response for admin statistics
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub total_customers: u64,
    pub total_users: u64,
    pub total_amount: f64,
    pub total_cost: f64,
    pub total_save: f64,
    pub net_profit: f64,
    pub average_per_customer: f64,
}
