//! `/api/admin` handlers. Role checks happen in the gate.

use auth::UserRepository;
use axum::{Json, extract::State, response::IntoResponse};

use crate::aggregator::compute_totals;
use crate::error::ApiResult;
use crate::models::{AdminStats, RideQuery};
use crate::repositories::RideRepository;
use crate::state::{AppState, Stores};

pub async fn users<U, R>(State(state): State<AppState<U, R>>) -> ApiResult<impl IntoResponse>
where
    U: UserRepository + Stores,
    R: RideRepository + Stores,
{
    Ok(Json(state.auth.list_users().await?))
}

pub async fn stats<U, R>(State(state): State<AppState<U, R>>) -> ApiResult<impl IntoResponse>
where
    U: UserRepository + Stores,
    R: RideRepository + Stores,
{
    let rides = state.rides.list(&RideQuery::default()).await?;
    let totals = compute_totals(&rides);
    let total_users = state.auth.user_count().await?;

    Ok(Json(AdminStats {
        total_customers: totals.count,
        total_users,
        total_amount: totals.income(),
        total_cost: totals.cost(),
        total_save: totals.save(),
        net_profit: totals.net_profit(),
        average_per_customer: totals.average_per_record(),
    }))
}
