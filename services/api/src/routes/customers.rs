//! Ride record handlers, mounted under `/api/customer` and
//! `/api/customers`

use auth::UserRepository;
use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{Datelike, Utc};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::aggregator::{compute_totals, year_summary};
use crate::error::{ApiError, ApiResult};
use crate::models::{MonthlyQuery, RidePayload, RideQuery, RideResponse};
use crate::repositories::RideRepository;
use crate::state::{AppState, Stores};

const NOT_FOUND: &str = "Customer not found";

/// Malformed ids are reported the same way as unknown ones
fn parse_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound(NOT_FOUND.into()))
}

pub async fn list<U, R>(
    State(state): State<AppState<U, R>>,
    query: Result<Query<RideQuery>, QueryRejection>,
) -> ApiResult<impl IntoResponse>
where
    U: UserRepository + Stores,
    R: RideRepository + Stores,
{
    let Query(query) = query?;
    let rides = state.rides.list(&query).await?;
    let rides: Vec<RideResponse> = rides.into_iter().map(RideResponse::from).collect();
    Ok(Json(rides))
}

pub async fn create<U, R>(
    State(state): State<AppState<U, R>>,
    payload: Result<Json<RidePayload>, JsonRejection>,
) -> ApiResult<impl IntoResponse>
where
    U: UserRepository + Stores,
    R: RideRepository + Stores,
{
    let Json(payload) = payload?;
    let new_ride = payload
        .into_new_ride(Utc::now())
        .map_err(ApiError::Validation)?;

    let ride = state.rides.create(new_ride).await?;
    info!("Ride record {} created", ride.id);

    Ok((StatusCode::CREATED, Json(RideResponse::from(ride))))
}

pub async fn get<U, R>(
    State(state): State<AppState<U, R>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse>
where
    U: UserRepository + Stores,
    R: RideRepository + Stores,
{
    let ride = state
        .rides
        .find_by_id(parse_id(&id)?)
        .await?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.into()))?;

    Ok(Json(RideResponse::from(ride)))
}

pub async fn update<U, R>(
    State(state): State<AppState<U, R>>,
    Path(id): Path<String>,
    payload: Result<Json<RidePayload>, JsonRejection>,
) -> ApiResult<impl IntoResponse>
where
    U: UserRepository + Stores,
    R: RideRepository + Stores,
{
    let id = parse_id(&id)?;
    let Json(payload) = payload?;
    let changes = payload.into_changes().map_err(ApiError::Validation)?;

    let ride = state
        .rides
        .update(id, changes)
        .await?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.into()))?;

    Ok(Json(RideResponse::from(ride)))
}

pub async fn delete<U, R>(
    State(state): State<AppState<U, R>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse>
where
    U: UserRepository + Stores,
    R: RideRepository + Stores,
{
    let ride = state
        .rides
        .delete(parse_id(&id)?)
        .await?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.into()))?;

    info!("Ride record {} deleted", ride.id);

    Ok(Json(json!({
        "message": "Customer deleted successfully",
        "customer": RideResponse::from(ride),
    })))
}

pub async fn totals<U, R>(State(state): State<AppState<U, R>>) -> ApiResult<impl IntoResponse>
where
    U: UserRepository + Stores,
    R: RideRepository + Stores,
{
    let rides = state.rides.list(&RideQuery::default()).await?;
    Ok(Json(compute_totals(&rides)))
}

pub async fn monthly<U, R>(
    State(state): State<AppState<U, R>>,
    query: Result<Query<MonthlyQuery>, QueryRejection>,
) -> ApiResult<impl IntoResponse>
where
    U: UserRepository + Stores,
    R: RideRepository + Stores,
{
    let Query(query) = query?;
    let year = query.year.unwrap_or_else(|| Utc::now().year());

    let rides = state.rides.list(&RideQuery::default()).await?;
    Ok(Json(year_summary(&rides, year)))
}
