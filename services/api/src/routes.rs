//! API service routes

use ::auth::UserRepository;
use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, Uri},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;
use serde_json::{Value, json};
use tracing::error;

use crate::{
    error::ApiError,
    middleware::{authorize_request, expose_internal_errors},
    repositories::RideRepository,
    state::{AppState, Stores},
};

pub mod admin;
pub mod auth;
pub mod customers;

/// Both spellings serve the record routes
pub const RECORD_PREFIXES: [&str; 2] = ["/api/customer", "/api/customers"];

/// Create the router for the API service
pub fn create_router<U, R>(state: AppState<U, R>) -> Router
where
    U: UserRepository + Stores,
    R: RideRepository + Stores,
{
    let mut router = Router::new()
        .route("/", get(index))
        .route("/health", get(health_check::<U, R>))
        .route("/api/auth/register", post(auth::register::<U, R>))
        .route("/api/auth/login", post(auth::login::<U, R>))
        .route(
            "/api/auth/change-password",
            post(auth::change_password::<U, R>),
        )
        .route("/api/auth/profile", get(auth::profile::<U, R>))
        .route("/api/admin/users", get(admin::users::<U, R>))
        .route("/api/admin/stats", get(admin::stats::<U, R>));

    for prefix in RECORD_PREFIXES {
        router = router
            .route(
                prefix,
                get(customers::list::<U, R>).post(customers::create::<U, R>),
            )
            .route(
                &format!("{prefix}/totals"),
                get(customers::totals::<U, R>),
            )
            .route(
                &format!("{prefix}/monthly"),
                get(customers::monthly::<U, R>),
            )
            .route(
                &format!("{prefix}/:id"),
                get(customers::get::<U, R>)
                    .put(customers::update::<U, R>)
                    .delete(customers::delete::<U, R>),
            );
    }

    router
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            authorize_request::<U, R>,
        ))
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            expose_internal_errors::<U, R>,
        ))
        .with_state(state)
}

/// Service index
pub async fn index() -> impl IntoResponse {
    Json(json!({
        "message": "Ride Ledger API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "auth": {
                "register": "POST /api/auth/register",
                "login": "POST /api/auth/login",
                "profile": "GET /api/auth/profile",
                "changePassword": "POST /api/auth/change-password",
            },
            "customers": {
                "list": "GET /api/customer",
                "create": "POST /api/customer",
                "get": "GET /api/customer/:id",
                "update": "PUT /api/customer/:id",
                "delete": "DELETE /api/customer/:id",
                "totals": "GET /api/customers/totals",
                "monthly": "GET /api/customers/monthly?year=YYYY",
            },
            "admin": {
                "users": "GET /api/admin/users",
                "stats": "GET /api/admin/stats",
            },
            "health": "GET /health",
        },
    }))
}

async fn database_report<U, R>(state: &AppState<U, R>) -> Result<Value, ApiError>
where
    U: UserRepository + Stores,
    R: RideRepository + Stores,
{
    let status = match &state.database {
        Some(database) => {
            if !database.health_check().await? {
                return Err(ApiError::Internal(
                    "Database did not answer the health check".into(),
                ));
            }
            database.status().label()
        }
        None => "Connected",
    };

    let customer_count = state.rides.count().await?;
    let user_count = state.auth.user_count().await?;

    Ok(json!({
        "status": status,
        "backend": state.backend.as_str(),
        "customerCount": customer_count,
        "userCount": user_count,
    }))
}

/// Health check endpoint
pub async fn health_check<U, R>(State(state): State<AppState<U, R>>) -> Response
where
    U: UserRepository + Stores,
    R: RideRepository + Stores,
{
    let timestamp = Utc::now().to_rfc3339();

    match database_report(&state).await {
        Ok(database) => Json(json!({
            "status": "OK",
            "timestamp": timestamp,
            "database": database,
        }))
        .into_response(),
        Err(err) => {
            error!("Health check failed: {}", err);
            let message = if state.expose_internal_errors {
                err.to_string()
            } else {
                err.public_message()
            };

            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "status": "ERROR",
                    "timestamp": timestamp,
                    "error": message,
                })),
            )
                .into_response()
        }
    }
}

/// 404 for anything without a route
pub async fn not_found(uri: Uri) -> impl IntoResponse {
    let path = uri
        .path_and_query()
        .map_or_else(|| uri.path().to_string(), |pq| pq.as_str().to_string());

    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "message": "Route not found",
            "path": path,
        })),
    )
}
