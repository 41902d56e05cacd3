//! `/api/auth` handlers

use std::net::SocketAddr;

use auth::{Identity, RegisterInput, Role, UserRepository};
use axum::{
    Extension, Json,
    extract::{ConnectInfo, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;

use crate::error::{ApiError, ApiResult};
use crate::models::{ChangePasswordRequest, LoginRequest, RegisterRequest};
use crate::repositories::RideRepository;
use crate::state::{AppState, Stores};

pub async fn register<U, R>(
    State(state): State<AppState<U, R>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse>
where
    U: UserRepository + Stores,
    R: RideRepository + Stores,
{
    let Json(payload) = payload?;

    let role = match payload.role.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(raw.parse::<Role>().map_err(ApiError::Validation)?),
    };

    let user = state
        .auth
        .register(RegisterInput {
            username: payload.username,
            password: payload.password,
            role,
            email: payload.email,
            full_name: payload.full_name,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User registered successfully",
            "user": user,
        })),
    ))
}

pub async fn login<U, R>(
    State(state): State<AppState<U, R>>,
    client: Option<ConnectInfo<SocketAddr>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse>
where
    U: UserRepository + Stores,
    R: RideRepository + Stores,
{
    let Json(payload) = payload?;
    let client = client.map(|ConnectInfo(addr)| addr.ip());
    let output = state
        .auth
        .login_from(client, &payload.username, &payload.password)
        .await?;

    Ok(Json(json!({
        "message": "Login successful",
        "token": output.token,
        "user": output.user,
        "expiresIn": output.expires_in,
    })))
}

pub async fn change_password<U, R>(
    State(state): State<AppState<U, R>>,
    Extension(identity): Extension<Identity>,
    payload: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse>
where
    U: UserRepository + Stores,
    R: RideRepository + Stores,
{
    let Json(payload) = payload?;
    state
        .auth
        .change_password(
            identity.user_id,
            &payload.current_password,
            &payload.new_password,
        )
        .await?;

    Ok(Json(json!({ "message": "Password changed successfully" })))
}

pub async fn profile<U, R>(
    State(state): State<AppState<U, R>>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<impl IntoResponse>
where
    U: UserRepository + Stores,
    R: RideRepository + Stores,
{
    let user = state.auth.profile(identity.user_id).await?;
    Ok(Json(json!({ "user": user })))
}
