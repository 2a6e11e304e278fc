use app_error::AppResult;
use app_middleware::AuthenticatedContext;
use app_models::{AuthResponse, LoginInput, RegisterInput, UserProfile};
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};

use super::reject_body;
use crate::state::AppState;

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterInput>, JsonRejection>,
) -> AppResult<(StatusCode, Json<UserProfile>)> {
    let Json(input) = payload.map_err(reject_body)?;
    let profile = state.accounts.register(input).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginInput>, JsonRejection>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let Json(input) = payload.map_err(reject_body)?;
    let response = state.accounts.login(input).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn list_users(
    State(state): State<AppState>,
    _ctx: AuthenticatedContext,
) -> AppResult<(StatusCode, Json<Vec<UserProfile>>)> {
    let users = state.accounts.list_users().await?;
    Ok((StatusCode::OK, Json(users)))
}

pub async fn add_user(
    State(state): State<AppState>,
    ctx: AuthenticatedContext,
    payload: Result<Json<RegisterInput>, JsonRejection>,
) -> AppResult<(StatusCode, Json<UserProfile>)> {
    let Json(input) = payload.map_err(reject_body)?;
    let profile = state.accounts.add_user(&ctx, input).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

pub async fn delete_user(
    State(state): State<AppState>,
    _ctx: AuthenticatedContext,
    Path(user_id): Path<String>,
) -> AppResult<(StatusCode, Json<UserProfile>)> {
    let profile = state.accounts.delete_user_by_id(&user_id).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}
