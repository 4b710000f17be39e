//! Account and session handlers: register, login, refresh, logout.

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use validator::Validate;

use crate::dtos::auth::{LoginRequest, LogoutRequest, RefreshRequest, RegisterRequest};
use crate::dtos::MessageResponse;
use crate::models::AccountResponse;
use crate::services::{RegisterOutcome, TokenResponse};
use crate::AppState;
use relief_core::error::AppError;

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub account: AccountResponse,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub tokens: TokenResponse,
    pub account: AccountResponse,
}

/// POST /auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Response, AppError> {
    req.validate()?;

    let outcome = state
        .auth_service
        .register(&req.name, &req.username, &req.phone_number, &req.password)
        .await?;

    Ok(match outcome {
        RegisterOutcome::Created(account) => (
            StatusCode::CREATED,
            Json(RegisterResponse {
                message: "Registered. Verify your phone number to continue.".to_string(),
                account: account.sanitized(),
            }),
        )
            .into_response(),
        RegisterOutcome::AlreadyRegistered => (
            StatusCode::OK,
            Json(MessageResponse::new("Phone number already registered")),
        )
            .into_response(),
    })
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    req.validate()?;

    let (tokens, account) = state
        .auth_service
        .login(&req.username, &req.password)
        .await?;
    Ok(Json(LoginResponse {
        tokens,
        account: account.sanitized(),
    }))
}

/// POST /auth/refresh
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let tokens = state.auth_service.refresh(&req.refresh_token).await?;
    Ok(Json(tokens))
}

/// POST /auth/logout
pub async fn logout(
    State(state): State<AppState>,
    Json(req): Json<LogoutRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    state
        .auth_service
        .logout(req.refresh_token.as_deref())
        .await?;
    Ok(Json(MessageResponse::new("Logged out")))
}
