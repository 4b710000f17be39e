//! OTP handlers: request a code, verify a code.

use axum::extract::{Json, State};
use validator::Validate;

use crate::dtos::auth::{OtpRequestBody, OtpVerifyBody};
use crate::dtos::MessageResponse;
use crate::AppState;
use relief_core::error::AppError;

/// POST /auth/otp/request
pub async fn request_otp(
    State(state): State<AppState>,
    Json(req): Json<OtpRequestBody>,
) -> Result<Json<MessageResponse>, AppError> {
    req.validate()?;

    state.otp_service.request(&req.phone_number).await?;
    Ok(Json(MessageResponse::new("OTP sent")))
}

/// POST /auth/otp/verify
pub async fn verify_otp(
    State(state): State<AppState>,
    Json(req): Json<OtpVerifyBody>,
) -> Result<Json<MessageResponse>, AppError> {
    req.validate()?;

    state
        .otp_service
        .verify(&req.phone_number, &req.otp)
        .await?;
    Ok(Json(MessageResponse::new("Phone number verified")))
}
