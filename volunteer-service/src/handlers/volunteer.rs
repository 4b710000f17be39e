//! Volunteer handlers: list, attach, delete, and phone lookup.

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
};
use uuid::Uuid;
use validator::Validate;

use crate::dtos::volunteer::{
    CheckUserRequest, CheckUserResponse, CreateVolunteerRequest, VolunteerResponse,
};
use crate::middleware::auth::AuthAccount;
use crate::AppState;
use relief_core::error::AppError;

/// GET /volunteers
pub async fn list_volunteers(
    State(state): State<AppState>,
) -> Result<Json<Vec<VolunteerResponse>>, AppError> {
    let volunteers = state
        .store
        .list_volunteers()
        .await
        .map_err(AppError::DatabaseError)?;
    Ok(Json(volunteers.into_iter().map(Into::into).collect()))
}

/// POST /volunteers
///
/// The volunteer record is attached to the caller's own account, taken
/// from the access token's subject claim.
pub async fn create_volunteer(
    State(state): State<AppState>,
    AuthAccount(claims): AuthAccount,
    Json(req): Json<CreateVolunteerRequest>,
) -> Result<(StatusCode, Json<VolunteerResponse>), AppError> {
    req.validate()?;

    let account_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| AppError::AuthError(anyhow::anyhow!("Invalid subject claim")))?;

    let volunteer = state
        .auth_service
        .attach_volunteer(account_id, req.location, req.availability, req.task)
        .await?;
    Ok((StatusCode::CREATED, Json(volunteer.into())))
}

/// DELETE /volunteers/:id
pub async fn delete_volunteer(
    State(state): State<AppState>,
    Path(volunteer_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let deleted = state
        .store
        .delete_volunteer(volunteer_id)
        .await
        .map_err(AppError::DatabaseError)?;

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(anyhow::anyhow!("Volunteer not found")))
    }
}

/// POST /check_user
pub async fn check_user(
    State(state): State<AppState>,
    Json(req): Json<CheckUserRequest>,
) -> Result<Json<CheckUserResponse>, AppError> {
    req.validate()?;

    let exists = state
        .store
        .volunteer_exists_by_phone(&req.phone_number)
        .await
        .map_err(AppError::DatabaseError)?;
    Ok(Json(CheckUserResponse { exists }))
}
