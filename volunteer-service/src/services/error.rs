use relief_core::error::AppError;
use thiserror::Error;

/// Per-request outcomes of the auth/OTP core. Nothing here is fatal to
/// the process, and nothing is retried internally.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Storage error: {0}")]
    Store(anyhow::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Username already taken")]
    UsernameTaken,

    #[error("Account not verified")]
    NotVerified,

    #[error("Account not found")]
    AccountNotFound,

    #[error("OTP not found")]
    OtpNotFound,

    #[error("OTP has expired")]
    OtpExpired,

    #[error("Maximum OTP attempts exceeded")]
    OtpAttemptsExceeded,

    #[error("Invalid OTP")]
    OtpMismatch,

    #[error("Failed to send OTP: {0}")]
    Delivery(String),

    #[error("Refresh token is required")]
    MissingToken,

    #[error("Invalid or expired token")]
    TokenInvalid,

    #[error("Already registered as a volunteer")]
    VolunteerExists,

    #[error("Volunteer not found")]
    VolunteerNotFound,
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Store(e) => AppError::DatabaseError(e),
            ServiceError::Internal(e) => AppError::InternalError(e),
            ServiceError::Validation(msg) => AppError::BadRequest(anyhow::anyhow!(msg)),
            // Deliberately one message for unknown username and wrong secret.
            ServiceError::InvalidCredentials => {
                AppError::AuthError(anyhow::anyhow!("Invalid credentials"))
            }
            ServiceError::UsernameTaken => {
                AppError::Conflict(anyhow::anyhow!("Username already taken"))
            }
            ServiceError::NotVerified => AppError::BadRequest(anyhow::anyhow!("Account not verified")),
            ServiceError::AccountNotFound => {
                AppError::NotFound(anyhow::anyhow!("Account not found"))
            }
            ServiceError::OtpNotFound => AppError::NotFound(anyhow::anyhow!("OTP not found")),
            ServiceError::OtpExpired => AppError::BadRequest(anyhow::anyhow!("OTP has expired")),
            ServiceError::OtpAttemptsExceeded => {
                AppError::BadRequest(anyhow::anyhow!("Maximum OTP attempts exceeded"))
            }
            ServiceError::OtpMismatch => AppError::BadRequest(anyhow::anyhow!("Invalid OTP")),
            ServiceError::Delivery(msg) => AppError::DeliveryError(msg),
            ServiceError::MissingToken => {
                AppError::BadRequest(anyhow::anyhow!("Refresh token is required"))
            }
            ServiceError::TokenInvalid => {
                AppError::BadRequest(anyhow::anyhow!("Invalid or expired token"))
            }
            ServiceError::VolunteerExists => {
                AppError::BadRequest(anyhow::anyhow!("Already registered as a volunteer"))
            }
            ServiceError::VolunteerNotFound => {
                AppError::NotFound(anyhow::anyhow!("Volunteer not found"))
            }
        }
    }
}
