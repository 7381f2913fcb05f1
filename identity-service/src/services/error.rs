use axum::http::StatusCode;
use service_core::error::AppError;
use thiserror::Error;

use crate::services::store::StoreError;

#[derive(Error, Debug)]
pub enum ServiceError {
    /// Unknown email, wrong password or no stored credential. Deliberately indistinguishable.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Email not provided by identity provider")]
    MissingEmail,

    #[error("Email {email} is registered as both account holder and organization")]
    ConsistencyViolation { email: String },

    #[error("Email already registered")]
    EmailAlreadyRegistered,

    #[error("Identity provider error: {0}")]
    Provider(String),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::InvalidCredentials => AppError::rejected(
                StatusCode::UNAUTHORIZED,
                "invalid_credentials",
                "Invalid credentials",
            ),
            ServiceError::MissingEmail => AppError::rejected(
                StatusCode::BAD_REQUEST,
                "missing_email",
                "Email not provided by identity provider",
            ),
            ServiceError::ConsistencyViolation { .. } => AppError::rejected(
                StatusCode::INTERNAL_SERVER_ERROR,
                "consistency_violation",
                "Account cannot be resolved",
            ),
            ServiceError::EmailAlreadyRegistered => AppError::rejected(
                StatusCode::CONFLICT,
                "email_already_registered",
                "Email already registered",
            ),
            ServiceError::Provider(msg) => AppError::BadGateway(msg),
            ServiceError::Store(e) => AppError::DatabaseError(anyhow::Error::new(e)),
            ServiceError::Internal(e) => AppError::InternalError(e),
        }
    }
}
