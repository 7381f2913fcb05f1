//! Password login and registration handlers.

use axum::{extract::State, http::StatusCode, Json};
use service_core::error::AppError;
use validator::Validate;

use crate::dtos::{LoginRequest, RegisterAccountHolderRequest, RegisterOrganizationRequest, TokenResponse};
use crate::models::NewPrincipal;
use crate::utils::Password;
use crate::AppState;

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    req.validate()?;

    let authenticated = state
        .authenticator
        .authenticate(&req.email, Password::new(req.password))
        .await?;

    Ok(Json(authenticated.into()))
}

/// POST /auth/register
pub async fn register_account_holder(
    State(state): State<AppState>,
    Json(req): Json<RegisterAccountHolderRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), AppError> {
    req.validate()?;

    let new = NewPrincipal::from(&req);
    let authenticated = state
        .authenticator
        .register(new, Password::new(req.password))
        .await?;

    Ok((StatusCode::CREATED, Json(authenticated.into())))
}

/// POST /hospitalapi/register
pub async fn register_organization(
    State(state): State<AppState>,
    Json(req): Json<RegisterOrganizationRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), AppError> {
    req.validate()?;

    let new = NewPrincipal::from(&req);
    let authenticated = state
        .authenticator
        .register(new, Password::new(req.password))
        .await?;

    Ok((StatusCode::CREATED, Json(authenticated.into())))
}
