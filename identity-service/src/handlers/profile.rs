use axum::Json;
use serde::Serialize;

use crate::middleware::{AuthPrincipal, AuthenticatedPrincipal};

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub msg: &'static str,
    pub user: AuthenticatedPrincipal,
}

/// GET /profile
pub async fn profile(AuthPrincipal(user): AuthPrincipal) -> Json<ProfileResponse> {
    Json(ProfileResponse {
        msg: "Protected route",
        user,
    })
}
