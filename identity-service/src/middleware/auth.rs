use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::{models::PrincipalKind, services::TokenService};

/// Header carrying the access token on protected requests.
pub const AUTH_TOKEN_HEADER: &str = "x-auth-token";

/// Verified principal attached to the request by [`auth_middleware`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthenticatedPrincipal {
    pub id: String,
    pub kind: PrincipalKind,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub msg: String,
}

fn unauthenticated(msg: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse {
            msg: msg.to_string(),
        }),
    )
        .into_response()
}

/// Rejects requests without a valid, unexpired token. Trusts the claims as-is;
/// no storage lookup happens here.
pub async fn auth_middleware(
    State(tokens): State<TokenService>,
    mut req: Request,
    next: Next,
) -> Response {
    // Never let a caller smuggle in a principal.
    req.extensions_mut().remove::<AuthenticatedPrincipal>();

    let token = req
        .headers()
        .get(AUTH_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty());

    let Some(token) = token else {
        return unauthenticated("No token, authorization denied");
    };

    let claims = match tokens.verify(token) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::debug!(error = %e, "Rejected access token");
            return unauthenticated("Token is not valid");
        }
    };

    req.extensions_mut().insert(AuthenticatedPrincipal {
        id: claims.user.id,
        kind: claims.user.kind,
    });

    next.run(req).await
}

/// Extractor for handlers mounted behind [`auth_middleware`].
pub struct AuthPrincipal(pub AuthenticatedPrincipal);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthPrincipal
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedPrincipal>()
            .cloned()
            .map(AuthPrincipal)
            .ok_or_else(|| unauthenticated("No token, authorization denied"))
    }
}
