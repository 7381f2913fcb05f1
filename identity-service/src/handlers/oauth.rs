//! Google OAuth handlers.
//!
//! The signed `oauth_state` cookie is the only session artifact of the
//! handshake; it is dropped as soon as the callback arrives.

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, SameSite, SignedCookieJar};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::RngCore;
use serde::Deserialize;
use service_core::error::AppError;
use subtle::ConstantTimeEq;

use crate::services::IssuedToken;
use crate::AppState;

pub const STATE_COOKIE: &str = "oauth_state";
const STATE_TTL_MINUTES: i64 = 10;
const CALLBACK_CSP: &str = "default-src 'none'; script-src 'unsafe-inline'; frame-ancestors 'none'";

/// Query params from Google callback.
#[derive(Debug, Deserialize)]
pub struct GoogleCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// GET /auth/google
pub async fn google_login(
    State(state): State<AppState>,
    jar: SignedCookieJar,
) -> (SignedCookieJar, Redirect) {
    let mut nonce = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut nonce);
    let nonce = URL_SAFE_NO_PAD.encode(nonce);

    let cookie = Cookie::build((STATE_COOKIE, nonce.clone()))
        .path("/")
        .http_only(true)
        .secure(state.config.environment == crate::config::Environment::Prod)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::minutes(STATE_TTL_MINUTES));

    let url = state.provider.authorization_url(&nonce);
    (jar.add(cookie), Redirect::to(&url))
}

/// GET /auth/google/callback
#[tracing::instrument(skip_all)]
pub async fn google_callback(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Query(query): Query<GoogleCallbackQuery>,
) -> Response {
    let expected = jar.get(STATE_COOKIE).map(|c| c.value().to_string());
    let jar = jar.remove(Cookie::build(STATE_COOKIE).path("/"));

    match complete_sign_in(&state, expected, query).await {
        Ok(token) => (jar, post_message_page(&token, &state.config.security.client_url)).into_response(),
        Err(e) => (jar, e).into_response(),
    }
}

async fn complete_sign_in(
    state: &AppState,
    expected_state: Option<String>,
    query: GoogleCallbackQuery,
) -> Result<IssuedToken, AppError> {
    if let Some(error) = query.error {
        tracing::warn!(error = %error, "Google OAuth error");
        return Err(AppError::Unauthorized(anyhow::anyhow!(
            "Sign-in was cancelled or denied"
        )));
    }

    let returned_state = query
        .state
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Missing state parameter")))?;
    match expected_state {
        Some(expected) if state_matches(&expected, &returned_state) => {}
        _ => {
            tracing::warn!("OAuth state mismatch or handshake cookie missing");
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Invalid or expired sign-in attempt"
            )));
        }
    }

    let code = query
        .code
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Missing authorization code")))?;

    let identity = state.provider.exchange(&code).await?;
    let outcome = state.federation.handle_callback(identity).await?;

    Ok(outcome.token)
}

/// Page that hands the token to the window that opened the popup, restricted
/// to the configured client origin.
fn post_message_page(token: &IssuedToken, client_url: &str) -> Response {
    let message = serde_json::json!({ "token": token.token }).to_string();
    let origin = serde_json::Value::String(client_url.to_string()).to_string();

    let body = format!(
        "<!doctype html><html><body><script>\
         if (window.opener) {{ window.opener.postMessage({}, {}); }}\
         window.close();\
         </script></body></html>",
        escape_script(&message),
        escape_script(&origin),
    );

    (
        StatusCode::OK,
        [
            (header::CONTENT_SECURITY_POLICY, CALLBACK_CSP),
            (header::CACHE_CONTROL, "no-store"),
        ],
        Html(body),
    )
        .into_response()
}

fn state_matches(expected: &str, returned: &str) -> bool {
    expected.as_bytes().ct_eq(returned.as_bytes()).into()
}

fn escape_script(json: &str) -> String {
    json.replace('<', "\\u003c").replace('>', "\\u003e")
}
