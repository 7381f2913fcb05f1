pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use axum::{
    extract::{FromRef, State},
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::Key;
use secrecy::ExposeSecret;
use service_core::error::AppError;
use service_core::middleware::{
    security_headers::security_headers_middleware, tracing::request_id_middleware,
};
use sha2::{Digest, Sha512};
use std::sync::Arc;
use std::time::Instant;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::IdentityConfig;
use crate::services::{
    CredentialAuthenticator, FederatedSignIn, IdentityProvider, IdentityResolver, PrincipalStore,
    TokenService,
};

#[derive(Clone)]
pub struct AppState {
    pub config: IdentityConfig,
    pub resolver: IdentityResolver,
    pub tokens: TokenService,
    pub authenticator: CredentialAuthenticator,
    pub federation: FederatedSignIn,
    pub provider: Arc<dyn IdentityProvider>,
    pub cookie_key: Key,
    pub started_at: Instant,
}

impl AppState {
    /// Wire every component from the immutable config and the two seams.
    pub fn new(
        config: IdentityConfig,
        store: Arc<dyn PrincipalStore>,
        provider: Arc<dyn IdentityProvider>,
    ) -> Result<Self, AppError> {
        let tokens =
            TokenService::new(config.jwt.secret.expose_secret()).map_err(AppError::ConfigError)?;
        let resolver = IdentityResolver::new(store);
        let authenticator = CredentialAuthenticator::new(resolver.clone(), tokens.clone());
        let federation = FederatedSignIn::new(resolver.clone(), tokens.clone());
        // Key needs 64 bytes; derive them so any non-empty secret works.
        let cookie_key = Key::from(&Sha512::digest(
            config.session.secret.expose_secret().as_bytes(),
        ));

        Ok(Self {
            config,
            resolver,
            tokens,
            authenticator,
            federation,
            provider,
            cookie_key,
            started_at: Instant::now(),
        })
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/profile", get(handlers::profile::profile))
        .layer(from_fn_with_state(
            state.tokens.clone(),
            middleware::auth_middleware,
        ));

    let origins = state
        .config
        .security
        .allowed_origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::error!("Invalid CORS origin '{}': {}. Skipping.", o, e);
                None
            }
        })
        .collect::<Vec<HeaderValue>>();

    Router::new()
        .route("/ping", get(ping))
        .route("/api/health", get(health_check))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/register", post(handlers::auth::register_account_holder))
        .route(
            "/hospitalapi/register",
            post(handlers::auth::register_organization),
        )
        .route("/auth/google", get(handlers::oauth::google_login))
        .route("/auth/google/callback", get(handlers::oauth::google_callback))
        .merge(protected)
        .with_state(state)
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(service_core::middleware::REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    path = %request.uri().path(),
                )
            },
        ))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([
                    header::CONTENT_TYPE,
                    HeaderName::from_static(middleware::AUTH_TOKEN_HEADER),
                ]),
        )
}

/// GET /ping
pub async fn ping() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "pong" }))
}

/// GET /api/health
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let db_ok = match state.resolver.health_check().await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!(error = %e, "Storage health check failed");
            false
        }
    };

    let status = if db_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(serde_json::json!({
            "ok": db_ok,
            "service": state.config.service_name,
            "env": format!("{:?}", state.config.environment).to_lowercase(),
            "uptime_seconds": state.started_at.elapsed().as_secs(),
            "db_state": if db_ok { "up" } else { "down" },
            "timestamp": chrono::Utc::now().to_rfc3339(),
        })),
    )
}
