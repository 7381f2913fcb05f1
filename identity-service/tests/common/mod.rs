//! Shared setup for identity-service integration tests.
//!
//! Every test gets its own in-memory store and a stub identity provider, so
//! nothing here needs a running database or network access.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, Response},
    Router,
};
use http_body_util::BodyExt;
use identity_service::{
    build_router,
    config::IdentityConfig,
    models::ExternalIdentity,
    services::{IdentityProvider, InMemoryStore, PrincipalStore, ServiceError},
    AppState,
};
use service_core::config::Config;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tower::util::ServiceExt;

pub const TEST_JWT_SECRET: &str = "integration-test-jwt-secret";
pub const TEST_CLIENT_URL: &str = "http://localhost:3000";

/// Provider whose code exchange answers from a preloaded table.
#[derive(Default)]
pub struct StubProvider {
    identities: Mutex<HashMap<String, ExternalIdentity>>,
}

impl StubProvider {
    pub fn with_identity(self, code: &str, identity: ExternalIdentity) -> Self {
        self.identities
            .lock()
            .unwrap()
            .insert(code.to_string(), identity);
        self
    }
}

#[async_trait]
impl IdentityProvider for StubProvider {
    fn authorization_url(&self, state: &str) -> String {
        format!("https://provider.test/authorize?state={}", state)
    }

    async fn exchange(&self, code: &str) -> Result<ExternalIdentity, ServiceError> {
        self.identities
            .lock()
            .unwrap()
            .get(code)
            .cloned()
            .ok_or_else(|| ServiceError::Provider(format!("unknown code {}", code)))
    }
}

pub fn identity(subject: &str, name: Option<&str>, emails: &[&str]) -> ExternalIdentity {
    ExternalIdentity {
        subject: subject.to_string(),
        display_name: name.map(str::to_string),
        emails: emails.iter().map(|e| e.to_string()).collect(),
    }
}

pub fn test_config() -> IdentityConfig {
    let vars: HashMap<&str, &str> = [
        ("MONGODB_URI", "mongodb://unused"),
        ("JWT_SECRET", TEST_JWT_SECRET),
        ("SESSION_SECRET", "integration-test-session-secret"),
        ("CLIENT_URL", TEST_CLIENT_URL),
        ("LOG_LEVEL", "error"),
    ]
    .into_iter()
    .collect();

    IdentityConfig::from_lookup(Config::default(), |k| vars.get(k).map(|v| v.to_string()))
        .expect("test config should load")
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<InMemoryStore>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_provider(StubProvider::default())
    }

    pub fn with_provider(provider: StubProvider) -> Self {
        Self::with_store(Arc::new(InMemoryStore::new()), provider)
    }

    pub fn with_store(store: Arc<InMemoryStore>, provider: StubProvider) -> Self {
        let dyn_store: Arc<dyn PrincipalStore> = store.clone();
        let state = AppState::new(test_config(), dyn_store, Arc::new(provider))
            .expect("state should build");
        let router = build_router(state.clone());
        Self {
            router,
            state,
            store,
        }
    }

    pub async fn request(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    pub async fn post_json(&self, uri: &str, body: serde_json::Value) -> Response<Body> {
        self.request(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.request(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    /// Register an account holder over HTTP and return the issued token.
    pub async fn register_account_holder(&self, email: &str, password: &str) -> String {
        let response = self
            .post_json(
                "/auth/register",
                serde_json::json!({
                    "email": email,
                    "password": password,
                    "name": "Test Patient",
                }),
            )
            .await;
        assert_eq!(response.status(), 201);
        body_json(response).await["token"]
            .as_str()
            .unwrap()
            .to_string()
    }
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
