mod common;

use axum::{body::Body, http::Request};
use common::{body_json, TestApp, TEST_JWT_SECRET};
use identity_service::services::{AccessTokenClaims, PrincipalClaims};
use identity_service::models::PrincipalKind;
use jsonwebtoken::{encode, EncodingKey, Header};

async fn get_profile(app: &TestApp, token: Option<&str>) -> axum::http::Response<Body> {
    let mut builder = Request::builder().uri("/profile");
    if let Some(token) = token {
        builder = builder.header("x-auth-token", token);
    }
    app.request(builder.body(Body::empty()).unwrap()).await
}

fn sign(claims: &AccessTokenClaims, secret: &str) -> String {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

#[tokio::test]
async fn valid_token_reaches_handler_with_principal_attached() {
    let app = TestApp::new();
    let token = app.register_account_holder("pat@example.com", "hunter22").await;
    let claims = app.state.tokens.verify(&token).unwrap();

    let response = get_profile(&app, Some(&token)).await;

    assert_eq!(response.status(), 200);
    let body = body_json(response).await;
    assert_eq!(body["msg"], "Protected route");
    assert_eq!(body["user"]["id"], claims.user.id.as_str());
    assert_eq!(body["user"]["kind"], "account_holder");
}

#[tokio::test]
async fn missing_header_is_rejected() {
    let app = TestApp::new();

    let response = get_profile(&app, None).await;

    assert_eq!(response.status(), 401);
    assert_eq!(
        body_json(response).await,
        serde_json::json!({ "msg": "No token, authorization denied" })
    );
}

#[tokio::test]
async fn garbage_token_is_rejected() {
    let app = TestApp::new();

    let response = get_profile(&app, Some("not.a.token")).await;

    assert_eq!(response.status(), 401);
    assert_eq!(body_json(response).await["msg"], "Token is not valid");
}

#[tokio::test]
async fn expired_token_is_rejected() {
    let app = TestApp::new();
    let now = chrono::Utc::now().timestamp();
    let claims = AccessTokenClaims {
        user: PrincipalClaims {
            id: "someone".to_string(),
            kind: PrincipalKind::AccountHolder,
        },
        iat: now - 4 * 24 * 60 * 60,
        exp: now - 24 * 60 * 60,
    };

    let response = get_profile(&app, Some(&sign(&claims, TEST_JWT_SECRET))).await;

    assert_eq!(response.status(), 401);
    assert_eq!(body_json(response).await["msg"], "Token is not valid");
}

#[tokio::test]
async fn token_signed_with_another_secret_is_rejected() {
    let app = TestApp::new();
    let now = chrono::Utc::now().timestamp();
    let claims = AccessTokenClaims {
        user: PrincipalClaims {
            id: "someone".to_string(),
            kind: PrincipalKind::Organization,
        },
        iat: now,
        exp: now + 60,
    };

    let response = get_profile(&app, Some(&sign(&claims, "some-other-secret"))).await;

    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn unprotected_routes_need_no_token() {
    let app = TestApp::new();

    let response = app.get("/ping").await;

    assert_eq!(response.status(), 200);
    assert_eq!(body_json(response).await["message"], "pong");
}
