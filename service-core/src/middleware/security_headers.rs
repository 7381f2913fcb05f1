use axum::{extract::Request, http::header, middleware::Next, response::IntoResponse};

const API_CSP: &str = "default-src 'none'; frame-ancestors 'none'";

pub async fn security_headers_middleware(req: Request, next: Next) -> impl IntoResponse {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        header::HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        header::X_XSS_PROTECTION,
        header::HeaderValue::from_static("0"),
    );
    headers.insert(
        header::STRICT_TRANSPORT_SECURITY,
        header::HeaderValue::from_static("max-age=31536000; includeSubDomains"),
    );
    headers.insert(
        header::REFERRER_POLICY,
        header::HeaderValue::from_static("no-referrer"),
    );
    headers.insert(
        header::X_FRAME_OPTIONS,
        header::HeaderValue::from_static("DENY"),
    );

    // Handlers that render HTML (the federated sign-in popup) set their own policy.
    if !headers.contains_key(header::CONTENT_SECURITY_POLICY) {
        headers.insert(
            header::CONTENT_SECURITY_POLICY,
            header::HeaderValue::from_static(API_CSP),
        );
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request as HttpRequest, middleware::from_fn, routing::get, Router};
    use tower::util::ServiceExt;

    #[tokio::test]
    async fn keeps_handler_csp() -> anyhow::Result<()> {
        let app = Router::new()
            .route(
                "/html",
                get(|| async {
                    (
                        [(header::CONTENT_SECURITY_POLICY, "script-src 'unsafe-inline'")],
                        "<p>hi</p>",
                    )
                }),
            )
            .route("/json", get(|| async { "{}" }))
            .layer(from_fn(security_headers_middleware));

        let res = app
            .clone()
            .oneshot(HttpRequest::builder().uri("/html").body(Body::empty())?)
            .await?;
        assert_eq!(
            res.headers()[header::CONTENT_SECURITY_POLICY],
            "script-src 'unsafe-inline'"
        );

        let res = app
            .oneshot(HttpRequest::builder().uri("/json").body(Body::empty())?)
            .await?;
        assert_eq!(res.headers()[header::CONTENT_SECURITY_POLICY], API_CSP);
        assert_eq!(res.headers()[header::X_FRAME_OPTIONS], "DENY");
        Ok(())
    }
}
