use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{Request, State},
    http::HeaderValue,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::api::ApiError;

/// Newtype wrapping a request ID string, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

#[derive(Debug, Clone)]
struct RateLimitWindow {
    started_at: Instant,
    count: usize,
}

/// Fixed-window limiter shared by every request on the routes it guards.
#[derive(Debug, Clone)]
pub struct RateLimitState {
    max_requests: usize,
    window: Duration,
    state: Arc<Mutex<RateLimitWindow>>,
}

impl RateLimitState {
    #[must_use]
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            state: Arc::new(Mutex::new(RateLimitWindow {
                started_at: Instant::now(),
                count: 0,
            })),
        }
    }
}

/// Axum middleware that extracts or generates a request ID.
///
/// If the incoming request has an `x-request-id` header, that value is used.
/// Otherwise a new `UUIDv4` is generated. The ID is inserted into request
/// extensions as [`RequestId`] and echoed on the response.
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.trim().is_empty())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert("x-request-id", val);
    }

    res
}

/// Middleware enforcing a fixed request-per-window limit.
pub async fn enforce_rate_limit(
    State(rate_limit): State<RateLimitState>,
    req: Request,
    next: Next,
) -> Response {
    let mut window = rate_limit.state.lock().await;

    if window.started_at.elapsed() >= rate_limit.window {
        window.started_at = Instant::now();
        window.count = 0;
    }

    if window.count >= rate_limit.max_requests {
        drop(window);
        tracing::warn!(path = %req.uri().path(), "report rate limit exceeded");
        let req_id = req
            .extensions()
            .get::<RequestId>()
            .map(|id| id.0.clone())
            .unwrap_or_default();
        return ApiError::new(req_id, "rate_limited", "too many reports, try again later")
            .into_response();
    }

    window.count += 1;
    drop(window);

    next.run(req).await
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{Request as HttpRequest, StatusCode},
        routing::post,
        Router,
    };
    use tower::ServiceExt;

    use super::*;

    fn limited_app(max: usize, window: Duration) -> Router {
        Router::new()
            .route("/limited", post(|| async { "ok" }))
            .layer(axum::middleware::from_fn_with_state(
                RateLimitState::new(max, window),
                enforce_rate_limit,
            ))
            .layer(axum::middleware::from_fn(request_id))
    }

    async fn post_status(app: &Router) -> StatusCode {
        app.clone()
            .oneshot(
                HttpRequest::builder()
                    .method("POST")
                    .uri("/limited")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response")
            .status()
    }

    #[tokio::test]
    async fn rate_limit_rejects_after_max_requests() {
        let app = limited_app(2, Duration::from_secs(60));
        assert_eq!(post_status(&app).await, StatusCode::OK);
        assert_eq!(post_status(&app).await, StatusCode::OK);
        assert_eq!(post_status(&app).await, StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn rate_limited_response_uses_error_envelope() {
        let app = limited_app(0, Duration::from_secs(60));
        let response = app
            .oneshot(
                HttpRequest::builder()
                    .method("POST")
                    .uri("/limited")
                    .header("x-request-id", "req-limited")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json: serde_json::Value = serde_json::from_slice(&body).expect("json parse");
        assert_eq!(json["error"]["code"], "rate_limited");
        assert_eq!(json["meta"]["request_id"], "req-limited");
        assert!(json["meta"]["timestamp"].is_string());
    }

    #[tokio::test]
    async fn rate_limit_window_resets() {
        let app = limited_app(1, Duration::ZERO);
        assert_eq!(post_status(&app).await, StatusCode::OK);
        assert_eq!(post_status(&app).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn request_id_is_propagated_or_generated() {
        let app = limited_app(10, Duration::from_secs(60));

        let response = app
            .clone()
            .oneshot(
                HttpRequest::builder()
                    .method("POST")
                    .uri("/limited")
                    .header("x-request-id", "req-abc")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.headers()["x-request-id"], "req-abc");

        let response = app
            .oneshot(
                HttpRequest::builder()
                    .method("POST")
                    .uri("/limited")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        let generated = response.headers()["x-request-id"].to_str().expect("ascii");
        assert!(Uuid::parse_str(generated).is_ok());
    }
}
