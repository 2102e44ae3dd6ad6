pub mod auth;
pub mod error;
pub mod feed;
pub mod messages;
pub mod middleware;
pub mod ratelimit;
pub mod session;
pub mod submit;
pub mod webhook;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};

use moment_db::Database;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub config: ApiConfig,
}

/// Runtime knobs the handlers need. Every optional secret degrades to a
/// documented weaker mode when absent, never to an undocumented one.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Operator password for the moderation dashboard. Unset means login
    /// fails closed with a 500.
    pub dashboard_password: Option<String>,
    /// Shared secret for carrier webhook signature checks. Unset means the
    /// webhook runs unauthenticated and logs loudly about it.
    pub twilio_auth_token: Option<String>,
    /// Secure attribute on session cookies. On in production.
    pub secure_cookies: bool,
    pub rate_limit_max: u32,
    pub rate_limit_window_secs: i64,
    /// Bucket key used when no client IP header is present, so unidentified
    /// clients share one rate-limit bucket.
    pub rate_fallback_key: String,
}

/// Assemble the full HTTP surface. The moderation endpoints sit behind the
/// session middleware; everything else is public.
pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/submit", post(submit::submit))
        .route("/twilio-webhook", post(webhook::receive_inbound))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/check", get(auth::check))
        .route("/feed", get(feed::get_feed))
        .route("/health", get(health));

    let protected = Router::new()
        .route(
            "/messages",
            get(messages::list_messages).patch(messages::update_status),
        )
        .layer(axum::middleware::from_fn(middleware::require_session));

    public.merge(protected).with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

#[cfg(test)]
pub(crate) mod test_util {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{HeaderMap, Request, StatusCode, header};
    use tower::ServiceExt;

    pub fn test_state(password: Option<&str>, twilio_token: Option<&str>) -> AppState {
        Arc::new(AppStateInner {
            db: Database::open_in_memory().unwrap(),
            config: ApiConfig {
                dashboard_password: password.map(Into::into),
                twilio_auth_token: twilio_token.map(Into::into),
                secure_cookies: false,
                rate_limit_max: 3,
                rate_limit_window_secs: 3600,
                rate_fallback_key: "unidentified".into(),
            },
        })
    }

    pub async fn call(state: &AppState, req: Request<Body>) -> (StatusCode, HeaderMap, Vec<u8>) {
        let resp = router(state.clone()).oneshot(req).await.unwrap();
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, headers, body.to_vec())
    }

    pub async fn post_json(
        state: &AppState,
        path: &str,
        body: serde_json::Value,
        extra_headers: &[(&str, &str)],
    ) -> (StatusCode, HeaderMap, serde_json::Value) {
        let mut builder = Request::builder()
            .method("POST")
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json");
        for (name, value) in extra_headers {
            builder = builder.header(*name, *value);
        }
        let req = builder.body(Body::from(body.to_string())).unwrap();
        let (status, headers, bytes) = call(state, req).await;
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, headers, json)
    }

    pub async fn get_json(
        state: &AppState,
        path: &str,
        cookie: Option<&str>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method("GET").uri(path);
        if let Some(c) = cookie {
            builder = builder.header(header::COOKIE, c);
        }
        let req = builder.body(Body::empty()).unwrap();
        let (status, _, bytes) = call(state, req).await;
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    /// Turn the Set-Cookie headers of a login response into a Cookie header.
    pub fn cookie_header(headers: &HeaderMap) -> String {
        headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(|v| v.split(';').next())
            .collect::<Vec<_>>()
            .join("; ")
    }

    #[tokio::test]
    async fn health_is_public() {
        let state = test_state(None, None);
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let (status, _, body) = call(&state, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"ok");
    }
}
