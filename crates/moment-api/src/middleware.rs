use axum::{extract::Request, middleware::Next, response::Response};
use axum_extra::extract::cookie::CookieJar;

use crate::error::ApiError;
use crate::session;

/// Reject unauthenticated requests before any handler — and therefore any
/// store access — runs.
pub async fn require_session(jar: CookieJar, req: Request, next: Next) -> Result<Response, ApiError> {
    if !session::is_authenticated(&jar) {
        return Err(ApiError::Unauthorized);
    }
    Ok(next.run(req).await)
}
