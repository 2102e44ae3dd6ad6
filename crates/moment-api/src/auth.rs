//! Session gate for the moderation dashboard.
//!
//! Single shared operator password, no per-user accounts — a deliberately
//! narrow capability, not a general auth system.

use axum::{Json, extract::State};
use axum_extra::extract::cookie::CookieJar;
use tracing::{error, info, warn};

use moment_intake::compare::constant_time_eq;
use moment_types::api::{AuthCheckResponse, LoginRequest, LoginResponse};

use crate::AppState;
use crate::error::ApiError;
use crate::session::{self, SESSION_COOKIE, SESSION_HASH_COOKIE};

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), ApiError> {
    let Some(expected) = state.config.dashboard_password.as_deref() else {
        error!("Dashboard password is not configured; refusing all logins");
        return Err(ApiError::Misconfigured);
    };

    if req.password.is_empty() {
        return Err(ApiError::Validation("Password is required".into()));
    }

    if !constant_time_eq(req.password.as_bytes(), expected.as_bytes()) {
        warn!("Dashboard login failed");
        return Err(ApiError::Unauthorized);
    }

    let token = session::generate_token();
    let digest = session::token_digest(&token);
    let secure = state.config.secure_cookies;
    let jar = jar
        .add(session::session_cookie(SESSION_COOKIE, token, secure))
        .add(session::session_cookie(SESSION_HASH_COOKIE, digest, secure));

    info!("Dashboard session issued");
    Ok((jar, Json(LoginResponse { success: true })))
}

pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<LoginResponse>) {
    let secure = state.config.secure_cookies;
    let jar = jar
        .add(session::expired_cookie(SESSION_COOKIE, secure))
        .add(session::expired_cookie(SESSION_HASH_COOKIE, secure));
    (jar, Json(LoginResponse { success: true }))
}

/// Always 200 with a boolean — callers treat "unauthenticated" uniformly.
pub async fn check(jar: CookieJar) -> Json<AuthCheckResponse> {
    Json(AuthCheckResponse {
        authenticated: session::is_authenticated(&jar),
    })
}
