//! Per-client submission throttling.
//!
//! The counters live in the same store the submission would be inserted
//! into, so the check-and-record is atomic under the store's connection
//! lock and holds across every server process pointed at that store.
//! Failure semantics are fail-closed: if the counter store errors, so would
//! the insert right after it, and the caller sees a logged 500.

use axum::http::HeaderMap;
use tracing::{error, warn};

use crate::AppState;
use crate::error::ApiError;

/// Derive the rate-limit bucket key for a request: first value of
/// `x-forwarded-for`, else `x-real-ip`, else the configured fallback key.
/// Behind a misconfigured proxy every unidentified client lands in the one
/// fallback bucket.
pub fn client_key(headers: &HeaderMap, fallback: &str) -> String {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }
    if let Some(real_ip) = headers.get("x-real-ip").and_then(|v| v.to_str().ok()) {
        let real_ip = real_ip.trim();
        if !real_ip.is_empty() {
            return real_ip.to_string();
        }
    }
    fallback.to_string()
}

/// Sliding-window check: true when this submission is still within the
/// per-key budget. Allowed calls are recorded; denied ones are not.
pub async fn check(state: &AppState, key: &str) -> Result<bool, ApiError> {
    let db = state.clone();
    let key_owned = key.to_string();
    let max = state.config.rate_limit_max;
    let window = state.config.rate_limit_window_secs;
    let now = chrono::Utc::now().timestamp();

    let allowed = tokio::task::spawn_blocking(move || db.db.rate_allow(&key_owned, now, window, max))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Persistence
        })??;

    if !allowed {
        warn!("Rate limit exceeded for client key {}", key);
    }
    Ok(allowed)
}
