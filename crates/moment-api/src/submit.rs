//! Web-form submission pipeline.
//!
//! Steps run in a fixed order, each short-circuiting: honeypot → rate limit
//! → field validation → phone normalization → sanitization → identity hash →
//! insert. All validation happens before the store is touched.

use axum::{Json, extract::State, http::HeaderMap};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use moment_intake::identity::{hash_identity, hash_name};
use moment_intake::phone::normalize_phone;
use moment_intake::sanitize::{DEFAULT_MAX_LEN, NAME_MAX_LEN, sanitize, sanitize_name};
use moment_types::api::{SubmitRequest, SubmitResponse};

use crate::error::ApiError;
use crate::{AppState, ratelimit};

pub async fn submit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<SubmitRequest>,
) -> Result<Json<SubmitResponse>, ApiError> {
    // Honeypot: answer exactly like a real submission so automated clients
    // cannot tell they were detected, but persist nothing.
    if !req.website.trim().is_empty() {
        warn!("Honeypot field populated; dropping submission");
        return Ok(Json(success_response()));
    }

    let key = ratelimit::client_key(&headers, &state.config.rate_fallback_key);
    if !ratelimit::check(&state, &key).await? {
        return Err(ApiError::RateLimited);
    }

    if req.name.trim().is_empty() {
        return Err(ApiError::Validation("Name is required".into()));
    }
    if req.message.trim().is_empty() {
        return Err(ApiError::Validation("Message is required".into()));
    }
    if req.message.chars().count() > DEFAULT_MAX_LEN {
        return Err(ApiError::Validation(
            "Message must be 500 characters or less".into(),
        ));
    }

    let normalized_phone = match req.phone_number.as_deref() {
        Some(raw) if !raw.trim().is_empty() => Some(normalize_phone(raw).map_err(|_| {
            ApiError::Validation("Please enter a valid phone number".into())
        })?),
        _ => None,
    };

    let name = sanitize_name(&req.name, NAME_MAX_LEN);
    let content = sanitize(&req.message, DEFAULT_MAX_LEN);
    if name.is_empty() {
        return Err(ApiError::ContentRejected(
            "Name contains no allowed characters".into(),
        ));
    }
    if content.is_empty() {
        return Err(ApiError::ContentRejected(
            "Message contains no allowed content".into(),
        ));
    }

    let identity_hash = match normalized_phone.as_deref() {
        Some(phone) => hash_identity(phone),
        None => hash_name(&name),
    };

    if req.wants_updates == Some(true) {
        debug!("Submitter opted into updates");
    }

    let id = Uuid::new_v4();
    let db = state.clone();
    let message_id = id.to_string();
    tokio::task::spawn_blocking(move || {
        db.db.insert_message(&message_id, &identity_hash, &content)
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::Persistence
    })??;

    info!("Web submission stored: {}", id);
    Ok(Json(success_response()))
}

fn success_response() -> SubmitResponse {
    SubmitResponse {
        success: true,
        message: "Your moment has been submitted!".into(),
    }
}
