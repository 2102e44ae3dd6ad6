//! Authenticated moderation endpoints: full listing and the status state
//! machine. The session middleware has already rejected unauthenticated
//! callers by the time these run.

use axum::{Json, extract::State};
use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::{error, warn};
use uuid::Uuid;

use moment_db::models::MessageRow;
use moment_types::api::{MessageListResponse, UpdateStatusRequest, UpdatedMessageResponse};
use moment_types::models::{Message, MessageStatus};

use crate::AppState;
use crate::error::ApiError;

/// Every message regardless of status, newest first. The identity hash is
/// included so the dashboard can group messages from one sender.
pub async fn list_messages(
    State(state): State<AppState>,
) -> Result<Json<MessageListResponse>, ApiError> {
    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || db.db.list_messages())
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Persistence
        })??;

    Ok(Json(MessageListResponse {
        messages: rows.into_iter().map(row_to_message).collect(),
    }))
}

/// Moderation state machine. Transitions to `approved` stamp `approved_at`;
/// every other target clears it — one atomic update of both columns.
/// Re-asserting the current status is a no-op success.
pub async fn update_status(
    State(state): State<AppState>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<UpdatedMessageResponse>, ApiError> {
    let status: MessageStatus = req
        .status
        .parse()
        .map_err(|_| ApiError::Validation("Invalid status".into()))?;

    let approved_at = match status {
        MessageStatus::Approved => Some(Utc::now().to_rfc3339()),
        MessageStatus::Pending | MessageStatus::Hidden => None,
    };

    let db = state.clone();
    let id = req.id.to_string();
    let row = tokio::task::spawn_blocking(move || {
        db.db.update_status(&id, status.as_str(), approved_at.as_deref())
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::Persistence
    })??
    .ok_or(ApiError::NotFound)?;

    Ok(Json(UpdatedMessageResponse {
        message: row_to_message(row),
    }))
}

/// Convert a stored row to the typed model, logging rather than failing on
/// corrupt fields. A corrupt status degrades to `hidden` so it can never
/// leak anywhere public.
pub(crate) fn row_to_message(row: MessageRow) -> Message {
    let id = row.id.parse().unwrap_or_else(|e| {
        warn!("Corrupt message id '{}': {}", row.id, e);
        Uuid::default()
    });
    let status = row.status.parse().unwrap_or_else(|_| {
        warn!("Corrupt status '{}' on message '{}'", row.status, row.id);
        MessageStatus::Hidden
    });
    let created_at = parse_store_timestamp(&row.created_at).unwrap_or_else(|| {
        warn!(
            "Corrupt created_at '{}' on message '{}'",
            row.created_at, row.id
        );
        DateTime::default()
    });
    let approved_at = row
        .approved_at
        .as_deref()
        .and_then(parse_store_timestamp);

    Message {
        id,
        identity_hash: row.identity_hash,
        content: row.content,
        status,
        created_at,
        approved_at,
    }
}

/// SQLite defaults write "YYYY-MM-DD HH:MM:SS" without a timezone; rows
/// updated by the API carry RFC 3339. Accept both as UTC.
fn parse_store_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    raw.parse::<DateTime<Utc>>().ok().or_else(|| {
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
            .ok()
            .map(|naive| naive.and_utc())
    })
}
