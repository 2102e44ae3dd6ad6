use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Message;

// -- Submission --

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    pub name: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    pub message: String,
    /// Honeypot field. Hidden on the real form; any non-empty value marks
    /// the submission as automated.
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub wants_updates: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub success: bool,
    pub message: String,
}

// -- Session --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct AuthCheckResponse {
    pub authenticated: bool,
}

// -- Moderation --

/// `status` stays a plain string here so an unknown value reaches the
/// handler and gets the documented invalid-status 400 instead of a
/// deserialization failure.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateStatusRequest {
    pub id: Uuid,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct MessageListResponse {
    pub messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
pub struct UpdatedMessageResponse {
    pub message: Message,
}

// -- Public feed --

/// Public projection of an approved message. No identity hash, no status —
/// nothing a visitor should not see.
#[derive(Debug, Clone, Serialize)]
pub struct FeedMessage {
    pub id: Uuid,
    pub content: String,
    pub approved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct FeedResponse {
    pub messages: Vec<FeedMessage>,
}

// -- Errors --

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
