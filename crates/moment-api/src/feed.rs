//! Public feed projection: approved messages only, stripped down to what a
//! visitor may see.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use tracing::error;

use moment_types::api::{FeedMessage, FeedResponse};

use crate::AppState;
use crate::error::ApiError;
use crate::messages::row_to_message;

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    50
}

pub async fn get_feed(
    State(state): State<AppState>,
    Query(query): Query<FeedQuery>,
) -> Result<Json<FeedResponse>, ApiError> {
    let limit = query.limit.min(200);
    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || db.db.list_approved(limit))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Persistence
        })??;

    let messages = rows
        .into_iter()
        .map(row_to_message)
        .map(|m| FeedMessage {
            id: m.id,
            content: m.content,
            approved_at: m.approved_at,
        })
        .collect();

    Ok(Json(FeedResponse { messages }))
}

#[cfg(test)]
mod tests {
    use crate::test_util::{cookie_header, get_json, post_json, test_state};
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use serde_json::json;

    const ID: &str = "00000000-0000-0000-0000-000000000001";

    async fn moderate(state: &crate::AppState, cookie: &str, status: &str) {
        let req = Request::builder()
            .method("PATCH")
            .uri("/messages")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::COOKIE, cookie)
            .body(Body::from(json!({"id": ID, "status": status}).to_string()))
            .unwrap();
        let (code, _, _) = crate::test_util::call(state, req).await;
        assert_eq!(code, StatusCode::OK);
    }

    #[tokio::test]
    async fn feed_tracks_moderation_and_hides_private_fields() {
        let state = test_state(Some("op-secret"), None);
        state.db.insert_message(ID, "8a59780bb8cd2ba0", "a moment").unwrap();

        // pending: not public
        let (status, body) = get_json(&state, "/feed", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["messages"].as_array().unwrap().is_empty());

        let (_, headers, _) =
            post_json(&state, "/auth/login", json!({"password": "op-secret"}), &[]).await;
        let cookie = cookie_header(&headers);

        // approved: visible, projected
        moderate(&state, &cookie, "approved").await;
        let (_, body) = get_json(&state, "/feed", None).await;
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["content"], "a moment");
        assert!(!messages[0]["approved_at"].is_null());
        // nothing a visitor should not see
        assert!(messages[0].get("identity_hash").is_none());
        assert!(messages[0].get("status").is_none());

        // hidden: gone from the feed, still in the dashboard listing
        moderate(&state, &cookie, "hidden").await;
        let (_, body) = get_json(&state, "/feed", None).await;
        assert!(body["messages"].as_array().unwrap().is_empty());

        let (_, body) = get_json(&state, "/messages", Some(&cookie)).await;
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn feed_respects_limit() {
        let state = test_state(Some("op-secret"), None);
        for i in 0..5 {
            let id = format!("00000000-0000-0000-0000-00000000000{i}");
            state.db.insert_message(&id, "h", "m").unwrap();
            state
                .db
                .update_status(&id, "approved", Some("2026-08-30T12:00:00Z"))
                .unwrap();
        }
        let (_, body) = get_json(&state, "/feed?limit=2", None).await;
        assert_eq!(body["messages"].as_array().unwrap().len(), 2);
    }
}
