use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use moment_types::api::ErrorResponse;

/// Error taxonomy for the JSON endpoints. Messages are short and
/// user-actionable; store internals never appear in a response body — the
/// detail goes to the log at the point of failure.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    /// Sanitization emptied the field — the entire input was disallowed.
    #[error("{0}")]
    ContentRejected(String),
    #[error("Too many submissions from this address. Please try again in an hour.")]
    RateLimited,
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Message not found")]
    NotFound,
    #[error("Server configuration error")]
    Misconfigured,
    #[error("Something went wrong. Please try again.")]
    Persistence,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::ContentRejected(_) => StatusCode::BAD_REQUEST,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Misconfigured | ApiError::Persistence => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status(),
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        tracing::error!("storage error: {:#}", err);
        ApiError::Persistence
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_match_the_taxonomy() {
        assert_eq!(ApiError::Validation("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::ContentRejected("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::RateLimited.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(ApiError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::Misconfigured.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ApiError::Persistence.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn persistence_error_hides_backend_detail() {
        let err: ApiError = anyhow::anyhow!("sqlite disk I/O error at /var/db").into();
        assert!(!err.to_string().contains("sqlite"));
        assert!(!err.to_string().contains("/var/db"));
    }
}
