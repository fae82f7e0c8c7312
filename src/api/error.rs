// src/api/error.rs
// Centralized error-to-response mapping. External messages stay short and
// polite; internal causes go to the logs only.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;
use tracing::error;

use crate::chat::ChatError;

#[derive(Debug)]
pub struct ApiError {
    pub message: String,
    pub status_code: StatusCode,
}

impl ApiError {
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code: StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code: StatusCode::BAD_REQUEST,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code: StatusCode::NOT_FOUND,
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code: StatusCode::UNAUTHORIZED,
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code: StatusCode::FORBIDDEN,
        }
    }

    pub fn too_many_requests(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code: StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": true,
            "message": self.message,
            "status": self.status_code.as_u16(),
        });
        (self.status_code, Json(body)).into_response()
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::Validation(msg) => ApiError::bad_request(msg),
            // 404 for both missing and unowned: existence of another
            // user's session is never confirmed.
            ChatError::NotFound => ApiError::not_found("Conversation not found"),
            ChatError::Persistence(cause) => {
                error!("Persistence failure: {}", cause);
                ApiError::internal("Something went wrong saving your conversation. Please try again.")
            }
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        error!("Database error: {}", err);
        ApiError::internal("Something went wrong. Please try again.")
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_errors_map_to_expected_statuses() {
        let e: ApiError = ChatError::Validation("empty".into()).into();
        assert_eq!(e.status_code, StatusCode::BAD_REQUEST);

        let e: ApiError = ChatError::NotFound.into();
        assert_eq!(e.status_code, StatusCode::NOT_FOUND);
    }

    #[test]
    fn persistence_failures_hide_internal_detail() {
        let e: ApiError = ChatError::Persistence(sqlx::Error::PoolClosed).into();
        assert_eq!(e.status_code, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!e.message.to_lowercase().contains("pool"));
    }
}
