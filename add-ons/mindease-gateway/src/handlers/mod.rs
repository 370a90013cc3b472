//! HTTP handlers. Error bodies use the `{status: "error", error}` envelope the chat UI reads.

pub mod chat;
pub mod pages;
pub mod thoughts;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Client input rejected before any work is done.
    #[error("{0}")]
    Validation(&'static str),
    /// Anything that went wrong after validation; the message is safe to show users.
    #[error("{0}")]
    Internal(&'static str),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (
            status,
            Json(json!({ "status": "error", "error": self.to_string() })),
        )
            .into_response()
    }
}
