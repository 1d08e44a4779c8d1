use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;

use crate::domain::aggregates::CartError;
use crate::ShopError;

/// Renders as `{"error": "..."}` with the matching status code.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self { Self { status, message: msg.into() } }
    pub fn not_found(msg: impl Into<String>) -> Self { Self::new(StatusCode::NOT_FOUND, msg) }
    pub fn bad_request(msg: impl Into<String>) -> Self { Self::new(StatusCode::BAD_REQUEST, msg) }
    pub fn conflict(msg: impl Into<String>) -> Self { Self::new(StatusCode::CONFLICT, msg) }
    pub fn internal(msg: impl Into<String>) -> Self { Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg) }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<ShopError> for ApiError {
    fn from(err: ShopError) -> Self {
        match &err {
            ShopError::ProductNotFound(_) | ShopError::CategoryNotFound(_) => ApiError::not_found(err.to_string()),
            ShopError::Validation(_) | ShopError::InvalidSessionId | ShopError::MalformedSession { .. } => {
                ApiError::bad_request(err.to_string())
            }
            ShopError::Cart(CartError::NotInSession) => ApiError::conflict(err.to_string()),
            ShopError::Cart(CartError::AmountOverflow) => ApiError::bad_request(err.to_string()),
            ShopError::Database(_) => {
                tracing::error!(error = %err, "database failure");
                ApiError::internal("Database operation failed")
            }
            ShopError::Config(_) | ShopError::Serialization(_) => {
                tracing::error!(error = %err, "internal failure");
                ApiError::internal("An internal error occurred")
            }
        }
    }
}
