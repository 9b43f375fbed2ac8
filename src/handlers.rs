pub mod auth_handlers;
pub mod category_handlers;
pub mod expense_handlers;
pub mod push_handlers;
pub mod reminder_handlers;

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::ValidationErrors;

use crate::validation::validation_message;

/// Error response structure
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: &str, message: &str) -> Self {
        Self {
            error: error.to_string(),
            message: message.to_string(),
        }
    }

    pub fn with_status(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}

/// 400 listing every failed field
pub fn validation_error(errors: &ValidationErrors) -> Response {
    ErrorResponse::new("validation_error", &validation_message(errors))
        .with_status(StatusCode::BAD_REQUEST)
}

/// Malformed or mistyped JSON bodies are reported as 400 rather than axum's 422
pub fn invalid_body(rejection: JsonRejection) -> Response {
    ErrorResponse::new("invalid_body", &rejection.body_text()).with_status(StatusCode::BAD_REQUEST)
}
