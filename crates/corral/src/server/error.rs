//! API error responses

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

/// Error body shared by every failing route: `{"message": ..., "status": "<code>"}`
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
    pub status: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<corral_core::Error> for ApiError {
    fn from(e: corral_core::Error) -> Self {
        let status = match &e {
            corral_core::Error::NotFound { .. } => StatusCode::NOT_FOUND,
            corral_core::Error::InvalidFilter { .. } => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!("Request failed: {}", self.message);
        }
        let body = ErrorBody {
            message: self.message,
            status: self.status.as_u16().to_string(),
        };
        (self.status, Json(body)).into_response()
    }
}
