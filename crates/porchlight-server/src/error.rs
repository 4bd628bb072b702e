//! Error types for the sync server API layer.
//!
//! [`ApiError`] covers the one recoverable failure mode the mutation
//! surface has -- a malformed settings payload -- and converts into the
//! wire-exact `{"error": ...}` response body via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Errors that can occur while handling an API request.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request body was not parseable as JSON. The message is the
    /// exact string the control panel displays.
    #[error("Invalid data")]
    InvalidBody,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::InvalidBody => StatusCode::BAD_REQUEST,
        };

        let body = serde_json::json!({
            "error": self.to_string(),
        });

        (status, axum::Json(body)).into_response()
    }
}
