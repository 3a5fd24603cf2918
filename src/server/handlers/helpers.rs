//! Helper types and utility functions for handlers.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Body carrying only a human-readable message.
#[derive(Debug, Serialize)]
pub struct MessageBody {
    pub message: String,
}

/// `{"message": ...}` with the given status.
pub fn message_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(MessageBody {
            message: message.into(),
        }),
    )
        .into_response()
}
