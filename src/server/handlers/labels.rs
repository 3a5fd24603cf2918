//! Label correction endpoint.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use super::super::AppState;
use super::helpers::message_response;
use crate::models::DocumentView;
use crate::services::{LabelError, LabelRequest};

/// Successful correction response.
#[derive(Debug, Serialize)]
pub struct UpdateLabelResponse {
    pub message: &'static str,
    pub document: DocumentView,
}

/// Overwrite a document's category and subcategory.
pub async fn update_label(
    State(state): State<AppState>,
    body: Result<Json<LabelRequest>, JsonRejection>,
) -> Response {
    // An unreadable body is treated as one with no fields.
    let request = body.map(|Json(r)| r).unwrap_or_default();

    match state.labels.correct(&request).await {
        Ok(document) => Json(UpdateLabelResponse {
            message: "Document updated successfully.",
            document,
        })
        .into_response(),
        Err(e @ LabelError::Validation(_)) => {
            message_response(StatusCode::BAD_REQUEST, e.to_string())
        }
        Err(e @ LabelError::NotFound) => message_response(StatusCode::NOT_FOUND, e.to_string()),
    }
}
