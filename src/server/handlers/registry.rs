//! Listing of classified documents.

use axum::{extract::State, response::IntoResponse, Json};
use serde::Serialize;

use super::super::AppState;
use crate::models::DocumentView;

/// Listing response.
#[derive(Debug, Serialize)]
pub struct DocumentsResponse {
    pub docs: Vec<DocumentView>,
}

/// All classified documents in upload order.
pub async fn list_documents(State(state): State<AppState>) -> impl IntoResponse {
    Json(DocumentsResponse {
        docs: state.registry.list_all().await,
    })
}
