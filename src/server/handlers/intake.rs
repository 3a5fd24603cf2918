//! Upload endpoint.

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use super::super::AppState;
use super::helpers::message_response;
use crate::models::Label;
use crate::services::IntakeError;

/// Multipart field holding the uploaded file.
const FILE_FIELD: &str = "file";

/// Successful upload response.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: &'static str,
    pub predictions: Label,
    pub id: Uuid,
}

/// Filename and bytes of the `file` field, if the form had one.
async fn read_file_field(
    mut multipart: Multipart,
) -> Result<Option<(String, Vec<u8>)>, Response> {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return Ok(None),
            Err(e) => return Err(message_response(e.status(), e.body_text())),
        };

        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        // Without a filename the part is a plain form value, not a file.
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|e| message_response(e.status(), e.body_text()))?;
        return Ok(Some((filename, bytes.to_vec())));
    }
}

/// Accept one document, classify it and register it.
pub async fn upload_document(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    // A request that is not a multipart form has no file part either.
    let upload = match multipart {
        Ok(multipart) => match read_file_field(multipart).await {
            Ok(upload) => upload,
            Err(response) => return response,
        },
        Err(_) => None,
    };

    let (filename, bytes) = match &upload {
        Some((name, bytes)) => (Some(name.as_str()), bytes.as_slice()),
        None => (None, &[][..]),
    };

    match state.intake.ingest(filename, bytes).await {
        Ok(outcome) => Json(UploadResponse {
            message: "File successfully processed and classified.",
            predictions: outcome.label,
            id: outcome.document.id,
        })
        .into_response(),
        Err(IntakeError::Validation(e)) => message_response(StatusCode::BAD_REQUEST, e.to_string()),
        Err(e) => {
            tracing::error!("Upload of {:?} failed: {}", filename, e);
            message_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error processing file: {}", e),
            )
        }
    }
}
