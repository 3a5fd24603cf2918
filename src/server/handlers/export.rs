//! Cloud export endpoint.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Serialize;

use super::super::AppState;
use super::helpers::message_response;
use crate::services::{ExportError, UploadFailure, UploadSuccess};

/// At least one document was uploaded.
#[derive(Debug, Serialize)]
pub struct ExportResponse {
    pub successful_uploads: Vec<UploadSuccess>,
    pub failed_uploads: Vec<UploadFailure>,
}

/// Nothing was uploaded.
#[derive(Debug, Serialize)]
pub struct ExportFailedResponse {
    pub message: &'static str,
    pub failed_uploads: Vec<UploadFailure>,
}

/// Upload every classified document to Drive.
///
/// Without an authorized session the client is redirected to the login flow.
pub async fn save_to_drive(State(state): State<AppState>) -> Response {
    if state.registry.is_empty().await {
        return message_response(StatusCode::BAD_REQUEST, ExportError::EmptyRegistry.to_string());
    }

    let session = match state.auth.require_authorization().await {
        Ok(session) => session,
        Err(redirect) => return Redirect::to(&redirect.login_url).into_response(),
    };

    match state.export.export_all(&session).await {
        Ok(report) if report.is_success() => Json(ExportResponse {
            successful_uploads: report.successes,
            failed_uploads: report.failures,
        })
        .into_response(),
        Ok(report) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ExportFailedResponse {
                message: "No successful uploads.",
                failed_uploads: report.failures,
            }),
        )
            .into_response(),
        Err(e @ ExportError::EmptyRegistry) => {
            message_response(StatusCode::BAD_REQUEST, e.to_string())
        }
    }
}
