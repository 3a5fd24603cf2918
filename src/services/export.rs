//! Batch export of classified documents to cloud storage.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::cloud::{AuthorizedSession, StorageUploader};
use crate::registry::DocumentRegistry;

/// Export cannot start.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("No classified documents available.")]
    EmptyRegistry,
}

/// A record that reached cloud storage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadSuccess {
    pub name: String,
    pub drive_file_id: String,
}

/// A record that did not, and why.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadFailure {
    pub name: String,
    pub error: String,
}

/// Per-record outcome of one export run, in registry order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExportReport {
    pub successes: Vec<UploadSuccess>,
    pub failures: Vec<UploadFailure>,
}

impl ExportReport {
    /// The run counts as successful when at least one record was uploaded.
    pub fn is_success(&self) -> bool {
        !self.successes.is_empty()
    }
}

/// Uploads every registry record, one at a time.
pub struct ExportBatchService {
    registry: Arc<DocumentRegistry>,
    uploader: Arc<dyn StorageUploader>,
}

impl ExportBatchService {
    pub fn new(registry: Arc<DocumentRegistry>, uploader: Arc<dyn StorageUploader>) -> Self {
        Self { registry, uploader }
    }

    /// Export all records with the given session.
    ///
    /// A failing record is reported and skipped; it never stops the batch.
    /// Each record gets a single upload attempt.
    pub async fn export_all(
        &self,
        session: &AuthorizedSession,
    ) -> Result<ExportReport, ExportError> {
        let documents = self.registry.list_all().await;
        if documents.is_empty() {
            return Err(ExportError::EmptyRegistry);
        }

        let mut report = ExportReport::default();
        for doc in documents {
            if !tokio::fs::try_exists(&doc.file_path).await.unwrap_or(false) {
                warn!("Export of {} skipped: file not found", doc.name);
                report.failures.push(UploadFailure {
                    name: doc.name,
                    error: "File not found.".to_string(),
                });
                continue;
            }

            match self
                .uploader
                .upload(session, &doc.file_path, &doc.label())
                .await
            {
                Ok(remote_id) => report.successes.push(UploadSuccess {
                    name: doc.name,
                    drive_file_id: remote_id,
                }),
                Err(e) => {
                    warn!("Export of {} failed: {}", doc.name, e);
                    report.failures.push(UploadFailure {
                        name: doc.name,
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            "Export finished: {} uploaded, {} failed",
            report.successes.len(),
            report.failures.len()
        );
        Ok(report)
    }
}
