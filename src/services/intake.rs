//! Upload intake: validate, persist, extract, classify, register.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use super::validation::{has_allowed_extension, validate_upload, ValidationError};
use crate::classify::{ClassificationError, Classifier};
use crate::extraction::{ExtractionError, TextExtraction};
use crate::models::{ClassifiedDocument, DocumentView, Label};
use crate::registry::DocumentRegistry;
use crate::utils::sanitize_filename;

/// Why an upload did not produce a registry record.
#[derive(Debug, Error)]
pub enum IntakeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Failed to save upload: {0}")]
    Persist(#[from] std::io::Error),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Classification(#[from] ClassificationError),
}

/// Result of a successful ingest.
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub label: Label,
    pub document: DocumentView,
}

/// Turns uploaded bytes into a classified registry record.
pub struct IntakePipeline {
    registry: Arc<DocumentRegistry>,
    extractor: Arc<dyn TextExtraction>,
    classifier: Arc<dyn Classifier>,
    upload_dir: PathBuf,
    allowed_extensions: Vec<String>,
}

impl IntakePipeline {
    pub fn new(
        registry: Arc<DocumentRegistry>,
        extractor: Arc<dyn TextExtraction>,
        classifier: Arc<dyn Classifier>,
        upload_dir: PathBuf,
        allowed_extensions: Vec<String>,
    ) -> Self {
        Self {
            registry,
            extractor,
            classifier,
            upload_dir,
            allowed_extensions,
        }
    }

    /// Ingest one upload.
    ///
    /// The registry changes only when extraction and classification both
    /// succeed. A saved file is left in place if a later step fails, and a
    /// file with the same sanitized name is overwritten.
    pub async fn ingest(
        &self,
        raw_filename: Option<&str>,
        bytes: &[u8],
    ) -> Result<IngestOutcome, IntakeError> {
        let raw_filename = validate_upload(raw_filename, &self.allowed_extensions)?;

        let name = sanitize_filename(raw_filename);
        if name.is_empty() || !has_allowed_extension(&name, &self.allowed_extensions) {
            return Err(ValidationError::InvalidFormat.into());
        }

        tokio::fs::create_dir_all(&self.upload_dir).await?;
        let file_path = self.upload_dir.join(&name);
        tokio::fs::write(&file_path, bytes).await?;
        debug!("Saved upload {} ({} bytes)", file_path.display(), bytes.len());

        let text = self.extractor.extract(&file_path).await?;
        let label = self.classifier.classify(&text).await?;

        let document = self
            .registry
            .append(ClassifiedDocument::new(
                name,
                raw_filename,
                label.clone(),
                file_path,
            ))
            .await;

        info!(
            "Classified {} as {} via {}",
            document.name,
            label,
            self.classifier.name()
        );

        Ok(IngestOutcome { label, document })
    }
}
