//! Text extraction from uploaded documents.
//!
//! Extracts text using:
//! - direct reads for plain text
//! - pdftotext (Poppler) for PDFs, with Tesseract OCR for scanned pages
//! - Tesseract OCR for images
//! - the docx zip container for Word documents, antiword/catdoc for legacy `.doc`
//! - per-member extraction for zip archives
//!
//! Every failure is reported as an [`ExtractionError`] carrying the path that
//! was being read, so callers never see raw tool or IO errors.

mod extractor;
mod office;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use extractor::TextExtractor;

/// Why a file could not be turned into text.
#[derive(Debug, Error)]
pub enum ExtractFailure {
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("External tool not found: {0}")]
    ToolNotFound(String),

    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Extraction failure for one file.
#[derive(Debug, Error)]
#[error("{cause}")]
pub struct ExtractionError {
    /// File that was being extracted.
    pub file_path: PathBuf,
    /// Underlying failure.
    #[source]
    pub cause: ExtractFailure,
}

impl ExtractionError {
    pub fn new(file_path: impl Into<PathBuf>, cause: ExtractFailure) -> Self {
        Self {
            file_path: file_path.into(),
            cause,
        }
    }
}

/// Something that turns a stored file into plain text.
///
/// Implementations must not touch the document registry.
#[async_trait]
pub trait TextExtraction: Send + Sync {
    async fn extract(&self, file_path: &Path) -> Result<String, ExtractionError>;
}

/// Extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Tesseract language setting.
    #[serde(default = "default_tesseract_lang")]
    pub tesseract_lang: String,
    /// Below this many non-whitespace characters, pdftotext output is
    /// considered empty and the PDF is OCRed instead.
    #[serde(default = "default_min_pdf_chars")]
    pub min_pdf_chars: usize,
    /// Maximum number of archive members to extract from one zip upload.
    #[serde(default = "default_max_archive_entries")]
    pub max_archive_entries: usize,
    /// Largest decompressed size accepted for one archive member.
    #[serde(default = "default_max_member_bytes")]
    pub max_member_bytes: u64,
    /// Largest decompressed size accepted for a whole archive.
    #[serde(default = "default_max_archive_bytes")]
    pub max_archive_bytes: u64,
}

fn default_tesseract_lang() -> String {
    "eng".to_string()
}
fn default_min_pdf_chars() -> usize {
    50
}
fn default_max_archive_entries() -> usize {
    64
}
fn default_max_member_bytes() -> u64 {
    16 * 1024 * 1024
}
fn default_max_archive_bytes() -> u64 {
    64 * 1024 * 1024
}

impl ExtractionConfig {
    pub(crate) fn archive_limits(&self) -> office::ArchiveLimits {
        office::ArchiveLimits {
            max_entries: self.max_archive_entries,
            max_member_bytes: self.max_member_bytes,
            max_total_bytes: self.max_archive_bytes,
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            tesseract_lang: default_tesseract_lang(),
            min_pdf_chars: default_min_pdf_chars(),
            max_archive_entries: default_max_archive_entries(),
            max_member_bytes: default_max_member_bytes(),
            max_archive_bytes: default_max_archive_bytes(),
        }
    }
}
