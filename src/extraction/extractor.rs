//! Text extraction using external tools and in-process readers.

use std::path::{Path, PathBuf};
use std::process::Command;

use async_trait::async_trait;
use tempfile::TempDir;
use tracing::debug;

use super::office;
use super::{ExtractFailure, ExtractionConfig, ExtractionError, TextExtraction};
use crate::utils::{file_extension, sniff_extension};

/// Extensions this extractor knows how to read.
const SUPPORTED: &[&str] = &["txt", "pdf", "png", "jpg", "jpeg", "doc", "docx", "zip"];

/// Handle command output, extracting stdout on success or returning appropriate error.
fn handle_cmd_output(
    result: std::io::Result<std::process::Output>,
    tool_name: &str,
    error_prefix: &str,
) -> Result<String, ExtractFailure> {
    match result {
        Ok(output) => {
            if output.status.success() {
                Ok(String::from_utf8_lossy(&output.stdout).to_string())
            } else {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(ExtractFailure::ExtractionFailed(format!(
                    "{}: {}",
                    error_prefix,
                    stderr.trim()
                )))
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ExtractFailure::ToolNotFound(tool_name.to_string()))
        }
        Err(e) => Err(ExtractFailure::Io(e)),
    }
}

/// Check command status, returning appropriate error on failure.
fn check_cmd_status(
    result: std::io::Result<std::process::ExitStatus>,
    tool_name: &str,
    error_msg: &str,
) -> Result<(), ExtractFailure> {
    match result {
        Ok(s) if s.success() => Ok(()),
        Ok(_) => Err(ExtractFailure::ExtractionFailed(error_msg.to_string())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ExtractFailure::ToolNotFound(tool_name.to_string()))
        }
        Err(e) => Err(ExtractFailure::Io(e)),
    }
}

fn visible_chars(text: &str) -> usize {
    text.chars().filter(|c| !c.is_whitespace()).count()
}

/// Text extractor backed by pdftotext, Tesseract and antiword/catdoc.
#[derive(Debug, Clone, Default)]
pub struct TextExtractor {
    config: ExtractionConfig,
}

impl TextExtractor {
    pub fn new(config: ExtractionConfig) -> Self {
        Self { config }
    }

    /// Whether a file extension has an extraction route.
    pub fn supports(extension: &str) -> bool {
        SUPPORTED.contains(&extension.to_lowercase().as_str())
    }

    /// Extract text synchronously. Blocks on external tools.
    pub fn extract_blocking(&self, file_path: &Path) -> Result<String, ExtractFailure> {
        if !file_path.is_file() {
            return Err(ExtractFailure::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} does not exist", file_path.display()),
            )));
        }

        let extension = file_path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(file_extension)
            .filter(|ext| Self::supports(ext))
            .or_else(|| sniff_extension(file_path).map(str::to_string))
            .ok_or_else(|| {
                ExtractFailure::UnsupportedFileType(file_path.display().to_string())
            })?;

        self.extract_as(file_path, &extension, true)
    }

    fn extract_as(
        &self,
        file_path: &Path,
        extension: &str,
        allow_archive: bool,
    ) -> Result<String, ExtractFailure> {
        debug!("Extracting {} as {}", file_path.display(), extension);
        match extension {
            "txt" => {
                let bytes = std::fs::read(file_path)?;
                Ok(String::from_utf8_lossy(&bytes).to_string())
            }
            "pdf" => self.extract_pdf(file_path),
            "png" | "jpg" | "jpeg" => self.run_tesseract(file_path),
            "docx" => office::docx_text(file_path, self.config.max_member_bytes),
            "doc" => self.extract_doc(file_path),
            "zip" if allow_archive => self.extract_archive(file_path),
            other => Err(ExtractFailure::UnsupportedFileType(other.to_string())),
        }
    }

    /// Extract PDF text, falling back to OCR when the text layer is empty.
    fn extract_pdf(&self, file_path: &Path) -> Result<String, ExtractFailure> {
        let text = self.run_pdftotext(file_path)?;
        let text_chars = visible_chars(&text);
        if text_chars >= self.config.min_pdf_chars {
            return Ok(text);
        }

        match self.ocr_pdf(file_path) {
            // Use OCR only if it actually found more content
            Ok(ocr_text) if visible_chars(&ocr_text) > text_chars => Ok(ocr_text),
            Ok(_) => Ok(text),
            Err(e) => {
                debug!("OCR failed: {}, using pdftotext result", e);
                Ok(text)
            }
        }
    }

    /// Run pdftotext on a PDF file.
    fn run_pdftotext(&self, file_path: &Path) -> Result<String, ExtractFailure> {
        let output = Command::new("pdftotext")
            .args(["-layout", "-enc", "UTF-8"])
            .arg(file_path)
            .arg("-") // Output to stdout
            .output();

        handle_cmd_output(output, "pdftotext (install poppler-utils)", "pdftotext failed")
    }

    /// OCR a PDF by converting pages to images and running Tesseract.
    fn ocr_pdf(&self, file_path: &Path) -> Result<String, ExtractFailure> {
        let temp_dir = TempDir::new()?;
        let temp_path = temp_dir.path();

        let status = Command::new("pdftoppm")
            .args(["-png", "-r", "300"])
            .arg(file_path)
            .arg(temp_path.join("page"))
            .status();

        check_cmd_status(
            status,
            "pdftoppm (install poppler-utils)",
            "pdftoppm failed to convert PDF",
        )?;

        let mut images: Vec<PathBuf> = std::fs::read_dir(temp_path)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().map(|ext| ext == "png").unwrap_or(false))
            .collect();
        images.sort();

        if images.is_empty() {
            return Err(ExtractFailure::ExtractionFailed(
                "No images generated from PDF".to_string(),
            ));
        }

        let mut pages = Vec::with_capacity(images.len());
        for (i, image_path) in images.iter().enumerate() {
            match self.run_tesseract(image_path) {
                Ok(text) => pages.push(text),
                Err(e) => tracing::warn!("OCR failed for page {}: {}", i + 1, e),
            }
        }

        Ok(pages.join("\n\n"))
    }

    /// Run Tesseract OCR on an image.
    fn run_tesseract(&self, image_path: &Path) -> Result<String, ExtractFailure> {
        let output = Command::new("tesseract")
            .arg(image_path)
            .arg("stdout")
            .args(["-l", &self.config.tesseract_lang])
            .output();

        handle_cmd_output(output, "tesseract (install tesseract-ocr)", "tesseract failed")
    }

    /// Legacy Word documents: antiword, then catdoc.
    fn extract_doc(&self, file_path: &Path) -> Result<String, ExtractFailure> {
        let output = Command::new("antiword").arg(file_path).output();
        match handle_cmd_output(output, "antiword", "antiword failed") {
            Err(ExtractFailure::ToolNotFound(_)) => {
                let output = Command::new("catdoc").arg(file_path).output();
                handle_cmd_output(output, "antiword or catdoc", "catdoc failed")
            }
            other => other,
        }
    }

    /// Extract every supported member of a zip archive.
    fn extract_archive(&self, file_path: &Path) -> Result<String, ExtractFailure> {
        let temp_dir = TempDir::new()?;
        let members = office::unpack_archive(
            file_path,
            temp_dir.path(),
            self.config.archive_limits(),
            Self::supports,
        )?;

        let mut sections = Vec::new();
        for member in &members {
            let extension = file_extension(&member.name).unwrap_or_default();
            // Nested archives are not unpacked.
            match self.extract_as(&member.path, &extension, false) {
                Ok(text) if visible_chars(&text) > 0 => {
                    sections.push(format!("--- {} ---\n{}", member.name, text.trim()));
                }
                Ok(_) => debug!("Archive member {} produced no text", member.name),
                Err(e) => tracing::warn!("Skipping archive member {}: {}", member.name, e),
            }
        }

        if sections.is_empty() {
            return Err(ExtractFailure::ExtractionFailed(
                "No extractable documents in archive".to_string(),
            ));
        }

        Ok(sections.join("\n\n"))
    }

    /// Check if required tools are available.
    pub fn check_tools() -> Vec<(String, bool)> {
        ["pdftotext", "pdftoppm", "tesseract", "antiword", "catdoc"]
            .iter()
            .map(|tool| (tool.to_string(), which::which(tool).is_ok()))
            .collect()
    }
}

#[async_trait]
impl TextExtraction for TextExtractor {
    async fn extract(&self, file_path: &Path) -> Result<String, ExtractionError> {
        let extractor = self.clone();
        let path = file_path.to_path_buf();

        let result = tokio::task::spawn_blocking(move || extractor.extract_blocking(&path))
            .await
            .unwrap_or_else(|e| {
                Err(ExtractFailure::ExtractionFailed(format!(
                    "extraction task failed: {}",
                    e
                )))
            });

        result.map_err(|cause| ExtractionError::new(file_path, cause))
    }
}
