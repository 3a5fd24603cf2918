//! Request validation rules for uploads and label corrections.

use thiserror::Error;

use crate::utils::file_extension;

/// Client input that cannot be processed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("No file part")]
    NoFilePart,

    #[error("No selected file")]
    NoSelectedFile,

    #[error("Invalid file format.")]
    InvalidFormat,

    #[error("Missing required fields: name, category, and subcategory.")]
    MissingFields,
}

/// Extensions accepted for upload when none are configured.
pub fn default_allowed_extensions() -> Vec<String> {
    ["pdf", "png", "jpg", "jpeg", "doc", "docx", "txt", "zip"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Whether `filename` carries one of the `allowed` extensions (case-insensitive).
pub fn has_allowed_extension(filename: &str, allowed: &[String]) -> bool {
    file_extension(filename)
        .map(|ext| allowed.iter().any(|a| a.eq_ignore_ascii_case(&ext)))
        .unwrap_or(false)
}

/// Check an upload's client filename.
///
/// `None` means the request had no file field at all.
pub fn validate_upload<'a>(
    raw_filename: Option<&'a str>,
    allowed: &[String],
) -> Result<&'a str, ValidationError> {
    let filename = raw_filename.ok_or(ValidationError::NoFilePart)?;
    if filename.trim().is_empty() {
        return Err(ValidationError::NoSelectedFile);
    }
    if !has_allowed_extension(filename, allowed) {
        return Err(ValidationError::InvalidFormat);
    }
    Ok(filename)
}

/// Trimmed value of a required text field, or `None` when absent or blank.
pub fn required_field(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_upload() {
        let allowed = default_allowed_extensions();

        assert_eq!(validate_upload(None, &allowed), Err(ValidationError::NoFilePart));
        assert_eq!(
            validate_upload(Some(""), &allowed),
            Err(ValidationError::NoSelectedFile)
        );
        assert_eq!(
            validate_upload(Some("notes.exe"), &allowed),
            Err(ValidationError::InvalidFormat)
        );
        assert_eq!(
            validate_upload(Some("README"), &allowed),
            Err(ValidationError::InvalidFormat)
        );
        assert_eq!(validate_upload(Some("Scan.JPEG"), &allowed), Ok("Scan.JPEG"));
    }

    #[test]
    fn test_messages() {
        assert_eq!(ValidationError::InvalidFormat.to_string(), "Invalid file format.");
        assert_eq!(
            ValidationError::MissingFields.to_string(),
            "Missing required fields: name, category, and subcategory."
        );
    }

    #[test]
    fn test_required_field() {
        assert_eq!(required_field(Some(" Finance ")), Some("Finance"));
        assert_eq!(required_field(Some("   ")), None);
        assert_eq!(required_field(None), None);
    }
}
