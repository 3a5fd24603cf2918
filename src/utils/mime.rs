//! MIME type lookup for stored documents.

use std::path::Path;

/// MIME type to send when uploading a stored file.
pub fn mime_for_path(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// Map a sniffed MIME type to the extension whose extractor handles it.
pub fn extension_for_mime(mime: &str) -> Option<&'static str> {
    match mime {
        "application/pdf" => Some("pdf"),
        "image/png" => Some("png"),
        "image/jpeg" => Some("jpg"),
        "application/msword" | "application/x-ole-storage" => Some("doc"),
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => Some("docx"),
        "application/zip" | "application/x-zip" | "application/x-zip-compressed" => Some("zip"),
        m if m.starts_with("text/") => Some("txt"),
        _ => None,
    }
}

/// Guess an extractor extension from file content.
pub fn sniff_extension(path: &Path) -> Option<&'static str> {
    let kind = infer::get_from_path(path).ok().flatten()?;
    extension_for_mime(kind.mime_type())
}
