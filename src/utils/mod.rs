//! Shared utility functions.
//!
//! - `filename`: upload filename sanitation and extension handling
//! - `mime`: MIME type lookup for stored files

mod filename;
mod mime;

pub use filename::{document_type, file_extension, sanitize_filename};
pub use mime::{extension_for_mime, mime_for_path, sniff_extension};
