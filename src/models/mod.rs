//! Data models for doclabel.

mod document;
mod label;

pub use document::{ClassifiedDocument, DocumentView};
pub use label::Label;
