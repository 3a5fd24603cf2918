//! Classified document records.
//!
//! A record is created once a saved upload has been both extracted and
//! classified. Only its label changes afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

use super::Label;
use crate::utils::document_type;

/// A classified upload awaiting export.
#[derive(Debug, Clone)]
pub struct ClassifiedDocument {
    /// Generated identifier, unique per record.
    id: Uuid,
    /// Sanitized filename the upload was stored under.
    name: String,
    /// Uppercased extension of the original client filename.
    doc_type: String,
    /// Current label (classifier output or user correction).
    label: Label,
    /// Location of the stored upload.
    file_path: PathBuf,
    /// When the classifier labeled this document.
    classified_at: DateTime<Utc>,
}

impl ClassifiedDocument {
    /// Create a record for a stored upload.
    ///
    /// `original_filename` is the name the client sent; it only determines the
    /// document type.
    pub fn new(name: String, original_filename: &str, label: Label, file_path: PathBuf) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            doc_type: document_type(original_filename),
            label,
            file_path,
            classified_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Overwrite the label in place.
    pub(crate) fn relabel(&mut self, label: Label) {
        self.label = label;
    }

    /// Read-only projection handed out to callers.
    pub fn view(&self) -> DocumentView {
        DocumentView {
            id: self.id,
            name: self.name.clone(),
            category: self.label.category.clone(),
            subcategory: self.label.subcategory.clone(),
            doc_type: self.doc_type.clone(),
            file_path: self.file_path.clone(),
            classified_at: self.classified_at,
        }
    }
}

/// Serializable snapshot of a [`ClassifiedDocument`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentView {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub subcategory: String,
    #[serde(rename = "type")]
    pub doc_type: String,
    pub file_path: PathBuf,
    pub classified_at: DateTime<Utc>,
}

impl DocumentView {
    pub fn label(&self) -> Label {
        Label::new(self.category.clone(), self.subcategory.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_derives_type_from_original_name() {
        let doc = ClassifiedDocument::new(
            "tax_return.pdf".to_string(),
            "Tax Return.pdf",
            Label::new("Finance", "Tax"),
            PathBuf::from("uploads/tax_return.pdf"),
        );
        assert_eq!(doc.view().doc_type, "PDF");
        assert_eq!(doc.name(), "tax_return.pdf");
    }

    #[test]
    fn test_relabel_keeps_identity() {
        let mut doc = ClassifiedDocument::new(
            "memo.txt".to_string(),
            "memo.txt",
            Label::new("Work", "Memo"),
            PathBuf::from("uploads/memo.txt"),
        );
        let before = doc.view();
        doc.relabel(Label::new("Legal", "Contract"));
        let after = doc.view();

        assert_eq!(after.category, "Legal");
        assert_eq!(after.subcategory, "Contract");
        assert_eq!(after.id, before.id);
        assert_eq!(after.name, before.name);
        assert_eq!(after.doc_type, before.doc_type);
        assert_eq!(after.file_path, before.file_path);
    }

    #[test]
    fn test_view_serializes_type_key() {
        let doc = ClassifiedDocument::new(
            "scan.png".to_string(),
            "scan.png",
            Label::new("Personal", "Identity"),
            PathBuf::from("uploads/scan.png"),
        );
        let json = serde_json::to_value(doc.view()).unwrap();
        assert_eq!(json["type"], "PNG");
        assert_eq!(json["file_path"], "uploads/scan.png");
        assert!(json.get("doc_type").is_none());
    }
}
