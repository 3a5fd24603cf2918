//! User corrections to classifier labels.

use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use super::validation::{required_field, ValidationError};
use crate::models::{DocumentView, Label};
use crate::registry::{DocumentRegistry, RecordKey};

/// Label correction failures.
#[derive(Debug, Error)]
pub enum LabelError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Document not found.")]
    NotFound,
}

/// A correction as submitted by the client.
///
/// Every field is optional on the wire so that missing fields can be reported
/// as a validation failure rather than a decoding error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LabelRequest {
    /// Selects one record exactly when several share a name.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub subcategory: Option<String>,
}

impl LabelRequest {
    pub fn new(name: &str, category: &str, subcategory: &str) -> Self {
        Self {
            id: None,
            name: Some(name.to_string()),
            category: Some(category.to_string()),
            subcategory: Some(subcategory.to_string()),
        }
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = Some(id.to_string());
        self
    }
}

/// Applies label corrections to registry records.
pub struct LabelCorrectionService {
    registry: Arc<DocumentRegistry>,
}

impl LabelCorrectionService {
    pub fn new(registry: Arc<DocumentRegistry>) -> Self {
        Self { registry }
    }

    /// Overwrite the label of the selected record and return its new view.
    ///
    /// Only category and subcategory change. Nothing changes on error.
    pub async fn correct(&self, request: &LabelRequest) -> Result<DocumentView, LabelError> {
        let (Some(name), Some(category), Some(subcategory)) = (
            required_field(request.name.as_deref()),
            required_field(request.category.as_deref()),
            required_field(request.subcategory.as_deref()),
        ) else {
            return Err(ValidationError::MissingFields.into());
        };

        let key = match required_field(request.id.as_deref()) {
            Some(id) => RecordKey::Exact {
                // An id that does not parse cannot name any record.
                id: Uuid::parse_str(id).map_err(|_| LabelError::NotFound)?,
                name: name.to_string(),
            },
            None => RecordKey::Name(name.to_string()),
        };

        let updated = self
            .registry
            .relabel(&key, Label::new(category, subcategory))
            .await
            .ok_or(LabelError::NotFound)?;

        info!(
            "Relabeled {} as {} / {}",
            updated.name, updated.category, updated.subcategory
        );
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ClassifiedDocument;
    use std::path::PathBuf;

    async fn service_with(names: &[&str]) -> (LabelCorrectionService, Arc<DocumentRegistry>) {
        let registry = Arc::new(DocumentRegistry::new());
        for name in names {
            registry
                .append(ClassifiedDocument::new(
                    name.to_string(),
                    name,
                    Label::new("Other", "General"),
                    PathBuf::from("uploads").join(name),
                ))
                .await;
        }
        (LabelCorrectionService::new(registry.clone()), registry)
    }

    #[tokio::test]
    async fn test_correct_changes_only_label() {
        let (service, registry) = service_with(&["lease.pdf"]).await;
        let before = registry.find_by_name("lease.pdf").await.unwrap();

        let after = service
            .correct(&LabelRequest::new("lease.pdf", "Legal", "Contract"))
            .await
            .unwrap();

        assert_eq!(after.category, "Legal");
        assert_eq!(after.subcategory, "Contract");
        assert_eq!(after.id, before.id);
        assert_eq!(after.doc_type, before.doc_type);
        assert_eq!(after.file_path, before.file_path);
        assert_eq!(registry.find_by_name("lease.pdf").await.unwrap(), after);
    }

    #[tokio::test]
    async fn test_missing_fields_change_nothing() {
        let (service, registry) = service_with(&["lease.pdf"]).await;
        let before = registry.list_all().await;

        let request = LabelRequest {
            name: Some("lease.pdf".to_string()),
            category: Some("Legal".to_string()),
            subcategory: Some("  ".to_string()),
            ..LabelRequest::default()
        };
        let err = service.correct(&request).await.unwrap_err();

        assert!(matches!(
            err,
            LabelError::Validation(ValidationError::MissingFields)
        ));
        assert_eq!(registry.list_all().await, before);
    }

    #[tokio::test]
    async fn test_unknown_name_is_not_found() {
        let (service, registry) = service_with(&["lease.pdf"]).await;
        let before = registry.list_all().await;

        let err = service
            .correct(&LabelRequest::new("missing.pdf", "Legal", "Contract"))
            .await
            .unwrap_err();

        assert!(matches!(err, LabelError::NotFound));
        assert_eq!(err.to_string(), "Document not found.");
        assert_eq!(registry.list_all().await, before);
    }

    #[tokio::test]
    async fn test_id_selects_duplicate() {
        let (service, registry) = service_with(&["scan.png", "scan.png"]).await;
        let second = registry.list_all().await[1].clone();

        let updated = service
            .correct(&LabelRequest::new("scan.png", "Medical", "Lab Report").with_id(second.id))
            .await
            .unwrap();

        assert_eq!(updated.id, second.id);
        assert_eq!(registry.list_all().await[0].category, "Other");
    }

    #[tokio::test]
    async fn test_malformed_id_is_not_found() {
        let (service, _) = service_with(&["scan.png"]).await;
        let request = LabelRequest {
            id: Some("not-a-uuid".to_string()),
            ..LabelRequest::new("scan.png", "Medical", "Lab Report")
        };
        assert!(matches!(
            service.correct(&request).await,
            Err(LabelError::NotFound)
        ));
    }
}
