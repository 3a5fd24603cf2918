//! In-memory registry of classified documents.
//!
//! The registry is the single owner of pending records. Handlers and services
//! only ever see [`DocumentView`] snapshots; every mutation goes through the
//! methods here, serialized by one lock.

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{ClassifiedDocument, DocumentView, Label};

/// How a caller identifies the record to change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordKey {
    /// First record (in insertion order) with this name.
    Name(String),
    /// The record with this id, which must also carry this name.
    Exact { id: Uuid, name: String },
}

/// Ordered, process-lifetime collection of classified documents.
#[derive(Debug, Default)]
pub struct DocumentRegistry {
    docs: RwLock<Vec<ClassifiedDocument>>,
}

impl DocumentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record at the end. Duplicate names are allowed.
    pub async fn append(&self, doc: ClassifiedDocument) -> DocumentView {
        let view = doc.view();
        self.docs.write().await.push(doc);
        view
    }

    /// First record whose name matches.
    pub async fn find_by_name(&self, name: &str) -> Option<DocumentView> {
        self.docs
            .read()
            .await
            .iter()
            .find(|d| d.name() == name)
            .map(ClassifiedDocument::view)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Option<DocumentView> {
        self.docs
            .read()
            .await
            .iter()
            .find(|d| d.id() == id)
            .map(ClassifiedDocument::view)
    }

    /// All records in insertion order.
    pub async fn list_all(&self) -> Vec<DocumentView> {
        self.docs
            .read()
            .await
            .iter()
            .map(ClassifiedDocument::view)
            .collect()
    }

    pub async fn is_empty(&self) -> bool {
        self.docs.read().await.is_empty()
    }

    pub async fn len(&self) -> usize {
        self.docs.read().await.len()
    }

    /// Replace the label of the record selected by `key`.
    ///
    /// Lookup and update happen under a single write lock. Returns `None`
    /// (and changes nothing) when no record matches.
    pub async fn relabel(&self, key: &RecordKey, label: Label) -> Option<DocumentView> {
        let mut docs = self.docs.write().await;
        let doc = match key {
            RecordKey::Name(name) => docs.iter_mut().find(|d| d.name() == name),
            RecordKey::Exact { id, name } => {
                docs.iter_mut().find(|d| d.id() == *id && d.name() == name)
            }
        }?;
        doc.relabel(label);
        Some(doc.view())
    }
}
