//! Document classification into category/subcategory labels.
//!
//! Two backends share the [`Classifier`] trait:
//! - `keywords`: deterministic keyword scoring against the configured taxonomy
//! - `llm`: an Ollama model asked to pick one taxonomy entry

mod keywords;
mod llm;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::Label;

pub use keywords::KeywordClassifier;
pub use llm::{LlmClassifier, LlmConfig, DEFAULT_CLASSIFY_PROMPT};

/// Errors that can occur while labeling text.
#[derive(Debug, Error)]
pub enum ClassificationError {
    #[error("No text available to classify")]
    EmptyText,

    #[error("Classifier unavailable: {0}")]
    Unavailable(String),

    #[error("Classifier API error: {0}")]
    Api(String),

    #[error("Classifier returned an unrecognized label: {0}")]
    Unrecognized(String),
}

/// Something that assigns a label to extracted text.
///
/// Implementations hold no per-call state: the same text always goes through
/// the same decision.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Backend name for logs.
    fn name(&self) -> &str;

    async fn classify(&self, text: &str) -> Result<Label, ClassificationError>;
}

/// Which classifier backend to build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierBackend {
    #[default]
    Keywords,
    Llm,
}

/// One label the classifier may assign, with the keywords that point to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxonomyEntry {
    pub category: String,
    pub subcategory: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
}

impl TaxonomyEntry {
    pub fn label(&self) -> Label {
        Label::new(self.category.clone(), self.subcategory.clone())
    }
}

/// Classifier configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default)]
    pub backend: ClassifierBackend,
    /// Labels available to every backend.
    #[serde(default = "default_taxonomy")]
    pub taxonomy: Vec<TaxonomyEntry>,
    /// Label the keyword backend assigns when nothing matches.
    #[serde(default = "default_fallback")]
    pub fallback: Label,
    #[serde(default)]
    pub llm: LlmConfig,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            backend: ClassifierBackend::default(),
            taxonomy: default_taxonomy(),
            fallback: default_fallback(),
            llm: LlmConfig::default(),
        }
    }
}

fn default_fallback() -> Label {
    Label::new("Other", "General")
}

fn entry(category: &str, subcategory: &str, keywords: &[&str]) -> TaxonomyEntry {
    TaxonomyEntry {
        category: category.to_string(),
        subcategory: subcategory.to_string(),
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
    }
}

/// Built-in taxonomy for personal and office paperwork.
pub fn default_taxonomy() -> Vec<TaxonomyEntry> {
    vec![
        entry("Finance", "Invoice", &["invoice", "amount due", "bill to", "payment terms"]),
        entry("Finance", "Receipt", &["receipt", "subtotal", "cashier", "thank you for your purchase"]),
        entry("Finance", "Tax", &["tax return", "irs", "w-2", "1099", "tax year"]),
        entry("Finance", "Bank Statement", &["statement period", "account number", "opening balance", "closing balance"]),
        entry("Legal", "Contract", &["agreement", "hereby", "parties", "terms and conditions"]),
        entry("Legal", "Court", &["court", "plaintiff", "defendant", "docket"]),
        entry("Medical", "Prescription", &["prescription", "dosage", "pharmacy", "refills"]),
        entry("Medical", "Lab Report", &["specimen", "reference range", "laboratory", "test results"]),
        entry("Education", "Transcript", &["transcript", "gpa", "semester", "credits"]),
        entry("Education", "Certificate", &["certificate", "hereby certify", "awarded", "completion"]),
        entry("Personal", "Identity", &["passport", "driver license", "date of birth", "nationality"]),
        entry("Personal", "Correspondence", &["dear", "sincerely", "best regards"]),
        entry("Work", "Resume", &["resume", "work experience", "skills", "references"]),
        entry("Work", "Report", &["executive summary", "findings", "analysis", "recommendations"]),
    ]
}

/// Build the configured classifier backend.
pub fn build_classifier(
    config: &ClassifierConfig,
) -> Result<Arc<dyn Classifier>, ClassificationError> {
    match config.backend {
        ClassifierBackend::Keywords => Ok(Arc::new(KeywordClassifier::new(
            config.taxonomy.clone(),
            config.fallback.clone(),
        ))),
        ClassifierBackend::Llm => Ok(Arc::new(LlmClassifier::new(
            config.llm.clone(),
            config.taxonomy.clone(),
        )?)),
    }
}
