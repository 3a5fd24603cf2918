//! Keyword-scoring classifier.

use async_trait::async_trait;
use tracing::debug;

use super::{ClassificationError, Classifier, TaxonomyEntry};
use crate::models::Label;

/// Scores each taxonomy entry by keyword occurrences and picks the best.
pub struct KeywordClassifier {
    taxonomy: Vec<TaxonomyEntry>,
    fallback: Label,
}

impl KeywordClassifier {
    pub fn new(taxonomy: Vec<TaxonomyEntry>, fallback: Label) -> Self {
        // Keywords are matched against lowercased text.
        let taxonomy = taxonomy
            .into_iter()
            .map(|mut entry| {
                entry.keywords = entry
                    .keywords
                    .iter()
                    .map(|k| k.trim().to_lowercase())
                    .filter(|k| !k.is_empty())
                    .collect();
                entry
            })
            .collect();
        Self { taxonomy, fallback }
    }

    fn score(entry: &TaxonomyEntry, text: &str) -> usize {
        entry
            .keywords
            .iter()
            .map(|keyword| text.matches(keyword.as_str()).count())
            .sum()
    }

    /// Best-scoring entry; ties go to the earlier entry.
    fn best_match(&self, text: &str) -> Option<(&TaxonomyEntry, usize)> {
        let mut best: Option<(&TaxonomyEntry, usize)> = None;
        for entry in &self.taxonomy {
            let score = Self::score(entry, text);
            if score > best.map(|(_, s)| s).unwrap_or(0) {
                best = Some((entry, score));
            }
        }
        best
    }
}

#[async_trait]
impl Classifier for KeywordClassifier {
    fn name(&self) -> &str {
        "keywords"
    }

    async fn classify(&self, text: &str) -> Result<Label, ClassificationError> {
        if text.trim().is_empty() {
            return Err(ClassificationError::EmptyText);
        }

        let lowered = text.to_lowercase();
        match self.best_match(&lowered) {
            Some((entry, score)) => {
                debug!("Keyword match {} / {} (score {})", entry.category, entry.subcategory, score);
                Ok(entry.label())
            }
            None => Ok(self.fallback.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::default_taxonomy;

    fn classifier() -> KeywordClassifier {
        KeywordClassifier::new(default_taxonomy(), Label::new("Other", "General"))
    }

    #[tokio::test]
    async fn test_highest_score_wins() {
        let label = classifier()
            .classify("Dear tenant, this agreement between the parties is hereby made. Sincerely")
            .await
            .unwrap();
        assert_eq!(label, Label::new("Legal", "Contract"));
    }

    #[tokio::test]
    async fn test_tie_goes_to_earlier_entry() {
        let taxonomy = vec![
            TaxonomyEntry {
                category: "A".to_string(),
                subcategory: "One".to_string(),
                keywords: vec!["alpha".to_string()],
            },
            TaxonomyEntry {
                category: "B".to_string(),
                subcategory: "Two".to_string(),
                keywords: vec!["beta".to_string()],
            },
        ];
        let classifier = KeywordClassifier::new(taxonomy, Label::new("Other", "General"));
        let label = classifier.classify("beta alpha").await.unwrap();
        assert_eq!(label, Label::new("A", "One"));
    }

    #[tokio::test]
    async fn test_keywords_are_case_insensitive() {
        let taxonomy = vec![TaxonomyEntry {
            category: "Medical".to_string(),
            subcategory: "Prescription".to_string(),
            keywords: vec!["  Dosage ".to_string()],
        }];
        let classifier = KeywordClassifier::new(taxonomy, Label::new("Other", "General"));
        let label = classifier.classify("DOSAGE: twice daily").await.unwrap();
        assert_eq!(label.subcategory, "Prescription");
    }

    #[tokio::test]
    async fn test_no_match_uses_fallback() {
        let label = classifier().classify("zzz qqq").await.unwrap();
        assert_eq!(label, Label::new("Other", "General"));
    }

    #[tokio::test]
    async fn test_empty_text_is_an_error() {
        let err = classifier().classify("  \n\t ").await.unwrap_err();
        assert!(matches!(err, ClassificationError::EmptyText));
    }
}
