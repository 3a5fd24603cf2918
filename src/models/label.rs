//! Category/subcategory labels.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A two-level classification label.
///
/// The category names the top-level folder a document is exported to and the
/// subcategory the folder inside it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Label {
    pub category: String,
    pub subcategory: String,
}

impl Label {
    pub fn new(category: impl Into<String>, subcategory: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            subcategory: subcategory.into(),
        }
    }

    /// Case-insensitive comparison against another category/subcategory pair.
    pub fn matches(&self, category: &str, subcategory: &str) -> bool {
        self.category.trim().eq_ignore_ascii_case(category.trim())
            && self.subcategory.trim().eq_ignore_ascii_case(subcategory.trim())
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.category, self.subcategory)
    }
}
