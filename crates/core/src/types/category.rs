//! Category records.

use serde::{Deserialize, Serialize};

use super::id::CategoryId;

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    /// Display name. Intended to be unique, not enforced.
    pub name: String,
}

/// Validated category write payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryFields {
    pub name: String,
}

impl CategoryFields {
    /// Build a payload from user input.
    ///
    /// Returns `None` when the trimmed name is empty; callers treat that as
    /// a no-op rather than an error.
    #[must_use]
    pub fn new(name: &str) -> Option<Self> {
        let name = name.trim();
        (!name.is_empty()).then(|| Self {
            name: name.to_owned(),
        })
    }
}
