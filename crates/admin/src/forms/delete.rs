//! Delete confirmation prompt.

use serde::{Deserialize, Serialize};
use trident_core::{CategoryId, ProductId};

use super::FormError;

/// A deletion waiting for the admin's answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeletePrompt {
    Product { id: ProductId, name: String },
    Category { id: CategoryId, name: String },
}

impl DeletePrompt {
    /// Question shown in the prompt.
    #[must_use]
    pub const fn question(&self) -> &'static str {
        match self {
            Self::Product { .. } => "Delete this product?",
            Self::Category { .. } => {
                "Delete this category? Products using it will need to be updated."
            }
        }
    }

    /// Name of the record being deleted.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Product { name, .. } | Self::Category { name, .. } => name,
        }
    }

    /// Page to return to once answered.
    #[must_use]
    pub const fn return_path(&self) -> &'static str {
        match self {
            Self::Product { .. } => "/products",
            Self::Category { .. } => "/categories",
        }
    }
}

/// At most one pending delete prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteConfirmation {
    pending: Option<DeletePrompt>,
}

impl DeleteConfirmation {
    #[must_use]
    pub const fn pending(&self) -> Option<&DeletePrompt> {
        self.pending.as_ref()
    }

    /// Ask for confirmation, replacing any unanswered prompt.
    pub fn request(&mut self, prompt: DeletePrompt) {
        self.pending = Some(prompt);
    }

    /// Answer the prompt. Returns the prompt to carry out when accepted,
    /// `None` when declined. Either way the prompt is cleared.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::InvalidTransition`] if nothing is pending.
    pub fn resolve(&mut self, accept: bool) -> Result<Option<DeletePrompt>, FormError> {
        let prompt = self.pending.take().ok_or(FormError::InvalidTransition {
            action: "confirm a delete",
            state: "idle",
        })?;
        Ok(accept.then_some(prompt))
    }
}
