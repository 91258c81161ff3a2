//! Form state machines for the dashboard.
//!
//! - [`ProductForm`] - create/edit buffer for a product, with the
//!   image-link confirmation step and a single in-flight submission
//! - [`DeleteConfirmation`] - pending "are you sure?" prompt for deletions
//! - [`FormLocks`] - one product-form request at a time per session
//!
//! Both are plain serializable values; the routes keep one of each in the
//! admin's session.

pub mod delete;
pub mod lock;
pub mod product;

use thiserror::Error;

pub use delete::{DeleteConfirmation, DeletePrompt};
pub use lock::{FormGuard, FormLocks};
pub use product::{
    FormMode, FormStatus, INTERRUPTED_MESSAGE, ProductDraft, ProductForm, SubmitOutcome,
    SubmitPlan, parse_price, parse_stock,
};

/// Errors raised by form transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    /// A required field is blank.
    #[error("{0}")]
    Validation(String),

    /// A submission is already in flight.
    #[error("A save is already in progress")]
    Busy,

    /// The action does not apply in the current state.
    #[error("cannot {action} while the form is {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },
}
