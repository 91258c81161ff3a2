//! Product create/edit form.
//!
//! ```text
//!            open_new / open_edit
//!   Closed ───────────────────────► Open(mode) ◄─────────────┐
//!     ▲                               │   ▲                   │
//!     │                 request_submit│   │confirm(decline)   │ complete(Err)
//!     │                               ▼   │                   │
//!     │                   PendingConfirmation(mode)           │
//!     │                               │confirm(accept)        │
//!     │ complete(Ok)                  ▼                       │
//!     └──────────────────────── Submitting(mode) ─────────────┘
//! ```
//!
//! `request_submit` goes straight to `Submitting` when the image link looks
//! like a shared-drive link, and through `PendingConfirmation` otherwise.
//! While `Submitting`, every other transition is rejected with
//! [`FormError::Busy`].

use serde::{Deserialize, Serialize};
use trident_core::{Category, Product, ProductFields, ProductId, UNCATEGORIZED, is_drive_link};

use super::FormError;

/// Stock pre-filled in a fresh form.
pub const DEFAULT_STOCK: &str = "10";

/// Shown when a form is found `Submitting` with no write behind it.
pub const INTERRUPTED_MESSAGE: &str =
    "The last save did not finish. Check the inventory before saving again.";

/// Raw text of the form fields, exactly as typed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub name: String,
    pub price: String,
    pub category: String,
    pub description: String,
    pub image: String,
    pub stock: String,
}

impl Default for ProductDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            price: String::new(),
            category: String::new(),
            description: String::new(),
            image: String::new(),
            stock: DEFAULT_STOCK.to_string(),
        }
    }
}

impl From<&Product> for ProductDraft {
    fn from(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            price: product.price.to_string(),
            category: product.category.clone(),
            description: product.description.clone(),
            image: product.image.clone(),
            stock: product.stock.to_string(),
        }
    }
}

impl ProductDraft {
    /// Normalize the draft into a write payload.
    ///
    /// Text fields are written as typed. Unparseable numbers become zero; a
    /// blank category falls back to the first existing category, then to
    /// [`UNCATEGORIZED`].
    ///
    /// # Errors
    ///
    /// Returns [`FormError::Validation`] if the name is blank.
    pub fn normalize(&self, categories: &[Category]) -> Result<ProductFields, FormError> {
        if self.name.trim().is_empty() {
            return Err(FormError::Validation("Product name is required".to_string()));
        }

        let category = if self.category.trim().is_empty() {
            categories
                .first()
                .map_or_else(|| UNCATEGORIZED.to_string(), |c| c.name.clone())
        } else {
            self.category.clone()
        };

        Ok(ProductFields {
            name: self.name.clone(),
            price: parse_price(&self.price),
            category,
            description: self.description.clone(),
            image: self.image.clone(),
            stock: parse_stock(&self.stock),
        })
    }

    /// Whether saving this draft needs the admin to confirm the image link.
    #[must_use]
    pub fn needs_image_confirmation(&self) -> bool {
        !is_drive_link(&self.image)
    }
}

/// Parse a price the way a lenient number input would: the longest numeric
/// prefix wins, anything unusable (including negatives) becomes zero.
#[must_use]
pub fn parse_price(raw: &str) -> f64 {
    let value = numeric_prefix(raw.trim_start(), true)
        .parse::<f64>()
        .unwrap_or(0.0);
    if value.is_finite() && value > 0.0 { value } else { 0.0 }
}

/// Parse a stock count: leading integer digits, anything else is zero.
#[must_use]
pub fn parse_stock(raw: &str) -> u32 {
    let digits = numeric_prefix(raw.trim_start(), false);
    match digits.parse::<i64>() {
        Ok(n) if n > 0 => u32::try_from(n).unwrap_or(u32::MAX),
        // Only sign and digits survive the prefix scan, so a failed parse of
        // a non-empty prefix is overflow.
        Err(_) if !digits.is_empty() && !digits.starts_with('-') => u32::MAX,
        _ => 0,
    }
}

/// Longest prefix of `s` that reads as a number: optional sign, digits, and
/// for decimals a fractional part and exponent.
fn numeric_prefix(s: &str, decimal: bool) -> &str {
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }

    let int_start = end;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    let mut mantissa_digits = end - int_start;

    if decimal {
        if bytes.get(end) == Some(&b'.') {
            let frac_start = end + 1;
            let mut frac_end = frac_start;
            while bytes.get(frac_end).is_some_and(u8::is_ascii_digit) {
                frac_end += 1;
            }
            mantissa_digits += frac_end - frac_start;
            if mantissa_digits > 0 {
                end = frac_end;
            }
        }

        if mantissa_digits > 0 && matches!(bytes.get(end), Some(b'e' | b'E')) {
            let mut exp_end = end + 1;
            if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
                exp_end += 1;
            }
            let exp_digits_start = exp_end;
            while bytes.get(exp_end).is_some_and(u8::is_ascii_digit) {
                exp_end += 1;
            }
            if exp_end > exp_digits_start {
                end = exp_end;
            }
        }
    }

    if mantissa_digits == 0 {
        return "";
    }
    s.get(..end).unwrap_or_default()
}

/// Whether the form creates a new product or edits an existing one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormMode {
    Creating,
    Editing(ProductId),
}

/// Where the form is in its lifecycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormStatus {
    #[default]
    Closed,
    Open(FormMode),
    /// Waiting for the admin to accept or reject a non-drive image link.
    PendingConfirmation(FormMode),
    Submitting(FormMode),
}

impl FormStatus {
    const fn name(&self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Open(_) => "open",
            Self::PendingConfirmation(_) => "awaiting confirmation",
            Self::Submitting(_) => "saving",
        }
    }

    #[must_use]
    pub const fn mode(&self) -> Option<&FormMode> {
        match self {
            Self::Closed => None,
            Self::Open(mode) | Self::PendingConfirmation(mode) | Self::Submitting(mode) => {
                Some(mode)
            }
        }
    }
}

/// A validated write, ready to send to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitPlan {
    pub mode: FormMode,
    pub fields: ProductFields,
}

/// Result of asking to submit.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// The image link needs confirmation first.
    NeedsConfirmation,
    /// The form is now `Submitting`; run the plan and report back through
    /// [`ProductForm::complete`].
    Ready(SubmitPlan),
}

/// The product form: status, buffer, and the last error shown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductForm {
    pub status: FormStatus,
    pub draft: ProductDraft,
    pub error: Option<String>,
}

impl ProductForm {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn is_busy(&self) -> bool {
        matches!(self.status, FormStatus::Submitting(_))
    }

    #[must_use]
    pub const fn is_open(&self) -> bool {
        !matches!(self.status, FormStatus::Closed)
    }

    /// Open an empty form for a new product.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::Busy`] while a submission is in flight.
    pub fn open_new(&mut self) -> Result<(), FormError> {
        self.ensure_idle()?;
        *self = Self {
            status: FormStatus::Open(FormMode::Creating),
            draft: ProductDraft::default(),
            error: None,
        };
        Ok(())
    }

    /// Open the form seeded from an existing product.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::Busy`] while a submission is in flight.
    pub fn open_edit(&mut self, product: &Product) -> Result<(), FormError> {
        self.ensure_idle()?;
        *self = Self {
            status: FormStatus::Open(FormMode::Editing(product.id.clone())),
            draft: ProductDraft::from(product),
            error: None,
        };
        Ok(())
    }

    /// Replace the buffer with what the admin typed.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::Busy`] while submitting and
    /// [`FormError::InvalidTransition`] unless the form is open.
    pub fn update_draft(&mut self, draft: ProductDraft) -> Result<(), FormError> {
        match self.status {
            FormStatus::Open(_) => {
                self.draft = draft;
                Ok(())
            }
            FormStatus::Submitting(_) => Err(FormError::Busy),
            _ => Err(self.invalid("edit")),
        }
    }

    /// Validate the buffer and move towards submission.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::Validation`] (recorded in `error`, form stays
    /// open), [`FormError::Busy`] while submitting, or
    /// [`FormError::InvalidTransition`] unless the form is open.
    pub fn request_submit(&mut self, categories: &[Category]) -> Result<SubmitOutcome, FormError> {
        let mode = match &self.status {
            FormStatus::Open(mode) => mode.clone(),
            FormStatus::Submitting(_) => return Err(FormError::Busy),
            _ => return Err(self.invalid("submit")),
        };

        let fields = match self.draft.normalize(categories) {
            Ok(fields) => fields,
            Err(e) => {
                self.error = Some(e.to_string());
                return Err(e);
            }
        };

        if self.draft.needs_image_confirmation() {
            self.status = FormStatus::PendingConfirmation(mode);
            return Ok(SubmitOutcome::NeedsConfirmation);
        }

        self.error = None;
        self.status = FormStatus::Submitting(mode.clone());
        Ok(SubmitOutcome::Ready(SubmitPlan { mode, fields }))
    }

    /// Answer the image-link prompt.
    ///
    /// Declining returns to the open form with nothing else changed.
    /// Accepting moves to `Submitting` and returns the plan.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::InvalidTransition`] if no prompt is pending, or
    /// [`FormError::Validation`] if the buffer no longer validates.
    pub fn confirm(
        &mut self,
        accept: bool,
        categories: &[Category],
    ) -> Result<Option<SubmitPlan>, FormError> {
        let FormStatus::PendingConfirmation(mode) = &self.status else {
            return Err(self.invalid("confirm"));
        };
        let mode = mode.clone();

        if !accept {
            self.status = FormStatus::Open(mode);
            return Ok(None);
        }

        let fields = match self.draft.normalize(categories) {
            Ok(fields) => fields,
            Err(e) => {
                self.status = FormStatus::Open(mode);
                self.error = Some(e.to_string());
                return Err(e);
            }
        };
        self.error = None;
        self.status = FormStatus::Submitting(mode.clone());
        Ok(Some(SubmitPlan { mode, fields }))
    }

    /// Record the outcome of the write started by a [`SubmitPlan`].
    ///
    /// Success closes and resets the form; failure reopens it in the same
    /// mode with the buffer intact and the message shown.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::InvalidTransition`] unless the form is submitting.
    pub fn complete(&mut self, result: Result<(), String>) -> Result<(), FormError> {
        let FormStatus::Submitting(mode) = &self.status else {
            return Err(self.invalid("finish saving"));
        };

        match result {
            Ok(()) => *self = Self::default(),
            Err(message) => {
                self.status = FormStatus::Open(mode.clone());
                self.error = Some(message);
            }
        }
        Ok(())
    }

    /// Discard the buffer and close.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::Busy`] while a submission is in flight.
    pub fn close(&mut self) -> Result<(), FormError> {
        self.ensure_idle()?;
        *self = Self::default();
        Ok(())
    }

    /// Reopen a form left in `Submitting` by a write that never reported
    /// back, keeping the buffer. Only call this when no write for the form
    /// can still be running. Returns whether the form was stuck.
    pub fn recover_interrupted(&mut self) -> bool {
        let FormStatus::Submitting(mode) = &self.status else {
            return false;
        };
        self.status = FormStatus::Open(mode.clone());
        self.error = Some(INTERRUPTED_MESSAGE.to_string());
        true
    }

    const fn ensure_idle(&self) -> Result<(), FormError> {
        if self.is_busy() {
            return Err(FormError::Busy);
        }
        Ok(())
    }

    const fn invalid(&self, action: &'static str) -> FormError {
        FormError::InvalidTransition {
            action,
            state: self.status.name(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use chrono::Utc;
    use trident_core::CategoryId;

    use super::*;

    const DRIVE: &str = "https://drive.google.com/file/d/abc123/view";

    fn lighting() -> Vec<Category> {
        vec![Category {
            id: CategoryId::new("c1"),
            name: "Lighting".to_string(),
        }]
    }

    fn product() -> Product {
        Product {
            id: ProductId::new("p1"),
            name: "Panel".to_string(),
            price: 1299.5,
            category: "Lighting".to_string(),
            description: String::new(),
            image: DRIVE.to_string(),
            stock: 4,
            created_at: Some(Utc::now()),
            updated_at: Some(Utc::now()),
        }
    }

    fn draft(name: &str, image: &str) -> ProductDraft {
        ProductDraft {
            name: name.to_string(),
            image: image.to_string(),
            ..ProductDraft::default()
        }
    }

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price("19.99"), 19.99);
        assert_eq!(parse_price("abc"), 0.0);
        assert_eq!(parse_price(""), 0.0);
        assert_eq!(parse_price("  42.5 rupees"), 42.5);
        assert_eq!(parse_price(".5"), 0.5);
        assert_eq!(parse_price("1e3"), 1000.0);
        assert_eq!(parse_price("12."), 12.0);
        assert_eq!(parse_price("-3"), 0.0);
        assert_eq!(parse_price("1e999"), 0.0);
    }

    #[test]
    fn test_parse_stock() {
        assert_eq!(parse_stock("10"), 10);
        assert_eq!(parse_stock("12.7"), 12);
        assert_eq!(parse_stock("  7 boxes"), 7);
        assert_eq!(parse_stock("abc"), 0);
        assert_eq!(parse_stock("-5"), 0);
        assert_eq!(parse_stock("99999999999"), u32::MAX);
    }

    #[test]
    fn test_open_new_resets_buffer() {
        let mut form = ProductForm::new();
        form.open_edit(&product()).unwrap();
        form.open_new().unwrap();

        assert_eq!(form.status, FormStatus::Open(FormMode::Creating));
        assert_eq!(form.draft, ProductDraft::default());
        assert_eq!(form.draft.stock, "10");
    }

    #[test]
    fn test_open_edit_seeds_text_fields() {
        let mut form = ProductForm::new();
        form.open_edit(&product()).unwrap();

        assert_eq!(
            form.status,
            FormStatus::Open(FormMode::Editing(ProductId::new("p1")))
        );
        assert_eq!(form.draft.price, "1299.5");
        assert_eq!(form.draft.stock, "4");
    }

    #[test]
    fn test_blank_name_is_validation_error() {
        let mut form = ProductForm::new();
        form.open_new().unwrap();
        form.update_draft(draft("   ", DRIVE)).unwrap();

        let err = form.request_submit(&lighting()).unwrap_err();
        assert!(matches!(err, FormError::Validation(_)));
        assert_eq!(form.status, FormStatus::Open(FormMode::Creating));
        assert!(form.error.is_some());
    }

    #[test]
    fn test_drive_image_submits_directly() {
        let mut form = ProductForm::new();
        form.open_new().unwrap();
        form.update_draft(draft("Lamp", DRIVE)).unwrap();

        let SubmitOutcome::Ready(plan) = form.request_submit(&lighting()).unwrap() else {
            panic!("expected ready");
        };
        assert_eq!(plan.mode, FormMode::Creating);
        assert_eq!(plan.fields.category, "Lighting");
        assert_eq!(plan.fields.stock, 10);
        assert!(form.is_busy());
    }

    #[test]
    fn test_category_falls_back_to_uncategorized() {
        let fields = draft("Lamp", DRIVE).normalize(&[]).unwrap();
        assert_eq!(fields.category, UNCATEGORIZED);
    }

    #[test]
    fn test_non_drive_image_needs_confirmation() {
        let mut form = ProductForm::new();
        form.open_new().unwrap();
        form.update_draft(draft("Lamp", "https://cdn.example.com/a.png"))
            .unwrap();

        assert_eq!(
            form.request_submit(&lighting()).unwrap(),
            SubmitOutcome::NeedsConfirmation
        );
        assert_eq!(
            form.status,
            FormStatus::PendingConfirmation(FormMode::Creating)
        );

        // Declining is a silent return to the open form.
        let before = form.draft.clone();
        assert_eq!(form.confirm(false, &lighting()).unwrap(), None);
        assert_eq!(form.status, FormStatus::Open(FormMode::Creating));
        assert_eq!(form.draft, before);
        assert!(form.error.is_none());

        form.request_submit(&lighting()).unwrap();
        let plan = form.confirm(true, &lighting()).unwrap().unwrap();
        assert_eq!(plan.fields.image, "https://cdn.example.com/a.png");
        assert!(form.is_busy());
    }

    #[test]
    fn test_empty_image_needs_confirmation() {
        assert!(draft("Lamp", "").needs_image_confirmation());
        assert!(!draft("Lamp", DRIVE).needs_image_confirmation());
    }

    #[test]
    fn test_busy_rejects_everything() {
        let mut form = ProductForm::new();
        form.open_new().unwrap();
        form.update_draft(draft("Lamp", DRIVE)).unwrap();
        form.request_submit(&lighting()).unwrap();

        assert_eq!(form.request_submit(&lighting()), Err(FormError::Busy));
        assert_eq!(form.close(), Err(FormError::Busy));
        assert_eq!(form.open_new(), Err(FormError::Busy));
        assert_eq!(form.update_draft(draft("X", DRIVE)), Err(FormError::Busy));
    }

    #[test]
    fn test_complete_success_closes() {
        let mut form = ProductForm::new();
        form.open_edit(&product()).unwrap();
        form.request_submit(&lighting()).unwrap();

        form.complete(Ok(())).unwrap();
        assert_eq!(form, ProductForm::default());
    }

    #[test]
    fn test_complete_failure_reopens_with_error() {
        let mut form = ProductForm::new();
        form.open_edit(&product()).unwrap();
        form.request_submit(&lighting()).unwrap();

        form.complete(Err("permission denied".to_string())).unwrap();
        assert_eq!(
            form.status,
            FormStatus::Open(FormMode::Editing(ProductId::new("p1")))
        );
        assert_eq!(form.error.as_deref(), Some("permission denied"));
        assert_eq!(form.draft.name, "Panel");

        // Retry is allowed.
        assert!(matches!(
            form.request_submit(&lighting()).unwrap(),
            SubmitOutcome::Ready(_)
        ));
    }

    #[test]
    fn test_invalid_transitions() {
        let mut form = ProductForm::new();
        assert!(matches!(
            form.request_submit(&[]),
            Err(FormError::InvalidTransition { .. })
        ));
        assert!(matches!(
            form.confirm(true, &[]),
            Err(FormError::InvalidTransition { .. })
        ));
        assert!(matches!(
            form.complete(Ok(())),
            Err(FormError::InvalidTransition { .. })
        ));
        form.close().unwrap();
    }

    #[test]
    fn test_text_fields_are_written_as_typed() {
        let typed = ProductDraft {
            name: "Lamp ".to_string(),
            category: " Fans".to_string(),
            image: format!(" {DRIVE}"),
            ..ProductDraft::default()
        };
        let fields = typed.normalize(&lighting()).unwrap();
        assert_eq!(fields.name, "Lamp ");
        assert_eq!(fields.category, " Fans");
        assert_eq!(fields.image, format!(" {DRIVE}"));
    }

    #[test]
    fn test_unchanged_edit_writes_back_same_text() {
        let stored = Product {
            name: "Panel  ".to_string(),
            ..product()
        };
        let mut form = ProductForm::new();
        form.open_edit(&stored).unwrap();

        let SubmitOutcome::Ready(plan) = form.request_submit(&lighting()).unwrap() else {
            panic!("expected ready");
        };
        assert_eq!(plan.fields.name, stored.name);
        assert_eq!(plan.fields.category, stored.category);
        assert_eq!(plan.fields.image, stored.image);
    }

    #[test]
    fn test_recover_interrupted_reopens_with_buffer() {
        let mut form = ProductForm::new();
        form.open_edit(&product()).unwrap();
        form.request_submit(&lighting()).unwrap();
        assert!(form.is_busy());

        assert!(form.recover_interrupted());
        assert_eq!(
            form.status,
            FormStatus::Open(FormMode::Editing(ProductId::new("p1")))
        );
        assert_eq!(form.error.as_deref(), Some(INTERRUPTED_MESSAGE));
        assert_eq!(form.draft.name, "Panel");
        form.close().unwrap();

        assert!(!form.recover_interrupted());
        assert_eq!(form, ProductForm::default());
    }

    #[test]
    fn test_form_round_trips_through_json() {
        let mut form = ProductForm::new();
        form.open_edit(&product()).unwrap();
        let json = serde_json::to_string(&form).unwrap();
        let back: ProductForm = serde_json::from_str(&json).unwrap();
        assert_eq!(back, form);
    }
}
