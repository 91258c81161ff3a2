//! Record store: the document database behind the admin panel.
//!
//! # Collections
//!
//! - `products` - Product documents (auto IDs)
//! - `categories` - Category documents (auto IDs)
//! - `admins` - One empty document per authorized admin, keyed by auth UID
//!
//! # Backends
//!
//! - [`FirestoreStore`] - Cloud Firestore REST API (production)
//! - [`InMemoryStore`] - Process-local store (tests, local demo mode)
//!
//! Every operation runs *as* a signed-in [`Identity`]; the Firestore backend
//! forwards the identity's ID token so the project's security rules apply.
//! There is no client-side locking or versioning: concurrent writers race
//! and the last write wins.

mod firestore;
mod memory;

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::{Rng, distr::Alphanumeric};
use thiserror::Error;

use crate::gateway::Identity;

pub use firestore::FirestoreStore;
pub use memory::InMemoryStore;

/// Length of generated document IDs (matches Firestore client SDKs).
pub const AUTO_ID_LENGTH: usize = 20;

/// The logical collections the admin panel reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Products,
    Categories,
    Admins,
}

impl Collection {
    /// Collection path segment.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Products => "products",
            Self::Categories => "categories",
            Self::Admins => "admins",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single stored field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    String(String),
    Integer(i64),
    Double(f64),
    Timestamp(DateTime<Utc>),
    /// Write-only sentinel: the store substitutes its own clock at commit.
    ServerTimestamp,
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

/// Field map of a document. Ordered so serialized writes are deterministic.
pub type Fields = BTreeMap<String, FieldValue>;

/// A document read back from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    /// String field, if present and a string.
    #[must_use]
    pub fn string(&self, key: &str) -> Option<&str> {
        match self.fields.get(key) {
            Some(FieldValue::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Numeric field as `f64`, accepting integer or double storage.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn number(&self, key: &str) -> Option<f64> {
        match self.fields.get(key) {
            Some(FieldValue::Double(d)) => Some(*d),
            Some(FieldValue::Integer(i)) => Some(*i as f64),
            _ => None,
        }
    }

    /// Integer field, accepting whole-valued doubles.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn integer(&self, key: &str) -> Option<i64> {
        match self.fields.get(key) {
            Some(FieldValue::Integer(i)) => Some(*i),
            Some(FieldValue::Double(d)) if d.fract() == 0.0 && d.is_finite() => Some(*d as i64),
            _ => None,
        }
    }

    /// Timestamp field, if present and a timestamp.
    #[must_use]
    pub fn timestamp(&self, key: &str) -> Option<DateTime<Utc>> {
        match self.fields.get(key) {
            Some(FieldValue::Timestamp(ts)) => Some(*ts),
            _ => None,
        }
    }
}

/// Errors returned by record store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The document does not exist (update on a missing document).
    #[error("document not found: {collection}/{id}")]
    NotFound { collection: Collection, id: String },

    /// A create collided with an existing document.
    #[error("document already exists: {collection}/{id}")]
    AlreadyExists { collection: Collection, id: String },

    /// The caller's credential was rejected or lacks access.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Transport-level failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The store answered with an error.
    #[error("store error ({status}): {message}")]
    Service { status: u16, message: String },

    /// The store answered with something we could not interpret.
    #[error("invalid store response: {0}")]
    InvalidResponse(String),

    /// The ID cannot name a document, so it never reaches the store.
    #[error("invalid document id: {collection}/{id:?}")]
    InvalidId { collection: Collection, id: String },
}

/// Document database operations, scoped to a signed-in caller.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert a document under a caller-chosen ID.
    ///
    /// Fails with [`StoreError::AlreadyExists`] if the ID is taken.
    async fn insert(
        &self,
        caller: &Identity,
        collection: Collection,
        id: &str,
        fields: Fields,
    ) -> Result<(), StoreError>;

    /// Replace the given fields of an existing document, leaving others as
    /// they are.
    ///
    /// Fails with [`StoreError::NotFound`] if the document does not exist.
    async fn update(
        &self,
        caller: &Identity,
        collection: Collection,
        id: &str,
        fields: Fields,
    ) -> Result<(), StoreError>;

    /// Delete a document. Deleting a missing document is not an error.
    async fn delete(
        &self,
        caller: &Identity,
        collection: Collection,
        id: &str,
    ) -> Result<(), StoreError>;

    /// Fetch a document by ID.
    async fn get(
        &self,
        caller: &Identity,
        collection: Collection,
        id: &str,
    ) -> Result<Option<Document>, StoreError>;

    /// Every document in the collection, in the store's natural order.
    async fn list(
        &self,
        caller: &Identity,
        collection: Collection,
    ) -> Result<Vec<Document>, StoreError>;

    /// Insert a document under a freshly generated ID and return the ID.
    async fn create(
        &self,
        caller: &Identity,
        collection: Collection,
        fields: Fields,
    ) -> Result<String, StoreError> {
        let id = auto_id();
        self.insert(caller, collection, &id, fields).await?;
        Ok(id)
    }

    /// Whether a document with this ID exists.
    async fn exists(
        &self,
        caller: &Identity,
        collection: Collection,
        id: &str,
    ) -> Result<bool, StoreError> {
        Ok(self.get(caller, collection, id).await?.is_some())
    }
}

/// Longest ID accepted, in bytes.
pub const MAX_ID_LENGTH: usize = 1500;

/// Whether `id` can name a document: ASCII letters, digits, `-` and `_`,
/// and not a reserved `__name__` form. Generated IDs and Firebase UIDs
/// always pass.
#[must_use]
pub fn is_valid_document_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_ID_LENGTH
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        && !(id.len() > 4 && id.starts_with("__") && id.ends_with("__"))
}

/// Reject an ID before it is spliced into a document path.
///
/// # Errors
///
/// Returns [`StoreError::InvalidId`] unless [`is_valid_document_id`] holds.
pub fn check_document_id(collection: Collection, id: &str) -> Result<(), StoreError> {
    if is_valid_document_id(id) {
        Ok(())
    } else {
        Err(StoreError::InvalidId {
            collection,
            id: id.to_owned(),
        })
    }
}

/// Generate a random alphanumeric document ID.
#[must_use]
pub fn auto_id() -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(AUTO_ID_LENGTH)
        .map(char::from)
        .collect()
}
