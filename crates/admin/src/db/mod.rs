//! Typed repositories over the record store, plus the session database pool.
//!
//! # Collections
//!
//! - `products` - [`ProductRepository`]
//! - `categories` - [`CategoryRepository`]
//! - `admins` - [`AdminRepository`]
//!
//! Repositories borrow the store and the signed-in caller for the duration
//! of a request. Documents are decoded into `trident_core` types here; a
//! document that cannot be decoded is reported as
//! [`RepositoryError::DataCorruption`].
//!
//! # Sessions
//!
//! `PostgreSQL` holds nothing but the session table. Create it with:
//! ```bash
//! cargo run -p trident-cli -- migrate sessions
//! ```

pub mod admins;
pub mod categories;
pub mod products;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use crate::store::StoreError;

pub use admins::{AdminGrant, AdminRepository};
pub use categories::CategoryRepository;
pub use products::ProductRepository;

/// Field names shared by the product and category documents.
pub mod fields {
    pub const NAME: &str = "name";
    pub const PRICE: &str = "price";
    pub const CATEGORY: &str = "category";
    pub const DESCRIPTION: &str = "description";
    pub const IMAGE: &str = "image";
    pub const STOCK: &str = "stock";
    pub const CREATED_AT: &str = "createdAt";
    pub const UPDATED_AT: &str = "updatedAt";
}

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Record store failure.
    #[error("store error: {0}")]
    Store(StoreError),

    /// A stored document is missing required fields or has the wrong types.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,
}

impl From<StoreError> for RepositoryError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } | StoreError::InvalidId { .. } => Self::NotFound,
            other => Self::Store(other),
        }
    }
}

/// Create a `PostgreSQL` connection pool for the session store.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
