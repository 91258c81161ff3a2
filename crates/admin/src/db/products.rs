//! Product repository.

use trident_core::{Product, ProductFields, ProductId};

use super::{RepositoryError, fields};
use crate::gateway::Identity;
use crate::store::{Collection, Document, FieldValue, Fields, RecordStore};

// =============================================================================
// Document Conversion
// =============================================================================

impl TryFrom<Document> for Product {
    type Error = RepositoryError;

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn try_from(doc: Document) -> Result<Self, Self::Error> {
        let name = doc
            .string(fields::NAME)
            .ok_or_else(|| {
                RepositoryError::DataCorruption(format!("product {} has no name", doc.id))
            })?
            .to_owned();

        // Other writers may have stored loose values; read them the way the
        // form would have normalized them.
        let price = doc
            .number(fields::PRICE)
            .filter(|p| p.is_finite() && *p >= 0.0)
            .unwrap_or(0.0);
        let stock = doc
            .integer(fields::STOCK)
            .map_or(0, |s| s.clamp(0, i64::from(u32::MAX)) as u32);
        let text = |key: &str| doc.string(key).unwrap_or_default().to_owned();

        Ok(Self {
            name,
            price,
            category: text(fields::CATEGORY),
            description: text(fields::DESCRIPTION),
            image: text(fields::IMAGE),
            stock,
            created_at: doc.timestamp(fields::CREATED_AT),
            updated_at: doc.timestamp(fields::UPDATED_AT),
            id: ProductId::new(doc.id),
        })
    }
}

fn to_fields(product: &ProductFields) -> Fields {
    let mut out = Fields::new();
    out.insert(fields::NAME.into(), FieldValue::from(product.name.as_str()));
    out.insert(fields::PRICE.into(), FieldValue::from(product.price));
    out.insert(fields::CATEGORY.into(), FieldValue::from(product.category.as_str()));
    out.insert(
        fields::DESCRIPTION.into(),
        FieldValue::from(product.description.as_str()),
    );
    out.insert(fields::IMAGE.into(), FieldValue::from(product.image.as_str()));
    out.insert(fields::STOCK.into(), FieldValue::from(product.stock));
    out.insert(fields::UPDATED_AT.into(), FieldValue::ServerTimestamp);
    out
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for the `products` collection.
pub struct ProductRepository<'a> {
    store: &'a dyn RecordStore,
    caller: &'a Identity,
}

impl<'a> ProductRepository<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn RecordStore, caller: &'a Identity) -> Self {
        Self { store, caller }
    }

    /// All products in store order.
    ///
    /// Documents that cannot be decoded are skipped and logged so one bad
    /// record does not hide the rest of the inventory.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the listing fails.
    pub async fn list_all(&self) -> Result<Vec<Product>, RepositoryError> {
        let docs = self.store.list(self.caller, Collection::Products).await?;
        Ok(docs
            .into_iter()
            .filter_map(|doc| {
                let id = doc.id.clone();
                Product::try_from(doc)
                    .inspect_err(|e| tracing::warn!(product_id = %id, "Skipping product: {e}"))
                    .ok()
            })
            .collect())
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the read fails.
    /// Returns `RepositoryError::DataCorruption` if the document is invalid.
    pub async fn get(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        self.store
            .get(self.caller, Collection::Products, id.as_str())
            .await?
            .map(Product::try_from)
            .transpose()
    }

    /// Create a product. Both timestamps are set by the store.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the write fails.
    pub async fn create(&self, product: &ProductFields) -> Result<ProductId, RepositoryError> {
        let mut data = to_fields(product);
        data.insert(fields::CREATED_AT.into(), FieldValue::ServerTimestamp);

        let id = self
            .store
            .create(self.caller, Collection::Products, data)
            .await?;
        Ok(ProductId::new(id))
    }

    /// Overwrite a product's writable fields and refresh `updatedAt`.
    /// `createdAt` is left untouched.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product no longer exists.
    /// Returns `RepositoryError::Store` if the write fails.
    pub async fn update(
        &self,
        id: &ProductId,
        product: &ProductFields,
    ) -> Result<(), RepositoryError> {
        self.store
            .update(
                self.caller,
                Collection::Products,
                id.as_str(),
                to_fields(product),
            )
            .await?;
        Ok(())
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the delete fails.
    pub async fn delete(&self, id: &ProductId) -> Result<(), RepositoryError> {
        self.store
            .delete(self.caller, Collection::Products, id.as_str())
            .await?;
        Ok(())
    }
}
