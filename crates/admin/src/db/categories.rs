//! Category repository.

use trident_core::{Category, CategoryFields, CategoryId};

use super::{RepositoryError, fields};
use crate::gateway::Identity;
use crate::store::{Collection, Document, FieldValue, Fields, RecordStore};

impl TryFrom<Document> for Category {
    type Error = RepositoryError;

    fn try_from(doc: Document) -> Result<Self, Self::Error> {
        let name = doc
            .string(fields::NAME)
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| {
                RepositoryError::DataCorruption(format!("category {} has no name", doc.id))
            })?
            .to_owned();

        Ok(Self {
            id: CategoryId::new(doc.id),
            name,
        })
    }
}

/// Repository for the `categories` collection.
pub struct CategoryRepository<'a> {
    store: &'a dyn RecordStore,
    caller: &'a Identity,
}

impl<'a> CategoryRepository<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn RecordStore, caller: &'a Identity) -> Self {
        Self { store, caller }
    }

    /// All categories in store order. Undecodable documents are skipped.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the listing fails.
    pub async fn list_all(&self) -> Result<Vec<Category>, RepositoryError> {
        let docs = self.store.list(self.caller, Collection::Categories).await?;
        Ok(docs
            .into_iter()
            .filter_map(|doc| {
                let id = doc.id.clone();
                Category::try_from(doc)
                    .inspect_err(|e| tracing::warn!(category_id = %id, "Skipping category: {e}"))
                    .ok()
            })
            .collect())
    }

    /// Create a category. Names are not checked for uniqueness.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the write fails.
    pub async fn create(&self, category: &CategoryFields) -> Result<CategoryId, RepositoryError> {
        let mut data = Fields::new();
        data.insert(fields::NAME.into(), FieldValue::from(category.name.as_str()));

        let id = self
            .store
            .create(self.caller, Collection::Categories, data)
            .await?;
        Ok(CategoryId::new(id))
    }

    /// Delete a category. Products naming it keep their category text.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the delete fails.
    pub async fn delete(&self, id: &CategoryId) -> Result<(), RepositoryError> {
        self.store
            .delete(self.caller, Collection::Categories, id.as_str())
            .await?;
        Ok(())
    }
}
