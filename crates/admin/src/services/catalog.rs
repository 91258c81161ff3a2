//! Product and category writes driven by the dashboard forms.

use tracing::instrument;
use trident_core::{Category, CategoryFields, CategoryId, Product, ProductId};

use crate::db::{CategoryRepository, ProductRepository, RepositoryError};
use crate::forms::{DeletePrompt, FormMode, SubmitPlan};
use crate::gateway::Identity;
use crate::store::RecordStore;

/// Everything the inventory page shows.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub products: Vec<Product>,
    pub categories: Vec<Category>,
}

/// Catalog operations on behalf of a signed-in admin.
pub struct CatalogService<'a> {
    products: ProductRepository<'a>,
    categories: CategoryRepository<'a>,
}

impl<'a> CatalogService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn RecordStore, caller: &'a Identity) -> Self {
        Self {
            products: ProductRepository::new(store, caller),
            categories: CategoryRepository::new(store, caller),
        }
    }

    /// Load products and categories together.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if either listing fails.
    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<Catalog, RepositoryError> {
        let (products, categories) =
            tokio::try_join!(self.products.list_all(), self.categories.list_all())?;
        Ok(Catalog {
            products,
            categories,
        })
    }

    /// # Errors
    ///
    /// Returns `RepositoryError` if the listing fails.
    pub async fn categories(&self) -> Result<Vec<Category>, RepositoryError> {
        self.categories.list_all().await
    }

    /// # Errors
    ///
    /// Returns `RepositoryError` if the read fails.
    pub async fn product(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        self.products.get(id).await
    }

    /// Carry out a product form submission.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the write fails.
    #[instrument(skip(self, plan), fields(mode = ?plan.mode))]
    pub async fn save(&self, plan: &SubmitPlan) -> Result<ProductId, RepositoryError> {
        match &plan.mode {
            FormMode::Creating => {
                let id = self.products.create(&plan.fields).await?;
                tracing::info!(product_id = %id, name = %plan.fields.name, "Product created");
                Ok(id)
            }
            FormMode::Editing(id) => {
                self.products.update(id, &plan.fields).await?;
                tracing::info!(product_id = %id, "Product updated");
                Ok(id.clone())
            }
        }
    }

    /// Add a category. Blank names are ignored and return `None`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the write fails.
    #[instrument(skip(self))]
    pub async fn add_category(&self, name: &str) -> Result<Option<CategoryId>, RepositoryError> {
        let Some(fields) = CategoryFields::new(name) else {
            return Ok(None);
        };
        let id = self.categories.create(&fields).await?;
        tracing::info!(category_id = %id, name = %fields.name, "Category created");
        Ok(Some(id))
    }

    /// Carry out a confirmed deletion. Deleting a category leaves products
    /// that name it untouched.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the delete fails; the record stays.
    #[instrument(skip(self))]
    pub async fn delete(&self, prompt: &DeletePrompt) -> Result<(), RepositoryError> {
        match prompt {
            DeletePrompt::Product { id, .. } => {
                self.products.delete(id).await?;
                tracing::info!(product_id = %id, "Product deleted");
            }
            DeletePrompt::Category { id, .. } => {
                self.categories.delete(id).await?;
                tracing::info!(category_id = %id, "Category deleted");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use trident_core::ProductFields;

    use super::*;
    use crate::store::InMemoryStore;

    fn caller() -> Identity {
        Identity::for_tests("uid-1", "admin@tridentnova.com")
    }

    fn plan(mode: FormMode, category: &str) -> SubmitPlan {
        SubmitPlan {
            mode,
            fields: ProductFields {
                name: "Lamp".to_string(),
                price: 10.0,
                category: category.to_string(),
                description: String::new(),
                image: String::new(),
                stock: 1,
            },
        }
    }

    #[tokio::test]
    async fn test_blank_category_name_is_ignored() {
        let store = InMemoryStore::new();
        let caller = caller();
        let catalog = CatalogService::new(&store, &caller);

        assert_eq!(catalog.add_category("   ").await.unwrap(), None);
        assert!(catalog.categories().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_deleting_category_keeps_product_text() {
        let store = InMemoryStore::new();
        let caller = caller();
        let catalog = CatalogService::new(&store, &caller);

        let category = catalog.add_category("Fans").await.unwrap().unwrap();
        let product = catalog.save(&plan(FormMode::Creating, "Fans")).await.unwrap();

        catalog
            .delete(&DeletePrompt::Category {
                id: category,
                name: "Fans".to_string(),
            })
            .await
            .unwrap();

        let loaded = catalog.load().await.unwrap();
        assert!(loaded.categories.is_empty());
        assert_eq!(
            catalog.product(&product).await.unwrap().unwrap().category,
            "Fans"
        );
    }

    #[tokio::test]
    async fn test_failed_delete_leaves_record() {
        let store = InMemoryStore::new();
        let caller = caller();
        let catalog = CatalogService::new(&store, &caller);
        let id = catalog.save(&plan(FormMode::Creating, "Fans")).await.unwrap();

        store.set_offline(true);
        let prompt = DeletePrompt::Product {
            id: id.clone(),
            name: "Lamp".to_string(),
        };
        assert!(catalog.delete(&prompt).await.is_err());
        store.set_offline(false);

        assert!(catalog.product(&id).await.unwrap().is_some());
    }
}
