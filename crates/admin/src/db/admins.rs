//! Admin grants.
//!
//! An admin is any user whose auth UID has a document in `admins`. The
//! document's contents are irrelevant; presence is the whole signal.

use trident_core::AdminId;

use super::RepositoryError;
use crate::gateway::Identity;
use crate::store::{Collection, Fields, RecordStore, StoreError};

/// Write payload for granting admin rights.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminGrant {
    pub uid: AdminId,
}

impl AdminGrant {
    #[must_use]
    pub const fn new(uid: AdminId) -> Self {
        Self { uid }
    }

    fn fields(&self) -> Fields {
        Fields::new()
    }
}

/// Repository for the `admins` collection.
pub struct AdminRepository<'a> {
    store: &'a dyn RecordStore,
    caller: &'a Identity,
}

impl<'a> AdminRepository<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn RecordStore, caller: &'a Identity) -> Self {
        Self { store, caller }
    }

    /// Whether `uid` has an admin document.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the lookup fails.
    pub async fn exists(&self, uid: &AdminId) -> Result<bool, RepositoryError> {
        Ok(self
            .store
            .exists(self.caller, Collection::Admins, uid.as_str())
            .await?)
    }

    /// Grant admin rights. Returns `false` if the user was already an admin.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the write fails.
    pub async fn grant(&self, grant: &AdminGrant) -> Result<bool, RepositoryError> {
        match self
            .store
            .insert(
                self.caller,
                Collection::Admins,
                grant.uid.as_str(),
                grant.fields(),
            )
            .await
        {
            Ok(()) => Ok(true),
            Err(StoreError::AlreadyExists { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove admin rights.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the delete fails.
    pub async fn revoke(&self, uid: &AdminId) -> Result<(), RepositoryError> {
        self.store
            .delete(self.caller, Collection::Admins, uid.as_str())
            .await?;
        Ok(())
    }

    /// UIDs of every admin.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the listing fails.
    pub async fn list(&self) -> Result<Vec<AdminId>, RepositoryError> {
        let docs = self.store.list(self.caller, Collection::Admins).await?;
        Ok(docs.into_iter().map(|doc| AdminId::new(doc.id)).collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;

    #[tokio::test]
    async fn test_grant_exists_revoke() {
        let store = InMemoryStore::new();
        let caller = Identity::for_tests("uid-1", "admin@tridentnova.com");
        let repo = AdminRepository::new(&store, &caller);
        let uid = AdminId::new("uid-2");

        assert!(!repo.exists(&uid).await.unwrap());
        assert!(repo.grant(&AdminGrant::new(uid.clone())).await.unwrap());
        assert!(!repo.grant(&AdminGrant::new(uid.clone())).await.unwrap());
        assert!(repo.exists(&uid).await.unwrap());
        assert_eq!(repo.list().await.unwrap(), vec![uid.clone()]);

        repo.revoke(&uid).await.unwrap();
        assert!(!repo.exists(&uid).await.unwrap());
    }
}
