//! In-process record store.
//!
//! Keeps documents in insertion order per collection and stamps
//! `ServerTimestamp` fields from a clock that never repeats a value, so
//! ordering assertions on `updatedAt` hold even for back-to-back writes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use std::sync::{Mutex, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};

use crate::gateway::Identity;

use super::{
    Collection, Document, FieldValue, Fields, RecordStore, StoreError, check_document_id,
    is_valid_document_id,
};

/// Record store held entirely in memory.
#[derive(Default)]
pub struct InMemoryStore {
    collections: RwLock<HashMap<Collection, Vec<Document>>>,
    last_timestamp: Mutex<Option<DateTime<Utc>>>,
    offline: AtomicBool,
    latency_ms: AtomicU64,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail with a service error until
    /// switched back. Used to exercise failure paths.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Hold every subsequent operation for `delay` before it runs, the way
    /// a remote store takes a round-trip.
    pub fn set_latency(&self, delay: Duration) {
        let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.latency_ms.store(millis, Ordering::SeqCst);
    }

    /// Seed a document without a caller, bypassing the offline switch.
    pub fn seed(&self, collection: Collection, id: &str, fields: Fields) {
        let fields = self.resolve(fields);
        let mut collections = self
            .collections
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let documents = collections.entry(collection).or_default();
        documents.retain(|doc| doc.id != id);
        documents.push(Document {
            id: id.to_owned(),
            fields,
        });
    }

    /// Number of documents in a collection.
    #[must_use]
    pub fn len(&self, collection: Collection) -> usize {
        self.collections
            .read()
            .map(|collections| collections.get(&collection).map_or(0, Vec::len))
            .unwrap_or_default()
    }

    /// Whether a collection holds no documents.
    #[must_use]
    pub fn is_empty(&self, collection: Collection) -> bool {
        self.len(collection) == 0
    }

    async fn latency(&self) {
        let millis = self.latency_ms.load(Ordering::SeqCst);
        if millis > 0 {
            tokio::time::sleep(Duration::from_millis(millis)).await;
        }
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Service {
                status: 503,
                message: "store unavailable".to_string(),
            });
        }
        Ok(())
    }

    /// Next clock reading, strictly after the previous one.
    fn tick(&self) -> DateTime<Utc> {
        let mut last = self
            .last_timestamp
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let now = Utc::now();
        let next = match *last {
            Some(prev) if now <= prev => prev + TimeDelta::microseconds(1),
            _ => now,
        };
        *last = Some(next);
        next
    }

    /// Replace server timestamp sentinels. One reading per write, so fields
    /// stamped together compare equal.
    fn resolve(&self, mut fields: Fields) -> Fields {
        if fields.values().any(|v| matches!(v, FieldValue::ServerTimestamp)) {
            let now = self.tick();
            for value in fields.values_mut() {
                if matches!(value, FieldValue::ServerTimestamp) {
                    *value = FieldValue::Timestamp(now);
                }
            }
        }
        fields
    }

    fn poisoned() -> StoreError {
        StoreError::Service {
            status: 500,
            message: "store lock poisoned".to_string(),
        }
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn insert(
        &self,
        _caller: &Identity,
        collection: Collection,
        id: &str,
        fields: Fields,
    ) -> Result<(), StoreError> {
        self.latency().await;
        self.check_online()?;
        check_document_id(collection, id)?;
        let fields = self.resolve(fields);
        let mut collections = self.collections.write().map_err(|_| Self::poisoned())?;
        let documents = collections.entry(collection).or_default();
        if documents.iter().any(|doc| doc.id == id) {
            return Err(StoreError::AlreadyExists {
                collection,
                id: id.to_owned(),
            });
        }
        documents.push(Document {
            id: id.to_owned(),
            fields,
        });
        Ok(())
    }

    async fn update(
        &self,
        _caller: &Identity,
        collection: Collection,
        id: &str,
        fields: Fields,
    ) -> Result<(), StoreError> {
        self.latency().await;
        self.check_online()?;
        check_document_id(collection, id)?;
        let mut collections = self.collections.write().map_err(|_| Self::poisoned())?;
        let document = collections
            .get_mut(&collection)
            .and_then(|documents| documents.iter_mut().find(|doc| doc.id == id))
            .ok_or_else(|| StoreError::NotFound {
                collection,
                id: id.to_owned(),
            })?;
        document.fields.extend(self.resolve(fields));
        Ok(())
    }

    async fn delete(
        &self,
        _caller: &Identity,
        collection: Collection,
        id: &str,
    ) -> Result<(), StoreError> {
        self.latency().await;
        self.check_online()?;
        check_document_id(collection, id)?;
        let mut collections = self.collections.write().map_err(|_| Self::poisoned())?;
        if let Some(documents) = collections.get_mut(&collection) {
            documents.retain(|doc| doc.id != id);
        }
        Ok(())
    }

    async fn get(
        &self,
        _caller: &Identity,
        collection: Collection,
        id: &str,
    ) -> Result<Option<Document>, StoreError> {
        self.latency().await;
        self.check_online()?;
        if !is_valid_document_id(id) {
            return Ok(None);
        }
        let collections = self.collections.read().map_err(|_| Self::poisoned())?;
        Ok(collections
            .get(&collection)
            .and_then(|documents| documents.iter().find(|doc| doc.id == id))
            .cloned())
    }

    async fn list(
        &self,
        _caller: &Identity,
        collection: Collection,
    ) -> Result<Vec<Document>, StoreError> {
        self.latency().await;
        self.check_online()?;
        let collections = self.collections.read().map_err(|_| Self::poisoned())?;
        Ok(collections.get(&collection).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::gateway::Identity;

    fn caller() -> Identity {
        Identity::for_tests("uid-1", "admin@tridentnova.com")
    }

    fn named(name: &str) -> Fields {
        let mut fields = Fields::new();
        fields.insert("name".into(), FieldValue::from(name));
        fields
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_get_returns_it() {
        let store = InMemoryStore::new();
        let id = store
            .create(&caller(), Collection::Categories, named("Lighting"))
            .await
            .unwrap();

        let doc = store
            .get(&caller(), Collection::Categories, &id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc.string("name"), Some("Lighting"));
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_id() {
        let store = InMemoryStore::new();
        store
            .insert(&caller(), Collection::Products, "p1", named("A"))
            .await
            .unwrap();
        let err = store
            .insert(&caller(), Collection::Products, "p1", named("B"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists { .. }));
    }

    #[tokio::test]
    async fn test_update_requires_existing_document() {
        let store = InMemoryStore::new();
        let err = store
            .update(&caller(), Collection::Products, "missing", named("A"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_path_like_ids_never_reach_documents() {
        let store = InMemoryStore::new();
        store.seed(Collection::Admins, "uid-1", Fields::new());

        let err = store
            .delete(&caller(), Collection::Products, "x/../../admins/uid-1")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidId { .. }));
        assert!(
            store
                .get(&caller(), Collection::Products, "x/y")
                .await
                .unwrap()
                .is_none()
        );
        assert!(matches!(
            store
                .insert(&caller(), Collection::Products, "a?b", named("A"))
                .await,
            Err(StoreError::InvalidId { .. })
        ));
        assert_eq!(store.len(Collection::Admins), 1);
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let store = InMemoryStore::new();
        let mut fields = named("Lamp");
        fields.insert("stock".into(), FieldValue::Integer(3));
        store
            .insert(&caller(), Collection::Products, "p1", fields)
            .await
            .unwrap();

        store
            .update(&caller(), Collection::Products, "p1", named("Desk Lamp"))
            .await
            .unwrap();

        let doc = store
            .get(&caller(), Collection::Products, "p1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc.string("name"), Some("Desk Lamp"));
        assert_eq!(doc.integer("stock"), Some(3));
    }

    #[tokio::test]
    async fn test_latency_holds_operations() {
        let store = InMemoryStore::new();
        store.set_latency(Duration::from_millis(30));

        let started = std::time::Instant::now();
        store
            .insert(&caller(), Collection::Products, "p1", named("Lamp"))
            .await
            .unwrap();
        assert!(started.elapsed() >= Duration::from_millis(30));

        let started = std::time::Instant::now();
        let listed = store.list(&caller(), Collection::Products).await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(30));
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn test_server_timestamps_are_strictly_increasing() {
        let store = InMemoryStore::new();
        let mut fields = named("Lamp");
        fields.insert("createdAt".into(), FieldValue::ServerTimestamp);
        fields.insert("updatedAt".into(), FieldValue::ServerTimestamp);
        store
            .insert(&caller(), Collection::Products, "p1", fields)
            .await
            .unwrap();

        let created = store
            .get(&caller(), Collection::Products, "p1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(created.timestamp("createdAt"), created.timestamp("updatedAt"));

        let mut touch = Fields::new();
        touch.insert("updatedAt".into(), FieldValue::ServerTimestamp);
        store
            .update(&caller(), Collection::Products, "p1", touch)
            .await
            .unwrap();

        let updated = store
            .get(&caller(), Collection::Products, "p1")
            .await
            .unwrap()
            .unwrap();
        assert!(updated.timestamp("updatedAt") > created.timestamp("updatedAt"));
        assert_eq!(updated.timestamp("createdAt"), created.timestamp("createdAt"));
    }

    #[tokio::test]
    async fn test_list_preserves_insertion_order() {
        let store = InMemoryStore::new();
        for (id, name) in [("b", "Second"), ("a", "First"), ("c", "Third")] {
            store
                .insert(&caller(), Collection::Products, id, named(name))
                .await
                .unwrap();
        }

        let ids: Vec<_> = store
            .list(&caller(), Collection::Products)
            .await
            .unwrap()
            .into_iter()
            .map(|doc| doc.id)
            .collect();
        assert_eq!(ids, ["b", "a", "c"]);
    }

    #[tokio::test]
    async fn test_delete_missing_is_ok() {
        let store = InMemoryStore::new();
        store
            .delete(&caller(), Collection::Categories, "nope")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_offline_fails_every_operation() {
        let store = InMemoryStore::new();
        store.seed(Collection::Admins, "uid-1", Fields::new());
        store.set_offline(true);

        assert!(store.get(&caller(), Collection::Admins, "uid-1").await.is_err());
        assert!(store.list(&caller(), Collection::Admins).await.is_err());

        store.set_offline(false);
        assert!(store.exists(&caller(), Collection::Admins, "uid-1").await.unwrap());
    }
}
