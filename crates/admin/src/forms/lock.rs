//! Per-session serialization of form handlers.
//!
//! Every request carries its own copy of the session record, so two
//! requests from one browser can both read an idle form before either has
//! written `Submitting`. Handlers that move the product form take the
//! session's lock first and reload the record once they hold it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tower_sessions::session::Id;

/// Held while a handler reads, changes and saves the product form.
///
/// A session without an ID has no stored form to race on, so it gets no
/// guard.
#[derive(Debug)]
pub struct FormGuard {
    _guard: Option<OwnedMutexGuard<()>>,
}

/// One async mutex per session ID.
#[derive(Debug, Default)]
pub struct FormLocks {
    locks: Mutex<HashMap<Id, Arc<AsyncMutex<()>>>>,
}

impl FormLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive use of the session's form.
    pub async fn acquire(&self, session_id: Option<Id>) -> FormGuard {
        let Some(id) = session_id else {
            return FormGuard { _guard: None };
        };

        let lock = {
            let mut locks = self
                .locks
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            // Entries only the map still holds belong to finished requests.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(locks.entry(id).or_default())
        };

        FormGuard {
            _guard: Some(lock.lock_owned().await),
        }
    }

    /// Number of sessions with a live lock.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .values()
            .filter(|lock| Arc::strong_count(lock) > 1)
            .count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_same_session_waits() {
        let locks = Arc::new(FormLocks::new());
        let id = Some(Id::default());

        let first = locks.acquire(id).await;
        let waiting = tokio::spawn({
            let locks = Arc::clone(&locks);
            async move {
                let _second = locks.acquire(id).await;
            }
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiting.is_finished());

        drop(first);
        tokio::time::timeout(Duration::from_secs(1), waiting)
            .await
            .expect("second acquire should finish once the first guard drops")
            .expect("task panicked");
    }

    #[tokio::test]
    async fn test_other_sessions_do_not_wait() {
        let locks = FormLocks::new();
        let _first = locks.acquire(Some(Id::default())).await;
        let second = tokio::time::timeout(
            Duration::from_millis(100),
            locks.acquire(Some(Id::default())),
        )
        .await;
        assert!(second.is_ok());
        assert_eq!(locks.len(), 2);
    }

    #[tokio::test]
    async fn test_released_locks_are_pruned() {
        let locks = FormLocks::new();
        drop(locks.acquire(Some(Id::default())).await);
        assert!(locks.is_empty());
        let _guard = locks.acquire(Some(Id::default())).await;
        assert_eq!(locks.locks.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_no_session_id_is_unguarded() {
        let locks = FormLocks::new();
        let _a = locks.acquire(None).await;
        let _b = locks.acquire(None).await;
        assert!(locks.is_empty());
    }
}
