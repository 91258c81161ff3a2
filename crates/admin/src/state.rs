//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::backend::Backend;
use crate::config::AdminConfig;
use crate::forms::{FormGuard, FormLocks};
use crate::gateway::Identity;
use crate::services::{AdminAuthService, CatalogService};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    backend: Backend,
    /// Session database, when sessions are stored in `PostgreSQL`.
    pool: Option<PgPool>,
    form_locks: FormLocks,
}

impl AppState {
    #[must_use]
    pub fn new(config: AdminConfig, backend: Backend, pool: Option<PgPool>) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                backend,
                pool,
                form_locks: FormLocks::new(),
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn backend(&self) -> &Backend {
        &self.inner.backend
    }

    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.pool.as_ref()
    }

    /// Wait until no other request from this session is working on the
    /// product form.
    pub async fn lock_form(&self, session_id: Option<tower_sessions::session::Id>) -> FormGuard {
        self.inner.form_locks.acquire(session_id).await
    }

    /// Login and authorization service.
    #[must_use]
    pub fn auth(&self) -> AdminAuthService<'_> {
        AdminAuthService::new(&self.inner.backend)
    }

    /// Catalog service acting as `caller`.
    #[must_use]
    pub fn catalog<'a>(&'a self, caller: &'a Identity) -> CatalogService<'a> {
        CatalogService::new(self.inner.backend.store.as_ref(), caller)
    }
}
