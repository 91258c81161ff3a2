//! Backend context: the auth gateway and record store the app talks to.
//!
//! Built once at startup from [`AdminConfig`] and handed to the application
//! state. Tests construct it directly around in-memory implementations.

use std::sync::Arc;

use secrecy::ExposeSecret;
use trident_core::Email;

use crate::config::{AdminConfig, BackendKind, ConfigError};
use crate::gateway::{AuthGateway, FirebaseAuth, InMemoryAuth};
use crate::store::{Collection, Fields, FirestoreStore, InMemoryStore, RecordStore};

/// UID given to the seeded demo admin.
pub const DEMO_ADMIN_UID: &str = "demo-admin";

/// Handles to the identity provider and document database.
#[derive(Clone)]
pub struct Backend {
    pub auth: Arc<dyn AuthGateway>,
    pub store: Arc<dyn RecordStore>,
}

impl Backend {
    #[must_use]
    pub fn new(auth: Arc<dyn AuthGateway>, store: Arc<dyn RecordStore>) -> Self {
        Self { auth, store }
    }

    /// Build the backend selected by configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the firebase backend is selected without
    /// Firebase settings, or if the demo admin email is malformed.
    pub fn from_config(config: &AdminConfig) -> Result<Self, ConfigError> {
        match config.backend {
            BackendKind::Firebase => {
                let firebase = config.firebase.as_ref().ok_or_else(|| {
                    ConfigError::MissingEnvVar("FIREBASE_PROJECT_ID".to_string())
                })?;
                tracing::info!(
                    project = %firebase.project_id,
                    database = %firebase.database,
                    "Using Firebase backend"
                );
                Ok(Self::new(
                    Arc::new(FirebaseAuth::new(firebase)),
                    Arc::new(FirestoreStore::new(firebase)),
                ))
            }
            BackendKind::Memory => {
                tracing::warn!("Using in-memory backend; data is lost on restart");
                let auth = Arc::new(InMemoryAuth::new());
                let store = Arc::new(InMemoryStore::new());
                if let Some(demo) = &config.demo_account {
                    let email = Email::parse(&demo.email).map_err(|e| {
                        ConfigError::InvalidEnvVar("ADMIN_DEMO_EMAIL".to_string(), e.to_string())
                    })?;
                    auth.register(DEMO_ADMIN_UID, &email, demo.password.expose_secret());
                    store.seed(Collection::Admins, DEMO_ADMIN_UID, Fields::new());
                    tracing::info!(email = %email, "Registered demo admin");
                }
                Ok(Self::in_memory(auth, store))
            }
        }
    }

    /// Backend over in-memory doubles. Callers keep their own handles to
    /// register accounts, seed documents, and inspect sign-outs.
    #[must_use]
    pub fn in_memory(auth: Arc<InMemoryAuth>, store: Arc<InMemoryStore>) -> Self {
        Self::new(auth, store)
    }
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backend").finish_non_exhaustive()
    }
}
