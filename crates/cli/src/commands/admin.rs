//! Admin grant commands.
//!
//! Writes to the `admins` collection are made as an existing admin, so the
//! first admin has to be created from the Firebase console.
//!
//! # Usage
//!
//! ```bash
//! trident-cli admin grant <uid> -e admin@tridentnova.com -p '...'
//! trident-cli admin revoke <uid> -e admin@tridentnova.com -p '...'
//! trident-cli admin list -e admin@tridentnova.com -p '...'
//! ```
//!
//! # Environment Variables
//!
//! - `FIREBASE_API_KEY`, `FIREBASE_PROJECT_ID` - project to manage
//! - `FIRESTORE_DATABASE`, `FIREBASE_AUTH_URL`, `FIRESTORE_URL` - optional
//!   overrides, e.g. for the emulator

use std::sync::Arc;

use secrecy::SecretString;
use thiserror::Error;
use trident_admin::backend::Backend;
use trident_admin::config::{ConfigError, FirebaseConfig};
use trident_admin::db::{AdminGrant, AdminRepository, RepositoryError};
use trident_admin::gateway::{FirebaseAuth, Identity};
use trident_admin::services::{AdminAuthService, LoginError};
use trident_admin::store::FirestoreStore;
use trident_core::AdminId;

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Firebase settings are missing or invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The acting admin could not sign in.
    #[error("Sign-in failed: {0}")]
    SignIn(#[from] LoginError),

    /// Reading or writing the `admins` collection failed.
    #[error("Store error: {0}")]
    Store(#[from] RepositoryError),

    /// The user ID is empty.
    #[error("User ID must not be empty")]
    EmptyUid,
}

/// Signed-in session against the configured Firebase project.
struct AdminSession {
    backend: Backend,
    identity: Identity,
}

impl AdminSession {
    async fn open(email: &str, password: String) -> Result<Self, AdminError> {
        dotenvy::dotenv().ok();

        let firebase = FirebaseConfig::from_env()?;
        let backend = Backend::new(
            Arc::new(FirebaseAuth::new(&firebase)),
            Arc::new(FirestoreStore::new(&firebase)),
        );

        tracing::info!("Signing in to {} as {}...", firebase.project_id, email);
        let identity = AdminAuthService::new(&backend)
            .login(email, &SecretString::from(password))
            .await?;

        Ok(Self { backend, identity })
    }

    fn admins(&self) -> AdminRepository<'_> {
        AdminRepository::new(self.backend.store.as_ref(), &self.identity)
    }

    async fn close(self) {
        AdminAuthService::new(&self.backend)
            .logout(&self.identity)
            .await;
    }
}

fn parse_uid(uid: &str) -> Result<AdminId, AdminError> {
    let uid = uid.trim();
    if uid.is_empty() {
        return Err(AdminError::EmptyUid);
    }
    Ok(AdminId::new(uid))
}

/// Grant admin access to `uid`.
///
/// # Errors
///
/// Returns `AdminError` if sign-in or the write fails.
pub async fn grant(email: &str, password: String, uid: &str) -> Result<(), AdminError> {
    let uid = parse_uid(uid)?;
    let session = AdminSession::open(email, password).await?;

    let created = session.admins().grant(&AdminGrant::new(uid.clone())).await;
    session.close().await;

    if created? {
        tracing::info!("Granted admin access to {}", uid);
    } else {
        tracing::info!("{} already has admin access", uid);
    }
    Ok(())
}

/// Revoke admin access from `uid`.
///
/// # Errors
///
/// Returns `AdminError` if sign-in or the delete fails.
pub async fn revoke(email: &str, password: String, uid: &str) -> Result<(), AdminError> {
    let uid = parse_uid(uid)?;
    let session = AdminSession::open(email, password).await?;

    if session.identity.uid() == &uid {
        tracing::warn!("Revoking your own admin access");
    }
    let result = session.admins().revoke(&uid).await;
    session.close().await;
    result?;

    tracing::info!("Revoked admin access from {}", uid);
    Ok(())
}

/// List every user ID with admin access.
///
/// # Errors
///
/// Returns `AdminError` if sign-in or the listing fails.
pub async fn list(email: &str, password: String) -> Result<(), AdminError> {
    let session = AdminSession::open(email, password).await?;

    let result = session.admins().list().await;
    session.close().await;

    let admins = result?;
    tracing::info!("{} admin(s):", admins.len());
    for uid in admins {
        tracing::info!("  {}", uid);
    }
    Ok(())
}
