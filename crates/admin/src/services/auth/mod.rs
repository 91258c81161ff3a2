//! Admin login and authorization.
//!
//! Sign-in is two steps: the auth gateway checks the password, then the
//! `admins` collection decides whether that user may use the panel. A user
//! who passes the first step but not the second is signed straight back out.

mod error;

pub use error::{LoginError, UNAUTHORIZED_MESSAGE};

use secrecy::SecretString;
use tracing::instrument;
use trident_core::Email;

use crate::backend::Backend;
use crate::db::AdminRepository;
use crate::gateway::{AuthError, Identity};

/// Outcome of the admin check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authorization {
    Granted,
    Denied,
}

/// Admin authentication service.
pub struct AdminAuthService<'a> {
    backend: &'a Backend,
}

impl<'a> AdminAuthService<'a> {
    #[must_use]
    pub const fn new(backend: &'a Backend) -> Self {
        Self { backend }
    }

    /// Check whether the identity has an `admins` document. Read-only.
    ///
    /// # Errors
    ///
    /// Returns `LoginError::Lookup` if the store cannot answer; that is
    /// never reported as `Denied`.
    #[instrument(skip(self, identity), fields(uid = %identity.uid()))]
    pub async fn authorize(&self, identity: &Identity) -> Result<Authorization, LoginError> {
        let admins = AdminRepository::new(self.backend.store.as_ref(), identity);
        if admins.exists(identity.uid()).await? {
            Ok(Authorization::Granted)
        } else {
            Ok(Authorization::Denied)
        }
    }

    /// Sign in and require admin rights.
    ///
    /// On `Denied` the identity is signed out before returning
    /// `LoginError::Unauthorized`. A failed lookup also discards the
    /// identity. Nothing is retried.
    ///
    /// # Errors
    ///
    /// Returns `LoginError::InvalidCredentials` for rejected credentials
    /// (including a malformed email, checked before any remote call),
    /// `LoginError::Unauthorized` for non-admins, and `LoginError::Gateway` or
    /// `LoginError::Lookup` when a service fails.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<Identity, LoginError> {
        let email = Email::parse(email).map_err(AuthError::from)?;
        let identity = self.backend.auth.sign_in(&email, password).await?;

        match self.authorize(&identity).await {
            Ok(Authorization::Granted) => {
                tracing::info!(uid = %identity.uid(), "Admin signed in");
                Ok(identity)
            }
            Ok(Authorization::Denied) => {
                tracing::warn!(uid = %identity.uid(), "Sign-in by non-admin user");
                self.backend.auth.sign_out(&identity).await;
                Err(LoginError::Unauthorized)
            }
            Err(e) => {
                tracing::error!(uid = %identity.uid(), "Admin lookup failed: {e}");
                self.backend.auth.sign_out(&identity).await;
                Err(e)
            }
        }
    }

    /// Sign the identity out with the provider.
    pub async fn logout(&self, identity: &Identity) {
        self.backend.auth.sign_out(identity).await;
    }
}
