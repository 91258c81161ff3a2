//! Auth gateway: email/password sign-in against the identity provider.
//!
//! A successful sign-in yields an [`Identity`]: the provider's user ID plus
//! the short-lived ID token that record store calls run under. The gateway
//! knows nothing about admin rights; see `services::auth` for the
//! authorization check layered on top.

mod firebase;
mod memory;

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use thiserror::Error;
use trident_core::{AdminId, Email, EmailError};

pub use firebase::FirebaseAuth;
pub use memory::InMemoryAuth;

/// A signed-in user.
///
/// Implements `Debug` manually to redact the ID token.
#[derive(Clone)]
pub struct Identity {
    uid: AdminId,
    email: Email,
    id_token: SecretString,
    expires_at: DateTime<Utc>,
}

impl Identity {
    #[must_use]
    pub const fn new(
        uid: AdminId,
        email: Email,
        id_token: SecretString,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            uid,
            email,
            id_token,
            expires_at,
        }
    }

    /// Provider user ID; also the key of the user's `admins` document.
    #[must_use]
    pub const fn uid(&self) -> &AdminId {
        &self.uid
    }

    #[must_use]
    pub const fn email(&self) -> &Email {
        &self.email
    }

    /// Bearer credential for record store calls.
    #[must_use]
    pub const fn id_token(&self) -> &SecretString {
        &self.id_token
    }

    /// When the ID token stops being accepted.
    #[must_use]
    pub const fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }

    #[cfg(test)]
    pub(crate) fn for_tests(uid: &str, email: &str) -> Self {
        Self::new(
            AdminId::new(uid),
            Email::parse(email).unwrap_or_else(|e| panic!("bad test email {email}: {e}")),
            SecretString::from(format!("test-token-{uid}")),
            Utc::now() + chrono::TimeDelta::hours(1),
        )
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("uid", &self.uid)
            .field("email", &self.email)
            .field("id_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Errors from the auth gateway.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The email was rejected before reaching the provider.
    #[error("{0}")]
    InvalidEmail(#[from] EmailError),

    /// Wrong email or password.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// The account exists but has been disabled.
    #[error("This account has been disabled")]
    Disabled,

    /// The provider is throttling sign-in attempts.
    #[error("Too many attempts, try again later")]
    TooManyAttempts,

    /// Transport-level failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with an unexpected error.
    #[error("auth service error ({status}): {message}")]
    Service { status: u16, message: String },
}

impl AuthError {
    /// Whether this is a failure of the service rather than of the
    /// credentials the user typed.
    #[must_use]
    pub const fn is_service_error(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Service { .. })
    }
}

/// Email/password identity provider.
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// Verify credentials and return the signed-in identity.
    async fn sign_in(&self, email: &Email, password: &SecretString)
    -> Result<Identity, AuthError>;

    /// End the identity's session with the provider. Never fails.
    async fn sign_out(&self, identity: &Identity);
}
