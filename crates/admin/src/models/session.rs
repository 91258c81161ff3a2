//! Session-related types for admin authentication.
//!
//! Types stored in the session for authentication and form state.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use trident_core::{AdminId, Email};

use crate::gateway::Identity;

/// Session-stored admin identity.
///
/// Holds the ID token so record store calls can run as this admin. The
/// session lives server-side; only its ID reaches the browser.
#[derive(Clone, Serialize, Deserialize)]
pub struct CurrentAdmin {
    /// Auth provider user ID.
    pub uid: AdminId,
    /// Admin's email address.
    pub email: Email,
    id_token: String,
    /// When the ID token, and with it the session, expires.
    pub expires_at: DateTime<Utc>,
}

impl CurrentAdmin {
    /// Rebuild the identity for store calls.
    #[must_use]
    pub fn identity(&self) -> Identity {
        Identity::new(
            self.uid.clone(),
            self.email.clone(),
            SecretString::from(self.id_token.clone()),
            self.expires_at,
        )
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

impl From<&Identity> for CurrentAdmin {
    fn from(identity: &Identity) -> Self {
        Self {
            uid: identity.uid().clone(),
            email: identity.email().clone(),
            id_token: identity.id_token().expose_secret().to_owned(),
            expires_at: identity.expires_at(),
        }
    }
}

impl std::fmt::Debug for CurrentAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CurrentAdmin")
            .field("uid", &self.uid)
            .field("email", &self.email)
            .field("id_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// One-shot message shown on the next page render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Flash {
    Error(String),
    Notice(String),
}

/// Session keys for admin state.
pub mod keys {
    /// Key for storing the current logged-in admin.
    pub const CURRENT_ADMIN: &str = "current_admin";

    /// Key for the product form state machine.
    pub const PRODUCT_FORM: &str = "product_form";

    /// Key for the pending delete prompt.
    pub const DELETE_PROMPT: &str = "delete_prompt";

    /// Key for the one-shot flash message.
    pub const FLASH: &str = "flash";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_preserves_identity() {
        let identity = Identity::for_tests("uid-1", "admin@tridentnova.com");
        let admin = CurrentAdmin::from(&identity);

        let json = serde_json::to_string(&admin).unwrap();
        let back: CurrentAdmin = serde_json::from_str(&json).unwrap();
        let restored = back.identity();

        assert_eq!(restored.uid(), identity.uid());
        assert_eq!(
            restored.id_token().expose_secret(),
            identity.id_token().expose_secret()
        );
        assert!(!back.is_expired());
    }

    #[test]
    fn test_debug_redacts_token() {
        let admin = CurrentAdmin::from(&Identity::for_tests("uid-1", "admin@tridentnova.com"));
        assert!(!format!("{admin:?}").contains("test-token"));
    }
}
