//! In-process auth gateway with registered accounts.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use secrecy::{ExposeSecret, SecretString};
use trident_core::{AdminId, Email};

use super::{AuthError, AuthGateway, Identity};

struct Account {
    uid: AdminId,
    password: SecretString,
    disabled: bool,
}

/// Auth gateway backed by a fixed account table.
///
/// Sign-outs are recorded so callers can assert that an identity was
/// signed back out.
#[derive(Default)]
pub struct InMemoryAuth {
    accounts: Mutex<HashMap<String, Account>>,
    signed_out: Mutex<Vec<AdminId>>,
    token_lifetime: Option<TimeDelta>,
}

impl InMemoryAuth {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue tokens with this lifetime instead of one hour.
    #[must_use]
    pub fn with_token_lifetime(mut self, lifetime: TimeDelta) -> Self {
        self.token_lifetime = Some(lifetime);
        self
    }

    /// Register an account. Replaces any existing account with this email.
    pub fn register(&self, uid: impl Into<String>, email: &Email, password: &str) {
        self.lock_accounts().insert(
            email.as_str().to_ascii_lowercase(),
            Account {
                uid: AdminId::new(uid),
                password: SecretString::from(password.to_owned()),
                disabled: false,
            },
        );
    }

    /// Disable an account so sign-in fails with [`AuthError::Disabled`].
    pub fn disable(&self, email: &Email) {
        if let Some(account) = self
            .lock_accounts()
            .get_mut(&email.as_str().to_ascii_lowercase())
        {
            account.disabled = true;
        }
    }

    /// UIDs signed out so far, oldest first.
    #[must_use]
    pub fn signed_out(&self) -> Vec<AdminId> {
        self.signed_out
            .lock()
            .map(|ids| ids.clone())
            .unwrap_or_default()
    }

    fn lock_accounts(&self) -> std::sync::MutexGuard<'_, HashMap<String, Account>> {
        self.accounts
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl AuthGateway for InMemoryAuth {
    async fn sign_in(&self, email: &Email, password: &SecretString) -> Result<Identity, AuthError> {
        let accounts = self.lock_accounts();
        let account = accounts
            .get(&email.as_str().to_ascii_lowercase())
            .filter(|account| account.password.expose_secret() == password.expose_secret())
            .ok_or(AuthError::InvalidCredentials)?;
        if account.disabled {
            return Err(AuthError::Disabled);
        }

        let lifetime = self.token_lifetime.unwrap_or_else(|| TimeDelta::hours(1));
        Ok(Identity::new(
            account.uid.clone(),
            email.clone(),
            SecretString::from(format!("memory-token-{}", crate::store::auto_id())),
            Utc::now() + lifetime,
        ))
    }

    async fn sign_out(&self, identity: &Identity) {
        tracing::info!(uid = %identity.uid(), "Signed out");
        self.signed_out
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(identity.uid().clone());
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn email() -> Email {
        Email::parse("admin@tridentnova.com").unwrap()
    }

    #[tokio::test]
    async fn test_sign_in_with_registered_account() {
        let auth = InMemoryAuth::new();
        auth.register("uid-1", &email(), "hunter22");

        let identity = auth
            .sign_in(&email(), &SecretString::from("hunter22"))
            .await
            .unwrap();
        assert_eq!(identity.uid().as_str(), "uid-1");
        assert!(!identity.is_expired());
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_email() {
        let auth = InMemoryAuth::new();
        auth.register("uid-1", &email(), "hunter22");

        let wrong = auth.sign_in(&email(), &SecretString::from("nope")).await;
        assert!(matches!(wrong, Err(AuthError::InvalidCredentials)));

        let other = Email::parse("someone@else.com").unwrap();
        let unknown = auth.sign_in(&other, &SecretString::from("hunter22")).await;
        assert!(matches!(unknown, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_disabled_account() {
        let auth = InMemoryAuth::new();
        auth.register("uid-1", &email(), "hunter22");
        auth.disable(&email());

        let result = auth.sign_in(&email(), &SecretString::from("hunter22")).await;
        assert!(matches!(result, Err(AuthError::Disabled)));
    }

    #[tokio::test]
    async fn test_sign_out_is_recorded() {
        let auth = InMemoryAuth::new();
        auth.register("uid-1", &email(), "hunter22");
        let identity = auth
            .sign_in(&email(), &SecretString::from("hunter22"))
            .await
            .unwrap();

        auth.sign_out(&identity).await;
        assert_eq!(auth.signed_out(), vec![AdminId::new("uid-1")]);
    }
}
