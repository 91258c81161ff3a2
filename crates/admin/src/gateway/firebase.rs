//! Firebase Authentication over the Identity Toolkit REST API.

use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use trident_core::{AdminId, Email};

use crate::config::FirebaseConfig;

use super::{AuthError, AuthGateway, Identity};

/// Token lifetime assumed when the provider omits `expiresIn`.
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

/// Password sign-in against Firebase Authentication.
#[derive(Clone)]
pub struct FirebaseAuth {
    client: reqwest::Client,
    sign_in_url: String,
    api_key: SecretString,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignInRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
    id_token: String,
    #[serde(default)]
    expires_in: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

impl FirebaseAuth {
    #[must_use]
    pub fn new(config: &FirebaseConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            sign_in_url: format!(
                "{}/v1/accounts:signInWithPassword",
                config.auth_url.trim_end_matches('/')
            ),
            api_key: config.api_key.clone(),
        }
    }
}

#[async_trait]
impl AuthGateway for FirebaseAuth {
    #[instrument(skip(self, password), fields(email = %email))]
    async fn sign_in(&self, email: &Email, password: &SecretString) -> Result<Identity, AuthError> {
        let response = self
            .client
            .post(&self.sign_in_url)
            .query(&[("key", self.api_key.expose_secret())])
            .json(&SignInRequest {
                email: email.as_str(),
                password: password.expose_secret(),
                return_secure_token: true,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map_or(body, |envelope| envelope.error.message);
            let error = classify_error(status.as_u16(), &message);
            if error.is_service_error() {
                tracing::error!(status = status.as_u16(), %message, "Sign-in request failed");
            } else {
                tracing::info!(%message, "Sign-in rejected");
            }
            return Err(error);
        }

        let body: SignInResponse = response.json().await?;
        let lifetime = body
            .expires_in
            .as_deref()
            .and_then(|s| s.parse::<i64>().ok())
            .unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);

        tracing::info!(uid = %body.local_id, "Signed in");
        Ok(Identity::new(
            AdminId::new(body.local_id),
            email.clone(),
            SecretString::from(body.id_token),
            Utc::now() + TimeDelta::seconds(lifetime),
        ))
    }

    #[instrument(skip(self, identity), fields(uid = %identity.uid()))]
    async fn sign_out(&self, identity: &Identity) {
        // The REST API keeps no client session; dropping the token is the sign-out.
        tracing::info!("Signed out");
    }
}

/// Map a provider error message (`CODE` or `CODE : detail`) to an [`AuthError`].
fn classify_error(status: u16, message: &str) -> AuthError {
    let code = message
        .split([' ', ':'])
        .next()
        .unwrap_or_default();

    match code {
        "INVALID_LOGIN_CREDENTIALS" | "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_EMAIL"
        | "MISSING_PASSWORD" => AuthError::InvalidCredentials,
        "USER_DISABLED" => AuthError::Disabled,
        "TOO_MANY_ATTEMPTS_TRY_LATER" => AuthError::TooManyAttempts,
        _ => AuthError::Service {
            status,
            message: message.to_owned(),
        },
    }
}
