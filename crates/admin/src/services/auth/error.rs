//! Login error types.

use thiserror::Error;

use crate::db::RepositoryError;
use crate::gateway::AuthError;

/// Message shown when valid credentials belong to a non-admin.
pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized: You do not have admin access.";

/// Errors that can occur while signing an admin in.
#[derive(Debug, Error)]
pub enum LoginError {
    /// Bad email, bad password, disabled account, or throttling.
    #[error("{0}")]
    InvalidCredentials(AuthError),

    /// The credentials are fine but the user is not an admin.
    #[error("{UNAUTHORIZED_MESSAGE}")]
    Unauthorized,

    /// The identity provider could not be reached or misbehaved.
    #[error("auth service error: {0}")]
    Gateway(AuthError),

    /// The admin lookup failed.
    #[error("admin lookup failed: {0}")]
    Lookup(#[from] RepositoryError),
}

impl LoginError {
    /// Whether a remote service failed, as opposed to the user being
    /// turned away.
    #[must_use]
    pub const fn is_service_error(&self) -> bool {
        matches!(self, Self::Gateway(_) | Self::Lookup(_))
    }

    /// Message safe to show on the login page.
    #[must_use]
    pub fn user_message(&self) -> String {
        if self.is_service_error() {
            "Sign-in is unavailable right now. Please try again.".to_string()
        } else {
            self.to_string()
        }
    }
}

impl From<AuthError> for LoginError {
    fn from(err: AuthError) -> Self {
        if err.is_service_error() {
            Self::Gateway(err)
        } else {
            Self::InvalidCredentials(err)
        }
    }
}
