//! Admin configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ADMIN_BASE_URL` - Public URL for the admin panel (`https://` enables secure cookies)
//! - `FIREBASE_API_KEY` - Firebase web API key (firebase backend only)
//! - `FIREBASE_PROJECT_ID` - Firebase project ID (firebase backend only)
//!
//! ## Optional
//! - `ADMIN_HOST` - Bind address (default: 127.0.0.1)
//! - `ADMIN_PORT` - Listen port (default: 3001)
//! - `ADMIN_DATABASE_URL` / `DATABASE_URL` - `PostgreSQL` for sessions
//!   (default: in-process session store)
//! - `ADMIN_BACKEND` - `firebase` (default) or `memory`
//! - `FIRESTORE_DATABASE` - Firestore database ID (default: `(default)`)
//! - `FIREBASE_AUTH_URL` - Identity Toolkit base URL (emulator override)
//! - `FIRESTORE_URL` - Firestore base URL (emulator override)
//! - `ADMIN_DEMO_EMAIL`, `ADMIN_DEMO_PASSWORD` - Seed admin account (memory backend only)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`
//!
//! ## Optional (TLS)
//! - `ADMIN_TLS_CERT` - PEM-encoded certificate chain
//! - `ADMIN_TLS_KEY` - PEM-encoded private key

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use secrecy::SecretString;
use thiserror::Error;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

pub const DEFAULT_FIREBASE_AUTH_URL: &str = "https://identitytoolkit.googleapis.com";
pub const DEFAULT_FIRESTORE_URL: &str = "https://firestore.googleapis.com";
pub const DEFAULT_FIRESTORE_DATABASE: &str = "(default)";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Which auth gateway and record store the server talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// Firebase Authentication + Cloud Firestore.
    #[default]
    Firebase,
    /// Process-local gateway and store (demo and tests).
    Memory,
}

impl FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firebase" => Ok(Self::Firebase),
            "memory" => Ok(Self::Memory),
            other => Err(ConfigError::InvalidEnvVar(
                "ADMIN_BACKEND".to_string(),
                format!("expected 'firebase' or 'memory', got '{other}'"),
            )),
        }
    }
}

/// Admin application configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// `PostgreSQL` URL for the session store (contains password)
    pub database_url: Option<SecretString>,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the admin panel
    pub base_url: String,
    /// Selected backend
    pub backend: BackendKind,
    /// Firebase project settings (present for the firebase backend)
    pub firebase: Option<FirebaseConfig>,
    /// Seed admin for the memory backend
    pub demo_account: Option<DemoAccount>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
    /// TLS configuration for HTTPS (optional)
    pub tls: Option<TlsConfig>,
}

/// Firebase project configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct FirebaseConfig {
    /// Web API key used for password sign-in
    pub api_key: SecretString,
    /// Project ID
    pub project_id: String,
    /// Firestore database ID
    pub database: String,
    /// Identity Toolkit base URL
    pub auth_url: String,
    /// Firestore base URL
    pub firestore_url: String,
}

impl std::fmt::Debug for FirebaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirebaseConfig")
            .field("api_key", &"[REDACTED]")
            .field("project_id", &self.project_id)
            .field("database", &self.database)
            .field("auth_url", &self.auth_url)
            .field("firestore_url", &self.firestore_url)
            .finish()
    }
}

impl FirebaseConfig {
    /// Load Firebase settings from the environment.
    ///
    /// The API key must pass the placeholder and entropy checks, except when
    /// an emulator URL is configured; emulators accept any key, so a weak
    /// one only logs a warning.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the key or project ID is missing, or if the
    /// key fails validation against the production endpoints.
    pub fn from_env() -> Result<Self, ConfigError> {
        let auth_url = get_optional_env("FIREBASE_AUTH_URL");
        let firestore_url = get_optional_env("FIRESTORE_URL");
        let emulated = auth_url.is_some() || firestore_url.is_some();
        if let Some(url) = &auth_url {
            validate_url("FIREBASE_AUTH_URL", url)?;
        }
        if let Some(url) = &firestore_url {
            validate_url("FIRESTORE_URL", url)?;
        }

        let api_key = get_required_env("FIREBASE_API_KEY")?;
        if let Err(e) = validate_secret_strength(&api_key, "FIREBASE_API_KEY") {
            if !emulated {
                return Err(e);
            }
            tracing::warn!("FIREBASE_API_KEY validation warning: {e}");
        }

        Ok(Self {
            api_key: SecretString::from(api_key),
            project_id: get_required_env("FIREBASE_PROJECT_ID")?,
            database: get_env_or_default("FIRESTORE_DATABASE", DEFAULT_FIRESTORE_DATABASE),
            auth_url: auth_url.unwrap_or_else(|| DEFAULT_FIREBASE_AUTH_URL.to_string()),
            firestore_url: firestore_url.unwrap_or_else(|| DEFAULT_FIRESTORE_URL.to_string()),
        })
    }
}

/// Admin account registered at startup by the memory backend.
#[derive(Clone)]
pub struct DemoAccount {
    pub email: String,
    pub password: SecretString,
}

impl std::fmt::Debug for DemoAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DemoAccount")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl DemoAccount {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        match (
            get_optional_env("ADMIN_DEMO_EMAIL"),
            get_optional_env("ADMIN_DEMO_PASSWORD"),
        ) {
            (Some(email), Some(password)) => Ok(Some(Self {
                email,
                password: SecretString::from(password),
            })),
            (None, None) => Ok(None),
            _ => Err(ConfigError::InvalidEnvVar(
                "ADMIN_DEMO_*".to_string(),
                "Both ADMIN_DEMO_EMAIL and ADMIN_DEMO_PASSWORD must be set together".to_string(),
            )),
        }
    }
}

/// TLS configuration for HTTPS.
#[derive(Clone)]
pub struct TlsConfig {
    /// PEM-encoded certificate chain
    pub cert_pem: String,
    /// PEM-encoded private key
    pub key_pem: SecretString,
}

impl std::fmt::Debug for TlsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsConfig")
            .field("cert_pem", &"[CERTIFICATE]")
            .field("key_pem", &"[REDACTED]")
            .finish()
    }
}

impl TlsConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let cert_pem = get_optional_env("ADMIN_TLS_CERT");
        let key_pem = get_optional_env("ADMIN_TLS_KEY");

        match (cert_pem, key_pem) {
            (Some(cert), Some(key)) => Ok(Some(Self {
                cert_pem: cert,
                key_pem: SecretString::from(key),
            })),
            (None, None) => Ok(None),
            _ => Err(ConfigError::InvalidEnvVar(
                "ADMIN_TLS_*".to_string(),
                "Both ADMIN_TLS_CERT and ADMIN_TLS_KEY must be set together".to_string(),
            )),
        }
    }
}

impl AdminConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("ADMIN_DATABASE_URL");
        let host = get_env_or_default("ADMIN_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("ADMIN_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("ADMIN_PORT", "3001")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("ADMIN_PORT".to_string(), e.to_string()))?;
        let base_url = get_required_env("ADMIN_BASE_URL")?;
        validate_url("ADMIN_BASE_URL", &base_url)?;
        let backend = get_env_or_default("ADMIN_BACKEND", "firebase").parse::<BackendKind>()?;

        let (firebase, demo_account) = match backend {
            BackendKind::Firebase => (Some(FirebaseConfig::from_env()?), None),
            BackendKind::Memory => (None, DemoAccount::from_env()?),
        };

        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let tls = TlsConfig::from_env()?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            backend,
            firebase,
            demo_account,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
            tls,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether session cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.base_url.starts_with("https://")
    }

    /// Configuration for local runs and tests: in-memory backend, no
    /// database, no Sentry.
    #[must_use]
    pub fn in_memory(base_url: impl Into<String>) -> Self {
        Self {
            database_url: None,
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3001,
            base_url: base_url.into(),
            backend: BackendKind::Memory,
            firebase: None,
            demo_account: None,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 1.0,
            tls: None,
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL` (used by Fly.io postgres attach).
fn get_database_url(primary_key: &str) -> Option<SecretString> {
    std::env::var(primary_key)
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(SecretString::from)
}

/// Check that a configured value is an absolute `http(s)` URL.
fn validate_url(key: &str, value: &str) -> Result<(), ConfigError> {
    let url = url::Url::parse(value)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme: {}", url.scheme()),
        ));
    }
    Ok(())
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Copy the key from the Firebase console."
            ),
        ));
    }

    Ok(())
}
