//! Session middleware configuration for admin.
//!
//! Sessions live in `PostgreSQL` when a database is configured and in
//! process memory otherwise. Cookies are `SameSite=Strict` and `HttpOnly`.
//! Each signed-in session's expiry is later pinned to its ID token's expiry
//! (see [`super::set_current_admin`]).

use sqlx::PgPool;
use tower_sessions::{Expiry, SessionManagerLayer, SessionStore};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::AdminConfig;

/// Session cookie name for admin.
pub const SESSION_COOKIE_NAME: &str = "trident_admin_session";

/// Inactivity expiry for sessions that have not signed in (one hour, the
/// provider's ID token lifetime).
const SESSION_EXPIRY_SECONDS: i64 = 60 * 60;

/// Session store backed by the admin database.
///
/// The table is created by `trident-cli migrate sessions`.
#[must_use]
pub fn postgres_store(pool: &PgPool) -> PostgresStore {
    PostgresStore::new(pool.clone())
}

/// Create the session layer around any session store.
#[must_use]
pub fn create_session_layer<S>(store: S, config: &AdminConfig) -> SessionManagerLayer<S>
where
    S: SessionStore + Clone,
{
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.secure_cookies())
        .with_same_site(tower_sessions::cookie::SameSite::Strict)
        .with_http_only(true)
        .with_path("/")
}
