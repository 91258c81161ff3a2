//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                   - Liveness check
//! GET  /health/ready             - Readiness check (session database)
//! GET  /                         - Redirect to /products
//!
//! # Auth (email + password through the auth gateway)
//! GET  /auth/login               - Login page
//! POST /auth/login               - Sign in and check the admins collection
//! POST /auth/logout              - Sign out
//!
//! # Products
//! GET  /products                 - Inventory table (?q= filters)
//! GET  /products/new             - Open the form for a new product
//! GET  /products/{id}/edit       - Open the form on an existing product
//! POST /products/form            - Save the form
//! POST /products/form/confirm    - Answer the image link prompt
//! POST /products/form/close      - Discard the form
//! POST /products/{id}/delete     - Ask to delete a product
//!
//! # Categories
//! GET  /categories               - Category manager
//! POST /categories               - Add a category
//! POST /categories/{id}/delete   - Ask to delete a category
//!
//! # Prompts
//! POST /delete/confirm           - Answer the pending delete prompt
//! ```
//!
//! The product form, the pending delete prompt and flash messages live in
//! the session, so each browser session has its own form.

pub mod auth;
pub mod categories;
pub mod products;
pub mod prompts;

use askama::Template;
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{Html, Redirect},
    routing::get,
};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tower_sessions::{Session, SessionManagerLayer, SessionStore};
use tracing::Span;

use crate::forms::{DeleteConfirmation, FormGuard, ProductForm};
use crate::middleware::{content_type_options_layer, frame_options_layer};
use crate::models::{CurrentAdmin, Flash, session_keys};
use crate::state::AppState;

/// Signed-in admin shown in the page header.
#[derive(Debug, Clone)]
pub struct AdminView {
    pub uid: String,
    pub email: String,
}

impl From<&CurrentAdmin> for AdminView {
    fn from(admin: &CurrentAdmin) -> Self {
        Self {
            uid: admin.uid.to_string(),
            email: admin.email.to_string(),
        }
    }
}

/// Flash message ready for a template.
#[derive(Debug, Clone)]
pub struct FlashView {
    pub is_error: bool,
    pub message: String,
}

impl From<Flash> for FlashView {
    fn from(flash: Flash) -> Self {
        match flash {
            Flash::Error(message) => Self {
                is_error: true,
                message,
            },
            Flash::Notice(message) => Self {
                is_error: false,
                message,
            },
        }
    }
}

/// Build the routes that need application state.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { Redirect::to("/products") }))
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(auth::router())
        .merge(products::router())
        .merge(categories::router())
        .merge(prompts::router())
}

/// Build the full application with sessions, tracing, security headers and
/// Sentry around it.
pub fn build_router<S>(state: AppState, session_layer: SessionManagerLayer<S>) -> Router
where
    S: SessionStore + Clone,
{
    routes()
        .layer(session_layer)
        .layer(frame_options_layer())
        .layer(content_type_options_layer())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Pings the session database when one is configured. Returns 503 Service
/// Unavailable if it is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    let Some(pool) = state.pool() else {
        return StatusCode::OK;
    };
    match sqlx::query("SELECT 1").fetch_one(pool).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!("Readiness check failed: {e}");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// Render a template, logging failures instead of surfacing them.
fn render(template: &impl Template) -> Html<String> {
    Html(template.render().unwrap_or_else(|e| {
        tracing::error!("Template render error: {}", e);
        "Internal Server Error".to_string()
    }))
}

/// Take the session's form lock, then reload the session record since
/// another request may have saved it while this one waited.
async fn lock_form(
    state: &AppState,
    session: &Session,
) -> Result<FormGuard, tower_sessions::session::Error> {
    let guard = state.lock_form(session.id()).await;
    session.load().await?;
    Ok(guard)
}

/// Load the form under its lock. The lock is held for the whole of any
/// write, so a `Submitting` form seen here was left by a write that never
/// reported back, e.g. after a restart.
async fn load_locked_form(
    session: &Session,
    _guard: &FormGuard,
) -> Result<ProductForm, tower_sessions::session::Error> {
    let mut form = load_form(session).await?;
    if form.recover_interrupted() {
        tracing::warn!("Reopened a product form left mid-save");
    }
    Ok(form)
}

async fn load_form(session: &Session) -> Result<ProductForm, tower_sessions::session::Error> {
    Ok(session
        .get::<ProductForm>(session_keys::PRODUCT_FORM)
        .await?
        .unwrap_or_default())
}

/// Store the form. Persisted immediately so a concurrent request from the
/// same session sees a submission in flight.
async fn store_form(
    session: &Session,
    form: &ProductForm,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::PRODUCT_FORM, form).await?;
    session.save().await
}

async fn load_prompt(
    session: &Session,
) -> Result<DeleteConfirmation, tower_sessions::session::Error> {
    Ok(session
        .get::<DeleteConfirmation>(session_keys::DELETE_PROMPT)
        .await?
        .unwrap_or_default())
}

async fn store_prompt(
    session: &Session,
    prompt: &DeleteConfirmation,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::DELETE_PROMPT, prompt).await
}

async fn set_flash(session: &Session, flash: Flash) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::FLASH, flash).await
}

async fn take_flash(session: &Session) -> Result<Option<Flash>, tower_sessions::session::Error> {
    session.remove::<Flash>(session_keys::FLASH).await
}
