//! Authentication route handlers for admin.
//!
//! Email and password go to the auth gateway; the resulting identity must
//! also have a document in the `admins` collection.

use askama::Template;
use axum::{
    Form, Router,
    extract::State,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use secrecy::SecretString;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::render;
use crate::error::AppError;
use crate::filters;
use crate::middleware::{OptionalAdminAuth, clear_current_admin, set_current_admin};
use crate::models::CurrentAdmin;
use crate::state::AppState;

/// Login page template.
#[derive(Template)]
#[template(path = "auth/login.html")]
pub struct LoginPageTemplate {
    pub email: String,
    pub error: Option<String>,
}

/// Login form submission.
#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", get(login_page).post(login))
        .route("/auth/logout", post(logout))
}

/// Render the login page, or skip it when already signed in.
///
/// GET /auth/login
async fn login_page(OptionalAdminAuth(admin): OptionalAdminAuth) -> Response {
    if admin.is_some() {
        return Redirect::to("/products").into_response();
    }
    render(&LoginPageTemplate {
        email: String::new(),
        error: None,
    })
    .into_response()
}

/// Sign in and store the admin in the session.
///
/// POST /auth/login
#[instrument(skip(state, session, form), fields(email = %form.email))]
async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let password = SecretString::from(form.password);
    match state.auth().login(&form.email, &password).await {
        Ok(identity) => {
            set_current_admin(&session, &CurrentAdmin::from(&identity)).await?;
            Ok(Redirect::to("/products").into_response())
        }
        Err(e) => {
            if e.is_service_error() {
                tracing::error!("Sign-in failed: {e}");
            } else {
                tracing::info!("Sign-in rejected: {e}");
            }
            let page = LoginPageTemplate {
                email: form.email,
                error: Some(e.user_message()),
            };
            Ok(render(&page).into_response())
        }
    }
}

/// Sign out with the gateway and clear the session.
///
/// POST /auth/logout
#[instrument(skip(state, session, admin))]
async fn logout(
    State(state): State<AppState>,
    session: Session,
    OptionalAdminAuth(admin): OptionalAdminAuth,
) -> impl IntoResponse {
    if let Some(admin) = admin {
        state.auth().logout(&admin.identity()).await;
    }
    if let Err(e) = clear_current_admin(&session).await {
        tracing::warn!("Failed to clear session on logout: {e}");
    }
    Redirect::to("/auth/login")
}
