//! Integration tests for Trident Nova.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p trident-integration-tests
//! ```
//!
//! Everything runs against the in-memory auth gateway and record store, and
//! drives the real axum router with `tower::ServiceExt::oneshot`.
//!
//! # Test Categories
//!
//! - `admin_login` - Sign-in, the `admins` gate, sessions
//! - `admin_products` - Product form, confirmation and delete flows
//! - `admin_categories` - Category manager
//! - `inventory` - Search filter and rendering

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
};
use chrono::{TimeDelta, Utc};
use secrecy::SecretString;
use tower::ServiceExt;
use tower_sessions::MemoryStore;

use trident_admin::backend::Backend;
use trident_admin::config::AdminConfig;
use trident_admin::gateway::{Identity, InMemoryAuth};
use trident_admin::middleware::{SESSION_COOKIE_NAME, create_session_layer};
use trident_admin::routes::build_router;
use trident_admin::state::AppState;
use trident_admin::store::{Collection, Fields, InMemoryStore};
use trident_core::{AdminId, Email};

pub const ADMIN_EMAIL: &str = "admin@tridentnova.com";
pub const ADMIN_PASSWORD: &str = "correct horse battery staple";
pub const ADMIN_UID: &str = "admin-uid";

/// A router over fresh in-memory backends, plus handles to those backends.
pub struct TestApp {
    pub auth: Arc<InMemoryAuth>,
    pub store: Arc<InMemoryStore>,
    pub router: Router,
}

impl TestApp {
    /// App with one registered account that is also in `admins`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_gateway(InMemoryAuth::new())
    }

    /// App with no accounts at all.
    #[must_use]
    pub fn without_admins() -> Self {
        Self::with_auth(InMemoryAuth::new())
    }

    /// App with the default admin over a customised gateway.
    #[must_use]
    pub fn with_gateway(auth: InMemoryAuth) -> Self {
        let app = Self::with_auth(auth);
        app.register(ADMIN_UID, ADMIN_EMAIL, ADMIN_PASSWORD);
        app.grant(ADMIN_UID);
        app
    }

    fn with_auth(auth: InMemoryAuth) -> Self {
        let auth = Arc::new(auth);
        let store = Arc::new(InMemoryStore::new());
        let config = AdminConfig::in_memory("http://localhost:3001");
        let backend = Backend::in_memory(auth.clone(), store.clone());
        let session_layer = create_session_layer(MemoryStore::default(), &config);
        let router = build_router(AppState::new(config, backend, None), session_layer);
        Self {
            auth,
            store,
            router,
        }
    }

    pub fn register(&self, uid: &str, email: &str, password: &str) {
        self.auth
            .register(uid, &Email::parse(email).unwrap(), password);
    }

    pub fn grant(&self, uid: &str) {
        self.store.seed(Collection::Admins, uid, Fields::new());
    }

    /// Identity for calling services directly, bypassing HTTP.
    #[must_use]
    pub fn identity(&self) -> Identity {
        Identity::new(
            AdminId::new(ADMIN_UID),
            Email::parse(ADMIN_EMAIL).unwrap(),
            SecretString::from("test-token"),
            Utc::now() + TimeDelta::hours(1),
        )
    }

    #[must_use]
    pub fn client(&self) -> TestClient {
        TestClient {
            router: self.router.clone(),
            cookie: None,
        }
    }

    /// Client already signed in as the default admin.
    pub async fn signed_in(&self) -> TestClient {
        let mut client = self.client();
        let response = client
            .post_form(
                "/auth/login",
                &[("email", ADMIN_EMAIL), ("password", ADMIN_PASSWORD)],
            )
            .await;
        assert_eq!(location(&response), Some("/products"));
        client
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// Cookie-carrying client over the router. Clones share the session
/// cookie, standing in for several tabs of one browser.
#[derive(Clone)]
pub struct TestClient {
    router: Router,
    cookie: Option<String>,
}

impl TestClient {
    pub async fn get(&mut self, uri: &str) -> Response {
        let request = self.request("GET", uri).body(Body::empty()).unwrap();
        self.send(request).await
    }

    pub async fn post_form(&mut self, uri: &str, fields: &[(&str, &str)]) -> Response {
        let request = self
            .request("POST", uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(encode_form(fields)))
            .unwrap();
        self.send(request).await
    }

    /// GET and return the body as text, asserting a 200.
    pub async fn page(&mut self, uri: &str) -> String {
        let response = self.get(uri).await;
        assert_eq!(response.status(), StatusCode::OK, "GET {uri}");
        body_text(response).await
    }

    #[must_use]
    pub const fn has_cookie(&self) -> bool {
        self.cookie.is_some()
    }

    fn request(&self, method: &str, uri: &str) -> axum::http::request::Builder {
        let builder = Request::builder().method(method).uri(uri);
        match &self.cookie {
            Some(cookie) => builder.header(header::COOKIE, cookie),
            None => builder,
        }
    }

    async fn send(&mut self, request: Request<Body>) -> Response {
        let response = self.router.clone().oneshot(request).await.unwrap();
        for value in response.headers().get_all(header::SET_COOKIE) {
            let value = value.to_str().unwrap();
            let Some(pair) = value.split(';').next() else {
                continue;
            };
            if let Some(session) = pair.strip_prefix(&format!("{SESSION_COOKIE_NAME}=")) {
                self.cookie = (!session.is_empty() && !value.contains("Max-Age=0"))
                    .then(|| pair.to_string());
            }
        }
        response
    }
}

/// Redirect target of a response, if any.
#[must_use]
pub fn location(response: &Response) -> Option<&str> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
}

pub async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn encode_form(fields: &[(&str, &str)]) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(fields)
        .finish()
}
