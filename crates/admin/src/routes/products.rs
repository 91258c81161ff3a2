//! Inventory page and product form handlers.

use askama::Template;
use axum::{
    Form, Router,
    extract::{Path, Query, State},
    response::{Html, Redirect},
    routing::{get, post},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{Instrument, instrument};
use trident_core::{Category, ProductId};

use super::prompts::{DeleteRequest, PromptView};
use super::{
    AdminView, FlashView, load_form, load_locked_form, load_prompt, lock_form, render, set_flash,
    store_form, store_prompt, take_flash,
};
use crate::error::AppError;
use crate::filters;
use crate::forms::{
    DeletePrompt, FormError, FormGuard, FormMode, FormStatus, ProductDraft, ProductForm,
    SubmitOutcome, SubmitPlan,
};
use crate::gateway::Identity;
use crate::inventory::{DraftPreview, InventoryView, placeholder_image};
use crate::middleware::RequireAdminAuth;
use crate::models::Flash;
use crate::services::Catalog;
use crate::state::AppState;
use crate::store::is_valid_document_id;

/// Inventory search.
#[derive(Debug, Default, Deserialize)]
pub struct InventoryQuery {
    #[serde(default)]
    pub q: String,
}

/// Answer to the image link prompt.
#[derive(Debug, Deserialize)]
pub struct ConfirmForm {
    pub accept: bool,
}

/// The product form as rendered in the modal.
#[derive(Debug, Clone)]
pub struct FormView {
    pub title: &'static str,
    pub submit_label: &'static str,
    pub draft: ProductDraft,
    pub preview: DraftPreview,
    pub error: Option<String>,
    pub busy: bool,
    pub awaiting_confirmation: bool,
}

impl FormView {
    /// `None` while the form is closed.
    #[must_use]
    pub fn from_form(form: &ProductForm) -> Option<Self> {
        let editing = matches!(form.status.mode()?, FormMode::Editing(_));
        Some(Self {
            title: if editing {
                "Modify Product"
            } else {
                "Register New Product"
            },
            submit_label: if editing {
                "Save Updates"
            } else {
                "Publish Product"
            },
            draft: form.draft.clone(),
            preview: DraftPreview::from(&form.draft),
            error: form.error.clone(),
            busy: form.is_busy(),
            awaiting_confirmation: matches!(form.status, FormStatus::PendingConfirmation(_)),
        })
    }
}

/// Inventory page template.
#[derive(Template)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub admin: AdminView,
    pub current_path: String,
    pub inventory: InventoryView,
    pub categories: Vec<String>,
    pub form: Option<FormView>,
    pub prompt: Option<PromptView>,
    pub flash: Option<FlashView>,
    pub placeholder: &'static str,
}

/// Build the products router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(index))
        .route("/products/new", get(new_product))
        .route("/products/{id}/edit", get(edit_product))
        .route("/products/{id}/delete", post(request_delete))
        .route("/products/form", post(submit))
        .route("/products/form/confirm", post(confirm))
        .route("/products/form/close", post(close))
}

/// Inventory table, plus the form and any pending prompt.
///
/// GET /products
#[instrument(skip(admin, state, session))]
async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<InventoryQuery>,
) -> Result<Html<String>, AppError> {
    let identity = admin.identity();
    let mut flash = take_flash(&session).await?;

    let catalog = match state.catalog(&identity).load().await {
        Ok(catalog) => catalog,
        Err(e) => {
            tracing::error!("Failed to load inventory: {e}");
            flash.get_or_insert(Flash::Error(format!("Failed to load inventory: {e}")));
            Catalog::default()
        }
    };

    let form = load_form(&session).await?;
    let prompt = load_prompt(&session).await?;

    let template = ProductsIndexTemplate {
        admin: AdminView::from(&admin),
        current_path: "/products".to_string(),
        inventory: InventoryView::new(&catalog.products, &query.q),
        categories: category_names(&catalog.categories),
        form: FormView::from_form(&form),
        prompt: prompt.pending().map(PromptView::from),
        flash: flash.map(FlashView::from),
        placeholder: placeholder_image(),
    };

    Ok(render(&template))
}

/// Open an empty form.
///
/// GET /products/new
#[instrument(skip(_admin, state, session))]
async fn new_product(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
) -> Result<Redirect, AppError> {
    let guard = lock_form(&state, &session).await?;
    let mut form = load_locked_form(&session, &guard).await?;
    form.open_new()?;
    store_form(&session, &form).await?;
    Ok(Redirect::to("/products"))
}

/// Open the form on an existing product.
///
/// GET /products/{id}/edit
#[instrument(skip(admin, state, session))]
async fn edit_product(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Redirect, AppError> {
    let identity = admin.identity();
    let id = ProductId::new(id);
    let product = state
        .catalog(&identity)
        .product(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    let guard = lock_form(&state, &session).await?;
    let mut form = load_locked_form(&session, &guard).await?;
    form.open_edit(&product)?;
    store_form(&session, &form).await?;
    Ok(Redirect::to("/products"))
}

/// Take the typed fields and try to save them.
///
/// POST /products/form
#[instrument(skip(admin, state, session, draft))]
async fn submit(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Form(draft): Form<ProductDraft>,
) -> Result<Redirect, AppError> {
    let identity = admin.identity();
    let guard = lock_form(&state, &session).await?;

    let mut form = load_locked_form(&session, &guard).await?;
    form.update_draft(draft)?;

    let categories = match state.catalog(&identity).categories().await {
        Ok(categories) => categories,
        Err(e) => {
            tracing::error!("Failed to load categories: {e}");
            form.error = Some(format!("Failed to load categories: {e}"));
            store_form(&session, &form).await?;
            return Ok(Redirect::to("/products"));
        }
    };

    match form.request_submit(&categories) {
        Ok(SubmitOutcome::Ready(plan)) => save(&state, &session, identity, guard, form, plan).await,
        Ok(SubmitOutcome::NeedsConfirmation) | Err(FormError::Validation(_)) => {
            store_form(&session, &form).await?;
            Ok(Redirect::to("/products"))
        }
        Err(e) => Err(e.into()),
    }
}

/// Accept or decline a non-drive image link.
///
/// POST /products/form/confirm
#[instrument(skip(admin, state, session))]
async fn confirm(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Form(answer): Form<ConfirmForm>,
) -> Result<Redirect, AppError> {
    let identity = admin.identity();
    let guard = lock_form(&state, &session).await?;
    let mut form = load_locked_form(&session, &guard).await?;

    let categories = if answer.accept {
        match state.catalog(&identity).categories().await {
            Ok(categories) => categories,
            Err(e) => {
                tracing::error!("Failed to load categories: {e}");
                form.error = Some(format!("Failed to load categories: {e}"));
                store_form(&session, &form).await?;
                return Ok(Redirect::to("/products"));
            }
        }
    } else {
        Vec::new()
    };

    match form.confirm(answer.accept, &categories) {
        Ok(Some(plan)) => save(&state, &session, identity, guard, form, plan).await,
        Ok(None) | Err(FormError::Validation(_)) => {
            store_form(&session, &form).await?;
            Ok(Redirect::to("/products"))
        }
        Err(e) => Err(e.into()),
    }
}

/// Discard the form.
///
/// POST /products/form/close
#[instrument(skip(_admin, state, session))]
async fn close(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
) -> Result<Redirect, AppError> {
    let guard = lock_form(&state, &session).await?;
    let mut form = load_locked_form(&session, &guard).await?;
    form.close()?;
    store_form(&session, &form).await?;
    Ok(Redirect::to("/products"))
}

/// Ask before deleting a product.
///
/// POST /products/{id}/delete
#[instrument(skip(_admin, session, request))]
async fn request_delete(
    RequireAdminAuth(_admin): RequireAdminAuth,
    session: Session,
    Path(id): Path<String>,
    Form(request): Form<DeleteRequest>,
) -> Result<Redirect, AppError> {
    if !is_valid_document_id(&id) {
        return Err(AppError::NotFound(format!("product {id}")));
    }
    let mut prompt = load_prompt(&session).await?;
    prompt.request(DeletePrompt::Product {
        id: ProductId::new(id),
        name: request.name,
    });
    store_prompt(&session, &prompt).await?;
    Ok(Redirect::to("/products"))
}

/// Run a submission. The `Submitting` state is persisted before the write,
/// and the write runs on its own task holding the form lock, so it finishes
/// and records its outcome even if the client goes away.
async fn save(
    state: &AppState,
    session: &Session,
    identity: Identity,
    guard: FormGuard,
    mut form: ProductForm,
    plan: SubmitPlan,
) -> Result<Redirect, AppError> {
    store_form(session, &form).await?;

    let state = state.clone();
    let session = session.clone();
    let write = tokio::spawn(
        async move {
            let _guard = guard;
            let result = state
                .catalog(&identity)
                .save(&plan)
                .await
                .map(|id| {
                    tracing::info!(%id, "Product saved");
                })
                .map_err(|e| {
                    tracing::error!("Failed to save product: {e}");
                    format!("Failed to save product: {e}")
                });
            if result.is_ok() {
                set_flash(&session, Flash::Notice("Product saved".to_string())).await?;
            }

            form.complete(result)?;
            store_form(&session, &form).await?;
            Ok::<(), AppError>(())
        }
        .instrument(tracing::Span::current()),
    );

    write
        .await
        .map_err(|e| AppError::Internal(format!("Product save task failed: {e}")))??;
    Ok(Redirect::to("/products"))
}

fn category_names(categories: &[Category]) -> Vec<String> {
    categories.iter().map(|c| c.name.clone()).collect()
}
