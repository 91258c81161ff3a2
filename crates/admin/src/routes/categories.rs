//! Category manager handlers.

use askama::Template;
use axum::{
    Form, Router,
    extract::{Path, State},
    response::{Html, Redirect},
    routing::{get, post},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;
use trident_core::{Category, CategoryId};

use super::prompts::{DeleteRequest, PromptView};
use super::{AdminView, FlashView, load_prompt, render, set_flash, store_prompt, take_flash};
use crate::error::AppError;
use crate::filters;
use crate::forms::DeletePrompt;
use crate::middleware::RequireAdminAuth;
use crate::models::Flash;
use crate::state::AppState;
use crate::store::is_valid_document_id;

/// New category submission.
#[derive(Debug, Deserialize)]
pub struct CategoryForm {
    pub name: String,
}

/// Category row.
#[derive(Debug, Clone)]
pub struct CategoryView {
    pub id: String,
    pub name: String,
}

impl From<&Category> for CategoryView {
    fn from(category: &Category) -> Self {
        Self {
            id: category.id.to_string(),
            name: category.name.clone(),
        }
    }
}

/// Category manager template.
#[derive(Template)]
#[template(path = "categories/index.html")]
pub struct CategoriesIndexTemplate {
    pub admin: AdminView,
    pub current_path: String,
    pub categories: Vec<CategoryView>,
    pub prompt: Option<PromptView>,
    pub flash: Option<FlashView>,
}

/// Build the categories router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/categories", get(index).post(create))
        .route("/categories/{id}/delete", post(request_delete))
}

/// List categories.
///
/// GET /categories
#[instrument(skip(admin, state, session))]
async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
) -> Result<Html<String>, AppError> {
    let identity = admin.identity();
    let mut flash = take_flash(&session).await?;

    let categories = match state.catalog(&identity).categories().await {
        Ok(categories) => categories.iter().map(CategoryView::from).collect(),
        Err(e) => {
            tracing::error!("Failed to load categories: {e}");
            flash.get_or_insert(Flash::Error(format!("Failed to load categories: {e}")));
            Vec::new()
        }
    };
    let prompt = load_prompt(&session).await?;

    let template = CategoriesIndexTemplate {
        admin: AdminView::from(&admin),
        current_path: "/categories".to_string(),
        categories,
        prompt: prompt.pending().map(PromptView::from),
        flash: flash.map(FlashView::from),
    };

    Ok(render(&template))
}

/// Add a category. Blank names are ignored.
///
/// POST /categories
#[instrument(skip(admin, state, session))]
async fn create(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CategoryForm>,
) -> Result<Redirect, AppError> {
    let identity = admin.identity();
    if let Err(e) = state.catalog(&identity).add_category(&form.name).await {
        tracing::error!("Failed to add category: {e}");
        set_flash(&session, Flash::Error(format!("Failed to add category: {e}"))).await?;
    }
    Ok(Redirect::to("/categories"))
}

/// Ask before deleting a category.
///
/// POST /categories/{id}/delete
#[instrument(skip(_admin, session, request))]
async fn request_delete(
    RequireAdminAuth(_admin): RequireAdminAuth,
    session: Session,
    Path(id): Path<String>,
    Form(request): Form<DeleteRequest>,
) -> Result<Redirect, AppError> {
    if !is_valid_document_id(&id) {
        return Err(AppError::NotFound(format!("category {id}")));
    }
    let mut prompt = load_prompt(&session).await?;
    prompt.request(DeletePrompt::Category {
        id: CategoryId::new(id),
        name: request.name,
    });
    store_prompt(&session, &prompt).await?;
    Ok(Redirect::to("/categories"))
}
