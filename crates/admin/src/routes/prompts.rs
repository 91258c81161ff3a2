//! Delete confirmation shared by the product and category pages.

use axum::{Form, Router, extract::State, response::Redirect, routing::post};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::{load_prompt, set_flash, store_prompt};
use crate::error::AppError;
use crate::forms::DeletePrompt;
use crate::middleware::RequireAdminAuth;
use crate::models::Flash;
use crate::state::AppState;

/// Pending delete prompt as rendered.
#[derive(Debug, Clone)]
pub struct PromptView {
    pub question: &'static str,
    pub name: String,
}

impl From<&DeletePrompt> for PromptView {
    fn from(prompt: &DeletePrompt) -> Self {
        Self {
            question: prompt.question(),
            name: prompt.name().to_string(),
        }
    }
}

/// Delete request; the name is only used in the prompt text.
#[derive(Debug, Default, Deserialize)]
pub struct DeleteRequest {
    #[serde(default)]
    pub name: String,
}

/// Answer to the delete prompt.
#[derive(Debug, Deserialize)]
pub struct PromptAnswer {
    pub accept: bool,
}

/// Build the prompts router.
pub fn router() -> Router<AppState> {
    Router::new().route("/delete/confirm", post(confirm_delete))
}

/// Carry out or drop the pending delete. A failed delete leaves the record
/// and shows the error once.
///
/// POST /delete/confirm
#[instrument(skip(admin, state, session))]
async fn confirm_delete(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Form(answer): Form<PromptAnswer>,
) -> Result<Redirect, AppError> {
    let mut confirmation = load_prompt(&session).await?;
    let Some(return_path) = confirmation.pending().map(DeletePrompt::return_path) else {
        return Ok(Redirect::to("/products"));
    };

    let accepted = confirmation.resolve(answer.accept)?;
    store_prompt(&session, &confirmation).await?;

    if let Some(prompt) = accepted {
        let identity = admin.identity();
        if let Err(e) = state.catalog(&identity).delete(&prompt).await {
            tracing::error!(name = %prompt.name(), "Delete failed: {e}");
            set_flash(&session, Flash::Error(format!("Failed to delete: {e}"))).await?;
        }
    }

    Ok(Redirect::to(return_path))
}
