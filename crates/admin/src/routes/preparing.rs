//! Preparing tab: orders being prepared, grouped by customer.

use askama::Template;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{Html, Redirect},
};
use order_desk_core::{OrderId, Tab};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::components::flash;
use crate::error::AppError;
use crate::filters;
use crate::middleware::{RequireSession, ensure_tab};
use crate::state::AppState;

use super::render;
use super::views::{GroupView, ImagePreview, NoteDialog, NoteField, ShellView, find_order};

const PAGE: &str = "/preparing";

/// Preparing orders page template.
#[derive(Template)]
#[template(path = "preparing.html")]
pub struct PreparingTemplate {
    pub shell: ShellView,
    pub error: Option<String>,
    pub groups: Vec<GroupView>,
    pub note_dialog: Option<NoteDialog>,
    pub preview: Option<ImagePreview>,
}

/// Dialog state carried in the query string.
#[derive(Debug, Default, Deserialize)]
pub struct PreparingQuery {
    pub note_for: Option<String>,
    pub image: Option<String>,
}

/// Note form input.
#[derive(Debug, Deserialize)]
pub struct NotesInput {
    #[serde(default)]
    pub notes: String,
}

/// Preparing orders page handler.
#[instrument(skip(current, state, session))]
pub async fn index(
    RequireSession(current): RequireSession,
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<PreparingQuery>,
) -> Result<Html<String>, AppError> {
    ensure_tab(&current, Tab::Preparing)?;

    let flash_error = flash::take_error(&session).await;

    let (groups, error) = match state
        .backend()
        .for_subject(&current.subject_id)
        .preparing_orders()
        .await
    {
        Ok(groups) => (groups, flash_error),
        Err(e) => {
            tracing::error!(error = %e, "Failed to fetch preparing orders");
            (Vec::new(), Some(e.user_message().to_string()))
        }
    };

    let note_dialog = query
        .note_for
        .as_deref()
        .and_then(|id| find_order(&groups, id))
        .map(|order| NoteDialog {
            title: format!("Add Note for {}", order.item_name),
            action: format!(
                "{PAGE}/{}/notes",
                urlencoding::encode(order.id.as_str())
            ),
            draft: order.preparation_notes.clone().unwrap_or_default(),
            close_href: PAGE.to_string(),
        });

    let template = PreparingTemplate {
        shell: ShellView::new(&current, Tab::Preparing),
        error,
        groups: groups
            .iter()
            .map(|g| GroupView::new(PAGE, g, NoteField::Preparation))
            .collect(),
        note_dialog,
        preview: ImagePreview::new(PAGE, query.image),
    };

    Ok(render(&template))
}

/// Mark an order as prepared (moves it to billing).
#[instrument(skip(current, state, session), fields(order_id = %id))]
pub async fn complete(
    RequireSession(current): RequireSession,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<OrderId>,
) -> Result<Redirect, AppError> {
    ensure_tab(&current, Tab::Preparing)?;

    if let Err(e) = state
        .backend()
        .for_subject(&current.subject_id)
        .move_to_billing(&id)
        .await
    {
        tracing::error!(error = %e, "Failed to move order to billing");
        flash::push_error(&session, e.user_message()).await;
    }

    Ok(Redirect::to(PAGE))
}

/// Save an order's preparation notes.
#[instrument(skip(current, state, session, input), fields(order_id = %id))]
pub async fn save_notes(
    RequireSession(current): RequireSession,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<OrderId>,
    Form(input): Form<NotesInput>,
) -> Result<Redirect, AppError> {
    ensure_tab(&current, Tab::Preparing)?;

    if let Err(e) = state
        .backend()
        .for_subject(&current.subject_id)
        .set_preparation_notes(&id, &input.notes)
        .await
    {
        tracing::error!(error = %e, "Failed to update notes");
        flash::push_error(&session, e.user_message()).await;
    }

    Ok(Redirect::to(PAGE))
}
