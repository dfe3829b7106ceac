//! History tab: completed orders.

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

use super::preparing::NotesInput;
use super::render;
use super::views::{GroupView, ImagePreview, NoteDialog, NoteField, ShellView, find_order};

const PAGE: &str = "/history";

/// History page template.
#[derive(Template)]
#[template(path = "history.html")]
pub struct HistoryTemplate {
    pub shell: ShellView,
    pub error: Option<String>,
    pub groups: Vec<GroupView>,
    pub note_dialog: Option<NoteDialog>,
    pub preview: Option<ImagePreview>,
}

/// Dialog state carried in the query string.
#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub note_for: Option<String>,
    pub image: Option<String>,
}

/// History page handler (owner only).
#[instrument(skip(current, state, session))]
pub async fn index(
    RequireSession(current): RequireSession,
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<HistoryQuery>,
) -> Result<Html<String>, AppError> {
    ensure_tab(&current, Tab::History)?;

    let flash_error = flash::take_error(&session).await;

    let (groups, error) = match state
        .backend()
        .for_subject(&current.subject_id)
        .history_orders()
        .await
    {
        Ok(groups) => (groups, flash_error),
        Err(e) => {
            tracing::error!(error = %e, "Failed to fetch history orders");
            (Vec::new(), Some(e.user_message().to_string()))
        }
    };

    let note_dialog = query
        .note_for
        .as_deref()
        .and_then(|id| find_order(&groups, id))
        .map(|order| NoteDialog {
            title: format!("Add Note for {}", order.item_name),
            action: format!("{PAGE}/{}/notes", urlencoding::encode(order.id.as_str())),
            draft: order
                .effective_billing_note()
                .unwrap_or_default()
                .to_string(),
            close_href: PAGE.to_string(),
        });

    let template = HistoryTemplate {
        shell: ShellView::new(&current, Tab::History),
        error,
        groups: groups
            .iter()
            .map(|g| GroupView::new(PAGE, g, NoteField::Billing))
            .collect(),
        note_dialog,
        preview: ImagePreview::new(PAGE, query.image),
    };

    Ok(render(&template))
}

/// Save a completed order's notes (stored as billing notes).
#[instrument(skip(current, state, session, input), fields(order_id = %id))]
pub async fn save_notes(
    RequireSession(current): RequireSession,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<OrderId>,
    Form(input): Form<NotesInput>,
) -> Result<Redirect, AppError> {
    ensure_tab(&current, Tab::History)?;

    if let Err(e) = state
        .backend()
        .for_subject(&current.subject_id)
        .set_billing_notes(&id, &input.notes)
        .await
    {
        tracing::error!(error = %e, "Failed to update notes");
        flash::push_error(&session, e.user_message()).await;
    }

    Ok(Redirect::to(PAGE))
}
