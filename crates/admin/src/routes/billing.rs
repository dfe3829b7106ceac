//! Billing tab: prepared orders awaiting payment, grouped by customer.

use askama::Template;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{Html, Redirect},
};
use order_desk_core::{OrderId, Price, Tab};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::components::flash::{self, FieldError};
use crate::error::AppError;
use crate::filters;
use crate::middleware::{RequireSession, ensure_tab};
use crate::state::AppState;

use super::preparing::NotesInput;
use super::render;
use super::views::{
    ExportDialog, GroupView, ImagePreview, NoteDialog, NoteField, PriceDialog, ShellView,
    export_text, find_order, with_query,
};

const PAGE: &str = "/billing";

/// Billing orders page template.
#[derive(Template)]
#[template(path = "billing.html")]
pub struct BillingTemplate {
    pub shell: ShellView,
    pub error: Option<String>,
    pub groups: Vec<GroupView>,
    pub note_dialog: Option<NoteDialog>,
    pub price_dialog: Option<PriceDialog>,
    pub export_dialog: Option<ExportDialog>,
    pub preview: Option<ImagePreview>,
}

/// Dialog state carried in the query string.
#[derive(Debug, Default, Deserialize)]
pub struct BillingQuery {
    pub note_for: Option<String>,
    pub price_for: Option<String>,
    pub export_for: Option<String>,
    pub image: Option<String>,
}

/// Mark-all-paid form input.
#[derive(Debug, Deserialize)]
pub struct CustomerInput {
    /// Absent for orders the backend could not attribute to a customer.
    pub customer_name: Option<String>,
}

/// Price form input.
#[derive(Debug, Deserialize)]
pub struct OrderPriceInput {
    pub price: String,
}

/// Billing orders page handler (owner only).
#[instrument(skip(current, state, session))]
pub async fn index(
    RequireSession(current): RequireSession,
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<BillingQuery>,
) -> Result<Html<String>, AppError> {
    ensure_tab(&current, Tab::Billing)?;

    let flash_error = flash::take_error(&session).await;
    let field_error = flash::take_field_error(&session).await;

    let (groups, error) = match state
        .backend()
        .for_subject(&current.subject_id)
        .billing_orders()
        .await
    {
        Ok(groups) => (groups, flash_error),
        Err(e) => {
            tracing::error!(error = %e, "Failed to fetch billing orders");
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

    let price_dialog = query
        .price_for
        .as_deref()
        .and_then(|id| find_order(&groups, id))
        .map(|order| {
            let (draft, error) = match field_error.filter(|f| f.target == order.id.as_str()) {
                Some(f) => (f.draft, Some(f.message)),
                None => (order.price.map(|p| p.to_string()).unwrap_or_default(), None),
            };
            PriceDialog {
                title: format!("Edit Price for {}", order.item_name),
                action: format!("{PAGE}/{}/price", urlencoding::encode(order.id.as_str())),
                product_name: None,
                draft,
                error,
                close_href: PAGE.to_string(),
            }
        });

    let export_dialog = query.export_for.as_deref().and_then(|customer| {
        groups
            .iter()
            .find(|g| g.display_name() == customer)
            .map(|group| ExportDialog {
                customer: group.display_name().to_string(),
                text: export_text(group),
                close_href: PAGE.to_string(),
            })
    });

    let template = BillingTemplate {
        shell: ShellView::new(&current, Tab::Billing),
        error,
        groups: groups
            .iter()
            .map(|g| GroupView::new(PAGE, g, NoteField::Billing))
            .collect(),
        note_dialog,
        price_dialog,
        export_dialog,
        preview: ImagePreview::new(PAGE, query.image),
    };

    Ok(render(&template))
}

/// Mark every billing order of a customer as paid.
#[instrument(skip(current, state, session, input), fields(customer = ?input.customer_name))]
pub async fn mark_paid(
    RequireSession(current): RequireSession,
    State(state): State<AppState>,
    session: Session,
    Form(input): Form<CustomerInput>,
) -> Result<Redirect, AppError> {
    ensure_tab(&current, Tab::Billing)?;

    if let Err(e) = state
        .backend()
        .for_subject(&current.subject_id)
        .mark_all_paid(input.customer_name.as_deref())
        .await
    {
        tracing::error!(error = %e, "Failed to mark orders as paid");
        flash::push_error(&session, e.user_message()).await;
    }

    Ok(Redirect::to(PAGE))
}

/// Save an order's billing notes.
#[instrument(skip(current, state, session, input), fields(order_id = %id))]
pub async fn save_notes(
    RequireSession(current): RequireSession,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<OrderId>,
    Form(input): Form<NotesInput>,
) -> Result<Redirect, AppError> {
    ensure_tab(&current, Tab::Billing)?;

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

/// Set the price of a single order.
///
/// An invalid draft re-opens the dialog with the draft and an inline error,
/// without calling the backend.
#[instrument(skip(current, state, session, input), fields(order_id = %id))]
pub async fn set_price(
    RequireSession(current): RequireSession,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<OrderId>,
    Form(input): Form<OrderPriceInput>,
) -> Result<Redirect, AppError> {
    ensure_tab(&current, Tab::Billing)?;

    let price = match Price::parse(&input.price) {
        Ok(price) => price,
        Err(e) => {
            tracing::debug!(draft = %input.price, "Rejected price draft");
            flash::push_field_error(
                &session,
                &FieldError {
                    target: id.to_string(),
                    draft: input.price,
                    message: e.to_string(),
                },
            )
            .await;
            return Ok(Redirect::to(&with_query(PAGE, "price_for", id.as_str())));
        }
    };

    if let Err(e) = state
        .backend()
        .for_subject(&current.subject_id)
        .update_order_price(&id, price)
        .await
    {
        tracing::error!(error = %e, "Failed to update price");
        flash::push_error(&session, e.user_message()).await;
    }

    Ok(Redirect::to(PAGE))
}
