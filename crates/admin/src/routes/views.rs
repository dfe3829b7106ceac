//! View models shared by the tab pages.
//!
//! Templates only see pre-formatted strings: money is rendered as `$x.xx`,
//! missing values as empty strings (shown as `-` by the `or_dash` filter), and
//! every link that carries user data is percent-encoded here.

use std::fmt::Write as _;

use order_desk_core::{Role, Tab, format_money, tabs_for};

use crate::backend::{CustomerOrderGroup, Order};
use crate::session::CurrentSession;

/// Application title shown in the header and login page.
pub const APP_TITLE: &str = "Order Desk";

// =============================================================================
// Shell
// =============================================================================

/// Header and tab strip for a signed-in page.
#[derive(Debug, Clone)]
pub struct ShellView {
    pub subject_id: String,
    pub role: String,
    pub is_owner: bool,
    pub tabs: Vec<TabLink>,
}

/// One entry of the tab strip.
#[derive(Debug, Clone)]
pub struct TabLink {
    pub label: &'static str,
    pub path: &'static str,
    pub active: bool,
}

impl ShellView {
    /// Shell for `current` with `active` selected.
    #[must_use]
    pub fn new(current: &CurrentSession, active: Tab) -> Self {
        let tabs = tabs_for(current.role)
            .into_iter()
            .map(|tab| TabLink {
                label: tab.label(),
                path: tab.path(),
                active: tab == active,
            })
            .collect();

        Self {
            subject_id: current.subject_id.to_string(),
            role: current.role.to_string(),
            is_owner: current.role == Role::Owner,
            tabs,
        }
    }
}

// =============================================================================
// Orders
// =============================================================================

/// Image thumbnail with a link that opens the full-size preview.
#[derive(Debug, Clone)]
pub struct ImageView {
    pub url: String,
    pub preview_href: String,
}

impl ImageView {
    #[must_use]
    pub fn new(page: &str, url: &str) -> Self {
        Self {
            url: url.to_string(),
            preview_href: with_query(page, "image", url),
        }
    }
}

/// One order line in a group table.
#[derive(Debug, Clone)]
pub struct OrderRowView {
    pub id: String,
    /// Id encoded for use as a path segment.
    pub path_id: String,
    pub item_name: String,
    pub image: Option<ImageView>,
    pub color: String,
    pub quantity: i64,
    /// Unit price, or empty when unknown.
    pub price: String,
    pub subtotal: String,
    pub notes: String,
    pub status: String,
    pub date: String,
    pub note_href: String,
    pub price_href: String,
}

/// Which note field a page shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteField {
    Preparation,
    Billing,
}

impl OrderRowView {
    #[must_use]
    pub fn new(page: &str, order: &Order, notes: NoteField) -> Self {
        let id = order.id.to_string();
        let note = match notes {
            NoteField::Preparation => order.preparation_notes.as_deref(),
            NoteField::Billing => order.effective_billing_note(),
        };

        Self {
            path_id: urlencoding::encode(&id).into_owned(),
            note_href: with_query(page, "note_for", &id),
            price_href: with_query(page, "price_for", &id),
            id,
            item_name: order.item_name.clone(),
            image: order.image().map(|url| ImageView::new(page, url)),
            color: order.color.clone().unwrap_or_default(),
            quantity: order.quantity,
            price: order.price.map(format_money).unwrap_or_default(),
            subtotal: order
                .subtotal_or_computed()
                .map(format_money)
                .unwrap_or_default(),
            notes: note.unwrap_or_default().to_string(),
            status: order
                .status
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
            date: order.created_label().unwrap_or_default(),
        }
    }
}

/// One customer card.
#[derive(Debug, Clone)]
pub struct GroupView {
    pub customer: String,
    /// Name to send back to the backend; `None` for unattributed groups.
    pub customer_name: Option<String>,
    pub total_items: i64,
    pub total_amount: String,
    pub export_href: String,
    pub orders: Vec<OrderRowView>,
}

impl GroupView {
    #[must_use]
    pub fn new(page: &str, group: &CustomerOrderGroup, notes: NoteField) -> Self {
        Self {
            customer: group.display_name().to_string(),
            customer_name: group.customer_name.clone(),
            total_items: group.items(),
            total_amount: group.amount().map(format_money).unwrap_or_default(),
            export_href: with_query(page, "export_for", group.display_name()),
            orders: group
                .orders
                .iter()
                .map(|order| OrderRowView::new(page, order, notes))
                .collect(),
        }
    }
}

/// Find the order with `id` across `groups`.
#[must_use]
pub fn find_order<'a>(groups: &'a [CustomerOrderGroup], id: &str) -> Option<&'a Order> {
    groups
        .iter()
        .flat_map(|g| g.orders.iter())
        .find(|o| o.id.as_str() == id)
}

// =============================================================================
// Dialogs
// =============================================================================

/// Price entry dialog.
#[derive(Debug, Clone)]
pub struct PriceDialog {
    pub title: String,
    pub action: String,
    /// Product name posted as a hidden field (summary prices only).
    pub product_name: Option<String>,
    pub draft: String,
    pub error: Option<String>,
    pub close_href: String,
}

/// Note entry dialog.
#[derive(Debug, Clone)]
pub struct NoteDialog {
    pub title: String,
    pub action: String,
    pub draft: String,
    pub close_href: String,
}

/// Billing export dialog.
#[derive(Debug, Clone)]
pub struct ExportDialog {
    pub customer: String,
    pub text: String,
    pub close_href: String,
}

/// Full-size image preview.
#[derive(Debug, Clone)]
pub struct ImagePreview {
    pub url: String,
    pub close_href: String,
}

impl ImagePreview {
    #[must_use]
    pub fn new(page: &str, url: Option<String>) -> Option<Self> {
        url.filter(|u| !u.trim().is_empty()).map(|url| Self {
            url,
            close_href: page.to_string(),
        })
    }
}

// =============================================================================
// Export
// =============================================================================

/// Plain-text billing summary for one customer.
///
/// ```text
///
/// Order Details for Bob:
/// ----------------------------------------
///
/// 2 Mug red - $8.00
/// Notes: gift wrap
///
/// Total Amount: $8.00
/// ```
#[must_use]
pub fn export_text(group: &CustomerOrderGroup) -> String {
    let mut text = format!("\nOrder Details for {}:\n", group.display_name());
    text.push_str("----------------------------------------\n");

    for order in &group.orders {
        let color = order
            .color
            .as_deref()
            .map(|c| format!(" {c}"))
            .unwrap_or_default();
        let subtotal = order
            .subtotal_or_computed()
            .map_or_else(|| "-".to_string(), format_money);
        let _ = write!(
            text,
            "\n{} {}{} - {}\n",
            order.quantity,
            order.item_name,
            color,
            subtotal
        );
        if let Some(note) = order.effective_billing_note() {
            let _ = writeln!(text, "Notes: {note}");
        }
    }

    let total = group
        .amount()
        .map_or_else(|| "-".to_string(), format_money);
    let _ = write!(text, "\nTotal Amount: {total}");
    text
}

// =============================================================================
// Helpers
// =============================================================================

/// `page?key=value` with `value` percent-encoded.
#[must_use]
pub fn with_query(page: &str, key: &str, value: &str) -> String {
    format!("{page}?{key}={}", urlencoding::encode(value))
}
