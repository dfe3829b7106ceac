//! Wire types for the orders backend.
//!
//! The backend is loose with its JSON: optional fields may be missing or
//! `null`, string fields may be empty instead of absent, and order ids arrive
//! as `_id`. Everything here deserializes leniently and exposes small helpers
//! so templates never deal with the raw shape.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime};
use order_desk_core::{OrderId, OrderStatus, Role, StaffStatus, SubjectId};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

/// Customer name shown for groups the backend could not attribute.
pub const UNKNOWN_CUSTOMER: &str = "Unknown Customer";

// =============================================================================
// Login
// =============================================================================

/// `GET /api/login` response.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginUrl {
    /// Provider authorization page to send the browser to.
    pub auth_url: String,
}

/// `GET /api/callback` response.
///
/// Either `access_token` and `user` are set, or `error` is. The token is
/// redacted from `Debug` output.
#[derive(Clone, Default, Deserialize)]
pub struct CallbackResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub user: Option<CallbackUser>,
    /// A plain message, or the provider's error object.
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

/// Identity returned by a successful code exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct CallbackUser {
    pub facebook_id: SubjectId,
    pub user_role: Role,
}

impl std::fmt::Debug for CallbackResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackResponse")
            .field("access_token", &self.access_token.as_ref().map(|_| "[REDACTED]"))
            .field("user", &self.user)
            .field("error", &self.error)
            .finish()
    }
}

impl CallbackResponse {
    /// Human-readable form of `error`, if present.
    ///
    /// Provider errors arrive as objects; their `message` field is used when
    /// there is one.
    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        match self.error.as_ref()? {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Object(map) => Some(
                map.get("message")
                    .and_then(serde_json::Value::as_str)
                    .map_or_else(|| serde_json::Value::Object(map.clone()).to_string(), str::to_string),
            ),
            other => Some(other.to_string()),
        }
    }
}

// =============================================================================
// Orders
// =============================================================================

/// Per-product aggregate of orders still at the pickup stage.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductSummary {
    pub product_name: String,
    /// Quantity per color, sorted by color name.
    #[serde(default, deserialize_with = "null_as_default")]
    pub color_breakdown: BTreeMap<String, i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_quantity: i64,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub image_url: Option<String>,
}

/// A single order line.
#[derive(Debug, Clone, Deserialize)]
pub struct Order {
    #[serde(rename = "_id", alias = "id")]
    pub id: OrderId,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub customer_name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub item_name: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub color: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub quantity: i64,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub subtotal: Option<Decimal>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub preparation_notes: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub billing_notes: Option<String>,
    #[serde(default)]
    pub billing: Option<BillingDetails>,
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Nested billing block some backend versions send.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BillingDetails {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub notes: Option<String>,
}

impl Order {
    /// Image URL, if the order has one.
    #[must_use]
    pub fn image(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    /// Billing note: top-level `billing_notes` first, then `billing.notes`.
    #[must_use]
    pub fn effective_billing_note(&self) -> Option<&str> {
        self.billing_notes
            .as_deref()
            .or_else(|| self.billing.as_ref().and_then(|b| b.notes.as_deref()))
    }

    /// Backend subtotal, or `price * quantity` when only the price is known.
    ///
    /// `None` when neither is known or the product does not fit a `Decimal`.
    #[must_use]
    pub fn subtotal_or_computed(&self) -> Option<Decimal> {
        self.subtotal.or_else(|| {
            self.price
                .and_then(|p| p.checked_mul(Decimal::from(self.quantity)))
        })
    }

    /// Creation time formatted for tables, or the raw value if unparseable.
    #[must_use]
    pub fn created_label(&self) -> Option<String> {
        self.created_at.as_deref().map(format_timestamp)
    }
}

/// Orders of one customer at one pipeline stage.
#[derive(Debug, Clone, Deserialize)]
pub struct CustomerOrderGroup {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub customer_name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub orders: Vec<Order>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub total_amount: Option<Decimal>,
    #[serde(default)]
    pub total_items: Option<i64>,
}

impl CustomerOrderGroup {
    /// Customer name for display.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.customer_name.as_deref().unwrap_or(UNKNOWN_CUSTOMER)
    }

    /// Backend total amount, or the sum of the order subtotals.
    ///
    /// `None` when the sum does not fit a `Decimal`.
    #[must_use]
    pub fn amount(&self) -> Option<Decimal> {
        if self.total_amount.is_some() {
            return self.total_amount;
        }
        self.orders
            .iter()
            .filter_map(Order::subtotal_or_computed)
            .try_fold(Decimal::ZERO, Decimal::checked_add)
    }

    /// Backend item count, or the sum of the order quantities.
    #[must_use]
    pub fn items(&self) -> i64 {
        self.total_items
            .unwrap_or_else(|| self.orders.iter().map(|o| o.quantity).sum())
    }
}

// =============================================================================
// Users
// =============================================================================

/// A dashboard account managed on the users page.
#[derive(Debug, Clone, Deserialize)]
pub struct StaffUser {
    pub facebook_id: SubjectId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: StaffStatus,
}

/// A provider account found by name search.
///
/// Sent back verbatim to `POST /api/users/import-facebook`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalUser {
    pub facebook_id: SubjectId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<StaffStatus>,
}

// =============================================================================
// Helpers
// =============================================================================

/// Treat `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Treat `null` and `""` as absent.
fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.filter(|s| !s.trim().is_empty()))
}

/// Format a backend timestamp (RFC 3339 or naive ISO 8601) for display.
fn format_timestamp(raw: &str) -> String {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.naive_local())
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f"))
        .map_or_else(|_| raw.to_string(), |dt| dt.format("%Y-%m-%d %H:%M").to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_order_reads_underscore_id_and_nulls() {
        let order: Order = serde_json::from_value(json!({
            "_id": "65f0c1",
            "customer_name": null,
            "item_name": "Mug",
            "color": null,
            "quantity": 2,
            "price": null,
            "image_url": "",
            "status": "preparing"
        }))
        .unwrap();

        assert_eq!(order.id.as_str(), "65f0c1");
        assert_eq!(order.item_name, "Mug");
        assert_eq!(order.color, None);
        assert_eq!(order.image(), None);
        assert_eq!(order.price, None);
        assert_eq!(order.status, Some(OrderStatus::Preparing));
    }

    #[test]
    fn test_order_accepts_plain_id() {
        let order: Order = serde_json::from_value(json!({"id": "abc", "item_name": null})).unwrap();
        assert_eq!(order.id.as_str(), "abc");
        assert_eq!(order.item_name, "");
        assert_eq!(order.quantity, 0);
    }

    #[test]
    fn test_subtotal_falls_back_to_price_times_quantity() {
        let order: Order = serde_json::from_value(json!({
            "_id": "1", "item_name": "Cap", "quantity": 3, "price": 2.5
        }))
        .unwrap();
        assert_eq!(order.subtotal_or_computed(), Some(Decimal::new(75, 1)));

        let order: Order = serde_json::from_value(json!({
            "_id": "1", "item_name": "Cap", "quantity": 3, "price": 2.5, "subtotal": 7.0
        }))
        .unwrap();
        assert_eq!(order.subtotal_or_computed(), Some(Decimal::new(7, 0)));
    }

    #[test]
    fn test_billing_note_prefers_top_level_field() {
        let order: Order = serde_json::from_value(json!({
            "_id": "1", "item_name": "Cap",
            "billing_notes": "", "billing": {"notes": "paid cash"}
        }))
        .unwrap();
        assert_eq!(order.effective_billing_note(), Some("paid cash"));

        let order: Order = serde_json::from_value(json!({
            "_id": "1", "item_name": "Cap",
            "billing_notes": "wrap it", "billing": {"notes": "paid cash"}
        }))
        .unwrap();
        assert_eq!(order.effective_billing_note(), Some("wrap it"));
    }

    #[test]
    fn test_group_totals_fall_back_to_orders() {
        let group: CustomerOrderGroup = serde_json::from_value(json!({
            "customer_name": null,
            "orders": [
                {"_id": "1", "item_name": "Mug", "quantity": 2, "price": 4.0},
                {"_id": "2", "item_name": "Cap", "quantity": 1, "price": 10.5}
            ]
        }))
        .unwrap();

        assert_eq!(group.display_name(), UNKNOWN_CUSTOMER);
        assert_eq!(group.items(), 3);
        assert_eq!(group.amount(), Some(Decimal::new(185, 1)));
    }

    #[test]
    fn test_oversized_totals_do_not_overflow() {
        let order: Order = serde_json::from_value(json!({
            "_id": "1", "item_name": "Mug", "quantity": 2, "price": 5e28
        }))
        .unwrap();
        assert_eq!(order.subtotal_or_computed(), None);

        let group: CustomerOrderGroup = serde_json::from_value(json!({
            "customer_name": "Bob",
            "orders": [
                {"_id": "1", "item_name": "Mug", "quantity": 1, "price": 5e28},
                {"_id": "2", "item_name": "Cap", "quantity": 1, "price": 5e28}
            ]
        }))
        .unwrap();
        assert_eq!(group.amount(), None);
    }

    #[test]
    fn test_summary_breakdown_is_sorted_by_color() {
        let summary: ProductSummary = serde_json::from_value(json!({
            "product_name": "Tee",
            "color_breakdown": {"red": 2, "blue": 1},
            "total_quantity": 3,
            "image_url": null
        }))
        .unwrap();

        let colors: Vec<_> = summary.color_breakdown.keys().cloned().collect();
        assert_eq!(colors, vec!["blue".to_string(), "red".to_string()]);
        assert_eq!(summary.price, None);
    }

    #[test]
    fn test_callback_error_message_shapes() {
        let text: CallbackResponse =
            serde_json::from_value(json!({"error": "No code provided"})).unwrap();
        assert_eq!(text.error_message().as_deref(), Some("No code provided"));

        let provider: CallbackResponse = serde_json::from_value(json!({
            "error": {"message": "Code has expired", "type": "OAuthException", "code": 100}
        }))
        .unwrap();
        assert_eq!(provider.error_message().as_deref(), Some("Code has expired"));

        let opaque: CallbackResponse =
            serde_json::from_value(json!({"error": {"code": 190}})).unwrap();
        assert_eq!(opaque.error_message().as_deref(), Some("{\"code\":190}"));

        let ok: CallbackResponse = serde_json::from_value(json!({
            "access_token": "t",
            "user": {"facebook_id": "42", "user_role": "owner"}
        }))
        .unwrap();
        assert_eq!(ok.error_message(), None);
        assert_eq!(ok.user.map(|u| u.user_role), Some(Role::Owner));
    }

    #[test]
    fn test_external_user_serializes_without_missing_fields() {
        let user = ExternalUser {
            facebook_id: SubjectId::new("77"),
            name: "Dana".to_string(),
            email: None,
            status: None,
        };
        assert_eq!(
            serde_json::to_value(&user).unwrap(),
            json!({"facebook_id": "77", "name": "Dana"})
        );
    }

    #[test]
    fn test_created_label_formats_iso_timestamps() {
        assert_eq!(format_timestamp("2024-03-01T09:30:00"), "2024-03-01 09:30");
        assert_eq!(format_timestamp("2024-03-01T09:30:00.123456"), "2024-03-01 09:30");
        assert_eq!(format_timestamp("2024-03-01T09:30:00+00:00"), "2024-03-01 09:30");
        assert_eq!(format_timestamp("yesterday"), "yesterday");
    }
}
