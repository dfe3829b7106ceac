//! Status enums for various entities.

use serde::{Deserialize, Serialize};

/// Access level of a signed-in dashboard user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Works the preparation floor: order summary and preparing tabs.
    #[default]
    Staff,
    /// Runs the shop: everything staff can do plus billing, history and staff management.
    Owner,
}

impl Role {
    /// Wire/storage representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Staff => "staff",
            Self::Owner => "owner",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "staff" => Ok(Self::Staff),
            "owner" => Ok(Self::Owner),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}

/// Pipeline stage of an order line.
///
/// Orders only move forward: pickup (order summary) -> preparing -> billing
/// -> completed (history). Statuses this dashboard does not know about are
/// kept verbatim so they can still be displayed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Collected from customer messages, not yet being prepared.
    Pickup,
    /// Being prepared for the customer.
    Preparing,
    /// Prepared and waiting for payment.
    Billing,
    /// Paid.
    Completed,
    /// Any other backend status.
    #[serde(untagged)]
    Other(String),
}

impl OrderStatus {
    /// Display label.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Pickup => "pickup",
            Self::Preparing => "preparing",
            Self::Billing => "billing",
            Self::Completed => "completed",
            Self::Other(s) => s,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Staff account status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StaffStatus {
    #[default]
    Active,
    Inactive,
}

impl StaffStatus {
    /// Whether the account is active.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl std::fmt::Display for StaffStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Inactive => write!(f, "inactive"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trips_through_str() {
        for role in [Role::Staff, Role::Owner] {
            assert_eq!(role.as_str().parse::<Role>(), Ok(role));
        }
        assert!("admin".parse::<Role>().is_err());
        assert!("Owner".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_defaults_to_staff() {
        assert_eq!(Role::default(), Role::Staff);
    }

    #[test]
    fn test_order_status_keeps_unknown_values() {
        let status: OrderStatus = serde_json::from_str("\"refunded\"").expect("deserialize");
        assert_eq!(status, OrderStatus::Other("refunded".to_string()));
        assert_eq!(status.to_string(), "refunded");

        let status: OrderStatus = serde_json::from_str("\"billing\"").expect("deserialize");
        assert_eq!(status, OrderStatus::Billing);
    }

    #[test]
    fn test_staff_status_wire_format() {
        let status: StaffStatus = serde_json::from_str("\"inactive\"").expect("deserialize");
        assert!(!status.is_active());
        assert_eq!(serde_json::to_string(&StaffStatus::Active).expect("serialize"), "\"active\"");
    }
}
