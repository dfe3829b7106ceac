//! Dashboard tabs and the role access table.
//!
//! Which tabs a role may open is decided by [`ACCESS`] alone. Rendering code
//! asks [`tabs_for`] for the strip and route handlers ask [`can_access`]
//! before serving a tab.

use serde::{Deserialize, Serialize};

use super::status::Role;

/// A top-level dashboard tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tab {
    /// Product summaries of orders awaiting preparation.
    Summary,
    /// Orders being prepared, grouped by customer.
    Preparing,
    /// Prepared orders awaiting payment, grouped by customer.
    Billing,
    /// Completed orders.
    History,
    /// Staff account management.
    Users,
}

/// Tabs in display order with the roles allowed to open them.
const ACCESS: &[(Tab, &[Role])] = &[
    (Tab::Summary, &[Role::Staff, Role::Owner]),
    (Tab::Preparing, &[Role::Staff, Role::Owner]),
    (Tab::Billing, &[Role::Owner]),
    (Tab::History, &[Role::Owner]),
    (Tab::Users, &[Role::Owner]),
];

impl Tab {
    /// Every tab in display order.
    pub const ALL: [Self; 5] = [
        Self::Summary,
        Self::Preparing,
        Self::Billing,
        Self::History,
        Self::Users,
    ];

    /// Label shown in the tab strip.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Summary => "Order Summary",
            Self::Preparing => "Preparing Orders",
            Self::Billing => "Billing Orders",
            Self::History => "History",
            Self::Users => "User Management",
        }
    }

    /// Dashboard path serving this tab.
    #[must_use]
    pub const fn path(&self) -> &'static str {
        match self {
            Self::Summary => "/summary",
            Self::Preparing => "/preparing",
            Self::Billing => "/billing",
            Self::History => "/history",
            Self::Users => "/users",
        }
    }
}

/// Whether `role` may open `tab`.
#[must_use]
pub fn can_access(role: Role, tab: Tab) -> bool {
    ACCESS
        .iter()
        .any(|(t, roles)| *t == tab && roles.contains(&role))
}

/// The tab strip for `role`, in display order.
#[must_use]
pub fn tabs_for(role: Role) -> Vec<Tab> {
    ACCESS
        .iter()
        .filter(|(_, roles)| roles.contains(&role))
        .map(|(tab, _)| *tab)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staff_sees_summary_and_preparing_only() {
        assert_eq!(tabs_for(Role::Staff), vec![Tab::Summary, Tab::Preparing]);
    }

    #[test]
    fn test_owner_sees_every_tab_in_order() {
        assert_eq!(tabs_for(Role::Owner), Tab::ALL.to_vec());
    }

    #[test]
    fn test_staff_never_reaches_owner_tabs() {
        for tab in [Tab::Billing, Tab::History, Tab::Users] {
            assert!(!can_access(Role::Staff, tab), "staff reached {tab:?}");
            assert!(can_access(Role::Owner, tab));
        }
    }

    #[test]
    fn test_can_access_agrees_with_tabs_for() {
        for role in [Role::Staff, Role::Owner] {
            let strip = tabs_for(role);
            for tab in Tab::ALL {
                assert_eq!(can_access(role, tab), strip.contains(&tab));
            }
        }
    }

    #[test]
    fn test_every_tab_is_listed_once() {
        assert_eq!(ACCESS.len(), Tab::ALL.len());
        for (i, tab) in Tab::ALL.iter().enumerate() {
            assert_eq!(ACCESS.get(i).map(|(t, _)| t), Some(tab));
        }
    }

    #[test]
    fn test_paths_are_distinct() {
        let mut paths: Vec<_> = Tab::ALL.iter().map(Tab::path).collect();
        paths.sort_unstable();
        paths.dedup();
        assert_eq!(paths.len(), Tab::ALL.len());
    }
}
