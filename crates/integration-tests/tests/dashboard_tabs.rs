//! Integration tests for the role-filtered tab strip.

use order_desk_core::{Role, Tab, tabs_for};
use order_desk_integration_tests::{Dashboard, FakeBackend};
use reqwest::StatusCode;

#[tokio::test]
async fn test_staff_sees_two_tabs() {
    let backend = FakeBackend::start().await;
    let desk = Dashboard::start(&backend).await;
    desk.login_staff().await;

    let body = desk.page("/summary").await;
    for tab in tabs_for(Role::Staff) {
        assert!(body.contains(tab.label()), "missing {}", tab.label());
    }
    assert!(!body.contains(Tab::Billing.label()));
    assert!(!body.contains(Tab::History.label()));
    assert!(!body.contains(Tab::Users.label()));
}

#[tokio::test]
async fn test_owner_sees_every_tab() {
    let backend = FakeBackend::start().await;
    let desk = Dashboard::start(&backend).await;
    desk.login_owner().await;

    let body = desk.page("/preparing").await;
    for tab in Tab::ALL {
        assert!(body.contains(tab.path()), "missing {}", tab.path());
    }
}

#[tokio::test]
async fn test_staff_is_refused_owner_tabs() {
    let backend = FakeBackend::start().await;
    let desk = Dashboard::start(&backend).await;
    desk.login_staff().await;

    for path in ["/billing", "/history", "/users"] {
        let resp = desk.get(path).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN, "GET {path}");
    }

    let resp = desk.post_form("/billing/paid", &[("customer_name", "Bob")]).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert!(backend.calls_to("POST", "/api/orders/mark-all-paid").is_empty());
}

#[tokio::test]
async fn test_active_tab_is_marked() {
    let backend = FakeBackend::start().await;
    let desk = Dashboard::start(&backend).await;
    desk.login_owner().await;

    let body = desk.page("/history").await;
    assert!(body.contains(r#"href="/history" class="tabs__item tabs__item--active""#));
    assert!(body.contains(r#"href="/summary" class="tabs__item""#));
}
