//! Integration tests for the session keys the code exchange leaves behind.

use order_desk_admin::backend::BackendClient;
use order_desk_admin::session::gate::LOGIN_FAILED;
use order_desk_admin::session::{
    CallbackGuard, CallbackOutcome, CurrentSession, MemoryKeyStore, complete_callback, keys,
};
use order_desk_core::{Role, SubjectId};
use order_desk_integration_tests::FakeBackend;
use serde_json::json;

fn signed_in_store() -> MemoryKeyStore {
    MemoryKeyStore::with_entries([
        (keys::ACCESS_TOKEN, "old-token"),
        (keys::SUBJECT_ID, "fb-old"),
        (keys::ROLE, "owner"),
        (keys::PENDING_ROLE, "owner"),
    ])
}

fn assert_all_keys_cleared(store: &MemoryKeyStore) {
    for key in keys::ALL {
        assert!(!store.contains(key), "{key} survived a failed exchange");
    }
}

#[tokio::test]
async fn test_backend_error_body_clears_every_key() {
    let backend = FakeBackend::start().await;
    backend.respond(
        "GET",
        "/api/callback",
        400,
        json!({"error": "Authorization code expired"}),
    );
    let client = BackendClient::new(&backend.url).unwrap();
    let store = signed_in_store();

    let outcome = complete_callback(&store, &client, &CallbackGuard::new(), "stale")
        .await
        .unwrap();

    assert_eq!(
        outcome,
        CallbackOutcome::Failed("Authorization code expired".to_string())
    );
    assert_all_keys_cleared(&store);
}

#[tokio::test]
async fn test_non_json_body_clears_every_key() {
    let backend = FakeBackend::start().await;
    backend.respond_text("GET", "/api/callback", 502, "<html>Bad Gateway</html>");
    let client = BackendClient::new(&backend.url).unwrap();
    let store = signed_in_store();

    let outcome = complete_callback(&store, &client, &CallbackGuard::new(), "abc")
        .await
        .unwrap();

    assert_eq!(outcome, CallbackOutcome::Failed(LOGIN_FAILED.to_string()));
    assert_eq!(backend.calls_to("GET", "/api/callback").len(), 1);
    assert_all_keys_cleared(&store);
}

#[tokio::test]
async fn test_successful_exchange_replaces_pending_role() {
    let backend = FakeBackend::start().await;
    let client = BackendClient::new(&backend.url).unwrap();
    let store = MemoryKeyStore::with_entries([(keys::PENDING_ROLE, "owner")]);

    let outcome = complete_callback(&store, &client, &CallbackGuard::new(), "fresh")
        .await
        .unwrap();

    assert_eq!(
        outcome,
        CallbackOutcome::Authenticated(CurrentSession {
            subject_id: SubjectId::new("fb-owner"),
            role: Role::Owner,
        })
    );
    assert!(!store.contains(keys::PENDING_ROLE));
    assert_eq!(store.value(keys::ROLE).as_deref(), Some("owner"));
    assert_eq!(store.value(keys::SUBJECT_ID).as_deref(), Some("fb-owner"));
    assert_eq!(store.value(keys::ACCESS_TOKEN).as_deref(), Some("token-fresh"));
}

#[tokio::test]
async fn test_stored_role_comes_from_backend_not_pending_choice() {
    let backend = FakeBackend::start().await;
    backend.respond(
        "GET",
        "/api/callback",
        200,
        json!({
            "access_token": "tok",
            "user": {"facebook_id": "fb-9", "user_role": "staff"},
        }),
    );
    let client = BackendClient::new(&backend.url).unwrap();
    let store = MemoryKeyStore::with_entries([(keys::PENDING_ROLE, "owner")]);

    complete_callback(&store, &client, &CallbackGuard::new(), "abc")
        .await
        .unwrap();

    assert!(!store.contains(keys::PENDING_ROLE));
    assert_eq!(store.value(keys::ROLE).as_deref(), Some("staff"));
}
