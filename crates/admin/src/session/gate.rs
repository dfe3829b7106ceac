//! Login gate: restore, begin, complete and end a session.
//!
//! ```text
//! Unauthenticated --begin_login--> PendingRedirect
//! PendingRedirect --complete_callback ok--> Authenticated
//! PendingRedirect --complete_callback failure--> Unauthenticated
//! Authenticated --end_login--> Unauthenticated
//! ```
//!
//! The backend performs the provider code exchange and decides the role.
//! The gate only moves strings in and out of the store.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use order_desk_core::{Role, SubjectId};
use thiserror::Error;
use tracing::instrument;

use super::store::{KeyValueStore, StoreError};
use super::{CurrentSession, keys};
use crate::backend::{BackendClient, BackendError, CallbackResponse};

/// Message shown when the code exchange fails without a backend explanation.
pub const LOGIN_FAILED: &str = "Failed to complete login. Please try again.";

/// Result of reading the session from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Authenticated(CurrentSession),
    Unauthenticated,
}

/// Result of a provider callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// The code was exchanged and the session persisted.
    Authenticated(CurrentSession),
    /// The exchange failed; the session was cleared.
    Failed(String),
    /// Another exchange for the same code is still running.
    AlreadyInFlight,
}

/// Errors starting a login.
#[derive(Debug, Error)]
pub enum LoginError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

// =============================================================================
// Callback guard
// =============================================================================

/// Codes whose exchange is currently running.
///
/// Provider codes are single-use, so a second exchange of the same code (a
/// double-loaded callback page) would fail and wipe the session the first
/// one is about to write.
#[derive(Debug, Clone, Default)]
pub struct CallbackGuard {
    in_flight: Arc<Mutex<HashSet<String>>>,
}

/// Claim on a code; released on drop.
#[derive(Debug)]
pub struct CallbackClaim {
    guard: CallbackGuard,
    code: String,
}

impl CallbackGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `code`, or `None` if it is already claimed.
    #[must_use]
    pub fn claim(&self, code: &str) -> Option<CallbackClaim> {
        let inserted = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(code.to_string());

        inserted.then(|| CallbackClaim {
            guard: self.clone(),
            code: code.to_string(),
        })
    }
}

impl Drop for CallbackClaim {
    fn drop(&mut self) {
        self.guard
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.code);
    }
}

// =============================================================================
// Operations
// =============================================================================

/// Read the session without contacting the backend.
///
/// Authenticated only when both the subject id and a valid role are stored.
///
/// # Errors
///
/// Returns `StoreError` if the store cannot be read.
pub async fn restore_session<S: KeyValueStore>(store: &S) -> Result<SessionState, StoreError> {
    let subject = store
        .get(keys::SUBJECT_ID)
        .await?
        .filter(|s| !s.is_empty());
    let role = store
        .get(keys::ROLE)
        .await?
        .and_then(|r| r.parse::<Role>().ok());

    Ok(match (subject, role) {
        (Some(subject), Some(role)) => SessionState::Authenticated(CurrentSession {
            subject_id: SubjectId::new(subject),
            role,
        }),
        _ => SessionState::Unauthenticated,
    })
}

/// Remember `role` and fetch the provider URL to redirect the browser to.
///
/// # Errors
///
/// Returns `LoginError` if the store write or the backend call fails.
#[instrument(skip(store, backend))]
pub async fn begin_login<S: KeyValueStore>(
    store: &S,
    backend: &BackendClient,
    role: Role,
) -> Result<String, LoginError> {
    store.set(keys::PENDING_ROLE, role.as_str()).await?;
    Ok(backend.login_url().await?)
}

/// Exchange a provider code and persist the resulting session.
///
/// At most one exchange per code runs at a time; a concurrent duplicate
/// returns [`CallbackOutcome::AlreadyInFlight`] without calling the backend.
///
/// # Errors
///
/// Returns `StoreError` if the store cannot be read or written. Backend
/// failures are reported as [`CallbackOutcome::Failed`].
#[instrument(skip_all)]
pub async fn complete_callback<S: KeyValueStore>(
    store: &S,
    backend: &BackendClient,
    guard: &CallbackGuard,
    code: &str,
) -> Result<CallbackOutcome, StoreError> {
    let Some(_claim) = guard.claim(code) else {
        tracing::debug!("Callback code already being exchanged");
        return Ok(CallbackOutcome::AlreadyInFlight);
    };

    let pending = store
        .get(keys::PENDING_ROLE)
        .await?
        .and_then(|r| r.parse::<Role>().ok())
        .unwrap_or_default();

    let response = match backend.exchange_code(code, pending).await {
        Ok(response) => response,
        Err(err) => {
            tracing::warn!(error = %err, "Code exchange failed");
            clear(store).await?;
            return Ok(CallbackOutcome::Failed(err.user_message().to_string()));
        }
    };

    match response {
        CallbackResponse {
            access_token: Some(token),
            user: Some(user),
            ..
        } => {
            store.set(keys::ACCESS_TOKEN, &token).await?;
            store.set(keys::SUBJECT_ID, user.facebook_id.as_str()).await?;
            store.set(keys::ROLE, user.user_role.as_str()).await?;
            store.remove(keys::PENDING_ROLE).await?;

            tracing::info!(subject = %user.facebook_id, role = %user.user_role, "Signed in");
            Ok(CallbackOutcome::Authenticated(CurrentSession {
                subject_id: user.facebook_id,
                role: user.user_role,
            }))
        }
        other => {
            let message = other.error_message().unwrap_or_else(|| LOGIN_FAILED.to_string());
            tracing::warn!(error = %message, "Callback rejected");
            clear(store).await?;
            Ok(CallbackOutcome::Failed(message))
        }
    }
}

/// Sign out locally. The backend is not told.
///
/// # Errors
///
/// Returns `StoreError` if the store cannot be written.
pub async fn end_login<S: KeyValueStore>(store: &S) -> Result<(), StoreError> {
    clear(store).await
}

async fn clear<S: KeyValueStore>(store: &S) -> Result<(), StoreError> {
    for key in keys::ALL {
        store.remove(key).await?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::session::MemoryKeyStore;

    #[tokio::test]
    async fn test_restore_with_identity_and_role() {
        let store = MemoryKeyStore::with_entries([
            (keys::SUBJECT_ID, "1001"),
            (keys::ROLE, "owner"),
        ]);

        let state = restore_session(&store).await.unwrap();
        assert_eq!(
            state,
            SessionState::Authenticated(CurrentSession {
                subject_id: SubjectId::new("1001"),
                role: Role::Owner,
            })
        );
    }

    #[tokio::test]
    async fn test_restore_missing_either_key_is_unauthenticated() {
        let only_subject = MemoryKeyStore::with_entries([(keys::SUBJECT_ID, "1001")]);
        let only_role = MemoryKeyStore::with_entries([(keys::ROLE, "staff")]);
        let empty = MemoryKeyStore::new();

        for store in [&only_subject, &only_role, &empty] {
            assert_eq!(
                restore_session(store).await.unwrap(),
                SessionState::Unauthenticated
            );
        }
    }

    #[tokio::test]
    async fn test_restore_rejects_unknown_role() {
        let store = MemoryKeyStore::with_entries([
            (keys::SUBJECT_ID, "1001"),
            (keys::ROLE, "superuser"),
        ]);
        assert_eq!(
            restore_session(&store).await.unwrap(),
            SessionState::Unauthenticated
        );
    }

    #[tokio::test]
    async fn test_restore_ignores_pending_role() {
        let store = MemoryKeyStore::with_entries([
            (keys::SUBJECT_ID, "1001"),
            (keys::PENDING_ROLE, "owner"),
        ]);
        assert_eq!(
            restore_session(&store).await.unwrap(),
            SessionState::Unauthenticated
        );
    }

    #[tokio::test]
    async fn test_end_login_removes_every_key() {
        let store = MemoryKeyStore::with_entries([
            (keys::ACCESS_TOKEN, "token"),
            (keys::SUBJECT_ID, "1001"),
            (keys::ROLE, "owner"),
            (keys::PENDING_ROLE, "owner"),
            ("unrelated", "kept"),
        ]);

        end_login(&store).await.unwrap();

        for key in keys::ALL {
            assert!(!store.contains(key), "{key} survived end_login");
        }
        assert!(store.contains("unrelated"));
        assert_eq!(
            restore_session(&store).await.unwrap(),
            SessionState::Unauthenticated
        );
    }

    #[test]
    fn test_callback_guard_rejects_duplicate_until_released() {
        let guard = CallbackGuard::new();

        let first = guard.claim("code-1");
        assert!(first.is_some());
        assert!(guard.claim("code-1").is_none());
        assert!(guard.claim("code-2").is_some());

        drop(first);
        assert!(guard.claim("code-1").is_some());
    }

    #[tokio::test]
    async fn test_callback_in_flight_is_a_no_op() {
        let guard = CallbackGuard::new();
        let _claim = guard.claim("dup").unwrap();
        let store = MemoryKeyStore::with_entries([(keys::PENDING_ROLE, "owner")]);
        // Unroutable: the call must never be attempted.
        let backend = BackendClient::new("http://127.0.0.1:9").unwrap();

        let outcome = complete_callback(&store, &backend, &guard, "dup").await.unwrap();

        assert_eq!(outcome, CallbackOutcome::AlreadyInFlight);
        assert_eq!(store.value(keys::PENDING_ROLE).as_deref(), Some("owner"));
    }
}
