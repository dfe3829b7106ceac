//! Session middleware configuration.
//!
//! Sessions live in process memory: they only hold the login keys and flash
//! messages, and a restart simply signs everyone out. The moka store evicts
//! each record once its expiry passes, so abandoned logins do not pile up.

use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_moka_store::MokaStore;

use crate::config::DeskConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "order_desk_session";

/// Session expiry time in seconds (7 days of inactivity).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Upper bound on live sessions; least recently used ones go first.
const MAX_SESSIONS: u64 = 100_000;

/// In-memory session store with per-record expiry.
#[must_use]
pub fn create_session_store() -> MokaStore {
    MokaStore::new(Some(MAX_SESSIONS))
}

/// Create the session layer with an in-memory store.
///
/// The cookie is `SameSite=Lax` so it survives the top-level redirect back
/// from the login provider.
#[must_use]
pub fn create_session_layer(config: &DeskConfig) -> SessionManagerLayer<MokaStore> {
    SessionManagerLayer::new(create_session_store())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tower_sessions::SessionStore;
    use tower_sessions::cookie::time::{Duration, OffsetDateTime};
    use tower_sessions::session::{Id, Record};

    use super::*;

    fn record(expires_in: Duration) -> Record {
        Record {
            id: Id::default(),
            data: std::collections::HashMap::default(),
            expiry_date: OffsetDateTime::now_utc() + expires_in,
        }
    }

    #[tokio::test]
    async fn test_store_keeps_live_sessions() {
        let store = create_session_store();
        let mut live = record(Duration::hours(1));
        store.create(&mut live).await.unwrap();

        assert!(store.load(&live.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_store_drops_expired_sessions() {
        let store = create_session_store();
        let mut stale = record(Duration::seconds(-1));
        store.create(&mut stale).await.unwrap();

        assert!(store.load(&stale.id).await.unwrap().is_none());
    }
}
