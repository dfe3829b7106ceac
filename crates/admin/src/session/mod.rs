//! Per-browser session state and the login gate.
//!
//! The session is four string keys in a [`KeyValueStore`]: the access token,
//! the signed-in subject id, the resolved role, and the role picked on the
//! login page before the provider redirect. In production the store is the
//! browser's `tower_sessions::Session`; tests use [`MemoryKeyStore`].
//!
//! [`gate`] holds the operations that move a browser between
//! unauthenticated and authenticated.

pub mod gate;
pub mod store;

pub use gate::{
    CallbackGuard, CallbackOutcome, LoginError, SessionState, begin_login, complete_callback,
    end_login, restore_session,
};
pub use store::{KeyValueStore, MemoryKeyStore, StoreError};

use order_desk_core::{Role, SubjectId};
use serde::{Deserialize, Serialize};

/// Session key names.
pub mod keys {
    /// Provider access token returned by the code exchange.
    pub const ACCESS_TOKEN: &str = "access_token";
    /// Signed-in subject id, sent to the backend as `User-Id`.
    pub const SUBJECT_ID: &str = "subject_id";
    /// Role resolved by the backend.
    pub const ROLE: &str = "role";
    /// Role chosen on the login page, read back by the callback.
    pub const PENDING_ROLE: &str = "pending_role";

    /// Every key the gate owns.
    pub const ALL: [&str; 4] = [ACCESS_TOKEN, SUBJECT_ID, ROLE, PENDING_ROLE];
}

/// The signed-in user, as restored from the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentSession {
    pub subject_id: SubjectId,
    pub role: Role,
}
