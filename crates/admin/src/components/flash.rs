//! One-shot messages carried across a post/redirect/get.
//!
//! A failed mutation stores its message here and redirects; the next page
//! render takes it and shows it above freshly fetched data.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

mod keys {
    pub const ERROR: &str = "flash_error";
    pub const FIELD_ERROR: &str = "flash_field_error";
}

/// A rejected dialog input, re-shown with the draft kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Product name or order id the dialog was open for.
    pub target: String,
    /// What the user typed.
    pub draft: String,
    pub message: String,
}

/// Queue a banner message for the next render.
pub async fn push_error(session: &Session, message: &str) {
    if let Err(e) = session.insert(keys::ERROR, message).await {
        tracing::warn!(error = %e, "Failed to store flash message");
    }
}

/// Take the queued banner message, if any.
pub async fn take_error(session: &Session) -> Option<String> {
    session.remove::<String>(keys::ERROR).await.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to read flash message");
        None
    })
}

/// Queue a field error for the next render.
pub async fn push_field_error(session: &Session, error: &FieldError) {
    if let Err(e) = session.insert(keys::FIELD_ERROR, error).await {
        tracing::warn!(error = %e, "Failed to store field error");
    }
}

/// Take the queued field error, if any.
pub async fn take_field_error(session: &Session) -> Option<FieldError> {
    session
        .remove::<FieldError>(keys::FIELD_ERROR)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to read field error");
            None
        })
}
