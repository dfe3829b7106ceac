//! Orders backend REST API client.
//!
//! The backend owns every order, product and staff record. This module only
//! mirrors its REST surface: one method per endpoint, no caching, no retries.
//!
//! # Architecture
//!
//! - [`BackendClient`] covers the unauthenticated login/callback exchange
//! - [`SubjectClient`] (from [`BackendClient::for_subject`]) adds the
//!   `User-Id` header every other endpoint expects
//! - Every request carries the tunnel interstitial bypass header
//! - Failures collapse to a single user-facing message per operation

pub mod client;
pub mod types;

pub use client::{BackendClient, ImageUpload, SubjectClient};
pub use types::*;

use thiserror::Error;

/// Errors that can occur when talking to the orders backend.
///
/// Each variant carries the user-facing description of the operation that
/// failed. [`BackendError::user_message`] returns only that description, so
/// network failures, error statuses and malformed bodies all read the same in
/// the dashboard banner.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The HTTP client could not be constructed.
    #[error("Failed to build backend client: {0}")]
    Client(String),

    /// The request never produced a response.
    #[error("{context}: {message}")]
    Transport {
        /// User-facing description of the operation.
        context: &'static str,
        /// Underlying transport error.
        message: String,
    },

    /// The backend answered with a non-2xx status.
    #[error("{context}: backend returned {status} {detail}")]
    Status {
        /// User-facing description of the operation.
        context: &'static str,
        /// HTTP status code.
        status: u16,
        /// `error` field from the response body, if any.
        detail: String,
    },

    /// The response body did not have the expected shape.
    #[error("{context}: unexpected response body: {message}")]
    Decode {
        /// User-facing description of the operation.
        context: &'static str,
        /// Parser error.
        message: String,
    },
}

impl BackendError {
    /// The single string shown to the user for this failure.
    #[must_use]
    pub const fn user_message(&self) -> &str {
        match self {
            Self::Client(_) => "Backend client unavailable",
            Self::Transport { context, .. }
            | Self::Status { context, .. }
            | Self::Decode { context, .. } => context,
        }
    }

    /// Short technical reason, for messages that name the cause.
    #[must_use]
    pub fn detail(&self) -> String {
        match self {
            Self::Client(message)
            | Self::Transport { message, .. }
            | Self::Decode { message, .. } => message.clone(),
            Self::Status { status, detail, .. } if detail.is_empty() => {
                format!("backend returned {status}")
            }
            Self::Status { detail, .. } => detail.clone(),
        }
    }

    pub(crate) fn transport(context: &'static str, err: &reqwest::Error) -> Self {
        Self::Transport {
            context,
            message: err.to_string(),
        }
    }

    pub(crate) fn decode(context: &'static str, err: &reqwest::Error) -> Self {
        Self::Decode {
            context,
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_hides_error_kind() {
        let transport = BackendError::Transport {
            context: "Failed to fetch billing orders",
            message: "connection refused".to_string(),
        };
        let status = BackendError::Status {
            context: "Failed to fetch billing orders",
            status: 403,
            detail: "Owner access required".to_string(),
        };
        let decode = BackendError::Decode {
            context: "Failed to fetch billing orders",
            message: "expected a sequence".to_string(),
        };

        for err in [&transport, &status, &decode] {
            assert_eq!(err.user_message(), "Failed to fetch billing orders");
        }
    }

    #[test]
    fn test_display_keeps_details_for_logs() {
        let err = BackendError::Status {
            context: "Failed to delete user",
            status: 404,
            detail: "User not found".to_string(),
        };
        assert_eq!(err.to_string(), "Failed to delete user: backend returned 404 User not found");
        assert_eq!(err.detail(), "User not found");
    }

    #[test]
    fn test_detail_falls_back_to_status_code() {
        let err = BackendError::Status {
            context: "Failed to upload image",
            status: 413,
            detail: String::new(),
        };
        assert_eq!(err.detail(), "backend returned 413");
    }
}
