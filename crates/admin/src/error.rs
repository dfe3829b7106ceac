//! Unified error handling for the dashboard.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::session::StoreError;

/// Application-level error type for the dashboard.
///
/// Page handlers turn backend failures into a banner and never return them;
/// this type covers what cannot be rendered as a page.
#[derive(Debug, Error)]
pub enum AppError {
    /// Session store read or write failed.
    #[error("Session error: {0}")]
    Session(#[from] StoreError),

    /// The role may not open this tab.
    #[error("Forbidden: {0}")]
    Forbidden(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if matches!(self, Self::Session(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Dashboard request error"
            );
        }

        // Don't expose internal error details to clients
        match &self {
            Self::Session(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, self.to_string()).into_response(),
        }
    }
}

/// Set the Sentry user context for the signed-in subject.
pub fn set_sentry_user(subject_id: &str, role: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(subject_id.to_string()),
            ..Default::default()
        }));
        scope.set_tag("role", role);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::Forbidden("billing".to_string());
        assert_eq!(err.to_string(), "Forbidden: billing");
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            err.into_response().status()
        }

        assert_eq!(
            get_status(AppError::Forbidden("test".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::Session(StoreError::Backend("gone".to_string()))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
