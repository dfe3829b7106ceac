//! Authentication extractors for dashboard pages.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use order_desk_core::{Tab, can_access};
use tower_sessions::Session;

use crate::error::{AppError, set_sentry_user};
use crate::session::{CurrentSession, SessionState, restore_session};

/// Extractor that requires a signed-in user.
///
/// Browsers without a session are redirected to the login page at `/`.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireSession(current): RequireSession,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", current.subject_id)
/// }
/// ```
pub struct RequireSession(pub CurrentSession);

/// Error returned when a page needs a session and there is none.
pub enum SessionRejection {
    /// Redirect to the login page.
    RedirectToLogin,
    /// The session layer is missing or the store failed.
    Unavailable,
}

impl IntoResponse for SessionRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/").into_response(),
            Self::Unavailable => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}

impl<S> FromRequestParts<S> for RequireSession
where
    S: Send + Sync,
{
    type Rejection = SessionRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(SessionRejection::Unavailable)?;

        match restore_session(session).await {
            Ok(SessionState::Authenticated(current)) => {
                set_sentry_user(current.subject_id.as_str(), current.role.as_str());
                Ok(Self(current))
            }
            Ok(SessionState::Unauthenticated) => Err(SessionRejection::RedirectToLogin),
            Err(e) => {
                tracing::error!(error = %e, "Failed to restore session");
                Err(SessionRejection::Unavailable)
            }
        }
    }
}

/// Reject the request unless `current` may open `tab`.
///
/// # Errors
///
/// Returns `AppError::Forbidden` for tabs outside the role's strip.
pub fn ensure_tab(current: &CurrentSession, tab: Tab) -> Result<(), AppError> {
    if can_access(current.role, tab) {
        Ok(())
    } else {
        tracing::warn!(
            subject = %current.subject_id,
            role = %current.role,
            tab = tab.label(),
            "Tab access denied"
        );
        Err(AppError::Forbidden(format!(
            "{} is not available to {} accounts",
            tab.label(),
            current.role
        )))
    }
}

#[cfg(test)]
mod tests {
    use order_desk_core::{Role, SubjectId};

    use super::*;

    fn current(role: Role) -> CurrentSession {
        CurrentSession {
            subject_id: SubjectId::new("1001"),
            role,
        }
    }

    #[test]
    fn test_ensure_tab_follows_access_table() {
        assert!(ensure_tab(&current(Role::Staff), Tab::Summary).is_ok());
        assert!(ensure_tab(&current(Role::Staff), Tab::Preparing).is_ok());
        assert!(matches!(
            ensure_tab(&current(Role::Staff), Tab::Billing),
            Err(AppError::Forbidden(_))
        ));
        assert!(ensure_tab(&current(Role::Owner), Tab::Users).is_ok());
    }
}
