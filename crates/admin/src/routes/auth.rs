//! Login, provider callback and logout routes.
//!
//! `/` doubles as the provider redirect target: a request carrying `?code=`
//! (or a provider `?error=`) is handled as a callback, then redirected back
//! to `/` so the code never stays in the address bar.

use askama::Template;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use order_desk_core::{Role, Tab, tabs_for};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::components::flash;
use crate::error::AppError;
use crate::filters;
use crate::session::{
    CallbackOutcome, LoginError, SessionState, begin_login, complete_callback, end_login,
    restore_session,
};
use crate::state::AppState;

use super::render;
use super::views::APP_TITLE;

/// Login page template.
#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub title: &'static str,
    pub error: Option<String>,
}

/// Query parameters of the provider redirect.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// Login form input.
#[derive(Debug, Deserialize)]
pub struct LoginInput {
    /// `owner` when "Login as Owner" is ticked; absent otherwise.
    pub role: Option<String>,
}

/// Landing page: callback, redirect to the first tab, or the login page.
#[instrument(skip(state, session, query))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<CallbackQuery>,
) -> Result<Response, AppError> {
    if query.code.is_some() || query.error.is_some() {
        return handle_callback(&state, &session, query).await;
    }

    match restore_session(&session).await? {
        SessionState::Authenticated(current) => {
            let first = tabs_for(current.role)
                .first()
                .map_or(Tab::Summary.path(), Tab::path);
            Ok(Redirect::to(first).into_response())
        }
        SessionState::Unauthenticated => {
            let template = LoginTemplate {
                title: APP_TITLE,
                error: flash::take_error(&session).await,
            };
            Ok(render(&template).into_response())
        }
    }
}

/// Provider redirect target.
#[instrument(skip(state, session, query))]
pub async fn callback(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<CallbackQuery>,
) -> Result<Response, AppError> {
    handle_callback(&state, &session, query).await
}

async fn handle_callback(
    state: &AppState,
    session: &Session,
    query: CallbackQuery,
) -> Result<Response, AppError> {
    let Some(code) = query.code.filter(|c| !c.is_empty()) else {
        // The provider refused before issuing a code (e.g. the user cancelled).
        let message = query
            .error_description
            .or(query.error)
            .unwrap_or_else(|| "Login was cancelled".to_string());
        tracing::warn!(error = %message, "Provider returned an error");
        end_login(session).await?;
        flash::push_error(session, &message).await;
        return Ok(Redirect::to("/").into_response());
    };

    match complete_callback(session, state.backend(), state.callback_guard(), &code).await? {
        CallbackOutcome::Authenticated(current) => {
            // New identity, new session id.
            session.cycle_id().await.map_err(crate::session::StoreError::from)?;
            tracing::info!(subject = %current.subject_id, role = %current.role, "Login complete");
        }
        CallbackOutcome::Failed(message) => {
            flash::push_error(session, &message).await;
        }
        CallbackOutcome::AlreadyInFlight => {}
    }

    Ok(Redirect::to("/").into_response())
}

/// Start the provider login.
#[instrument(skip(state, session, input))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(input): Form<LoginInput>,
) -> Redirect {
    let role = input
        .role
        .as_deref()
        .and_then(|r| r.parse::<Role>().ok())
        .unwrap_or_default();

    match begin_login(&session, state.backend(), role).await {
        Ok(auth_url) => Redirect::to(&auth_url),
        Err(e) => {
            tracing::error!(error = %e, "Failed to start login");
            let message = match &e {
                LoginError::Backend(err) => err.user_message(),
                LoginError::Store(_) => "Failed to start login",
            };
            flash::push_error(&session, message).await;
            Redirect::to("/")
        }
    }
}

/// Sign out and return to the login page.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<Redirect, AppError> {
    end_login(&session).await?;
    Ok(Redirect::to("/"))
}
