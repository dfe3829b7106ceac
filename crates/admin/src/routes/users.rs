//! User management tab: staff accounts and provider account search.

use askama::Template;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{Html, Redirect},
};
use order_desk_core::{StaffStatus, SubjectId, Tab};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::backend::{ExternalUser, StaffUser};
use crate::components::flash;
use crate::error::AppError;
use crate::filters;
use crate::middleware::{RequireSession, ensure_tab};
use crate::state::AppState;

use super::render;
use super::views::{ImagePreview, ShellView};

const PAGE: &str = "/users";

/// Staff table row.
#[derive(Debug, Clone)]
pub struct StaffRowView {
    pub facebook_id: String,
    pub path_id: String,
    pub name: String,
    pub email: String,
    pub status: String,
    pub is_active: bool,
}

impl From<&StaffUser> for StaffRowView {
    fn from(user: &StaffUser) -> Self {
        Self {
            facebook_id: user.facebook_id.to_string(),
            path_id: urlencoding::encode(user.facebook_id.as_str()).into_owned(),
            name: user.name.clone(),
            email: user.email.clone().unwrap_or_default(),
            status: user.status.to_string(),
            is_active: user.status.is_active(),
        }
    }
}

/// Search result row; its fields are posted back verbatim on import.
#[derive(Debug, Clone)]
pub struct SearchRowView {
    pub facebook_id: String,
    pub name: String,
    pub email: String,
    pub status: String,
}

impl From<&ExternalUser> for SearchRowView {
    fn from(user: &ExternalUser) -> Self {
        Self {
            facebook_id: user.facebook_id.to_string(),
            name: user.name.clone(),
            email: user.email.clone().unwrap_or_default(),
            status: user.status.map(|s| s.to_string()).unwrap_or_default(),
        }
    }
}

/// User management page template.
#[derive(Template)]
#[template(path = "users.html")]
pub struct UsersTemplate {
    pub shell: ShellView,
    pub error: Option<String>,
    pub search_query: String,
    /// `Some` while a search is active; replaces the staff table.
    pub results: Option<Vec<SearchRowView>>,
    pub staff: Vec<StaffRowView>,
    pub preview: Option<ImagePreview>,
}

/// Search query.
#[derive(Debug, Default, Deserialize)]
pub struct UsersQuery {
    pub q: Option<String>,
}

/// Import form input (one search result).
#[derive(Debug, Deserialize)]
pub struct ImportInput {
    pub facebook_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub status: String,
}

impl From<ImportInput> for ExternalUser {
    fn from(input: ImportInput) -> Self {
        Self {
            facebook_id: SubjectId::new(input.facebook_id),
            name: input.name,
            email: Some(input.email).filter(|e| !e.is_empty()),
            status: match input.status.as_str() {
                "active" => Some(StaffStatus::Active),
                "inactive" => Some(StaffStatus::Inactive),
                _ => None,
            },
        }
    }
}

/// User management page handler (owner only).
///
/// With `?q=` the page shows provider search results instead of the staff
/// table.
#[instrument(skip(current, state, session))]
pub async fn index(
    RequireSession(current): RequireSession,
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<UsersQuery>,
) -> Result<Html<String>, AppError> {
    ensure_tab(&current, Tab::Users)?;

    let flash_error = flash::take_error(&session).await;
    let client = state.backend().for_subject(&current.subject_id);
    let search_query = query.q.unwrap_or_default().trim().to_string();

    let (staff, results, error) = if search_query.is_empty() {
        match client.staff_users().await {
            Ok(users) => (
                users.iter().map(StaffRowView::from).collect(),
                None,
                flash_error,
            ),
            Err(e) => {
                tracing::error!(error = %e, "Failed to fetch users");
                (Vec::new(), None, Some(e.user_message().to_string()))
            }
        }
    } else {
        match client.search_external_users(&search_query).await {
            Ok(users) => (
                Vec::new(),
                Some(users.iter().map(SearchRowView::from).collect()),
                flash_error,
            ),
            Err(e) => {
                tracing::error!(error = %e, "Failed to search users");
                (Vec::new(), Some(Vec::new()), Some(e.user_message().to_string()))
            }
        }
    };

    let template = UsersTemplate {
        shell: ShellView::new(&current, Tab::Users),
        error,
        search_query,
        results,
        staff,
        preview: None,
    };

    Ok(render(&template))
}

/// Add a provider account as staff.
#[instrument(skip(current, state, session, input), fields(user_id = %input.facebook_id))]
pub async fn import(
    RequireSession(current): RequireSession,
    State(state): State<AppState>,
    session: Session,
    Form(input): Form<ImportInput>,
) -> Result<Redirect, AppError> {
    ensure_tab(&current, Tab::Users)?;

    let user = ExternalUser::from(input);
    if let Err(e) = state
        .backend()
        .for_subject(&current.subject_id)
        .import_external_user(&user)
        .await
    {
        tracing::error!(error = %e, "Failed to add staff");
        flash::push_error(&session, e.user_message()).await;
    }

    Ok(Redirect::to(PAGE))
}

/// Remove a staff account. The browser asks for confirmation first.
#[instrument(skip(current, state, session), fields(user_id = %id))]
pub async fn delete(
    RequireSession(current): RequireSession,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<SubjectId>,
) -> Result<Redirect, AppError> {
    ensure_tab(&current, Tab::Users)?;

    if let Err(e) = state
        .backend()
        .for_subject(&current.subject_id)
        .delete_staff_user(&id)
        .await
    {
        tracing::error!(error = %e, "Failed to delete user");
        flash::push_error(&session, e.user_message()).await;
    }

    Ok(Redirect::to(PAGE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_input_becomes_external_user() {
        let input = ImportInput {
            facebook_id: "77".to_string(),
            name: "Dana".to_string(),
            email: String::new(),
            status: "active".to_string(),
        };
        assert_eq!(
            ExternalUser::from(input),
            ExternalUser {
                facebook_id: SubjectId::new("77"),
                name: "Dana".to_string(),
                email: None,
                status: Some(StaffStatus::Active),
            }
        );
    }
}
