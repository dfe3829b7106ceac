//! HTTP route handlers for the dashboard.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                     - Liveness check
//! GET  /health/ready               - Readiness check (backend reachable)
//!
//! # Auth
//! GET  /                           - Login page, provider callback (?code=), or first tab
//! GET  /auth/callback              - Provider callback
//! POST /auth/login                 - Start provider login (form: role)
//! POST /auth/logout                - Sign out
//!
//! # Order summary (staff, owner)
//! GET  /summary                    - Product summaries
//! POST /summary/move               - Move a product's orders to preparing
//! POST /summary/price              - Set a product's price
//! POST /summary/image              - Upload a product image (multipart)
//!
//! # Preparing (staff, owner)
//! GET  /preparing                  - Orders being prepared
//! POST /preparing/{id}/complete    - Move an order to billing
//! POST /preparing/{id}/notes       - Save preparation notes
//!
//! # Billing (owner)
//! GET  /billing                    - Orders awaiting payment
//! POST /billing/paid               - Mark a customer's orders as paid
//! POST /billing/{id}/notes         - Save billing notes
//! POST /billing/{id}/price         - Edit an order's price
//!
//! # History (owner)
//! GET  /history                    - Completed orders
//! POST /history/{id}/notes         - Save billing notes
//!
//! # Users (owner)
//! GET  /users                      - Staff accounts, or search results with ?q=
//! POST /users/import               - Add a provider account as staff
//! POST /users/{id}/delete          - Remove a staff account
//! ```

pub mod auth;
pub mod billing;
pub mod history;
pub mod preparing;
pub mod summary;
pub mod users;
pub mod views;

use askama::Template;
use axum::{
    Router,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::Html,
    routing::{get, post},
};
use tower_http::services::ServeDir;

use crate::middleware::create_session_layer;
use crate::state::AppState;

/// Largest accepted product image upload.
const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Build the application router with all routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Auth
        .route("/", get(auth::index))
        .route("/auth/callback", get(auth::callback))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        // Order summary
        .route("/summary", get(summary::index))
        .route("/summary/move", post(summary::move_to_preparing))
        .route("/summary/price", post(summary::set_price))
        .route(
            "/summary/image",
            post(summary::upload_image).layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES)),
        )
        // Preparing
        .route("/preparing", get(preparing::index))
        .route("/preparing/{id}/complete", post(preparing::complete))
        .route("/preparing/{id}/notes", post(preparing::save_notes))
        // Billing
        .route("/billing", get(billing::index))
        .route("/billing/paid", post(billing::mark_paid))
        .route("/billing/{id}/notes", post(billing::save_notes))
        .route("/billing/{id}/price", post(billing::set_price))
        // History
        .route("/history", get(history::index))
        .route("/history/{id}/notes", post(history::save_notes))
        // Users
        .route("/users", get(users::index))
        .route("/users/import", post(users::import))
        .route("/users/{id}/delete", post(users::delete))
}

/// The complete dashboard: pages, health checks, static assets and sessions.
///
/// Tracing and Sentry layers are added by the binary.
pub fn app(state: AppState) -> Router {
    let session_layer = create_session_layer(state.config());

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes())
        .nest_service(
            "/static",
            ServeDir::new(concat!(env!("CARGO_MANIFEST_DIR"), "/static")),
        )
        .layer(session_layer)
        .with_state(state)
}

/// Render a template, logging failures.
pub(crate) fn render<T: Template>(template: &T) -> Html<String> {
    Html(template.render().unwrap_or_else(|e| {
        tracing::error!("Template render error: {}", e);
        "Internal Server Error".to_string()
    }))
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the orders backend does not answer.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.backend().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Backend not reachable");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
