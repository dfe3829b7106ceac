//! HTTP middleware stack for the dashboard.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request span with status and latency)
//! 3. Session layer (tower-sessions, in-memory store)
//! 4. [`RequireSession`] extractor on every tab route

pub mod auth;
pub mod session;

pub use auth::{RequireSession, SessionRejection, ensure_tab};
pub use session::{SESSION_COOKIE_NAME, create_session_layer};
