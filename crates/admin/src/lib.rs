//! Order Desk dashboard library.
//!
//! Staff and owners of a social-storefront shop use this dashboard to move
//! customer orders through pickup, preparation, billing and history. Every
//! record lives in the orders backend; this crate renders pages and forwards
//! actions to the backend REST API.
//!
//! The crate is a library so the integration tests can serve [`routes::app`]
//! against a fake backend.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod components;
pub mod config;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod routes;
pub mod session;
pub mod state;

pub use config::DeskConfig;
pub use routes::app;
pub use state::AppState;
