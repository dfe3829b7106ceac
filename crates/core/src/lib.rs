//! Order Desk Core - Shared types library.
//!
//! This crate provides common types used across all Order Desk components:
//! - `admin` - The staff/owner dashboard
//! - `integration-tests` - End-to-end tests against a fake backend
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no session handling. This keeps it lightweight and allows it to be
//! used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, prices, roles, statuses and the tab access table

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
