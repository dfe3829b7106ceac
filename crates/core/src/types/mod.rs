//! Core types for Order Desk.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod price;
pub mod status;
pub mod tab;

pub use id::*;
pub use price::{Price, PriceError, format_money};
pub use status::*;
pub use tab::{Tab, can_access, tabs_for};
