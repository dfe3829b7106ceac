//! Reusable page components.

pub mod flash;
