//! Shared utilities and common types for the Sensor Dash backend.
//!
//! This crate provides common functionality used across all other crates:
//! - JWT bearer-token verification
//! - Pagination helpers
//! - Common validation logic

pub mod jwt;
pub mod pagination;
pub mod validation;
