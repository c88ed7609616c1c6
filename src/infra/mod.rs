//! Infrastructure layer for cross-cutting concerns.
//!
//! Provides:
//! - Verification policy configuration and its TOML/JSON persistence
//! - Error and result types

pub mod config;
pub mod error;
