//! Shared library for the seasonal AniList ETL.
//!
//! This crate provides the pieces the fetch/normalize side does not need to
//! know about:
//! - Configuration management
//! - Logging infrastructure
//! - Database handle, schema and the per-unit transaction scope
//! - Row models for the eight tables
//! - The row loader

pub mod config;
pub mod db;
pub mod loader;
pub mod logging;
pub mod models;

// Re-export commonly used types
pub use config::{AniListConfig, Config};
pub use db::{Database, UnitSession};
pub use loader::{insert_row, load_projection, InsertOutcome, LoadStats};
pub use logging::LogConfig;
pub use models::*;

/// Common result type using anyhow::Error
pub type Result<T> = anyhow::Result<T>;
