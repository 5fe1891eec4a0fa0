//! Quill data access layer
//!
//! Store traits for media, users, sessions and content links, with PostgreSQL
//! repositories and (behind the `memory` feature) an in-process implementation.

pub mod db;

pub use db::*;

/// Embedded schema migrations from the workspace `migrations/` directory.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");
