//! Quill API Library
//!
//! Session authentication, the media lifecycle services, the HTTP handlers and the
//! application setup.

pub mod auth;
pub mod constants;
pub mod error;
mod handlers;
pub mod services;
pub mod setup;
pub mod state;
mod utils;

// Re-exports
pub use error::{HttpAppError, ValidatedJson};
pub use state::{AppState, Backends};
