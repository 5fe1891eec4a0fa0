//! Quill Core Library
//!
//! This crate provides the domain models, error types, configuration, and upload validation
//! shared by every Quill component.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod storage_types;
pub mod validation;

// Re-export commonly used types
pub use config::{AppConfig, AuthConfig, BaseConfig, Config, TranscoderConfig};
pub use error::{AppError, ErrorKind, ErrorMetadata, LogLevel};
pub use storage_types::StorageBackend;

pub type AppResult<T> = Result<T, AppError>;
