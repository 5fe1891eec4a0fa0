//! Quill Storage Library
//!
//! Blob storage abstraction for media bytes, with S3 and local filesystem backends.
//!
//! # Storage key format
//!
//! Keys are opaque, `/`-separated strings chosen by the ingestion pipeline, for example
//! `images/2026/01/photo-1767225600000-a1b2c3.jpg` or `videos/2026/01/<external_uid>`.
//! Keys must not be empty, contain `..` or start with `/`. Validation is centralized in
//! the `keys` module so all backends agree.

pub mod factory;
pub(crate) mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "memory")]
pub mod memory;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "memory")]
pub use memory::MemoryStorage;
pub use quill_core::StorageBackend;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{ObjectInfo, Storage, StorageError, StorageResult};
