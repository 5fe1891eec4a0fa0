//! Quill media processing
//!
//! Metadata extraction from uploaded image bytes. Extraction never fails: anything that
//! cannot be read is reported as unknown.

#[cfg(any(test, feature = "test-support"))]
pub mod fixtures;
pub mod metadata;

pub use metadata::{extract_image_metadata, ImageMetadata};
