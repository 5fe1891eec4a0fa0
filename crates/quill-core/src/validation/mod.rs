//! Validation modules

pub mod upload;

pub use upload::{
    derive_title, generate_image_path, normalize_content_type, resolve_title,
    sanitize_extension, sanitize_stem, validate_external_uid, validate_image_upload, video_path,
    MAX_STEM_LENGTH,
};
