//! Upload validation and storage key generation
//!
//! - Content type normalization and allow-list checks
//! - Size ceiling and empty payload checks
//! - Filename sanitization into dated, collision-resistant storage keys
//! - Title derivation from filenames

use chrono::{DateTime, Datelike, Utc};
use rand::distr::Alphanumeric;
use rand::Rng;

use crate::constants::{IMAGE_PATH_PREFIX, VIDEO_PATH_PREFIX};
use crate::error::AppError;

/// Maximum length of the slugified filename stem inside a storage key.
pub const MAX_STEM_LENGTH: usize = 64;

/// Longest extension worth comparing against the accepted list.
const MAX_EXTENSION_LENGTH: usize = 8;

/// Length of the random suffix appended after the timestamp.
const RANDOM_SUFFIX_LENGTH: usize = 6;

const MAX_EXTERNAL_UID_LENGTH: usize = 64;

/// Strip parameters (`; charset=...`) and lowercase a content type.
pub fn normalize_content_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_lowercase()
}

/// Validate an image upload against the allow-list and size ceiling.
///
/// Returns the normalized content type.
pub fn validate_image_upload(
    content_type: &str,
    size: usize,
    allowed_content_types: &[String],
    max_size: usize,
) -> Result<String, AppError> {
    if size == 0 {
        return Err(AppError::Validation("Empty file".to_string()));
    }

    if size > max_size {
        return Err(AppError::Validation(format!(
            "File too large: {} bytes (max: {} bytes)",
            size, max_size
        )));
    }

    let normalized = normalize_content_type(content_type);
    if !allowed_content_types
        .iter()
        .any(|allowed| normalize_content_type(allowed) == normalized)
    {
        return Err(AppError::Validation(format!(
            "Invalid content type: {} (allowed: {})",
            content_type,
            allowed_content_types.join(", ")
        )));
    }

    Ok(normalized)
}

fn split_filename(filename: &str) -> (&str, Option<&str>) {
    // Only the final path component counts; browsers sometimes send full paths.
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename);
    match base.rfind('.') {
        Some(idx) if idx > 0 => (&base[..idx], Some(&base[idx + 1..])),
        _ => (base, None),
    }
}

/// Slugify a filename stem to `[a-z0-9-]`, collapsing runs of separators.
pub fn sanitize_stem(filename: &str) -> String {
    let (stem, _) = split_filename(filename);
    let mut slug = String::with_capacity(stem.len());
    let mut last_dash = true;

    for c in stem.chars() {
        let c = c.to_ascii_lowercase();
        if c.is_ascii_alphanumeric() {
            slug.push(c);
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }

    let mut slug: String = slug.trim_matches('-').chars().take(MAX_STEM_LENGTH).collect();
    while slug.ends_with('-') {
        slug.pop();
    }

    if slug.is_empty() {
        "file".to_string()
    } else {
        slug
    }
}

/// Extensions accepted for a content type, canonical first.
fn extensions_for_content_type(content_type: &str) -> &'static [&'static str] {
    match normalize_content_type(content_type).as_str() {
        "image/jpeg" | "image/jpg" => &["jpg", "jpeg", "jpe"],
        "image/png" => &["png"],
        "image/gif" => &["gif"],
        "image/webp" => &["webp"],
        "video/mp4" => &["mp4", "m4v"],
        "video/webm" => &["webm"],
        "video/quicktime" => &["mov", "qt"],
        _ => &["bin"],
    }
}

/// Keep the filename's extension when it matches the content type, otherwise use the
/// content type's canonical one.
pub fn sanitize_extension(filename: &str, content_type: &str) -> String {
    let accepted = extensions_for_content_type(content_type);
    let (_, ext) = split_filename(filename);
    let cleaned: String = ext
        .unwrap_or("")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(MAX_EXTENSION_LENGTH + 1)
        .map(|c| c.to_ascii_lowercase())
        .collect();

    if accepted.contains(&cleaned.as_str()) {
        cleaned
    } else {
        accepted[0].to_string()
    }
}

/// Build `images/YYYY/MM/<stem>-<millis>-<random>.<ext>`.
pub fn generate_image_path(filename: &str, content_type: &str, now: DateTime<Utc>) -> String {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(RANDOM_SUFFIX_LENGTH)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();

    format!(
        "{}/{:04}/{:02}/{}-{}-{}.{}",
        IMAGE_PATH_PREFIX,
        now.year(),
        now.month(),
        sanitize_stem(filename),
        now.timestamp_millis(),
        suffix,
        sanitize_extension(filename, content_type)
    )
}

/// Build `videos/YYYY/MM/<external_uid>`.
pub fn video_path(external_uid: &str, now: DateTime<Utc>) -> String {
    format!(
        "{}/{:04}/{:02}/{}",
        VIDEO_PATH_PREFIX,
        now.year(),
        now.month(),
        external_uid
    )
}

/// Transcoding job ids are opaque but must be safe to embed in paths and URLs.
pub fn validate_external_uid(external_uid: &str) -> Result<(), AppError> {
    if external_uid.is_empty() || external_uid.len() > MAX_EXTERNAL_UID_LENGTH {
        return Err(AppError::Validation(format!(
            "external_uid must be between 1 and {} characters",
            MAX_EXTERNAL_UID_LENGTH
        )));
    }
    if !external_uid
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(AppError::Validation(
            "external_uid may only contain letters, digits, '-' and '_'".to_string(),
        ));
    }
    Ok(())
}

/// Human title from a filename: extension stripped, `-` `_` `.` turned into spaces,
/// whitespace collapsed.
pub fn derive_title(filename: &str) -> String {
    let (stem, _) = split_filename(filename);
    let replaced: String = stem
        .chars()
        .map(|c| if matches!(c, '-' | '_' | '.') { ' ' } else { c })
        .collect();
    let title = replaced.split_whitespace().collect::<Vec<_>>().join(" ");

    if title.is_empty() {
        "Untitled".to_string()
    } else {
        title
    }
}

/// An explicit, non-blank caller title wins over the derived one.
pub fn resolve_title(explicit: Option<&str>, filename: &str) -> String {
    match explicit.map(str::trim) {
        Some(title) if !title.is_empty() => title.to_string(),
        _ => derive_title(filename),
    }
}
