//! Application-wide constants.

/// Name of the cookie carrying the session id when none is configured.
pub const DEFAULT_SESSION_COOKIE_NAME: &str = "quill_session";

/// Session ids are 32 random bytes, hex-encoded.
pub const SESSION_ID_BYTES: usize = 32;
pub const SESSION_ID_HEX_LEN: usize = SESSION_ID_BYTES * 2;

/// PBKDF2 parameters. The iteration count is stored inline in every hash, so raising
/// `MIN_PASSWORD_HASH_ITERATIONS` never invalidates existing hashes.
pub const MIN_PASSWORD_HASH_ITERATIONS: u32 = 100_000;
pub const PASSWORD_SALT_BYTES: usize = 16;
pub const PASSWORD_KEY_BYTES: usize = 32;

/// Storage key namespaces.
pub const IMAGE_PATH_PREFIX: &str = "images";
pub const VIDEO_PATH_PREFIX: &str = "videos";

/// Reason stored on a video when the transcoding service reports an error without one.
pub const DEFAULT_PROCESSING_ERROR: &str = "Video processing failed";

/// Upper bound on page size for media listings.
pub const MAX_LIST_LIMIT: i64 = 100;
pub const DEFAULT_LIST_LIMIT: i64 = 50;
