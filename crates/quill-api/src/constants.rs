//! API-level constants.

/// Every route lives under this prefix.
pub const API_PREFIX: &str = "/api/v1";

/// Multipart field carrying the image bytes.
pub const UPLOAD_FILE_FIELD: &str = "file";

/// Headroom on top of the image size ceiling for multipart framing and text fields.
pub const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Batch size of one pending-video sweep.
pub const RECONCILE_SWEEP_BATCH: i64 = 200;

/// Deadline for each health check.
pub const HEALTH_CHECK_TIMEOUT_SECS: u64 = 5;
