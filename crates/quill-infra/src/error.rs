//! HTTP error body
//!
//! The `IntoResponse` implementation for `AppError` lives in the API crate; this is
//! only the wire shape.

use serde::Serialize;

/// Standard error response format for HTTP APIs
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Stable machine-readable code, e.g. `MEDIA_IN_USE`.
    pub code: String,
    /// Error category: `validation`, `authentication`, `authorization`, `conflict`,
    /// `not_found`, `dependency` or `internal`.
    pub kind: String,
    pub recoverable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
}
