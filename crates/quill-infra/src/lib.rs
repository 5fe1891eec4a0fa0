//! Quill Infrastructure Library
//!
//! Shared infrastructure used by the server and the CLI:
//! - Telemetry initialization
//! - Request ID middleware
//! - HTTP error body

pub mod error;
pub mod middleware;
pub mod telemetry;

pub use error::ErrorResponse;
pub use middleware::{get_request_id, request_id_middleware, RequestId, REQUEST_ID_HEADER};
pub use telemetry::{init_telemetry, LogFormat};
