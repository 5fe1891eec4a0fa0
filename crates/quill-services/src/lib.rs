//! Quill Services Layer
//!
//! Adapters for the external services the media pipeline depends on. Today that is
//! the asynchronous video transcoding service.

pub mod transcoder;

#[cfg(feature = "memory")]
pub use transcoder::MemoryTranscoder;
pub use transcoder::{
    DirectUpload, DirectUploadRequest, JobDetails, JobState, StreamApiClient,
    TranscoderError, TranscoderResult, TranscodingService,
};
