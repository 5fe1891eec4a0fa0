//! Media lifecycle services.
//!
//! Each service holds only the stores and adapters it drives, and takes the caller's
//! [`AuthContext`](crate::auth::AuthContext) explicitly. Handlers stay thin and every
//! operation can be exercised without HTTP.

pub mod content_links;
pub mod ingestion;
pub mod reconciler;
pub mod usage_guard;

#[cfg(test)]
mod test_support;

pub use content_links::{summarize, ContentLinks};
pub use ingestion::{
    ImageUpload, IngestionLimits, IngestionService, LinkVideoRequest, MediaStatus,
    VideoUploadRequest,
};
pub use reconciler::{ReconcileReport, ReconcilerService};
pub use usage_guard::UsageGuard;

use quill_db::{ContentStore, MediaStore};
use quill_services::TranscodingService;
use quill_storage::Storage;
use std::sync::Arc;

/// The four media services wired to one set of backends.
#[derive(Clone)]
pub struct MediaServices {
    pub ingestion: IngestionService,
    pub reconciler: ReconcilerService,
    pub usage: UsageGuard,
    pub links: ContentLinks,
}

impl MediaServices {
    pub fn new(
        media: Arc<dyn MediaStore>,
        content: Arc<dyn ContentStore>,
        storage: Arc<dyn Storage>,
        transcoder: Arc<dyn TranscodingService>,
        limits: IngestionLimits,
    ) -> Self {
        Self {
            ingestion: IngestionService::new(
                media.clone(),
                storage.clone(),
                transcoder.clone(),
                limits,
            ),
            reconciler: ReconcilerService::new(media.clone(), transcoder.clone()),
            usage: UsageGuard::new(
                media.clone(),
                content.clone(),
                storage.clone(),
                transcoder.clone(),
            ),
            links: ContentLinks::new(content, media, storage, transcoder),
        }
    }
}
