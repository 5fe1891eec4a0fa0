//! Usage tracking and safe deletion.
//!
//! An asset referenced by any article or page is never deleted. Removal order is blob
//! (or transcoding job) first, then the row: an orphaned blob is harmless, a row pointing
//! at nothing is not.

use crate::auth::AuthContext;
use crate::services::ingestion::not_found;
use quill_core::models::{MediaAsset, MediaKind, MediaUsage, Role};
use quill_core::AppError;
use quill_db::{ContentStore, MediaStore};
use quill_services::TranscodingService;
use quill_storage::Storage;
use std::sync::Arc;

#[derive(Clone)]
pub struct UsageGuard {
    media: Arc<dyn MediaStore>,
    content: Arc<dyn ContentStore>,
    storage: Arc<dyn Storage>,
    transcoder: Arc<dyn TranscodingService>,
}

impl UsageGuard {
    pub fn new(
        media: Arc<dyn MediaStore>,
        content: Arc<dyn ContentStore>,
        storage: Arc<dyn Storage>,
        transcoder: Arc<dyn TranscodingService>,
    ) -> Self {
        Self {
            media,
            content,
            storage,
            transcoder,
        }
    }

    /// Every article and page currently pointing at the asset.
    pub async fn usage(&self, media_id: i64) -> Result<MediaUsage, AppError> {
        self.load(media_id).await?;
        self.content.usage(media_id).await
    }

    /// Delete an unused asset. Editors and admins only.
    #[tracing::instrument(skip(self), fields(user_id = ctx.user_id))]
    pub async fn delete(&self, ctx: &AuthContext, media_id: i64) -> Result<(), AppError> {
        ctx.require_role(Role::Editor)?;
        let asset = self.load(media_id).await?;

        let usage = self.content.usage(media_id).await?;
        if !usage.is_unused() {
            return Err(AppError::InUse {
                references: usage.references(),
            });
        }

        self.remove_artifacts(&asset).await;

        match self.media.delete(media_id).await {
            Ok(true) => {
                tracing::info!(media_id, path = %asset.path, "Media deleted");
                Ok(())
            }
            Ok(false) => Err(not_found(media_id)),
            // Content was attached after the usage check.
            Err(AppError::Conflict(message)) => {
                let usage = self.content.usage(media_id).await?;
                if usage.is_unused() {
                    Err(AppError::Conflict(message))
                } else {
                    Err(AppError::InUse {
                        references: usage.references(),
                    })
                }
            }
            Err(e) => Err(e),
        }
    }

    async fn load(&self, media_id: i64) -> Result<MediaAsset, AppError> {
        self.media
            .get(media_id)
            .await?
            .ok_or_else(|| not_found(media_id))
    }

    /// Best-effort: failures are logged and never block row removal.
    async fn remove_artifacts(&self, asset: &MediaAsset) {
        match &asset.kind {
            MediaKind::Image(_) => {
                if let Err(e) = self.storage.delete(&asset.path).await {
                    tracing::error!(
                        error = %e,
                        media_id = asset.id,
                        path = %asset.path,
                        "Failed to delete blob; removing row anyway"
                    );
                }
            }
            MediaKind::Video(video) => {
                if let Err(e) = self.transcoder.delete_job(&video.external_uid).await {
                    tracing::error!(
                        error = %e,
                        media_id = asset.id,
                        external_uid = %video.external_uid,
                        "Failed to delete transcoding job; removing row anyway"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ingestion::VideoUploadRequest;
    use crate::services::test_support::Harness;
    use quill_core::models::ContentRef;

    #[tokio::test]
    async fn test_referenced_media_cannot_be_deleted() {
        let h = Harness::new().await;
        let image = h.upload_png().await;
        let article = h.article(h.author.user_id, "hello").await;
        h.links
            .attach(&h.author, &ContentRef::article(article), image.id)
            .await
            .unwrap();

        let usage = h.usage.usage(image.id).await.unwrap();
        assert_eq!(usage.count(), 1);

        let err = h.usage.delete(&h.editor, image.id).await.unwrap_err();
        match err {
            AppError::InUse { references } => {
                assert_eq!(references.len(), 1);
                assert_eq!(references[0].to_string(), format!("article {}", article));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(h.storage.contains(&image.path));
        assert_eq!(h.store.media_count(), 1);
    }

    #[tokio::test]
    async fn test_only_editors_delete() {
        let h = Harness::new().await;
        let image = h.upload_png().await;

        let err = h.usage.delete(&h.author, image.id).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        h.usage.delete(&h.admin, image.id).await.unwrap();
        assert!(!h.storage.contains(&image.path));
        assert!(matches!(
            h.usage.delete(&h.admin, image.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_blob_failure_still_removes_row() {
        let h = Harness::new().await;
        let image = h.upload_png().await;
        h.storage.fail_deletes(true);

        h.usage.delete(&h.editor, image.id).await.unwrap();
        assert_eq!(h.store.media_count(), 0);
    }

    #[tokio::test]
    async fn test_video_delete_removes_job() {
        let h = Harness::new().await;
        let ticket = h
            .ingestion
            .request_video_upload(
                &h.author,
                VideoUploadRequest {
                    filename: "clip.mp4".to_string(),
                    size_bytes: 4 * 1024 * 1024,
                    title: None,
                    max_duration_secs: None,
                },
            )
            .await
            .unwrap();

        h.transcoder.set_unavailable(true);
        h.usage.delete(&h.editor, ticket.media_id).await.unwrap();
        assert_eq!(h.store.media_count(), 0);

        h.transcoder.set_unavailable(false);
        let other = h
            .ingestion
            .request_video_upload(
                &h.author,
                VideoUploadRequest {
                    filename: "clip2.mp4".to_string(),
                    size_bytes: 4 * 1024 * 1024,
                    title: None,
                    max_duration_secs: None,
                },
            )
            .await
            .unwrap();
        h.usage.delete(&h.editor, other.media_id).await.unwrap();
        assert_eq!(h.transcoder.deleted_jobs(), vec![other.external_uid]);
    }

    #[tokio::test]
    async fn test_usage_of_missing_media() {
        let h = Harness::new().await;
        assert!(matches!(h.usage.usage(77).await, Err(AppError::NotFound(_))));
    }
}
