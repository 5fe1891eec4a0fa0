//! The media foreign key on articles and pages.
//!
//! Content CRUD lives elsewhere; this only sets, clears and reads the reference.

use crate::auth::AuthContext;
use crate::services::ingestion::not_found;
use quill_core::models::{
    ContentKind, ContentRecord, ContentRef, MediaAsset, MediaKind, MediaSummary,
    ProcessingStatus, Role,
};
use quill_core::AppError;
use quill_db::{ContentStore, MediaStore};
use quill_services::TranscodingService;
use quill_storage::Storage;
use std::sync::Arc;

/// Denormalized read-side view of an asset, with its public URL.
pub fn summarize(
    asset: &MediaAsset,
    storage: &dyn Storage,
    transcoder: &dyn TranscodingService,
) -> MediaSummary {
    let (width, height) = asset.dimensions();
    let (url, thumbnail_url) = match &asset.kind {
        MediaKind::Image(_) => (storage.public_url(&asset.path), None),
        MediaKind::Video(video) => (
            transcoder.playback_url(&video.external_uid),
            video.thumbnail_url.clone(),
        ),
    };

    MediaSummary {
        id: asset.id,
        kind: asset.media_type(),
        path: asset.path.clone(),
        url,
        alt_text: asset.alt_text.clone(),
        width,
        height,
        thumbnail_url,
        processing_status: asset.processing_status(),
    }
}

#[derive(Clone)]
pub struct ContentLinks {
    content: Arc<dyn ContentStore>,
    media: Arc<dyn MediaStore>,
    storage: Arc<dyn Storage>,
    transcoder: Arc<dyn TranscodingService>,
}

impl ContentLinks {
    pub fn new(
        content: Arc<dyn ContentStore>,
        media: Arc<dyn MediaStore>,
        storage: Arc<dyn Storage>,
        transcoder: Arc<dyn TranscodingService>,
    ) -> Self {
        Self {
            content,
            media,
            storage,
            transcoder,
        }
    }

    /// Point `target` at `media_id`.
    #[tracing::instrument(skip(self), fields(user_id = ctx.user_id, target = %target))]
    pub async fn attach(
        &self,
        ctx: &AuthContext,
        target: &ContentRef,
        media_id: i64,
    ) -> Result<ContentRecord, AppError> {
        self.authorize(ctx, target).await?;

        let asset = self
            .media
            .get(media_id)
            .await?
            .ok_or_else(|| not_found(media_id))?;
        if asset.processing_status() == Some(ProcessingStatus::Error) {
            return Err(AppError::Validation(format!(
                "Video {} failed processing and cannot be attached",
                media_id
            )));
        }

        self.set(target, Some(media_id)).await
    }

    /// Clear the reference on `target`.
    #[tracing::instrument(skip(self), fields(user_id = ctx.user_id, target = %target))]
    pub async fn detach(
        &self,
        ctx: &AuthContext,
        target: &ContentRef,
    ) -> Result<ContentRecord, AppError> {
        self.authorize(ctx, target).await?;
        self.set(target, None).await
    }

    /// The asset `target` shows, if any.
    pub async fn media_for(&self, target: &ContentRef) -> Result<Option<MediaSummary>, AppError> {
        self.load(target).await?;
        let asset = self.content.media_for(target.kind, target.id).await?;
        Ok(asset.map(|asset| {
            summarize(&asset, self.storage.as_ref(), self.transcoder.as_ref())
        }))
    }

    async fn load(&self, target: &ContentRef) -> Result<ContentRecord, AppError> {
        self.content
            .get(target.kind, target.id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{} not found", target)))
    }

    /// Articles: their author or an editor. Pages: editors only.
    async fn authorize(&self, ctx: &AuthContext, target: &ContentRef) -> Result<(), AppError> {
        let record = self.load(target).await?;
        match (target.kind, record.author_id) {
            (ContentKind::Article, Some(author_id)) => ctx.require_owner_or_editor(author_id),
            (ContentKind::Article, None) | (ContentKind::Page, _) => {
                ctx.require_role(Role::Editor)
            }
        }
    }

    async fn set(
        &self,
        target: &ContentRef,
        media_id: Option<i64>,
    ) -> Result<ContentRecord, AppError> {
        let result = self.content.set_media(target.kind, target.id, media_id).await;
        let updated = match (result, media_id) {
            (Ok(updated), _) => updated,
            // The asset was deleted between the lookup and the update.
            (Err(AppError::Conflict(_)), Some(id)) => return Err(not_found(id)),
            (Err(e), _) => return Err(e),
        };
        if !updated {
            return Err(AppError::NotFound(format!("{} not found", target)));
        }

        tracing::info!(target = %target, media_id = ?media_id, "Content media updated");
        self.load(target).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ingestion::VideoUploadRequest;
    use crate::services::test_support::Harness;

    #[tokio::test]
    async fn test_article_links_follow_authorship() {
        let h = Harness::new().await;
        let image = h.upload_png().await;
        let own = ContentRef::article(h.article(h.author.user_id, "own").await);
        let foreign = ContentRef::article(h.article(h.other_author.user_id, "foreign").await);

        let record = h.links.attach(&h.author, &own, image.id).await.unwrap();
        assert_eq!(record.media_id, Some(image.id));

        let err = h.links.attach(&h.author, &foreign, image.id).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        h.links.attach(&h.editor, &foreign, image.id).await.unwrap();
        assert_eq!(h.usage.usage(image.id).await.unwrap().count(), 2);

        let record = h.links.detach(&h.author, &own).await.unwrap();
        assert_eq!(record.media_id, None);
    }

    #[tokio::test]
    async fn test_pages_need_editor() {
        let h = Harness::new().await;
        let image = h.upload_png().await;
        let page = ContentRef::page(h.page("about").await);

        let err = h.links.attach(&h.author, &page, image.id).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        h.links.attach(&h.editor, &page, image.id).await.unwrap();

        let summary = h.links.media_for(&page).await.unwrap().unwrap();
        assert_eq!(summary.id, image.id);
        assert_eq!(summary.url, h.storage.public_url(&image.path));
        assert_eq!((summary.width, summary.height), (Some(40), Some(30)));
        assert_eq!(summary.processing_status, None);
    }

    #[tokio::test]
    async fn test_missing_targets() {
        let h = Harness::new().await;
        let image = h.upload_png().await;
        let article = ContentRef::article(h.article(h.author.user_id, "a").await);

        assert!(matches!(
            h.links.attach(&h.author, &article, 404).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            h.links.attach(&h.editor, &ContentRef::page(404), image.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            h.links.media_for(&ContentRef::article(404)).await,
            Err(AppError::NotFound(_))
        ));
        assert_eq!(h.links.media_for(&article).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_failed_video_cannot_be_attached() {
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
        let article = ContentRef::article(h.article(h.author.user_id, "a").await);

        // Still processing: attaching is fine, the page shows a placeholder.
        h.links.attach(&h.author, &article, ticket.media_id).await.unwrap();
        let summary = h.links.media_for(&article).await.unwrap().unwrap();
        assert_eq!(
            summary.processing_status,
            Some(ProcessingStatus::Uploading)
        );
        assert_eq!(summary.url, h.transcoder.playback_url(&ticket.external_uid));
        h.links.detach(&h.author, &article).await.unwrap();

        h.transcoder.fail(&ticket.external_uid, Some("codec not supported"));
        h.reconciler.reconcile(&ticket.external_uid).await.unwrap();

        let err = h
            .links
            .attach(&h.author, &article, ticket.media_id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
