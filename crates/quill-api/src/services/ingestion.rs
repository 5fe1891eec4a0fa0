//! Media ingestion.
//!
//! Images are validated, inspected and written to blob storage synchronously; the row is
//! inserted only after the write succeeded. Videos are two-phase: a direct-upload ticket
//! is issued by the transcoding service and an `uploading` placeholder row is inserted;
//! the bytes never pass through this process.

use crate::auth::AuthContext;
use bytes::Bytes;
use chrono::Utc;
use quill_core::constants::{DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT};
use quill_core::models::{
    ImageFields, MediaAsset, MediaDetailsUpdate, MediaKind, MediaType, NewMediaAsset,
    ProcessingStatus, Role, UploadTicket, VideoFields,
};
use quill_core::validation::{
    generate_image_path, resolve_title, validate_external_uid, validate_image_upload, video_path,
};
use quill_core::{AppError, Config};
use quill_db::MediaStore;
use quill_processing::extract_image_metadata;
use quill_services::{DirectUploadRequest, JobState, TranscodingService};
use quill_storage::Storage;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

const MAX_FILENAME_LENGTH: usize = 255;
const FALLBACK_VIDEO_MIME: &str = "application/octet-stream";

/// Limits applied at ingestion.
#[derive(Debug, Clone)]
pub struct IngestionLimits {
    pub max_image_size_bytes: usize,
    pub allowed_image_content_types: Vec<String>,
    pub upload_ttl: Duration,
    pub max_video_duration_secs: u64,
    pub max_video_upload_bytes: u64,
}

impl IngestionLimits {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_image_size_bytes: config.max_image_size_bytes(),
            allowed_image_content_types: config.allowed_image_content_types().to_vec(),
            upload_ttl: Duration::from_secs(config.transcoder().upload_ttl_secs),
            max_video_duration_secs: config.transcoder().max_duration_secs,
            max_video_upload_bytes: config.transcoder().max_upload_bytes,
        }
    }
}

/// One image as received from the client.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: String,
    pub content_type: String,
    pub data: Bytes,
    pub title: Option<String>,
    pub alt_text: Option<String>,
}

#[derive(Debug, Clone)]
pub struct VideoUploadRequest {
    pub filename: String,
    /// Size of the file the client is about to upload.
    pub size_bytes: u64,
    pub title: Option<String>,
    /// Capped at the configured maximum.
    pub max_duration_secs: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct LinkVideoRequest {
    pub external_uid: String,
    pub title: Option<String>,
}

/// What the polling UI needs to know about an asset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaStatus {
    pub media_id: i64,
    pub kind: MediaType,
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_status: Option<ProcessingStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_error: Option<String>,
}

impl From<&MediaAsset> for MediaStatus {
    fn from(asset: &MediaAsset) -> Self {
        MediaStatus {
            media_id: asset.id,
            kind: asset.media_type(),
            ready: asset.is_ready(),
            processing_status: asset.processing_status(),
            processing_error: asset
                .as_video()
                .and_then(|video| video.processing_error.clone()),
        }
    }
}

fn validate_filename(filename: &str) -> Result<(), AppError> {
    if filename.trim().is_empty() {
        return Err(AppError::Validation("A filename is required".to_string()));
    }
    if filename.len() > MAX_FILENAME_LENGTH {
        return Err(AppError::Validation(format!(
            "Filename must be at most {} bytes",
            MAX_FILENAME_LENGTH
        )));
    }
    Ok(())
}

fn video_mime_type(filename: &str) -> String {
    mime_guess::from_path(filename)
        .first()
        .filter(|mime| mime.type_() == mime_guess::mime::VIDEO)
        .map(|mime| mime.essence_str().to_string())
        .unwrap_or_else(|| FALLBACK_VIDEO_MIME.to_string())
}

fn clean_alt_text(alt_text: Option<String>) -> Option<String> {
    alt_text
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

#[derive(Clone)]
pub struct IngestionService {
    media: Arc<dyn MediaStore>,
    storage: Arc<dyn Storage>,
    transcoder: Arc<dyn TranscodingService>,
    limits: IngestionLimits,
}

impl IngestionService {
    pub fn new(
        media: Arc<dyn MediaStore>,
        storage: Arc<dyn Storage>,
        transcoder: Arc<dyn TranscodingService>,
        limits: IngestionLimits,
    ) -> Self {
        Self {
            media,
            storage,
            transcoder,
            limits,
        }
    }

    /// Validate, inspect and store an image, then record it.
    #[tracing::instrument(
        skip(self, upload),
        fields(user_id = ctx.user_id, filename = %upload.filename, size = upload.data.len())
    )]
    pub async fn upload_image(
        &self,
        ctx: &AuthContext,
        upload: ImageUpload,
    ) -> Result<MediaAsset, AppError> {
        ctx.require_role(Role::Author)?;
        validate_filename(&upload.filename)?;

        let content_type = validate_image_upload(
            &upload.content_type,
            upload.data.len(),
            &self.limits.allowed_image_content_types,
            self.limits.max_image_size_bytes,
        )?;

        let metadata = extract_image_metadata(&upload.data, &content_type);
        let path = generate_image_path(&upload.filename, &content_type, Utc::now());
        let size_bytes = upload.data.len() as i64;

        self.storage
            .put(&path, upload.data, &content_type)
            .await?;

        let new = NewMediaAsset {
            path: path.clone(),
            title: resolve_title(upload.title.as_deref(), &upload.filename),
            filename: upload.filename,
            mime_type: content_type,
            size_bytes,
            alt_text: clean_alt_text(upload.alt_text),
            owner_id: ctx.user_id,
            kind: MediaKind::Image(ImageFields::from(metadata)),
        };

        match self.media.insert(new).await {
            Ok(asset) => {
                tracing::info!(media_id = asset.id, path = %asset.path, "Image stored");
                Ok(asset)
            }
            Err(err) => {
                if let Err(cleanup_err) = self.storage.delete(&path).await {
                    tracing::warn!(
                        error = %cleanup_err,
                        path = %path,
                        "Failed to remove blob after insert failure"
                    );
                }
                Err(err)
            }
        }
    }

    /// Issue a direct-upload ticket and record an `uploading` placeholder for it.
    #[tracing::instrument(skip(self, request), fields(user_id = ctx.user_id, filename = %request.filename))]
    pub async fn request_video_upload(
        &self,
        ctx: &AuthContext,
        request: VideoUploadRequest,
    ) -> Result<UploadTicket, AppError> {
        ctx.require_role(Role::Author)?;
        validate_filename(&request.filename)?;
        if request.size_bytes == 0 {
            return Err(AppError::Validation("Empty file".to_string()));
        }
        if request.size_bytes > self.limits.max_video_upload_bytes {
            return Err(AppError::Validation(format!(
                "File too large: {} bytes (max: {} bytes)",
                request.size_bytes, self.limits.max_video_upload_bytes
            )));
        }

        let max_duration_secs = request
            .max_duration_secs
            .filter(|secs| *secs > 0)
            .map_or(self.limits.max_video_duration_secs, |secs| {
                secs.min(self.limits.max_video_duration_secs)
            });

        let mut meta = BTreeMap::new();
        meta.insert("name".to_string(), request.filename.clone());

        let upload = self
            .transcoder
            .create_direct_upload(DirectUploadRequest {
                ttl: self.limits.upload_ttl,
                max_duration_secs,
                upload_length: request.size_bytes,
                creator: Some(ctx.user_id.to_string()),
                meta,
            })
            .await?;

        let new = NewMediaAsset {
            path: video_path(&upload.external_uid, Utc::now()),
            title: resolve_title(request.title.as_deref(), &request.filename),
            mime_type: video_mime_type(&request.filename),
            filename: request.filename,
            size_bytes: 0,
            alt_text: None,
            owner_id: ctx.user_id,
            kind: MediaKind::Video(VideoFields::uploading(upload.external_uid.clone())),
        };

        // An unused ticket expires at the service on its own.
        let asset = self.media.insert(new).await?;

        tracing::info!(
            media_id = asset.id,
            external_uid = %upload.external_uid,
            "Video upload ticket issued"
        );

        Ok(UploadTicket {
            upload_endpoint: upload.upload_url,
            external_uid: upload.external_uid,
            media_id: asset.id,
        })
    }

    /// Record a video that already finished processing at the transcoding service.
    #[tracing::instrument(skip(self, request), fields(user_id = ctx.user_id, external_uid = %request.external_uid))]
    pub async fn link_existing_video(
        &self,
        ctx: &AuthContext,
        request: LinkVideoRequest,
    ) -> Result<MediaAsset, AppError> {
        ctx.require_role(Role::Author)?;
        let external_uid = request.external_uid.trim();
        validate_external_uid(external_uid)?;

        if self.media.get_by_external_uid(external_uid).await?.is_some() {
            return Err(AppError::Duplicate {
                field: "external_uid".to_string(),
            });
        }

        let job = self
            .transcoder
            .get_job_details(external_uid)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "Video {} does not exist at the transcoding service",
                    external_uid
                ))
            })?;

        if job.state != JobState::Ready {
            return Err(AppError::VideoNotReady {
                external_uid: external_uid.to_string(),
                state: job.state.to_string(),
            });
        }

        let filename = job
            .raw
            .pointer("/meta/name")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| external_uid.to_string());

        let video = VideoFields {
            external_uid: external_uid.to_string(),
            duration_seconds: job.duration_seconds,
            width: job.width,
            height: job.height,
            thumbnail_url: job
                .thumbnail_url
                .clone()
                .or_else(|| Some(self.transcoder.thumbnail_url(external_uid))),
            processing_status: ProcessingStatus::Ready,
            processing_error: None,
            external_metadata: (!job.raw.is_null()).then(|| job.raw.clone()),
        };

        let new = NewMediaAsset {
            path: video_path(external_uid, Utc::now()),
            title: resolve_title(request.title.as_deref(), &filename),
            mime_type: video_mime_type(&filename),
            filename,
            size_bytes: job.size_bytes.unwrap_or(0),
            alt_text: None,
            owner_id: ctx.user_id,
            kind: MediaKind::Video(video),
        };

        // A concurrent link of the same uid loses on the unique index.
        let asset = self.media.insert(new).await?;
        tracing::info!(media_id = asset.id, "Existing video linked");
        Ok(asset)
    }

    /// Edit title and alt text. Owner, path and kind fields never change.
    #[tracing::instrument(skip(self, update), fields(user_id = ctx.user_id))]
    pub async fn update_details(
        &self,
        ctx: &AuthContext,
        media_id: i64,
        update: MediaDetailsUpdate,
    ) -> Result<MediaAsset, AppError> {
        let asset = self.get(media_id).await?;
        ctx.require_owner_or_editor(asset.owner_id)?;

        if update.is_empty() {
            return Err(AppError::Validation(
                "Provide a title or alt_text to update".to_string(),
            ));
        }

        let title = match update.title {
            Some(title) if title.trim().is_empty() => {
                return Err(AppError::Validation("Title must not be blank".to_string()));
            }
            other => other.map(|t| t.trim().to_string()),
        };
        let update = MediaDetailsUpdate {
            title,
            // Blank alt text reaches the store as "" and clears the column.
            alt_text: update.alt_text.map(|text| text.trim().to_string()),
        };

        self.media
            .update_details(media_id, &update)
            .await?
            .ok_or_else(|| not_found(media_id))
    }

    pub async fn get(&self, media_id: i64) -> Result<MediaAsset, AppError> {
        self.media
            .get(media_id)
            .await?
            .ok_or_else(|| not_found(media_id))
    }

    /// Newest first. `limit` is clamped to `1..=MAX_LIST_LIMIT`.
    pub async fn list(
        &self,
        kind: Option<MediaType>,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<MediaAsset>, AppError> {
        let limit = limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT);
        let offset = offset.unwrap_or(0).max(0);
        self.media.list(kind, limit, offset).await
    }

    /// Stored status, without asking the transcoding service.
    pub async fn status(&self, media_id: i64) -> Result<MediaStatus, AppError> {
        let asset = self.get(media_id).await?;
        Ok(MediaStatus::from(&asset))
    }
}

pub(crate) fn not_found(media_id: i64) -> AppError {
    AppError::NotFound(format!("Media {} not found", media_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::Harness;
    use quill_processing::fixtures::{jpeg_with_exif, png_bytes, ExifFixture};
    use quill_services::JobDetails;

    fn png_upload(filename: &str) -> ImageUpload {
        ImageUpload {
            filename: filename.to_string(),
            content_type: "image/png".to_string(),
            data: Bytes::from(png_bytes(40, 30)),
            title: None,
            alt_text: None,
        }
    }

    #[tokio::test]
    async fn test_image_upload_records_metadata() {
        let h = Harness::new().await;
        let data = jpeg_with_exif(
            2000,
            1500,
            &ExifFixture {
                gps: Some((37.77, -122.41)),
                date_time_original: Some("2025:06:01 10:30:00"),
                ..ExifFixture::default()
            },
        );

        let asset = h
            .ingestion
            .upload_image(
                &h.author,
                ImageUpload {
                    filename: "photo.jpg".to_string(),
                    content_type: "image/jpeg; charset=binary".to_string(),
                    data: Bytes::from(data),
                    title: None,
                    alt_text: Some("  Golden Gate  ".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(asset.title, "photo");
        assert_eq!(asset.alt_text.as_deref(), Some("Golden Gate"));
        assert_eq!(asset.mime_type, "image/jpeg");
        assert_eq!(asset.owner_id, h.author.user_id);
        assert!(asset.path.starts_with("images/"));
        assert!(asset.path.ends_with(".jpg"));
        assert!(h.storage.contains(&asset.path));

        let image = asset.as_image().unwrap();
        assert_eq!((image.width, image.height), (Some(2000), Some(1500)));
        assert!((image.lat.unwrap() - 37.77).abs() < 1e-4);
        assert!((image.lon.unwrap() + 122.41).abs() < 1e-4);
        assert!(image.date_taken.is_some());
    }

    #[tokio::test]
    async fn test_rejected_uploads_leave_no_trace() {
        let h = Harness::new().await;

        let mut wrong_type = png_upload("doc.pdf");
        wrong_type.content_type = "application/pdf".to_string();
        let mut empty = png_upload("empty.png");
        empty.data = Bytes::new();
        let mut huge = png_upload("huge.png");
        huge.data = Bytes::from(vec![0u8; h.limits.max_image_size_bytes + 1]);

        for upload in [wrong_type, empty, huge] {
            let err = h.ingestion.upload_image(&h.author, upload).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(_)), "{:?}", err);
        }
        assert!(h.storage.is_empty());
        assert_eq!(h.store.media_count(), 0);
    }

    #[tokio::test]
    async fn test_blob_failure_inserts_no_row() {
        let h = Harness::new().await;
        h.storage.fail_puts(true);

        let err = h
            .ingestion
            .upload_image(&h.author, png_upload("a.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Storage(_)));
        assert_eq!(h.store.media_count(), 0);
    }

    #[tokio::test]
    async fn test_row_failure_removes_blob() {
        let h = Harness::new().await;
        // An owner that does not exist trips the foreign key after the blob write.
        let ghost = AuthContext::new(9_999, Role::Author);

        let err = h
            .ingestion
            .upload_image(&ghost, png_upload("a.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert!(h.storage.is_empty());
    }

    #[tokio::test]
    async fn test_explicit_title_wins() {
        let h = Harness::new().await;
        let mut upload = png_upload("IMG_0042-final.png");
        let derived = h
            .ingestion
            .upload_image(&h.author, upload.clone())
            .await
            .unwrap();
        assert_eq!(derived.title, "IMG 0042 final");

        upload.title = Some("Launch day".to_string());
        let explicit = h.ingestion.upload_image(&h.author, upload).await.unwrap();
        assert_eq!(explicit.title, "Launch day");
        assert_ne!(derived.path, explicit.path);
    }

    #[tokio::test]
    async fn test_video_ticket_creates_placeholder() {
        let h = Harness::new().await;
        let ticket = h
            .ingestion
            .request_video_upload(
                &h.author,
                VideoUploadRequest {
                    filename: "launch-keynote.mp4".to_string(),
                    size_bytes: 4 * 1024 * 1024,
                    title: None,
                    max_duration_secs: Some(999_999),
                },
            )
            .await
            .unwrap();

        let asset = h.ingestion.get(ticket.media_id).await.unwrap();
        assert_eq!(asset.external_uid(), Some(ticket.external_uid.as_str()));
        assert_eq!(asset.processing_status(), Some(ProcessingStatus::Uploading));
        assert_eq!(asset.size_bytes, 0);
        assert_eq!(asset.mime_type, "video/mp4");
        assert_eq!(asset.title, "launch keynote");
        assert!(asset.path.starts_with("videos/"));
        assert!(asset.path.ends_with(&ticket.external_uid));
        assert!(!asset.is_ready());

        let issued = h.transcoder.issued_requests();
        assert_eq!(issued.len(), 1);
        assert_eq!(issued[0].max_duration_secs, h.limits.max_video_duration_secs);
        assert_eq!(issued[0].ttl, h.limits.upload_ttl);
        assert_eq!(issued[0].upload_length, 4 * 1024 * 1024);
        assert_eq!(issued[0].creator, Some(h.author.user_id.to_string()));
        assert_eq!(
            issued[0].meta.get("name").map(String::as_str),
            Some("launch-keynote.mp4")
        );
    }

    #[tokio::test]
    async fn test_video_ticket_requires_announced_size() {
        let h = Harness::new().await;
        for size_bytes in [0, h.limits.max_video_upload_bytes + 1] {
            let err = h
                .ingestion
                .request_video_upload(
                    &h.author,
                    VideoUploadRequest {
                        filename: "clip.mp4".to_string(),
                        size_bytes,
                        title: None,
                        max_duration_secs: None,
                    },
                )
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Validation(_)), "{}", size_bytes);
        }
        assert!(h.transcoder.issued_requests().is_empty());
        assert_eq!(h.store.media_count(), 0);
    }

    #[tokio::test]
    async fn test_video_ticket_failure_records_nothing() {
        let h = Harness::new().await;
        h.transcoder.set_unavailable(true);

        let err = h
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
            .unwrap_err();
        assert!(matches!(err, AppError::Transcoder(_)));
        assert_eq!(h.store.media_count(), 0);
    }

    #[tokio::test]
    async fn test_link_requires_ready_job() {
        let h = Harness::new().await;
        h.transcoder
            .set_job(JobDetails::new("vid-processing", JobState::InProgress));

        let err = h
            .ingestion
            .link_existing_video(
                &h.author,
                LinkVideoRequest {
                    external_uid: "vid-processing".to_string(),
                    title: None,
                },
            )
            .await
            .unwrap_err();
        assert!(
            matches!(err, AppError::VideoNotReady { ref state, .. } if state == "inprogress")
        );

        let err = h
            .ingestion
            .link_existing_video(
                &h.author,
                LinkVideoRequest {
                    external_uid: "vid-missing".to_string(),
                    title: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(h.store.media_count(), 0);
    }

    #[tokio::test]
    async fn test_link_is_unique_per_external_uid() {
        let h = Harness::new().await;
        h.transcoder
            .set_job(JobDetails::new("vid-ready", JobState::PendingUpload));
        h.transcoder.finish("vid-ready", 42.0, 1920, 1080, 5_000_000);

        let request = LinkVideoRequest {
            external_uid: "vid-ready".to_string(),
            title: Some("Keynote".to_string()),
        };
        let asset = h
            .ingestion
            .link_existing_video(&h.author, request.clone())
            .await
            .unwrap();
        assert_eq!(asset.title, "Keynote");
        assert_eq!(asset.size_bytes, 5_000_000);
        let video = asset.as_video().unwrap();
        assert_eq!(video.processing_status, ProcessingStatus::Ready);
        assert_eq!(video.duration_seconds, Some(42.0));
        assert_eq!((video.width, video.height), (Some(1920), Some(1080)));
        assert!(video.thumbnail_url.is_some());
        assert!(video.external_metadata.is_some());

        let err = h
            .ingestion
            .link_existing_video(&h.editor, request)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Duplicate { ref field } if field == "external_uid"));
        assert_eq!(h.store.media_count(), 1);
    }

    #[tokio::test]
    async fn test_update_details_gated_by_ownership() {
        let h = Harness::new().await;
        let asset = h
            .ingestion
            .upload_image(&h.author, png_upload("a.png"))
            .await
            .unwrap();

        let update = MediaDetailsUpdate {
            title: Some("Renamed".to_string()),
            alt_text: None,
        };
        let err = h
            .ingestion
            .update_details(&h.other_author, asset.id, update.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let updated = h
            .ingestion
            .update_details(&h.author, asset.id, update)
            .await
            .unwrap();
        assert_eq!(updated.title, "Renamed");
        assert_eq!(updated.path, asset.path);
        assert_eq!(updated.owner_id, asset.owner_id);

        let by_editor = h
            .ingestion
            .update_details(
                &h.editor,
                asset.id,
                MediaDetailsUpdate {
                    title: None,
                    alt_text: Some("A red square".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(by_editor.title, "Renamed");
        assert_eq!(by_editor.alt_text.as_deref(), Some("A red square"));

        let err = h
            .ingestion
            .update_details(
                &h.author,
                asset.id,
                MediaDetailsUpdate {
                    title: Some("   ".to_string()),
                    alt_text: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_blank_alt_text_clears_it() {
        let h = Harness::new().await;
        let mut upload = png_upload("a.png");
        upload.alt_text = Some("A red square".to_string());
        let asset = h.ingestion.upload_image(&h.author, upload).await.unwrap();
        assert_eq!(asset.alt_text.as_deref(), Some("A red square"));

        let cleared = h
            .ingestion
            .update_details(
                &h.author,
                asset.id,
                MediaDetailsUpdate {
                    title: None,
                    alt_text: Some("   ".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(cleared.alt_text, None);
        assert_eq!(cleared.title, asset.title);
    }

    #[tokio::test]
    async fn test_list_and_status() {
        let h = Harness::new().await;
        let image = h
            .ingestion
            .upload_image(&h.author, png_upload("a.png"))
            .await
            .unwrap();
        let ticket = h
            .ingestion
            .request_video_upload(
                &h.author,
                VideoUploadRequest {
                    filename: "b.mov".to_string(),
                    size_bytes: 4 * 1024 * 1024,
                    title: None,
                    max_duration_secs: None,
                },
            )
            .await
            .unwrap();

        let all = h.ingestion.list(None, None, None).await.unwrap();
        assert_eq!(all.len(), 2);
        let videos = h
            .ingestion
            .list(Some(MediaType::Video), Some(0), Some(-3))
            .await
            .unwrap();
        assert_eq!(videos.len(), 1);
        assert_eq!(videos[0].id, ticket.media_id);

        let status = h.ingestion.status(image.id).await.unwrap();
        assert!(status.ready);
        assert_eq!(status.processing_status, None);

        let status = h.ingestion.status(ticket.media_id).await.unwrap();
        assert!(!status.ready);
        assert_eq!(status.processing_status, Some(ProcessingStatus::Uploading));

        assert!(matches!(
            h.ingestion.get(12_345).await,
            Err(AppError::NotFound(_))
        ));
    }
}
