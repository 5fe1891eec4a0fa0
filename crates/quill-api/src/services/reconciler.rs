//! Video status reconciliation.
//!
//! The stored `processing_status` is re-derived from the transcoding service's job state.
//! Reconciling is idempotent and safe to run concurrently: writes only happen when the
//! status moves forward, as a compare-and-set on the status that was read. The same
//! function serves client polling, the CLI sweep and the background interval.

use crate::services::ingestion::not_found;
use quill_core::constants::DEFAULT_PROCESSING_ERROR;
use quill_core::models::{MediaAsset, ProcessingStatus, VideoProcessingUpdate};
use quill_core::AppError;
use quill_db::MediaStore;
use quill_services::{JobDetails, TranscodingService};
use serde::Serialize;
use std::sync::Arc;

/// Outcome of one sweep over non-terminal videos.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub examined: usize,
    pub changed: usize,
    pub failed: usize,
}

#[derive(Clone)]
pub struct ReconcilerService {
    media: Arc<dyn MediaStore>,
    transcoder: Arc<dyn TranscodingService>,
}

impl ReconcilerService {
    pub fn new(media: Arc<dyn MediaStore>, transcoder: Arc<dyn TranscodingService>) -> Self {
        Self { media, transcoder }
    }

    /// Bring the video with `external_uid` up to date and return it.
    #[tracing::instrument(skip(self))]
    pub async fn reconcile(&self, external_uid: &str) -> Result<MediaAsset, AppError> {
        let asset = self
            .media
            .get_by_external_uid(external_uid)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No video with uid {}", external_uid)))?;
        self.reconcile_asset(asset).await
    }

    /// Same as [`reconcile`](Self::reconcile), addressed by media id. Images are returned
    /// as they are.
    #[tracing::instrument(skip(self))]
    pub async fn reconcile_media(&self, media_id: i64) -> Result<MediaAsset, AppError> {
        let asset = self
            .media
            .get(media_id)
            .await?
            .ok_or_else(|| not_found(media_id))?;
        self.reconcile_asset(asset).await
    }

    /// Reconcile up to `limit` non-terminal videos, oldest first.
    #[tracing::instrument(skip(self))]
    pub async fn reconcile_pending(&self, limit: i64) -> Result<ReconcileReport, AppError> {
        let pending = self.media.list_pending(limit).await?;
        let mut report = ReconcileReport {
            examined: pending.len(),
            ..ReconcileReport::default()
        };

        for asset in pending {
            let before = asset.processing_status();
            let media_id = asset.id;
            match self.reconcile_asset(asset).await {
                Ok(after) if after.processing_status() != before => report.changed += 1,
                Ok(_) => {}
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!(error = %e, media_id, "Failed to reconcile video");
                }
            }
        }

        tracing::info!(
            examined = report.examined,
            changed = report.changed,
            failed = report.failed,
            "Pending video sweep finished"
        );
        Ok(report)
    }

    async fn reconcile_asset(&self, asset: MediaAsset) -> Result<MediaAsset, AppError> {
        let Some(video) = asset.as_video() else {
            return Ok(asset);
        };
        let current = video.processing_status;
        if current.is_terminal() {
            return Ok(asset);
        }
        let external_uid = video.external_uid.clone();

        // Service trouble never flips a video to error; the next poll tries again.
        let job = match self.transcoder.get_job_details(&external_uid).await {
            Ok(Some(job)) => job,
            Ok(None) => {
                tracing::warn!(
                    media_id = asset.id,
                    external_uid = %external_uid,
                    "Transcoding service has no such job; leaving record unchanged"
                );
                return Ok(asset);
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    media_id = asset.id,
                    external_uid = %external_uid,
                    "Transcoding service lookup failed; leaving record unchanged"
                );
                return Ok(asset);
            }
        };

        let Some(target) = job.state.processing_status() else {
            tracing::debug!(
                media_id = asset.id,
                state = %job.state,
                "Unrecognized job state; leaving record unchanged"
            );
            return Ok(asset);
        };

        if !current.can_transition_to(target) {
            return Ok(asset);
        }

        let update = self.update_for(target, &job);
        match self
            .media
            .compare_and_set_status(asset.id, current, &update)
            .await?
        {
            Some(updated) => {
                tracing::info!(
                    media_id = updated.id,
                    from = %current,
                    to = %target,
                    "Video status advanced"
                );
                Ok(updated)
            }
            // Another reconcile got there first; report what it stored.
            None => self
                .media
                .get(asset.id)
                .await?
                .ok_or_else(|| not_found(asset.id)),
        }
    }

    fn update_for(&self, target: ProcessingStatus, job: &JobDetails) -> VideoProcessingUpdate {
        let raw = (!job.raw.is_null()).then(|| job.raw.clone());
        match target {
            ProcessingStatus::Ready => VideoProcessingUpdate {
                status: target,
                duration_seconds: job.duration_seconds,
                width: job.width,
                height: job.height,
                thumbnail_url: job
                    .thumbnail_url
                    .clone()
                    .or_else(|| Some(self.transcoder.thumbnail_url(&job.external_uid))),
                size_bytes: job.size_bytes,
                processing_error: None,
                external_metadata: raw,
            },
            ProcessingStatus::Error => VideoProcessingUpdate {
                processing_error: Some(
                    job.error_reason
                        .clone()
                        .filter(|reason| !reason.trim().is_empty())
                        .unwrap_or_else(|| DEFAULT_PROCESSING_ERROR.to_string()),
                ),
                external_metadata: raw,
                ..VideoProcessingUpdate::status_only(target)
            },
            ProcessingStatus::Uploading | ProcessingStatus::Processing => {
                VideoProcessingUpdate::status_only(target)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ingestion::VideoUploadRequest;
    use crate::services::test_support::Harness;
    use quill_core::models::UploadTicket;
    use quill_services::JobState;

    async fn ticket(h: &Harness) -> UploadTicket {
        h.ingestion
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
            .unwrap()
    }

    #[tokio::test]
    async fn test_status_follows_job_state() {
        let h = Harness::new().await;
        let t = ticket(&h).await;

        let asset = h.reconciler.reconcile(&t.external_uid).await.unwrap();
        assert_eq!(asset.processing_status(), Some(ProcessingStatus::Uploading));

        for state in [JobState::Downloading, JobState::Queued, JobState::InProgress] {
            h.transcoder.set_state(&t.external_uid, state);
            let asset = h.reconciler.reconcile(&t.external_uid).await.unwrap();
            assert_eq!(asset.processing_status(), Some(ProcessingStatus::Processing));
        }

        h.transcoder.finish(&t.external_uid, 42.0, 1280, 720, 9_000);
        let asset = h.reconciler.reconcile(&t.external_uid).await.unwrap();
        let video = asset.as_video().unwrap();
        assert_eq!(video.processing_status, ProcessingStatus::Ready);
        assert_eq!(video.duration_seconds, Some(42.0));
        assert_eq!(asset.size_bytes, 9_000);
        assert!(video.thumbnail_url.is_some());
    }

    #[tokio::test]
    async fn test_terminal_status_is_stable() {
        let h = Harness::new().await;
        let t = ticket(&h).await;
        h.transcoder.fail(&t.external_uid, None);

        let failed = h.reconciler.reconcile(&t.external_uid).await.unwrap();
        assert_eq!(failed.processing_status(), Some(ProcessingStatus::Error));
        assert_eq!(
            failed.as_video().unwrap().processing_error.as_deref(),
            Some(DEFAULT_PROCESSING_ERROR)
        );

        let lookups = h.transcoder.lookup_count();
        h.transcoder.finish(&t.external_uid, 10.0, 640, 480, 1);
        let again = h.reconciler.reconcile(&t.external_uid).await.unwrap();
        assert_eq!(again, failed);
        assert_eq!(h.transcoder.lookup_count(), lookups);
    }

    #[tokio::test]
    async fn test_no_backwards_moves() {
        let h = Harness::new().await;
        let t = ticket(&h).await;
        h.transcoder.set_state(&t.external_uid, JobState::InProgress);
        h.reconciler.reconcile(&t.external_uid).await.unwrap();

        h.transcoder.set_state(&t.external_uid, JobState::PendingUpload);
        let asset = h.reconciler.reconcile(&t.external_uid).await.unwrap();
        assert_eq!(asset.processing_status(), Some(ProcessingStatus::Processing));
    }

    #[tokio::test]
    async fn test_service_failures_leave_record_unchanged() {
        let h = Harness::new().await;
        let t = ticket(&h).await;
        let before = h.ingestion.get(t.media_id).await.unwrap();

        h.transcoder.set_unavailable(true);
        assert_eq!(h.reconciler.reconcile(&t.external_uid).await.unwrap(), before);

        h.transcoder.set_unavailable(false);
        h.transcoder.remove_job(&t.external_uid);
        assert_eq!(h.reconciler.reconcile(&t.external_uid).await.unwrap(), before);

        h.transcoder.set_job(JobDetails::new(
            t.external_uid.clone(),
            JobState::parse("paused"),
        ));
        assert_eq!(h.reconciler.reconcile(&t.external_uid).await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_unknown_uid_not_found() {
        let h = Harness::new().await;
        assert!(matches!(
            h.reconciler.reconcile("vid-nope").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_lost_race_returns_stored_row() {
        let h = Harness::new().await;
        let t = ticket(&h).await;
        h.transcoder.set_state(&t.external_uid, JobState::InProgress);

        // A stale snapshot still says "uploading" while the row already moved on.
        let stale = h.ingestion.get(t.media_id).await.unwrap();
        h.reconciler.reconcile(&t.external_uid).await.unwrap();
        h.transcoder.finish(&t.external_uid, 5.0, 320, 240, 100);
        h.reconciler.reconcile(&t.external_uid).await.unwrap();

        let result = h.reconciler.reconcile_asset(stale).await.unwrap();
        assert_eq!(result.processing_status(), Some(ProcessingStatus::Ready));
    }

    #[tokio::test]
    async fn test_pending_sweep() {
        let h = Harness::new().await;
        let first = ticket(&h).await;
        let second = ticket(&h).await;
        let third = ticket(&h).await;

        h.transcoder.finish(&first.external_uid, 1.0, 16, 16, 1);
        h.transcoder.set_state(&second.external_uid, JobState::Queued);

        let report = h.reconciler.reconcile_pending(100).await.unwrap();
        assert_eq!(
            report,
            ReconcileReport {
                examined: 3,
                changed: 2,
                failed: 0
            }
        );

        let report = h.reconciler.reconcile_pending(100).await.unwrap();
        assert_eq!(report.examined, 2);
        assert_eq!(report.changed, 0);

        let third = h.ingestion.get(third.media_id).await.unwrap();
        assert_eq!(third.processing_status(), Some(ProcessingStatus::Uploading));
    }

    #[tokio::test]
    async fn test_images_pass_through() {
        let h = Harness::new().await;
        let image = h.upload_png().await;
        let lookups = h.transcoder.lookup_count();
        assert_eq!(h.reconciler.reconcile_media(image.id).await.unwrap(), image);
        assert_eq!(h.transcoder.lookup_count(), lookups);
    }
}
