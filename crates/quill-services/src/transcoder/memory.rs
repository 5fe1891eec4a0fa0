//! Scriptable in-process transcoder for tests of callers.

use super::{
    DirectUpload, DirectUploadRequest, JobDetails, JobState, TranscoderError, TranscoderResult,
    TranscodingService,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct State {
    jobs: HashMap<String, JobDetails>,
    issued: Vec<DirectUploadRequest>,
    deleted: Vec<String>,
}

/// Jobs are created by `create_direct_upload` (state `pendingupload`) or inserted with
/// [`MemoryTranscoder::set_job`]; tests move them along with [`MemoryTranscoder::set_state`].
#[derive(Debug, Default)]
pub struct MemoryTranscoder {
    state: Mutex<State>,
    next_uid: AtomicU64,
    unavailable: AtomicBool,
    lookups: AtomicU64,
}

impl MemoryTranscoder {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Make every call fail as if the service were down.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn set_job(&self, job: JobDetails) {
        self.lock().jobs.insert(job.external_uid.clone(), job);
    }

    /// Move an existing job to `state`; no-op when the job does not exist.
    pub fn set_state(&self, external_uid: &str, state: JobState) {
        if let Some(job) = self.lock().jobs.get_mut(external_uid) {
            job.state = state;
        }
    }

    /// Mark a job ready with the given duration, dimensions and size.
    pub fn finish(
        &self,
        external_uid: &str,
        duration_seconds: f64,
        width: i32,
        height: i32,
        size_bytes: i64,
    ) {
        let thumbnail = self.thumbnail_url(external_uid);
        if let Some(job) = self.lock().jobs.get_mut(external_uid) {
            job.state = JobState::Ready;
            job.duration_seconds = Some(duration_seconds);
            job.width = Some(width);
            job.height = Some(height);
            job.size_bytes = Some(size_bytes);
            job.thumbnail_url = Some(thumbnail);
            job.raw = serde_json::json!({
                "uid": external_uid,
                "status": {"state": "ready"},
                "duration": duration_seconds,
                "size": size_bytes,
                "input": {"width": width, "height": height},
            });
        }
    }

    pub fn fail(&self, external_uid: &str, reason: Option<&str>) {
        if let Some(job) = self.lock().jobs.get_mut(external_uid) {
            job.state = JobState::Error;
            job.error_reason = reason.map(str::to_string);
        }
    }

    pub fn remove_job(&self, external_uid: &str) {
        self.lock().jobs.remove(external_uid);
    }

    pub fn issued_requests(&self) -> Vec<DirectUploadRequest> {
        self.lock().issued.clone()
    }

    pub fn deleted_jobs(&self) -> Vec<String> {
        self.lock().deleted.clone()
    }

    /// Number of `get_job_details` calls served so far.
    pub fn lookup_count(&self) -> u64 {
        self.lookups.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> TranscoderResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(TranscoderError::Api {
                status: 503,
                message: "service unavailable".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl TranscodingService for MemoryTranscoder {
    async fn create_direct_upload(
        &self,
        request: DirectUploadRequest,
    ) -> TranscoderResult<DirectUpload> {
        self.check_available()?;
        let n = self.next_uid.fetch_add(1, Ordering::SeqCst) + 1;
        let external_uid = format!("vid{:06}", n);

        let mut state = self.lock();
        state.issued.push(request);
        state.jobs.insert(
            external_uid.clone(),
            JobDetails::new(external_uid.clone(), JobState::PendingUpload),
        );

        Ok(DirectUpload {
            upload_url: format!("memory://uploads/{}", external_uid),
            external_uid,
        })
    }

    async fn get_job_details(&self, external_uid: &str) -> TranscoderResult<Option<JobDetails>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        Ok(self.lock().jobs.get(external_uid).cloned())
    }

    fn thumbnail_url(&self, external_uid: &str) -> String {
        format!("memory://delivery/{}/thumbnails/thumbnail.jpg", external_uid)
    }

    fn playback_url(&self, external_uid: &str) -> String {
        format!("memory://delivery/{}/manifest/video.m3u8", external_uid)
    }

    async fn delete_job(&self, external_uid: &str) -> TranscoderResult<()> {
        self.check_available()?;
        let mut state = self.lock();
        state.jobs.remove(external_uid);
        state.deleted.push(external_uid.to_string());
        Ok(())
    }
}
