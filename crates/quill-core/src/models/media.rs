use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

#[cfg(feature = "sqlx")]
use sqlx::FromRow;

use super::content::ContentRef;
use crate::error::AppError;

/// Media type discriminator as stored in the `media.kind` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "media_kind", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Image => "image",
            MediaType::Video => "video",
        }
    }
}

impl std::str::FromStr for MediaType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "image" => Ok(MediaType::Image),
            "video" => Ok(MediaType::Video),
            other => Err(AppError::Validation(format!("Unknown media kind: {}", other))),
        }
    }
}

/// Video processing lifecycle.
///
/// `uploading -> processing -> {ready, error}`. `ready` and `error` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "processing_status", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    Uploading,
    Processing,
    Ready,
    Error,
}

impl ProcessingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingStatus::Uploading => "uploading",
            ProcessingStatus::Processing => "processing",
            ProcessingStatus::Ready => "ready",
            ProcessingStatus::Error => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ProcessingStatus::Ready | ProcessingStatus::Error)
    }

    fn rank(&self) -> u8 {
        match self {
            ProcessingStatus::Uploading => 0,
            ProcessingStatus::Processing => 1,
            ProcessingStatus::Ready | ProcessingStatus::Error => 2,
        }
    }

    /// Whether moving from `self` to `next` is a forward step in the lifecycle.
    pub fn can_transition_to(&self, next: ProcessingStatus) -> bool {
        !self.is_terminal() && next.rank() > self.rank()
    }

    /// Returns `next` when the transition is allowed, otherwise `self` unchanged.
    pub fn advance_to(self, next: ProcessingStatus) -> ProcessingStatus {
        if self.can_transition_to(next) {
            next
        } else {
            self
        }
    }
}

impl std::fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields only images carry. All optional: absence means "not extractable".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageFields {
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub date_taken: Option<DateTime<Utc>>,
}

/// Fields only videos carry. `external_uid` is the transcoding job id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoFields {
    pub external_uid: String,
    pub duration_seconds: Option<f64>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub thumbnail_url: Option<String>,
    pub processing_status: ProcessingStatus,
    pub processing_error: Option<String>,
    pub external_metadata: Option<JsonValue>,
}

impl VideoFields {
    /// Placeholder fields for a freshly ticketed upload.
    pub fn uploading(external_uid: impl Into<String>) -> Self {
        Self {
            external_uid: external_uid.into(),
            duration_seconds: None,
            width: None,
            height: None,
            thumbnail_url: None,
            processing_status: ProcessingStatus::Uploading,
            processing_error: None,
            external_metadata: None,
        }
    }
}

/// Kind-specific part of a media asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MediaKind {
    Image(ImageFields),
    Video(VideoFields),
}

impl MediaKind {
    pub fn media_type(&self) -> MediaType {
        match self {
            MediaKind::Image(_) => MediaType::Image,
            MediaKind::Video(_) => MediaType::Video,
        }
    }
}

/// A stored image or video and its derived metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaAsset {
    pub id: i64,
    pub path: String,
    pub filename: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub title: String,
    pub alt_text: Option<String>,
    pub owner_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: MediaKind,
}

impl MediaAsset {
    pub fn media_type(&self) -> MediaType {
        self.kind.media_type()
    }

    pub fn external_uid(&self) -> Option<&str> {
        match &self.kind {
            MediaKind::Video(video) => Some(video.external_uid.as_str()),
            MediaKind::Image(_) => None,
        }
    }

    pub fn processing_status(&self) -> Option<ProcessingStatus> {
        match &self.kind {
            MediaKind::Video(video) => Some(video.processing_status),
            MediaKind::Image(_) => None,
        }
    }

    /// Images are implicitly ready; videos are ready once transcoding finished.
    pub fn is_ready(&self) -> bool {
        match &self.kind {
            MediaKind::Image(_) => true,
            MediaKind::Video(video) => video.processing_status == ProcessingStatus::Ready,
        }
    }

    pub fn as_video(&self) -> Option<&VideoFields> {
        match &self.kind {
            MediaKind::Video(video) => Some(video),
            MediaKind::Image(_) => None,
        }
    }

    pub fn as_image(&self) -> Option<&ImageFields> {
        match &self.kind {
            MediaKind::Image(image) => Some(image),
            MediaKind::Video(_) => None,
        }
    }

    pub fn dimensions(&self) -> (Option<i32>, Option<i32>) {
        match &self.kind {
            MediaKind::Image(image) => (image.width, image.height),
            MediaKind::Video(video) => (video.width, video.height),
        }
    }
}

/// Values for inserting a new media row. The store assigns `id` and timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMediaAsset {
    pub path: String,
    pub filename: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub title: String,
    pub alt_text: Option<String>,
    pub owner_id: i64,
    pub kind: MediaKind,
}

/// Editable descriptive fields. `None` leaves a field untouched; an empty `alt_text`
/// clears it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MediaDetailsUpdate {
    pub title: Option<String>,
    pub alt_text: Option<String>,
}

impl MediaDetailsUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.alt_text.is_none()
    }
}

/// Target state computed by reconciliation, applied with compare-and-set on the
/// stored status.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoProcessingUpdate {
    pub status: ProcessingStatus,
    pub duration_seconds: Option<f64>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub thumbnail_url: Option<String>,
    pub size_bytes: Option<i64>,
    pub processing_error: Option<String>,
    pub external_metadata: Option<JsonValue>,
}

impl VideoProcessingUpdate {
    pub fn status_only(status: ProcessingStatus) -> Self {
        Self {
            status,
            duration_seconds: None,
            width: None,
            height: None,
            thumbnail_url: None,
            size_bytes: None,
            processing_error: None,
            external_metadata: None,
        }
    }

    /// Apply onto in-memory video fields, keeping existing values where the update has none.
    pub fn apply_to(&self, video: &mut VideoFields) {
        video.processing_status = self.status;
        if self.duration_seconds.is_some() {
            video.duration_seconds = self.duration_seconds;
        }
        if self.width.is_some() {
            video.width = self.width;
        }
        if self.height.is_some() {
            video.height = self.height;
        }
        if self.thumbnail_url.is_some() {
            video.thumbnail_url = self.thumbnail_url.clone();
        }
        if self.processing_error.is_some() {
            video.processing_error = self.processing_error.clone();
        }
        if self.external_metadata.is_some() {
            video.external_metadata = self.external_metadata.clone();
        }
    }
}

/// Returned to the uploader after a direct-upload ticket was issued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadTicket {
    pub upload_endpoint: String,
    pub external_uid: String,
    pub media_id: i64,
}

/// Content entities currently pointing at a media asset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaUsage {
    pub articles: Vec<ContentRef>,
    pub pages: Vec<ContentRef>,
}

impl MediaUsage {
    pub fn count(&self) -> usize {
        self.articles.len() + self.pages.len()
    }

    pub fn is_unused(&self) -> bool {
        self.count() == 0
    }

    pub fn references(&self) -> Vec<ContentRef> {
        self.articles
            .iter()
            .chain(self.pages.iter())
            .cloned()
            .collect()
    }
}

/// Denormalized media fields returned alongside a content entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaSummary {
    pub id: i64,
    pub kind: MediaType,
    pub path: String,
    pub url: String,
    pub alt_text: Option<String>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub thumbnail_url: Option<String>,
    pub processing_status: Option<ProcessingStatus>,
}

/// Database row for the media table: kind-specific columns are nullable and
/// folded into [`MediaKind`] on read.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "sqlx", derive(FromRow))]
pub struct MediaRow {
    pub id: i64,
    pub kind: MediaType,
    pub path: String,
    pub filename: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub title: String,
    pub alt_text: Option<String>,
    pub owner_id: i64,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub date_taken: Option<DateTime<Utc>>,
    pub external_uid: Option<String>,
    pub duration_seconds: Option<f64>,
    pub thumbnail_url: Option<String>,
    pub processing_status: Option<ProcessingStatus>,
    pub processing_error: Option<String>,
    pub external_metadata: Option<JsonValue>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<MediaRow> for MediaAsset {
    type Error = AppError;

    fn try_from(row: MediaRow) -> Result<Self, Self::Error> {
        let kind = match row.kind {
            MediaType::Image => MediaKind::Image(ImageFields {
                width: row.width,
                height: row.height,
                lat: row.lat,
                lon: row.lon,
                date_taken: row.date_taken,
            }),
            MediaType::Video => {
                let external_uid = row.external_uid.ok_or_else(|| {
                    AppError::Internal(format!("Video media {} has no external uid", row.id))
                })?;
                MediaKind::Video(VideoFields {
                    external_uid,
                    duration_seconds: row.duration_seconds,
                    width: row.width,
                    height: row.height,
                    thumbnail_url: row.thumbnail_url,
                    processing_status: row
                        .processing_status
                        .unwrap_or(ProcessingStatus::Uploading),
                    processing_error: row.processing_error,
                    external_metadata: row.external_metadata,
                })
            }
        };

        Ok(MediaAsset {
            id: row.id,
            path: row.path,
            filename: row.filename,
            mime_type: row.mime_type,
            size_bytes: row.size_bytes,
            title: row.title,
            alt_text: row.alt_text,
            owner_id: row.owner_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
            kind,
        })
    }
}
