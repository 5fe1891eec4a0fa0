use async_trait::async_trait;
use quill_core::models::{
    MediaAsset, MediaDetailsUpdate, MediaKind, MediaRow, MediaType, NewMediaAsset,
    ProcessingStatus, VideoProcessingUpdate,
};
use quill_core::AppError;
use serde_json::Value as JsonValue;
use sqlx::PgPool;

/// Column list shared by every media query.
pub(crate) const MEDIA_COLUMNS: &str = r#"
    id, kind, path, filename, mime_type, size_bytes, title, alt_text, owner_id,
    width, height, lat, lon, date_taken,
    external_uid, duration_seconds, thumbnail_url, processing_status, processing_error,
    external_metadata, created_at, updated_at
"#;

/// Persistence for media assets. The store exclusively owns media rows.
#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn insert(&self, new: NewMediaAsset) -> Result<MediaAsset, AppError>;

    async fn get(&self, id: i64) -> Result<Option<MediaAsset>, AppError>;

    async fn get_by_external_uid(&self, external_uid: &str)
        -> Result<Option<MediaAsset>, AppError>;

    /// Newest first.
    async fn list(
        &self,
        kind: Option<MediaType>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<MediaAsset>, AppError>;

    /// Returns `None` when the asset does not exist.
    async fn update_details(
        &self,
        id: i64,
        update: &MediaDetailsUpdate,
    ) -> Result<Option<MediaAsset>, AppError>;

    /// Apply `update` only if the stored status is still `expected`.
    ///
    /// Returns `None` when the row is gone, is not a video, or its status moved on.
    async fn compare_and_set_status(
        &self,
        id: i64,
        expected: ProcessingStatus,
        update: &VideoProcessingUpdate,
    ) -> Result<Option<MediaAsset>, AppError>;

    /// Returns whether a row was removed. Rows still referenced by content fail with
    /// `AppError::Conflict`.
    async fn delete(&self, id: i64) -> Result<bool, AppError>;

    /// Videos not yet `ready`/`error`, oldest first.
    async fn list_pending(&self, limit: i64) -> Result<Vec<MediaAsset>, AppError>;
}

/// Kind-specific columns flattened for binding.
struct KindColumns {
    width: Option<i32>,
    height: Option<i32>,
    lat: Option<f64>,
    lon: Option<f64>,
    date_taken: Option<chrono::DateTime<chrono::Utc>>,
    external_uid: Option<String>,
    duration_seconds: Option<f64>,
    thumbnail_url: Option<String>,
    processing_status: Option<ProcessingStatus>,
    processing_error: Option<String>,
    external_metadata: Option<JsonValue>,
}

impl From<MediaKind> for KindColumns {
    fn from(kind: MediaKind) -> Self {
        match kind {
            MediaKind::Image(image) => KindColumns {
                width: image.width,
                height: image.height,
                lat: image.lat,
                lon: image.lon,
                date_taken: image.date_taken,
                external_uid: None,
                duration_seconds: None,
                thumbnail_url: None,
                processing_status: None,
                processing_error: None,
                external_metadata: None,
            },
            MediaKind::Video(video) => KindColumns {
                width: video.width,
                height: video.height,
                lat: None,
                lon: None,
                date_taken: None,
                external_uid: Some(video.external_uid),
                duration_seconds: video.duration_seconds,
                thumbnail_url: video.thumbnail_url,
                processing_status: Some(video.processing_status),
                processing_error: video.processing_error,
                external_metadata: video.external_metadata,
            },
        }
    }
}

fn into_assets(rows: Vec<MediaRow>) -> Result<Vec<MediaAsset>, AppError> {
    rows.into_iter().map(MediaAsset::try_from).collect()
}

#[derive(Clone)]
pub struct MediaRepository {
    pool: PgPool,
}

impl MediaRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MediaStore for MediaRepository {
    #[tracing::instrument(skip(self, new), fields(db.table = "media", db.operation = "insert", path = %new.path))]
    async fn insert(&self, new: NewMediaAsset) -> Result<MediaAsset, AppError> {
        let media_type = new.kind.media_type();
        let columns = KindColumns::from(new.kind);

        let query = format!(
            r#"
            INSERT INTO media (
                kind, path, filename, mime_type, size_bytes, title, alt_text, owner_id,
                width, height, lat, lon, date_taken,
                external_uid, duration_seconds, thumbnail_url, processing_status,
                processing_error, external_metadata
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
            RETURNING {}
            "#,
            MEDIA_COLUMNS
        );

        let row: MediaRow = sqlx::query_as(&query)
            .bind(media_type)
            .bind(&new.path)
            .bind(&new.filename)
            .bind(&new.mime_type)
            .bind(new.size_bytes)
            .bind(&new.title)
            .bind(&new.alt_text)
            .bind(new.owner_id)
            .bind(columns.width)
            .bind(columns.height)
            .bind(columns.lat)
            .bind(columns.lon)
            .bind(columns.date_taken)
            .bind(columns.external_uid)
            .bind(columns.duration_seconds)
            .bind(columns.thumbnail_url)
            .bind(columns.processing_status)
            .bind(columns.processing_error)
            .bind(columns.external_metadata)
            .fetch_one(&self.pool)
            .await?;

        tracing::info!(media_id = row.id, kind = media_type.as_str(), "Media row inserted");
        MediaAsset::try_from(row)
    }

    #[tracing::instrument(skip(self), fields(db.table = "media", db.operation = "select"))]
    async fn get(&self, id: i64) -> Result<Option<MediaAsset>, AppError> {
        let query = format!("SELECT {} FROM media WHERE id = $1", MEDIA_COLUMNS);
        let row: Option<MediaRow> = sqlx::query_as(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(MediaAsset::try_from).transpose()
    }

    #[tracing::instrument(skip(self), fields(db.table = "media", db.operation = "select"))]
    async fn get_by_external_uid(
        &self,
        external_uid: &str,
    ) -> Result<Option<MediaAsset>, AppError> {
        let query = format!("SELECT {} FROM media WHERE external_uid = $1", MEDIA_COLUMNS);
        let row: Option<MediaRow> = sqlx::query_as(&query)
            .bind(external_uid)
            .fetch_optional(&self.pool)
            .await?;
        row.map(MediaAsset::try_from).transpose()
    }

    #[tracing::instrument(skip(self), fields(db.table = "media", db.operation = "select"))]
    async fn list(
        &self,
        kind: Option<MediaType>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<MediaAsset>, AppError> {
        let query = format!(
            r#"
            SELECT {}
            FROM media
            WHERE ($1::media_kind IS NULL OR kind = $1)
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
            MEDIA_COLUMNS
        );
        let rows: Vec<MediaRow> = sqlx::query_as(&query)
            .bind(kind)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        into_assets(rows)
    }

    #[tracing::instrument(skip(self, update), fields(db.table = "media", db.operation = "update"))]
    async fn update_details(
        &self,
        id: i64,
        update: &MediaDetailsUpdate,
    ) -> Result<Option<MediaAsset>, AppError> {
        let query = format!(
            r#"
            UPDATE media
            SET title = COALESCE($2, title),
                alt_text = CASE WHEN $3::TEXT IS NULL THEN alt_text ELSE NULLIF($3, '') END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            MEDIA_COLUMNS
        );
        let row: Option<MediaRow> = sqlx::query_as(&query)
            .bind(id)
            .bind(&update.title)
            .bind(&update.alt_text)
            .fetch_optional(&self.pool)
            .await?;
        row.map(MediaAsset::try_from).transpose()
    }

    #[tracing::instrument(
        skip(self, update),
        fields(db.table = "media", db.operation = "update", from = %expected, to = %update.status)
    )]
    async fn compare_and_set_status(
        &self,
        id: i64,
        expected: ProcessingStatus,
        update: &VideoProcessingUpdate,
    ) -> Result<Option<MediaAsset>, AppError> {
        let query = format!(
            r#"
            UPDATE media
            SET processing_status = $3,
                duration_seconds = COALESCE($4, duration_seconds),
                width = COALESCE($5, width),
                height = COALESCE($6, height),
                thumbnail_url = COALESCE($7, thumbnail_url),
                size_bytes = COALESCE($8, size_bytes),
                processing_error = COALESCE($9, processing_error),
                external_metadata = COALESCE($10, external_metadata),
                updated_at = NOW()
            WHERE id = $1 AND kind = 'video' AND processing_status = $2
            RETURNING {}
            "#,
            MEDIA_COLUMNS
        );
        let row: Option<MediaRow> = sqlx::query_as(&query)
            .bind(id)
            .bind(expected)
            .bind(update.status)
            .bind(update.duration_seconds)
            .bind(update.width)
            .bind(update.height)
            .bind(&update.thumbnail_url)
            .bind(update.size_bytes)
            .bind(&update.processing_error)
            .bind(&update.external_metadata)
            .fetch_optional(&self.pool)
            .await?;

        if row.is_none() {
            tracing::debug!(media_id = id, "Status compare-and-set lost");
        }
        row.map(MediaAsset::try_from).transpose()
    }

    #[tracing::instrument(skip(self), fields(db.table = "media", db.operation = "delete"))]
    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM media WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self), fields(db.table = "media", db.operation = "select"))]
    async fn list_pending(&self, limit: i64) -> Result<Vec<MediaAsset>, AppError> {
        let query = format!(
            r#"
            SELECT {}
            FROM media
            WHERE kind = 'video' AND processing_status IN ('uploading', 'processing')
            ORDER BY created_at ASC, id ASC
            LIMIT $1
            "#,
            MEDIA_COLUMNS
        );
        let rows: Vec<MediaRow> = sqlx::query_as(&query)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        into_assets(rows)
    }
}
