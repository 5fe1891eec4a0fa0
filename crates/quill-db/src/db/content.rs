use async_trait::async_trait;
use quill_core::models::{
    ContentKind, ContentRecord, ContentRef, MediaAsset, MediaRow, MediaUsage, NewContent,
};
use quill_core::AppError;
use sqlx::{FromRow, PgPool};

use super::media::MEDIA_COLUMNS;

/// The media-facing side of articles and pages: their media foreign key and the
/// usage counts derived from it.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn create(&self, new: NewContent) -> Result<ContentRecord, AppError>;

    async fn get(&self, kind: ContentKind, id: i64) -> Result<Option<ContentRecord>, AppError>;

    /// Set or clear the media reference. Returns `false` when the entity does not exist.
    /// A `media_id` with no matching asset fails with `AppError::Conflict`.
    async fn set_media(
        &self,
        kind: ContentKind,
        id: i64,
        media_id: Option<i64>,
    ) -> Result<bool, AppError>;

    /// The asset an entity points at, if any.
    async fn media_for(&self, kind: ContentKind, id: i64) -> Result<Option<MediaAsset>, AppError>;

    /// Every entity currently referencing `media_id`, ordered by id.
    async fn usage(&self, media_id: i64) -> Result<MediaUsage, AppError>;
}

#[derive(FromRow)]
struct ContentRow {
    id: i64,
    title: String,
    slug: String,
    author_id: Option<i64>,
    media_id: Option<i64>,
}

impl ContentRow {
    fn into_record(self, kind: ContentKind) -> ContentRecord {
        ContentRecord {
            reference: ContentRef::new(kind, self.id).with_title(self.title),
            slug: self.slug,
            author_id: self.author_id,
            media_id: self.media_id,
        }
    }
}

#[derive(FromRow)]
struct ReferenceRow {
    id: i64,
    title: String,
}

fn select_columns(kind: ContentKind) -> &'static str {
    match kind {
        ContentKind::Article => "id, title, slug, author_id, media_id",
        ContentKind::Page => "id, title, slug, NULL::BIGINT AS author_id, media_id",
    }
}

#[derive(Clone)]
pub struct ContentRepository {
    pool: PgPool,
}

impl ContentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn references(
        &self,
        kind: ContentKind,
        media_id: i64,
    ) -> Result<Vec<ContentRef>, AppError> {
        let query = format!(
            "SELECT id, title FROM {} WHERE media_id = $1 ORDER BY id",
            kind.table()
        );
        let rows: Vec<ReferenceRow> = sqlx::query_as(&query)
            .bind(media_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|r| ContentRef::new(kind, r.id).with_title(r.title))
            .collect())
    }
}

#[async_trait]
impl ContentStore for ContentRepository {
    #[tracing::instrument(skip(self, new), fields(db.table = %new.kind.table(), db.operation = "insert"))]
    async fn create(&self, new: NewContent) -> Result<ContentRecord, AppError> {
        let row: ContentRow = match new.kind {
            ContentKind::Article => {
                let author_id = new.author_id.ok_or_else(|| {
                    AppError::Validation("Articles require an author".to_string())
                })?;
                sqlx::query_as(
                    r#"
                    INSERT INTO articles (title, slug, author_id)
                    VALUES ($1, $2, $3)
                    RETURNING id, title, slug, author_id, media_id
                    "#,
                )
                .bind(&new.title)
                .bind(&new.slug)
                .bind(author_id)
                .fetch_one(&self.pool)
                .await?
            }
            ContentKind::Page => {
                sqlx::query_as(
                    r#"
                    INSERT INTO pages (title, slug)
                    VALUES ($1, $2)
                    RETURNING id, title, slug, NULL::BIGINT AS author_id, media_id
                    "#,
                )
                .bind(&new.title)
                .bind(&new.slug)
                .fetch_one(&self.pool)
                .await?
            }
        };
        Ok(row.into_record(new.kind))
    }

    #[tracing::instrument(skip(self), fields(db.table = %kind.table(), db.operation = "select"))]
    async fn get(&self, kind: ContentKind, id: i64) -> Result<Option<ContentRecord>, AppError> {
        let query = format!(
            "SELECT {} FROM {} WHERE id = $1",
            select_columns(kind),
            kind.table()
        );
        let row: Option<ContentRow> = sqlx::query_as(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.into_record(kind)))
    }

    #[tracing::instrument(skip(self), fields(db.table = %kind.table(), db.operation = "update"))]
    async fn set_media(
        &self,
        kind: ContentKind,
        id: i64,
        media_id: Option<i64>,
    ) -> Result<bool, AppError> {
        let query = format!("UPDATE {} SET media_id = $2 WHERE id = $1", kind.table());
        let result = sqlx::query(&query)
            .bind(id)
            .bind(media_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self), fields(db.table = "media", db.operation = "select"))]
    async fn media_for(&self, kind: ContentKind, id: i64) -> Result<Option<MediaAsset>, AppError> {
        let columns = MEDIA_COLUMNS
            .split(',')
            .map(|c| format!("m.{}", c.trim()))
            .collect::<Vec<_>>()
            .join(", ");
        let query = format!(
            "SELECT {} FROM media m JOIN {} c ON c.media_id = m.id WHERE c.id = $1",
            columns,
            kind.table()
        );
        let row: Option<MediaRow> = sqlx::query_as(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(MediaAsset::try_from).transpose()
    }

    #[tracing::instrument(skip(self), fields(db.operation = "select"))]
    async fn usage(&self, media_id: i64) -> Result<MediaUsage, AppError> {
        Ok(MediaUsage {
            articles: self.references(ContentKind::Article, media_id).await?,
            pages: self.references(ContentKind::Page, media_id).await?,
        })
    }
}
