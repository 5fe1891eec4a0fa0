//! In-process implementation of every store, sharing one set of tables so that the
//! schema's unique and foreign-key rules can be enforced across them.

use super::content::ContentStore;
use super::media::MediaStore;
use super::session::SessionStore;
use super::user::UserStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quill_core::models::{
    ContentKind, ContentRecord, ContentRef, MediaAsset, MediaDetailsUpdate, MediaKind, MediaType,
    MediaUsage, NewContent, NewMediaAsset, NewSession, NewUser, ProcessingStatus, Session,
    SessionWithUser, User, VideoProcessingUpdate,
};
use quill_core::AppError;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

const REFERENCED_MESSAGE: &str = "Record is still referenced by another entity";

#[derive(Debug, Clone)]
struct ContentRow {
    title: String,
    slug: String,
    author_id: Option<i64>,
    media_id: Option<i64>,
}

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    sessions: HashMap<String, Session>,
    media: BTreeMap<i64, MediaAsset>,
    articles: BTreeMap<i64, ContentRow>,
    pages: BTreeMap<i64, ContentRow>,
    next_user_id: i64,
    next_media_id: i64,
    next_article_id: i64,
    next_page_id: i64,
}

impl Tables {
    fn content(&self, kind: ContentKind) -> &BTreeMap<i64, ContentRow> {
        match kind {
            ContentKind::Article => &self.articles,
            ContentKind::Page => &self.pages,
        }
    }

    fn content_mut(&mut self, kind: ContentKind) -> &mut BTreeMap<i64, ContentRow> {
        match kind {
            ContentKind::Article => &mut self.articles,
            ContentKind::Page => &mut self.pages,
        }
    }

    fn references(&self, kind: ContentKind, media_id: i64) -> Vec<ContentRef> {
        self.content(kind)
            .iter()
            .filter(|(_, row)| row.media_id == Some(media_id))
            .map(|(id, row)| ContentRef::new(kind, *id).with_title(row.title.clone()))
            .collect()
    }

    fn is_referenced(&self, media_id: i64) -> bool {
        self.articles
            .values()
            .chain(self.pages.values())
            .any(|row| row.media_id == Some(media_id))
    }
}

fn duplicate(field: &str) -> AppError {
    AppError::Duplicate {
        field: field.to_string(),
    }
}

fn missing_reference() -> AppError {
    AppError::Conflict("Referenced record does not exist".to_string())
}

/// Users, sessions, media and content in one process-local database.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn media_count(&self) -> usize {
        self.lock().media.len()
    }

    pub fn session_count(&self) -> usize {
        self.lock().sessions.len()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create(&self, new: NewUser) -> Result<User, AppError> {
        let mut tables = self.lock();
        if tables.users.values().any(|u| u.email == new.email) {
            return Err(duplicate("email"));
        }
        tables.next_user_id += 1;
        let user = User {
            id: tables.next_user_id,
            email: new.email,
            password_hash: new.password_hash,
            role: new.role,
            is_active: new.is_active,
            is_approved: new.is_approved,
            created_at: Utc::now(),
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get(&self, id: i64) -> Result<Option<User>, AppError> {
        Ok(self.lock().users.get(&id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .lock()
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn create(&self, new: NewSession) -> Result<Session, AppError> {
        let mut tables = self.lock();
        if !tables.users.contains_key(&new.user_id) {
            return Err(missing_reference());
        }
        if tables.sessions.contains_key(&new.id) {
            return Err(duplicate("id"));
        }
        let session = Session {
            id: new.id,
            user_id: new.user_id,
            ip_address: new.ip_address,
            user_agent: new.user_agent,
            created_at: Utc::now(),
            expires_at: new.expires_at,
        };
        tables.sessions.insert(session.id.clone(), session.clone());
        Ok(session)
    }

    async fn get_with_user(&self, id: &str) -> Result<Option<SessionWithUser>, AppError> {
        let tables = self.lock();
        Ok(tables.sessions.get(id).and_then(|session| {
            tables.users.get(&session.user_id).map(|user| SessionWithUser {
                session: session.clone(),
                user: user.clone(),
            })
        }))
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        Ok(self.lock().sessions.remove(id).is_some())
    }

    async fn delete_for_user(&self, user_id: i64) -> Result<u64, AppError> {
        let mut tables = self.lock();
        let before = tables.sessions.len();
        tables.sessions.retain(|_, s| s.user_id != user_id);
        Ok((before - tables.sessions.len()) as u64)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let mut tables = self.lock();
        let before = tables.sessions.len();
        tables.sessions.retain(|_, s| !s.is_expired_at(now));
        Ok((before - tables.sessions.len()) as u64)
    }
}

#[async_trait]
impl MediaStore for MemoryStore {
    async fn insert(&self, new: NewMediaAsset) -> Result<MediaAsset, AppError> {
        let mut tables = self.lock();
        if !tables.users.contains_key(&new.owner_id) {
            return Err(missing_reference());
        }
        if tables.media.values().any(|m| m.path == new.path) {
            return Err(duplicate("path"));
        }
        if let MediaKind::Video(video) = &new.kind {
            if tables
                .media
                .values()
                .any(|m| m.external_uid() == Some(video.external_uid.as_str()))
            {
                return Err(duplicate("external_uid"));
            }
        }

        tables.next_media_id += 1;
        let now = Utc::now();
        let asset = MediaAsset {
            id: tables.next_media_id,
            path: new.path,
            filename: new.filename,
            mime_type: new.mime_type,
            size_bytes: new.size_bytes,
            title: new.title,
            alt_text: new.alt_text,
            owner_id: new.owner_id,
            created_at: now,
            updated_at: now,
            kind: new.kind,
        };
        tables.media.insert(asset.id, asset.clone());
        Ok(asset)
    }

    async fn get(&self, id: i64) -> Result<Option<MediaAsset>, AppError> {
        Ok(self.lock().media.get(&id).cloned())
    }

    async fn get_by_external_uid(
        &self,
        external_uid: &str,
    ) -> Result<Option<MediaAsset>, AppError> {
        Ok(self
            .lock()
            .media
            .values()
            .find(|m| m.external_uid() == Some(external_uid))
            .cloned())
    }

    async fn list(
        &self,
        kind: Option<MediaType>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<MediaAsset>, AppError> {
        let tables = self.lock();
        let mut assets: Vec<MediaAsset> = tables
            .media
            .values()
            .filter(|m| kind.map_or(true, |k| m.media_type() == k))
            .cloned()
            .collect();
        assets.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(assets
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn update_details(
        &self,
        id: i64,
        update: &MediaDetailsUpdate,
    ) -> Result<Option<MediaAsset>, AppError> {
        let mut tables = self.lock();
        let Some(asset) = tables.media.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(title) = &update.title {
            asset.title = title.clone();
        }
        if let Some(alt_text) = &update.alt_text {
            asset.alt_text = Some(alt_text.clone()).filter(|text| !text.is_empty());
        }
        asset.updated_at = Utc::now();
        Ok(Some(asset.clone()))
    }

    async fn compare_and_set_status(
        &self,
        id: i64,
        expected: ProcessingStatus,
        update: &VideoProcessingUpdate,
    ) -> Result<Option<MediaAsset>, AppError> {
        let mut tables = self.lock();
        let Some(asset) = tables.media.get_mut(&id) else {
            return Ok(None);
        };
        let MediaKind::Video(video) = &mut asset.kind else {
            return Ok(None);
        };
        if video.processing_status != expected {
            return Ok(None);
        }
        update.apply_to(video);
        if let Some(size) = update.size_bytes {
            asset.size_bytes = size;
        }
        asset.updated_at = Utc::now();
        Ok(Some(asset.clone()))
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let mut tables = self.lock();
        if tables.is_referenced(id) {
            return Err(AppError::Conflict(REFERENCED_MESSAGE.to_string()));
        }
        Ok(tables.media.remove(&id).is_some())
    }

    async fn list_pending(&self, limit: i64) -> Result<Vec<MediaAsset>, AppError> {
        let tables = self.lock();
        let mut pending: Vec<MediaAsset> = tables
            .media
            .values()
            .filter(|m| {
                m.processing_status()
                    .is_some_and(|status| !status.is_terminal())
            })
            .cloned()
            .collect();
        pending.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
        pending.truncate(limit.max(0) as usize);
        Ok(pending)
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn create(&self, new: NewContent) -> Result<ContentRecord, AppError> {
        let mut tables = self.lock();
        if new.kind == ContentKind::Article {
            let author_id = new.author_id.ok_or_else(|| {
                AppError::Validation("Articles require an author".to_string())
            })?;
            if !tables.users.contains_key(&author_id) {
                return Err(missing_reference());
            }
        }
        if tables.content(new.kind).values().any(|c| c.slug == new.slug) {
            return Err(duplicate("slug"));
        }

        let id = match new.kind {
            ContentKind::Article => {
                tables.next_article_id += 1;
                tables.next_article_id
            }
            ContentKind::Page => {
                tables.next_page_id += 1;
                tables.next_page_id
            }
        };
        let author_id = match new.kind {
            ContentKind::Article => new.author_id,
            ContentKind::Page => None,
        };
        let row = ContentRow {
            title: new.title,
            slug: new.slug,
            author_id,
            media_id: None,
        };
        tables.content_mut(new.kind).insert(id, row.clone());

        Ok(ContentRecord {
            reference: ContentRef::new(new.kind, id).with_title(row.title),
            slug: row.slug,
            author_id: row.author_id,
            media_id: None,
        })
    }

    async fn get(&self, kind: ContentKind, id: i64) -> Result<Option<ContentRecord>, AppError> {
        Ok(self.lock().content(kind).get(&id).map(|row| ContentRecord {
            reference: ContentRef::new(kind, id).with_title(row.title.clone()),
            slug: row.slug.clone(),
            author_id: row.author_id,
            media_id: row.media_id,
        }))
    }

    async fn set_media(
        &self,
        kind: ContentKind,
        id: i64,
        media_id: Option<i64>,
    ) -> Result<bool, AppError> {
        let mut tables = self.lock();
        if !tables.content(kind).contains_key(&id) {
            return Ok(false);
        }
        if let Some(media_id) = media_id {
            if !tables.media.contains_key(&media_id) {
                return Err(missing_reference());
            }
        }
        if let Some(row) = tables.content_mut(kind).get_mut(&id) {
            row.media_id = media_id;
        }
        Ok(true)
    }

    async fn media_for(&self, kind: ContentKind, id: i64) -> Result<Option<MediaAsset>, AppError> {
        let tables = self.lock();
        Ok(tables
            .content(kind)
            .get(&id)
            .and_then(|row| row.media_id)
            .and_then(|media_id| tables.media.get(&media_id).cloned()))
    }

    async fn usage(&self, media_id: i64) -> Result<MediaUsage, AppError> {
        let tables = self.lock();
        Ok(MediaUsage {
            articles: tables.references(ContentKind::Article, media_id),
            pages: tables.references(ContentKind::Page, media_id),
        })
    }
}
