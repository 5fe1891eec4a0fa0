use super::*;
use crate::auth::AuthContext;
use bytes::Bytes;
use quill_core::models::{ContentKind, MediaAsset, NewContent, NewUser, Role};
use quill_db::{MemoryStore, UserStore};
use quill_processing::fixtures::png_bytes;
use quill_services::MemoryTranscoder;
use quill_storage::MemoryStorage;
use std::time::Duration;

/// Services over in-memory backends, with one user per role.
pub(crate) struct Harness {
    pub store: Arc<MemoryStore>,
    pub storage: Arc<MemoryStorage>,
    pub transcoder: Arc<MemoryTranscoder>,
    pub limits: IngestionLimits,
    pub ingestion: IngestionService,
    pub reconciler: ReconcilerService,
    pub usage: UsageGuard,
    pub links: ContentLinks,
    pub author: AuthContext,
    pub other_author: AuthContext,
    pub editor: AuthContext,
    pub admin: AuthContext,
}

async fn user(store: &MemoryStore, email: &str, role: Role) -> AuthContext {
    let user = UserStore::create(
        store,
        NewUser {
            email: email.to_string(),
            password_hash: "1000:00:00".to_string(),
            role,
            is_active: true,
            is_approved: true,
        },
    )
    .await
    .unwrap();
    AuthContext::from(&user)
}

impl Harness {
    pub async fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let storage = Arc::new(MemoryStorage::new());
        let transcoder = Arc::new(MemoryTranscoder::new());
        let limits = IngestionLimits {
            max_image_size_bytes: 10 * 1024 * 1024,
            allowed_image_content_types: vec![
                "image/jpeg".to_string(),
                "image/png".to_string(),
                "image/gif".to_string(),
                "image/webp".to_string(),
            ],
            upload_ttl: Duration::from_secs(3600),
            max_video_duration_secs: 3600,
            max_video_upload_bytes: 1024 * 1024 * 1024,
        };

        let services = MediaServices::new(
            store.clone(),
            store.clone(),
            storage.clone(),
            transcoder.clone(),
            limits.clone(),
        );

        Self {
            author: user(&store, "author@example.com", Role::Author).await,
            other_author: user(&store, "other@example.com", Role::Author).await,
            editor: user(&store, "editor@example.com", Role::Editor).await,
            admin: user(&store, "admin@example.com", Role::Admin).await,
            store,
            storage,
            transcoder,
            limits,
            ingestion: services.ingestion,
            reconciler: services.reconciler,
            usage: services.usage,
            links: services.links,
        }
    }

    /// A 40x30 PNG owned by `author`.
    pub async fn upload_png(&self) -> MediaAsset {
        self.ingestion
            .upload_image(
                &self.author,
                ImageUpload {
                    filename: "square.png".to_string(),
                    content_type: "image/png".to_string(),
                    data: Bytes::from(png_bytes(40, 30)),
                    title: None,
                    alt_text: None,
                },
            )
            .await
            .unwrap()
    }

    pub async fn article(&self, author_id: i64, slug: &str) -> i64 {
        self.content(ContentKind::Article, Some(author_id), slug).await
    }

    pub async fn page(&self, slug: &str) -> i64 {
        self.content(ContentKind::Page, None, slug).await
    }

    async fn content(&self, kind: ContentKind, author_id: Option<i64>, slug: &str) -> i64 {
        let record = ContentStore::create(
            self.store.as_ref(),
            NewContent {
                kind,
                title: slug.to_string(),
                slug: slug.to_string(),
                author_id,
            },
        )
        .await
        .unwrap();
        record.reference.id
    }
}
