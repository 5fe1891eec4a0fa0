//! Test helpers: build AppState and router over in-memory backends.
//!
//! Run from workspace root: `cargo test -p quill-api`.

#![allow(dead_code)]

pub mod auth;
pub mod fixtures;

use axum_test::TestServer;
use quill_api::constants;
use quill_api::setup::routes;
use quill_api::state::{AppState, Backends};
use quill_core::models::{ContentKind, NewContent};
use quill_core::{AppConfig, AuthConfig, Config};
use quill_db::{ContentStore, MemoryStore};
use quill_services::MemoryTranscoder;
use quill_storage::MemoryStorage;
use std::sync::Arc;

/// API path prefix for tests (e.g. `/api/v1/media`).
pub fn api_path(path: &str) -> String {
    format!("{}{}", constants::API_PREFIX, path)
}

/// Test application: server plus handles on every backend for setup and assertions.
pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub store: Arc<MemoryStore>,
    pub storage: Arc<MemoryStorage>,
    pub transcoder: Arc<MemoryTranscoder>,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    pub async fn article(&self, author_id: i64, slug: &str) -> i64 {
        self.content(ContentKind::Article, Some(author_id), slug).await
    }

    pub async fn page(&self, slug: &str) -> i64 {
        self.content(ContentKind::Page, None, slug).await
    }

    async fn content(&self, kind: ContentKind, author_id: Option<i64>, slug: &str) -> i64 {
        ContentStore::create(
            self.store.as_ref(),
            NewContent {
                kind,
                title: slug.to_string(),
                slug: slug.to_string(),
                author_id,
            },
        )
        .await
        .expect("create content")
        .reference
        .id
    }
}

pub fn test_config() -> Config {
    Config::from(AppConfig {
        auth: AuthConfig {
            password_hash_iterations: 1_000,
            ..AuthConfig::default()
        },
        ..AppConfig::default()
    })
}

pub async fn setup_test_app() -> TestApp {
    let config = test_config();
    let store = Arc::new(MemoryStore::new());
    let storage = Arc::new(MemoryStorage::new());
    let transcoder = Arc::new(MemoryTranscoder::new());

    let backends = Backends {
        media: store.clone(),
        users: store.clone(),
        sessions: store.clone(),
        content: store.clone(),
        storage: storage.clone(),
        transcoder: transcoder.clone(),
        pool: None,
    };
    let state = Arc::new(AppState::new(config.clone(), backends));
    let app = routes::setup_routes(&config, state.clone()).expect("build router");
    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        state,
        store,
        storage,
        transcoder,
    }
}
