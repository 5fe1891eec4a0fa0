//! Application state and sub-state extractors.
//!
//! Handlers extract only the sub-state they need via Axum's `FromRef`.

use crate::auth::SessionManager;
use crate::services::{IngestionLimits, MediaServices};
use quill_core::Config;
use quill_db::{
    ContentRepository, ContentStore, MediaRepository, MediaStore, SessionRepository, SessionStore,
    UserRepository, UserStore,
};
use quill_services::TranscodingService;
use quill_storage::Storage;
use sqlx::PgPool;
use std::sync::Arc;

/// Everything the services run against. Production wires the PostgreSQL repositories;
/// tests wire the in-memory store into every slot.
#[derive(Clone)]
pub struct Backends {
    pub media: Arc<dyn MediaStore>,
    pub users: Arc<dyn UserStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub content: Arc<dyn ContentStore>,
    pub storage: Arc<dyn Storage>,
    pub transcoder: Arc<dyn TranscodingService>,
    /// Used only by the health check.
    pub pool: Option<PgPool>,
}

impl Backends {
    pub fn postgres(
        pool: PgPool,
        storage: Arc<dyn Storage>,
        transcoder: Arc<dyn TranscodingService>,
    ) -> Self {
        Self {
            media: Arc::new(MediaRepository::new(pool.clone())),
            users: Arc::new(UserRepository::new(pool.clone())),
            sessions: Arc::new(SessionRepository::new(pool.clone())),
            content: Arc::new(ContentRepository::new(pool.clone())),
            storage,
            transcoder,
            pool: Some(pool),
        }
    }
}

#[derive(Clone)]
pub struct AuthState {
    pub sessions: SessionManager,
}

pub type MediaState = MediaServices;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub auth: AuthState,
    pub media: MediaState,
    pub storage: Arc<dyn Storage>,
    pub pool: Option<PgPool>,
}

impl AppState {
    pub fn new(config: Config, backends: Backends) -> Self {
        let sessions = SessionManager::new(
            backends.users.clone(),
            backends.sessions.clone(),
            config.auth().clone(),
        );
        let media = MediaServices::new(
            backends.media.clone(),
            backends.content.clone(),
            backends.storage.clone(),
            backends.transcoder.clone(),
            IngestionLimits::from_config(&config),
        );

        Self {
            config,
            auth: AuthState { sessions },
            media,
            storage: backends.storage,
            pool: backends.pool,
        }
    }
}

impl axum::extract::FromRef<Arc<AppState>> for AuthState {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.auth.clone()
    }
}

impl axum::extract::FromRef<Arc<AppState>> for MediaState {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.media.clone()
    }
}
