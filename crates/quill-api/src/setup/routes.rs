//! Route configuration and setup.

use crate::constants::{API_PREFIX, MULTIPART_OVERHEAD_BYTES};
use crate::handlers::{auth, content_media, health, media, media_upload};
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use quill_core::Config;
use quill_infra::request_id_middleware;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

const METHODS: [Method; 6] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
    Method::OPTIONS,
];

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config)?;
    let body_limit = config.max_image_size_bytes() + MULTIPART_OVERHEAD_BYTES;

    let api = Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route(
            "/media/images",
            post(media_upload::upload_image).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/media/videos/uploads", post(media_upload::request_video_upload))
        .route("/media/videos/link", post(media_upload::link_video))
        .route("/media", get(media::list_media))
        .route(
            "/media/{id}",
            get(media::get_media)
                .patch(media::update_media)
                .delete(media::delete_media),
        )
        .route("/media/{id}/usage", get(media::media_usage))
        .route("/media/{id}/status", get(media::media_status))
        .route("/media/{id}/reconcile", post(media::reconcile_media))
        .route(
            "/content/{kind}/{id}/media",
            put(content_media::attach_media)
                .delete(content_media::detach_media)
                .get(content_media::content_media),
        )
        .route("/health", get(health::health_check));

    let app = Router::new()
        .nest(API_PREFIX, api)
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(request_id_middleware))
        .with_state(state);

    Ok(app)
}

fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let cors = if config.cors_origins().iter().any(|o| o == "*") {
        tracing::warn!(
            "CORS configured to allow all origins; session cookies will not be sent cross-origin"
        );
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(METHODS)
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins()
            .iter()
            .map(|o| o.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| anyhow::anyhow!("Invalid CORS origin: {}", e))?;
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(METHODS)
            .allow_headers([
                header::CONTENT_TYPE,
                header::AUTHORIZATION,
                HeaderName::from_static("x-request-id"),
            ])
            .expose_headers([HeaderName::from_static("x-request-id")])
            .allow_credentials(true)
    };
    Ok(cors)
}
