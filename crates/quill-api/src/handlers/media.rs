use crate::auth::AuthSession;
use crate::error::{HttpAppError, ValidatedJson};
use crate::services::MediaStatus;
use crate::state::MediaState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use quill_core::models::{MediaAsset, MediaDetailsUpdate, MediaType, MediaUsage};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct ListMediaQuery {
    #[serde(default)]
    pub kind: Option<MediaType>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
}

pub async fn list_media(
    State(media): State<MediaState>,
    _session: AuthSession,
    Query(query): Query<ListMediaQuery>,
) -> Result<Json<Vec<MediaAsset>>, HttpAppError> {
    let assets = media
        .ingestion
        .list(query.kind, query.limit, query.offset)
        .await?;
    Ok(Json(assets))
}

pub async fn get_media(
    State(media): State<MediaState>,
    _session: AuthSession,
    Path(id): Path<i64>,
) -> Result<Json<MediaAsset>, HttpAppError> {
    Ok(Json(media.ingestion.get(id).await?))
}

pub async fn update_media(
    State(media): State<MediaState>,
    session: AuthSession,
    Path(id): Path<i64>,
    ValidatedJson(update): ValidatedJson<MediaDetailsUpdate>,
) -> Result<Json<MediaAsset>, HttpAppError> {
    let asset = media
        .ingestion
        .update_details(&session.context, id, update)
        .await?;
    Ok(Json(asset))
}

/// 409 while any article or page still points at the asset.
pub async fn delete_media(
    State(media): State<MediaState>,
    session: AuthSession,
    Path(id): Path<i64>,
) -> Result<StatusCode, HttpAppError> {
    media.usage.delete(&session.context, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn media_usage(
    State(media): State<MediaState>,
    _session: AuthSession,
    Path(id): Path<i64>,
) -> Result<Json<MediaUsage>, HttpAppError> {
    Ok(Json(media.usage.usage(id).await?))
}

/// Refresh a video's status from the transcoding service. Polled by the editor UI.
pub async fn reconcile_media(
    State(media): State<MediaState>,
    _session: AuthSession,
    Path(id): Path<i64>,
) -> Result<Json<MediaAsset>, HttpAppError> {
    Ok(Json(media.reconciler.reconcile_media(id).await?))
}

pub async fn media_status(
    State(media): State<MediaState>,
    _session: AuthSession,
    Path(id): Path<i64>,
) -> Result<Json<MediaStatus>, HttpAppError> {
    Ok(Json(media.ingestion.status(id).await?))
}
