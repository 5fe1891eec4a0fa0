//! `/content/{kind}/{id}/media`: the featured asset of an article or page.

use crate::auth::AuthSession;
use crate::error::{HttpAppError, ValidatedJson};
use crate::state::MediaState;
use axum::{
    extract::{Path, State},
    Json,
};
use quill_core::models::{ContentKind, ContentRecord, ContentRef, MediaSummary};
use serde::Deserialize;

fn target(kind: &str, id: i64) -> Result<ContentRef, HttpAppError> {
    let kind: ContentKind = kind.parse()?;
    Ok(ContentRef::new(kind, id))
}

#[derive(Debug, Deserialize)]
pub struct AttachMediaBody {
    pub media_id: i64,
}

pub async fn attach_media(
    State(media): State<MediaState>,
    session: AuthSession,
    Path((kind, id)): Path<(String, i64)>,
    ValidatedJson(body): ValidatedJson<AttachMediaBody>,
) -> Result<Json<ContentRecord>, HttpAppError> {
    let target = target(&kind, id)?;
    let record = media
        .links
        .attach(&session.context, &target, body.media_id)
        .await?;
    Ok(Json(record))
}

pub async fn detach_media(
    State(media): State<MediaState>,
    session: AuthSession,
    Path((kind, id)): Path<(String, i64)>,
) -> Result<Json<ContentRecord>, HttpAppError> {
    let target = target(&kind, id)?;
    Ok(Json(media.links.detach(&session.context, &target).await?))
}

/// `null` when nothing is attached.
pub async fn content_media(
    State(media): State<MediaState>,
    _session: AuthSession,
    Path((kind, id)): Path<(String, i64)>,
) -> Result<Json<Option<MediaSummary>>, HttpAppError> {
    let target = target(&kind, id)?;
    Ok(Json(media.links.media_for(&target).await?))
}
