//! Image uploads, direct-upload video tickets and linking existing videos.

use crate::auth::AuthSession;
use crate::constants::UPLOAD_FILE_FIELD;
use crate::error::{HttpAppError, ValidatedJson};
use crate::services::{ImageUpload, LinkVideoRequest, VideoUploadRequest};
use crate::state::MediaState;
use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use bytes::Bytes;
use quill_core::AppError;
use serde::Deserialize;

fn multipart_error(err: MultipartError) -> AppError {
    AppError::Validation(format!("Invalid multipart body: {}", err.body_text()))
}

/// `multipart/form-data` with a `file` part and optional `title` and `alt_text` parts.
#[tracing::instrument(skip_all, fields(user_id = session.context.user_id))]
pub async fn upload_image(
    State(media): State<MediaState>,
    session: AuthSession,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let mut file: Option<(String, String, Bytes)> = None;
    let mut title = None;
    let mut alt_text = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        match field.name() {
            Some(UPLOAD_FILE_FIELD) => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().unwrap_or_default().to_string();
                let data = field.bytes().await.map_err(multipart_error)?;
                file = Some((filename, content_type, data));
            }
            Some("title") => title = Some(field.text().await.map_err(multipart_error)?),
            Some("alt_text") => alt_text = Some(field.text().await.map_err(multipart_error)?),
            other => {
                tracing::debug!(field = ?other, "Ignoring unknown multipart field");
            }
        }
    }

    let (filename, content_type, data) = file.ok_or_else(|| {
        AppError::Validation(format!("Missing `{}` field", UPLOAD_FILE_FIELD))
    })?;

    let asset = media
        .ingestion
        .upload_image(
            &session.context,
            ImageUpload {
                filename,
                content_type,
                data,
                title,
                alt_text,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(asset)))
}

#[derive(Debug, Deserialize)]
pub struct VideoUploadBody {
    pub filename: String,
    /// Size of the file the client will send to the upload endpoint.
    pub size_bytes: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub max_duration_seconds: Option<u64>,
}

pub async fn request_video_upload(
    State(media): State<MediaState>,
    session: AuthSession,
    ValidatedJson(body): ValidatedJson<VideoUploadBody>,
) -> Result<impl IntoResponse, HttpAppError> {
    let ticket = media
        .ingestion
        .request_video_upload(
            &session.context,
            VideoUploadRequest {
                filename: body.filename,
                size_bytes: body.size_bytes,
                title: body.title,
                max_duration_secs: body.max_duration_seconds,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(ticket)))
}

#[derive(Debug, Deserialize)]
pub struct LinkVideoBody {
    pub external_uid: String,
    #[serde(default)]
    pub title: Option<String>,
}

pub async fn link_video(
    State(media): State<MediaState>,
    session: AuthSession,
    ValidatedJson(body): ValidatedJson<LinkVideoBody>,
) -> Result<impl IntoResponse, HttpAppError> {
    let asset = media
        .ingestion
        .link_existing_video(
            &session.context,
            LinkVideoRequest {
                external_uid: body.external_uid,
                title: body.title,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(asset)))
}
