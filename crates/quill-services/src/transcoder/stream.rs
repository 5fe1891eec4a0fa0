//! HTTP client for a Stream-style transcoding API.
//!
//! Endpoints live under `{api_url}/accounts/{account_id}/stream` and every JSON response
//! is wrapped in a `{ result, success, errors }` envelope. Upload tickets are tus
//! creation requests: the answer carries no body, only the upload URL in `Location` and
//! the job id in `stream-media-id`.

use super::{
    DirectUpload, DirectUploadRequest, JobDetails, JobState, TranscoderError, TranscoderResult,
    TranscodingService,
};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::Utc;
use quill_core::TranscoderConfig;
use reqwest::header::LOCATION;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::time::Duration;

const TUS_VERSION: &str = "1.0.0";
const MEDIA_ID_HEADER: &str = "stream-media-id";

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    result: Option<T>,
    #[serde(default)]
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct VideoDocument {
    uid: String,
    thumbnail: Option<String>,
    status: VideoStatus,
    duration: Option<f64>,
    size: Option<i64>,
    input: VideoInput,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct VideoStatus {
    state: String,
    error_reason_code: Option<String>,
    error_reason_text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct VideoInput {
    width: Option<i64>,
    height: Option<i64>,
}

/// The service reports unknown numbers as `-1`.
fn positive_i32(value: Option<i64>) -> Option<i32> {
    value.filter(|v| *v > 0).and_then(|v| i32::try_from(v).ok())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// tus `Upload-Metadata`: comma-separated `key base64(value)` pairs.
fn upload_metadata<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    pairs
        .into_iter()
        .map(|(key, value)| format!("{} {}", key, BASE64.encode(value)))
        .collect::<Vec<_>>()
        .join(",")
}

fn required_header(response: &Response, name: &str) -> TranscoderResult<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| TranscoderError::InvalidResponse(format!("missing {} header", name)))
}

pub struct StreamApiClient {
    client: Client,
    api_base: String,
    delivery_url: String,
    api_token: String,
}

impl StreamApiClient {
    pub fn new(config: &TranscoderConfig) -> TranscoderResult<Self> {
        if config.account_id.is_empty() {
            return Err(TranscoderError::Config(
                "TRANSCODER_ACCOUNT_ID not configured".to_string(),
            ));
        }
        if config.api_token.is_empty() {
            return Err(TranscoderError::Config(
                "TRANSCODER_API_TOKEN not configured".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TranscoderError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_base: format!(
                "{}/accounts/{}/stream",
                config.api_url.trim_end_matches('/'),
                config.account_id
            ),
            delivery_url: config.delivery_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
        })
    }

    fn endpoint(&self, suffix: &str) -> String {
        format!("{}/{}", self.api_base, suffix)
    }

    /// Turn a non-2xx response into an error carrying the body text.
    async fn error_for_status(response: Response) -> TranscoderError {
        let status = response.status();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        TranscoderError::Api {
            status: status.as_u16(),
            message: error_text,
        }
    }

    fn unwrap_envelope<T>(envelope: Envelope<T>) -> TranscoderResult<T> {
        if !envelope.success {
            let message = envelope
                .errors
                .iter()
                .map(|e| format!("{} ({})", e.message, e.code))
                .collect::<Vec<_>>()
                .join("; ");
            return Err(TranscoderError::InvalidResponse(format!(
                "request was not successful: {}",
                message
            )));
        }
        envelope
            .result
            .ok_or_else(|| TranscoderError::InvalidResponse("missing result".to_string()))
    }

    async fn parse_envelope<T: DeserializeOwned>(response: Response) -> TranscoderResult<T> {
        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| TranscoderError::InvalidResponse(e.to_string()))?;
        Self::unwrap_envelope(envelope)
    }

    fn job_from_document(&self, requested_uid: &str, raw: JsonValue) -> TranscoderResult<JobDetails> {
        let document: VideoDocument = serde_json::from_value(raw.clone())
            .map_err(|e| TranscoderError::InvalidResponse(e.to_string()))?;

        let external_uid = if document.uid.is_empty() {
            requested_uid.to_string()
        } else {
            document.uid
        };
        let error_reason = non_empty(document.status.error_reason_text)
            .or_else(|| non_empty(document.status.error_reason_code));
        let thumbnail_url =
            non_empty(document.thumbnail).or_else(|| Some(self.thumbnail_url(&external_uid)));

        Ok(JobDetails {
            state: JobState::parse(&document.status.state),
            duration_seconds: document.duration.filter(|d| d.is_finite() && *d >= 0.0),
            width: positive_i32(document.input.width),
            height: positive_i32(document.input.height),
            size_bytes: document.size.filter(|s| *s > 0),
            error_reason,
            thumbnail_url,
            raw,
            external_uid,
        })
    }
}

#[async_trait]
impl TranscodingService for StreamApiClient {
    #[tracing::instrument(
        skip(self, request),
        fields(max_duration = request.max_duration_secs, upload_length = request.upload_length)
    )]
    async fn create_direct_upload(
        &self,
        request: DirectUploadRequest,
    ) -> TranscoderResult<DirectUpload> {
        let ttl = chrono::Duration::from_std(request.ttl)
            .map_err(|e| TranscoderError::Config(format!("Invalid upload TTL: {}", e)))?;
        let expiry = (Utc::now() + ttl).to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
        let max_duration = request.max_duration_secs.to_string();

        let metadata = upload_metadata(
            [
                ("maxDurationSeconds", max_duration.as_str()),
                ("expiry", expiry.as_str()),
            ]
            .into_iter()
            .chain(request.meta.iter().map(|(k, v)| (k.as_str(), v.as_str()))),
        );

        let mut builder = self
            .client
            .post(&self.api_base)
            .query(&[("direct_user", "true")])
            .bearer_auth(&self.api_token)
            .header("Tus-Resumable", TUS_VERSION)
            .header("Upload-Length", request.upload_length.to_string())
            .header("Upload-Metadata", metadata);
        if let Some(creator) = &request.creator {
            builder = builder.header("Upload-Creator", creator);
        }

        let response = builder.send().await?;

        if !response.status().is_success() {
            let err = Self::error_for_status(response).await;
            tracing::error!(error = %err, "Direct upload request failed");
            return Err(err);
        }

        let upload_url = required_header(&response, LOCATION.as_str())?;
        let external_uid = required_header(&response, MEDIA_ID_HEADER)?;
        tracing::info!(external_uid = %external_uid, "Direct upload ticket issued");

        Ok(DirectUpload {
            upload_url,
            external_uid,
        })
    }

    #[tracing::instrument(skip(self))]
    async fn get_job_details(&self, external_uid: &str) -> TranscoderResult<Option<JobDetails>> {
        let response = self
            .client
            .get(self.endpoint(external_uid))
            .bearer_auth(&self.api_token)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!("Transcoding job not found");
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::error_for_status(response).await);
        }

        let raw: JsonValue = Self::parse_envelope(response).await?;
        let details = self.job_from_document(external_uid, raw)?;
        tracing::debug!(state = %details.state, "Fetched transcoding job");
        Ok(Some(details))
    }

    fn thumbnail_url(&self, external_uid: &str) -> String {
        format!(
            "{}/{}/thumbnails/thumbnail.jpg",
            self.delivery_url, external_uid
        )
    }

    fn playback_url(&self, external_uid: &str) -> String {
        format!("{}/{}/manifest/video.m3u8", self.delivery_url, external_uid)
    }

    #[tracing::instrument(skip(self))]
    async fn delete_job(&self, external_uid: &str) -> TranscoderResult<()> {
        let response = self
            .client
            .delete(self.endpoint(external_uid))
            .bearer_auth(&self.api_token)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(());
        }
        if !status.is_success() {
            return Err(Self::error_for_status(response).await);
        }

        tracing::info!("Transcoding job deleted");
        Ok(())
    }
}
