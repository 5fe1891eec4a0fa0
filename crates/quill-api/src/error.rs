//! HTTP error response conversion
//!
//! Handlers return `Result<impl IntoResponse, HttpAppError>`. Anything convertible into
//! `AppError` becomes an `HttpAppError` via `?`, and renders with the status, body and
//! log level the error describes through `ErrorMetadata`.

use axum::{
    extract::rejection::JsonRejection,
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use quill_core::{AppError, ErrorMetadata, LogLevel};
use quill_infra::ErrorResponse;
use quill_services::TranscoderError;
use quill_storage::StorageError;
use serde::de::DeserializeOwned;

/// Wrapper around `AppError` so it can implement `IntoResponse` (orphan rules).
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<anyhow::Error> for HttpAppError {
    fn from(err: anyhow::Error) -> Self {
        HttpAppError(AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        })
    }
}

impl From<StorageError> for HttpAppError {
    fn from(err: StorageError) -> Self {
        HttpAppError(AppError::from(err))
    }
}

impl From<TranscoderError> for HttpAppError {
    fn from(err: TranscoderError) -> Self {
        HttpAppError(AppError::from(err))
    }
}

/// JSON body deserialization failures become a 400 in the standard error shape.
impl From<JsonRejection> for HttpAppError {
    fn from(rejection: JsonRejection) -> Self {
        HttpAppError(AppError::Validation(format!(
            "Invalid request body: {}",
            rejection.body_text()
        )))
    }
}

/// JSON body extractor that rejects with our `ErrorResponse` format instead of axum's
/// plain-text rejection.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = HttpAppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(inner) = Json::<T>::from_request(req, state)
            .await
            .map_err(HttpAppError::from)?;
        Ok(ValidatedJson(inner))
    }
}

fn log_error(error: &AppError) {
    let kind = error.kind().as_str();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, kind, "Request rejected");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, kind, "Request failed");
        }
        LogLevel::Error => {
            tracing::error!(error = %error.detailed_message(), kind, "Request failed");
        }
    }
}

fn is_production_env() -> bool {
    std::env::var("ENVIRONMENT")
        .or_else(|_| std::env::var("APP_ENV"))
        .map(|env| env.to_lowercase() == "production" || env.to_lowercase() == "prod")
        .unwrap_or(false)
}

/// Body for an error. Sensitive errors, and every error in production, only carry the
/// client message.
pub fn error_body(error: &AppError) -> ErrorResponse {
    let message = if is_production_env() || error.is_sensitive() {
        error.client_message()
    } else {
        error.to_string()
    };

    ErrorResponse {
        error: message,
        code: error.error_code().to_string(),
        kind: error.kind().as_str().to_string(),
        recoverable: error.is_recoverable(),
        suggested_action: error.suggested_action().map(String::from),
    }
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let app_error = &self.0;
        let status = StatusCode::from_u16(app_error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(app_error);

        (status, Json(error_body(app_error))).into_response()
    }
}
