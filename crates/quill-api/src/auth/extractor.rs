//! Resolves the caller's session into an [`AuthContext`] for each request.

use crate::auth::gate::{require, AuthContext};
use crate::error::HttpAppError;
use crate::state::AuthState;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum::http::{header, HeaderMap};
use axum_extra::extract::CookieJar;
use quill_core::models::Role;

/// The session id from the session cookie, or from `Authorization: Bearer <id>`.
pub fn session_id_from_headers(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(cookie_name) {
        return Some(cookie.value().to_string());
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

/// An authenticated caller. Rejects with 401 when no valid session is presented.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub context: AuthContext,
    pub session_id: String,
}

impl<S> FromRequestParts<S> for AuthSession
where
    AuthState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth = AuthState::from_ref(state);
        let cookie_name = &auth.sessions.config().session_cookie_name;

        let session_id = session_id_from_headers(&parts.headers, cookie_name);
        let context = match &session_id {
            Some(id) => auth
                .sessions
                .resolve_session(id)
                .await?
                .map(|user| AuthContext::from(&user)),
            None => None,
        };

        // Every route behind this extractor needs at least an author.
        let context = require(context.as_ref(), Role::Author)?;

        Ok(AuthSession {
            context,
            session_id: session_id.unwrap_or_default(),
        })
    }
}
