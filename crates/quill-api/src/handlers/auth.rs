//! Login, logout and the current session.

use crate::auth::{AuthContext, AuthSession};
use crate::error::{HttpAppError, ValidatedJson};
use crate::state::AuthState;
use crate::utils::ClientMeta;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use quill_core::AuthConfig;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

fn session_cookie(config: &AuthConfig, session_id: String) -> Cookie<'static> {
    Cookie::build((config.session_cookie_name.clone(), session_id))
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.secure_cookies)
        .path("/")
        .max_age(time::Duration::days(config.session_ttl_days))
        .build()
}

#[tracing::instrument(skip_all)]
pub async fn login(
    State(auth): State<AuthState>,
    meta: ClientMeta,
    jar: CookieJar,
    ValidatedJson(body): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let (session_id, user) = auth
        .sessions
        .login(&body.email, &body.password, meta.ip_address, meta.user_agent)
        .await?;

    tracing::info!(user_id = user.id, role = %user.role, "User signed in");
    let jar = jar.add(session_cookie(auth.sessions.config(), session_id));
    Ok((jar, Json(AuthContext::from(&user))))
}

pub async fn logout(
    State(auth): State<AuthState>,
    session: AuthSession,
    jar: CookieJar,
) -> Result<impl IntoResponse, HttpAppError> {
    auth.sessions.delete_session(&session.session_id).await?;
    tracing::info!(user_id = session.context.user_id, "User signed out");

    let name = auth.sessions.config().session_cookie_name.clone();
    let jar = jar.remove(Cookie::build(name).path("/"));
    Ok((jar, StatusCode::NO_CONTENT))
}

pub async fn me(session: AuthSession) -> Json<AuthContext> {
    Json(session.context)
}
