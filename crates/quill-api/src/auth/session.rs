//! Server-side sessions.
//!
//! A session id is 32 random bytes, hex-encoded, and is the only credential the client
//! holds. Expiry is absolute: sessions are never renewed, and an expired session is
//! deleted the first time it is looked up (or by the periodic sweep).

use crate::auth::password::{hash_password, verify_password};
use chrono::{Duration, Utc};
use quill_core::constants::{SESSION_ID_BYTES, SESSION_ID_HEX_LEN};
use quill_core::models::{NewSession, NewUser, Role, User};
use quill_core::{AppError, AuthConfig};
use quill_db::{SessionStore, UserStore};
use rand::RngCore;
use std::sync::Arc;

const INVALID_CREDENTIALS: &str = "Invalid email or password";
const MIN_PASSWORD_LENGTH: usize = 8;

/// Values for creating an account.
#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub role: Role,
    pub is_active: bool,
    pub is_approved: bool,
}

fn generate_session_id() -> String {
    let mut bytes = [0u8; SESSION_ID_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Ids are exactly 64 lowercase hex characters.
pub fn is_valid_session_id(id: &str) -> bool {
    id.len() == SESSION_ID_HEX_LEN
        && id
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Clone)]
pub struct SessionManager {
    users: Arc<dyn UserStore>,
    sessions: Arc<dyn SessionStore>,
    config: AuthConfig,
    /// Verified against when the email is unknown, so timing does not reveal accounts.
    dummy_hash: Arc<str>,
}

impl SessionManager {
    pub fn new(
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionStore>,
        config: AuthConfig,
    ) -> Self {
        let dummy_hash =
            hash_password("quill-placeholder-password", config.password_hash_iterations);
        Self {
            users,
            sessions,
            config,
            dummy_hash: Arc::from(dummy_hash),
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[tracing::instrument(skip(self, ip_address, user_agent))]
    pub async fn create_session(
        &self,
        user_id: i64,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> Result<String, AppError> {
        let session = self
            .sessions
            .create(NewSession {
                id: generate_session_id(),
                user_id,
                ip_address,
                user_agent,
                expires_at: Utc::now() + Duration::days(self.config.session_ttl_days),
            })
            .await?;

        tracing::info!(user_id, expires_at = %session.expires_at, "Session created");
        Ok(session.id)
    }

    /// The user behind a session, if the session exists, has not expired and the
    /// account may still sign in.
    pub async fn resolve_session(&self, session_id: &str) -> Result<Option<User>, AppError> {
        if !is_valid_session_id(session_id) {
            return Ok(None);
        }

        let Some(found) = self.sessions.get_with_user(session_id).await? else {
            return Ok(None);
        };

        if found.session.is_expired_at(Utc::now()) {
            self.sessions.delete(session_id).await?;
            tracing::debug!(user_id = found.user.id, "Expired session removed on lookup");
            return Ok(None);
        }

        if !found.user.can_sign_in() {
            return Ok(None);
        }

        Ok(Some(found.user))
    }

    pub async fn delete_session(&self, session_id: &str) -> Result<bool, AppError> {
        if !is_valid_session_id(session_id) {
            return Ok(false);
        }
        self.sessions.delete(session_id).await
    }

    pub async fn delete_all_sessions(&self, user_id: i64) -> Result<u64, AppError> {
        let removed = self.sessions.delete_for_user(user_id).await?;
        tracing::info!(user_id, removed, "All sessions revoked");
        Ok(removed)
    }

    pub async fn sweep_expired(&self) -> Result<u64, AppError> {
        self.sessions.delete_expired(Utc::now()).await
    }

    /// Check credentials and open a session. Every failure reports the same message.
    #[tracing::instrument(skip_all)]
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> Result<(String, User), AppError> {
        let user = self.users.get_by_email(&normalize_email(email)).await?;

        let stored = match &user {
            Some(user) => user.password_hash.clone(),
            None => self.dummy_hash.to_string(),
        };
        let matches = verify_blocking(password.to_string(), stored).await?;

        let user = match user {
            Some(user) if matches && user.can_sign_in() => user,
            _ => {
                tracing::debug!("Login rejected");
                return Err(AppError::Unauthenticated(INVALID_CREDENTIALS.to_string()));
            }
        };

        let session_id = self
            .create_session(user.id, ip_address, user_agent)
            .await?;
        Ok((session_id, user))
    }

    /// Create an account. A taken email fails with a conflict naming `email`.
    #[tracing::instrument(skip_all, fields(role = %registration.role))]
    pub async fn register(&self, registration: Registration) -> Result<User, AppError> {
        let email = normalize_email(&registration.email);
        if email.is_empty() || !email.contains('@') {
            return Err(AppError::Validation("A valid email is required".to_string()));
        }
        if registration.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AppError::Validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }

        let iterations = self.config.password_hash_iterations;
        let password = registration.password;
        let password_hash =
            tokio::task::spawn_blocking(move || hash_password(&password, iterations))
                .await
                .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))?;

        self.users
            .create(NewUser {
                email,
                password_hash,
                role: registration.role,
                is_active: registration.is_active,
                is_approved: registration.is_approved,
            })
            .await
    }
}

async fn verify_blocking(password: String, stored: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &stored))
        .await
        .map_err(|e| AppError::Internal(format!("Password verification task failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_db::MemoryStore;

    fn test_config() -> AuthConfig {
        AuthConfig {
            password_hash_iterations: 1_000,
            ..AuthConfig::default()
        }
    }

    fn manager(store: &Arc<MemoryStore>) -> SessionManager {
        SessionManager::new(store.clone(), store.clone(), test_config())
    }

    async fn register(manager: &SessionManager, email: &str, approved: bool) -> User {
        manager
            .register(Registration {
                email: email.to_string(),
                password: "s3cret-password".to_string(),
                role: Role::Author,
                is_active: true,
                is_approved: approved,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_login_and_resolve() {
        let store = Arc::new(MemoryStore::new());
        let manager = manager(&store);
        let user = register(&manager, "Writer@Example.com", true).await;
        assert_eq!(user.email, "writer@example.com");

        let (session_id, logged_in) = manager
            .login("writer@example.com", "s3cret-password", Some("10.0.0.1".into()), None)
            .await
            .unwrap();
        assert_eq!(logged_in.id, user.id);
        assert!(is_valid_session_id(&session_id));
        assert_eq!(session_id.len(), SESSION_ID_HEX_LEN);

        let resolved = manager.resolve_session(&session_id).await.unwrap().unwrap();
        assert_eq!(resolved.id, user.id);

        assert!(manager.delete_session(&session_id).await.unwrap());
        assert!(manager.resolve_session(&session_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_login_failures_share_one_message() {
        let store = Arc::new(MemoryStore::new());
        let manager = manager(&store);
        register(&manager, "approved@example.com", true).await;
        register(&manager, "pending@example.com", false).await;

        let attempts = [
            ("nobody@example.com", "s3cret-password"),
            ("approved@example.com", "wrong-password"),
            ("pending@example.com", "s3cret-password"),
        ];
        for (email, password) in attempts {
            let err = manager.login(email, password, None, None).await.unwrap_err();
            assert!(matches!(err, AppError::Unauthenticated(ref msg) if msg == INVALID_CREDENTIALS));
        }
        assert_eq!(store.session_count(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store = Arc::new(MemoryStore::new());
        let manager = manager(&store);
        register(&manager, "a@example.com", true).await;

        let err = manager
            .register(Registration {
                email: " A@example.com ".to_string(),
                password: "another-password".to_string(),
                role: Role::Editor,
                is_active: true,
                is_approved: true,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Duplicate { ref field } if field == "email"));
    }

    #[tokio::test]
    async fn test_expired_session_is_deleted_on_lookup() {
        let store = Arc::new(MemoryStore::new());
        let manager = manager(&store);
        let user = register(&manager, "a@example.com", true).await;

        let expired_id = "ab".repeat(32);
        SessionStore::create(
            store.as_ref(),
            NewSession {
                id: expired_id.clone(),
                user_id: user.id,
                ip_address: None,
                user_agent: None,
                expires_at: Utc::now() - Duration::seconds(1),
            },
        )
        .await
        .unwrap();
        assert_eq!(store.session_count(), 1);

        assert!(manager.resolve_session(&expired_id).await.unwrap().is_none());
        assert_eq!(store.session_count(), 0);
        // Still gone on the next lookup.
        assert!(manager.resolve_session(&expired_id).await.unwrap().is_none());
    }

    #[test]
    fn test_session_id_shape() {
        assert_eq!(generate_session_id().len(), SESSION_ID_HEX_LEN);
        assert!(is_valid_session_id(&"0f".repeat(SESSION_ID_HEX_LEN / 2)));
        assert!(!is_valid_session_id(&"0f".repeat(SESSION_ID_BYTES)[1..]));
        assert!(!is_valid_session_id(&"0F".repeat(SESSION_ID_BYTES)));
    }

    #[tokio::test]
    async fn test_malformed_ids_resolve_to_none() {
        let store = Arc::new(MemoryStore::new());
        let manager = manager(&store);
        let ids = vec![
            String::new(),
            "abc".to_string(),
            "AB".repeat(32),
            "zz".repeat(32),
            "a".repeat(65),
        ];
        for id in &ids {
            assert!(manager.resolve_session(id).await.unwrap().is_none());
        }
    }

    #[tokio::test]
    async fn test_sweep_and_revoke_all() {
        let store = Arc::new(MemoryStore::new());
        let manager = manager(&store);
        let user = register(&manager, "a@example.com", true).await;

        manager.create_session(user.id, None, None).await.unwrap();
        manager.create_session(user.id, None, None).await.unwrap();
        SessionStore::create(
            store.as_ref(),
            NewSession {
                id: "cd".repeat(32),
                user_id: user.id,
                ip_address: None,
                user_agent: None,
                expires_at: Utc::now() - Duration::hours(1),
            },
        )
        .await
        .unwrap();

        assert_eq!(manager.sweep_expired().await.unwrap(), 1);
        assert_eq!(manager.delete_all_sessions(user.id).await.unwrap(), 2);
        assert_eq!(store.session_count(), 0);
    }

    #[tokio::test]
    async fn test_short_password_rejected() {
        let store = Arc::new(MemoryStore::new());
        let manager = manager(&store);
        let err = manager
            .register(Registration {
                email: "a@example.com".to_string(),
                password: "short".to_string(),
                role: Role::Author,
                is_active: true,
                is_approved: true,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
