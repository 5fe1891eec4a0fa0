use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quill_core::models::{NewSession, Role, Session, SessionWithUser, User};
use quill_core::AppError;
use sqlx::{FromRow, PgPool};

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create(&self, new: NewSession) -> Result<Session, AppError>;

    /// The session joined to its user, regardless of expiry.
    async fn get_with_user(&self, id: &str) -> Result<Option<SessionWithUser>, AppError>;

    async fn delete(&self, id: &str) -> Result<bool, AppError>;

    async fn delete_for_user(&self, user_id: i64) -> Result<u64, AppError>;

    /// Remove every session with `expires_at <= now`.
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError>;
}

#[derive(FromRow)]
struct SessionUserRow {
    session_id: String,
    user_id: i64,
    ip_address: Option<String>,
    user_agent: Option<String>,
    session_created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    email: String,
    password_hash: String,
    role: Role,
    is_active: bool,
    is_approved: bool,
    user_created_at: DateTime<Utc>,
}

impl From<SessionUserRow> for SessionWithUser {
    fn from(row: SessionUserRow) -> Self {
        SessionWithUser {
            session: Session {
                id: row.session_id,
                user_id: row.user_id,
                ip_address: row.ip_address,
                user_agent: row.user_agent,
                created_at: row.session_created_at,
                expires_at: row.expires_at,
            },
            user: User {
                id: row.user_id,
                email: row.email,
                password_hash: row.password_hash,
                role: row.role,
                is_active: row.is_active,
                is_approved: row.is_approved,
                created_at: row.user_created_at,
            },
        }
    }
}

#[derive(Clone)]
pub struct SessionRepository {
    pool: PgPool,
}

impl SessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for SessionRepository {
    #[tracing::instrument(skip(self, new), fields(db.table = "sessions", db.operation = "insert", user_id = new.user_id))]
    async fn create(&self, new: NewSession) -> Result<Session, AppError> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (id, user_id, ip_address, user_agent, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, ip_address, user_agent, created_at, expires_at
            "#,
        )
        .bind(&new.id)
        .bind(new.user_id)
        .bind(&new.ip_address)
        .bind(&new.user_agent)
        .bind(new.expires_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(session)
    }

    #[tracing::instrument(skip(self, id), fields(db.table = "sessions", db.operation = "select"))]
    async fn get_with_user(&self, id: &str) -> Result<Option<SessionWithUser>, AppError> {
        let row = sqlx::query_as::<_, SessionUserRow>(
            r#"
            SELECT s.id AS session_id, s.user_id, s.ip_address, s.user_agent,
                   s.created_at AS session_created_at, s.expires_at,
                   u.email, u.password_hash, u.role, u.is_active, u.is_approved,
                   u.created_at AS user_created_at
            FROM sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(SessionWithUser::from))
    }

    #[tracing::instrument(skip(self, id), fields(db.table = "sessions", db.operation = "delete"))]
    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self), fields(db.table = "sessions", db.operation = "delete"))]
    async fn delete_for_user(&self, user_id: i64) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM sessions WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    #[tracing::instrument(skip(self), fields(db.table = "sessions", db.operation = "delete"))]
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?;
        let removed = result.rows_affected();
        if removed > 0 {
            tracing::info!(removed, "Expired sessions removed");
        }
        Ok(removed)
    }
}
