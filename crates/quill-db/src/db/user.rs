use async_trait::async_trait;
use quill_core::models::{NewUser, User};
use quill_core::AppError;
use sqlx::PgPool;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `AppError::Duplicate { field: "email" }` when the email is taken.
    async fn create(&self, new: NewUser) -> Result<User, AppError>;

    async fn get(&self, id: i64) -> Result<Option<User>, AppError>;

    /// Emails are stored lowercased; callers pass the normalized form.
    async fn get_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
}

#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for UserRepository {
    #[tracing::instrument(skip(self, new), fields(db.table = "users", db.operation = "insert", role = %new.role))]
    async fn create(&self, new: NewUser) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, role, is_active, is_approved)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, email, password_hash, role, is_active, is_approved, created_at
            "#,
        )
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(new.role)
        .bind(new.is_active)
        .bind(new.is_approved)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(user_id = user.id, "User created");
        Ok(user)
    }

    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "select"))]
    async fn get(&self, id: i64) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, role, is_active, is_approved, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    #[tracing::instrument(skip(self, email), fields(db.table = "users", db.operation = "select"))]
    async fn get_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, role, is_active, is_approved, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }
}
