//! Postgres in a throwaway container for repository tests.
//!
//! Needs a reachable Docker daemon; without one `setup_test_db` returns `None` and
//! the calling test returns early. Set `QUILL_REQUIRE_DOCKER=1` to fail instead.

use quill_core::models::{
    ImageFields, MediaKind, NewMediaAsset, NewUser, Role, User, VideoFields,
};
use quill_db::{UserRepository, UserStore, MIGRATOR};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use testcontainers_modules::postgres::Postgres;
use testcontainers_modules::testcontainers::runners::AsyncRunner;
use testcontainers_modules::testcontainers::ContainerAsync;

pub struct TestDb {
    pub pool: PgPool,
    pub _container: ContainerAsync<Postgres>,
}

pub async fn setup_test_db() -> Option<TestDb> {
    let container = match Postgres::default().start().await {
        Ok(container) => container,
        Err(e) => {
            if std::env::var("QUILL_REQUIRE_DOCKER").is_ok() {
                panic!("Failed to start Postgres container: {}", e);
            }
            eprintln!("Skipping Postgres test, Docker is unavailable: {}", e);
            return None;
        }
    };

    let host = container.get_host().await.expect("Failed to get container host");
    let port = container
        .get_host_port_ipv4(5432)
        .await
        .expect("Failed to get container port");
    let connection_string = format!("postgresql://postgres:postgres@{}:{}/postgres", host, port);

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&connection_string)
        .await
        .expect("Failed to connect to test database");

    MIGRATOR.run(&pool).await.expect("Failed to run migrations");

    Some(TestDb {
        pool,
        _container: container,
    })
}

pub async fn create_user(pool: &PgPool, email: &str) -> User {
    UserRepository::new(pool.clone())
        .create(NewUser {
            email: email.to_string(),
            password_hash: "100000:00:00".to_string(),
            role: Role::Author,
            is_active: true,
            is_approved: true,
        })
        .await
        .expect("Failed to create user")
}

pub fn image(owner_id: i64, path: &str) -> NewMediaAsset {
    NewMediaAsset {
        path: path.to_string(),
        filename: "photo.jpg".to_string(),
        mime_type: "image/jpeg".to_string(),
        size_bytes: 2048,
        title: "photo".to_string(),
        alt_text: None,
        owner_id,
        kind: MediaKind::Image(ImageFields {
            width: Some(2000),
            height: Some(1500),
            lat: Some(37.77),
            lon: Some(-122.41),
            date_taken: None,
        }),
    }
}

pub fn video(owner_id: i64, uid: &str) -> NewMediaAsset {
    NewMediaAsset {
        path: format!("videos/2026/01/{}", uid),
        filename: "clip.mp4".to_string(),
        mime_type: "video/mp4".to_string(),
        size_bytes: 0,
        title: "clip".to_string(),
        alt_text: None,
        owner_id,
        kind: MediaKind::Video(VideoFields::uploading(uid)),
    }
}
