//! End-to-end media scenarios over HTTP.
//!
//! Run with: `cargo test -p quill-api --test media_lifecycle_test`

mod helpers;

use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use helpers::auth::{create_user, TestUser};
use helpers::{api_path, fixtures, setup_test_app};
use quill_core::models::Role;
use quill_services::JobState;
use serde_json::{json, Value};

#[tokio::test]
async fn test_image_upload_attach_and_guarded_delete() {
    let app = setup_test_app().await;
    let client = app.client();
    let author = create_user(&app, "author@example.com", Role::Author).await;
    let editor = create_user(&app, "editor@example.com", Role::Editor).await;

    let part = Part::bytes(bytes::Bytes::from(fixtures::photo_jpeg()))
        .file_name("photo.jpg")
        .mime_type("image/jpeg");
    let form = MultipartForm::new()
        .add_part("file", part)
        .add_text("alt_text", "Golden Gate at dusk");
    let response = client
        .post(&api_path("/media/images"))
        .add_header("Authorization", author.bearer())
        .multipart(form)
        .await;
    assert_eq!(response.status_code(), 201);

    let asset: Value = response.json();
    let media_id = asset["id"].as_i64().unwrap();
    let path = asset["path"].as_str().unwrap().to_string();
    assert_eq!(asset["kind"], "image");
    assert_eq!(asset["width"], 2000);
    assert_eq!(asset["height"], 1500);
    assert!((asset["lat"].as_f64().unwrap() - 37.77).abs() < 1e-6);
    assert!((asset["lon"].as_f64().unwrap() + 122.41).abs() < 1e-6);
    assert_eq!(asset["owner_id"], author.id);
    assert_eq!(asset["alt_text"], "Golden Gate at dusk");
    assert!(asset.get("processing_status").is_none());
    assert!(app.storage.contains(&path));

    let article = app.article(author.id, "bridges").await;
    let response = client
        .put(&api_path(&format!("/content/articles/{}/media", article)))
        .add_header("Authorization", author.bearer())
        .json(&json!({ "media_id": media_id }))
        .await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.json::<Value>()["media_id"], media_id);

    let response = client
        .get(&api_path(&format!("/content/article/{}/media", article)))
        .add_header("Authorization", author.bearer())
        .await;
    assert_eq!(response.status_code(), 200);
    let summary: Value = response.json();
    assert_eq!(summary["id"], media_id);
    assert_eq!(summary["width"], 2000);

    let response = client
        .delete(&api_path(&format!("/media/{}", media_id)))
        .add_header("Authorization", editor.bearer())
        .await;
    assert_eq!(response.status_code(), 409);
    let body: Value = response.json();
    assert_eq!(body["code"], "MEDIA_IN_USE");
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains(&format!("article {}", article)));

    let response = client
        .get(&api_path(&format!("/media/{}/usage", media_id)))
        .add_header("Authorization", editor.bearer())
        .await;
    assert_eq!(response.json::<Value>()["articles"][0]["id"], article);

    let response = client
        .delete(&api_path(&format!("/content/articles/{}/media", article)))
        .add_header("Authorization", author.bearer())
        .await;
    assert_eq!(response.status_code(), 200);
    assert!(response.json::<Value>()["media_id"].is_null());

    let response = client
        .delete(&api_path(&format!("/media/{}", media_id)))
        .add_header("Authorization", editor.bearer())
        .await;
    assert_eq!(response.status_code(), 204);
    assert!(!app.storage.contains(&path));

    let response = client
        .get(&api_path(&format!("/media/{}", media_id)))
        .add_header("Authorization", editor.bearer())
        .await;
    assert_eq!(response.status_code(), 404);
}

async fn reconcile(client: &TestServer, user: &TestUser, media_id: i64) -> Value {
    let response = client
        .post(&api_path(&format!("/media/{}/reconcile", media_id)))
        .add_header("Authorization", user.bearer())
        .await;
    assert_eq!(response.status_code(), 200);
    response.json::<Value>()
}

#[tokio::test]
async fn test_video_ticket_reconciles_to_ready() {
    let app = setup_test_app().await;
    let client = app.client();
    let author = create_user(&app, "author@example.com", Role::Author).await;

    let response = client
        .post(&api_path("/media/videos/uploads"))
        .add_header("Authorization", author.bearer())
        .json(&json!({ "filename": "interview.mp4", "size_bytes": 48_000_000 }))
        .await;
    assert_eq!(response.status_code(), 201);
    let ticket: Value = response.json();
    let media_id = ticket["media_id"].as_i64().unwrap();
    let uid = ticket["external_uid"].as_str().unwrap().to_string();
    assert!(!ticket["upload_endpoint"].as_str().unwrap().is_empty());
    assert_eq!(app.transcoder.issued_requests()[0].upload_length, 48_000_000);

    let response = client
        .get(&api_path(&format!("/media/{}/status", media_id)))
        .add_header("Authorization", author.bearer())
        .await;
    let status: Value = response.json();
    assert_eq!(status["processing_status"], "uploading");
    assert_eq!(status["ready"], false);

    app.transcoder.set_state(&uid, JobState::InProgress);
    let processing = reconcile(client, &author, media_id).await;
    assert_eq!(processing["processing_status"], "processing");

    app.transcoder.finish(&uid, 42.0, 1920, 1080, 48_000_000);
    let ready = reconcile(client, &author, media_id).await;
    assert_eq!(ready["processing_status"], "ready");
    assert_eq!(ready["duration_seconds"], 42.0);
    assert!(ready["thumbnail_url"].as_str().is_some());

    // Terminal: later reconciles write nothing.
    let again = reconcile(client, &author, media_id).await;
    assert_eq!(again["updated_at"], ready["updated_at"]);
    assert_eq!(again, ready);
}

#[tokio::test]
async fn test_link_existing_video_rejects_duplicates() {
    let app = setup_test_app().await;
    let client = app.client();
    let author = create_user(&app, "author@example.com", Role::Author).await;

    let response = client
        .post(&api_path("/media/videos/uploads"))
        .add_header("Authorization", author.bearer())
        .json(&json!({ "filename": "keynote.mp4", "size_bytes": 12_000_000 }))
        .await;
    let uid = response.json::<Value>()["external_uid"]
        .as_str()
        .unwrap()
        .to_string();

    // Already tracked by the ticket's placeholder.
    let response = client
        .post(&api_path("/media/videos/link"))
        .add_header("Authorization", author.bearer())
        .json(&json!({ "external_uid": uid }))
        .await;
    assert_eq!(response.status_code(), 409);

    let response = client
        .post(&api_path("/media/videos/link"))
        .add_header("Authorization", author.bearer())
        .json(&json!({ "external_uid": "vid-unknown" }))
        .await;
    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn test_rejected_uploads() {
    let app = setup_test_app().await;
    let client = app.client();
    let author = create_user(&app, "author@example.com", Role::Author).await;

    let part = Part::bytes(bytes::Bytes::from_static(b"%PDF-1.7"))
        .file_name("notes.pdf")
        .mime_type("application/pdf");
    let response = client
        .post(&api_path("/media/images"))
        .add_header("Authorization", author.bearer())
        .multipart(MultipartForm::new().add_part("file", part))
        .await;
    assert_eq!(response.status_code(), 400);
    assert_eq!(response.json::<Value>()["kind"], "validation");

    let response = client
        .post(&api_path("/media/images"))
        .add_header("Authorization", author.bearer())
        .multipart(MultipartForm::new().add_text("title", "no file"))
        .await;
    assert_eq!(response.status_code(), 400);
    assert!(app.storage.is_empty());
}
