use super::{api_path, TestApp};
use quill_api::auth::Registration;
use quill_core::models::Role;
use serde_json::json;

pub const TEST_PASSWORD: &str = "correct horse battery";

#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: i64,
    pub email: String,
    pub role: Role,
    /// Session id from the login cookie.
    pub token: String,
}

impl TestUser {
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

/// Register an approved, active account and sign it in over HTTP.
pub async fn create_user(app: &TestApp, email: &str, role: Role) -> TestUser {
    let user = app
        .state
        .auth
        .sessions
        .register(Registration {
            email: email.to_string(),
            password: TEST_PASSWORD.to_string(),
            role,
            is_active: true,
            is_approved: true,
        })
        .await
        .expect("register user");

    let response = app
        .client()
        .post(&api_path("/auth/login"))
        .json(&json!({ "email": email, "password": TEST_PASSWORD }))
        .await;
    assert_eq!(response.status_code(), 200);

    let cookie_name = &app.state.config.auth().session_cookie_name;
    let token = response.cookie(cookie_name).value().to_string();

    TestUser {
        id: user.id,
        email: email.to_string(),
        role,
        token,
    }
}
