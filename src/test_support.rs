//! Helpers for HTTP-level tests against the fully wired router.

use axum::http::StatusCode;
use axum_test::TestServer;
use bookbuddy_authz::TokenService;
use bookbuddy_db::Database;
use bookbuddy_kernel::settings::Settings;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::bootstrap::build_app;

pub const PASSWORD: &str = "password123";

/// Defaults with argon2 turned down so tests hash quickly.
pub fn test_settings() -> Settings {
    let mut settings = Settings::default();
    settings.auth.argon2_memory_kib = 8;
    settings.auth.argon2_iterations = 1;
    settings.auth.argon2_parallelism = 1;
    settings
}

/// The full router over a fresh in-memory store.
pub async fn test_server() -> TestServer {
    let settings = test_settings();
    let db = Database::in_memory().await.unwrap();
    let app = build_app(&settings, db).unwrap();
    TestServer::new(bookbuddy_http::build_router(&app.registry, &settings)).unwrap()
}

/// Register `username` with [`PASSWORD`], log in, and return its id and token.
pub async fn register_and_login(server: &TestServer, username: &str) -> (Uuid, String) {
    let credentials = json!({ "username": username, "password": PASSWORD });

    server
        .post("/auth/register")
        .json(&credentials)
        .await
        .assert_status(StatusCode::CREATED);

    let login = server.post("/auth/login").json(&credentials).await;
    login.assert_status(StatusCode::OK);
    let token = login.json::<Value>()["token"]
        .as_str()
        .unwrap()
        .to_string();

    let claims = TokenService::from_settings(&test_settings().auth)
        .verify(&token)
        .unwrap();
    (claims.sub, token)
}
