use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use bookbuddy_authz::AuthUser;
use bookbuddy_http::{AppError, AppJson};

use super::{
    models::{UpdateUser, UserProfile},
    store::UserStore,
};
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/{id}", get(get_user).put(update_user))
        .with_state(state)
}

fn non_empty(value: Option<String>, field: &str) -> Result<Option<String>, AppError> {
    match value {
        Some(v) if v.trim().is_empty() => Err(AppError::invalid_field(
            field,
            format!("{field} cannot be empty"),
        )),
        other => Ok(other),
    }
}

async fn get_user(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserProfile>, AppError> {
    let id = user.ensure_self_path(&id)?;

    let found = UserStore::new(&state.db)
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("user not found"))?;
    Ok(Json(found.into()))
}

async fn update_user(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(update): AppJson<UpdateUser>,
) -> Result<Json<UserProfile>, AppError> {
    let id = user.ensure_self_path(&id)?;

    let username = non_empty(update.username, "username")?;
    let password_hash = match non_empty(update.password, "password")? {
        Some(password) => Some(state.hasher.hash(password).await?),
        None => None,
    };

    let updated = UserStore::new(&state.db)
        .update_profile(id, username, password_hash)
        .await?
        .ok_or_else(|| AppError::not_found("user not found"))?;

    tracing::info!(user_id = %updated.id, "profile updated");
    Ok(Json(updated.into()))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{json, Value};

    use crate::test_support::{register_and_login, test_server, PASSWORD};

    #[tokio::test]
    async fn profile_is_self_only() {
        let server = test_server().await;
        let (ana_id, ana) = register_and_login(&server, "ana").await;
        let (bob_id, _) = register_and_login(&server, "bob").await;

        let me = server
            .get(&format!("/users/{ana_id}"))
            .authorization_bearer(&ana)
            .await;
        me.assert_status(StatusCode::OK);
        let me: Value = me.json();
        assert_eq!(me["username"], "ana");
        assert!(me.get("password").is_none());

        let other = server
            .get(&format!("/users/{bob_id}"))
            .authorization_bearer(&ana)
            .await;
        other.assert_status(StatusCode::FORBIDDEN);
        assert_eq!(other.json::<Value>()["error"]["code"], "forbidden");

        server
            .put(&format!("/users/{bob_id}"))
            .authorization_bearer(&ana)
            .json(&json!({ "username": "mallory" }))
            .await
            .assert_status(StatusCode::FORBIDDEN);

        server
            .get(&format!("/users/{ana_id}"))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn malformed_user_ids_are_forbidden_not_missing() {
        let server = test_server().await;
        let (_, token) = register_and_login(&server, "erin").await;

        let read = server
            .get("/users/someone-else")
            .authorization_bearer(&token)
            .await;
        read.assert_status(StatusCode::FORBIDDEN);
        assert_eq!(read.json::<Value>()["error"]["code"], "forbidden");

        server
            .put("/users/someone-else")
            .authorization_bearer(&token)
            .json(&json!({ "username": "mallory" }))
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn update_renames_and_rehashes() {
        let server = test_server().await;
        let (id, token) = register_and_login(&server, "carol").await;
        register_and_login(&server, "dave").await;
        let path = format!("/users/{id}");

        server
            .put(&path)
            .authorization_bearer(&token)
            .json(&json!({ "username": "dave" }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
        server
            .put(&path)
            .authorization_bearer(&token)
            .json(&json!({ "password": "" }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        let renamed = server
            .put(&path)
            .authorization_bearer(&token)
            .json(&json!({ "username": "caroline", "password": "new-secret" }))
            .await;
        renamed.assert_status(StatusCode::OK);
        assert_eq!(renamed.json::<Value>()["username"], "caroline");

        server
            .post("/auth/login")
            .json(&json!({ "username": "caroline", "password": "new-secret" }))
            .await
            .assert_status(StatusCode::OK);
        server
            .post("/auth/login")
            .json(&json!({ "username": "caroline", "password": PASSWORD }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
}
