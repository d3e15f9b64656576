//! Registration and login. The only routes reachable without a token.

pub mod models;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use bookbuddy_http::{AppError, AppJson};
use bookbuddy_kernel::{InitCtx, Module};
use serde_json::{json, Value};

use self::models::{Credentials, TokenResponse};
use crate::{modules::users::store::UserStore, state::AppState};

pub struct AuthModule {
    state: AppState,
}

impl AuthModule {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Module for AuthModule {
    fn name(&self) -> &'static str {
        "auth"
    }

    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            token_ttl_secs = self.state.tokens.ttl().as_secs(),
            argon2_memory_kib = self.state.hasher.params().memory_kib,
            "auth module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/register", post(register))
            .route("/login", post(login))
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<Value> {
        let credentials = json!({
            "required": true,
            "content": { "application/json": { "schema": { "$ref": "#/components/schemas/Credentials" } } }
        });
        let error = json!({
            "description": "Missing fields, taken username or bad credentials",
            "content": { "application/json": { "schema": { "$ref": "#/components/schemas/ErrorResponse" } } }
        });

        Some(json!({
            "paths": {
                "/register": {
                    "post": {
                        "summary": "Create an account",
                        "tags": ["Auth"],
                        "requestBody": credentials,
                        "responses": {
                            "201": {
                                "description": "User created",
                                "content": {
                                    "application/json": {
                                        "schema": { "type": "object", "properties": { "message": { "type": "string" } } }
                                    }
                                }
                            },
                            "400": error
                        }
                    }
                },
                "/login": {
                    "post": {
                        "summary": "Exchange credentials for a bearer token",
                        "tags": ["Auth"],
                        "requestBody": credentials,
                        "responses": {
                            "200": {
                                "description": "Signed token",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/TokenResponse" }
                                    }
                                }
                            },
                            "400": error
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Credentials": {
                        "type": "object",
                        "properties": {
                            "username": { "type": "string" },
                            "password": { "type": "string", "format": "password" }
                        },
                        "required": ["username", "password"]
                    },
                    "TokenResponse": {
                        "type": "object",
                        "properties": { "token": { "type": "string" } },
                        "required": ["token"]
                    }
                }
            }
        }))
    }
}

async fn register(
    State(state): State<AppState>,
    AppJson(credentials): AppJson<Credentials>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let (username, password) = credentials.require()?;
    let users = UserStore::new(&state.db);

    // Skip the hash for names that are obviously taken; the insert still
    // enforces uniqueness for concurrent registrations.
    if users.find_by_username(&username).await?.is_some() {
        return Err(AppError::conflict(
            vec![json!({ "field": "username", "value": username })],
            "username is already taken",
        ));
    }

    let hash = state.hasher.hash(password).await?;
    users.create(&username, hash).await?;

    Ok((StatusCode::CREATED, Json(json!({ "message": "user created" }))))
}

async fn login(
    State(state): State<AppState>,
    AppJson(credentials): AppJson<Credentials>,
) -> Result<Json<TokenResponse>, AppError> {
    let (username, password) = credentials.require()?;

    let Some(user) = UserStore::new(&state.db).find_by_username(&username).await? else {
        tracing::warn!(%username, "login for unknown user");
        return Err(AppError::bad_request_with_code("unknown_user", "user not found"));
    };

    if !state.hasher.verify(password, user.password).await? {
        tracing::warn!(user_id = %user.id, "login with wrong password");
        return Err(AppError::bad_request_with_code(
            "invalid_credentials",
            "incorrect password",
        ));
    }

    let token = state.tokens.issue(user.id, &user.username)?;
    tracing::info!(user_id = %user.id, "login succeeded");
    Ok(Json(TokenResponse { token }))
}

pub fn create_module(state: AppState) -> Arc<dyn Module> {
    Arc::new(AuthModule::new(state))
}
