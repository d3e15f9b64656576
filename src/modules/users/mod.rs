pub mod models;
pub mod routes;
pub mod store;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use bookbuddy_kernel::{InitCtx, Module};
use serde_json::json;

use crate::state::AppState;

/// Self-service profile: read and update one's own account
pub struct UsersModule {
    state: AppState,
}

impl UsersModule {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Module for UsersModule {
    fn name(&self) -> &'static str {
        "users"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "users module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let error = json!({
            "description": "Error",
            "content": { "application/json": { "schema": { "$ref": "#/components/schemas/ErrorResponse" } } }
        });
        let profile = json!({
            "description": "The caller's profile",
            "content": { "application/json": { "schema": { "$ref": "#/components/schemas/UserProfile" } } }
        });

        Some(json!({
            "paths": {
                "/{id}": {
                    "parameters": [{
                        "name": "id",
                        "in": "path",
                        "required": true,
                        "schema": { "type": "string", "format": "uuid" }
                    }],
                    "get": {
                        "summary": "Read your own profile",
                        "tags": ["Users"],
                        "security": [{ "bearerAuth": [] }],
                        "responses": { "200": profile, "401": error, "403": error, "404": error }
                    },
                    "put": {
                        "summary": "Change your username or password",
                        "tags": ["Users"],
                        "security": [{ "bearerAuth": [] }],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/UpdateUser" }
                                }
                            }
                        },
                        "responses": { "200": profile, "400": error, "401": error, "403": error, "404": error }
                    }
                }
            },
            "components": {
                "schemas": {
                    "UserProfile": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string", "format": "uuid" },
                            "username": { "type": "string" }
                        },
                        "required": ["id", "username"]
                    },
                    "UpdateUser": {
                        "type": "object",
                        "properties": {
                            "username": { "type": "string" },
                            "password": { "type": "string" }
                        }
                    }
                }
            }
        }))
    }
}

pub fn create_module(state: AppState) -> Arc<dyn Module> {
    Arc::new(UsersModule::new(state))
}
