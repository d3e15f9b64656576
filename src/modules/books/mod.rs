pub mod models;
pub mod routes;
pub mod service;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use bookbuddy_kernel::{InitCtx, Module};
use serde_json::json;

use crate::state::AppState;

/// A reader's book list: CRUD plus progress, status and favorite mutations
pub struct BooksModule {
    state: AppState,
}

impl BooksModule {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "books module initialized"
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
        let book = json!({
            "description": "The book",
            "content": { "application/json": { "schema": { "$ref": "#/components/schemas/Book" } } }
        });
        let id_param = json!([{
            "name": "id",
            "in": "path",
            "required": true,
            "schema": { "type": "string", "format": "uuid" }
        }]);
        let secured = json!([{ "bearerAuth": [] }]);
        let body = |schema: &str| {
            json!({
                "required": true,
                "content": { "application/json": { "schema": { "$ref": format!("#/components/schemas/{schema}") } } }
            })
        };
        let query = |name: &str, description: &str| {
            json!({ "name": name, "in": "query", "required": false, "description": description, "schema": { "type": "string" } })
        };

        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List the caller's books",
                        "tags": ["Books"],
                        "security": secured,
                        "parameters": [
                            query("status", "to-read, reading or finished"),
                            query("favorite", "true or false"),
                            query("author", "case-insensitive substring"),
                            query("title", "case-insensitive substring"),
                            query("category", "exact match")
                        ],
                        "responses": {
                            "200": {
                                "description": "Books in creation order",
                                "content": {
                                    "application/json": {
                                        "schema": { "type": "array", "items": { "$ref": "#/components/schemas/Book" } }
                                    }
                                }
                            },
                            "400": error,
                            "401": error
                        }
                    },
                    "post": {
                        "summary": "Add a book",
                        "tags": ["Books"],
                        "security": secured,
                        "requestBody": body("NewBook"),
                        "responses": {
                            "201": {
                                "description": "Book added",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "object",
                                            "properties": {
                                                "message": { "type": "string" },
                                                "book": { "$ref": "#/components/schemas/Book" }
                                            }
                                        }
                                    }
                                }
                            },
                            "400": error,
                            "401": error
                        }
                    }
                },
                "/{id}": {
                    "parameters": id_param,
                    "get": {
                        "summary": "Fetch one book",
                        "tags": ["Books"],
                        "security": secured,
                        "responses": { "200": book, "401": error, "404": error }
                    },
                    "put": {
                        "summary": "Update any of a book's fields",
                        "tags": ["Books"],
                        "security": secured,
                        "requestBody": body("BookPatch"),
                        "responses": { "200": book, "400": error, "401": error, "404": error }
                    },
                    "delete": {
                        "summary": "Delete a book",
                        "tags": ["Books"],
                        "security": secured,
                        "responses": {
                            "200": {
                                "description": "Book deleted",
                                "content": {
                                    "application/json": {
                                        "schema": { "type": "object", "properties": { "message": { "type": "string" } } }
                                    }
                                }
                            },
                            "401": error,
                            "404": error
                        }
                    }
                },
                "/{id}/progress": {
                    "parameters": id_param,
                    "put": {
                        "summary": "Record the last page read",
                        "tags": ["Books"],
                        "security": secured,
                        "requestBody": body("ProgressUpdate"),
                        "responses": { "200": book, "400": error, "401": error, "404": error }
                    }
                },
                "/{id}/status": {
                    "parameters": id_param,
                    "put": {
                        "summary": "Change the reading status",
                        "tags": ["Books"],
                        "security": secured,
                        "requestBody": body("StatusUpdate"),
                        "responses": { "200": book, "400": error, "401": error, "404": error }
                    }
                },
                "/{id}/favorite": {
                    "parameters": id_param,
                    "post": {
                        "summary": "Mark as favorite",
                        "tags": ["Books"],
                        "security": secured,
                        "responses": { "200": book, "401": error, "404": error }
                    },
                    "delete": {
                        "summary": "Unmark as favorite",
                        "tags": ["Books"],
                        "security": secured,
                        "responses": { "200": book, "401": error, "404": error }
                    }
                }
            },
            "components": {
                "schemas": {
                    "ReadingStatus": {
                        "type": "string",
                        "enum": ["to-read", "reading", "finished"]
                    },
                    "Book": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string", "format": "uuid" },
                            "title": { "type": "string" },
                            "author": { "type": "string" },
                            "pages": { "type": "integer", "minimum": 1 },
                            "category": { "type": ["string", "null"] },
                            "status": { "$ref": "#/components/schemas/ReadingStatus" },
                            "favorite": { "type": "boolean" },
                            "lastPageRead": { "type": "integer", "minimum": 0 },
                            "userId": { "type": "string", "format": "uuid" }
                        },
                        "required": ["id", "title", "author", "pages", "status", "favorite", "lastPageRead", "userId"]
                    },
                    "NewBook": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string" },
                            "author": { "type": "string" },
                            "pages": { "type": "integer", "minimum": 1 },
                            "category": { "type": "string" },
                            "status": { "$ref": "#/components/schemas/ReadingStatus" }
                        },
                        "required": ["title", "author", "pages"]
                    },
                    "BookPatch": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string" },
                            "author": { "type": "string" },
                            "pages": { "type": "integer", "minimum": 1 },
                            "category": { "type": "string" },
                            "status": { "$ref": "#/components/schemas/ReadingStatus" },
                            "favorite": { "type": "boolean" },
                            "lastPageRead": { "type": "integer", "minimum": 0 }
                        }
                    },
                    "ProgressUpdate": {
                        "type": "object",
                        "properties": { "lastPageRead": { "type": "integer", "minimum": 0 } },
                        "required": ["lastPageRead"]
                    },
                    "StatusUpdate": {
                        "type": "object",
                        "properties": { "status": { "$ref": "#/components/schemas/ReadingStatus" } },
                        "required": ["status"]
                    }
                }
            }
        }))
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        let stored = self
            .state
            .db
            .collection::<models::Book>()
            .count(&bookbuddy_db::Filter::new())
            .await?;
        tracing::info!(module = self.name(), stored, "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Create the books module over the shared application state
pub fn create_module(state: AppState) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(state))
}
