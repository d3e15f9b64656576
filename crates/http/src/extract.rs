//! Request extractors whose rejections use the standard error body.

use axum::extract::{FromRequest, FromRequestParts};
use axum::response::{IntoResponse, Response};

use crate::error::AppError;

/// `axum::Json`, but malformed or mistyped bodies become validation errors.
#[derive(Debug, Clone, Copy, Default, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

impl<T: serde::Serialize> IntoResponse for AppJson<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

/// `axum::extract::Query`, but unparseable query strings become validation errors.
#[derive(Debug, Clone, Copy, Default, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct AppQuery<T>(pub T);

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::StatusCode,
        routing::{get, post},
        Router,
    };
    use axum_test::TestServer;
    use serde::Deserialize;

    #[derive(Deserialize, serde::Serialize)]
    struct Progress {
        page: u32,
    }

    async fn echo(AppJson(progress): AppJson<Progress>) -> AppJson<Progress> {
        AppJson(progress)
    }

    #[derive(Deserialize)]
    struct Shelf {
        favorite: Option<String>,
    }

    async fn shelf(AppQuery(shelf): AppQuery<Shelf>) -> String {
        shelf.favorite.unwrap_or_default()
    }

    fn server() -> TestServer {
        TestServer::new(
            Router::new()
                .route("/", post(echo))
                .route("/shelf", get(shelf)),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn accepts_well_typed_bodies() {
        let response = server()
            .post("/")
            .json(&serde_json::json!({ "page": 3 }))
            .await;
        response.assert_status(StatusCode::OK);
        assert_eq!(response.json::<serde_json::Value>()["page"], 3);
    }

    #[tokio::test]
    async fn wrong_types_are_validation_errors() {
        let response = server()
            .post("/")
            .json(&serde_json::json!({ "page": "three" }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let body: serde_json::Value = response.json();
        assert_eq!(body["error"]["code"], "validation_error");
    }

    #[tokio::test]
    async fn missing_content_type_is_a_validation_error() {
        let response = server().post("/").text("page=3").await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn query_strings_are_parsed() {
        let response = server().get("/shelf?favorite=true").await;
        response.assert_status(StatusCode::OK);
        assert_eq!(response.text(), "true");
    }

    #[tokio::test]
    async fn repeated_query_keys_are_json_validation_errors() {
        let response = server().get("/shelf?favorite=true&favorite=false").await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "application/json"
        );

        let body: serde_json::Value = response.json();
        assert_eq!(body["error"]["code"], "validation_error");
        assert_eq!(body["error"]["details"][0]["field"], "query");
    }
}
