use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use bookbuddy_authz::AuthUser;
use bookbuddy_http::{AppError, AppJson, AppQuery};
use serde_json::{json, Value};

use super::{
    models::{Book, BookPatch, BookQuery, NewBook, ProgressUpdate, StatusUpdate},
    service::BookService,
};
use crate::{state::AppState, utils::parse_id};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_books).post(create_book))
        .route(
            "/{id}",
            get(get_book).put(update_book).delete(delete_book),
        )
        .route("/{id}/progress", put(update_progress))
        .route("/{id}/status", put(update_status))
        .route("/{id}/favorite", post(add_favorite).delete(remove_favorite))
        .with_state(state)
}

fn books(state: &AppState) -> BookService {
    BookService::new(&state.db)
}

async fn list_books(
    user: AuthUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<BookQuery>,
) -> Result<Json<Vec<Book>>, AppError> {
    Ok(Json(books(&state).list(user.id, &query).await?))
}

async fn get_book(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Book>, AppError> {
    let id = parse_id(&id, "book")?;
    Ok(Json(books(&state).get(user.id, id).await?))
}

async fn create_book(
    user: AuthUser,
    State(state): State<AppState>,
    AppJson(new_book): AppJson<NewBook>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let book = books(&state).create(user.id, new_book).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "book added", "book": book })),
    ))
}

async fn update_book(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(patch): AppJson<BookPatch>,
) -> Result<Json<Book>, AppError> {
    let id = parse_id(&id, "book")?;
    Ok(Json(books(&state).update(user.id, id, patch).await?))
}

async fn update_progress(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(update): AppJson<ProgressUpdate>,
) -> Result<Json<Book>, AppError> {
    let id = parse_id(&id, "book")?;
    Ok(Json(books(&state).update_progress(user.id, id, update).await?))
}

async fn update_status(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(update): AppJson<StatusUpdate>,
) -> Result<Json<Book>, AppError> {
    let id = parse_id(&id, "book")?;
    Ok(Json(books(&state).update_status(user.id, id, update).await?))
}

async fn add_favorite(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Book>, AppError> {
    let id = parse_id(&id, "book")?;
    Ok(Json(books(&state).set_favorite(user.id, id, true).await?))
}

async fn remove_favorite(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Book>, AppError> {
    let id = parse_id(&id, "book")?;
    Ok(Json(books(&state).set_favorite(user.id, id, false).await?))
}

async fn delete_book(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let id = parse_id(&id, "book")?;
    books(&state).delete(user.id, id).await?;
    Ok(Json(json!({ "message": "book deleted" })))
}
