//! Book operations, always scoped to the owning user.

use bookbuddy_db::{Collection, Database, Filter};
use bookbuddy_http::AppError;
use uuid::Uuid;

use super::models::{
    page_number, Book, BookPatch, BookQuery, NewBook, ProgressUpdate, ReadingStatus, StatusUpdate,
};

#[derive(Clone)]
pub struct BookService {
    books: Collection<Book>,
}

/// Filter matching `book_id` only if `owner` owns it.
fn owned(owner: Uuid, book_id: Uuid) -> Filter {
    Filter::by_id(book_id).eq("userId", owner.to_string())
}

fn not_found() -> AppError {
    AppError::not_found("book not found")
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl BookService {
    pub fn new(db: &Database) -> Self {
        Self {
            books: db.collection(),
        }
    }

    pub async fn list(&self, owner: Uuid, query: &BookQuery) -> Result<Vec<Book>, AppError> {
        let mut filter = Filter::new().eq("userId", owner.to_string());

        if let Some(status) = present(&query.status) {
            let status: ReadingStatus = status.parse()?;
            filter = filter.eq("status", status.as_str());
        }
        if let Some(favorite) = present(&query.favorite) {
            let favorite: bool = favorite.parse().map_err(|_| {
                AppError::invalid_field("favorite", "favorite must be true or false")
            })?;
            filter = filter.eq("favorite", favorite);
        }
        if let Some(author) = present(&query.author) {
            filter = filter.contains_ignore_case("author", author);
        }
        if let Some(title) = present(&query.title) {
            filter = filter.contains_ignore_case("title", title);
        }
        if let Some(category) = present(&query.category) {
            filter = filter.eq("category", category);
        }

        Ok(self.books.find(&filter).await?)
    }

    pub async fn get(&self, owner: Uuid, book_id: Uuid) -> Result<Book, AppError> {
        self.books
            .find_one(&owned(owner, book_id))
            .await?
            .ok_or_else(not_found)
    }

    pub async fn create(&self, owner: Uuid, new_book: NewBook) -> Result<Book, AppError> {
        let book = new_book.into_book(owner)?;
        self.books.insert(&book).await?;

        tracing::info!(user_id = %owner, book_id = %book.id, "book added");
        Ok(book)
    }

    /// Replace the supplied fields, then re-check the whole book.
    pub async fn update(
        &self,
        owner: Uuid,
        book_id: Uuid,
        patch: BookPatch,
    ) -> Result<Book, AppError> {
        self.books
            .update_one(&owned(owner, book_id), |book| patch.apply(book))
            .await?
            .ok_or_else(not_found)
    }

    pub async fn update_progress(
        &self,
        owner: Uuid,
        book_id: Uuid,
        update: ProgressUpdate,
    ) -> Result<Book, AppError> {
        let page = update.last_page_read.ok_or_else(|| {
            AppError::invalid_field("lastPageRead", "lastPageRead is required")
        })?;
        let page = page_number(page)?;

        self.books
            .update_one(&owned(owner, book_id), |mut book| {
                if page > book.pages {
                    return Err(AppError::invalid_field(
                        "lastPageRead",
                        "last page read cannot exceed the total number of pages",
                    ));
                }
                book.last_page_read = page;
                Ok(book)
            })
            .await?
            .ok_or_else(not_found)
    }

    pub async fn update_status(
        &self,
        owner: Uuid,
        book_id: Uuid,
        update: StatusUpdate,
    ) -> Result<Book, AppError> {
        let status: ReadingStatus = update
            .status
            .ok_or_else(|| AppError::invalid_field("status", "status is required"))?
            .parse()?;

        self.books
            .update_one(&owned(owner, book_id), |mut book| {
                book.status = status;
                Ok::<_, AppError>(book)
            })
            .await?
            .ok_or_else(not_found)
    }

    pub async fn set_favorite(
        &self,
        owner: Uuid,
        book_id: Uuid,
        favorite: bool,
    ) -> Result<Book, AppError> {
        self.books
            .update_one(&owned(owner, book_id), |mut book| {
                book.favorite = favorite;
                Ok::<_, AppError>(book)
            })
            .await?
            .ok_or_else(not_found)
    }

    pub async fn delete(&self, owner: Uuid, book_id: Uuid) -> Result<Book, AppError> {
        let book = self
            .books
            .delete_one(&owned(owner, book_id))
            .await?
            .ok_or_else(not_found)?;

        tracing::info!(user_id = %owner, book_id = %book.id, "book deleted");
        Ok(book)
    }
}
