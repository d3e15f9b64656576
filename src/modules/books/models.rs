use std::{fmt, str::FromStr};

use bookbuddy_db::Document;
use bookbuddy_http::AppError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Where a reader is with a book. Any transition is allowed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReadingStatus {
    #[default]
    ToRead,
    Reading,
    Finished,
}

impl ReadingStatus {
    pub const ALL: [ReadingStatus; 3] = [Self::ToRead, Self::Reading, Self::Finished];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ToRead => "to-read",
            Self::Reading => "reading",
            Self::Finished => "finished",
        }
    }
}

impl fmt::Display for ReadingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReadingStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                AppError::invalid_field(
                    "status",
                    format!("invalid status '{s}'; expected to-read, reading or finished"),
                )
            })
    }
}

/// A book on a reader's list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub pages: u32,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub status: ReadingStatus,
    #[serde(default)]
    pub favorite: bool,
    #[serde(default)]
    pub last_page_read: u32,
    /// Owner; fixed at creation
    pub user_id: Uuid,
}

impl Document for Book {
    const COLLECTION: &'static str = "books";

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Book {
    /// Checks every field-level rule, including `lastPageRead <= pages`.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.title.trim().is_empty() {
            return Err(AppError::invalid_field("title", "title is required"));
        }
        if self.author.trim().is_empty() {
            return Err(AppError::invalid_field("author", "author is required"));
        }
        if self.pages == 0 {
            return Err(AppError::invalid_field("pages", "pages must be a positive integer"));
        }
        if self.last_page_read > self.pages {
            return Err(AppError::invalid_field(
                "lastPageRead",
                "last page read cannot exceed the total number of pages",
            ));
        }
        Ok(())
    }
}

/// Body of `POST /books`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewBook {
    pub title: Option<String>,
    pub author: Option<String>,
    pub pages: Option<i64>,
    pub category: Option<String>,
    pub status: Option<String>,
}

impl NewBook {
    /// Build the stored book. Progress and favorite always start from zero.
    pub fn into_book(self, owner: Uuid) -> Result<Book, AppError> {
        let book = Book {
            id: Uuid::now_v7(),
            title: required(self.title, "title")?,
            author: required(self.author, "author")?,
            pages: page_count(self.pages.ok_or_else(|| {
                AppError::invalid_field("pages", "pages is required")
            })?)?,
            category: self.category.filter(|c| !c.is_empty()),
            status: self
                .status
                .as_deref()
                .map(str::parse::<ReadingStatus>)
                .transpose()?
                .unwrap_or_default(),
            favorite: false,
            last_page_read: 0,
            user_id: owner,
        };
        book.validate()?;
        Ok(book)
    }
}

/// Body of `PUT /books/{id}`. Absent fields are left alone; unknown fields,
/// including `id` and `userId`, are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookPatch {
    pub title: Option<String>,
    pub author: Option<String>,
    pub pages: Option<i64>,
    /// An empty string clears the category.
    pub category: Option<String>,
    pub status: Option<String>,
    pub favorite: Option<bool>,
    pub last_page_read: Option<i64>,
}

impl BookPatch {
    pub fn apply(self, mut book: Book) -> Result<Book, AppError> {
        if let Some(title) = self.title {
            book.title = title;
        }
        if let Some(author) = self.author {
            book.author = author;
        }
        if let Some(pages) = self.pages {
            book.pages = page_count(pages)?;
        }
        if let Some(category) = self.category {
            book.category = Some(category).filter(|c| !c.is_empty());
        }
        if let Some(status) = self.status {
            book.status = status.parse()?;
        }
        if let Some(favorite) = self.favorite {
            book.favorite = favorite;
        }
        if let Some(page) = self.last_page_read {
            book.last_page_read = page_number(page)?;
        }
        book.validate()?;
        Ok(book)
    }
}

/// Body of `PUT /books/{id}/progress`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdate {
    pub last_page_read: Option<i64>,
}

/// Body of `PUT /books/{id}/status`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusUpdate {
    pub status: Option<String>,
}

/// Query string of `GET /books`. Empty values are treated as absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookQuery {
    pub status: Option<String>,
    pub favorite: Option<String>,
    pub author: Option<String>,
    pub category: Option<String>,
    pub title: Option<String>,
}

fn required(value: Option<String>, field: &str) -> Result<String, AppError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::invalid_field(field, format!("{field} is required")))
}

fn page_count(pages: i64) -> Result<u32, AppError> {
    u32::try_from(pages)
        .ok()
        .filter(|p| *p >= 1)
        .ok_or_else(|| AppError::invalid_field("pages", "pages must be a positive integer"))
}

pub(crate) fn page_number(page: i64) -> Result<u32, AppError> {
    u32::try_from(page).map_err(|_| {
        AppError::invalid_field("lastPageRead", "last page read must be a non-negative integer")
    })
}
