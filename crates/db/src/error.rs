use thiserror::Error;

/// Errors raised by the document store.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("{collection}: a document with {field} = {value} already exists")]
    Duplicate {
        collection: &'static str,
        field: String,
        value: String,
    },

    #[error("{collection}: document could not be (de)serialized")]
    Serialization {
        collection: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{collection}: an update may not change the document id")]
    IdChanged { collection: &'static str },

    #[error("{collection}.{field}: only ASCII letters, digits and '_' are allowed in names")]
    InvalidName {
        collection: &'static str,
        field: &'static str,
    },

    #[error("database error")]
    Sqlx(#[from] sqlx::Error),

    #[error("schema migration failed")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

impl DbError {
    /// True for unique-field violations, which callers usually surface as conflicts.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, DbError::Duplicate { .. })
    }
}
