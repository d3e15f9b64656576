//! SQLite-backed document store.
//!
//! Documents are JSON objects grouped into named collections, all kept in a
//! single `documents` table keyed by `(collection, id)`. That is all the
//! persistence the application needs: single-document reads and writes
//! filtered by field predicates. A [`Database`] is a cheap, cloneable handle
//! over a connection pool; typed access goes through [`Collection`].
//!
//! Every write is committed before the call returns.

use std::{
    collections::{BTreeMap, BTreeSet},
    marker::PhantomData,
    str::FromStr,
    sync::Arc,
    time::Duration,
};

use bookbuddy_kernel::settings::DatabaseSettings;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous},
    QueryBuilder, Sqlite, SqlitePool,
};
use tokio::sync::Mutex;
use uuid::Uuid;

pub mod error;
pub mod filter;
pub mod module;

pub use error::DbError;
pub use filter::Filter;
pub use module::DatabaseModule;

/// A value stored in a collection.
///
/// The serialized form must be a JSON object carrying the id under `"id"`,
/// which is what [`Filter::by_id`] looks for.
pub trait Document: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Name of the collection documents of this type live in.
    const COLLECTION: &'static str;

    fn id(&self) -> Uuid;
}

pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Shared handle to the store.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
    /// Serializes writes made through this handle and remembers which
    /// unique indexes already exist.
    writes: Arc<Mutex<BTreeSet<String>>>,
}

impl Database {
    /// Open (creating if needed) the database at `settings.url` and bring the
    /// schema up to date.
    pub async fn connect(settings: &DatabaseSettings) -> Result<Self, DbError> {
        let memory = is_memory_url(&settings.url);
        let mut options = SqliteConnectOptions::from_str(&settings.url)?.create_if_missing(true);
        if !memory {
            options = options
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Full);
        }

        // Every connection to `:memory:` is its own database, so keep exactly one alive.
        let pool_options = if memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(settings.max_connections.max(1))
        };

        let pool = pool_options
            .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs))
            .connect_with(options)
            .await?;
        migrator().run(&pool).await?;

        tracing::debug!(target: "bookbuddy-db", url = %settings.url, memory, "connected");
        Ok(Self {
            pool,
            writes: Arc::new(Mutex::new(BTreeSet::new())),
        })
    }

    /// A private, empty in-memory store.
    pub async fn in_memory() -> Result<Self, DbError> {
        Self::connect(&DatabaseSettings {
            url: "sqlite::memory:".to_string(),
            ..DatabaseSettings::default()
        })
        .await
    }

    /// Typed view over the collection backing `T`.
    pub fn collection<T: Document>(&self) -> Collection<T> {
        Collection {
            db: self.clone(),
            unique: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Number of documents per collection.
    pub async fn stats(&self) -> Result<BTreeMap<String, usize>, DbError> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT collection, COUNT(*) FROM documents GROUP BY collection ORDER BY collection",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(name, count)| (name, usize::try_from(count).unwrap_or_default()))
            .collect())
    }

    /// Wait for in-flight queries and close every connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn is_memory_url(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

/// Collection and field names end up inside index names and JSON paths.
fn is_plain_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Typed access to one collection.
pub struct Collection<T> {
    db: Database,
    unique: Vec<&'static str>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            unique: self.unique.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: Document> Collection<T> {
    /// Enforce that no two documents share a non-null value for `field`.
    /// Backed by a unique index, created the first time this handle writes.
    pub fn with_unique(mut self, field: &'static str) -> Self {
        self.unique.push(field);
        self
    }

    fn index_name(field: &str) -> String {
        format!("ux_{}_{}", T::COLLECTION, field)
    }

    fn encode(doc: &T) -> Result<Value, DbError> {
        serde_json::to_value(doc).map_err(|source| DbError::Serialization {
            collection: T::COLLECTION,
            source,
        })
    }

    fn decode(value: Value) -> Result<T, DbError> {
        serde_json::from_value(value).map_err(|source| DbError::Serialization {
            collection: T::COLLECTION,
            source,
        })
    }

    fn body(value: &Value) -> Result<String, DbError> {
        serde_json::to_string(value).map_err(|source| DbError::Serialization {
            collection: T::COLLECTION,
            source,
        })
    }

    async fn ensure_indexes(&self, created: &mut BTreeSet<String>) -> Result<(), DbError> {
        for &field in &self.unique {
            let name = Self::index_name(field);
            if created.contains(&name) {
                continue;
            }
            if !is_plain_name(T::COLLECTION) || !is_plain_name(field) {
                return Err(DbError::InvalidName {
                    collection: T::COLLECTION,
                    field,
                });
            }

            let ddl = format!(
                "CREATE UNIQUE INDEX IF NOT EXISTS {name} \
                 ON documents (json_extract(body, '$.{field}')) \
                 WHERE collection = '{collection}'",
                collection = T::COLLECTION,
            );
            sqlx::query(&ddl).execute(&self.db.pool).await?;
            created.insert(name);
        }
        Ok(())
    }

    /// Turn a unique violation into [`DbError::Duplicate`] naming the field.
    fn classify(&self, err: sqlx::Error, id: Uuid, value: &Value) -> DbError {
        let Some(message) = err
            .as_database_error()
            .filter(|db_err| db_err.is_unique_violation())
            .map(|db_err| db_err.message().to_string())
        else {
            return DbError::Sqlx(err);
        };

        match self
            .unique
            .iter()
            .find(|field| message.contains(&Self::index_name(field)))
        {
            Some(field) => DbError::Duplicate {
                collection: T::COLLECTION,
                field: field.to_string(),
                value: value.get(*field).map(Value::to_string).unwrap_or_default(),
            },
            None => DbError::Duplicate {
                collection: T::COLLECTION,
                field: "id".to_string(),
                value: id.to_string(),
            },
        }
    }

    /// Matching documents in insertion order. An id equality becomes a key
    /// lookup and string equalities are compared in SQL; everything else is
    /// checked against the decoded JSON.
    async fn select(&self, filter: &Filter) -> Result<Vec<Value>, DbError> {
        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT body FROM documents WHERE collection = ");
        query.push_bind(T::COLLECTION);

        if let Some(id) = filter.id() {
            query.push(" AND id = ").push_bind(id.to_string());
        }
        for (field, text) in filter.text_equalities() {
            if !is_plain_name(field) {
                continue;
            }
            query
                .push(" AND json_extract(body, ")
                .push_bind(format!("$.{field}"))
                .push(") = ")
                .push_bind(text.to_string());
        }
        query.push(" ORDER BY rowid");

        let bodies: Vec<String> = query.build_query_scalar().fetch_all(&self.db.pool).await?;

        let mut matched = Vec::with_capacity(bodies.len());
        for body in bodies {
            let value: Value =
                serde_json::from_str(&body).map_err(|source| DbError::Serialization {
                    collection: T::COLLECTION,
                    source,
                })?;
            if filter.matches(&value) {
                matched.push(value);
            }
        }
        Ok(matched)
    }

    pub async fn insert(&self, doc: &T) -> Result<(), DbError> {
        let id = doc.id();
        let value = Self::encode(doc)?;
        let body = Self::body(&value)?;

        let mut created = self.db.writes.lock().await;
        self.ensure_indexes(&mut created).await?;

        sqlx::query("INSERT INTO documents (collection, id, body) VALUES (?, ?, ?)")
            .bind(T::COLLECTION)
            .bind(id.to_string())
            .bind(body)
            .execute(&self.db.pool)
            .await
            .map_err(|err| self.classify(err, id, &value))?;
        Ok(())
    }

    /// All matching documents, oldest first.
    pub async fn find(&self, filter: &Filter) -> Result<Vec<T>, DbError> {
        self.select(filter)
            .await?
            .into_iter()
            .map(Self::decode)
            .collect()
    }

    pub async fn find_one(&self, filter: &Filter) -> Result<Option<T>, DbError> {
        self.select(filter)
            .await?
            .into_iter()
            .next()
            .map(Self::decode)
            .transpose()
    }

    /// Read-modify-write the first matching document while holding the write lock.
    ///
    /// `apply` may reject the change by returning an error, in which case the
    /// stored document is left as it was. The id must not change.
    pub async fn update_one<F, E>(&self, filter: &Filter, apply: F) -> Result<Option<T>, E>
    where
        F: FnOnce(T) -> Result<T, E>,
        E: From<DbError>,
    {
        let mut created = self.db.writes.lock().await;
        self.ensure_indexes(&mut created).await?;

        let Some(current) = self.select(filter).await?.into_iter().next() else {
            return Ok(None);
        };
        let current = Self::decode(current)?;
        let id = current.id();

        let updated = apply(current)?;
        if updated.id() != id {
            return Err(DbError::IdChanged {
                collection: T::COLLECTION,
            }
            .into());
        }

        let value = Self::encode(&updated)?;
        sqlx::query("UPDATE documents SET body = ? WHERE collection = ? AND id = ?")
            .bind(Self::body(&value)?)
            .bind(T::COLLECTION)
            .bind(id.to_string())
            .execute(&self.db.pool)
            .await
            .map_err(|err| self.classify(err, id, &value))?;

        Ok(Some(updated))
    }

    /// Remove the first matching document and return it.
    pub async fn delete_one(&self, filter: &Filter) -> Result<Option<T>, DbError> {
        let _created = self.db.writes.lock().await;

        let Some(current) = self.select(filter).await?.into_iter().next() else {
            return Ok(None);
        };
        let current = Self::decode(current)?;

        sqlx::query("DELETE FROM documents WHERE collection = ? AND id = ?")
            .bind(T::COLLECTION)
            .bind(current.id().to_string())
            .execute(&self.db.pool)
            .await?;
        Ok(Some(current))
    }

    pub async fn count(&self, filter: &Filter) -> Result<usize, DbError> {
        Ok(self.select(filter).await?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Note {
        id: Uuid,
        owner: String,
        slug: String,
        body: String,
    }

    impl Document for Note {
        const COLLECTION: &'static str = "notes";

        fn id(&self) -> Uuid {
            self.id
        }
    }

    fn note(owner: &str, slug: &str) -> Note {
        Note {
            id: Uuid::now_v7(),
            owner: owner.to_string(),
            slug: slug.to_string(),
            body: String::new(),
        }
    }

    fn notes(db: &Database) -> Collection<Note> {
        db.collection::<Note>().with_unique("slug")
    }

    fn temp_settings() -> (DatabaseSettings, std::path::PathBuf) {
        let dir = std::env::temp_dir().join(format!("bookbuddy-db-{}", Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        let settings = DatabaseSettings {
            url: format!("sqlite://{}", dir.join("store.db").display()),
            ..DatabaseSettings::default()
        };
        (settings, dir)
    }

    #[tokio::test]
    async fn find_returns_insertion_order() {
        let db = Database::in_memory().await.unwrap();
        let notes = notes(&db);
        let first = note("ana", "a");
        let second = note("ana", "b");
        notes.insert(&first).await.unwrap();
        notes.insert(&second).await.unwrap();

        let found = notes.find(&Filter::new()).await.unwrap();
        assert_eq!(found, vec![first, second]);
    }

    #[tokio::test]
    async fn find_on_empty_collection_is_empty() {
        let db = Database::in_memory().await.unwrap();
        assert!(notes(&db).find(&Filter::new()).await.unwrap().is_empty());
        assert!(notes(&db)
            .find_one(&Filter::by_id(Uuid::now_v7()))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn id_lookup_combines_with_other_predicates() {
        let db = Database::in_memory().await.unwrap();
        let notes = notes(&db);
        let a = note("ana", "a");
        let b = note("bob", "b");
        notes.insert(&a).await.unwrap();
        notes.insert(&b).await.unwrap();

        let hit = notes.find_one(&Filter::by_id(b.id)).await.unwrap();
        assert_eq!(hit, Some(b.clone()));

        let wrong_owner = Filter::by_id(b.id).eq("owner", "ana");
        assert!(notes.find_one(&wrong_owner).await.unwrap().is_none());

        let by_substring = Filter::new()
            .eq("owner", "bob")
            .contains_ignore_case("slug", "B");
        assert_eq!(notes.find(&by_substring).await.unwrap(), vec![b]);
    }

    #[tokio::test]
    async fn collections_do_not_see_each_other() {
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        struct Other {
            id: Uuid,
        }
        impl Document for Other {
            const COLLECTION: &'static str = "others";
            fn id(&self) -> Uuid {
                self.id
            }
        }

        let db = Database::in_memory().await.unwrap();
        let n = note("ana", "a");
        notes(&db).insert(&n).await.unwrap();

        let others = db.collection::<Other>();
        assert!(others.find_one(&Filter::by_id(n.id)).await.unwrap().is_none());
        assert_eq!(others.count(&Filter::new()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn unique_field_rejects_second_insert() {
        let db = Database::in_memory().await.unwrap();
        let notes = notes(&db);
        notes.insert(&note("ana", "same")).await.unwrap();

        let err = notes.insert(&note("bob", "same")).await.unwrap_err();
        match err {
            DbError::Duplicate { field, value, .. } => {
                assert_eq!(field, "slug");
                assert_eq!(value, "\"same\"");
            }
            other => panic!("expected a duplicate, got {other:?}"),
        }
        assert_eq!(notes.count(&Filter::new()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn reusing_an_id_is_a_duplicate() {
        let db = Database::in_memory().await.unwrap();
        let notes = notes(&db);
        let n = note("ana", "a");
        notes.insert(&n).await.unwrap();

        let mut again = note("ana", "b");
        again.id = n.id;
        match notes.insert(&again).await.unwrap_err() {
            DbError::Duplicate { field, .. } => assert_eq!(field, "id"),
            other => panic!("expected a duplicate, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn update_one_applies_and_persists() {
        let db = Database::in_memory().await.unwrap();
        let notes = notes(&db);
        let n = note("ana", "a");
        notes.insert(&n).await.unwrap();

        let updated = notes
            .update_one(&Filter::by_id(n.id), |mut doc| {
                doc.body = "hello".to_string();
                Ok::<_, DbError>(doc)
            })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.body, "hello");

        let stored = notes.find_one(&Filter::by_id(n.id)).await.unwrap().unwrap();
        assert_eq!(stored.body, "hello");
    }

    #[tokio::test]
    async fn rejected_update_leaves_document_alone() {
        #[derive(Debug)]
        enum Reject {
            No,
            Db,
        }
        impl From<DbError> for Reject {
            fn from(_: DbError) -> Self {
                Reject::Db
            }
        }

        let db = Database::in_memory().await.unwrap();
        let notes = notes(&db);
        let n = note("ana", "a");
        notes.insert(&n).await.unwrap();

        let result = notes
            .update_one(&Filter::by_id(n.id), |mut doc| {
                doc.body = "changed".to_string();
                if doc.body.len() > 3 {
                    return Err(Reject::No);
                }
                Ok(doc)
            })
            .await;
        assert!(matches!(result, Err(Reject::No)));

        let stored = notes.find_one(&Filter::by_id(n.id)).await.unwrap().unwrap();
        assert_eq!(stored, n);
    }

    #[tokio::test]
    async fn update_cannot_change_the_id() {
        let db = Database::in_memory().await.unwrap();
        let notes = notes(&db);
        let n = note("ana", "a");
        notes.insert(&n).await.unwrap();

        let err = notes
            .update_one(&Filter::by_id(n.id), |mut doc| {
                doc.id = Uuid::now_v7();
                Ok::<_, DbError>(doc)
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::IdChanged { .. }));
    }

    #[tokio::test]
    async fn update_cannot_steal_a_unique_value() {
        let db = Database::in_memory().await.unwrap();
        let notes = notes(&db);
        let a = note("ana", "a");
        let b = note("ana", "b");
        notes.insert(&a).await.unwrap();
        notes.insert(&b).await.unwrap();

        let err = notes
            .update_one(&Filter::by_id(b.id), |mut doc| {
                doc.slug = "a".to_string();
                Ok::<_, DbError>(doc)
            })
            .await
            .unwrap_err();
        assert!(err.is_duplicate());

        // Re-saving with its own value is fine.
        let same = notes
            .update_one(&Filter::by_id(a.id), Ok::<_, DbError>)
            .await
            .unwrap();
        assert_eq!(same, Some(a));
    }

    #[tokio::test]
    async fn update_misses_return_none() {
        let db = Database::in_memory().await.unwrap();
        let notes = notes(&db);
        notes.insert(&note("ana", "a")).await.unwrap();

        let missing = notes
            .update_one(&Filter::new().eq("owner", "bob"), Ok::<_, DbError>)
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn delete_one_is_scoped_by_filter() {
        let db = Database::in_memory().await.unwrap();
        let notes = notes(&db);
        let n = note("ana", "a");
        notes.insert(&n).await.unwrap();

        let wrong_owner = Filter::by_id(n.id).eq("owner", "bob");
        assert!(notes.delete_one(&wrong_owner).await.unwrap().is_none());

        let deleted = notes
            .delete_one(&Filter::by_id(n.id).eq("owner", "ana"))
            .await
            .unwrap();
        assert_eq!(deleted, Some(n));
        assert_eq!(notes.count(&Filter::new()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn writes_survive_reopening_without_close() {
        let (settings, dir) = temp_settings();
        let n = note("ana", "a");

        {
            let db = Database::connect(&settings).await.unwrap();
            notes(&db).insert(&n).await.unwrap();
            // Dropped without close, as after a crash.
        }

        let reopened = Database::connect(&settings).await.unwrap();
        let found = notes(&reopened).find(&Filter::new()).await.unwrap();
        assert_eq!(found, vec![n]);
        assert_eq!(reopened.stats().await.unwrap().get("notes"), Some(&1));

        // The unique index is still enforced after a restart.
        let err = notes(&reopened).insert(&note("bob", "a")).await.unwrap_err();
        assert!(err.is_duplicate());

        reopened.close().await;
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn invalid_unique_field_is_refused() {
        let db = Database::in_memory().await.unwrap();
        let err = db
            .collection::<Note>()
            .with_unique("slug'; DROP TABLE documents; --")
            .insert(&note("ana", "a"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::InvalidName { .. }));
    }

    #[test]
    fn memory_urls_are_recognised() {
        assert!(is_memory_url("sqlite::memory:"));
        assert!(is_memory_url("sqlite://file.db?mode=memory"));
        assert!(!is_memory_url("sqlite://bookbuddy.db"));
    }
}
