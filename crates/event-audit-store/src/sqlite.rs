//! SQLite implementation of the Backend trait.
//!
//! This is the durable backend. It uses rusqlite with bundled SQLite,
//! wrapped in async via tokio::spawn_blocking.
//!
//! Each collection is its own table holding the JSON body as text. Queries
//! and indexes address fields through `json_extract`, so an index on
//! `(type, dataType, source, id)` is an expression index over those paths.

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use tracing::{debug, info};

use event_audit_core::{
    Direction, Document, DocumentId, Filter, IdGenerator, IndexSpec, Query, StoredDocument,
};

use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::migration::{self, now_millis};
use crate::traits::Backend;

/// Prefix for per-collection tables, keeping them clear of `sqlite_` names.
const TABLE_PREFIX: &str = "coll_";

/// SQLite-based backend implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
#[derive(Clone)]
pub struct SqliteBackend {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
    ids: Arc<IdGenerator>,
    /// Collections whose table and registry row this instance has ensured.
    known: Arc<Mutex<HashSet<String>>>,
}

impl SqliteBackend {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_connection(Connection::open(path)?)
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    /// Open the database described by `config`.
    pub fn open_with(config: &StoreConfig) -> Result<Self> {
        let conn = match config.database_path() {
            Some(path) => {
                if let Some(dir) = path.parent() {
                    std::fs::create_dir_all(dir)?;
                }
                info!(path = %path.display(), "opening database");
                Connection::open(path)?
            }
            None => Connection::open_in_memory()?,
        };
        conn.busy_timeout(config.busy_timeout)?;
        Self::from_connection(conn)
    }

    fn from_connection(mut conn: Connection) -> Result<Self> {
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            ids: Arc::new(IdGenerator::new()),
            known: Arc::new(Mutex::new(HashSet::new())),
        })
    }

    /// Names of all collections, sorted.
    pub async fn collections(&self) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT name FROM collections ORDER BY name")?;
            let names = stmt
                .query_map([], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<String>>>()?;
            Ok(names)
        })
        .await
    }

    /// Names of the indexes on a collection, sorted.
    pub async fn indexes(&self, collection: &str) -> Result<Vec<String>> {
        let collection = collection.to_string();
        self.with_conn(move |conn| {
            let table = table_name(&collection);
            let prefix = format!("{table}__");
            // Indexes created by UNIQUE constraints have no SQL and are skipped.
            let mut stmt = conn.prepare(
                "SELECT name FROM sqlite_master
                 WHERE type = 'index' AND tbl_name = ?1 AND sql IS NOT NULL
                 ORDER BY name",
            )?;
            let names = stmt
                .query_map(params![table], |row| row.get::<_, String>(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?
                .into_iter()
                .map(|name| {
                    let stripped = name.strip_prefix(&prefix).map(str::to_string);
                    stripped.unwrap_or(name)
                })
                .collect();
            Ok(names)
        })
        .await
    }

    /// Run a blocking operation on the connection.
    async fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|e| StoreError::Poisoned(format!("connection mutex: {e}")))?;
            f(&conn)
        })
        .await
        .map_err(|e| StoreError::Task(format!("spawn_blocking failed: {e}")))?
    }
}

/// Create the collection's table and registry row if missing.
///
/// Schema work runs once per collection per backend instance.
fn ensure_collection(
    conn: &Connection,
    known: &Mutex<HashSet<String>>,
    collection: &str,
) -> Result<String> {
    let table = table_name(collection);
    let mut known = known
        .lock()
        .map_err(|e| StoreError::Poisoned(format!("collection cache: {e}")))?;
    if known.contains(collection) {
        return Ok(table);
    }

    conn.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS {} (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,  -- insertion order
            doc_id TEXT NOT NULL UNIQUE,            -- 24 hex chars
            body TEXT NOT NULL                      -- JSON object
        )",
        quote_ident(&table)
    ))?;

    let created = conn.execute(
        "INSERT OR IGNORE INTO collections (name, created_at) VALUES (?1, ?2)",
        params![collection, now_millis()],
    )?;
    if created > 0 {
        info!(collection, "created collection");
    }
    known.insert(collection.to_string());
    Ok(table)
}

fn collection_exists(conn: &Connection, collection: &str) -> Result<bool> {
    Ok(conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM collections WHERE name = ?1)",
        params![collection],
        |row| row.get(0),
    )?)
}

fn table_name(collection: &str) -> String {
    format!("{TABLE_PREFIX}{collection}")
}

/// Quote an SQL identifier.
fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// `json_extract` path for a top-level field.
///
/// Field names are spliced into SQL, so only `[A-Za-z0-9_]` is accepted.
fn json_path(field: &str) -> Result<String> {
    let valid = !field.is_empty() && field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(StoreError::InvalidData(format!(
            "unsupported field name: {field:?}"
        )));
    }
    Ok(format!("'$.{field}'"))
}

fn row_to_document(row: &rusqlite::Row<'_>) -> rusqlite::Result<(String, String)> {
    Ok((row.get("doc_id")?, row.get("body")?))
}

fn decode(doc_id: &str, body: &str) -> Result<StoredDocument> {
    let id = DocumentId::from_hex(doc_id).map_err(|e| StoreError::Serialization(e.to_string()))?;
    let body = Document::parse(body)
        .map_err(|e| StoreError::Serialization(format!("document {doc_id}: {e}")))?;
    Ok(StoredDocument::new(id, body))
}

/// Build the SELECT for a query against `table`.
fn compile_query(table: &str, query: &Query) -> Result<(String, Vec<SqlValue>)> {
    let mut sql = format!("SELECT doc_id, body FROM {}", quote_ident(table));
    let mut args = Vec::new();

    match &query.filter {
        Filter::All => {}
        Filter::Gte { field, value } => {
            let path = json_path(field)?;
            sql.push_str(&format!(
                " WHERE json_type(body, {path}) = 'integer'
                   AND typeof(json_extract(body, {path})) = 'integer'
                   AND json_extract(body, {path}) >= ?{}",
                args.len() + 1
            ));
            args.push(SqlValue::Integer(*value));
        }
    }

    match &query.sort {
        Some(sort) => {
            let direction = match sort.direction {
                Direction::Ascending => "ASC",
                Direction::Descending => "DESC",
            };
            sql.push_str(&format!(
                " ORDER BY json_extract(body, {}) {direction}, seq ASC",
                json_path(&sort.field)?
            ));
        }
        None => sql.push_str(" ORDER BY seq ASC"),
    }

    if let Some(page) = query.page {
        sql.push_str(&format!(
            " LIMIT ?{} OFFSET ?{}",
            args.len() + 1,
            args.len() + 2
        ));
        args.push(SqlValue::Integer(i64::try_from(page.limit).unwrap_or(i64::MAX)));
        args.push(SqlValue::Integer(i64::try_from(page.offset).unwrap_or(i64::MAX)));
    }

    Ok((sql, args))
}

#[async_trait]
impl Backend for SqliteBackend {
    async fn save(&self, collection: &str, document: Document) -> Result<StoredDocument> {
        let collection = collection.to_string();
        let ids = Arc::clone(&self.ids);
        let known = Arc::clone(&self.known);

        self.with_conn(move |conn| {
            let table = ensure_collection(conn, &known, &collection)?;
            let id = ids.next_id();

            conn.execute(
                &format!(
                    "INSERT INTO {} (doc_id, body) VALUES (?1, ?2)",
                    quote_ident(&table)
                ),
                params![id.to_hex(), document.to_json_string()],
            )?;

            debug!(collection = %collection, %id, "saved document");
            Ok(StoredDocument::new(id, document))
        })
        .await
    }

    async fn find_by_id(
        &self,
        collection: &str,
        id: &DocumentId,
    ) -> Result<Option<StoredDocument>> {
        let collection = collection.to_string();
        let id = *id;

        self.with_conn(move |conn| {
            if !collection_exists(conn, &collection)? {
                return Ok(None);
            }

            let row = conn
                .query_row(
                    &format!(
                        "SELECT doc_id, body FROM {} WHERE doc_id = ?1",
                        quote_ident(&table_name(&collection))
                    ),
                    params![id.to_hex()],
                    row_to_document,
                )
                .optional()?;

            row.map(|(doc_id, body)| decode(&doc_id, &body)).transpose()
        })
        .await
    }

    async fn find(&self, collection: &str, query: &Query) -> Result<Vec<StoredDocument>> {
        let collection = collection.to_string();
        let (sql, args) = compile_query(&table_name(&collection), query)?;

        self.with_conn(move |conn| {
            if !collection_exists(conn, &collection)? {
                return Ok(Vec::new());
            }

            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params_from_iter(args.iter()), row_to_document)?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            debug!(collection = %collection, returned = rows.len(), "executed query");
            rows.iter()
                .map(|(doc_id, body)| decode(doc_id, body))
                .collect()
        })
        .await
    }

    async fn create_index(&self, collection: &str, spec: &IndexSpec) -> Result<()> {
        let collection = collection.to_string();
        let columns = spec
            .fields()
            .iter()
            .map(|f| json_path(f).map(|p| format!("json_extract(body, {p})")))
            .collect::<Result<Vec<_>>>()?;
        if columns.is_empty() {
            return Err(StoreError::InvalidData("index has no fields".to_string()));
        }
        let index_name = spec.name();
        let known = Arc::clone(&self.known);

        self.with_conn(move |conn| {
            let table = ensure_collection(conn, &known, &collection)?;
            conn.execute_batch(&format!(
                "CREATE INDEX IF NOT EXISTS {} ON {} ({})",
                quote_ident(&format!("{table}__{index_name}")),
                quote_ident(&table),
                columns.join(", ")
            ))?;

            debug!(collection = %collection, index = %index_name, "ensured index");
            Ok(())
        })
        .await
    }
}
