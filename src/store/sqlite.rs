use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;

use super::DocumentStore;
use crate::error::{PrepError, Result};
use crate::types::RawDocument;

/// SQLite-backed document store: one row per document, JSON body as text.
pub struct SqliteDocumentStore {
    conn: Mutex<Connection>,
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    collection  TEXT NOT NULL,
    body        TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS documents_collection ON documents (collection);
"#;

impl SqliteDocumentStore {
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| PrepError::store("sqlite connection lock poisoned"))
    }

    /// Load documents into a collection; used to seed a store from an export
    pub fn insert_documents(&self, collection: &str, documents: &[RawDocument]) -> Result<usize> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        {
            let mut stmt =
                tx.prepare("INSERT INTO documents (collection, body) VALUES (?1, ?2)")?;
            for doc in documents {
                stmt.execute(params![collection, serde_json::to_string(doc)?])?;
            }
        }
        tx.commit()?;
        Ok(documents.len())
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn list_collections(&self) -> Result<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT DISTINCT collection FROM documents ORDER BY collection")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(names)
    }

    async fn fetch_all(&self, collection: &str) -> Result<Vec<RawDocument>> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT body FROM documents WHERE collection = ?1 ORDER BY id")?;
        let bodies = stmt
            .query_map(params![collection], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        if bodies.is_empty() {
            return Err(PrepError::store(format!(
                "collection '{}' not found",
                collection
            )));
        }

        let mut documents = Vec::with_capacity(bodies.len());
        for body in bodies {
            documents.push(serde_json::from_str(&body)?);
        }
        Ok(documents)
    }
}
