//! Document store ports.
//!
//! The source corpus lives in an external document store. The pipeline only
//! needs two operations from it, so adapters stay small: list what is there,
//! and fetch every document of one collection.

pub mod ndjson;
pub mod sqlite;

use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::config::{StoreConfig, StoreKind};
use crate::error::{PrepError, Result};
use crate::types::RawDocument;

pub use ndjson::NdjsonDocumentStore;
pub use sqlite::SqliteDocumentStore;

/// Read-only access to a collection-oriented document store
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Names of all collections, sorted
    async fn list_collections(&self) -> Result<Vec<String>>;

    /// Every document in `collection`, in store order
    async fn fetch_all(&self, collection: &str) -> Result<Vec<RawDocument>>;
}

/// Open the adapter named by the config
pub fn open_store(config: &StoreConfig) -> Result<Box<dyn DocumentStore>> {
    match config.kind {
        StoreKind::Ndjson => Ok(Box::new(NdjsonDocumentStore::open(&config.path)?)),
        StoreKind::Sqlite => Ok(Box::new(SqliteDocumentStore::open(&config.path)?)),
    }
}

/// In-memory store for development/testing
#[derive(Debug, Default, Clone)]
pub struct InMemoryDocumentStore {
    collections: BTreeMap<String, Vec<RawDocument>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collection(mut self, name: &str, documents: Vec<RawDocument>) -> Self {
        self.insert(name, documents);
        self
    }

    pub fn insert(&mut self, name: &str, documents: Vec<RawDocument>) {
        self.collections
            .entry(name.to_string())
            .or_default()
            .extend(documents);
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn list_collections(&self) -> Result<Vec<String>> {
        Ok(self.collections.keys().cloned().collect())
    }

    async fn fetch_all(&self, collection: &str) -> Result<Vec<RawDocument>> {
        self.collections
            .get(collection)
            .cloned()
            .ok_or_else(|| PrepError::store(format!("collection '{}' not found", collection)))
    }
}
