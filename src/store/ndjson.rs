use async_trait::async_trait;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::DocumentStore;
use crate::error::{PrepError, Result};
use crate::types::RawDocument;

/// Directory of collection exports. `<name>.ndjson` holds one document per
/// line; `<name>.json` holds a single JSON array (as `mongoexport --jsonArray`
/// writes it).
pub struct NdjsonDocumentStore {
    root: PathBuf,
}

impl NdjsonDocumentStore {
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(PrepError::store(format!(
                "store directory '{}' does not exist",
                root.display()
            )));
        }
        Ok(Self { root })
    }

    fn collection_path(&self, collection: &str) -> Option<PathBuf> {
        ["ndjson", "json"]
            .iter()
            .map(|ext| self.root.join(format!("{}.{}", collection, ext)))
            .find(|p| p.is_file())
    }

    fn read_ndjson(path: &Path) -> Result<Vec<RawDocument>> {
        let reader = BufReader::new(File::open(path)?);
        let mut documents = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            documents.push(serde_json::from_str(&line)?);
        }
        Ok(documents)
    }

    fn read_json_array(path: &Path) -> Result<Vec<RawDocument>> {
        let content = fs::read_to_string(path)?;
        match serde_json::from_str::<RawDocument>(&content)? {
            RawDocument::Array(items) => Ok(items),
            _ => Err(PrepError::store(format!(
                "'{}' is not a JSON array of documents",
                path.display()
            ))),
        }
    }
}

#[async_trait]
impl DocumentStore for NdjsonDocumentStore {
    async fn list_collections(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            let is_export = matches!(
                path.extension().and_then(|e| e.to_str()),
                Some("ndjson") | Some("json")
            );
            if !is_export {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        names.dedup();
        Ok(names)
    }

    async fn fetch_all(&self, collection: &str) -> Result<Vec<RawDocument>> {
        let path = self.collection_path(collection).ok_or_else(|| {
            PrepError::store(format!(
                "collection '{}' not found under '{}'",
                collection,
                self.root.display()
            ))
        })?;
        debug!("Reading collection {} from {}", collection, path.display());

        if path.extension().and_then(|e| e.to_str()) == Some("json") {
            Self::read_json_array(&path)
        } else {
            Self::read_ndjson(&path)
        }
    }
}
