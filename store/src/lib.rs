//! Persistence gateway contract for slide documents.
//!
//! The core never writes storage itself; it computes the next envelope and
//! hands it to a [`DocumentStore`]. Every write is scoped to the owning
//! user, and a caller may pass the version it last read so a concurrent
//! writer is surfaced as [`StoreError::Conflict`] instead of a silent
//! lost update. [`MemoryStore`] is the reference implementation used by
//! tests and local tooling.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use serde_json::Value;
use slides_artifact::DocumentRecord;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("document not found")]
    NotFound,

    #[error("version conflict: expected {expected}, found {found}")]
    Conflict { expected: u64, found: u64 },
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Fields to write back for a document. `None` leaves the stored value
/// untouched; `expected_version` opts into the compare-and-swap check.
#[derive(Debug, Clone, Default)]
pub struct DocumentUpdate {
    pub title: Option<String>,
    pub theme_name: Option<String>,
    pub content: Value,
    pub version: Option<u64>,
    pub expected_version: Option<u64>,
}

pub trait DocumentStore {
    fn create_document(
        &self,
        owner: &str,
        id: &str,
        title: &str,
        theme_name: Option<&str>,
        content: Value,
    ) -> DocumentRecord;
    fn load_document(&self, id: &str, owner: &str) -> Result<DocumentRecord>;
    fn save_document(&self, id: &str, owner: &str, update: DocumentUpdate) -> Result<u64>;
    fn delete_document(&self, id: &str, owner: &str) -> Result<()>;
}

type Key = (String, String);

/// In-memory document store keyed by `(owner, id)`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: Mutex<HashMap<Key, DocumentRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn rows(&self) -> MutexGuard<'_, HashMap<Key, DocumentRecord>> {
        self.rows.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn key(owner: &str, id: &str) -> Key {
    (owner.to_string(), id.to_string())
}

impl DocumentStore for MemoryStore {
    fn create_document(
        &self,
        owner: &str,
        id: &str,
        title: &str,
        theme_name: Option<&str>,
        content: Value,
    ) -> DocumentRecord {
        let record = DocumentRecord {
            id: id.to_string(),
            title: title.to_string(),
            theme_name: theme_name.map(str::to_string),
            content,
            version: 1,
            updated_at: Some(Utc::now()),
        };
        self.rows().insert(key(owner, id), record.clone());
        record
    }

    fn load_document(&self, id: &str, owner: &str) -> Result<DocumentRecord> {
        self.rows()
            .get(&key(owner, id))
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    fn save_document(&self, id: &str, owner: &str, update: DocumentUpdate) -> Result<u64> {
        let mut rows = self.rows();
        let record = rows.get_mut(&key(owner, id)).ok_or(StoreError::NotFound)?;

        if let Some(expected) = update.expected_version {
            if record.version != expected {
                return Err(StoreError::Conflict {
                    expected,
                    found: record.version,
                });
            }
        }

        if let Some(title) = update.title {
            record.title = title;
        }
        if let Some(theme) = update.theme_name {
            record.theme_name = Some(theme);
        }
        record.content = update.content;
        if let Some(version) = update.version {
            record.version = version;
        }
        record.updated_at = Some(Utc::now());

        debug!(doc = id, version = record.version, "saved document");
        Ok(record.version)
    }

    fn delete_document(&self, id: &str, owner: &str) -> Result<()> {
        self.rows()
            .remove(&key(owner, id))
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_load_is_scoped_to_owner() {
        let store = MemoryStore::new();
        store.create_document("alice", "doc-1", "Deck", None, json!([]));

        assert!(store.load_document("doc-1", "alice").is_ok());
        assert_eq!(store.load_document("doc-1", "bob"), Err(StoreError::NotFound));
    }

    #[test]
    fn test_create_and_load_through_trait_object() {
        let store = MemoryStore::new();
        let gateway: &dyn DocumentStore = &store;

        let record = gateway.create_document("alice", "doc-9", "Deck", Some("Ocean"), json!([]));
        assert_eq!(record.version, 1);
        assert_eq!(record.theme_name.as_deref(), Some("Ocean"));

        let loaded = gateway.load_document("doc-9", "alice").unwrap();
        assert_eq!(loaded.id, "doc-9");
    }

    #[test]
    fn test_save_rejects_stale_version() {
        let store = MemoryStore::new();
        store.create_document("alice", "doc-1", "Deck", None, json!([]));

        let v = store
            .save_document(
                "doc-1",
                "alice",
                DocumentUpdate {
                    content: json!({ "artifact": {} }),
                    version: Some(2),
                    expected_version: Some(1),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(v, 2);

        // a writer still holding version 1 must be rejected
        let err = store
            .save_document(
                "doc-1",
                "alice",
                DocumentUpdate {
                    content: json!({ "artifact": {} }),
                    version: Some(2),
                    expected_version: Some(1),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert_eq!(
            err,
            StoreError::Conflict {
                expected: 1,
                found: 2
            }
        );
    }

    #[test]
    fn test_save_without_expected_version_is_last_write_wins() {
        let store = MemoryStore::new();
        store.create_document("alice", "doc-1", "Deck", None, json!([]));

        let v = store
            .save_document(
                "doc-1",
                "alice",
                DocumentUpdate {
                    content: json!([{ "id": "a" }]),
                    ..Default::default()
                },
            )
            .unwrap();
        // content replaced, version untouched
        assert_eq!(v, 1);
        let doc = store.load_document("doc-1", "alice").unwrap();
        assert_eq!(doc.content, json!([{ "id": "a" }]));
    }

    #[test]
    fn test_delete_document() {
        let store = MemoryStore::new();
        store.create_document("alice", "doc-1", "Deck", None, json!([]));
        store.delete_document("doc-1", "alice").unwrap();
        assert_eq!(store.load_document("doc-1", "alice"), Err(StoreError::NotFound));
        assert_eq!(store.delete_document("doc-1", "alice"), Err(StoreError::NotFound));
    }
}
