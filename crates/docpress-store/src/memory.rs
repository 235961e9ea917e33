//! `RwLock`-guarded in-memory document store.
//!
//! Exact-match duplicate checks are answered from a content-hash index
//! rather than a corpus scan; the fuzzy strategies iterate the canonical
//! snapshot, which preserves commit order.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;
use uuid::Uuid;

use docpress_core::error::StoreError;
use docpress_core::traits::DocumentStore;
use docpress_core::types::{ContentHash, Document, Tier};

#[derive(Debug, Default)]
struct Inner {
    documents: HashMap<Uuid, Document>,
    /// Canonical documents only, keyed by full-content hash.
    by_hash: HashMap<ContentHash, Uuid>,
    /// Commit order of every record; backs snapshot iteration.
    commit_order: Vec<Uuid>,
}

/// Thread-safe in-memory [`DocumentStore`].
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    inner: RwLock<Inner>,
}

impl MemoryDocumentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Total bytes saved across canonical documents (original − reduced,
    /// counting only documents that actually shrank).
    pub fn bytes_saved(&self) -> u64 {
        let inner = self.read();
        inner
            .documents
            .values()
            .filter(|d| !d.is_duplicate)
            .map(|d| d.original_size.saturating_sub(d.reduced_size))
            .sum()
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn get(&self, id: Uuid) -> Option<Document> {
        self.read().documents.get(&id).cloned()
    }

    fn find_canonical_by_hash(&self, hash: &ContentHash) -> Option<Document> {
        let inner = self.read();
        let id = inner.by_hash.get(hash)?;
        inner.documents.get(id).cloned()
    }

    fn canonical_snapshot(&self) -> Vec<Document> {
        let inner = self.read();
        inner
            .commit_order
            .iter()
            .filter_map(|id| inner.documents.get(id))
            .filter(|d| !d.is_duplicate)
            .cloned()
            .collect()
    }

    fn all_documents(&self) -> Vec<Document> {
        let inner = self.read();
        inner
            .commit_order
            .iter()
            .filter_map(|id| inner.documents.get(id))
            .cloned()
            .collect()
    }

    fn commit_canonical(&self, document: Document) -> Result<(), StoreError> {
        let mut inner = self.write();
        if let Some(existing) = inner.by_hash.get(&document.content_hash) {
            return Err(StoreError::HashConflict { existing: *existing });
        }
        debug!(id = %document.id, hash = %document.content_hash, "committed canonical document");
        inner.by_hash.insert(document.content_hash, document.id);
        inner.commit_order.push(document.id);
        inner.documents.insert(document.id, document);
        Ok(())
    }

    fn commit_duplicate(&self, document: Document) -> Result<(), StoreError> {
        let mut inner = self.write();
        let canonical_id = document.duplicate_of.ok_or(StoreError::BadDuplicateRef)?;
        match inner.documents.get(&canonical_id) {
            Some(canonical) if canonical.is_canonical() => {}
            _ => return Err(StoreError::BadDuplicateRef),
        }
        if !document.is_duplicate {
            return Err(StoreError::BadDuplicateRef);
        }
        debug!(id = %document.id, canonical = %canonical_id, "committed duplicate record");
        inner.commit_order.push(document.id);
        inner.documents.insert(document.id, document);
        Ok(())
    }

    fn update_tier(&self, id: Uuid, tier: Tier) -> Result<(), StoreError> {
        let mut inner = self.write();
        let doc = inner.documents.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        doc.tier = tier;
        Ok(())
    }

    fn update_archive_artifact(
        &self,
        id: Uuid,
        new_path: Option<PathBuf>,
    ) -> Result<(), StoreError> {
        let mut inner = self.write();
        let doc = inner.documents.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        if let Some(path) = new_path {
            doc.storage_path = path;
        }
        doc.archive_compressed = true;
        Ok(())
    }

    fn record_access(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), StoreError> {
        let mut inner = self.write();
        let doc = inner.documents.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        doc.access_count += 1;
        doc.last_accessed = at;
        Ok(())
    }

    fn len(&self) -> usize {
        self.read().documents.len()
    }
}
