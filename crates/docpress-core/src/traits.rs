//! The persistence collaborator contract.
//!
//! The core never talks to a database directly; it consumes a
//! [`DocumentStore`] that can enumerate canonical documents for duplicate
//! matching and tiering, and commit or update document records. The trait is
//! object-safe and synchronous so implementations can wrap anything from an
//! in-memory map to a SQL backend.

use chrono::{DateTime, Utc};
use std::path::PathBuf;
use uuid::Uuid;

use crate::error::StoreError;
use crate::types::{ContentHash, Document, Tier};

/// Persistence operations the engine requires.
///
/// Ordering contract: [`DocumentStore::canonical_snapshot`] iterates in
/// commit order (earliest first). The duplicate resolver relies on this as
/// its documented tie-break — when several canonical documents match a
/// candidate, the earliest-committed one becomes the long-term canonical
/// record.
pub trait DocumentStore: Send + Sync {
    /// Fetch one document by id.
    fn get(&self, id: Uuid) -> Option<Document>;

    /// Indexed exact-match lookup: the canonical document holding this
    /// content hash, if any. Duplicate records are never indexed.
    fn find_canonical_by_hash(&self, hash: &ContentHash) -> Option<Document>;

    /// Consistent snapshot of all canonical (non-duplicate) documents, in
    /// commit order.
    fn canonical_snapshot(&self) -> Vec<Document>;

    /// Snapshot of every record, canonical and duplicate, in commit order.
    fn all_documents(&self) -> Vec<Document>;

    /// Commit a new canonical document.
    ///
    /// Enforces content-hash uniqueness across canonical documents: if the
    /// hash is already held, returns [`StoreError::HashConflict`] naming the
    /// existing document so the caller can record a duplicate instead. This
    /// is the serialization point that prevents two concurrently ingested
    /// identical files from both becoming canonical.
    fn commit_canonical(&self, document: Document) -> Result<(), StoreError>;

    /// Commit a duplicate record. Fails with [`StoreError::BadDuplicateRef`]
    /// unless `duplicate_of` names an existing canonical document — duplicate
    /// chains never exceed depth 1.
    fn commit_duplicate(&self, document: Document) -> Result<(), StoreError>;

    /// Atomically update a document's tier. Last-writer-wins; the tiering
    /// pass may run concurrently with ingestion.
    fn update_tier(&self, id: Uuid, tier: Tier) -> Result<(), StoreError>;

    /// Record the outcome of the archive-tier policy: mark the document as
    /// evaluated and, when recompression produced a new artifact, move its
    /// storage path.
    fn update_archive_artifact(
        &self,
        id: Uuid,
        new_path: Option<PathBuf>,
    ) -> Result<(), StoreError>;

    /// Record a read access: bumps the access count and refreshes the
    /// last-accessed timestamp. Called by the serving layer; consumed here
    /// only as scoring input.
    fn record_access(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), StoreError>;

    /// Number of records, canonical and duplicate.
    fn len(&self) -> usize;

    /// True when the store holds no records.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
