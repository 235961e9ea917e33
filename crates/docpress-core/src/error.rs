//! Error types for the docpress engine.

use uuid::Uuid;

/// All errors surfaced by ingestion, reduction, and tiering operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Unreadable input or unwritable output path — fatal to the current
    /// ingestion; never retried by the core.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Persistence collaborator rejected an operation.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    /// A reduction strategy failed. Caught inside the registry and degraded
    /// to a verbatim copy; surfaced only when the fallback copy itself fails.
    #[error("reduction failed: {0}")]
    Reduction(String),
}

/// Errors from the persistence collaborator.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A canonical document with this content hash already exists. The
    /// commit-time uniqueness backstop for concurrent ingestion races.
    #[error("content hash already held by canonical document {existing}")]
    HashConflict {
        /// The canonical document that already holds the hash.
        existing: Uuid,
    },
    /// No document with the given id.
    #[error("document not found: {0}")]
    NotFound(Uuid),
    /// A duplicate record must reference an existing canonical document.
    #[error("duplicate record does not reference a canonical document")]
    BadDuplicateRef,
}
