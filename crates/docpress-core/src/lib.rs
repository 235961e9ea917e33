#![warn(missing_docs)]

//! Docpress core: shared document model, storage tiers, and the persistence
//! collaborator contract.
//!
//! Ingestion path: File → Fingerprint (BLAKE3) → Duplicate resolution →
//! Reduction → Tier assignment → Store commit. Tiering path: periodic
//! score-driven re-classification over the canonical corpus.

pub mod error;
pub mod traits;
pub mod types;

pub use error::{Error, StoreError};
pub use traits::DocumentStore;
pub use types::{ContentHash, Document, FileType, SampleHash, Tier};
