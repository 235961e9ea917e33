#![warn(missing_docs)]

//! Docpress reduction subsystem: content fingerprinting (BLAKE3),
//! multi-strategy duplicate resolution, and per-format size-reduction
//! strategy dispatch.
//!
//! Ingest path: File → Fingerprint → Resolve duplicates → Reduce → Commit.

pub mod dedupe;
pub mod extract;
pub mod fingerprint;
pub mod strategy;

pub use dedupe::{DuplicateCandidate, DuplicateMatch, DuplicateResolver, MatchStrategy};
pub use fingerprint::{file_size, hash_bytes, hash_file, sample_hash, SAMPLE_CHARS};
pub use strategy::{
    reduction_percentage, ImageStrategy, PassthroughStrategy, PdfStrategy, ReductionOutcome,
    ReductionStrategy, StrategyRegistry,
};
