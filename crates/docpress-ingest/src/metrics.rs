//! Atomic counters for the ingestion pipeline.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

use docpress_reduce::MatchStrategy;

/// Thread-safe ingestion counters, shared across concurrent ingest calls.
#[derive(Debug, Default)]
pub struct IngestMetrics {
    /// Canonical documents created.
    documents_ingested: AtomicU64,
    /// Duplicate records created, total.
    duplicates_detected: AtomicU64,
    /// Duplicates found by exact content hash.
    duplicates_exact: AtomicU64,
    /// Duplicates found by filename + size proximity.
    duplicates_filename_size: AtomicU64,
    /// Duplicates found by content sample.
    duplicates_content_sample: AtomicU64,
    /// Original bytes of canonical ingests.
    bytes_in: AtomicU64,
    /// Reduced bytes of canonical ingests.
    bytes_out: AtomicU64,
    /// Reductions that degraded to the verbatim fallback.
    reduction_fallbacks: AtomicU64,
}

impl IngestMetrics {
    /// Fresh counters, all zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a canonical ingest.
    pub fn record_canonical(&self, bytes_in: u64, bytes_out: u64, fell_back: bool) {
        self.documents_ingested.fetch_add(1, Ordering::Relaxed);
        self.bytes_in.fetch_add(bytes_in, Ordering::Relaxed);
        self.bytes_out.fetch_add(bytes_out, Ordering::Relaxed);
        if fell_back {
            self.reduction_fallbacks.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a duplicate ingest, attributed to the matching strategy.
    pub fn record_duplicate(&self, strategy: MatchStrategy) {
        self.duplicates_detected.fetch_add(1, Ordering::Relaxed);
        let counter = match strategy {
            MatchStrategy::ExactContent => &self.duplicates_exact,
            MatchStrategy::FilenameSize => &self.duplicates_filename_size,
            MatchStrategy::ContentSample => &self.duplicates_content_sample,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Overall reduction ratio (bytes in / bytes out); 1.0 before any ingest.
    pub fn reduction_ratio(&self) -> f64 {
        let bytes_out = self.bytes_out.load(Ordering::Relaxed);
        if bytes_out == 0 {
            1.0
        } else {
            self.bytes_in.load(Ordering::Relaxed) as f64 / bytes_out as f64
        }
    }

    /// Point-in-time snapshot of all counters.
    pub fn snapshot(&self) -> IngestSnapshot {
        IngestSnapshot {
            documents_ingested: self.documents_ingested.load(Ordering::Relaxed),
            duplicates_detected: self.duplicates_detected.load(Ordering::Relaxed),
            duplicates_exact: self.duplicates_exact.load(Ordering::Relaxed),
            duplicates_filename_size: self.duplicates_filename_size.load(Ordering::Relaxed),
            duplicates_content_sample: self.duplicates_content_sample.load(Ordering::Relaxed),
            bytes_in: self.bytes_in.load(Ordering::Relaxed),
            bytes_out: self.bytes_out.load(Ordering::Relaxed),
            reduction_fallbacks: self.reduction_fallbacks.load(Ordering::Relaxed),
            reduction_ratio: self.reduction_ratio(),
        }
    }
}

/// A point-in-time copy of [`IngestMetrics`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestSnapshot {
    /// Canonical documents created.
    pub documents_ingested: u64,
    /// Duplicate records created, total.
    pub duplicates_detected: u64,
    /// Duplicates found by exact content hash.
    pub duplicates_exact: u64,
    /// Duplicates found by filename + size proximity.
    pub duplicates_filename_size: u64,
    /// Duplicates found by content sample.
    pub duplicates_content_sample: u64,
    /// Original bytes of canonical ingests.
    pub bytes_in: u64,
    /// Reduced bytes of canonical ingests.
    pub bytes_out: u64,
    /// Reductions that degraded to the verbatim fallback.
    pub reduction_fallbacks: u64,
    /// Overall reduction ratio at snapshot time.
    pub reduction_ratio: f64,
}
