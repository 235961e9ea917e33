//! Tier-triggered side effects.
//!
//! [`TierPolicy`] is the extension point behind the tiering engine's second
//! pass. The shipped implementation recompresses archive-tier artifacts with
//! Zstd. Policies must be idempotent: a document already processed for its
//! tier is never touched again.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use docpress_core::error::Error;
use docpress_core::traits::DocumentStore;
use docpress_core::types::{Document, Tier};

/// Result of applying a policy to one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyOutcome {
    /// The policy transformed the stored artifact.
    Applied {
        /// Artifact size before the transform.
        bytes_before: u64,
        /// Artifact size after the transform.
        bytes_after: u64,
    },
    /// The policy evaluated the document and left the artifact alone.
    Skipped,
}

/// Aggregate statistics from one policy pass.
#[derive(Debug, Default, Clone)]
pub struct PolicyStats {
    /// Documents any policy considered.
    pub documents_considered: usize,
    /// Documents whose artifact was transformed.
    pub applied: usize,
    /// Documents evaluated but left alone (including policy failures).
    pub skipped: usize,
    /// Total artifact bytes before transforms.
    pub bytes_before: u64,
    /// Total artifact bytes after transforms.
    pub bytes_after: u64,
}

impl PolicyStats {
    /// Bytes saved by this pass.
    pub fn bytes_saved(&self) -> u64 {
        self.bytes_before.saturating_sub(self.bytes_after)
    }
}

/// A tier-triggered side effect, applied by
/// [`crate::TieringEngine::apply_tier_policies`].
pub trait TierPolicy: Send + Sync {
    /// Stable policy name for logs.
    fn name(&self) -> &'static str;

    /// Whether the document is due for this policy. Must return false for
    /// documents the policy has already processed, so the pass stays
    /// idempotent.
    fn applies_to(&self, document: &Document) -> bool;

    /// Apply the policy to one document.
    fn apply(&self, document: &Document, store: &dyn DocumentStore) -> Result<PolicyOutcome, Error>;
}

/// Configuration for [`ArchiveRecompressionPolicy`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveRecompressionConfig {
    /// Zstd compression level (1 = fastest, 19 = best ratio).
    pub zstd_level: i32,
    /// Minimum size improvement, in percent, required to keep the
    /// recompressed artifact.
    pub min_improvement_pct: u8,
}

impl Default for ArchiveRecompressionConfig {
    fn default() -> Self {
        Self {
            zstd_level: 3,
            min_improvement_pct: 5,
        }
    }
}

/// Recompresses archive-tier artifacts with Zstd.
///
/// A cheap LZ4 probe gates the expensive pass; artifacts that do not improve
/// by the configured threshold are left in place. Either way the document is
/// marked as evaluated, so repeated passes never touch it again. Ingest-time
/// `reduced_size`/`reduction_percentage` are never rewritten — they record
/// the ingest outcome, not the archival one.
#[derive(Debug, Default)]
pub struct ArchiveRecompressionPolicy {
    config: ArchiveRecompressionConfig,
}

impl ArchiveRecompressionPolicy {
    /// Policy with the given configuration.
    pub fn new(config: ArchiveRecompressionConfig) -> Self {
        Self { config }
    }

    fn compressed_path(path: &Path) -> PathBuf {
        let mut name = path.as_os_str().to_owned();
        name.push(".zst");
        PathBuf::from(name)
    }
}

/// Cheap probe: LZ4-compress a leading sample and see whether it shrinks.
/// Already-compressed or random data fails the probe.
fn looks_compressible(data: &[u8]) -> bool {
    const PROBE_BYTES: usize = 4096;
    if data.len() < 128 {
        return true;
    }
    let sample = &data[..data.len().min(PROBE_BYTES)];
    lz4_flex::compress_prepend_size(sample).len() < sample.len() * 95 / 100
}

impl TierPolicy for ArchiveRecompressionPolicy {
    fn name(&self) -> &'static str {
        "archive_recompression"
    }

    fn applies_to(&self, document: &Document) -> bool {
        document.is_canonical() && document.tier == Tier::Archive && !document.archive_compressed
    }

    fn apply(&self, document: &Document, store: &dyn DocumentStore) -> Result<PolicyOutcome, Error> {
        let bytes = fs::read(&document.storage_path)?;

        if !looks_compressible(&bytes) {
            debug!(id = %document.id, "archive artifact not compressible, marking evaluated");
            store.update_archive_artifact(document.id, None)?;
            return Ok(PolicyOutcome::Skipped);
        }

        let compressed = zstd::encode_all(bytes.as_slice(), self.config.zstd_level)
            .map_err(|e| Error::Reduction(e.to_string()))?;
        let threshold = bytes.len() * (100 - self.config.min_improvement_pct as usize) / 100;
        if compressed.len() >= threshold {
            debug!(
                id = %document.id,
                before = bytes.len(),
                after = compressed.len(),
                "recompression below improvement threshold, keeping original"
            );
            store.update_archive_artifact(document.id, None)?;
            return Ok(PolicyOutcome::Skipped);
        }

        let target = Self::compressed_path(&document.storage_path);
        fs::write(&target, &compressed)?;
        if let Err(e) = fs::remove_file(&document.storage_path) {
            warn!(id = %document.id, error = %e, "could not remove pre-archive artifact");
        }
        store.update_archive_artifact(document.id, Some(target))?;
        debug!(
            id = %document.id,
            before = bytes.len(),
            after = compressed.len(),
            "archive artifact recompressed"
        );
        Ok(PolicyOutcome::Applied {
            bytes_before: bytes.len() as u64,
            bytes_after: compressed.len() as u64,
        })
    }
}
