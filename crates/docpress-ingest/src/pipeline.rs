//! The per-file ingestion pipeline.
//!
//! One upload flows fingerprint → duplicate resolution → reduction → initial
//! tier → store commit. Duplicate resolution and the commit happen inside a
//! single-writer section so concurrent ingestions of identical files cannot
//! both become canonical; the store's commit-time hash uniqueness backstops
//! the same guarantee.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use docpress_core::error::{Error, StoreError};
use docpress_core::traits::DocumentStore;
use docpress_core::types::{ContentHash, Document, FileType, SampleHash, Tier};
use docpress_reduce::dedupe::{DuplicateCandidate, DuplicateResolver};
use docpress_reduce::strategy::{reduction_percentage, StrategyRegistry};
use docpress_reduce::{extract, fingerprint};

use crate::metrics::IngestMetrics;

/// Configuration for the ingestion pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Directory where reduced artifacts are written.
    pub optimized_dir: PathBuf,
    /// Enable duplicate detection.
    pub dedup_enabled: bool,
    /// Characters of extracted text participating in the sample hash.
    pub sample_max_chars: usize,
    /// Byte window for the filename + size-proximity strategy.
    pub size_window: u64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            optimized_dir: PathBuf::from("uploads/optimized"),
            dedup_enabled: true,
            sample_max_chars: fingerprint::SAMPLE_CHARS,
            size_window: 1024,
        }
    }
}

/// What one ingestion produced.
#[derive(Debug, Clone)]
pub enum IngestOutcome {
    /// A fresh canonical document after reduction.
    New(Document),
    /// A duplicate record referencing an existing canonical document.
    Duplicate(Document),
}

impl IngestOutcome {
    /// The committed record, canonical or duplicate.
    pub fn document(&self) -> &Document {
        match self {
            IngestOutcome::New(doc) | IngestOutcome::Duplicate(doc) => doc,
        }
    }

    /// True when the upload was recorded as a duplicate.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, IngestOutcome::Duplicate(_))
    }
}

/// Orchestrates one upload end to end and commits the result.
pub struct IngestionPipeline<S: DocumentStore> {
    config: IngestConfig,
    registry: StrategyRegistry,
    resolver: DuplicateResolver,
    store: Arc<S>,
    metrics: Arc<IngestMetrics>,
    /// Serializes resolve-and-commit so duplicate decisions observe a
    /// consistent corpus.
    commit_lock: Mutex<()>,
}

impl<S: DocumentStore> IngestionPipeline<S> {
    /// Pipeline with the default strategy registry.
    pub fn new(config: IngestConfig, store: Arc<S>) -> Self {
        Self::with_registry(config, store, StrategyRegistry::with_defaults())
    }

    /// Pipeline with a caller-assembled strategy registry.
    pub fn with_registry(config: IngestConfig, store: Arc<S>, registry: StrategyRegistry) -> Self {
        let resolver = DuplicateResolver::with_size_window(config.size_window);
        Self {
            config,
            registry,
            resolver,
            store,
            metrics: Arc::new(IngestMetrics::new()),
            commit_lock: Mutex::new(()),
        }
    }

    /// Shared ingestion counters.
    pub fn metrics(&self) -> &Arc<IngestMetrics> {
        &self.metrics
    }

    /// The store this pipeline commits to.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Ingest one uploaded file.
    ///
    /// Fatal only when the source cannot be read or the output directory
    /// cannot be written; reduction failures degrade to a verbatim copy and
    /// ambiguous duplicate matches resolve deterministically.
    #[instrument(skip(self, path), fields(filename = original_filename))]
    pub fn ingest(&self, path: &Path, original_filename: &str) -> Result<IngestOutcome, Error> {
        let file_type = FileType::from_path(Path::new(original_filename));
        let original_size = fingerprint::file_size(path)?;
        let content_hash = fingerprint::hash_file(path)?;
        let text_sample = extract::text_sample(path, file_type, self.config.sample_max_chars);
        let sample_hash = text_sample.as_deref().map(fingerprint::sample_hash);

        // Single-writer section: resolution must see the corpus it commits
        // against.
        let _guard = self
            .commit_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if self.config.dedup_enabled {
            let candidate = DuplicateCandidate {
                filename: original_filename.to_string(),
                size: original_size,
                content_hash,
                text_sample,
            };
            if let Some(found) = self.resolver.resolve(&candidate, self.store.as_ref()) {
                let record = duplicate_record(
                    &found.document,
                    original_filename,
                    content_hash,
                    sample_hash,
                    Utc::now(),
                );
                self.store.commit_duplicate(record.clone())?;
                self.metrics.record_duplicate(found.strategy);
                debug!(
                    canonical = %found.document.id,
                    strategy = found.strategy.as_str(),
                    "upload recorded as duplicate"
                );
                return Ok(IngestOutcome::Duplicate(record));
            }
        }

        self.commit_new_document(
            path,
            original_filename,
            file_type,
            original_size,
            content_hash,
            sample_hash,
        )
    }

    fn commit_new_document(
        &self,
        path: &Path,
        original_filename: &str,
        file_type: FileType,
        original_size: u64,
        content_hash: ContentHash,
        sample_hash: Option<SampleHash>,
    ) -> Result<IngestOutcome, Error> {
        let id = Uuid::new_v4();
        std::fs::create_dir_all(&self.config.optimized_dir)?;
        let storage_path = self
            .config
            .optimized_dir
            .join(format!("{id}-{original_filename}"));

        let reduction = self.registry.reduce(file_type, path, &storage_path)?;
        let percentage = reduction_percentage(original_size, reduction.reduced_size);
        let now = Utc::now();
        let document = Document {
            id,
            original_filename: original_filename.to_string(),
            original_size,
            reduced_size: reduction.reduced_size,
            file_type,
            content_hash,
            sample_hash,
            reduction_strategy: reduction.strategy.to_string(),
            reduction_percentage: percentage,
            tier: initial_tier(file_type),
            is_duplicate: false,
            duplicate_of: None,
            storage_path,
            uploaded_at: now,
            last_accessed: now,
            access_count: 0,
            archive_compressed: false,
        };

        match self.store.commit_canonical(document.clone()) {
            Ok(()) => {
                self.metrics
                    .record_canonical(original_size, reduction.reduced_size, reduction.fell_back);
                debug!(
                    id = %document.id,
                    original = original_size,
                    reduced = reduction.reduced_size,
                    strategy = reduction.strategy,
                    "canonical document committed"
                );
                Ok(IngestOutcome::New(document))
            }
            Err(StoreError::HashConflict { existing }) => {
                // Another writer committed the same content first; record
                // this upload as its duplicate instead.
                warn!(%existing, "content hash committed concurrently, recording duplicate");
                if let Err(e) = std::fs::remove_file(&document.storage_path) {
                    debug!(error = %e, "could not remove redundant reduced artifact");
                }
                let canonical = self
                    .store
                    .get(existing)
                    .ok_or(StoreError::NotFound(existing))?;
                let record = duplicate_record(
                    &canonical,
                    original_filename,
                    content_hash,
                    sample_hash,
                    Utc::now(),
                );
                self.store.commit_duplicate(record.clone())?;
                self.metrics
                    .record_duplicate(docpress_reduce::MatchStrategy::ExactContent);
                Ok(IngestOutcome::Duplicate(record))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Fast ingest-time tier from the file type alone; the periodic scoring
/// pass assigns the authoritative tier later.
fn initial_tier(file_type: FileType) -> Tier {
    match file_type {
        FileType::Pdf | FileType::Docx => Tier::Hot,
        FileType::Jpg | FileType::Png => Tier::Warm,
        _ => Tier::Cold,
    }
}

/// Build a duplicate record inheriting the canonical document's metadata:
/// tier, storage reference, sizes, and reduction bookkeeping. The record
/// keeps its own filename and fingerprint.
fn duplicate_record(
    canonical: &Document,
    original_filename: &str,
    content_hash: ContentHash,
    sample_hash: Option<SampleHash>,
    now: DateTime<Utc>,
) -> Document {
    debug_assert!(canonical.is_canonical());
    Document {
        id: Uuid::new_v4(),
        original_filename: original_filename.to_string(),
        original_size: canonical.original_size,
        reduced_size: canonical.reduced_size,
        file_type: canonical.file_type,
        content_hash,
        sample_hash,
        reduction_strategy: canonical.reduction_strategy.clone(),
        reduction_percentage: canonical.reduction_percentage,
        tier: canonical.tier,
        is_duplicate: true,
        duplicate_of: Some(canonical.id),
        storage_path: canonical.storage_path.clone(),
        uploaded_at: now,
        last_accessed: now,
        access_count: 0,
        archive_compressed: canonical.archive_compressed,
    }
}
