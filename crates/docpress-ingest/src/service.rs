//! The engine facade handed to the serving layer.

use chrono::{DateTime, Utc};
use std::path::Path;
use std::sync::Arc;

use docpress_core::error::Error;
use docpress_core::traits::DocumentStore;
use docpress_core::types::Document;
use docpress_tier::{PolicyStats, ScoreBreakdown, TieringEngine, TieringStats};

use crate::metrics::IngestSnapshot;
use crate::pipeline::{IngestConfig, IngestOutcome, IngestionPipeline};

/// Composition root over the pipeline, the tiering engine, and the store.
///
/// This is the surface the serving/API collaborator calls: ingest one file,
/// run the periodic tiering passes, and score documents as a read-only
/// diagnostic.
pub struct DocEngine<S: DocumentStore> {
    pipeline: IngestionPipeline<S>,
    tiering: TieringEngine,
    store: Arc<S>,
}

impl<S: DocumentStore> DocEngine<S> {
    /// Engine with the default strategy registry and no tier policies.
    pub fn new(config: IngestConfig, store: Arc<S>) -> Self {
        Self::with_tiering(config, store, TieringEngine::new())
    }

    /// Engine with a caller-assembled tiering engine (tier policies etc.).
    pub fn with_tiering(config: IngestConfig, store: Arc<S>, tiering: TieringEngine) -> Self {
        let pipeline = IngestionPipeline::new(config, store.clone());
        Self {
            pipeline,
            tiering,
            store,
        }
    }

    /// Ingest one uploaded file. See [`IngestionPipeline::ingest`].
    pub fn ingest(&self, path: &Path, original_filename: &str) -> Result<IngestOutcome, Error> {
        self.pipeline.ingest(path, original_filename)
    }

    /// Run one score-driven tiering pass over the canonical corpus.
    pub fn run_tiering_pass(&self, now: DateTime<Utc>) -> Result<TieringStats, Error> {
        self.tiering.run_pass(self.store.as_ref(), now)
    }

    /// Run the tier-policy pass (archive recompression etc.).
    pub fn apply_tier_policies(&self) -> Result<PolicyStats, Error> {
        self.tiering.apply_tier_policies(self.store.as_ref())
    }

    /// Read-only diagnostic: the importance score a tiering pass would use.
    pub fn score(&self, document: &Document, now: DateTime<Utc>) -> f64 {
        self.tiering.scorer().score(document, now)
    }

    /// Read-only diagnostic: the per-component score breakdown.
    pub fn breakdown(&self, document: &Document, now: DateTime<Utc>) -> ScoreBreakdown {
        self.tiering.scorer().breakdown(document, now)
    }

    /// Snapshot of the ingestion counters.
    pub fn metrics(&self) -> IngestSnapshot {
        self.pipeline.metrics().snapshot()
    }

    /// The underlying store handle.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }
}
