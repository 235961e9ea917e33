//! Background async processor for periodic tiering work.
//!
//! Runs the scoring pass and the tier-policy pass off the serving path,
//! driven by a task channel. Statistics are published through a watch
//! channel so callers can observe progress without locking.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::warn;

use docpress_core::error::Error;
use docpress_core::traits::DocumentStore;

use crate::engine::TieringEngine;

/// A work item for the tiering processor.
#[derive(Debug)]
pub enum TieringTask {
    /// Run one full scoring pass over the canonical corpus.
    RunPass,
    /// Run the tier-policy pass (archive recompression etc.).
    ApplyPolicies,
    /// Shut the processor down.
    Shutdown,
}

/// Configuration for the background tiering processor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackgroundTierConfig {
    /// Capacity of the incoming task channel.
    pub channel_capacity: usize,
}

impl Default for BackgroundTierConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 64,
        }
    }
}

/// Statistics published by the background processor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackgroundTierStats {
    /// Scoring passes completed.
    pub passes_completed: u64,
    /// Tier transitions across all passes.
    pub transitions_total: u64,
    /// Policy passes completed.
    pub policy_passes: u64,
    /// Documents whose artifacts a policy transformed.
    pub policy_applied_total: u64,
}

/// Handle for submitting tasks to the processor and reading stats.
pub struct TieringHandle {
    sender: mpsc::Sender<TieringTask>,
    stats: watch::Receiver<BackgroundTierStats>,
}

impl TieringHandle {
    /// Queue a task. Fails once the processor has shut down.
    pub async fn send(&self, task: TieringTask) -> Result<(), Error> {
        self.sender
            .send(task)
            .await
            .map_err(|_| Error::Io(std::io::Error::other("tiering processor shut down")))
    }

    /// Snapshot of the processor's statistics.
    pub fn stats(&self) -> BackgroundTierStats {
        self.stats.borrow().clone()
    }

    /// True while the processor is accepting tasks.
    pub fn is_running(&self) -> bool {
        !self.sender.is_closed()
    }
}

/// Background processor owning a [`TieringEngine`] and a store handle.
pub struct TieringProcessor<S: DocumentStore + 'static> {
    engine: TieringEngine,
    store: Arc<S>,
    stats_tx: watch::Sender<BackgroundTierStats>,
    stats: BackgroundTierStats,
}

impl<S: DocumentStore + 'static> TieringProcessor<S> {
    /// Spawn the processor and return its handle.
    pub fn start(config: BackgroundTierConfig, engine: TieringEngine, store: Arc<S>) -> TieringHandle {
        let (task_tx, task_rx) = mpsc::channel(config.channel_capacity);
        let (stats_tx, stats_rx) = watch::channel(BackgroundTierStats::default());

        let processor = TieringProcessor {
            engine,
            store,
            stats_tx,
            stats: BackgroundTierStats::default(),
        };
        tokio::spawn(processor.run(task_rx));

        TieringHandle {
            sender: task_tx,
            stats: stats_rx,
        }
    }

    async fn run(mut self, mut rx: mpsc::Receiver<TieringTask>) {
        while let Some(task) = rx.recv().await {
            match task {
                TieringTask::RunPass => match self.engine.run_pass(self.store.as_ref(), Utc::now()) {
                    Ok(pass) => {
                        self.stats.passes_completed += 1;
                        self.stats.transitions_total += pass.transitions as u64;
                    }
                    Err(e) => warn!(error = %e, "tiering pass failed"),
                },
                TieringTask::ApplyPolicies => match self.engine.apply_tier_policies(self.store.as_ref()) {
                    Ok(pass) => {
                        self.stats.policy_passes += 1;
                        self.stats.policy_applied_total += pass.applied as u64;
                    }
                    Err(e) => warn!(error = %e, "tier policy pass failed"),
                },
                TieringTask::Shutdown => break,
            }
            let _ = self.stats_tx.send(self.stats.clone());
        }
    }
}
