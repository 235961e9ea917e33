//! Score-driven tier re-classification over the canonical corpus.
//!
//! The pass is a periodic full-corpus batch, not an event-driven update:
//! tiers are eventually consistent, and the pass is safely re-entrant — a
//! tier is written only when it differs from the stored value, so running
//! the pass twice with no access-pattern change mutates nothing the second
//! time.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, warn};

use docpress_core::error::Error;
use docpress_core::traits::DocumentStore;
use docpress_core::types::Tier;

use crate::policy::{PolicyOutcome, PolicyStats, TierPolicy};
use crate::scorer::ImportanceScorer;

/// Map an importance score to its storage tier.
pub fn tier_for_score(score: f64) -> Tier {
    if score >= 80.0 {
        Tier::Hot
    } else if score >= 60.0 {
        Tier::Warm
    } else if score >= 30.0 {
        Tier::Cold
    } else {
        Tier::Archive
    }
}

/// Statistics from one tiering pass.
#[derive(Debug, Default, Clone)]
pub struct TieringStats {
    /// Canonical documents scored in this pass.
    pub documents_scanned: usize,
    /// Documents whose tier actually changed.
    pub transitions: usize,
    /// Documents in each tier after the pass (hot, warm, cold, archive).
    pub hot: usize,
    /// See `hot`.
    pub warm: usize,
    /// See `hot`.
    pub cold: usize,
    /// See `hot`.
    pub archive: usize,
}

impl TieringStats {
    fn count(&mut self, tier: Tier) {
        match tier {
            Tier::Hot => self.hot += 1,
            Tier::Warm => self.warm += 1,
            Tier::Cold => self.cold += 1,
            Tier::Archive => self.archive += 1,
        }
    }
}

/// Re-classifies documents into tiers and runs tier-triggered policies.
///
/// Duplicates are excluded from re-scoring; they keep the tier inherited
/// from their canonical document at creation time.
pub struct TieringEngine {
    scorer: ImportanceScorer,
    policies: Vec<Arc<dyn TierPolicy>>,
}

impl TieringEngine {
    /// Engine with no tier policies registered.
    pub fn new() -> Self {
        Self {
            scorer: ImportanceScorer,
            policies: Vec::new(),
        }
    }

    /// Engine with the given tier policies, applied in order by
    /// [`TieringEngine::apply_tier_policies`].
    pub fn with_policies(policies: Vec<Arc<dyn TierPolicy>>) -> Self {
        Self {
            scorer: ImportanceScorer,
            policies,
        }
    }

    /// The scorer used by this engine, exposed as a read-only diagnostic.
    pub fn scorer(&self) -> &ImportanceScorer {
        &self.scorer
    }

    /// Score every canonical document at time `now` and update tiers that
    /// changed. Idempotent: a second pass with unchanged access patterns
    /// performs zero transitions.
    pub fn run_pass(
        &self,
        store: &dyn DocumentStore,
        now: DateTime<Utc>,
    ) -> Result<TieringStats, Error> {
        let mut stats = TieringStats::default();
        for document in store.canonical_snapshot() {
            let score = self.scorer.score(&document, now);
            let target = tier_for_score(score);
            stats.documents_scanned += 1;
            stats.count(target);
            if target != document.tier {
                debug!(
                    id = %document.id,
                    score,
                    from = %document.tier,
                    to = %target,
                    "tier transition"
                );
                store.update_tier(document.id, target)?;
                stats.transitions += 1;
            }
        }
        debug!(
            scanned = stats.documents_scanned,
            transitions = stats.transitions,
            "tiering pass complete"
        );
        Ok(stats)
    }

    /// Second pass: tier-triggered side effects (archive recompression and
    /// any other registered policies). Policy failures degrade to leaving
    /// the document untouched; they never abort the pass.
    pub fn apply_tier_policies(&self, store: &dyn DocumentStore) -> Result<PolicyStats, Error> {
        let mut stats = PolicyStats::default();
        for policy in &self.policies {
            for document in store.canonical_snapshot() {
                if !policy.applies_to(&document) {
                    continue;
                }
                stats.documents_considered += 1;
                match policy.apply(&document, store) {
                    Ok(PolicyOutcome::Applied {
                        bytes_before,
                        bytes_after,
                    }) => {
                        stats.applied += 1;
                        stats.bytes_before += bytes_before;
                        stats.bytes_after += bytes_after;
                    }
                    Ok(PolicyOutcome::Skipped) => stats.skipped += 1,
                    Err(e) => {
                        warn!(
                            policy = policy.name(),
                            id = %document.id,
                            error = %e,
                            "tier policy failed, document left untouched"
                        );
                        stats.skipped += 1;
                    }
                }
            }
        }
        Ok(stats)
    }
}

impl Default for TieringEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use docpress_core::types::{ContentHash, Document, FileType};
    use docpress_store::MemoryDocumentStore;
    use std::path::PathBuf;
    use uuid::Uuid;

    fn doc(file_type: FileType, size: u64, days_old: i64, accesses: u64, hash_byte: u8) -> Document {
        let now = Utc::now();
        Document {
            id: Uuid::new_v4(),
            original_filename: format!("doc-{hash_byte}"),
            original_size: size,
            reduced_size: size,
            file_type,
            content_hash: ContentHash([hash_byte; 32]),
            sample_hash: None,
            reduction_strategy: "passthrough".to_string(),
            reduction_percentage: 0.0,
            tier: Tier::Hot,
            is_duplicate: false,
            duplicate_of: None,
            storage_path: PathBuf::from("/tmp/none"),
            uploaded_at: now - Duration::days(days_old),
            last_accessed: now - Duration::days(days_old),
            access_count: accesses,
            archive_compressed: false,
        }
    }

    #[test]
    fn tier_thresholds() {
        assert_eq!(tier_for_score(100.0), Tier::Hot);
        assert_eq!(tier_for_score(80.0), Tier::Hot);
        assert_eq!(tier_for_score(79.9), Tier::Warm);
        assert_eq!(tier_for_score(60.0), Tier::Warm);
        assert_eq!(tier_for_score(59.9), Tier::Cold);
        assert_eq!(tier_for_score(30.0), Tier::Cold);
        assert_eq!(tier_for_score(29.9), Tier::Archive);
        assert_eq!(tier_for_score(0.0), Tier::Archive);
    }

    #[test]
    fn pass_moves_documents_to_scored_tiers() {
        let store = MemoryDocumentStore::new();
        // Fresh small text file: 56 → Cold (was Hot).
        let txt = doc(FileType::Txt, 500_000, 0, 0, 1);
        // Year-old unread blob: 0.2*30 + 0.1*80 = 14 → Archive.
        let stale = doc(FileType::Other, 500_000, 400, 0, 2);
        store.commit_canonical(txt.clone()).unwrap();
        store.commit_canonical(stale.clone()).unwrap();

        let stats = TieringEngine::new().run_pass(&store, Utc::now()).unwrap();
        assert_eq!(stats.documents_scanned, 2);
        assert_eq!(stats.transitions, 2);
        assert_eq!(store.get(txt.id).unwrap().tier, Tier::Cold);
        assert_eq!(store.get(stale.id).unwrap().tier, Tier::Archive);
        assert_eq!((stats.cold, stats.archive), (1, 1));
    }

    #[test]
    fn second_pass_is_idempotent() {
        let store = MemoryDocumentStore::new();
        store.commit_canonical(doc(FileType::Txt, 500_000, 0, 0, 1)).unwrap();
        store.commit_canonical(doc(FileType::Pdf, 20_000_000, 90, 2, 2)).unwrap();
        store.commit_canonical(doc(FileType::Other, 100, 400, 0, 3)).unwrap();

        let engine = TieringEngine::new();
        let now = Utc::now();
        let first = engine.run_pass(&store, now).unwrap();
        assert!(first.transitions > 0);

        let tiers_after_first: Vec<Tier> =
            store.canonical_snapshot().iter().map(|d| d.tier).collect();
        let second = engine.run_pass(&store, now).unwrap();
        assert_eq!(second.transitions, 0);
        let tiers_after_second: Vec<Tier> =
            store.canonical_snapshot().iter().map(|d| d.tier).collect();
        assert_eq!(tiers_after_first, tiers_after_second);
    }

    #[test]
    fn duplicates_are_not_rescored() {
        let store = MemoryDocumentStore::new();
        let canonical = doc(FileType::Other, 500_000, 400, 0, 1);
        store.commit_canonical(canonical.clone()).unwrap();
        let mut dup = doc(FileType::Other, 500_000, 400, 0, 1);
        dup.id = Uuid::new_v4();
        dup.is_duplicate = true;
        dup.duplicate_of = Some(canonical.id);
        // Inherited creation-time tier.
        dup.tier = Tier::Hot;
        store.commit_duplicate(dup.clone()).unwrap();

        let stats = TieringEngine::new().run_pass(&store, Utc::now()).unwrap();
        assert_eq!(stats.documents_scanned, 1);
        assert_eq!(store.get(canonical.id).unwrap().tier, Tier::Archive);
        assert_eq!(store.get(dup.id).unwrap().tier, Tier::Hot);
    }

    #[test]
    fn engine_without_policies_applies_nothing() {
        let store = MemoryDocumentStore::new();
        let mut d = doc(FileType::Other, 500_000, 400, 0, 1);
        d.tier = Tier::Archive;
        store.commit_canonical(d).unwrap();

        let stats = TieringEngine::new().apply_tier_policies(&store).unwrap();
        assert_eq!(stats.documents_considered, 0);
        assert_eq!(stats.applied, 0);
    }
}
