#![warn(missing_docs)]

//! Docpress tiering subsystem: importance scoring, the score-driven tiering
//! engine, tier-triggered policies, and the background processor that runs
//! periodic passes off the serving path.
//!
//! Tiering is eventually consistent: ingestion assigns a fast type-based
//! default, and the periodic pass re-classifies the whole canonical corpus
//! from importance scores. The pass is idempotent by construction.

pub mod background;
pub mod engine;
pub mod policy;
pub mod scorer;

pub use background::{BackgroundTierConfig, BackgroundTierStats, TieringHandle, TieringProcessor, TieringTask};
pub use engine::{tier_for_score, TieringEngine, TieringStats};
pub use policy::{
    ArchiveRecompressionConfig, ArchiveRecompressionPolicy, PolicyOutcome, PolicyStats, TierPolicy,
};
pub use scorer::{ImportanceScorer, ScoreBreakdown};
