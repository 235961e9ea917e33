//! Importance scoring: a weighted 0–100 score from recency, access
//! frequency, file-type weight, and size.

use chrono::{DateTime, Utc};
use docpress_core::types::{Document, FileType};

/// Weight of the recency component.
pub const WEIGHT_RECENCY: f64 = 0.4;
/// Weight of the access-frequency component.
pub const WEIGHT_FREQUENCY: f64 = 0.3;
/// Weight of the file-type component.
pub const WEIGHT_TYPE: f64 = 0.2;
/// Weight of the size component.
pub const WEIGHT_SIZE: f64 = 0.1;

/// The four sub-scores computed for one document during a tiering pass.
/// Ephemeral: exists only to produce the aggregate and is never persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBreakdown {
    /// 100 at the moment of access, decaying by 2 per day, floor 0.
    pub recency: f64,
    /// 10 per recorded access, capped at 100.
    pub frequency: f64,
    /// Fixed per-type weight.
    pub file_type: f64,
    /// Bucketed by original size.
    pub size: f64,
}

impl ScoreBreakdown {
    /// Weighted aggregate, clamped to 100. The components already sum to at
    /// most 100 by construction; the clamp is a safety invariant.
    pub fn aggregate(&self) -> f64 {
        let sum = WEIGHT_RECENCY * self.recency
            + WEIGHT_FREQUENCY * self.frequency
            + WEIGHT_TYPE * self.file_type
            + WEIGHT_SIZE * self.size;
        sum.min(100.0)
    }
}

/// Pure importance scorer. Deterministic given the document state and the
/// caller-supplied clock; no side effects.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImportanceScorer;

impl ImportanceScorer {
    /// Compute the four sub-scores for a document at time `now`.
    pub fn breakdown(&self, document: &Document, now: DateTime<Utc>) -> ScoreBreakdown {
        let days = (now - document.last_accessed).num_days().max(0);
        ScoreBreakdown {
            recency: (100.0 - 2.0 * days as f64).max(0.0),
            frequency: (10.0 * document.access_count as f64).min(100.0),
            file_type: type_score(document.file_type),
            size: size_score(document.original_size),
        }
    }

    /// Aggregate importance score in `[0, 100]`.
    pub fn score(&self, document: &Document, now: DateTime<Utc>) -> f64 {
        self.breakdown(document, now).aggregate()
    }
}

/// Fixed file-type weights: pdf and docx are the documents worth keeping
/// close; images sit in the middle; plain text and everything else trail.
fn type_score(file_type: FileType) -> f64 {
    match file_type {
        FileType::Pdf => 90.0,
        FileType::Docx => 85.0,
        FileType::Jpg | FileType::Png => 60.0,
        FileType::Txt => 40.0,
        _ => 30.0,
    }
}

/// Size buckets: small files are cheap to keep hot, large ones are not.
fn size_score(original_size: u64) -> f64 {
    if original_size < 1_000_000 {
        80.0
    } else if original_size < 10_000_000 {
        50.0
    } else {
        20.0
    }
}
