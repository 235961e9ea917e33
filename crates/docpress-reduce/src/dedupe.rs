//! Multi-strategy duplicate resolution.
//!
//! Resolution is a pure decision: given a candidate's fingerprint and the
//! canonical corpus, pick the matching canonical document or none. The
//! pipeline owns the side effects (creating the duplicate record).
//!
//! Strategies apply in fixed precedence order; within a strategy the
//! earliest-committed canonical document wins (the store snapshot iterates
//! in commit order). Both orderings are part of the public contract — they
//! decide which document becomes the long-term canonical record when
//! matches are ambiguous.

use serde::{Deserialize, Serialize};
use tracing::debug;

use docpress_core::traits::DocumentStore;
use docpress_core::types::{ContentHash, Document};

use crate::fingerprint::sample_hash;

/// Default window for the filename + size-proximity strategy.
pub const SIZE_WINDOW_BYTES: u64 = 1024;

/// Which strategy produced a duplicate match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    /// Full-content hash equality.
    ExactContent,
    /// Same original filename and size within the proximity window.
    FilenameSize,
    /// Hash of the leading extracted text matches.
    ContentSample,
}

impl MatchStrategy {
    /// Stable snake_case name, matching the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStrategy::ExactContent => "exact_content",
            MatchStrategy::FilenameSize => "filename_size",
            MatchStrategy::ContentSample => "content_sample",
        }
    }
}

/// Fingerprint and metadata of a not-yet-committed upload.
#[derive(Debug, Clone)]
pub struct DuplicateCandidate {
    /// Filename as supplied at upload time.
    pub filename: String,
    /// File size in bytes.
    pub size: u64,
    /// BLAKE3 hash of the full content.
    pub content_hash: ContentHash,
    /// Extracted text sample, when the file type is text-bearing.
    pub text_sample: Option<String>,
}

/// A successful resolution: the canonical document and the strategy that
/// found it.
#[derive(Debug, Clone)]
pub struct DuplicateMatch {
    /// The canonical document the candidate duplicates.
    pub document: Document,
    /// The strategy that produced the match.
    pub strategy: MatchStrategy,
}

/// Applies the duplicate-detection strategies in precedence order.
#[derive(Debug, Clone)]
pub struct DuplicateResolver {
    size_window: u64,
}

impl Default for DuplicateResolver {
    fn default() -> Self {
        Self {
            size_window: SIZE_WINDOW_BYTES,
        }
    }
}

impl DuplicateResolver {
    /// Resolver with the default size-proximity window.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolver with a custom size-proximity window in bytes.
    pub fn with_size_window(size_window: u64) -> Self {
        Self { size_window }
    }

    /// Decide whether the candidate duplicates an existing canonical
    /// document. Only canonical documents are eligible targets — the store
    /// index and snapshot both exclude duplicate records, so chains never
    /// grow past depth 1.
    pub fn resolve(
        &self,
        candidate: &DuplicateCandidate,
        store: &dyn DocumentStore,
    ) -> Option<DuplicateMatch> {
        // 1. Exact content: answered by the store's hash index, no scan.
        if let Some(document) = store.find_canonical_by_hash(&candidate.content_hash) {
            debug_assert!(document.is_canonical());
            debug!(canonical = %document.id, "duplicate: exact content match");
            return Some(DuplicateMatch {
                document,
                strategy: MatchStrategy::ExactContent,
            });
        }

        let corpus = store.canonical_snapshot();

        // 2. Filename + size proximity.
        if let Some(document) = corpus
            .iter()
            .find(|doc| {
                doc.original_filename == candidate.filename
                    && doc.original_size.abs_diff(candidate.size) < self.size_window
            })
            .cloned()
        {
            debug!(canonical = %document.id, "duplicate: filename + size proximity match");
            return Some(DuplicateMatch {
                document,
                strategy: MatchStrategy::FilenameSize,
            });
        }

        // 3. Content sample, only when the candidate yielded text. The scan
        // is pre-filtered to text-bearing documents that carry a sample hash.
        if let Some(text) = &candidate.text_sample {
            let candidate_hash = sample_hash(text);
            if let Some(document) = corpus
                .iter()
                .filter(|doc| doc.file_type.is_text_bearing())
                .find(|doc| doc.sample_hash == Some(candidate_hash))
                .cloned()
            {
                debug!(canonical = %document.id, "duplicate: content sample match");
                return Some(DuplicateMatch {
                    document,
                    strategy: MatchStrategy::ContentSample,
                });
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use docpress_core::types::{FileType, Tier};
    use docpress_store::MemoryDocumentStore;
    use std::path::PathBuf;
    use uuid::Uuid;

    fn doc(name: &str, size: u64, hash_byte: u8, file_type: FileType) -> Document {
        let now = Utc::now();
        Document {
            id: Uuid::new_v4(),
            original_filename: name.to_string(),
            original_size: size,
            reduced_size: size,
            file_type,
            content_hash: ContentHash([hash_byte; 32]),
            sample_hash: None,
            reduction_strategy: "passthrough".to_string(),
            reduction_percentage: 0.0,
            tier: Tier::Cold,
            is_duplicate: false,
            duplicate_of: None,
            storage_path: PathBuf::from(format!("/tmp/{name}")),
            uploaded_at: now,
            last_accessed: now,
            access_count: 0,
            archive_compressed: false,
        }
    }

    fn candidate(name: &str, size: u64, hash_byte: u8) -> DuplicateCandidate {
        DuplicateCandidate {
            filename: name.to_string(),
            size,
            content_hash: ContentHash([hash_byte; 32]),
            text_sample: None,
        }
    }

    #[test]
    fn exact_content_takes_precedence_over_filename() {
        let store = MemoryDocumentStore::new();
        let by_name = doc("report.pdf", 2_000_000, 1, FileType::Pdf);
        let by_hash = doc("unrelated.pdf", 5_000_000, 9, FileType::Pdf);
        store.commit_canonical(by_name.clone()).unwrap();
        store.commit_canonical(by_hash.clone()).unwrap();

        // Candidate shares the second doc's hash but the first doc's name.
        let m = DuplicateResolver::new()
            .resolve(&candidate("report.pdf", 2_000_000, 9), &store)
            .unwrap();
        assert_eq!(m.strategy, MatchStrategy::ExactContent);
        assert_eq!(m.document.id, by_hash.id);
    }

    #[test]
    fn filename_size_window_boundary() {
        let store = MemoryDocumentStore::new();
        let existing = doc("report.pdf", 2_000_000, 1, FileType::Pdf);
        store.commit_canonical(existing.clone()).unwrap();
        let resolver = DuplicateResolver::new();

        // 500 bytes over: inside the window.
        let m = resolver
            .resolve(&candidate("report.pdf", 2_000_500, 2), &store)
            .unwrap();
        assert_eq!(m.strategy, MatchStrategy::FilenameSize);
        assert_eq!(m.document.id, existing.id);

        // 1023 bytes under: still inside (strictly less than 1024).
        assert!(resolver
            .resolve(&candidate("report.pdf", 2_000_000 - 1023, 3), &store)
            .is_some());

        // Exactly 1024 bytes apart: outside.
        assert!(resolver
            .resolve(&candidate("report.pdf", 2_000_000 + 1024, 4), &store)
            .is_none());

        // Same size, different name: outside.
        assert!(resolver
            .resolve(&candidate("other.pdf", 2_000_000, 5), &store)
            .is_none());
    }

    #[test]
    fn content_sample_matches_across_names_and_sizes() {
        let store = MemoryDocumentStore::new();
        let text = "shared leading content".repeat(10);
        let mut existing = doc("original.txt", 9_000, 1, FileType::Txt);
        existing.sample_hash = Some(sample_hash(&text));
        store.commit_canonical(existing.clone()).unwrap();

        let mut cand = candidate("renamed.txt", 50_000, 2);
        cand.text_sample = Some(text);
        let m = DuplicateResolver::new().resolve(&cand, &store).unwrap();
        assert_eq!(m.strategy, MatchStrategy::ContentSample);
        assert_eq!(m.document.id, existing.id);
    }

    #[test]
    fn no_sample_skips_content_sample_strategy() {
        let store = MemoryDocumentStore::new();
        let mut existing = doc("a.txt", 1_000, 1, FileType::Txt);
        existing.sample_hash = Some(sample_hash("anything"));
        store.commit_canonical(existing).unwrap();

        assert!(DuplicateResolver::new()
            .resolve(&candidate("b.txt", 99_000, 2), &store)
            .is_none());
    }

    #[test]
    fn duplicates_are_never_match_targets() {
        let store = MemoryDocumentStore::new();
        let canonical = doc("a.txt", 1_000, 1, FileType::Txt);
        store.commit_canonical(canonical.clone()).unwrap();

        let mut dup = doc("a-copy.txt", 1_000, 1, FileType::Txt);
        dup.is_duplicate = true;
        dup.duplicate_of = Some(canonical.id);
        store.commit_duplicate(dup).unwrap();

        // Matching by the duplicate's filename finds nothing; matching by
        // hash lands on the canonical record.
        let resolver = DuplicateResolver::new();
        assert!(resolver
            .resolve(&candidate("a-copy.txt", 99_000, 3), &store)
            .is_none());
        let m = resolver.resolve(&candidate("b.txt", 1_000, 1), &store).unwrap();
        assert_eq!(m.document.id, canonical.id);
        assert!(m.document.is_canonical());
    }

    #[test]
    fn earliest_committed_canonical_wins() {
        let store = MemoryDocumentStore::new();
        let first = doc("same.pdf", 10_000, 1, FileType::Pdf);
        let second = doc("same.pdf", 10_000, 2, FileType::Pdf);
        store.commit_canonical(first.clone()).unwrap();
        store.commit_canonical(second).unwrap();

        let m = DuplicateResolver::new()
            .resolve(&candidate("same.pdf", 10_100, 3), &store)
            .unwrap();
        assert_eq!(m.document.id, first.id);
    }

    #[test]
    fn empty_corpus_never_matches() {
        let store = MemoryDocumentStore::new();
        assert!(DuplicateResolver::new()
            .resolve(&candidate("a.txt", 0, 1), &store)
            .is_none());
    }
}
