//! Core types for the docpress engine: documents, tiers, file-type tags,
//! and content fingerprints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// A 32-byte BLAKE3 hash of a file's full content. Used for exact-duplicate
/// detection — equality only, not authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub [u8; 32]);

impl ContentHash {
    /// Return the hash as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }

    /// Return the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// A 32-byte BLAKE3 hash of the leading characters of a document's extracted
/// text. Present only for text-bearing file types; used for content-sample
/// duplicate matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SampleHash(pub [u8; 32]);

impl SampleHash {
    /// Return the hash as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl std::fmt::Display for SampleHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Storage tier, ordered from most to least accessible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Frequently accessed, highest-priority storage.
    Hot,
    /// Recently or moderately accessed.
    Warm,
    /// Rarely accessed.
    Cold,
    /// Dormant; candidate for additional compression.
    Archive,
}

impl Tier {
    /// Stable lowercase name, matching the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Hot => "hot",
            Tier::Warm => "warm",
            Tier::Cold => "cold",
            Tier::Archive => "archive",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// File-type tag detected from the original filename's extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// PDF document.
    Pdf,
    /// Word document (.doc or .docx).
    Docx,
    /// JPEG image (.jpg or .jpeg).
    Jpg,
    /// PNG image.
    Png,
    /// TIFF image (.tif or .tiff).
    Tiff,
    /// Plain text.
    Txt,
    /// Comma-separated values.
    Csv,
    /// Excel workbook (.xls or .xlsx).
    Xlsx,
    /// PowerPoint presentation (.ppt or .pptx).
    Pptx,
    /// Anything else.
    Other,
}

impl FileType {
    /// Detect the file type from a filename extension. Unknown or missing
    /// extensions map to [`FileType::Other`].
    pub fn from_path(path: &Path) -> Self {
        let ext = match path.extension().and_then(|e| e.to_str()) {
            Some(e) => e.to_ascii_lowercase(),
            None => return FileType::Other,
        };
        match ext.as_str() {
            "pdf" => FileType::Pdf,
            "doc" | "docx" => FileType::Docx,
            "jpg" | "jpeg" => FileType::Jpg,
            "png" => FileType::Png,
            "tif" | "tiff" => FileType::Tiff,
            "txt" => FileType::Txt,
            "csv" => FileType::Csv,
            "xls" | "xlsx" => FileType::Xlsx,
            "ppt" | "pptx" => FileType::Pptx,
            _ => FileType::Other,
        }
    }

    /// True for types the engine can extract a text sample from, making them
    /// eligible for content-sample duplicate matching.
    pub fn is_text_bearing(&self) -> bool {
        matches!(self, FileType::Pdf | FileType::Docx | FileType::Txt)
    }

    /// Stable lowercase name, matching the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Pdf => "pdf",
            FileType::Docx => "docx",
            FileType::Jpg => "jpg",
            FileType::Png => "png",
            FileType::Tiff => "tiff",
            FileType::Txt => "txt",
            FileType::Csv => "csv",
            FileType::Xlsx => "xlsx",
            FileType::Pptx => "pptx",
            FileType::Other => "other",
        }
    }
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One stored artifact: a canonical document, or a duplicate record that
/// references one.
///
/// Invariants maintained by the pipeline and store:
/// - `reduction_percentage` is never negative; it is 0 whenever
///   `reduced_size >= original_size` or `original_size == 0`.
/// - When `is_duplicate` is true, `duplicate_of` names a canonical
///   (non-duplicate) document; duplicate chains collapse to depth 1.
/// - A duplicate's tier mirrors its canonical document's tier at creation
///   time and is never independently re-scored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique document identifier.
    pub id: Uuid,
    /// Filename as supplied at upload time.
    pub original_filename: String,
    /// Size in bytes before reduction.
    pub original_size: u64,
    /// Size in bytes after reduction.
    pub reduced_size: u64,
    /// File-type tag detected from the original filename.
    pub file_type: FileType,
    /// BLAKE3 hash of the full file content.
    pub content_hash: ContentHash,
    /// Hash of the leading extracted text, when the type is text-bearing.
    pub sample_hash: Option<SampleHash>,
    /// Name of the reduction strategy that produced the stored artifact.
    pub reduction_strategy: String,
    /// Storage saved by reduction, as a percentage of the original size.
    pub reduction_percentage: f64,
    /// Current storage tier.
    pub tier: Tier,
    /// True when this record is a duplicate of an existing document.
    pub is_duplicate: bool,
    /// The canonical document this duplicate references.
    pub duplicate_of: Option<Uuid>,
    /// Path of the stored (reduced) artifact.
    pub storage_path: PathBuf,
    /// When the document was ingested.
    pub uploaded_at: DateTime<Utc>,
    /// Last read access, maintained by the serving layer.
    pub last_accessed: DateTime<Utc>,
    /// Number of read accesses, maintained by the serving layer.
    pub access_count: u64,
    /// True once the archive-tier policy has evaluated this document.
    pub archive_compressed: bool,
}

impl Document {
    /// True for documents that can be a duplicate-match target.
    pub fn is_canonical(&self) -> bool {
        !self.is_duplicate
    }
}
