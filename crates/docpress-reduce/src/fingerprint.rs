//! Content fingerprinting: streaming BLAKE3 file hashes and text-sample
//! hashes.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use docpress_core::error::Error;
use docpress_core::types::{ContentHash, SampleHash};

/// Number of leading characters of extracted text that participate in the
/// content-sample hash.
pub const SAMPLE_CHARS: usize = 1000;

/// Read buffer size for streaming file hashes.
const CHUNK_SIZE: usize = 64 * 1024;

/// Compute the BLAKE3 hash of a byte slice.
pub fn hash_bytes(data: &[u8]) -> ContentHash {
    ContentHash(*blake3::hash(data).as_bytes())
}

/// Compute the BLAKE3 hash of a file, reading it in fixed-size chunks.
/// An unreadable path is fatal to the current ingestion.
pub fn hash_file(path: &Path) -> Result<ContentHash, Error> {
    let mut file = File::open(path)?;
    let mut hasher = blake3::Hasher::new();
    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(ContentHash(*hasher.finalize().as_bytes()))
}

/// Size of the file at `path` in bytes.
pub fn file_size(path: &Path) -> Result<u64, Error> {
    Ok(std::fs::metadata(path)?.len())
}

/// Hash the first [`SAMPLE_CHARS`] characters of an extracted text sample.
/// Characters, not bytes: multi-byte text truncates on a char boundary.
pub fn sample_hash(text: &str) -> SampleHash {
    let sample: String = text.chars().take(SAMPLE_CHARS).collect();
    SampleHash(*blake3::hash(sample.as_bytes()).as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Write;

    #[test]
    fn file_hash_matches_byte_hash() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        let data: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        tmp.write_all(&data).unwrap();

        assert_eq!(hash_file(tmp.path()).unwrap(), hash_bytes(&data));
    }

    #[test]
    fn unreadable_path_is_an_error() {
        let err = hash_file(Path::new("/nonexistent/docpress-test")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert!(file_size(Path::new("/nonexistent/docpress-test")).is_err());
    }

    #[test]
    fn sample_hash_ignores_text_past_the_window() {
        let base = "x".repeat(SAMPLE_CHARS);
        let longer = format!("{base}{}", "tail that must not matter");
        assert_eq!(sample_hash(&base), sample_hash(&longer));

        let differs = format!("y{}", &base[1..]);
        assert_ne!(sample_hash(&base), sample_hash(&differs));
    }

    #[test]
    fn sample_hash_counts_chars_not_bytes() {
        // 1000 two-byte chars; a byte-based cut would split the window.
        let text = "é".repeat(SAMPLE_CHARS);
        let longer = format!("{text}more");
        assert_eq!(sample_hash(&text), sample_hash(&longer));
    }

    proptest! {
        #[test]
        fn prop_hash_deterministic(data in prop::collection::vec(0u8..=255, 0..10_000)) {
            prop_assert_eq!(hash_bytes(&data), hash_bytes(&data));
        }
    }
}
