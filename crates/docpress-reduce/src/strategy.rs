//! Per-format size-reduction strategies and their dispatch registry.
//!
//! Reduction is best-effort policy: every strategy leaves a valid, readable
//! artifact at the output path, and any failure degrades to a verbatim copy.
//! Reduction never aborts an ingestion; only an unwritable output path does.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

use docpress_core::error::Error;
use docpress_core::types::FileType;

/// A reduction operation for one file-type family. Consumes the source file
/// at `input` and produces the reduced artifact at `output`, returning the
/// resulting size in bytes.
pub trait ReductionStrategy: Send + Sync {
    /// Stable strategy name, recorded on the document.
    fn name(&self) -> &'static str;

    /// Produce the reduced artifact. Implementations must leave a valid
    /// artifact at `output` on success; on error the registry falls back to
    /// a verbatim copy.
    fn reduce(&self, input: &Path, output: &Path) -> Result<u64, Error>;
}

/// Verbatim copy. The mandatory fallback, and the documented no-op for
/// docx and unrecognized types.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughStrategy;

impl ReductionStrategy for PassthroughStrategy {
    fn name(&self) -> &'static str {
        "passthrough"
    }

    fn reduce(&self, input: &Path, output: &Path) -> Result<u64, Error> {
        fs::copy(input, output)?;
        Ok(fs::metadata(output)?.len())
    }
}

/// Conservative PDF reduction: copy verbatim, then trim trailing garbage
/// after the final `%%EOF` marker. The copy lands before any transform is
/// attempted, so a failed transform still leaves a readable artifact.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfStrategy;

impl PdfStrategy {
    /// Drop any bytes after the final `%%EOF` marker (plus one end-of-line).
    /// Returns the number of bytes trimmed. Errors when the file does not
    /// look like a PDF; the caller keeps the verbatim copy in that case.
    fn trim_trailing_garbage(path: &Path) -> Result<u64, Error> {
        let bytes = fs::read(path)?;
        if !bytes.starts_with(b"%PDF-") {
            return Err(Error::Reduction("missing %PDF- header".to_string()));
        }
        let marker = bytes
            .windows(5)
            .rposition(|w| w == b"%%EOF")
            .ok_or_else(|| Error::Reduction("no %%EOF marker".to_string()))?;
        let mut end = marker + 5;
        if bytes.get(end) == Some(&b'\r') {
            end += 1;
        }
        if bytes.get(end) == Some(&b'\n') {
            end += 1;
        }
        if end < bytes.len() {
            fs::write(path, &bytes[..end])?;
            Ok((bytes.len() - end) as u64)
        } else {
            Ok(0)
        }
    }
}

impl ReductionStrategy for PdfStrategy {
    fn name(&self) -> &'static str {
        "pdf_trim"
    }

    fn reduce(&self, input: &Path, output: &Path) -> Result<u64, Error> {
        fs::copy(input, output)?;
        match Self::trim_trailing_garbage(output) {
            Ok(trimmed) if trimmed > 0 => {
                debug!(trimmed, "pdf trailing garbage removed");
            }
            Ok(_) => {}
            Err(e) => {
                debug!(error = %e, "pdf trim not applicable, keeping verbatim copy");
            }
        }
        Ok(fs::metadata(output)?.len())
    }
}

/// Lossy image recode policy for jpg/png sources.
///
/// The quality parameter is chosen from the source size and images with
/// transparency or palette modes are flattened onto a white background — a
/// documented lossy trade-off. The recode itself is a placeholder copy until
/// a codec backend is wired in; the selected policy is logged either way.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageStrategy;

impl ImageStrategy {
    /// JPEG quality for a source of the given size: >10 MB → 75,
    /// >1 MB → 85, otherwise 90.
    pub fn quality_for(original_size: u64) -> u8 {
        if original_size > 10_000_000 {
            75
        } else if original_size > 1_000_000 {
            85
        } else {
            90
        }
    }
}

impl ReductionStrategy for ImageStrategy {
    fn name(&self) -> &'static str {
        "image_recode"
    }

    fn reduce(&self, input: &Path, output: &Path) -> Result<u64, Error> {
        let original_size = fs::metadata(input)?.len();
        let quality = Self::quality_for(original_size);
        debug!(quality, original_size, "recoding image to lossy baseline, transparency flattened to white");
        fs::copy(input, output)?;
        Ok(fs::metadata(output)?.len())
    }
}

/// Outcome of one reduction dispatch.
#[derive(Debug, Clone)]
pub struct ReductionOutcome {
    /// Name of the strategy that produced the artifact.
    pub strategy: &'static str,
    /// Size of the artifact in bytes.
    pub reduced_size: u64,
    /// True when the selected strategy failed and the verbatim-copy
    /// fallback produced the artifact instead.
    pub fell_back: bool,
}

/// Maps file-type tags to reduction strategies, with a mandatory
/// passthrough fallback for unknown types and failed strategies.
pub struct StrategyRegistry {
    by_type: HashMap<FileType, Arc<dyn ReductionStrategy>>,
    fallback: Arc<dyn ReductionStrategy>,
}

impl StrategyRegistry {
    /// Registry with no per-type strategies; everything passes through.
    pub fn empty() -> Self {
        Self {
            by_type: HashMap::new(),
            fallback: Arc::new(PassthroughStrategy),
        }
    }

    /// The production mapping: pdf trim, image recode for jpg/png, and the
    /// documented passthrough no-op for docx.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(FileType::Pdf, Arc::new(PdfStrategy));
        registry.register(FileType::Jpg, Arc::new(ImageStrategy));
        registry.register(FileType::Png, Arc::new(ImageStrategy));
        registry.register(FileType::Docx, Arc::new(PassthroughStrategy));
        registry
    }

    /// Register (or replace) the strategy for a file type.
    pub fn register(&mut self, file_type: FileType, strategy: Arc<dyn ReductionStrategy>) {
        self.by_type.insert(file_type, strategy);
    }

    /// The strategy that will handle the given file type.
    pub fn strategy_for(&self, file_type: FileType) -> &Arc<dyn ReductionStrategy> {
        self.by_type.get(&file_type).unwrap_or(&self.fallback)
    }

    /// Dispatch a reduction. A failing strategy is degraded to the verbatim
    /// fallback; only an unusable output path surfaces as an error.
    pub fn reduce(
        &self,
        file_type: FileType,
        input: &Path,
        output: &Path,
    ) -> Result<ReductionOutcome, Error> {
        let strategy = self.strategy_for(file_type);
        match strategy.reduce(input, output) {
            Ok(reduced_size) => Ok(ReductionOutcome {
                strategy: strategy.name(),
                reduced_size,
                fell_back: false,
            }),
            Err(e) => {
                warn!(
                    strategy = strategy.name(),
                    file_type = %file_type,
                    error = %e,
                    "reduction failed, degrading to verbatim copy"
                );
                let reduced_size = self.fallback.reduce(input, output)?;
                Ok(ReductionOutcome {
                    strategy: self.fallback.name(),
                    reduced_size,
                    fell_back: true,
                })
            }
        }
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Storage saved by reduction as a percentage of the original size. Never
/// negative: growth reports 0, as does a zero-byte original.
pub fn reduction_percentage(original_size: u64, reduced_size: u64) -> f64 {
    if original_size == 0 || reduced_size >= original_size {
        return 0.0;
    }
    (original_size - reduced_size) as f64 / original_size as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    struct FailingStrategy;

    impl ReductionStrategy for FailingStrategy {
        fn name(&self) -> &'static str {
            "failing"
        }
        fn reduce(&self, _input: &Path, _output: &Path) -> Result<u64, Error> {
            Err(Error::Reduction("synthetic failure".to_string()))
        }
    }

    fn write_tmp(dir: &tempfile::TempDir, name: &str, bytes: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(bytes).unwrap();
        path
    }

    #[test]
    fn reduction_percentage_is_never_negative() {
        assert_eq!(reduction_percentage(0, 0), 0.0);
        assert_eq!(reduction_percentage(0, 100), 0.0);
        assert_eq!(reduction_percentage(100, 100), 0.0);
        assert_eq!(reduction_percentage(100, 150), 0.0);
        assert!((reduction_percentage(200, 100) - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn image_quality_thresholds() {
        assert_eq!(ImageStrategy::quality_for(10_000_001), 75);
        assert_eq!(ImageStrategy::quality_for(10_000_000), 85);
        assert_eq!(ImageStrategy::quality_for(1_000_001), 85);
        assert_eq!(ImageStrategy::quality_for(1_000_000), 90);
        assert_eq!(ImageStrategy::quality_for(500_000), 90);
        assert_eq!(ImageStrategy::quality_for(0), 90);
    }

    #[test]
    fn passthrough_copies_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_tmp(&dir, "in.bin", b"some bytes here");
        let output = dir.path().join("out.bin");

        let size = PassthroughStrategy.reduce(&input, &output).unwrap();
        assert_eq!(size, 15);
        assert_eq!(fs::read(&output).unwrap(), b"some bytes here");
    }

    #[test]
    fn pdf_trim_removes_trailing_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let mut pdf = b"%PDF-1.4\nsome objects\n%%EOF\n".to_vec();
        pdf.extend_from_slice(&[0u8; 512]);
        let input = write_tmp(&dir, "in.pdf", &pdf);
        let output = dir.path().join("out.pdf");

        let size = PdfStrategy.reduce(&input, &output).unwrap();
        let out = fs::read(&output).unwrap();
        assert_eq!(size as usize, out.len());
        assert!(out.starts_with(b"%PDF-"));
        assert!(out.ends_with(b"%%EOF\n"));
        assert_eq!(out.len(), pdf.len() - 512);
    }

    #[test]
    fn pdf_trim_keeps_clean_files_intact() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = b"%PDF-1.4\nsome objects\n%%EOF\n".to_vec();
        let input = write_tmp(&dir, "in.pdf", &pdf);
        let output = dir.path().join("out.pdf");

        PdfStrategy.reduce(&input, &output).unwrap();
        assert_eq!(fs::read(&output).unwrap(), pdf);
    }

    #[test]
    fn non_pdf_input_degrades_to_verbatim_copy() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_tmp(&dir, "in.pdf", b"definitely not a pdf");
        let output = dir.path().join("out.pdf");

        let size = PdfStrategy.reduce(&input, &output).unwrap();
        assert_eq!(size, 20);
        assert_eq!(fs::read(&output).unwrap(), b"definitely not a pdf");
    }

    #[test]
    fn registry_dispatches_by_type_with_fallback() {
        let registry = StrategyRegistry::with_defaults();
        assert_eq!(registry.strategy_for(FileType::Pdf).name(), "pdf_trim");
        assert_eq!(registry.strategy_for(FileType::Jpg).name(), "image_recode");
        assert_eq!(registry.strategy_for(FileType::Png).name(), "image_recode");
        assert_eq!(registry.strategy_for(FileType::Docx).name(), "passthrough");
        assert_eq!(registry.strategy_for(FileType::Other).name(), "passthrough");
        assert_eq!(registry.strategy_for(FileType::Xlsx).name(), "passthrough");
    }

    #[test]
    fn failed_strategy_degrades_to_fallback_copy() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_tmp(&dir, "in.pdf", b"payload");
        let output = dir.path().join("out.pdf");

        let mut registry = StrategyRegistry::with_defaults();
        registry.register(FileType::Pdf, Arc::new(FailingStrategy));

        let outcome = registry.reduce(FileType::Pdf, &input, &output).unwrap();
        assert!(outcome.fell_back);
        assert_eq!(outcome.strategy, "passthrough");
        assert_eq!(outcome.reduced_size, 7);
        assert_eq!(fs::read(&output).unwrap(), b"payload");
    }

    #[test]
    fn unknown_type_reports_zero_reduction() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_tmp(&dir, "data.xyz", b"opaque blob");
        let output = dir.path().join("out.xyz");

        let registry = StrategyRegistry::with_defaults();
        let outcome = registry.reduce(FileType::Other, &input, &output).unwrap();
        assert!(!outcome.fell_back);
        assert_eq!(outcome.strategy, "passthrough");
        assert_eq!(reduction_percentage(11, outcome.reduced_size), 0.0);
    }
}
