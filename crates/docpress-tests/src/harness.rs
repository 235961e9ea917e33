//! Test harness: tempdir-backed environment setup.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Once;
use tempfile::TempDir;

use docpress_ingest::IngestConfig;

static TRACING: Once = Once::new();

/// Install a tracing subscriber once per test binary, honoring `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// A throwaway filesystem environment for one test.
#[derive(Debug)]
pub struct TestEnv {
    temp_dir: TempDir,
}

impl TestEnv {
    /// Fresh environment with an empty temp directory.
    pub fn new() -> Self {
        init_tracing();
        Self {
            temp_dir: tempfile::tempdir().expect("failed to create temp dir"),
        }
    }

    /// Root of the environment's temp directory.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Write an upload source file and return its path.
    pub fn write_upload(&self, name: &str, bytes: &[u8]) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        fs::write(&path, bytes).expect("failed to write upload file");
        path
    }

    /// Ingest configuration pointing into this environment.
    pub fn ingest_config(&self) -> IngestConfig {
        IngestConfig {
            optimized_dir: self.temp_dir.path().join("optimized"),
            ..Default::default()
        }
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}
