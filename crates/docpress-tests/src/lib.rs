//! Docpress test and validation infrastructure.
//!
//! Cross-crate integration tests for the ingestion-reduction-tiering
//! pipeline: end-to-end ingest scenarios, duplicate-resolution precedence,
//! concurrent canonical races, tiering idempotence, and property suites.

pub mod harness;


pub use harness::TestEnv;
