#![warn(missing_docs)]

//! Docpress ingestion: the per-file pipeline orchestrating fingerprinting,
//! duplicate resolution, size reduction, and tier assignment, plus the
//! engine facade handed to the serving layer.

pub mod metrics;
pub mod pipeline;
pub mod service;

pub use metrics::{IngestMetrics, IngestSnapshot};
pub use pipeline::{IngestConfig, IngestOutcome, IngestionPipeline};
pub use service::DocEngine;
