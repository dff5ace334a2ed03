//! Mines a git repository's history into per-day metrics: lines changed,
//! languages touched, libraries imported and contributing authors.
//!
//! The pipeline has three stages. [`harvest`] pages through `git log` on a
//! pool of workers, [`analysis`] detects languages and extracts imports per
//! commit on a second pool, and a single [`aggregate::Aggregator`] folds the
//! results into day buckets that [`export`] writes as a sorted JSON array.

pub mod aggregate;
pub mod analysis;
pub mod cli;
pub mod deadline;
pub mod error;
pub mod export;
pub mod extractor;
pub mod git;
pub mod harvest;
pub mod language;
pub mod libraries;
pub mod model;
pub mod obfuscate;
pub mod select;
pub mod util;

pub use error::{HistmineError, Result};
pub use extractor::{ExtractionReport, ExtractorConfig, RepoExtractor};
