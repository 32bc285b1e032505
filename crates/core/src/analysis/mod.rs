//! Analysis orchestration
//!
//! The analyzer pulls rows from the ingestion collaborator, aggregates them
//! per product, scores every product with enough history, summarizes the
//! portfolio and hands the result to the storage collaborator.

pub mod engine;
pub mod options;
pub mod ports;
pub mod scoring;
pub mod state;
pub mod summary;

pub use engine::{AnalysisOutcome, Analyzer, PersistenceWarning};
pub use options::{AnalysisOptions, AnalyzerSettings};
pub use ports::{AnalysisStore, PortError, ReportSource};
pub use state::{AnalysisRun, AnalysisState, StateTransition};
