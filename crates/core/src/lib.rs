pub mod aggregation;
pub mod analysis;
pub mod config;
pub mod domain;
pub mod errors;
pub mod metrics;

pub use aggregation::{Aggregation, Aggregator, CampaignRollup};
pub use analysis::{
    AnalysisOptions, AnalysisOutcome, AnalysisRun, AnalysisState, AnalysisStore, Analyzer,
    AnalyzerSettings, PersistenceWarning, PortError, ReportSource,
};
pub use domain::audit::AuditId;
pub use domain::flywheel::{
    AnalysisResult, ConfidenceLevel, FlywheelMetrics, FlywheelTrend, Opportunity,
    PortfolioSummary, RecommendedAction,
};
pub use domain::product::{Asin, DailyMetricPoint, ProductAggregate};
pub use domain::report::{FieldValue, ReportKind, ReportRow};
pub use errors::{AnalysisError, Collaborator, DomainError, InterfaceError};
