use async_trait::async_trait;
use thiserror::Error;

use crate::domain::audit::AuditId;
use crate::domain::flywheel::AnalysisResult;
use crate::domain::report::ReportRow;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PortError {
    #[error("backend failure: {0}")]
    Backend(String),
    #[error("decode failure: {0}")]
    Decode(String),
}

/// Ingestion collaborator. Hands over the already-parsed rows of one audit.
#[async_trait]
pub trait ReportSource: Send + Sync {
    async fn fetch_rows(&self, audit_id: &AuditId) -> Result<Vec<ReportRow>, PortError>;
}

/// Storage collaborator. Saving is keyed by audit id and replaces any
/// earlier result for the same audit.
#[async_trait]
pub trait AnalysisStore: Send + Sync {
    async fn save(&self, result: &AnalysisResult) -> Result<(), PortError>;
    async fn find_by_audit_id(
        &self,
        audit_id: &AuditId,
    ) -> Result<Option<AnalysisResult>, PortError>;
}
