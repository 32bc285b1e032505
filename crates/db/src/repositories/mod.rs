use async_trait::async_trait;
use thiserror::Error;

use flywheel_core::analysis::PortError;
use flywheel_core::domain::audit::AuditId;
use flywheel_core::domain::flywheel::AnalysisResult;
use flywheel_core::domain::report::ReportRow;

pub mod analysis;
pub mod memory;
pub mod report_rows;

pub use analysis::SqlAnalysisRepository;
pub use memory::{InMemoryAnalysisRepository, InMemoryReportRowRepository};
pub use report_rows::SqlReportRowRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<RepositoryError> for PortError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::Database(error) => PortError::Backend(error.to_string()),
            RepositoryError::Decode(message) => PortError::Decode(message),
        }
    }
}

/// Raw report rows per audit. Insertion is the ingestion hand-off; reads
/// return rows in insertion order.
#[async_trait]
pub trait ReportRowRepository: Send + Sync {
    async fn insert_rows(
        &self,
        audit_id: &AuditId,
        rows: &[ReportRow],
    ) -> Result<u64, RepositoryError>;
    async fn list_rows(&self, audit_id: &AuditId) -> Result<Vec<ReportRow>, RepositoryError>;
    async fn delete_rows(&self, audit_id: &AuditId) -> Result<u64, RepositoryError>;
}

/// Latest analysis result per audit.
#[async_trait]
pub trait AnalysisResultRepository: Send + Sync {
    async fn save(&self, result: &AnalysisResult) -> Result<(), RepositoryError>;
    async fn find_by_audit_id(
        &self,
        audit_id: &AuditId,
    ) -> Result<Option<AnalysisResult>, RepositoryError>;
}
