use std::collections::HashMap;

use tokio::sync::RwLock;

use flywheel_core::analysis::{AnalysisStore, PortError, ReportSource};
use flywheel_core::domain::audit::AuditId;
use flywheel_core::domain::flywheel::AnalysisResult;
use flywheel_core::domain::report::ReportRow;

use super::{AnalysisResultRepository, RepositoryError, ReportRowRepository};

#[derive(Default)]
pub struct InMemoryReportRowRepository {
    rows: RwLock<HashMap<String, Vec<ReportRow>>>,
}

#[async_trait::async_trait]
impl ReportRowRepository for InMemoryReportRowRepository {
    async fn insert_rows(
        &self,
        audit_id: &AuditId,
        rows: &[ReportRow],
    ) -> Result<u64, RepositoryError> {
        let mut stored = self.rows.write().await;
        stored.entry(audit_id.0.clone()).or_default().extend_from_slice(rows);
        Ok(rows.len() as u64)
    }

    async fn list_rows(&self, audit_id: &AuditId) -> Result<Vec<ReportRow>, RepositoryError> {
        let stored = self.rows.read().await;
        Ok(stored.get(&audit_id.0).cloned().unwrap_or_default())
    }

    async fn delete_rows(&self, audit_id: &AuditId) -> Result<u64, RepositoryError> {
        let mut stored = self.rows.write().await;
        Ok(stored.remove(&audit_id.0).map(|rows| rows.len() as u64).unwrap_or(0))
    }
}

#[async_trait::async_trait]
impl ReportSource for InMemoryReportRowRepository {
    async fn fetch_rows(&self, audit_id: &AuditId) -> Result<Vec<ReportRow>, PortError> {
        self.list_rows(audit_id).await.map_err(PortError::from)
    }
}

#[derive(Default)]
pub struct InMemoryAnalysisRepository {
    results: RwLock<HashMap<String, AnalysisResult>>,
}

#[async_trait::async_trait]
impl AnalysisResultRepository for InMemoryAnalysisRepository {
    async fn save(&self, result: &AnalysisResult) -> Result<(), RepositoryError> {
        let mut results = self.results.write().await;
        results.insert(result.audit_id.0.clone(), result.clone());
        Ok(())
    }

    async fn find_by_audit_id(
        &self,
        audit_id: &AuditId,
    ) -> Result<Option<AnalysisResult>, RepositoryError> {
        let results = self.results.read().await;
        Ok(results.get(&audit_id.0).cloned())
    }
}

#[async_trait::async_trait]
impl AnalysisStore for InMemoryAnalysisRepository {
    async fn save(&self, result: &AnalysisResult) -> Result<(), PortError> {
        AnalysisResultRepository::save(self, result).await.map_err(PortError::from)
    }

    async fn find_by_audit_id(
        &self,
        audit_id: &AuditId,
    ) -> Result<Option<AnalysisResult>, PortError> {
        AnalysisResultRepository::find_by_audit_id(self, audit_id).await.map_err(PortError::from)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use flywheel_core::domain::audit::AuditId;
    use flywheel_core::domain::flywheel::{AnalysisResult, PortfolioSummary};
    use flywheel_core::domain::report::{ReportKind, ReportRow};

    use crate::repositories::{
        AnalysisResultRepository, InMemoryAnalysisRepository, InMemoryReportRowRepository,
        ReportRowRepository,
    };

    #[tokio::test]
    async fn in_memory_report_rows_append_per_audit() {
        let repo = InMemoryReportRowRepository::default();
        let audit_id = AuditId::new("audit-1");
        let row = ReportRow::new(ReportKind::SponsoredBrands).with_field("asin", "B001");

        repo.insert_rows(&audit_id, &[row.clone()]).await.expect("first insert");
        repo.insert_rows(&audit_id, &[row.clone()]).await.expect("second insert");

        assert_eq!(repo.list_rows(&audit_id).await.expect("list"), vec![row.clone(), row]);
        assert_eq!(repo.delete_rows(&audit_id).await.expect("delete"), 2);
        assert!(repo.list_rows(&audit_id).await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn in_memory_analysis_repo_round_trip() {
        let repo = InMemoryAnalysisRepository::default();
        let result = AnalysisResult {
            audit_id: AuditId::new("audit-1"),
            analyzed_at: Utc::now(),
            total_asins_analyzed: 0,
            insufficient_history_count: 0,
            summary: PortfolioSummary {
                total_revenue: 0.0,
                total_ad_revenue: 0.0,
                total_ad_spend: 0.0,
                blended_acos: 0.0,
                blended_roas: 0.0,
            },
            asin_metrics: Vec::new(),
            opportunities: Vec::new(),
        };

        repo.save(&result).await.expect("save result");
        let found = repo.find_by_audit_id(&result.audit_id).await.expect("find result");

        assert_eq!(found, Some(result));
    }
}
