use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row};

use flywheel_core::analysis::{AnalysisStore, PortError};
use flywheel_core::domain::audit::AuditId;
use flywheel_core::domain::flywheel::AnalysisResult;

use super::{AnalysisResultRepository, RepositoryError};
use crate::DbPool;

pub struct SqlAnalysisRepository {
    pool: DbPool,
}

impl SqlAnalysisRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl AnalysisResultRepository for SqlAnalysisRepository {
    async fn save(&self, result: &AnalysisResult) -> Result<(), RepositoryError> {
        let result_json = serde_json::to_string(result).map_err(|error| {
            RepositoryError::Decode(format!("could not encode analysis result: {error}"))
        })?;

        sqlx::query(
            "INSERT INTO analysis_result (
                audit_id,
                analyzed_at,
                total_asins_analyzed,
                insufficient_history_count,
                total_revenue,
                total_ad_spend,
                blended_acos,
                blended_roas,
                opportunity_count,
                result_json,
                updated_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(audit_id) DO UPDATE SET
                analyzed_at = excluded.analyzed_at,
                total_asins_analyzed = excluded.total_asins_analyzed,
                insufficient_history_count = excluded.insufficient_history_count,
                total_revenue = excluded.total_revenue,
                total_ad_spend = excluded.total_ad_spend,
                blended_acos = excluded.blended_acos,
                blended_roas = excluded.blended_roas,
                opportunity_count = excluded.opportunity_count,
                result_json = excluded.result_json,
                updated_at = excluded.updated_at",
        )
        .bind(result.audit_id.as_str())
        .bind(result.analyzed_at.to_rfc3339())
        .bind(to_i64("total_asins_analyzed", result.total_asins_analyzed)?)
        .bind(to_i64("insufficient_history_count", result.insufficient_history_count)?)
        .bind(result.summary.total_revenue)
        .bind(result.summary.total_ad_spend)
        .bind(result.summary.blended_acos)
        .bind(result.summary.blended_roas)
        .bind(to_i64("opportunity_count", result.opportunities.len())?)
        .bind(result_json)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_audit_id(
        &self,
        audit_id: &AuditId,
    ) -> Result<Option<AnalysisResult>, RepositoryError> {
        let row = sqlx::query("SELECT result_json FROM analysis_result WHERE audit_id = ?")
            .bind(audit_id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(result_from_row).transpose()
    }
}

#[async_trait::async_trait]
impl AnalysisStore for SqlAnalysisRepository {
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

fn result_from_row(row: SqliteRow) -> Result<AnalysisResult, RepositoryError> {
    let result_json = row.try_get::<String, _>("result_json")?;
    serde_json::from_str(&result_json)
        .map_err(|error| RepositoryError::Decode(format!("invalid result_json: {error}")))
}

fn to_i64(column: &str, value: usize) -> Result<i64, RepositoryError> {
    i64::try_from(value).map_err(|_| {
        RepositoryError::Decode(format!("value for `{column}` does not fit in i64: {value}"))
    })
}
