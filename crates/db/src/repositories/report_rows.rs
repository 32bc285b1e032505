use std::collections::BTreeMap;

use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row};
use tracing::debug;

use flywheel_core::analysis::{PortError, ReportSource};
use flywheel_core::domain::audit::AuditId;
use flywheel_core::domain::report::{FieldValue, ReportKind, ReportRow};

use super::{RepositoryError, ReportRowRepository};
use crate::DbPool;

pub struct SqlReportRowRepository {
    pool: DbPool,
}

impl SqlReportRowRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ReportRowRepository for SqlReportRowRepository {
    async fn insert_rows(
        &self,
        audit_id: &AuditId,
        rows: &[ReportRow],
    ) -> Result<u64, RepositoryError> {
        let created_at = Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await?;

        for row in rows {
            let fields_json = serde_json::to_string(&row.fields).map_err(|error| {
                RepositoryError::Decode(format!("could not encode report row fields: {error}"))
            })?;

            sqlx::query(
                "INSERT INTO report_row (audit_id, report_kind, fields_json, created_at)
                 VALUES (?, ?, ?, ?)",
            )
            .bind(audit_id.as_str())
            .bind(row.kind.as_str())
            .bind(fields_json)
            .bind(&created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        debug!(
            event_name = "db.report_rows.inserted",
            correlation_id = %audit_id,
            rows = rows.len(),
            "report rows stored"
        );
        Ok(rows.len() as u64)
    }

    async fn list_rows(&self, audit_id: &AuditId) -> Result<Vec<ReportRow>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT report_kind, fields_json
             FROM report_row
             WHERE audit_id = ?
             ORDER BY id ASC",
        )
        .bind(audit_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(report_row_from_row).collect()
    }

    async fn delete_rows(&self, audit_id: &AuditId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM report_row WHERE audit_id = ?")
            .bind(audit_id.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

#[async_trait::async_trait]
impl ReportSource for SqlReportRowRepository {
    async fn fetch_rows(&self, audit_id: &AuditId) -> Result<Vec<ReportRow>, PortError> {
        self.list_rows(audit_id).await.map_err(PortError::from)
    }
}

fn report_row_from_row(row: SqliteRow) -> Result<ReportRow, RepositoryError> {
    let kind_raw = row.try_get::<String, _>("report_kind")?;
    let kind = kind_raw
        .parse::<ReportKind>()
        .map_err(|error| RepositoryError::Decode(error.to_string()))?;

    let fields_json = row.try_get::<String, _>("fields_json")?;
    let fields = serde_json::from_str::<BTreeMap<String, FieldValue>>(&fields_json)
        .map_err(|error| RepositoryError::Decode(format!("invalid fields_json: {error}")))?;

    Ok(ReportRow { kind, fields })
}

#[cfg(test)]
mod tests {
    use flywheel_core::analysis::ReportSource;
    use flywheel_core::domain::audit::AuditId;
    use flywheel_core::domain::report::{FieldValue, ReportKind, ReportRow};

    use super::SqlReportRowRepository;
    use crate::migrations;
    use crate::repositories::{RepositoryError, ReportRowRepository};
    use crate::{connect_with_settings, DbPool};

    async fn setup_pool() -> DbPool {
        let pool =
            connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect test pool");
        migrations::run_pending(&pool).await.expect("run migrations");
        pool
    }

    fn sample_rows() -> Vec<ReportRow> {
        vec![
            ReportRow::new(ReportKind::SponsoredProducts)
                .with_field("asin", "B001")
                .with_field("date", "01/02/2024")
                .with_field("spend", 12.5)
                .with_field("7_day_total_sales", "$40.00"),
            ReportRow::new(ReportKind::BusinessReport)
                .with_field("child_asin", "B001")
                .with_field("sessions", 120.0)
                .with_field("title", "Desk Lamp"),
        ]
    }

    #[tokio::test]
    async fn rows_round_trip_in_insertion_order() {
        let pool = setup_pool().await;
        let repo = SqlReportRowRepository::new(pool);
        let audit_id = AuditId::new("audit-1");

        let inserted = repo.insert_rows(&audit_id, &sample_rows()).await.expect("insert");
        assert_eq!(inserted, 2);

        let rows = repo.fetch_rows(&audit_id).await.expect("fetch");
        assert_eq!(rows, sample_rows());
        assert_eq!(rows[0].field("spend"), Some(&FieldValue::Number(12.5)));
    }

    #[tokio::test]
    async fn audits_are_isolated_and_deletable() {
        let pool = setup_pool().await;
        let repo = SqlReportRowRepository::new(pool);
        let first = AuditId::new("audit-1");
        let second = AuditId::new("audit-2");

        repo.insert_rows(&first, &sample_rows()).await.expect("insert first");
        repo.insert_rows(&second, &sample_rows()[..1]).await.expect("insert second");

        assert_eq!(repo.list_rows(&second).await.expect("list").len(), 1);
        assert_eq!(repo.delete_rows(&first).await.expect("delete"), 2);
        assert!(repo.list_rows(&first).await.expect("list").is_empty());
        assert!(repo.list_rows(&AuditId::new("unknown")).await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn corrupt_fields_surface_as_decode_errors() {
        let pool = setup_pool().await;
        sqlx::query(
            "INSERT INTO report_row (audit_id, report_kind, fields_json, created_at)
             VALUES ('audit-bad', 'business_report', 'not json', '2026-01-01T00:00:00Z')",
        )
        .execute(&pool)
        .await
        .expect("insert corrupt row");

        let repo = SqlReportRowRepository::new(pool);
        let error = repo.list_rows(&AuditId::new("audit-bad")).await.expect_err("corrupt row");
        assert!(matches!(
            error,
            RepositoryError::Decode(ref message) if message.contains("fields_json")
        ));
    }
}
