use std::sync::Arc;

use flywheel_core::analysis::{AnalysisOptions, Analyzer, AnalyzerSettings};
use flywheel_core::domain::audit::AuditId;
use flywheel_core::domain::flywheel::RecommendedAction;
use flywheel_core::domain::report::{ReportKind, ReportRow};
use flywheel_core::errors::AnalysisError;
use flywheel_db::repositories::{
    AnalysisResultRepository, ReportRowRepository, SqlAnalysisRepository, SqlReportRowRepository,
};
use flywheel_db::{connect_with_settings, migrations, DbPool};

async fn setup_pool() -> DbPool {
    let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect test pool");
    migrations::run_pending(&pool).await.expect("run migrations");
    pool
}

fn ad_row(date: &str, sales: f64, spend: f64, clicks: f64, orders: f64) -> ReportRow {
    ReportRow::new(ReportKind::SponsoredProducts)
        .with_field("asin", "B001")
        .with_field("campaign_name", "Lamps - Exact")
        .with_field("date", date)
        .with_field("impressions", 1000.0)
        .with_field("clicks", clicks)
        .with_field("spend", spend)
        .with_field("7_day_total_sales", sales)
        .with_field("7_day_total_orders", orders)
}

fn organic_row(date: &str, revenue: f64, sessions: f64, units: f64) -> ReportRow {
    ReportRow::new(ReportKind::BusinessReport)
        .with_field("child_asin", "B001")
        .with_field("title", "Desk Lamp")
        .with_field("date", date)
        .with_field("sessions", sessions)
        .with_field("units_ordered", units)
        .with_field("ordered_product_sales", revenue)
}

fn audit_rows() -> Vec<ReportRow> {
    vec![
        ad_row("01/01/2024", 50.0, 10.0, 20.0, 5.0),
        ad_row("01/02/2024", 30.0, 8.0, 15.0, 3.0),
        organic_row("01/02/2024", 900.0, 100.0, 30.0),
        organic_row("01/03/2024", 1000.0, 100.0, 35.0),
    ]
}

fn analyzer(pool: &DbPool) -> Analyzer {
    Analyzer::new(
        Arc::new(SqlReportRowRepository::new(pool.clone())),
        Arc::new(SqlAnalysisRepository::new(pool.clone())),
        AnalyzerSettings::default(),
    )
}

#[tokio::test]
async fn stored_rows_flow_through_analysis_into_the_result_table() {
    let pool = setup_pool().await;
    let audit_id = AuditId::new("audit-sql");
    SqlReportRowRepository::new(pool.clone())
        .insert_rows(&audit_id, &audit_rows())
        .await
        .expect("insert rows");

    let options = AnalysisOptions { min_data_points: 3, ..AnalysisOptions::default() };
    let outcome = analyzer(&pool).analyze(&audit_id, options).await.expect("analysis");

    assert!(outcome.persistence_warning.is_none());
    let metrics = &outcome.result.asin_metrics[0];
    assert_eq!(metrics.title.as_deref(), Some("Desk Lamp"));
    assert_eq!(metrics.recommended_action, RecommendedAction::ReduceSpend);

    let stored = SqlAnalysisRepository::new(pool.clone())
        .find_by_audit_id(&audit_id)
        .await
        .expect("read result")
        .expect("stored result");
    assert_eq!(stored, outcome.result);
}

#[tokio::test]
async fn campaign_rollup_reads_the_same_rows() {
    let pool = setup_pool().await;
    let audit_id = AuditId::new("audit-campaigns");
    SqlReportRowRepository::new(pool.clone())
        .insert_rows(&audit_id, &audit_rows())
        .await
        .expect("insert rows");

    let rollup = analyzer(&pool).campaign_rollup(&audit_id).await.expect("rollup");

    assert_eq!(rollup.len(), 1);
    assert_eq!(rollup[0].campaign, "Lamps - Exact");
    assert!((rollup[0].totals.spend - 18.0).abs() < 1e-9);
    assert!((rollup[0].totals.sales - 80.0).abs() < 1e-9);
}

#[tokio::test]
async fn unknown_audit_is_reported_as_no_data() {
    let pool = setup_pool().await;

    let error = analyzer(&pool)
        .analyze(&AuditId::new("audit-missing"), AnalysisOptions::default())
        .await
        .expect_err("no rows stored");

    assert!(matches!(error, AnalysisError::NoData { .. }));
}
