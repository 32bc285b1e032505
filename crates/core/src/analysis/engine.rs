use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::aggregation::{Aggregator, CampaignRollup};
use crate::domain::audit::AuditId;
use crate::domain::flywheel::{AnalysisResult, FlywheelMetrics};
use crate::domain::product::ProductAggregate;
use crate::domain::report::ReportRow;
use crate::errors::{AnalysisError, Collaborator};

use super::options::{AnalysisOptions, AnalyzerSettings};
use super::ports::{AnalysisStore, ReportSource};
use super::scoring::{has_sufficient_history, score_product};
use super::state::{AnalysisRun, AnalysisState};
use super::summary::{portfolio_summary, top_opportunities};

/// Non-fatal storage failure. The computed result is still returned.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistenceWarning {
    pub audit_id: AuditId,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AnalysisOutcome {
    pub result: AnalysisResult,
    pub persistence_warning: Option<PersistenceWarning>,
    pub run: AnalysisRun,
}

pub struct Analyzer {
    source: Arc<dyn ReportSource>,
    store: Arc<dyn AnalysisStore>,
    aggregator: Aggregator,
    settings: AnalyzerSettings,
}

impl Analyzer {
    pub fn new(
        source: Arc<dyn ReportSource>,
        store: Arc<dyn AnalysisStore>,
        settings: AnalyzerSettings,
    ) -> Self {
        Self { source, store, aggregator: Aggregator::new(), settings }
    }

    pub fn settings(&self) -> &AnalyzerSettings {
        &self.settings
    }

    /// Runs the full pipeline for one audit: aggregate, score, summarize,
    /// persist. The returned run records every state the pipeline passed
    /// through.
    pub async fn analyze(
        &self,
        audit_id: &AuditId,
        options: AnalysisOptions,
    ) -> Result<AnalysisOutcome, AnalysisError> {
        options.validate()?;

        info!(
            event_name = "analysis.run.started",
            correlation_id = %audit_id,
            min_data_points = options.min_data_points,
            trend_window_days = options.trend_window_days,
            top_opportunities = options.top_opportunities,
            "analysis run started"
        );

        let mut run = AnalysisRun::new(audit_id.clone());
        match self.execute(&mut run, options).await {
            Ok((result, persistence_warning)) => {
                advance(&mut run, AnalysisState::Done)?;
                info!(
                    event_name = "analysis.run.completed",
                    correlation_id = %audit_id,
                    total_asins_analyzed = result.total_asins_analyzed,
                    insufficient_history_count = result.insufficient_history_count,
                    opportunities = result.opportunities.len(),
                    persisted = persistence_warning.is_none(),
                    "analysis run completed"
                );
                Ok(AnalysisOutcome { result, persistence_warning, run })
            }
            Err(error) => {
                if !run.state.is_terminal() {
                    advance(&mut run, AnalysisState::Failed)?;
                }
                warn!(
                    event_name = "analysis.run.failed",
                    correlation_id = %audit_id,
                    error = %error,
                    retryable = error.is_retryable(),
                    "analysis run failed"
                );
                Err(error)
            }
        }
    }

    async fn execute(
        &self,
        run: &mut AnalysisRun,
        options: AnalysisOptions,
    ) -> Result<(AnalysisResult, Option<PersistenceWarning>), AnalysisError> {
        let audit_id = run.audit_id.clone();

        advance(run, AnalysisState::Aggregating)?;
        let rows = self.fetch_rows(&audit_id).await?;
        let aggregation = self.aggregator.aggregate(&rows);
        if aggregation.is_empty() {
            return Err(AnalysisError::NoData { audit_id });
        }
        if aggregation.skipped_rows > 0 {
            warn!(
                event_name = "analysis.rows.skipped",
                correlation_id = %audit_id,
                skipped_rows = aggregation.skipped_rows,
                "rows without a product identifier were skipped"
            );
        }

        advance(run, AnalysisState::Scoring)?;
        let (eligible, insufficient): (Vec<ProductAggregate>, Vec<ProductAggregate>) = aggregation
            .products
            .into_values()
            .partition(|aggregate| has_sufficient_history(aggregate, &options));
        let asin_metrics = self.score_all(eligible, options).await?;

        advance(run, AnalysisState::Summarizing)?;
        let result = AnalysisResult {
            audit_id: audit_id.clone(),
            analyzed_at: Utc::now(),
            total_asins_analyzed: asin_metrics.len(),
            insufficient_history_count: insufficient.len(),
            summary: portfolio_summary(&asin_metrics),
            opportunities: top_opportunities(&asin_metrics, options.top_opportunities),
            asin_metrics,
        };

        advance(run, AnalysisState::Persisting)?;
        let warning = self.persist(&result).await?;

        Ok((result, warning))
    }

    async fn fetch_rows(&self, audit_id: &AuditId) -> Result<Vec<ReportRow>, AnalysisError> {
        let timeout = self.settings.ingestion_timeout;
        match tokio::time::timeout(timeout, self.source.fetch_rows(audit_id)).await {
            Ok(Ok(rows)) => Ok(rows),
            Ok(Err(error)) => Err(AnalysisError::Ingestion(error.to_string())),
            Err(_) => Err(upstream_timeout(Collaborator::Ingestion, timeout)),
        }
    }

    /// Scores products on spawned tasks, at most `max_concurrency` at once.
    /// Output is ordered by ASIN regardless of completion order.
    async fn score_all(
        &self,
        products: Vec<ProductAggregate>,
        options: AnalysisOptions,
    ) -> Result<Vec<FlywheelMetrics>, AnalysisError> {
        let semaphore = Arc::new(Semaphore::new(self.settings.max_concurrency.max(1)));
        let mut handles = Vec::with_capacity(products.len());

        for aggregate in products {
            let semaphore = Arc::clone(&semaphore);
            handles.push(tokio::spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|error| AnalysisError::ScoringTask(error.to_string()))?;
                Ok::<_, AnalysisError>(score_product(&aggregate, &options))
            }));
        }

        let mut scored = Vec::with_capacity(handles.len());
        for handle in handles {
            let metrics =
                handle.await.map_err(|error| AnalysisError::ScoringTask(error.to_string()))??;
            scored.extend(metrics);
        }

        scored.sort_by(|left, right| left.asin.cmp(&right.asin));
        Ok(scored)
    }

    async fn persist(
        &self,
        result: &AnalysisResult,
    ) -> Result<Option<PersistenceWarning>, AnalysisError> {
        let timeout = self.settings.storage_timeout;
        match tokio::time::timeout(timeout, self.store.save(result)).await {
            Ok(Ok(())) => Ok(None),
            Ok(Err(error)) => {
                warn!(
                    event_name = "analysis.persist.failed",
                    correlation_id = %result.audit_id,
                    error = %error,
                    "analysis result was computed but not stored"
                );
                Ok(Some(PersistenceWarning {
                    audit_id: result.audit_id.clone(),
                    message: error.to_string(),
                }))
            }
            Err(_) => Err(upstream_timeout(Collaborator::Storage, timeout)),
        }
    }

    /// Reads a previously stored result.
    pub async fn fetch_stored(
        &self,
        audit_id: &AuditId,
    ) -> Result<Option<AnalysisResult>, AnalysisError> {
        let timeout = self.settings.storage_timeout;
        match tokio::time::timeout(timeout, self.store.find_by_audit_id(audit_id)).await {
            Ok(result) => result.map_err(|error| AnalysisError::StorageRead(error.to_string())),
            Err(_) => Err(upstream_timeout(Collaborator::Storage, timeout)),
        }
    }

    /// Per-campaign advertising rollup for one audit.
    pub async fn campaign_rollup(
        &self,
        audit_id: &AuditId,
    ) -> Result<Vec<CampaignRollup>, AnalysisError> {
        let rows = self.fetch_rows(audit_id).await?;
        let rollup = self.aggregator.campaign_rollup(&rows);
        if rollup.is_empty() {
            return Err(AnalysisError::NoData { audit_id: audit_id.clone() });
        }
        Ok(rollup)
    }
}

fn advance(run: &mut AnalysisRun, next: AnalysisState) -> Result<(), AnalysisError> {
    let from = run.state;
    run.transition_to(next)?;
    info!(
        event_name = "analysis.state.transition",
        correlation_id = %run.audit_id,
        from = %from,
        to = %next,
        "analysis state changed"
    );
    Ok(())
}

fn upstream_timeout(collaborator: Collaborator, timeout: Duration) -> AnalysisError {
    AnalysisError::UpstreamTimeout { collaborator, timeout_secs: timeout.as_secs() }
}
