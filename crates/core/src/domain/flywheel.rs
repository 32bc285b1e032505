//! Output shapes of an analysis run.
//!
//! These types are persisted and consumed downstream (report rendering,
//! goal-based re-ranking), so field names and units are part of the contract:
//! percentages are on the 0–100 scale and currency is in decimal units.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::audit::AuditId;
use crate::domain::product::Asin;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlywheelTrend {
    Increasing,
    Stable,
    Decreasing,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendedAction {
    Maintain,
    ReduceSpend,
    IncreaseSpend,
    Pause,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueSplit {
    pub total: f64,
    pub ad_attributed: f64,
    pub organic: f64,
    pub attribution_percentage: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitSplit {
    pub total: u64,
    pub ad_attributed: u64,
    pub organic: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvertisingEfficiency {
    pub spend: f64,
    pub impressions: u64,
    pub clicks: u64,
    pub acos: f64,
    pub roas: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionComparison {
    pub ad_conversion_rate: f64,
    pub organic_conversion_rate: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlywheelMetrics {
    pub asin: Asin,
    pub title: Option<String>,
    pub date_range: DateRange,
    pub data_points: usize,
    pub revenue: RevenueSplit,
    pub units: UnitSplit,
    pub advertising: AdvertisingEfficiency,
    pub conversion: ConversionComparison,
    pub flywheel_score: f64,
    pub flywheel_trend: FlywheelTrend,
    pub trend_confidence: f64,
    pub recommended_action: RecommendedAction,
    pub recommended_spend_reduction_percent: Option<u32>,
    pub confidence_level: ConfidenceLevel,
    pub reasoning: Vec<String>,
}

impl FlywheelMetrics {
    /// Monthly ad spend that the recommendation would free up.
    pub fn estimated_monthly_savings(&self) -> f64 {
        match (self.recommended_action, self.recommended_spend_reduction_percent) {
            (RecommendedAction::ReduceSpend, Some(percent)) => {
                self.advertising.spend * f64::from(percent) / 100.0
            }
            _ => 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    pub total_revenue: f64,
    pub total_ad_revenue: f64,
    pub total_ad_spend: f64,
    pub blended_acos: f64,
    pub blended_roas: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Opportunity {
    pub asin: Asin,
    pub title: Option<String>,
    pub flywheel_score: f64,
    pub current_spend: f64,
    pub recommended_reduction_percent: u32,
    pub estimated_monthly_savings: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub audit_id: AuditId,
    pub analyzed_at: DateTime<Utc>,
    pub total_asins_analyzed: usize,
    pub insufficient_history_count: usize,
    pub summary: PortfolioSummary,
    pub asin_metrics: Vec<FlywheelMetrics>,
    pub opportunities: Vec<Opportunity>,
}
