use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::errors::AnalysisError;

pub const DEFAULT_MIN_DATA_POINTS: usize = 7;
pub const DEFAULT_TREND_WINDOW_DAYS: u32 = 30;
pub const DEFAULT_TOP_OPPORTUNITIES: usize = 10;
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;
pub const DEFAULT_COLLABORATOR_TIMEOUT_SECS: u64 = 30;

/// Per-run knobs supplied by the caller of `Analyzer::analyze`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisOptions {
    pub min_data_points: usize,
    pub trend_window_days: u32,
    pub top_opportunities: usize,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            min_data_points: DEFAULT_MIN_DATA_POINTS,
            trend_window_days: DEFAULT_TREND_WINDOW_DAYS,
            top_opportunities: DEFAULT_TOP_OPPORTUNITIES,
        }
    }
}

impl AnalysisOptions {
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.min_data_points == 0 {
            return Err(AnalysisError::InvalidOptions("min_data_points must be >= 1".to_string()));
        }
        if self.trend_window_days == 0 {
            return Err(AnalysisError::InvalidOptions(
                "trend_window_days must be >= 1".to_string(),
            ));
        }
        if self.top_opportunities == 0 {
            return Err(AnalysisError::InvalidOptions(
                "top_opportunities must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl From<&AppConfig> for AnalysisOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            min_data_points: config.analysis.min_data_points as usize,
            trend_window_days: config.analysis.trend_window_days,
            top_opportunities: config.analysis.top_opportunities as usize,
        }
    }
}

/// Runtime settings of the analyzer itself, fixed for its lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnalyzerSettings {
    pub ingestion_timeout: Duration,
    pub storage_timeout: Duration,
    pub max_concurrency: usize,
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self {
            ingestion_timeout: Duration::from_secs(DEFAULT_COLLABORATOR_TIMEOUT_SECS),
            storage_timeout: Duration::from_secs(DEFAULT_COLLABORATOR_TIMEOUT_SECS),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }
}

impl From<&AppConfig> for AnalyzerSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            ingestion_timeout: Duration::from_secs(config.collaborators.ingestion_timeout_secs),
            storage_timeout: Duration::from_secs(config.collaborators.storage_timeout_secs),
            max_concurrency: config.analysis.max_concurrency as usize,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::AnalysisError;

    use super::AnalysisOptions;

    #[test]
    fn defaults_are_seven_thirty_ten() {
        let options = AnalysisOptions::default();
        assert_eq!(options.min_data_points, 7);
        assert_eq!(options.trend_window_days, 30);
        assert_eq!(options.top_opportunities, 10);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn zero_values_are_rejected() {
        for options in [
            AnalysisOptions { min_data_points: 0, ..AnalysisOptions::default() },
            AnalysisOptions { trend_window_days: 0, ..AnalysisOptions::default() },
            AnalysisOptions { top_opportunities: 0, ..AnalysisOptions::default() },
        ] {
            assert!(matches!(options.validate(), Err(AnalysisError::InvalidOptions(_))));
        }
    }
}
