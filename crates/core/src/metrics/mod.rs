//! Flywheel metrics library
//!
//! Pure, deterministic functions over a single aggregate or time series:
//! ratio metrics, attribution, trend detection, the composite flywheel score,
//! and the recommendation decision table. Every division is guarded and
//! yields 0 when its denominator is 0.

mod recommendation;
mod score;
mod standard;
mod trend;

pub use recommendation::{recommendation, Recommendation};
pub use score::flywheel_score;
pub use standard::{
    ad_attribution, aggregate_by_group, safe_ratio, standard_metrics, AdCounters, GroupMetrics,
    StandardMetrics,
};
pub use trend::{trend, TrendAnalysis};

/// Weights of the composite flywheel score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    /// Points available for low ad dependency (default: 40)
    pub attribution_base: f64,
    /// Points added at full confidence for a falling ad share (default: 30)
    pub decreasing_trend_bonus: f64,
    /// Points removed at full confidence for a rising ad share (default: 15)
    pub increasing_trend_penalty: f64,
    /// Ceiling of the organic-vs-ad conversion component (default: 20)
    pub conversion_ceiling: f64,
    /// Points per unit of organic/ad conversion ratio (default: 10)
    pub conversion_ratio_scale: f64,
    /// ROAS above which the efficiency bonus starts (default: 4)
    pub roas_bonus_floor: f64,
    /// Bonus points per point of ROAS above the floor (default: 2.5)
    pub roas_bonus_per_point: f64,
    /// Ceiling of the ROAS bonus (default: 10)
    pub roas_bonus_ceiling: f64,
}

pub const SCORE_WEIGHTS: ScoreWeights = ScoreWeights {
    attribution_base: 40.0,
    decreasing_trend_bonus: 30.0,
    increasing_trend_penalty: 15.0,
    conversion_ceiling: 20.0,
    conversion_ratio_scale: 10.0,
    roas_bonus_floor: 4.0,
    roas_bonus_per_point: 2.5,
    roas_bonus_ceiling: 10.0,
};

pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 100.0;

/// Fewer points than this always classify as stable.
pub const MIN_TREND_POINTS: usize = 3;
/// Normalized slope (percent of mean per day) that counts as movement.
pub const TREND_SLOPE_THRESHOLD: f64 = 1.0;
/// R² a fit must exceed before its direction is trusted.
pub const TREND_MIN_R_SQUARED: f64 = 0.3;

pub const LOW_CONFIDENCE_BELOW_SAMPLES: usize = 7;
pub const HIGH_CONFIDENCE_FROM_SAMPLES: usize = 30;

pub const REDUCE_SPEND_SCORE: f64 = 70.0;
pub const STRONG_REDUCE_SPEND_SCORE: f64 = 85.0;
pub const WEAK_FLYWHEEL_SCORE: f64 = 30.0;
pub const REDUCE_SPEND_PERCENT: u32 = 25;
pub const STRONG_REDUCE_SPEND_PERCENT: u32 = 50;

pub const PAUSE_ACOS_ABOVE: f64 = 30.0;
pub const PAUSE_ROAS_BELOW: f64 = 2.0;

pub const LOW_ATTRIBUTION_BELOW: f64 = 10.0;
pub const LOW_ATTRIBUTION_MIN_SCORE: f64 = 50.0;
pub const LOW_ATTRIBUTION_REDUCE_PERCENT: u32 = 50;

pub const RUNAWAY_ACOS_ABOVE: f64 = 50.0;
pub const RUNAWAY_ACOS_REDUCE_PERCENT: u32 = 75;
