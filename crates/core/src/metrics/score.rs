use crate::domain::flywheel::FlywheelTrend;

use super::{safe_ratio, MAX_SCORE, MIN_SCORE, SCORE_WEIGHTS};

/// Composite 0–100 score of how self-sustaining a product's demand is.
///
/// Hand-tuned heuristic. Lower ad dependency, a falling ad share, organic
/// traffic that converts at least as well as paid traffic, and strong ROAS
/// all push the score up.
pub fn flywheel_score(
    attribution_pct: f64,
    trend: FlywheelTrend,
    ad_conversion_rate: f64,
    organic_conversion_rate: f64,
    roas: f64,
    trend_confidence: f64,
) -> f64 {
    let weights = SCORE_WEIGHTS;
    let confidence = trend_confidence.clamp(0.0, 1.0);

    let dependency = weights.attribution_base * (1.0 - attribution_pct / 100.0);

    let momentum = match trend {
        FlywheelTrend::Decreasing => weights.decreasing_trend_bonus * confidence,
        FlywheelTrend::Increasing => -weights.increasing_trend_penalty * confidence,
        FlywheelTrend::Stable => 0.0,
    };

    let conversion = (safe_ratio(organic_conversion_rate, ad_conversion_rate)
        * weights.conversion_ratio_scale)
        .clamp(0.0, weights.conversion_ceiling);

    let efficiency = if roas > weights.roas_bonus_floor {
        ((roas - weights.roas_bonus_floor) * weights.roas_bonus_per_point)
            .min(weights.roas_bonus_ceiling)
    } else {
        0.0
    };

    let score = dependency + momentum + conversion + efficiency;
    if score.is_nan() {
        return MIN_SCORE;
    }
    score.clamp(MIN_SCORE, MAX_SCORE)
}
