use serde::{Deserialize, Serialize};

use crate::domain::flywheel::{ConfidenceLevel, FlywheelTrend, RecommendedAction};

use super::{
    HIGH_CONFIDENCE_FROM_SAMPLES, LOW_ATTRIBUTION_BELOW, LOW_ATTRIBUTION_MIN_SCORE,
    LOW_ATTRIBUTION_REDUCE_PERCENT, LOW_CONFIDENCE_BELOW_SAMPLES, PAUSE_ACOS_ABOVE,
    PAUSE_ROAS_BELOW, REDUCE_SPEND_PERCENT, REDUCE_SPEND_SCORE, RUNAWAY_ACOS_ABOVE,
    RUNAWAY_ACOS_REDUCE_PERCENT, STRONG_REDUCE_SPEND_PERCENT, STRONG_REDUCE_SPEND_SCORE,
    WEAK_FLYWHEEL_SCORE,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub action: RecommendedAction,
    pub spend_reduction_percent: Option<u32>,
    pub confidence: ConfidenceLevel,
    /// One entry per rule that fired, in evaluation order.
    pub reasoning: Vec<String>,
}

/// Decision table over the flywheel score and efficiency ratios.
///
/// Rules run in a fixed order and later rules override earlier ones:
/// sample-size confidence, high-score reduction, low-score pause or growth,
/// the low-attribution override, then the runaway-ACoS override.
pub fn recommendation(
    score: f64,
    attribution_pct: f64,
    trend: FlywheelTrend,
    acos: f64,
    roas: f64,
    sample_size: usize,
) -> Recommendation {
    let mut reasoning = Vec::new();

    let confidence = if sample_size < LOW_CONFIDENCE_BELOW_SAMPLES {
        reasoning.push(format!("Only {sample_size} days of data; confidence is low"));
        ConfidenceLevel::Low
    } else if sample_size >= HIGH_CONFIDENCE_FROM_SAMPLES {
        reasoning.push(format!("{sample_size} days of data support a high-confidence call"));
        ConfidenceLevel::High
    } else {
        reasoning.push(format!("{sample_size} days of data give medium confidence"));
        ConfidenceLevel::Medium
    };

    let mut action = RecommendedAction::Maintain;
    let mut reduction: Option<u32> = None;

    if score >= REDUCE_SPEND_SCORE {
        action = RecommendedAction::ReduceSpend;
        if score >= STRONG_REDUCE_SPEND_SCORE {
            reduction = Some(STRONG_REDUCE_SPEND_PERCENT);
            reasoning.push(format!(
                "Flywheel score {score:.1} shows strong organic momentum; cut ad spend by {STRONG_REDUCE_SPEND_PERCENT}%"
            ));
        } else {
            reduction = Some(REDUCE_SPEND_PERCENT);
            reasoning.push(format!(
                "Flywheel score {score:.1} shows healthy organic demand; cut ad spend by {REDUCE_SPEND_PERCENT}%"
            ));
        }
    } else if score < WEAK_FLYWHEEL_SCORE {
        if acos > PAUSE_ACOS_ABOVE || roas < PAUSE_ROAS_BELOW {
            action = RecommendedAction::Pause;
            reasoning.push(format!(
                "Weak flywheel (score {score:.1}) with poor efficiency (ACoS {acos:.1}%, ROAS {roas:.2}); pause advertising"
            ));
        } else {
            action = RecommendedAction::IncreaseSpend;
            reasoning.push(format!(
                "Weak flywheel (score {score:.1}) but efficient ads (ACoS {acos:.1}%, ROAS {roas:.2}); invest to build organic rank"
            ));
        }
    } else {
        reasoning.push(format!("Flywheel score {score:.1} is in the neutral band; maintain spend"));
    }

    if attribution_pct < LOW_ATTRIBUTION_BELOW && score > LOW_ATTRIBUTION_MIN_SCORE {
        action = RecommendedAction::ReduceSpend;
        reduction = Some(reduction.unwrap_or(0).max(LOW_ATTRIBUTION_REDUCE_PERCENT));
        reasoning.push(format!(
            "Only {attribution_pct:.1}% of revenue is ad-attributed; organic demand carries the product"
        ));
    }

    if acos > RUNAWAY_ACOS_ABOVE {
        if action == RecommendedAction::ReduceSpend {
            reduction = Some(reduction.unwrap_or(0).max(RUNAWAY_ACOS_REDUCE_PERCENT));
            reasoning.push(format!(
                "ACoS {acos:.1}% exceeds {RUNAWAY_ACOS_ABOVE:.0}%; deepen the spend cut"
            ));
        } else {
            action = RecommendedAction::Pause;
            reduction = None;
            reasoning.push(format!(
                "ACoS {acos:.1}% exceeds {RUNAWAY_ACOS_ABOVE:.0}%; pause advertising"
            ));
        }
    }

    match trend {
        FlywheelTrend::Decreasing => {
            reasoning.push("Ad share of revenue is falling over the trend window".to_string())
        }
        FlywheelTrend::Increasing => {
            reasoning.push("Ad share of revenue is rising over the trend window".to_string())
        }
        FlywheelTrend::Stable => {}
    }

    Recommendation { action, spend_reduction_percent: reduction, confidence, reasoning }
}
