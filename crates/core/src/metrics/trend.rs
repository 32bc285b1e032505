use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::flywheel::FlywheelTrend;

use super::{MIN_TREND_POINTS, TREND_MIN_R_SQUARED, TREND_SLOPE_THRESHOLD};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendAnalysis {
    pub trend: FlywheelTrend,
    /// Raw least-squares slope in value units per day.
    pub slope: f64,
    /// Slope as a percentage of the series mean, per day.
    pub normalized_slope: f64,
    /// R² of the fit, 0–1.
    pub confidence: f64,
}

impl TrendAnalysis {
    fn flat() -> Self {
        Self { trend: FlywheelTrend::Stable, slope: 0.0, normalized_slope: 0.0, confidence: 0.0 }
    }
}

/// Ordinary least-squares trend over a date-ordered series. The x axis is the
/// day offset from the first point, so gaps between dates are respected.
pub fn trend(points: &[(NaiveDate, f64)]) -> TrendAnalysis {
    if points.len() < MIN_TREND_POINTS {
        return TrendAnalysis::flat();
    }

    let origin = points[0].0;
    let xs: Vec<f64> = points.iter().map(|(date, _)| (*date - origin).num_days() as f64).collect();
    let ys: Vec<f64> = points.iter().map(|(_, value)| *value).collect();

    let n = points.len() as f64;
    let x_mean = xs.iter().sum::<f64>() / n;
    let y_mean = ys.iter().sum::<f64>() / n;

    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for (x, y) in xs.iter().zip(&ys) {
        let x_diff = x - x_mean;
        numerator += x_diff * (y - y_mean);
        denominator += x_diff * x_diff;
    }

    if denominator.abs() < f64::EPSILON {
        return TrendAnalysis::flat();
    }

    let slope = numerator / denominator;
    let intercept = y_mean - slope * x_mean;

    let ss_res: f64 = xs
        .iter()
        .zip(&ys)
        .map(|(x, y)| {
            let predicted = slope * x + intercept;
            (y - predicted).powi(2)
        })
        .sum();
    let ss_tot: f64 = ys.iter().map(|y| (y - y_mean).powi(2)).sum();
    let r_squared = if ss_tot > 0.0 { (1.0 - ss_res / ss_tot).clamp(0.0, 1.0) } else { 0.0 };

    let normalized_slope = if y_mean == 0.0 { 0.0 } else { slope / y_mean * 100.0 };

    let trend = if normalized_slope > TREND_SLOPE_THRESHOLD && r_squared > TREND_MIN_R_SQUARED {
        FlywheelTrend::Increasing
    } else if normalized_slope < -TREND_SLOPE_THRESHOLD && r_squared > TREND_MIN_R_SQUARED {
        FlywheelTrend::Decreasing
    } else {
        FlywheelTrend::Stable
    };

    TrendAnalysis { trend, slope, normalized_slope, confidence: r_squared }
}
