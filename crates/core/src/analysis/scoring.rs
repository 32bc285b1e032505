use chrono::Duration;

use crate::domain::flywheel::{
    AdvertisingEfficiency, ConversionComparison, DateRange, FlywheelMetrics, RevenueSplit,
    UnitSplit,
};
use crate::domain::product::ProductAggregate;
use crate::metrics::{ad_attribution, flywheel_score, recommendation, standard_metrics, trend};

use super::options::AnalysisOptions;

/// Whether a product has enough daily history to be scored.
pub fn has_sufficient_history(aggregate: &ProductAggregate, options: &AnalysisOptions) -> bool {
    aggregate.data_points() >= options.min_data_points
}

/// Daily ad-attribution series over the trailing window, ending at the
/// product's last recorded date. Window membership is by calendar date, so
/// gaps inside the window shrink the series rather than widen the window.
pub fn attribution_series(
    aggregate: &ProductAggregate,
    trend_window_days: u32,
) -> Vec<(chrono::NaiveDate, f64)> {
    let Some(last) = aggregate.daily.last() else {
        return Vec::new();
    };
    let cutoff = last.date - Duration::days(i64::from(trend_window_days.saturating_sub(1)));

    aggregate
        .daily
        .iter()
        .filter(|point| point.date >= cutoff)
        .map(|point| (point.date, ad_attribution(point.ad_revenue, point.total_revenue())))
        .collect()
}

/// Scores one product. Returns `None` only when the product has no dated
/// points at all.
pub fn score_product(
    aggregate: &ProductAggregate,
    options: &AnalysisOptions,
) -> Option<FlywheelMetrics> {
    let (start, end) = aggregate.date_range()?;
    let advertising = &aggregate.advertising;
    let organic = &aggregate.organic;

    let ad_revenue = advertising.sales;
    let total_revenue = ad_revenue + organic.ordered_revenue;
    let attribution = ad_attribution(ad_revenue, total_revenue);

    let standard = standard_metrics(
        advertising.impressions,
        advertising.clicks,
        advertising.spend,
        advertising.sales,
        advertising.orders,
    );

    let series = attribution_series(aggregate, options.trend_window_days);
    let trend = trend(&series);

    let score = flywheel_score(
        attribution,
        trend.trend,
        standard.cvr,
        organic.conversion_rate,
        standard.roas,
        trend.confidence,
    );
    let recommendation = recommendation(
        score,
        attribution,
        trend.trend,
        standard.acos,
        standard.roas,
        aggregate.data_points(),
    );

    Some(FlywheelMetrics {
        asin: aggregate.asin.clone(),
        title: aggregate.title.clone(),
        date_range: DateRange { start, end },
        data_points: aggregate.data_points(),
        revenue: RevenueSplit {
            total: total_revenue,
            ad_attributed: ad_revenue,
            organic: organic.ordered_revenue,
            attribution_percentage: attribution,
        },
        units: UnitSplit {
            total: advertising.units + organic.units_ordered,
            ad_attributed: advertising.units,
            organic: organic.units_ordered,
        },
        advertising: AdvertisingEfficiency {
            spend: advertising.spend,
            impressions: advertising.impressions,
            clicks: advertising.clicks,
            acos: standard.acos,
            roas: standard.roas,
        },
        conversion: ConversionComparison {
            ad_conversion_rate: standard.cvr,
            organic_conversion_rate: organic.conversion_rate,
        },
        flywheel_score: score,
        flywheel_trend: trend.trend,
        trend_confidence: trend.confidence,
        recommended_action: recommendation.action,
        recommended_spend_reduction_percent: recommendation.spend_reduction_percent,
        confidence_level: recommendation.confidence,
        reasoning: recommendation.reasoning,
    })
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::analysis::options::AnalysisOptions;
    use crate::domain::flywheel::{FlywheelTrend, RecommendedAction};
    use crate::domain::product::{
        AdvertisingTotals, Asin, DailyMetricPoint, OrganicTotals, ProductAggregate,
    };

    use super::{attribution_series, has_sufficient_history, score_product};

    fn day(offset: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).expect("date") + chrono::Duration::days(offset.into())
    }

    fn aggregate_with_days(days: &[u32]) -> ProductAggregate {
        ProductAggregate {
            asin: Asin("B010".to_string()),
            title: None,
            advertising: AdvertisingTotals {
                impressions: 1000,
                clicks: 50,
                spend: 100.0,
                sales: 400.0,
                orders: 10,
                units: 12,
            },
            organic: OrganicTotals {
                sessions: 200,
                page_views: 300,
                units_ordered: 20,
                ordered_revenue: 600.0,
                conversion_rate: 10.0,
            },
            daily: days
                .iter()
                .map(|offset| DailyMetricPoint {
                    date: day(*offset),
                    ad_revenue: 40.0,
                    organic_revenue: 60.0,
                    ad_spend: 10.0,
                    organic_sessions: 20,
                })
                .collect(),
        }
    }

    #[test]
    fn trailing_window_is_measured_in_calendar_days() {
        let aggregate = aggregate_with_days(&[0, 1, 2, 20, 27, 28, 29]);
        let series = attribution_series(&aggregate, 10);

        let dates: Vec<NaiveDate> = series.iter().map(|(date, _)| *date).collect();
        assert_eq!(dates, vec![day(20), day(27), day(28), day(29)]);
        assert!(series.iter().all(|(_, value)| (*value - 40.0).abs() < 1e-9));

        assert_eq!(attribution_series(&aggregate, 1).len(), 1);
    }

    #[test]
    fn history_threshold_is_inclusive() {
        let aggregate = aggregate_with_days(&[0, 1, 2]);
        let options = AnalysisOptions { min_data_points: 3, ..AnalysisOptions::default() };
        assert!(has_sufficient_history(&aggregate, &options));

        let stricter = AnalysisOptions { min_data_points: 4, ..AnalysisOptions::default() };
        assert!(!has_sufficient_history(&aggregate, &stricter));
    }

    #[test]
    fn metrics_carry_splits_and_efficiency() {
        let aggregate = aggregate_with_days(&[0, 1, 2, 3, 4, 5, 6, 7]);
        let metrics =
            score_product(&aggregate, &AnalysisOptions::default()).expect("dated aggregate");

        assert_eq!(metrics.data_points, 8);
        assert_eq!(metrics.date_range.start, day(0));
        assert_eq!(metrics.date_range.end, day(7));
        assert_eq!(metrics.revenue.total, 1000.0);
        assert!((metrics.revenue.attribution_percentage - 40.0).abs() < 1e-9);
        assert_eq!(metrics.units.total, 32);
        assert!((metrics.advertising.acos - 25.0).abs() < 1e-9);
        assert!((metrics.advertising.roas - 4.0).abs() < 1e-9);
        assert!((metrics.conversion.ad_conversion_rate - 20.0).abs() < 1e-9);
        assert_eq!(metrics.flywheel_trend, FlywheelTrend::Stable);
        // 40 * 0.6 + conversion ratio 0.5 * 10, no trend or ROAS bonus.
        assert!((metrics.flywheel_score - 29.0).abs() < 1e-9);
        assert_eq!(metrics.recommended_action, RecommendedAction::IncreaseSpend);
        assert!(!metrics.reasoning.is_empty());
    }

    #[test]
    fn undated_aggregate_cannot_be_scored() {
        let aggregate = aggregate_with_days(&[]);
        assert!(score_product(&aggregate, &AnalysisOptions::default()).is_none());
    }
}
