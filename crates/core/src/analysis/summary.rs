use crate::domain::flywheel::{FlywheelMetrics, Opportunity, PortfolioSummary, RecommendedAction};
use crate::metrics::safe_ratio;

/// Portfolio totals over the scored products. Blended ratios are computed
/// from the summed totals, never averaged across products.
pub fn portfolio_summary(metrics: &[FlywheelMetrics]) -> PortfolioSummary {
    let (total_revenue, total_ad_revenue, total_ad_spend) =
        metrics.iter().fold((0.0, 0.0, 0.0), |(revenue, ad_revenue, spend), product| {
            (
                revenue + product.revenue.total,
                ad_revenue + product.revenue.ad_attributed,
                spend + product.advertising.spend,
            )
        });

    PortfolioSummary {
        total_revenue,
        total_ad_revenue,
        total_ad_spend,
        blended_acos: safe_ratio(total_ad_spend, total_ad_revenue) * 100.0,
        blended_roas: safe_ratio(total_ad_revenue, total_ad_spend),
    }
}

/// Largest spend-reduction opportunities, by estimated monthly savings
/// descending with ties broken by ASIN.
pub fn top_opportunities(metrics: &[FlywheelMetrics], limit: usize) -> Vec<Opportunity> {
    let mut opportunities: Vec<Opportunity> = metrics
        .iter()
        .filter(|product| product.recommended_action == RecommendedAction::ReduceSpend)
        .filter_map(|product| {
            let percent = product.recommended_spend_reduction_percent?;
            Some(Opportunity {
                asin: product.asin.clone(),
                title: product.title.clone(),
                flywheel_score: product.flywheel_score,
                current_spend: product.advertising.spend,
                recommended_reduction_percent: percent,
                estimated_monthly_savings: product.estimated_monthly_savings(),
            })
        })
        .collect();

    opportunities.sort_by(|left, right| {
        right
            .estimated_monthly_savings
            .total_cmp(&left.estimated_monthly_savings)
            .then_with(|| left.asin.cmp(&right.asin))
    });
    opportunities.truncate(limit);
    opportunities
}
