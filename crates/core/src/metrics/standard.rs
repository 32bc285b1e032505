use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Standard advertising ratios. All percentages are on the 0–100 scale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StandardMetrics {
    pub acos: f64,
    pub roas: f64,
    pub ctr: f64,
    pub cvr: f64,
    pub cpc: f64,
}

/// Division that yields 0 instead of NaN or infinity.
pub fn safe_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 || !denominator.is_finite() {
        return 0.0;
    }
    let ratio = numerator / denominator;
    if ratio.is_finite() {
        ratio
    } else {
        0.0
    }
}

pub fn standard_metrics(
    impressions: u64,
    clicks: u64,
    spend: f64,
    sales: f64,
    orders: u64,
) -> StandardMetrics {
    let impressions = impressions as f64;
    let clicks = clicks as f64;
    let orders = orders as f64;

    StandardMetrics {
        acos: safe_ratio(spend, sales) * 100.0,
        roas: safe_ratio(sales, spend),
        ctr: safe_ratio(clicks, impressions) * 100.0,
        cvr: safe_ratio(orders, clicks) * 100.0,
        cpc: safe_ratio(spend, clicks),
    }
}

/// Share of total revenue attributed to advertising, 0–100.
pub fn ad_attribution(ad_revenue: f64, total_revenue: f64) -> f64 {
    safe_ratio(ad_revenue, total_revenue) * 100.0
}

/// Reducible advertising counters of a row that can be rolled up by group.
pub trait AdCounters {
    fn impressions(&self) -> u64;
    fn clicks(&self) -> u64;
    fn spend(&self) -> f64;
    fn sales(&self) -> f64;
    fn orders(&self) -> u64;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMetrics {
    pub impressions: u64,
    pub clicks: u64,
    pub spend: f64,
    pub sales: f64,
    pub orders: u64,
    pub metrics: StandardMetrics,
}

impl GroupMetrics {
    fn absorb<T: AdCounters>(self, row: &T) -> Self {
        Self {
            impressions: self.impressions + row.impressions(),
            clicks: self.clicks + row.clicks(),
            spend: self.spend + row.spend(),
            sales: self.sales + row.sales(),
            orders: self.orders + row.orders(),
            metrics: self.metrics,
        }
    }

    fn finish(self) -> Self {
        Self {
            metrics: standard_metrics(
                self.impressions,
                self.clicks,
                self.spend,
                self.sales,
                self.orders,
            ),
            ..self
        }
    }
}

/// Sums counters per group key and recomputes the standard ratios of each
/// group from its sums.
pub fn aggregate_by_group<'a, T, K, F>(
    rows: impl IntoIterator<Item = &'a T>,
    key_fn: F,
) -> BTreeMap<K, GroupMetrics>
where
    T: AdCounters + 'a,
    K: Ord,
    F: Fn(&T) -> K,
{
    let mut groups: BTreeMap<K, GroupMetrics> = BTreeMap::new();
    for row in rows {
        let group = groups.entry(key_fn(row)).or_default();
        *group = group.absorb(row);
    }

    groups.into_iter().map(|(key, group)| (key, group.finish())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Row {
        campaign: &'static str,
        impressions: u64,
        clicks: u64,
        spend: f64,
        sales: f64,
        orders: u64,
    }

    impl AdCounters for Row {
        fn impressions(&self) -> u64 {
            self.impressions
        }
        fn clicks(&self) -> u64 {
            self.clicks
        }
        fn spend(&self) -> f64 {
            self.spend
        }
        fn sales(&self) -> f64 {
            self.sales
        }
        fn orders(&self) -> u64 {
            self.orders
        }
    }

    #[test]
    fn zero_denominators_yield_zero_ratios() {
        let metrics = standard_metrics(0, 0, 0.0, 0.0, 0);
        assert_eq!(metrics, StandardMetrics::default());

        let spend_without_sales = standard_metrics(100, 0, 25.0, 0.0, 3);
        assert_eq!(spend_without_sales.acos, 0.0);
        assert_eq!(spend_without_sales.cvr, 0.0);
        assert_eq!(spend_without_sales.cpc, 0.0);
        assert!(spend_without_sales.ctr.is_finite());
    }

    #[test]
    fn standard_metrics_use_percent_scale() {
        let metrics = standard_metrics(10_000, 200, 50.0, 250.0, 20);
        assert!((metrics.acos - 20.0).abs() < 1e-9);
        assert!((metrics.roas - 5.0).abs() < 1e-9);
        assert!((metrics.ctr - 2.0).abs() < 1e-9);
        assert!((metrics.cvr - 10.0).abs() < 1e-9);
        assert!((metrics.cpc - 0.25).abs() < 1e-9);
    }

    #[test]
    fn attribution_bounds() {
        assert_eq!(ad_attribution(420.0, 420.0), 100.0);
        assert_eq!(ad_attribution(0.0, 420.0), 0.0);
        assert_eq!(ad_attribution(10.0, 0.0), 0.0);
        assert!((ad_attribution(25.0, 100.0) - 25.0).abs() < 1e-9);
    }

    #[test]
    fn group_rollup_recomputes_ratios_from_sums() {
        let rows = [
            Row {
                campaign: "brand",
                impressions: 1000,
                clicks: 50,
                spend: 20.0,
                sales: 100.0,
                orders: 5,
            },
            Row {
                campaign: "brand",
                impressions: 1000,
                clicks: 50,
                spend: 30.0,
                sales: 50.0,
                orders: 5,
            },
            Row {
                campaign: "generic",
                impressions: 0,
                clicks: 0,
                spend: 0.0,
                sales: 0.0,
                orders: 0,
            },
        ];

        let groups = aggregate_by_group(rows.iter(), |row| row.campaign.to_string());

        let brand = groups.get("brand").expect("brand group");
        assert_eq!(brand.impressions, 2000);
        assert_eq!(brand.clicks, 100);
        assert!((brand.spend - 50.0).abs() < 1e-9);
        assert!((brand.metrics.acos - (50.0 / 150.0 * 100.0)).abs() < 1e-9);
        assert!((brand.metrics.cvr - 10.0).abs() < 1e-9);

        let generic = groups.get("generic").expect("generic group");
        assert_eq!(generic.metrics, StandardMetrics::default());
    }
}
