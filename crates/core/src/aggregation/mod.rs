//! Multi-report aggregation
//!
//! Merges advertising and organic report rows into one aggregate per product.
//! Rows are first resolved into typed form, grouped by ASIN, then folded into
//! an immutable per-product accumulator.

pub mod fields;
pub mod parse;

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::product::{
    AdvertisingTotals, Asin, DailyMetricPoint, OrganicTotals, ProductAggregate,
};
use crate::domain::report::ReportRow;
use crate::metrics::{aggregate_by_group, safe_ratio, GroupMetrics};

pub use fields::{resolve, AdvertisingRow, OrganicRow, ResolvedRow};

/// Campaign label used when an advertising row names no campaign.
pub const UNNAMED_CAMPAIGN: &str = "(unnamed campaign)";

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Aggregation {
    pub products: BTreeMap<Asin, ProductAggregate>,
    /// Rows that carried no product identifier.
    pub skipped_rows: usize,
    /// Rows whose date could not be read; their totals still count.
    pub undated_rows: usize,
}

impl Aggregation {
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignRollup {
    pub campaign: String,
    #[serde(flatten)]
    pub totals: GroupMetrics,
}

#[derive(Clone, Debug, Default)]
pub struct Aggregator;

impl Aggregator {
    pub fn new() -> Self {
        Self
    }

    pub fn aggregate(&self, rows: &[ReportRow]) -> Aggregation {
        let mut grouped: BTreeMap<Asin, Vec<ResolvedRow>> = BTreeMap::new();
        let mut skipped_rows = 0usize;

        for row in rows {
            match resolve(row) {
                Some(resolved) => {
                    grouped.entry(resolved.asin().clone()).or_default().push(resolved)
                }
                None => skipped_rows += 1,
            }
        }

        let undated_rows = grouped
            .values()
            .flatten()
            .filter(|row| match row {
                ResolvedRow::Advertising(row) => row.date.is_none(),
                ResolvedRow::Organic(row) => row.date.is_none(),
            })
            .count();

        let products = grouped
            .into_iter()
            .map(|(asin, rows)| {
                let aggregate = rows
                    .iter()
                    .fold(ProductAccumulator::new(asin.clone()), ProductAccumulator::absorb)
                    .finish();
                (asin, aggregate)
            })
            .collect::<BTreeMap<_, _>>();

        debug!(
            event_name = "aggregation.completed",
            input_rows = rows.len(),
            products = products.len(),
            skipped_rows,
            undated_rows,
            "report rows aggregated"
        );

        Aggregation { products, skipped_rows, undated_rows }
    }

    /// Rolls advertising rows up per campaign, sorted by campaign name.
    pub fn campaign_rollup(&self, rows: &[ReportRow]) -> Vec<CampaignRollup> {
        let advertising: Vec<AdvertisingRow> = rows
            .iter()
            .filter_map(resolve)
            .filter_map(|row| match row {
                ResolvedRow::Advertising(row) => Some(row),
                ResolvedRow::Organic(_) => None,
            })
            .collect();

        aggregate_by_group(advertising.iter(), |row| {
            row.campaign.clone().unwrap_or_else(|| UNNAMED_CAMPAIGN.to_string())
        })
        .into_iter()
        .map(|(campaign, totals)| CampaignRollup { campaign, totals })
        .collect()
    }
}

#[derive(Clone, Debug)]
struct ProductAccumulator {
    asin: Asin,
    title: Option<String>,
    advertising: AdvertisingTotals,
    organic: OrganicTotals,
    daily: BTreeMap<NaiveDate, DailyMetricPoint>,
}

impl ProductAccumulator {
    fn new(asin: Asin) -> Self {
        Self {
            asin,
            title: None,
            advertising: AdvertisingTotals::default(),
            organic: OrganicTotals::default(),
            daily: BTreeMap::new(),
        }
    }

    fn absorb(self, row: &ResolvedRow) -> Self {
        match row {
            ResolvedRow::Advertising(row) => self.absorb_advertising(row),
            ResolvedRow::Organic(row) => self.absorb_organic(row),
        }
    }

    fn absorb_advertising(self, row: &AdvertisingRow) -> Self {
        let advertising = AdvertisingTotals {
            impressions: self.advertising.impressions + row.impressions,
            clicks: self.advertising.clicks + row.clicks,
            spend: self.advertising.spend + row.spend,
            sales: self.advertising.sales + row.sales,
            orders: self.advertising.orders + row.orders,
            units: self.advertising.units + row.units,
        };
        let point = row.date.map(|date| DailyMetricPoint::advertising(date, row.sales, row.spend));

        Self { advertising, daily: merge_point(self.daily, point), ..self }
    }

    fn absorb_organic(self, row: &OrganicRow) -> Self {
        let organic = OrganicTotals {
            sessions: self.organic.sessions + row.sessions,
            page_views: self.organic.page_views + row.page_views,
            units_ordered: self.organic.units_ordered + row.units_ordered,
            ordered_revenue: self.organic.ordered_revenue + row.ordered_revenue,
            conversion_rate: 0.0,
        };
        let point =
            row.date.map(|date| DailyMetricPoint::organic(date, row.ordered_revenue, row.sessions));
        let title = self.title.or_else(|| row.title.clone());

        Self { title, organic, daily: merge_point(self.daily, point), ..self }
    }

    fn finish(self) -> ProductAggregate {
        let conversion_rate =
            safe_ratio(self.organic.units_ordered as f64, self.organic.sessions as f64) * 100.0;

        ProductAggregate {
            asin: self.asin,
            title: self.title,
            advertising: self.advertising,
            organic: OrganicTotals { conversion_rate, ..self.organic },
            daily: self.daily.into_values().collect(),
        }
    }
}

fn merge_point(
    mut daily: BTreeMap<NaiveDate, DailyMetricPoint>,
    point: Option<DailyMetricPoint>,
) -> BTreeMap<NaiveDate, DailyMetricPoint> {
    if let Some(point) = point {
        let merged = match daily.remove(&point.date) {
            Some(existing) => existing.merge(point),
            None => point,
        };
        daily.insert(merged.date, merged);
    }
    daily
}
