use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Asin(pub String);

impl Asin {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Asin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One calendar day for one product.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyMetricPoint {
    pub date: NaiveDate,
    pub ad_revenue: f64,
    pub organic_revenue: f64,
    pub ad_spend: f64,
    pub organic_sessions: u64,
}

impl DailyMetricPoint {
    pub fn advertising(date: NaiveDate, ad_revenue: f64, ad_spend: f64) -> Self {
        Self { date, ad_revenue, organic_revenue: 0.0, ad_spend, organic_sessions: 0 }
    }

    pub fn organic(date: NaiveDate, organic_revenue: f64, organic_sessions: u64) -> Self {
        Self { date, ad_revenue: 0.0, organic_revenue, ad_spend: 0.0, organic_sessions }
    }

    /// Combines two points for the same date. Every field is additive.
    pub fn merge(self, other: Self) -> Self {
        debug_assert_eq!(self.date, other.date);
        Self {
            date: self.date,
            ad_revenue: self.ad_revenue + other.ad_revenue,
            organic_revenue: self.organic_revenue + other.organic_revenue,
            ad_spend: self.ad_spend + other.ad_spend,
            organic_sessions: self.organic_sessions + other.organic_sessions,
        }
    }

    pub fn total_revenue(&self) -> f64 {
        self.ad_revenue + self.organic_revenue
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvertisingTotals {
    pub impressions: u64,
    pub clicks: u64,
    pub spend: f64,
    pub sales: f64,
    pub orders: u64,
    pub units: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganicTotals {
    pub sessions: u64,
    pub page_views: u64,
    pub units_ordered: u64,
    pub ordered_revenue: f64,
    /// Units ordered per session, as a percentage. Derived, never summed.
    pub conversion_rate: f64,
}

/// Everything known about one product across the audit window.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductAggregate {
    pub asin: Asin,
    pub title: Option<String>,
    pub advertising: AdvertisingTotals,
    pub organic: OrganicTotals,
    /// Sorted ascending by date, one point per date.
    pub daily: Vec<DailyMetricPoint>,
}

impl ProductAggregate {
    pub fn data_points(&self) -> usize {
        self.daily.len()
    }

    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        match (self.daily.first(), self.daily.last()) {
            (Some(first), Some(last)) => Some((first.date, last.date)),
            _ => None,
        }
    }
}
