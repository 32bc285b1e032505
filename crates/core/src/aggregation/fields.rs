//! Field priority lists and the typed rows they resolve into.
//!
//! Each logical metric has one ordered list of candidate field names. The most
//! specific attribution window comes first (7-day, then 14-day, then the
//! generic label), and the first field present wins. Resolution happens once,
//! here, so nothing downstream looks fields up by name.

use chrono::NaiveDate;

use crate::domain::product::Asin;
use crate::domain::report::{FieldValue, ReportRow};
use crate::metrics::AdCounters;

use super::parse;

pub const ASIN_FIELDS: &[&str] =
    &["asin", "advertised_asin", "child_asin", "purchased_asin", "parent_asin"];
pub const DATE_FIELDS: &[&str] = &["date", "report_date", "start_date", "day"];
pub const TITLE_FIELDS: &[&str] = &["title", "product_title", "item_name", "product_name"];
pub const CAMPAIGN_FIELDS: &[&str] = &["campaign_name", "campaign"];

pub const IMPRESSION_FIELDS: &[&str] = &["impressions", "viewable_impressions"];
pub const CLICK_FIELDS: &[&str] = &["clicks"];
pub const SPEND_FIELDS: &[&str] = &["spend", "cost", "total_cost"];
pub const AD_SALES_FIELDS: &[&str] = &[
    "7_day_total_sales",
    "sales_7d",
    "14_day_total_sales",
    "sales_14d",
    "total_sales",
    "sales",
];
pub const AD_ORDER_FIELDS: &[&str] = &[
    "7_day_total_orders",
    "orders_7d",
    "14_day_total_orders",
    "orders_14d",
    "total_orders",
    "orders",
];
pub const AD_UNIT_FIELDS: &[&str] = &[
    "7_day_total_units",
    "units_7d",
    "14_day_total_units",
    "units_14d",
    "total_units",
    "units",
];

pub const SESSION_FIELDS: &[&str] = &["sessions", "sessions_total", "browser_sessions"];
pub const PAGE_VIEW_FIELDS: &[&str] = &["page_views", "page_views_total", "browser_page_views"];
pub const UNITS_ORDERED_FIELDS: &[&str] = &["units_ordered", "units_ordered_b2c", "total_units"];
pub const ORDERED_REVENUE_FIELDS: &[&str] =
    &["ordered_product_sales", "ordered_revenue", "ordered_product_sales_b2c", "sales"];

fn first<'a>(row: &'a ReportRow, candidates: &[&str]) -> Option<&'a FieldValue> {
    candidates.iter().find_map(|key| row.field(key))
}

fn number_of(row: &ReportRow, candidates: &[&str]) -> f64 {
    first(row, candidates).map(parse::number).unwrap_or(0.0)
}

fn count_of(row: &ReportRow, candidates: &[&str]) -> u64 {
    first(row, candidates).map(parse::count).unwrap_or(0)
}

fn text_of(row: &ReportRow, candidates: &[&str]) -> Option<String> {
    first(row, candidates).and_then(parse::text)
}

fn date_of(row: &ReportRow) -> Option<NaiveDate> {
    first(row, DATE_FIELDS).and_then(parse::date)
}

#[derive(Clone, Debug, PartialEq)]
pub struct AdvertisingRow {
    pub asin: Asin,
    pub date: Option<NaiveDate>,
    pub campaign: Option<String>,
    pub impressions: u64,
    pub clicks: u64,
    pub spend: f64,
    pub sales: f64,
    pub orders: u64,
    pub units: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OrganicRow {
    pub asin: Asin,
    pub date: Option<NaiveDate>,
    pub title: Option<String>,
    pub sessions: u64,
    pub page_views: u64,
    pub units_ordered: u64,
    pub ordered_revenue: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ResolvedRow {
    Advertising(AdvertisingRow),
    Organic(OrganicRow),
}

impl ResolvedRow {
    pub fn asin(&self) -> &Asin {
        match self {
            Self::Advertising(row) => &row.asin,
            Self::Organic(row) => &row.asin,
        }
    }
}

/// Resolves a raw row into its typed form. Rows without a product identifier
/// cannot be attributed to any product and resolve to `None`.
pub fn resolve(row: &ReportRow) -> Option<ResolvedRow> {
    let asin = Asin(text_of(row, ASIN_FIELDS)?.to_ascii_uppercase());
    let date = date_of(row);

    let resolved = if row.kind.is_advertising() {
        ResolvedRow::Advertising(AdvertisingRow {
            asin,
            date,
            campaign: text_of(row, CAMPAIGN_FIELDS),
            impressions: count_of(row, IMPRESSION_FIELDS),
            clicks: count_of(row, CLICK_FIELDS),
            spend: number_of(row, SPEND_FIELDS),
            sales: number_of(row, AD_SALES_FIELDS),
            orders: count_of(row, AD_ORDER_FIELDS),
            units: count_of(row, AD_UNIT_FIELDS),
        })
    } else {
        ResolvedRow::Organic(OrganicRow {
            asin,
            date,
            title: text_of(row, TITLE_FIELDS),
            sessions: count_of(row, SESSION_FIELDS),
            page_views: count_of(row, PAGE_VIEW_FIELDS),
            units_ordered: count_of(row, UNITS_ORDERED_FIELDS),
            ordered_revenue: number_of(row, ORDERED_REVENUE_FIELDS),
        })
    };

    Some(resolved)
}

impl AdCounters for AdvertisingRow {
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
