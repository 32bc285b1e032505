//! Report rows as handed over by the ingestion collaborator.
//!
//! Rows arrive already validated and tagged with the report they came from.
//! Column names are normalized upstream, but different report subtypes still
//! use different names for the same logical metric, so fields are kept as a
//! keyed bag until the aggregator resolves them.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    SponsoredProducts,
    SponsoredBrands,
    SponsoredDisplay,
    BusinessReport,
}

impl ReportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SponsoredProducts => "sponsored_products",
            Self::SponsoredBrands => "sponsored_brands",
            Self::SponsoredDisplay => "sponsored_display",
            Self::BusinessReport => "business_report",
        }
    }

    /// Advertising reports feed the paid side of a product; the business
    /// report feeds the organic side. A row never feeds both.
    pub fn is_advertising(&self) -> bool {
        !matches!(self, Self::BusinessReport)
    }
}

impl FromStr for ReportKind {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sponsored_products" => Ok(Self::SponsoredProducts),
            "sponsored_brands" => Ok(Self::SponsoredBrands),
            "sponsored_display" => Ok(Self::SponsoredDisplay),
            "business_report" => Ok(Self::BusinessReport),
            other => Err(DomainError::InvariantViolation(format!("unknown report kind `{other}`"))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Date(NaiveDate),
    Text(String),
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    pub kind: ReportKind,
    pub fields: BTreeMap<String, FieldValue>,
}

impl ReportRow {
    pub fn new(kind: ReportKind) -> Self {
        Self { kind, fields: BTreeMap::new() }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn field(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }
}
