//! Core types for hypermon

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Number, Value};
use std::sync::Arc;
use thiserror::Error;

/// Customer record returned by the provider
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    #[serde(default)]
    pub identifier: Option<u64>,
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub accounts: Vec<Account>,
}

/// A premise-level account, keyed by UPRN
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub uprn: u64,
    #[serde(default)]
    pub bundle_name: Option<String>,
    #[serde(default)]
    pub order_status: Option<String>,
    #[serde(default)]
    pub have_hyperhub: Option<bool>,
}

/// A broadband package with its plan details
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    pub id: String,
    #[serde(default)]
    pub identifier: Option<u64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub bundle_name: Option<String>,
    /// Download speed in Mbps
    #[serde(default)]
    pub download_speed: Option<u32>,
    /// Upload speed in Mbps
    #[serde(default)]
    pub upload_speed: Option<u32>,
    /// Current monthly price in GBP
    #[serde(default)]
    pub current_price: Option<f64>,
    /// Contract end date (YYYY-MM-DD)
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub can_renew: Option<bool>,
    #[serde(default)]
    pub plan_details: Option<PlanDetails>,
}

impl Package {
    /// Pricing schedule of this package, empty when the plan has none
    pub fn pricing(&self) -> &[RawPricing] {
        self.plan_details
            .as_ref()
            .map(|p| p.pricing.as_slice())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanDetails {
    #[serde(default, deserialize_with = "schedule_or_empty")]
    pub pricing: Vec<RawPricing>,
}

/// A null or non-list schedule reads as empty
fn schedule_or_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<RawPricing>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).map_err(serde::de::Error::custom))
            .collect(),
        Some(other) => {
            tracing::debug!(schedule = %other, "ignoring pricing schedule that is not a list");
            Ok(Vec::new())
        }
        None => Ok(Vec::new()),
    }
}

/// Physical connection at a premise
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub id: String,
    #[serde(default)]
    pub is_installed: bool,
    #[serde(default)]
    pub premise_uprn: Option<u64>,
}

/// One pricing schedule row as the provider encodes it.
///
/// The API hands out string-keyed mappings (`from`/`until`/`price`), while
/// typed callers build records with a `from_date` field. Both are accepted;
/// `services::normalizer` turns either into a [`PricingEntry`]. Anything else
/// lands in `Other` and is skipped there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawPricing {
    Record(PricingRecord),
    Mapping(Map<String, Value>),
    Other(Value),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PricingRecord {
    #[serde(default)]
    pub from_date: Option<String>,
    #[serde(default)]
    pub until: Option<String>,
    #[serde(default)]
    pub price: Option<PriceValue>,
}

/// Monetary amount as found in the source: text or a bare number
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PriceValue {
    Text(String),
    Number(Number),
}

impl PriceValue {
    /// Render the amount unchanged (`"19.0"` and `19.0` both give "19.0")
    pub fn render(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Number(n) => n.to_string(),
        }
    }
}

/// One bound of a pricing entry after normalization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateBound {
    /// Absent or null
    Open,
    /// Present but empty; unbounded, yet the entry is not a default entry
    Blank,
    Date(chrono::NaiveDate),
    Malformed,
}

impl DateBound {
    /// Parsed date, if any
    pub fn date(self) -> Option<chrono::NaiveDate> {
        match self {
            Self::Date(d) => Some(d),
            _ => None,
        }
    }
}

/// Canonical pricing schedule row
#[derive(Debug, Clone, PartialEq)]
pub struct PricingEntry {
    pub from_date: DateBound,
    pub until_date: DateBound,
    /// Rendered price, never empty
    pub price: String,
}

impl PricingEntry {
    /// Both bounds absent: the fallback rate
    pub fn is_default(&self) -> bool {
        self.from_date == DateBound::Open && self.until_date == DateBound::Open
    }
}

/// Pricing fields derived each poll cycle
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedPricing {
    pub current_tier: Option<String>,
    pub next_increase_date: Option<String>,
    pub next_increase_price: Option<String>,
}

/// A package together with the pricing derived for it this cycle
#[derive(Debug, Clone)]
pub struct PricedPackage {
    pub package: Arc<Package>,
    pub pricing: ResolvedPricing,
}

/// Error type for the upstream data source
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("401 Unauthorized")]
    Unauthorized,

    #[error("source unavailable: {0}")]
    Unavailable(String),

    #[error("malformed source data: {0}")]
    Malformed(String),
}

/// Error types for hypermon
#[derive(Debug, Error)]
pub enum HypermonError {
    #[error("{0}")]
    AuthFailed(String),

    #[error("{0}")]
    UpdateFailed(String),

    #[error("invalid authentication")]
    InvalidAuth,

    #[error("cannot connect: {0}")]
    CannotConnect(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HypermonError>;
