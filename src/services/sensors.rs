//! Observable values derived from coordinator data
//!
//! Sensors are addressed by UPRN plus package or connection id and read their
//! value from the latest [`CoordinatorData`]. A sensor whose account or
//! package has disappeared reads as `None`.

use serde::Serialize;
use std::fmt;

use super::coordinator::{AccountData, CoordinatorData};

const DOMAIN: &str = "hyperoptic";

const ICON_DOWNLOAD: &str = "mdi:download";
const ICON_UPLOAD: &str = "mdi:upload";
const ICON_MONEY: &str = "mdi:pound";
const ICON_CALENDAR: &str = "mdi:calendar";
const ICON_ROUTER: &str = "mdi:router-wireless";
const ICON_CONNECTION: &str = "mdi:cable-data";

/// Per-package sensors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorKind {
    DownloadSpeed,
    UploadSpeed,
    CurrentPrice,
    CurrentPriceTier,
    ContractEndDate,
    BundleName,
    OrderStatus,
    NextPriceIncreaseDate,
    NextPriceIncreaseAmount,
}

impl SensorKind {
    pub const ALL: [SensorKind; 9] = [
        Self::DownloadSpeed,
        Self::UploadSpeed,
        Self::CurrentPrice,
        Self::CurrentPriceTier,
        Self::ContractEndDate,
        Self::BundleName,
        Self::OrderStatus,
        Self::NextPriceIncreaseDate,
        Self::NextPriceIncreaseAmount,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Self::DownloadSpeed => "download_speed",
            Self::UploadSpeed => "upload_speed",
            Self::CurrentPrice => "current_price",
            Self::CurrentPriceTier => "current_price_tier",
            Self::ContractEndDate => "contract_end_date",
            Self::BundleName => "bundle_name",
            Self::OrderStatus => "order_status",
            Self::NextPriceIncreaseDate => "next_price_increase_date",
            Self::NextPriceIncreaseAmount => "next_price_increase_amount",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::DownloadSpeed => "Download Speed",
            Self::UploadSpeed => "Upload Speed",
            Self::CurrentPrice => "Current Price",
            Self::CurrentPriceTier => "Current Price Tier",
            Self::ContractEndDate => "Contract End Date",
            Self::BundleName => "Bundle Name",
            Self::OrderStatus => "Order Status",
            Self::NextPriceIncreaseDate => "Next Price Increase Date",
            Self::NextPriceIncreaseAmount => "Next Price Increase Amount",
        }
    }

    pub fn icon(self) -> Option<&'static str> {
        match self {
            Self::DownloadSpeed => Some(ICON_DOWNLOAD),
            Self::UploadSpeed => Some(ICON_UPLOAD),
            Self::CurrentPrice | Self::CurrentPriceTier | Self::NextPriceIncreaseAmount => {
                Some(ICON_MONEY)
            }
            Self::ContractEndDate | Self::NextPriceIncreaseDate => Some(ICON_CALENDAR),
            Self::BundleName | Self::OrderStatus => None,
        }
    }

    pub fn unit(self) -> Option<&'static str> {
        match self {
            Self::DownloadSpeed | Self::UploadSpeed => Some("Mbps"),
            Self::CurrentPrice | Self::NextPriceIncreaseAmount => Some("GBP"),
            _ => None,
        }
    }
}

/// Per-account, per-connection and per-package flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinarySensorKind {
    HasHyperhub,
    IsInstalled,
    CanRenew,
}

impl BinarySensorKind {
    pub fn key(self) -> &'static str {
        match self {
            Self::HasHyperhub => "has_hyperhub",
            Self::IsInstalled => "is_installed",
            Self::CanRenew => "can_renew",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::HasHyperhub => "Has Hyperhub",
            Self::IsInstalled => "Connection Installed",
            Self::CanRenew => "Can Renew",
        }
    }

    pub fn icon(self) -> Option<&'static str> {
        match self {
            Self::HasHyperhub => Some(ICON_ROUTER),
            Self::IsInstalled => Some(ICON_CONNECTION),
            Self::CanRenew => None,
        }
    }

    /// Kind of record the flag is attached to, part of the unique id
    pub fn entity_type(self) -> &'static str {
        match self {
            Self::HasHyperhub => "account",
            Self::IsInstalled => "connection",
            Self::CanRenew => "package",
        }
    }
}

/// Value of a sensor as published
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SensorValue {
    Integer(u32),
    Float(f64),
    Text(String),
}

impl fmt::Display for SensorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::Text(v) => f.write_str(v),
        }
    }
}

/// A package sensor bound to one account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sensor {
    pub kind: SensorKind,
    pub uprn: String,
    pub package_id: String,
}

impl Sensor {
    pub fn new(kind: SensorKind, uprn: impl Into<String>, package_id: impl Into<String>) -> Self {
        Self {
            kind,
            uprn: uprn.into(),
            package_id: package_id.into(),
        }
    }

    pub fn name(&self) -> String {
        format!("{} {}", self.kind.name(), self.uprn)
    }

    pub fn unique_id(&self) -> String {
        format!(
            "{}_{}_{}_{}",
            DOMAIN,
            self.uprn,
            self.package_id,
            self.kind.key()
        )
    }

    pub fn value(&self, data: &CoordinatorData) -> Option<SensorValue> {
        let account = data.accounts.get(&self.uprn)?;
        let priced = account.package(&self.package_id)?;
        let package = &priced.package;

        match self.kind {
            SensorKind::DownloadSpeed => package.download_speed.map(SensorValue::Integer),
            SensorKind::UploadSpeed => package.upload_speed.map(SensorValue::Integer),
            SensorKind::CurrentPrice => package.current_price.map(SensorValue::Float),
            SensorKind::CurrentPriceTier => priced.pricing.current_tier.clone().map(SensorValue::Text),
            SensorKind::ContractEndDate => package.end_date.clone().map(SensorValue::Text),
            SensorKind::BundleName => package.bundle_name.clone().map(SensorValue::Text),
            SensorKind::OrderStatus => account.account.order_status.clone().map(SensorValue::Text),
            SensorKind::NextPriceIncreaseDate => {
                priced.pricing.next_increase_date.clone().map(SensorValue::Text)
            }
            SensorKind::NextPriceIncreaseAmount => {
                priced.pricing.next_increase_price.clone().map(SensorValue::Text)
            }
        }
    }
}

/// A flag bound to one account and, except for the hub flag, one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinarySensor {
    pub kind: BinarySensorKind,
    pub uprn: String,
    pub entity_id: Option<String>,
}

impl BinarySensor {
    pub fn new(kind: BinarySensorKind, uprn: impl Into<String>, entity_id: Option<String>) -> Self {
        Self {
            kind,
            uprn: uprn.into(),
            entity_id,
        }
    }

    pub fn name(&self) -> String {
        format!("{} {}", self.kind.name(), self.uprn)
    }

    pub fn unique_id(&self) -> String {
        let suffix = self.entity_id.as_deref().unwrap_or(&self.uprn);
        format!(
            "{}_{}_{}_{}",
            DOMAIN,
            self.uprn,
            self.kind.entity_type(),
            suffix
        )
    }

    pub fn is_on(&self, data: &CoordinatorData) -> Option<bool> {
        let account = data.accounts.get(&self.uprn)?;

        match self.kind {
            BinarySensorKind::HasHyperhub => account.account.have_hyperhub,
            BinarySensorKind::IsInstalled => self
                .entity_id
                .as_deref()
                .and_then(|id| account.connection(id))
                .map(|c| c.is_installed),
            BinarySensorKind::CanRenew => self
                .entity_id
                .as_deref()
                .and_then(|id| account.package(id))
                .and_then(|p| p.package.can_renew),
        }
    }
}

/// All package sensors for the accounts in `data`
pub fn sensors(data: &CoordinatorData) -> Vec<Sensor> {
    data.accounts
        .iter()
        .flat_map(|(uprn, account)| {
            account.packages.iter().flat_map(move |priced| {
                SensorKind::ALL
                    .into_iter()
                    .map(move |kind| Sensor::new(kind, uprn.as_str(), priced.package.id.as_str()))
            })
        })
        .collect()
}

/// All binary sensors for the accounts in `data`
pub fn binary_sensors(data: &CoordinatorData) -> Vec<BinarySensor> {
    let mut out = Vec::new();
    for (uprn, account) in &data.accounts {
        out.push(BinarySensor::new(BinarySensorKind::HasHyperhub, uprn.as_str(), None));
        out.extend(account_binary_sensors(uprn, account));
    }
    out
}

fn account_binary_sensors<'a>(
    uprn: &'a str,
    account: &'a AccountData,
) -> impl Iterator<Item = BinarySensor> + 'a {
    let connections = account.connections.iter().map(move |c| {
        BinarySensor::new(BinarySensorKind::IsInstalled, uprn, Some(c.id.clone()))
    });
    let packages = account.packages.iter().map(move |p| {
        BinarySensor::new(BinarySensorKind::CanRenew, uprn, Some(p.package.id.clone()))
    });
    connections.chain(packages)
}

/// Published state of one sensor
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum State {
    Value(SensorValue),
    On(bool),
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => fmt::Display::fmt(v, f),
            Self::On(true) => f.write_str("on"),
            Self::On(false) => f.write_str("off"),
        }
    }
}

/// Snapshot of one sensor for output
#[derive(Debug, Clone, Serialize)]
pub struct Reading {
    pub unique_id: String,
    pub name: String,
    pub state: Option<State>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<&'static str>,
}

/// Read every sensor and binary sensor against `data`
pub fn readings(data: &CoordinatorData) -> Vec<Reading> {
    let values = sensors(data).into_iter().map(|s| Reading {
        unique_id: s.unique_id(),
        name: s.name(),
        state: s.value(data).map(State::Value),
        unit: s.kind.unit(),
        icon: s.kind.icon(),
    });
    let flags = binary_sensors(data).into_iter().map(|b| Reading {
        unique_id: b.unique_id(),
        name: b.name(),
        state: b.is_on(data).map(State::On),
        unit: None,
        icon: b.kind.icon(),
    });
    values.chain(flags).collect()
}
