//! Pricing entry normalization service
//!
//! Converts raw pricing rows (either the provider's string-keyed mapping or a
//! typed record) into the canonical [`PricingEntry`] consumed by the resolver.

use chrono::NaiveDate;
use serde_json::{Map, Value};

use crate::types::{DateBound, PriceValue, PricingEntry, PricingRecord, RawPricing};

/// Date format used by the provider for schedule bounds
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Normalize a raw pricing row.
///
/// Returns `None` when the row is not an object or carries no usable price
/// (absent, null, empty string, numeric zero or a non-scalar value). Bounds are normalized
/// independently; a malformed bound does not reject the row here, callers
/// decide what a malformed bound means for them.
///
/// # Examples
/// ```
/// use hypermon::services::normalizer::normalize_entry;
/// use hypermon::types::{DateBound, RawPricing};
///
/// let raw: RawPricing =
///     serde_json::from_str(r#"{"from": null, "until": null, "price": "63.0"}"#).unwrap();
/// let entry = normalize_entry(&raw).unwrap();
/// assert_eq!(entry.price, "63.0");
/// assert_eq!(entry.until_date, DateBound::Open);
/// ```
pub fn normalize_entry(raw: &RawPricing) -> Option<PricingEntry> {
    match raw {
        RawPricing::Record(record) => normalize_record(record),
        RawPricing::Mapping(map) => normalize_mapping(map),
        RawPricing::Other(_) => None,
    }
}

/// Normalize a whole schedule, dropping rows without a usable price
pub fn normalize_schedule(schedule: &[RawPricing]) -> Vec<PricingEntry> {
    schedule
        .iter()
        .filter_map(|raw| {
            let entry = normalize_entry(raw);
            if entry.is_none() {
                tracing::debug!(?raw, "skipping unusable pricing entry");
            }
            entry
        })
        .collect()
}

fn normalize_record(record: &PricingRecord) -> Option<PricingEntry> {
    let price = record.price.as_ref().and_then(usable_price)?;
    Some(PricingEntry {
        from_date: parse_bound(record.from_date.as_deref()),
        until_date: parse_bound(record.until.as_deref()),
        price,
    })
}

fn normalize_mapping(map: &Map<String, Value>) -> Option<PricingEntry> {
    let price = map.get("price").and_then(price_from_value)?;
    Some(PricingEntry {
        from_date: bound_from_value(map.get("from")),
        until_date: bound_from_value(map.get("until")),
        price,
    })
}

/// Render a price, rejecting the empty and zero-like ones
fn usable_price(price: &PriceValue) -> Option<String> {
    match price {
        PriceValue::Text(s) if s.is_empty() => None,
        PriceValue::Number(n) if n.as_f64() == Some(0.0) => None,
        other => Some(other.render()),
    }
}

fn price_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => usable_price(&PriceValue::Text(s.clone())),
        Value::Number(n) => usable_price(&PriceValue::Number(n.clone())),
        _ => None,
    }
}

fn bound_from_value(value: Option<&Value>) -> DateBound {
    match value {
        None | Some(Value::Null) => DateBound::Open,
        Some(Value::String(s)) => parse_bound(Some(s)),
        Some(_) => DateBound::Malformed,
    }
}

/// Parse one bound: absent stays open, empty is blank, anything else must be
/// a `YYYY-MM-DD` date
pub fn parse_bound(value: Option<&str>) -> DateBound {
    match value {
        None => DateBound::Open,
        Some("") => DateBound::Blank,
        Some(s) => match NaiveDate::parse_from_str(s, DATE_FORMAT) {
            Ok(date) => DateBound::Date(date),
            Err(_) => DateBound::Malformed,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn mapping(value: Value) -> RawPricing {
        serde_json::from_value(value).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // ========== Bound parsing ==========

    #[test]
    fn test_parse_bound_valid_date() {
        assert_eq!(
            parse_bound(Some("2026-05-01")),
            DateBound::Date(date(2026, 5, 1))
        );
    }

    #[test]
    fn test_parse_bound_absent_and_blank() {
        assert_eq!(parse_bound(None), DateBound::Open);
        assert_eq!(parse_bound(Some("")), DateBound::Blank);
    }

    #[test]
    fn test_parse_bound_malformed() {
        assert_eq!(parse_bound(Some("not-a-date")), DateBound::Malformed);
        assert_eq!(parse_bound(Some("01/05/2026")), DateBound::Malformed);
        assert_eq!(parse_bound(Some("2026-02-30")), DateBound::Malformed);
    }

    // ========== Mapping encoding ==========

    #[test]
    fn test_mapping_default_entry() {
        let raw = mapping(json!({"from": null, "until": null, "price": "63.0"}));
        let entry = normalize_entry(&raw).unwrap();
        assert!(entry.is_default());
        assert_eq!(entry.price, "63.0");
    }

    #[test]
    fn test_mapping_missing_keys_are_open() {
        let raw = mapping(json!({"price": "63.0"}));
        let entry = normalize_entry(&raw).unwrap();
        assert!(entry.is_default());
    }

    #[test]
    fn test_mapping_dated_entry() {
        let raw = mapping(json!({"from": "2025-09-01", "until": "2026-05-01", "price": "16.0"}));
        let entry = normalize_entry(&raw).unwrap();
        assert_eq!(entry.from_date, DateBound::Date(date(2025, 9, 1)));
        assert_eq!(entry.until_date, DateBound::Date(date(2026, 5, 1)));
    }

    #[test]
    fn test_mapping_numeric_price_rendered() {
        let raw = mapping(json!({"until": "2026-05-01", "price": 16.5}));
        assert_eq!(normalize_entry(&raw).unwrap().price, "16.5");
    }

    #[test]
    fn test_mapping_non_string_date_is_malformed() {
        let raw = mapping(json!({"from": 20250901, "until": "2026-05-01", "price": "16.0"}));
        let entry = normalize_entry(&raw).unwrap();
        assert_eq!(entry.from_date, DateBound::Malformed);
    }

    // ========== Record encoding ==========

    #[test]
    fn test_record_uses_from_date_field() {
        let raw = RawPricing::Record(PricingRecord {
            from_date: Some("2026-05-01".into()),
            until: Some("2026-09-01".into()),
            price: Some(PriceValue::Text("19.0".into())),
        });
        let entry = normalize_entry(&raw).unwrap();
        assert_eq!(entry.from_date, DateBound::Date(date(2026, 5, 1)));
        assert_eq!(entry.until_date, DateBound::Date(date(2026, 9, 1)));
        assert_eq!(entry.price, "19.0");
    }

    #[test]
    fn test_record_and_mapping_agree() {
        let record = RawPricing::Record(PricingRecord {
            from_date: Some("2025-09-01".into()),
            until: Some("2026-05-01".into()),
            price: Some(PriceValue::Text("16.0".into())),
        });
        let map = mapping(json!({"from": "2025-09-01", "until": "2026-05-01", "price": "16.0"}));
        assert_eq!(normalize_entry(&record), normalize_entry(&map));
    }

    // ========== Unusable prices ==========

    #[test]
    fn test_skip_missing_price() {
        assert!(normalize_entry(&mapping(json!({"until": "2026-05-01"}))).is_none());
        assert!(normalize_entry(&mapping(json!({"price": null}))).is_none());
        assert!(normalize_entry(&RawPricing::Record(PricingRecord::default())).is_none());
    }

    #[test]
    fn test_skip_empty_and_zero_price() {
        assert!(normalize_entry(&mapping(json!({"price": ""}))).is_none());
        assert!(normalize_entry(&mapping(json!({"price": 0}))).is_none());
        assert!(normalize_entry(&mapping(json!({"price": 0.0}))).is_none());
    }

    #[test]
    fn test_skip_non_scalar_price() {
        assert!(normalize_entry(&mapping(json!({"price": ["16.0"]}))).is_none());
        assert!(normalize_entry(&mapping(json!({"price": true}))).is_none());
    }

    #[test]
    fn test_skip_non_object_rows() {
        assert!(normalize_entry(&RawPricing::Other(json!("oops"))).is_none());
        assert!(normalize_entry(&RawPricing::Other(json!(5))).is_none());
    }

    #[test]
    fn test_normalize_schedule_keeps_order() {
        let schedule = vec![
            mapping(json!({"price": "63.0"})),
            mapping(json!({"price": ""})),
            mapping(json!({"until": "2026-05-01", "price": "16.0"})),
        ];
        let entries = normalize_schedule(&schedule);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].price, "63.0");
        assert_eq!(entries[1].price, "16.0");
    }
}
