//! Pricing tier resolution
//!
//! Given a package's pricing schedule and a reference date, works out the
//! price tier in force and the next scheduled price change. Every function
//! here is total: malformed rows are skipped, and "nothing could be
//! determined" is an absent value rather than an error.

use chrono::NaiveDate;

use crate::services::normalizer::normalize_schedule;
use crate::types::{DateBound, PricingEntry, RawPricing, ResolvedPricing};

/// Resolves pricing schedules against a fixed reference date.
///
/// `today` should be sampled once per poll cycle so that the current tier and
/// the next increase of a package are derived from the same day.
#[derive(Debug, Clone, Copy)]
pub struct PricingResolver {
    today: NaiveDate,
}

impl PricingResolver {
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }

    /// Derive all pricing fields for one schedule
    pub fn resolve(&self, schedule: &[RawPricing]) -> ResolvedPricing {
        let entries = normalize_schedule(schedule);
        let (next_increase_date, next_increase_price) = next_increase(&entries, self.today);
        ResolvedPricing {
            current_tier: current_tier(&entries, self.today),
            next_increase_date,
            next_increase_price,
        }
    }
}

/// Describe the price tier applicable on `today`.
///
/// Returns `"Active Tier: £{price}/month"` for the most specific dated entry
/// covering `today`, `"Default Price: £{price}/month"` when only the fallback
/// rate applies, or `None`.
pub fn resolve_current_tier(schedule: &[RawPricing], today: NaiveDate) -> Option<String> {
    current_tier(&normalize_schedule(schedule), today)
}

/// Find the next scheduled price change as `(date, new_price)`.
///
/// The change happens when the current period lapses; the new price is the
/// one of the period that follows it by end date.
pub fn resolve_next_increase(
    schedule: &[RawPricing],
    today: NaiveDate,
) -> (Option<String>, Option<String>) {
    next_increase(&normalize_schedule(schedule), today)
}

fn current_tier(entries: &[PricingEntry], today: NaiveDate) -> Option<String> {
    let mut default_price: Option<&str> = None;
    let mut best: Option<(NaiveDate, &str)> = None;

    for entry in entries {
        if entry.is_default() {
            if let Some(previous) = default_price {
                tracing::debug!(previous, price = %entry.price, "multiple default prices, last one wins");
            }
            default_price = Some(entry.price.as_str());
            continue;
        }

        if entry.from_date == DateBound::Malformed || entry.until_date == DateBound::Malformed {
            tracing::debug!(?entry, "skipping pricing entry with unparseable date");
            continue;
        }

        if !applies_on(entry, today) {
            continue;
        }

        // Open-ended entries never win over the default
        let Some(until) = entry.until_date.date() else {
            continue;
        };

        // Strict comparison keeps the first of equally specific entries
        if best.map_or(true, |(best_until, _)| until < best_until) {
            best = Some((until, entry.price.as_str()));
        }
    }

    if let Some((_, price)) = best {
        return Some(format!("Active Tier: £{}/month", price));
    }

    default_price.map(|price| format!("Default Price: £{}/month", price))
}

/// `from <= today < until`, with missing bounds unbounded
fn applies_on(entry: &PricingEntry, today: NaiveDate) -> bool {
    let started = entry.from_date.date().map_or(true, |from| today >= from);
    let not_ended = entry.until_date.date().map_or(true, |until| today < until);
    started && not_ended
}

fn next_increase(entries: &[PricingEntry], today: NaiveDate) -> (Option<String>, Option<String>) {
    let mut dated: Vec<(NaiveDate, &str)> = entries
        .iter()
        .filter_map(|e| e.until_date.date().map(|until| (until, e.price.as_str())))
        .collect();

    // Stable: entries ending on the same day keep source order
    dated.sort_by_key(|(until, _)| *until);

    let Some(current) = dated.iter().position(|(until, _)| *until > today) else {
        return (None, None);
    };

    match dated.get(current + 1) {
        Some((_, next_price)) => (
            Some(dated[current].0.to_string()),
            Some((*next_price).to_string()),
        ),
        None => (None, None),
    }
}
