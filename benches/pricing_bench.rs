//! Criterion benchmarks for pricing resolution

use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use hypermon::services::pricing::PricingResolver;
use hypermon::types::RawPricing;

/// Default entry followed by `periods` consecutive monthly tiers
fn build_schedule(periods: usize) -> Vec<RawPricing> {
    let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    let mut entries = vec![serde_json::json!({"from": null, "until": null, "price": "63.0"})];

    let mut from = start;
    for i in 0..periods {
        let until = from + chrono::Months::new(1);
        entries.push(serde_json::json!({
            "from": from.to_string(),
            "until": until.to_string(),
            "price": format!("{}.0", 10 + i % 40),
        }));
        from = until;
    }

    serde_json::from_value(serde_json::Value::Array(entries)).unwrap()
}

fn bench_resolve(c: &mut Criterion) {
    let resolver = PricingResolver::new(NaiveDate::from_ymd_opt(2022, 6, 15).unwrap());

    let mut group = c.benchmark_group("pricing");
    for periods in [3usize, 50, 500] {
        let schedule = build_schedule(periods);
        group.throughput(Throughput::Elements(schedule.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("resolve", periods),
            &schedule,
            |b, schedule| {
                b.iter(|| resolver.resolve(black_box(schedule)));
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_resolve);
criterion_main!(benches);
