//! Criterion benchmarks for the silver/gold transform chain.
//!
//! Benchmarks:
//! 1. Weekly alignment of daily bronze rows
//! 2. Feature derivation per domain
//! 3. Long-format reshape

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use oilregime_core::domain::{Domain, RawRecord};
use oilregime_core::table::BronzeTable;
use oilregime_core::transform::{align, derive, to_long, InvalidDatePolicy};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_daily(n: usize) -> BronzeTable {
    let base = chrono::NaiveDate::from_ymd_opt(2000, 1, 3).unwrap();
    BronzeTable::new(
        (0..n)
            .map(|i| {
                let value = 60.0 + (i as f64 * 0.05).sin() * 15.0;
                RawRecord {
                    date: (base + chrono::Duration::days(i as i64))
                        .format("%Y%m%d")
                        .to_string(),
                    series_id: "PET.RWTC.D".into(),
                    value: format!("{value:.2}"),
                    source_type: "prices".into(),
                }
            })
            .collect(),
    )
}

fn bench_align(c: &mut Criterion) {
    let mut group = c.benchmark_group("align");
    for n in [1_000usize, 10_000] {
        let bronze = make_daily(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &bronze, |b, bronze| {
            b.iter(|| align(black_box(bronze), InvalidDatePolicy::Drop))
        });
    }
    group.finish();
}

fn bench_derive(c: &mut Criterion) {
    let aligned = align(&make_daily(10_000), InvalidDatePolicy::Drop)
        .unwrap()
        .table;
    let mut group = c.benchmark_group("derive");
    for domain in Domain::ALL {
        group.bench_with_input(BenchmarkId::from_parameter(domain), &domain, |b, d| {
            b.iter(|| derive(black_box(&aligned), *d))
        });
    }
    group.finish();
}

fn bench_long(c: &mut Criterion) {
    let aligned = align(&make_daily(10_000), InvalidDatePolicy::Drop)
        .unwrap()
        .table;
    let features = derive(&aligned, Domain::Price).unwrap();
    c.bench_function("to_long/price", |b| b.iter(|| to_long(black_box(&features), "wti")));
}

criterion_group!(benches, bench_align, bench_derive, bench_long);
criterion_main!(benches);
