use analytics_quota::license::{LicenseGrant, LicenseQuotaEvaluator};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;

const LABELS: &[&str] = &[
    "Einstein Analytics Plus",
    "Sales Analytics",
    "Service Analytics",
    "Additional Data Rows",
    "Event Monitoring",
    "Salesforce Platform",
    "Einstein Analytics for Financial Services Cloud",
    "Identity Connect",
];

fn grant_table(size: usize) -> Vec<LicenseGrant> {
    (0..size)
        .map(|i| {
            let status = if i % 7 == 0 { "Disabled" } else { "Active" };
            LicenseGrant::new(LABELS[i % LABELS.len()], status, 0, (i % 5) as u64)
        })
        .collect()
}

fn bench_evaluate(c: &mut Criterion) {
    let evaluator = LicenseQuotaEvaluator::default();
    let mut group = c.benchmark_group("license_rules_evaluate");

    for size in [10, 1_000, 100_000] {
        let grants = grant_table(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &grants, |b, grants| {
            b.iter(|| evaluator.evaluate(black_box(grants)).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_evaluate);
criterion_main!(benches);
