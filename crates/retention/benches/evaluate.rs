//! Retention evaluator benchmarks

use chrono::{DateTime, Duration, FixedOffset};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use engine::Snapshot;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use retention::{RetentionEvaluator, RetentionPolicy};

fn fleet(count: usize) -> Vec<Snapshot> {
    let base: DateTime<FixedOffset> =
        DateTime::parse_from_rfc3339("2024-06-15T12:30:45+00:00").unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    (0..count)
        .map(|i| {
            let minutes_back: i64 = rng.gen_range(0..=3 * 365 * 24 * 60);
            Snapshot {
                id: format!("snap-{:06}", i),
                time: base - Duration::minutes(minutes_back),
                hostname: "bench-host".to_string(),
                paths: vec!["/home/user".to_string()],
                tags: Vec::new(),
                metadata: serde_json::Map::new(),
            }
        })
        .collect()
}

fn bench_evaluate(c: &mut Criterion) {
    let evaluator = RetentionEvaluator::new(RetentionPolicy::default());

    for &size in &[100usize, 1_000, 10_000] {
        let snapshots = fleet(size);
        c.bench_function(&format!("evaluate_{}", size), |b| {
            b.iter(|| black_box(evaluator.evaluate(black_box(&snapshots))));
        });
    }
}

criterion_group!(benches, bench_evaluate);
criterion_main!(benches);
