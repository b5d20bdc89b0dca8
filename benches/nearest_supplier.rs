use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::Map;
use utility_topup::geo::Coordinates;
use utility_topup::locator::{nearest_within, rank_by_distance, Supplier, DEFAULT_RADIUS_KM};

fn suppliers(n: usize) -> Vec<Supplier> {
    (0..n)
        .map(|i| Supplier {
            name: format!("Supplier {}", i),
            lat: -26.0 - (i as f64) * 0.05,
            lng: 28.0 + (i as f64 % 7.0) * 0.03,
            details: Map::new(),
        })
        .collect()
}

fn bench_nearest(c: &mut Criterion) {
    let origin = Coordinates::new(-26.2041, 28.0473);

    for n in [10, 50, 500] {
        let dataset = suppliers(n);
        c.bench_function(&format!("rank_by_distance/{}", n), |b| {
            b.iter(|| rank_by_distance(black_box(origin), black_box(&dataset)))
        });
        c.bench_function(&format!("nearest_within/{}", n), |b| {
            b.iter(|| nearest_within(black_box(origin), black_box(&dataset), DEFAULT_RADIUS_KM))
        });
    }
}

criterion_group!(benches, bench_nearest);
criterion_main!(benches);
