use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

use gridiron_core::engine::trial_rng;
use gridiron_core::market::center_scores;
use gridiron_core::{GameSimulator, SimConfig, TeamCapability};

fn bench_single_game(c: &mut Criterion) {
    let home = TeamCapability::league_average("Home");
    let away = TeamCapability::league_average("Away");
    let config = SimConfig::default();
    let sim = GameSimulator::new(&home, &away, &config);
    let mut trial = 0u64;
    c.bench_function("single_game", |b| {
        b.iter(|| {
            trial += 1;
            let out = sim.simulate(trial, &mut trial_rng(42, trial));
            black_box(out.result.total());
        })
    });
}

fn bench_batch(c: &mut Criterion) {
    let home = TeamCapability::league_average("Home");
    let away = TeamCapability::league_average("Away");
    let config = SimConfig::default();
    let sim = GameSimulator::new(&home, &away, &config);
    let mut group = c.benchmark_group("batch");
    group.sample_size(10);
    group.bench_function("monte_carlo_1000", |b| {
        b.iter(|| {
            let batch = sim.simulate_monte_carlo(black_box(1000), 7);
            black_box(batch.completed());
        })
    });
    group.finish();
}

fn bench_centering(c: &mut Criterion) {
    let home = TeamCapability::league_average("Home");
    let away = TeamCapability::league_average("Away");
    let config = SimConfig::default();
    let batch = GameSimulator::new(&home, &away, &config).simulate_monte_carlo(10_000, 3);
    let (h, a) = (batch.home_scores(), batch.away_scores());
    c.bench_function("center_10000", |b| {
        b.iter(|| {
            let centered = center_scores(black_box(&h), black_box(&a), 3.0, 45.0, &config.market).unwrap();
            black_box(centered.scale);
        })
    });
}

criterion_group!(benches, bench_single_game, bench_batch, bench_centering);
criterion_main!(benches);
