use std::time::Duration;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use lissajous::core::{
    animation::generate_animation,
    config::animation::{AnimationConfig, Sweep},
    frame::{render_frame, sample_count},
    palette::Palette,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

const HALF_SIZES: [usize; 3] = [50, 100, 200];

fn run_benches(c: &mut Criterion) {
    let mut group = c.benchmark_group("Render");
    bench_render_frame(&mut group);
    bench_generate_animation(&mut group);
    group.finish();
}

fn bench_render_frame(group: &mut criterion::BenchmarkGroup<criterion::measurement::WallTime>) {
    let palette = Palette::default();
    for half_size in HALF_SIZES {
        let sweep = Sweep {
            half_size,
            ..Sweep::default()
        };
        group.throughput(criterion::Throughput::Elements(sample_count(&sweep) as u64));
        group.bench_function(BenchmarkId::new("render_frame", half_size), |b| {
            b.iter(|| render_frame(&palette, 2.5, 0.3, 1, &sweep));
        });
    }
}

fn bench_generate_animation(
    group: &mut criterion::BenchmarkGroup<criterion::measurement::WallTime>,
) {
    let palette = Palette::default();
    let config = AnimationConfig::default();
    let mut rng = ChaCha8Rng::seed_from_u64(0);
    group.throughput(criterion::Throughput::Elements(config.frames as u64));
    group.bench_function(BenchmarkId::new("generate_animation", config.frames), |b| {
        b.iter(|| generate_animation(&palette, &config, &mut rng));
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default().measurement_time(Duration::from_secs(10)).sample_size(10);
    targets = run_benches
}
criterion_main!(benches);
