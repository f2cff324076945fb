use criterion::{criterion_group, criterion_main, Criterion, black_box};

use tilesynth::geo::build_frame;
use tilesynth::gltf::{Gltf, append_buffer};
use tilesynth::instancing::{ModelAnchor, generate_positions};

const LONGITUDE: f64 = -75.612;
const LATITUDE: f64 = 40.04255;

fn bench_positions_25(c: &mut Criterion) {
    let frame = build_frame(LONGITUDE, LATITUDE, 0.0).unwrap();

    c.bench_function("positions_25", |b| {
        b.iter(|| generate_positions(black_box(25), 200.0, 20.0, ModelAnchor::Base, &frame).unwrap());
    });
}

fn bench_positions_10k(c: &mut Criterion) {
    let frame = build_frame(LONGITUDE, LATITUDE, 10.0).unwrap();

    c.bench_function("positions_10k", |b| {
        b.iter(|| generate_positions(black_box(10_000), 2000.0, 20.0, ModelAnchor::Center, &frame).unwrap());
    });
}

fn bench_append_translations_10k(c: &mut Criterion) {
    let frame = build_frame(LONGITUDE, LATITUDE, 0.0).unwrap();
    let positions = generate_positions(10_000, 2000.0, 20.0, ModelAnchor::Base, &frame).unwrap();

    c.bench_function("append_translations_10k", |b| {
        b.iter(|| {
            let mut gltf = Gltf::new();
            append_buffer(&mut gltf, black_box(positions.positions())).unwrap()
        });
    });
}

criterion_group!(
    benches,
    bench_positions_25,
    bench_positions_10k,
    bench_append_translations_10k,
);
criterion_main!(benches);
