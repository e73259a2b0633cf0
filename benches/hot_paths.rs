//! Per-frame and per-fix costs: distances, viewport math and map rendering.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tactical_hud::data::generate_theatre_outline;
use tactical_hud::geo::{distance_km, geodesic_circle, Coordinate};
use tactical_hud::map::{MapRenderer, Overlay, Viewport};
use tactical_hud::model::default_threats;

const TEL_AVIV: Coordinate = Coordinate::new(32.0853, 34.7818);

fn bench_distance(c: &mut Criterion) {
    let threats = default_threats();
    c.bench_function("distance_all_threats", |b| {
        b.iter(|| {
            threats
                .iter()
                .map(|t| distance_km(black_box(TEL_AVIV), t.location))
                .sum::<f64>()
        })
    });
}

fn bench_range_ring(c: &mut Criterion) {
    c.bench_function("geodesic_circle_500km", |b| {
        b.iter(|| geodesic_circle(black_box(TEL_AVIV), 500.0, 96))
    });
}

fn bench_project(c: &mut Criterion) {
    let mut viewport = Viewport::theatre(400, 200);
    viewport.set_heading(37.0);
    c.bench_function("project_rotated", |b| {
        b.iter(|| viewport.project(black_box(35.5), black_box(33.9)))
    });
}

fn bench_render(c: &mut Criterion) {
    let mut renderer = MapRenderer::new();
    generate_theatre_outline(&mut renderer);
    let threats = default_threats();
    let overlay = Overlay {
        user: Some(TEL_AVIV),
        threats: &threats,
    };

    let mut group = c.benchmark_group("render_frame");
    for heading in [0.0, 45.0] {
        let mut viewport = Viewport::theatre(236, 136);
        viewport.center_on(TEL_AVIV.lng, TEL_AVIV.lat);
        viewport.set_heading(heading);
        group.bench_with_input(BenchmarkId::from_parameter(heading), &viewport, |b, vp| {
            b.iter(|| renderer.render(118, 34, vp, &overlay))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_distance, bench_range_ring, bench_project, bench_render);
criterion_main!(benches);
