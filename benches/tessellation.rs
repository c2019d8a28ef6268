use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use vorobox::{compute_voronoi, BoundingBox, Domain, Site, Tessellation};

const SIZE: f64 = 100.0;

fn random_points(count: usize) -> Vec<[f64; 3]> {
    let mut rng = StdRng::seed_from_u64(1);
    (0..count)
        .map(|_| [rng.gen_range(0.0..SIZE), rng.gen_range(0.0..SIZE), rng.gen_range(0.0..SIZE)])
        .collect()
}

fn dispersion(count: usize) -> f64 {
    SIZE / (count as f64).cbrt()
}

fn benchmark_tessellation_build(c: &mut Criterion) {
    let points = random_points(10_000);
    let domain = Domain::new(BoundingBox::new([0.0; 3], [SIZE; 3]), dispersion(points.len())).unwrap();

    c.bench_function("index_10000_sites", |b| {
        b.iter(|| {
            let sites = points.iter().enumerate().map(|(i, p)| Site::new(i, *p)).collect();
            black_box(Tessellation::new(domain, sites).unwrap());
        })
    });
}

fn benchmark_tessellation_calculate(c: &mut Criterion) {
    let mut group = c.benchmark_group("calculate");
    for &count in &[1_000usize, 10_000, 50_000] {
        let points = random_points(count);
        for periodic in [false, true] {
            let label = if periodic { "periodic" } else { "walled" };
            group.bench_with_input(BenchmarkId::new(label, count), &points, |b, points| {
                b.iter(|| {
                    compute_voronoi(black_box(points), &[[0.0, SIZE]; 3], dispersion(count), &[], &[periodic; 3]).unwrap()
                })
            });
        }
    }
    group.finish();
}

fn benchmark_radical(c: &mut Criterion) {
    let points = random_points(10_000);
    let mut rng = StdRng::seed_from_u64(2);
    let radii: Vec<f64> = (0..points.len()).map(|_| rng.gen_range(0.0..2.0)).collect();

    c.bench_function("calculate_radical_10000", |b| {
        b.iter(|| compute_voronoi(&points, &[[0.0, SIZE]; 3], dispersion(points.len()), &radii, &[]).unwrap())
    });
}

fn benchmark_map_volumes(c: &mut Criterion) {
    let points = random_points(10_000);
    let domain = Domain::new(BoundingBox::new([0.0; 3], [SIZE; 3]), dispersion(points.len())).unwrap();
    let sites = points.iter().enumerate().map(|(i, p)| Site::new(i, *p)).collect();
    let tess = Tessellation::new(domain, sites).unwrap();

    c.bench_function("map_volume_10000", |b| {
        b.iter(|| {
            let total: f64 = tess.map(|cell, _| cell.volume()).into_iter().flatten().sum();
            black_box(total)
        })
    });
}

criterion_group!(
    benches,
    benchmark_tessellation_build,
    benchmark_tessellation_calculate,
    benchmark_radical,
    benchmark_map_volumes
);
criterion_main!(benches);
