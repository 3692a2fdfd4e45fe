//! Criterion benchmarks for the element-wise kernels.
//!
//! Run with: cargo bench --bench elementwise
//!
//! Tracks regression in the guarded add across volume sizes that straddle the
//! parallel-chunking threshold.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use medspace::image::DynImage;
use medspace::space::SpaceTag;
use ndarray::{ArrayD, IxDyn, ShapeBuilder};

const IDENTITY: [[f32; 4]; 4] = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

fn make_image(shape: &[usize]) -> DynImage {
    let numel: usize = shape.iter().product();
    let data: Vec<f32> = (0..numel).map(|i| (i % 256) as f32).collect();
    let c_order = ArrayD::from_shape_vec(shape.to_vec(), data).unwrap();
    let mut f_order = ArrayD::zeros(IxDyn(shape).f());
    f_order.assign(&c_order);
    DynImage::new(SpaceTag::new("bench"), f_order, IDENTITY).unwrap()
}

fn bench_add(c: &mut Criterion) {
    let mut group = c.benchmark_group("add");

    for &shape in &[[16, 16, 16], [64, 64, 64], [197, 233, 189], [256, 256, 256]] {
        let a = make_image(&shape);
        let b = make_image(&shape);

        let bytes = shape.iter().product::<usize>() * 4;
        let label = format!("{}x{}x{}", shape[0], shape[1], shape[2]);

        group.throughput(Throughput::Bytes(bytes as u64));
        group.bench_with_input(BenchmarkId::new("guarded", &label), &(), |bencher, _| {
            bencher.iter(|| {
                let sum = black_box(&a).add(black_box(&b)).unwrap();
                black_box(sum)
            })
        });
    }

    group.finish();
}

fn bench_scaled(c: &mut Criterion) {
    let a = make_image(&[128, 128, 128]);

    c.bench_function("scaled 128^3", |bencher| {
        bencher.iter(|| {
            let out = black_box(&a).scaled(2.0, 0.5).unwrap();
            black_box(out)
        })
    });
}

criterion_group!(benches, bench_add, bench_scaled);
criterion_main!(benches);
