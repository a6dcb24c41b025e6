//! Benchmarks for pipeline wiring and rendering
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use image::{Rgba, RgbaImage};
use photofx::{
    CatalogBaseline, EngineConfig, FilterCatalog, FilterRegistry, FrameSink, MemoryStore,
    PictureSource, PipelineWirer,
};

fn gradient(size: u32) -> RgbaImage {
    RgbaImage::from_fn(size, size, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8, 255])
    })
}

fn catalog() -> FilterCatalog {
    FilterCatalog::new(
        CatalogBaseline::embedded().expect("embedded catalog"),
        FilterRegistry::with_builtins(),
        Box::new(MemoryStore::new()),
        &EngineConfig::default(),
    )
}

fn bench_transform_wire(c: &mut Criterion) {
    let mut group = c.benchmark_group("transform_wire");
    let catalog = catalog();

    for size in [64u32, 256, 1024].iter() {
        group.throughput(Throughput::Elements(u64::from(size * size)));
        for key in ["sepia", "vintage", "pixellate"] {
            let descriptor = catalog.descriptor_for(key).expect("known filter");
            group.bench_with_input(BenchmarkId::new(key, size), size, |b, &size| {
                let mut source = PictureSource::from_frame(gradient(size));
                let (_, sink) = FrameSink::shared();
                let mut wirer = PipelineWirer::default();
                b.iter(|| {
                    black_box(
                        wirer
                            .wire(&descriptor, &mut source, None, &sink)
                            .expect("wire"),
                    )
                });
            });
        }
    }

    group.finish();
}

fn bench_blend_wire(c: &mut Criterion) {
    let mut group = c.benchmark_group("blend_wire");
    let catalog = catalog();

    for size in [64u32, 256, 1024].iter() {
        group.throughput(Throughput::Elements(u64::from(size * size)));
        let descriptor = catalog.descriptor_for("normalBlend").expect("known filter");
        group.bench_with_input(BenchmarkId::new("normal", size), size, |b, &size| {
            let mut base = PictureSource::from_frame(gradient(size));
            // Half-size overlay exercises the resize path
            let mut overlay = PictureSource::from_frame(gradient(size / 2));
            let (_, sink) = FrameSink::shared();
            let mut wirer = PipelineWirer::default();
            b.iter(|| {
                black_box(
                    wirer
                        .wire(&descriptor, &mut base, Some(&mut overlay), &sink)
                        .expect("wire"),
                )
            });
        });
    }

    group.finish();
}

fn bench_filter_switching(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter_switching");
    let catalog = catalog();
    let keys = catalog.shown_filters_in("portrait");

    group.bench_function("cycle_portrait", |b| {
        let mut source = PictureSource::from_frame(gradient(128));
        let (_, sink) = FrameSink::shared();
        let mut wirer = PipelineWirer::default();
        b.iter(|| {
            for key in &keys {
                if let Some(d) = catalog.descriptor_for(key) {
                    let _ = black_box(wirer.wire(&d, &mut source, None, &sink));
                }
            }
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_transform_wire,
    bench_blend_wire,
    bench_filter_switching
);
criterion_main!(benches);
