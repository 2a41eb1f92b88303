//! Benchmarks for pagesync matching performance.
//!
//! Run with: cargo bench
//!
//! These benchmarks run the pipeline over synthetic region lists.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use pagesync::{similarity, GreedyOptions, RawWord, Rect, Region, Source, SyncEngine, SyncOptions};

const WORDS: [&str; 12] = [
    "invoice", "total", "shipping", "address", "order", "payment", "reference", "customer",
    "delivery", "quantity", "discount", "balance",
];

/// Creates `count` regions with lightly varied text per side.
fn create_regions(source: Source, count: usize) -> Vec<Region> {
    (0..count)
        .map(|i| {
            let y = i as f32 * 40.0;
            let noise = if source == Source::Pdf { " (scan)" } else { "" };
            let text = format!(
                "{} {} {} #{}{}",
                WORDS[i % WORDS.len()],
                WORDS[(i * 5 + 3) % WORDS.len()],
                WORDS[(i * 7 + 1) % WORDS.len()],
                1000 + i,
                noise
            );
            Region::new(
                format!("{}{}", source.id_prefix(), i + 1),
                source,
                Rect::new(0.0, y, 500.0, y + 30.0),
                text,
            )
            .unwrap()
        })
        .collect()
}

/// A grid of repeated label/value cards.
fn create_words(rows: usize, cols: usize) -> Vec<RawWord> {
    let mut words = Vec::new();
    for r in 0..rows {
        for c in 0..cols {
            let (x, y) = (c as f32 * 220.0, r as f32 * 90.0);
            words.push(RawWord::new(Rect::new(x + 8.0, y + 8.0, x + 48.0, y + 20.0), "Name"));
            words.push(RawWord::new(
                Rect::new(x + 90.0, y + 8.0, x + 170.0, y + 20.0),
                format!("item{}", r * cols + c),
            ));
            words.push(RawWord::new(Rect::new(x + 8.0, y + 30.0, x + 44.0, y + 42.0), "Price"));
            words.push(RawWord::new(
                Rect::new(x + 90.0, y + 30.0, x + 130.0, y + 42.0),
                format!("${}", r + c),
            ));
        }
    }
    words
}

/// Benchmark raw similarity scoring.
fn bench_similarity(c: &mut Criterion) {
    c.bench_function("similarity_short", |b| {
        b.iter(|| similarity(black_box("Invoice #A1234 due March"), black_box("Invoice A1234, due in March")));
    });
}

/// Benchmark the full pipeline at various sizes.
fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");

    for count in [20, 100, 300].iter() {
        let web = create_regions(Source::Web, *count);
        let pdf = create_regions(Source::Pdf, *count);

        group.bench_function(format!("{}_regions", count), |b| {
            let engine = SyncEngine::new(SyncOptions::default());
            b.iter(|| engine.run(black_box(web.clone()), black_box(pdf.clone())).unwrap());
        });

        group.bench_function(format!("{}_regions_sequential", count), |b| {
            let engine = SyncEngine::new(SyncOptions::new().with_greedy(GreedyOptions::new().sequential()));
            b.iter(|| engine.run(black_box(web.clone()), black_box(pdf.clone())).unwrap());
        });
    }

    group.finish();
}

/// Benchmark propagation over a dense card grid.
fn bench_propagation(c: &mut Criterion) {
    let words = create_words(20, 4);
    let template = Region::new(
        "P1",
        Source::Pdf,
        Rect::new(0.0, 0.0, 200.0, 50.0),
        "Name item0 Price $0",
    )
    .unwrap();
    let engine = SyncEngine::default();

    c.bench_function("propagate_80_cards", |b| {
        b.iter(|| engine.propagate(black_box(&template), black_box(&words)));
    });
}

criterion_group!(benches, bench_similarity, bench_pipeline, bench_propagation);
criterion_main!(benches);
