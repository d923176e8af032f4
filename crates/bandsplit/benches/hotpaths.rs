use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{Rgb, RgbImage};

use bandsplit::{
    build_plan, estimate_dominant, locate_band, scan_band, BackgroundReference, Color,
    Orientation, ScanConfig, SplitConfig,
};

/// Long page-like scan: white background with text-ish blocks and a gap
/// every `page` rows.
fn synthetic_scan(w: u32, h: u32, page: u32) -> RgbImage {
    RgbImage::from_fn(w, h, |x, y| {
        let in_gap = y % page < 40;
        let in_margin = x < 60 || x >= w - 60;
        if in_gap || in_margin || (y / 12) % 3 == 0 {
            Rgb([255, 255, 255])
        } else {
            let v = ((x * 7 + y * 13) % 200) as u8;
            Rgb([v, v, v])
        }
    })
}

fn bench_scan_band(c: &mut Criterion) {
    let img = synthetic_scan(1600, 6000, 1500);
    let reference = BackgroundReference::Concrete(Color::WHITE);
    let cfg = ScanConfig::default();

    c.bench_function("scan_band_uniform_1600w", |b| {
        b.iter(|| {
            black_box(scan_band(
                black_box(&img),
                Orientation::Vertical,
                black_box(1500),
                reference,
                &cfg,
            ))
        })
    });

    let fuzzy = ScanConfig {
        fuzzy_matching: true,
        ..ScanConfig::default()
    };
    c.bench_function("scan_band_uniform_1600w_fuzzy", |b| {
        b.iter(|| {
            black_box(scan_band(
                black_box(&img),
                Orientation::Vertical,
                black_box(1500),
                reference,
                &fuzzy,
            ))
        })
    });
}

fn bench_locate(c: &mut Criterion) {
    let img = synthetic_scan(1600, 6000, 1500);
    let reference = BackgroundReference::Concrete(Color::WHITE);
    let cfg = ScanConfig::default();

    c.bench_function("locate_band_from_content", |b| {
        b.iter(|| {
            black_box(locate_band(
                black_box(&img),
                reference,
                Orientation::Vertical,
                black_box(1600),
                &cfg,
            ))
        })
    });
}

fn bench_plan(c: &mut Criterion) {
    let img = synthetic_scan(1600, 6000, 1500);
    let reference = BackgroundReference::Concrete(Color::WHITE);
    let cfg = SplitConfig::with_units(4);

    c.bench_function("build_plan_4_units_1600x6000", |b| {
        b.iter(|| {
            let plan = build_plan(black_box(&img), reference, black_box(&cfg));
            black_box(plan.map(|p| p.spans.len()).unwrap_or(0))
        })
    });

    c.bench_function("estimate_dominant_1600x6000", |b| {
        b.iter(|| black_box(estimate_dominant(black_box(&img))))
    });
}

criterion_group!(benches, bench_scan_band, bench_locate, bench_plan);
criterion_main!(benches);
