use criterion::{black_box, criterion_group, criterion_main, Criterion};

use beacon_core::code::normalize;
use beacon_scan::binarize::{binarize_row_adaptive, quantize_modules, runs};
use beacon_scan::fallback::FallbackDecoder;
use beacon_scan::render::{render_label, LabelOptions};
use beacon_scan::symbology::Ean13Decoder;
use beacon_scan::Frame;

/// A rendered label blitted into a camera-sized white scene.
fn label() -> Frame {
    let code = normalize("000123456789").unwrap();
    let label = render_label(&code, &LabelOptions::default()).unwrap();

    let mut scene = Frame::filled(480, 360, 255);
    let (ox, oy) = (70, 120);
    for y in 0..label.height() {
        scene.row_mut(oy + y)[ox..ox + label.width()].copy_from_slice(label.row(y));
    }
    scene
}

/// Striped row with deterministic noise, wide enough to resemble a camera
/// scan line.
fn noisy_row(width: usize, seed: u32) -> Vec<u8> {
    let mut x = seed;
    (0..width)
        .map(|i| {
            x = x.wrapping_mul(1664525).wrapping_add(1013904223);
            let v = ((x >> 24) & 0xFF) as u8;
            if (i / 9) % 2 == 0 {
                v.saturating_add(48)
            } else {
                v.saturating_sub(48)
            }
        })
        .collect()
}

fn bench_decode(c: &mut Criterion) {
    let frame = label();

    c.bench_function("fallback_decode_label", |b| {
        let decoder = FallbackDecoder::default();
        b.iter(|| black_box(decoder.decode(black_box(&frame))))
    });

    c.bench_function("structured_decode_label", |b| {
        let decoder = Ean13Decoder::default();
        b.iter(|| black_box(decoder.decode(black_box(&frame))))
    });

    let row = noisy_row(2048, 123);
    c.bench_function("row_pipeline", |b| {
        b.iter(|| {
            let bin = binarize_row_adaptive(black_box(&row));
            let rl = runs(&bin);
            let modules = quantize_modules(&bin, &rl);
            black_box(modules.0.len())
        })
    });
}

criterion_group!(benches, bench_decode);
criterion_main!(benches);
