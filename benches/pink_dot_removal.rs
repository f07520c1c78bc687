use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pinkdot_remover_rs::dot_locations::{DefectDatabase, ParserOptions};
use pinkdot_remover_rs::image_pipeline::correction::{self, CorrectionMode};
use pinkdot_remover_rs::image_pipeline::{PixelSink, RawImageData};

const DOT_DATA: &str = "\
N::BENCHCAM::1920,1080
-960,-540,540,8,6
-958,-537,537,8,6
";

fn generate_mock_frame(width: usize, height: usize) -> RawImageData {
    let mut image = RawImageData::blank(width, height);
    for y in 0..height {
        for x in 0..width {
            image.set_pixel(x, y, ((x * 7 + y * 13) % 4096) as u16);
        }
    }
    image
}

fn database() -> DefectDatabase {
    let mut db = DefectDatabase::new(ParserOptions::default());
    db.load_str("bench.txt", DOT_DATA);
    db
}

fn benchmark_lookup(c: &mut Criterion) {
    let db = database();

    c.bench_function("lookup_1920x1080", |b| {
        b.iter(|| db.lookup(black_box("BENCHCAM"), 1920, 1080))
    });
}

fn benchmark_correction_modes(c: &mut Criterion) {
    let mut group = c.benchmark_group("correction_modes");
    let dots = database().lookup("BENCHCAM", 1920, 1080).unwrap_or_default();
    let source = generate_mock_frame(1920, 1080);

    for (mode, label) in [
        (CorrectionMode::Interpolate, "interpolate"),
        (CorrectionMode::MarkBad, "mark_bad"),
    ] {
        group.bench_with_input(BenchmarkId::from_parameter(label), &mode, |b, &mode| {
            let mut destination = source.clone();
            b.iter(|| correction::correct(black_box(&source), &mut destination, &dots, mode));
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_lookup, benchmark_correction_modes);
criterion_main!(benches);
