//! Benchmarks for hashing, deduplication, parsing, and extraction.
//!
//! Run with: cargo bench
//!
//! The extraction benchmark requires fixture files from
//! `tests/fixtures/generate_fixtures.sh`.

use std::{hint::black_box, io::Cursor, path::Path};

use criterion::{BenchmarkId, Criterion};
use framecut::{
    DctHasher, Deduplicator, FfmpegFrameExtractor, FfmpegLogLevel, Fingerprint, FrameExtractor,
    PerceptualHasher, SegmentChunker, SubtitleEntry, parse_srt, parse_vtt, set_ffmpeg_log_level,
};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

const SAMPLE_VIDEO: &str = "tests/fixtures/sample_video.mp4";

fn checkerboard(size: u32, cell: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(size, size, |x, y| {
        if (x / cell + y / cell) % 2 == 0 {
            Rgb([230, 230, 230])
        } else {
            Rgb([20, 40, 80])
        }
    }))
}

fn synthetic_srt(cues: usize) -> String {
    let mut srt = String::new();
    for i in 0..cues {
        let start = i * 3;
        srt.push_str(&format!(
            "{}\n{:02}:{:02}:{:02},250 --> {:02}:{:02}:{:02},750\nLine {i} of the talk\nwith a second row\n\n",
            i + 1,
            start / 3600,
            (start / 60) % 60,
            start % 60,
            (start + 2) / 3600,
            ((start + 2) / 60) % 60,
            (start + 2) % 60,
        ));
    }
    srt
}

fn benchmark_hashing(criterion: &mut Criterion) {
    let hasher = DctHasher::new();
    let mut group = criterion.benchmark_group("phash");

    for size in [320_u32, 1280] {
        let image = checkerboard(size, size / 10);
        group.bench_with_input(BenchmarkId::new("image", size), &image, |bencher, image| {
            bencher.iter(|| hasher.fingerprint_image(black_box(image)));
        });
    }

    let mut jpeg = Vec::new();
    checkerboard(1280, 64)
        .write_to(&mut Cursor::new(&mut jpeg), ImageFormat::Jpeg)
        .unwrap();
    group.bench_function("jpeg 1280", |bencher| {
        bencher.iter(|| hasher.fingerprint(black_box(&jpeg)));
    });

    group.finish();
}

fn benchmark_dedup(criterion: &mut Criterion) {
    let mut dedup = Deduplicator::new(5);
    for i in 0..200_u64 {
        dedup.accept(Fingerprint::from_bits(i.wrapping_mul(0x9E37_79B9_7F4A_7C15)));
    }
    let candidate = Fingerprint::from_bits(0x0123_4567_89ab_cdef);

    criterion.bench_function("is_duplicate against 200 accepted", |bencher| {
        bencher.iter(|| dedup.is_duplicate(black_box(&candidate)));
    });
}

fn benchmark_parsing(criterion: &mut Criterion) {
    let srt = synthetic_srt(1000);
    let vtt = format!("WEBVTT\n\n{}", srt.replace(",250", ".250").replace(",750", ".750"));

    criterion.bench_function("parse 1000 SRT cues", |bencher| {
        bencher.iter(|| parse_srt(black_box(&srt)));
    });
    criterion.bench_function("parse 1000 WebVTT cues", |bencher| {
        bencher.iter(|| parse_vtt(black_box(&vtt)));
    });
}

fn benchmark_chunking(criterion: &mut Criterion) {
    let entries: Vec<SubtitleEntry> = (0..1000)
        .map(|i| SubtitleEntry::new(i as f64 * 3.0, i as f64 * 3.0 + 2.5, format!("line {i}")))
        .collect();

    criterion.bench_function("chunk 1000 accepted frames by 6", |bencher| {
        bencher.iter(|| {
            let mut chunker = SegmentChunker::new(6);
            for entry in &entries {
                chunker.on_accepted(entry.start + 1.0, &entries);
            }
            chunker.finish(&entries)
        });
    });
}

fn benchmark_extraction(criterion: &mut Criterion) {
    set_ffmpeg_log_level(FfmpegLogLevel::Error);

    if !Path::new(SAMPLE_VIDEO).exists() {
        eprintln!("Skipping benchmark: fixture not found");
        return;
    }

    let mut extractor = FfmpegFrameExtractor::new();
    let mut group = criterion.benchmark_group("extract");
    group.sample_size(20);

    group.bench_function("seek 4.0s", |bencher| {
        bencher.iter(|| extractor.seek_frame(Path::new(SAMPLE_VIDEO), 4.0).unwrap());
    });
    group.bench_function("trim 4.0s", |bencher| {
        bencher.iter(|| extractor.trim_frame(Path::new(SAMPLE_VIDEO), 4.0).unwrap());
    });

    group.finish();
}

criterion::criterion_group!(
    benches,
    benchmark_hashing,
    benchmark_dedup,
    benchmark_parsing,
    benchmark_chunking,
    benchmark_extraction,
);
criterion::criterion_main!(benches);
