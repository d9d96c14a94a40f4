//! Orchestrator integration tests.
//!
//! These run the full per-video flow against a stub extractor, a stub
//! hasher, and a fixed duration, collecting output in a `MemorySink`.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use framecut::{
    CaptionEnhancer, FixedDuration, FramecutError, FrameExtractor, FrameRecord, Fingerprint,
    ImageInfo, MemorySink, PerceptualHasher, ProcessingOptions, VideoJob, VideoProcessor,
};

/// Returns the fingerprint text as the "encoded frame", so the stub hasher
/// can read it back.
#[derive(Default)]
struct StubExtractor {
    identical: bool,
    seek_fails_at: Vec<f64>,
    trim_fails_at: Vec<f64>,
    unhashable_at: Vec<f64>,
    seeks: Arc<Mutex<Vec<f64>>>,
    trims: Arc<Mutex<Vec<f64>>>,
}

impl StubExtractor {
    fn frame(&self, timestamp: f64) -> Vec<u8> {
        if self.unhashable_at.iter().any(|t| (t - timestamp).abs() < 1e-6) {
            return b"not an image".to_vec();
        }
        let digit = if self.identical {
            '0'
        } else {
            char::from_digit(((timestamp / 10.0) as u32) % 16, 16).unwrap_or('f')
        };
        digit.to_string().repeat(16).into_bytes()
    }
}

fn listed(times: &[f64], timestamp: f64) -> bool {
    times.iter().any(|t| (t - timestamp).abs() < 1e-6)
}

impl FrameExtractor for StubExtractor {
    fn seek_frame(&mut self, _video: &Path, timestamp: f64) -> Result<Vec<u8>, FramecutError> {
        self.seeks.lock().unwrap().push(timestamp);
        if listed(&self.seek_fails_at, timestamp) {
            return Err(FramecutError::VideoDecodeError("seek past index".to_string()));
        }
        Ok(self.frame(timestamp))
    }

    fn trim_frame(&mut self, _video: &Path, timestamp: f64) -> Result<Vec<u8>, FramecutError> {
        self.trims.lock().unwrap().push(timestamp);
        if listed(&self.trim_fails_at, timestamp) {
            return Ok(Vec::new());
        }
        Ok(self.frame(timestamp))
    }
}

struct TextHasher;

impl PerceptualHasher for TextHasher {
    fn fingerprint(&self, image_bytes: &[u8]) -> Option<Fingerprint> {
        std::str::from_utf8(image_bytes)
            .ok()
            .filter(|text| text.len() == 16 && text.chars().all(|c| c.is_ascii_hexdigit()))
            .map(Fingerprint::new)
    }
}

struct FailingEnhancer;

impl CaptionEnhancer for FailingEnhancer {
    fn analyze(&mut self, _: &Path, _: &Fingerprint) -> Result<ImageInfo, FramecutError> {
        Err(FramecutError::VideoDecodeError("vision backend offline".to_string()))
    }

    fn enhance(&mut self, _: &str, _: &ImageInfo) -> Result<(String, String), FramecutError> {
        unreachable!("analyze always fails")
    }
}

struct Fixture {
    _dir: tempfile::TempDir,
    job: VideoJob,
}

fn fixture(cues: &[(&str, &str, &str)]) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let channel = dir.path().join("Chan");
    fs::create_dir_all(&channel).unwrap();

    let video = channel.join("talk.mp4");
    fs::write(&video, b"").unwrap();

    let mut vtt = String::from("WEBVTT\n\n");
    for (start, end, text) in cues {
        vtt.push_str(&format!("{start} --> {end}\n{text}\n\n"));
    }
    let subtitles = channel.join("talk.vtt");
    fs::write(&subtitles, vtt).unwrap();

    Fixture {
        _dir: dir,
        job: VideoJob::new(video, subtitles),
    }
}

fn four_cues() -> Fixture {
    fixture(&[
        ("00:00:05.000", "00:00:06.000", "a"),
        ("00:00:15.000", "00:00:16.000", "b"),
        ("00:00:25.000", "00:00:26.000", "c"),
        ("00:00:35.000", "00:00:36.000", "d"),
    ])
}

fn processor(options: ProcessingOptions, extractor: StubExtractor) -> VideoProcessor {
    VideoProcessor::new(options)
        .unwrap()
        .with_extractor(extractor)
        .with_hasher(TextHasher)
        .with_probe(FixedDuration(100.0))
}

fn records(sink: &MemorySink) -> Vec<FrameRecord> {
    sink.records
        .iter()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

fn sink() -> MemorySink {
    MemorySink::new("out/Chan/talk")
}

#[test]
fn hundred_second_video_with_two_frame_chunks() {
    let fixture = four_cues();
    let mut sink = sink();
    let mut processor = processor(
        ProcessingOptions::new().with_chunk_size(2),
        StubExtractor::default(),
    );

    let report = processor.process(&fixture.job, &mut sink).unwrap();

    assert_eq!(report.entries_total, 4);
    assert_eq!(report.entries_considered, 3);
    assert_eq!(report.saved, 3);
    assert_eq!(report.skipped_duplicates, 0);
    assert_eq!(report.chunks, vec!["b\nc".to_string(), "c\nd".to_string()]);

    let names: Vec<_> = sink
        .frames
        .keys()
        .map(|path| path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        names,
        vec!["00-00-15-500.jpg", "00-00-25-500.jpg", "00-00-35-500.jpg"]
    );
    assert_eq!(sink.runs, 1);
}

#[test]
fn entries_starting_in_the_warm_up_are_never_extracted() {
    let fixture = fixture(&[
        ("00:00:00.000", "00:00:02.000", "intro"),
        ("00:00:11.900", "00:00:12.500", "almost"),
        ("00:00:15.000", "00:00:16.000", "first real line"),
    ]);
    let extractor = StubExtractor::default();
    let seeks = Arc::clone(&extractor.seeks);
    let mut sink = sink();

    let report = processor(ProcessingOptions::new(), extractor)
        .process(&fixture.job, &mut sink)
        .unwrap();

    assert_eq!(report.entries_considered, 1);
    assert_eq!(*seeks.lock().unwrap(), vec![15.5]);
    assert_eq!(records(&sink)[0].subtitle_orig, "first real line");
}

#[test]
fn an_entry_starting_exactly_at_the_warm_up_is_extracted() {
    let fixture = fixture(&[
        ("00:00:11.999", "00:00:13.000", "just before"),
        ("00:00:12.000", "00:00:13.000", "on the boundary"),
    ]);
    let extractor = StubExtractor::default();
    let seeks = Arc::clone(&extractor.seeks);
    let mut sink = sink();

    let report = processor(ProcessingOptions::new(), extractor)
        .process(&fixture.job, &mut sink)
        .unwrap();

    assert_eq!(report.entries_considered, 1);
    assert_eq!(report.saved, 1);
    assert_eq!(*seeks.lock().unwrap(), vec![12.5]);
    assert_eq!(records(&sink)[0].subtitle_orig, "on the boundary");
}

#[test]
fn a_repeated_cue_keeps_the_first_frame_on_disk() {
    let fixture = fixture(&[
        ("00:00:20.000", "00:00:21.000", "same line"),
        ("00:00:20.000", "00:00:21.000", "same line"),
    ]);
    let extractor = StubExtractor {
        identical: true,
        ..StubExtractor::default()
    };
    let mut sink = sink();

    let report = processor(ProcessingOptions::new(), extractor)
        .process(&fixture.job, &mut sink)
        .unwrap();

    assert_eq!(report.saved, 1);
    assert_eq!(report.skipped_duplicates, 1);

    let records = records(&sink);
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].image, records[1].image);
    let kept = PathBuf::from(&records[0].image);
    assert_eq!(sink.frames.get(&kept), Some(&b"0000000000000000".to_vec()));
    assert_eq!(records[0].subtitle_enhanced, "same line");
    assert!(records[1].subtitle_enhanced.is_empty());
}

#[test]
fn warm_up_is_configurable() {
    let fixture = four_cues();
    let mut sink = sink();
    let report = processor(ProcessingOptions::new().with_warm_up(0.0), StubExtractor::default())
        .process(&fixture.job, &mut sink)
        .unwrap();
    assert_eq!(report.saved, 4);
}

#[test]
fn identical_frames_are_rejected_at_threshold_zero() {
    let fixture = four_cues();
    let mut sink = sink();
    let extractor = StubExtractor {
        identical: true,
        ..StubExtractor::default()
    };

    let report = processor(ProcessingOptions::new().with_similarity_threshold(0), extractor)
        .process(&fixture.job, &mut sink)
        .unwrap();

    assert_eq!(report.saved, 1);
    assert_eq!(report.skipped_duplicates, 2);
    assert_eq!(sink.frames.len(), 1);
    assert!(sink.frames.contains_key(Path::new("out/Chan/talk/00-00-15-500.jpg")));

    let records = records(&sink);
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].subtitle_enhanced, "b");
    assert_eq!(records[0].image_info, "phash=0000000000000000");
    for rejected in &records[1..] {
        assert!(rejected.subtitle_enhanced.is_empty());
        assert!(rejected.image_info.is_empty());
    }
}

#[test]
fn threshold_sixty_four_treats_every_frame_as_similar() {
    let fixture = four_cues();
    let mut sink = sink();
    let extractor = StubExtractor {
        identical: true,
        ..StubExtractor::default()
    };

    let report = processor(ProcessingOptions::new().with_similarity_threshold(64), extractor)
        .process(&fixture.job, &mut sink)
        .unwrap();

    assert_eq!(report.saved, 1);
    assert_eq!(report.skipped_duplicates, 2);
}

#[test]
fn fallback_frame_is_named_after_the_requested_time() {
    let fixture = fixture(&[("00:00:49.500", "00:00:50.500", "fifty")]);
    let extractor = StubExtractor {
        seek_fails_at: vec![50.0],
        ..StubExtractor::default()
    };
    let trims = Arc::clone(&extractor.trims);
    let mut sink = sink();

    let report = processor(ProcessingOptions::new(), extractor)
        .process(&fixture.job, &mut sink)
        .unwrap();

    assert_eq!(report.saved, 1);
    let trims = trims.lock().unwrap();
    assert_eq!(trims.len(), 1);
    assert!((trims[0] - 49.8).abs() < 1e-9);
    assert!(sink.frames.contains_key(&PathBuf::from("out/Chan/talk/00-00-50-000.jpg")));
}

#[test]
fn failed_extraction_produces_no_record() {
    let fixture = fixture(&[
        ("00:00:15.000", "00:00:16.000", "lost"),
        ("00:00:25.000", "00:00:26.000", "kept"),
    ]);
    let extractor = StubExtractor {
        seek_fails_at: vec![15.5],
        trim_fails_at: vec![15.3],
        ..StubExtractor::default()
    };
    let mut sink = sink();

    let report = processor(ProcessingOptions::new(), extractor)
        .process(&fixture.job, &mut sink)
        .unwrap();

    assert_eq!(report.entries_considered, 2);
    assert_eq!(report.extraction_failures, 1);
    assert_eq!(report.saved, 1);
    let records = records(&sink);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].subtitle_orig, "kept");
}

#[test]
fn unhashable_frames_are_kept_without_enhancement() {
    let fixture = four_cues();
    let extractor = StubExtractor {
        identical: true,
        unhashable_at: vec![15.5, 25.5],
        ..StubExtractor::default()
    };
    let mut sink = sink();

    let report = processor(ProcessingOptions::new().with_similarity_threshold(0), extractor)
        .process(&fixture.job, &mut sink)
        .unwrap();

    // Neither unhashable frame enters the accepted set, so the third,
    // hashable frame is compared against nothing.
    assert_eq!(report.saved, 3);
    assert_eq!(report.hash_failures, 2);
    assert_eq!(report.skipped_duplicates, 0);

    let records = records(&sink);
    assert!(records[0].image_info.is_empty());
    assert!(records[1].image_info.is_empty());
    assert_eq!(records[2].image_info, "phash=0000000000000000");
}

#[test]
fn enhancer_failure_leaves_fields_empty() {
    let fixture = four_cues();
    let mut sink = sink();
    let mut processor =
        processor(ProcessingOptions::new(), StubExtractor::default()).with_enhancer(FailingEnhancer);

    let report = processor.process(&fixture.job, &mut sink).unwrap();

    assert_eq!(report.saved, 3);
    assert!(records(&sink).iter().all(|record| record.subtitle_enhanced.is_empty()));
}

#[test]
fn records_carry_clamped_times() {
    let fixture = fixture(&[("00:01:39.000", "00:01:45.000", "tail")]);
    let mut sink = sink();

    processor(ProcessingOptions::new(), StubExtractor::default())
        .process(&fixture.job, &mut sink)
        .unwrap();

    let record = &records(&sink)[0];
    assert_eq!(record.start, 99.0);
    assert!((record.end - 99.99).abs() < 1e-9);
    assert!(record.image.ends_with("00-01-39-495.jpg"));
}

#[test]
fn entry_cap_limits_the_walk() {
    let fixture = four_cues();
    let mut sink = sink();
    let report = processor(
        ProcessingOptions::new().with_max_entries(Some(2)),
        StubExtractor::default(),
    )
    .process(&fixture.job, &mut sink)
    .unwrap();

    assert_eq!(report.entries_total, 4);
    assert_eq!(report.entries_considered, 1);
    assert_eq!(report.saved, 1);
}

#[test]
fn empty_subtitles_give_an_empty_report() {
    let fixture = fixture(&[]);
    let mut sink = sink();

    let report = processor(ProcessingOptions::new().with_chunk_size(2), StubExtractor::default())
        .process(&fixture.job, &mut sink)
        .unwrap();

    assert_eq!(report.entries_total, 0);
    assert!(report.chunks.is_empty());
    assert_eq!(sink.runs, 0);
    assert!(sink.records.is_empty());
}

#[test]
fn chunk_summary_is_written_on_request() {
    let fixture = four_cues();
    let mut sink = sink();

    processor(
        ProcessingOptions::new().with_chunk_size(2).with_write_chunks(true),
        StubExtractor::default(),
    )
    .process(&fixture.job, &mut sink)
    .unwrap();

    let document = &sink.documents["subs_chunks_2.json"];
    assert_eq!(document["subs_per_chunk"], 2);
    assert_eq!(document["chunks_count"], 2);
    assert_eq!(document["chunks"][0], "b\nc");
}

#[test]
fn chunk_summary_needs_chunking_enabled() {
    let fixture = four_cues();
    let mut sink = sink();

    processor(ProcessingOptions::new().with_write_chunks(true), StubExtractor::default())
        .process(&fixture.job, &mut sink)
        .unwrap();

    assert!(sink.documents.is_empty());
}

#[test]
fn missing_video_is_a_video_level_error() {
    let fixture = four_cues();
    fs::remove_file(&fixture.job.video_path).unwrap();
    let mut sink = sink();

    let result = processor(ProcessingOptions::new(), StubExtractor::default())
        .process(&fixture.job, &mut sink);

    assert!(matches!(result, Err(FramecutError::FileOpen { .. })));
    assert_eq!(sink.runs, 0);
}

#[test]
fn unsupported_subtitle_extension_is_rejected() {
    let fixture = four_cues();
    let job = VideoJob::new(&fixture.job.video_path, "talk.ass");
    let result = processor(ProcessingOptions::new(), StubExtractor::default())
        .process(&job, &mut sink());
    assert!(matches!(result, Err(FramecutError::UnsupportedSubtitleFormat(_))));
}

#[test]
fn rerun_into_a_directory_replaces_the_record_log() {
    let fixture = four_cues();
    let out = tempfile::tempdir().unwrap();
    let mut processor = processor(ProcessingOptions::new(), StubExtractor::default());

    let first = processor.process_to_dir(&fixture.job, out.path()).unwrap();
    let second = processor.process_to_dir(&fixture.job, out.path()).unwrap();

    assert_eq!(first.output_dir, out.path().join("Chan").join("talk"));
    assert_eq!(first.output_dir, second.output_dir);

    let log = fs::read_to_string(second.output_dir.join("enhanced_captions.jsonl")).unwrap();
    assert_eq!(log.lines().count(), 3);
    assert!(second.output_dir.join("00-00-25-500.jpg").exists());
}
