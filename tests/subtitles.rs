//! Subtitle file parsing integration tests.

use std::fs;
use std::path::PathBuf;

use framecut::{FramecutError, SubtitleFormat, collect_overlapping_text, parse_subtitles};

fn write(dir: &tempfile::TempDir, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, bytes).unwrap();
    path
}

const LECTURE_VTT: &str = "WEBVTT
Kind: captions
Language: en

NOTE generated by the recorder

intro
00:00:01.000 --> 00:00:04.000 align:start position:0%
Welcome back.

00:00:15.000 --> 00:00:18.500
Today we look at
perceptual hashing.

2
00:00:18.500 --> 00:00:18.500
(silence)
";

const LECTURE_SRT: &str = "1\r\n00:00:01,000 --> 00:00:04,000\r\nWelcome back.\r\n\r\n2\r\n00:00:15,000 --> 00:00:18,500\r\nToday we look at\r\nperceptual hashing.\r\n\r\n00:00:18,500 --> 00:00:18,500\r\n(silence)\r\n";

#[test]
fn parsing_the_same_file_twice_is_identical() {
    let dir = tempfile::tempdir().unwrap();
    for (name, content) in [("lecture.vtt", LECTURE_VTT), ("lecture.srt", LECTURE_SRT)] {
        let path = write(&dir, name, content.as_bytes());
        let first = parse_subtitles(&path).unwrap();
        let second = parse_subtitles(&path).unwrap();
        assert_eq!(first, second, "{name}");
        assert_eq!(first.len(), 3, "{name}");
    }
}

#[test]
fn vtt_and_srt_of_the_same_cues_agree() {
    let dir = tempfile::tempdir().unwrap();
    let vtt = parse_subtitles(write(&dir, "a.vtt", LECTURE_VTT.as_bytes())).unwrap();
    let srt = parse_subtitles(write(&dir, "a.srt", LECTURE_SRT.as_bytes())).unwrap();
    assert_eq!(vtt, srt);
    assert_eq!(vtt[1].text, "Today we look at\nperceptual hashing.");
}

#[test]
fn zero_length_cues_are_normalised() {
    let dir = tempfile::tempdir().unwrap();
    let entries = parse_subtitles(write(&dir, "a.vtt", LECTURE_VTT.as_bytes())).unwrap();
    for entry in &entries {
        assert!(entry.end > entry.start);
    }
    assert_eq!(entries[2].start, 18.5);
    assert_eq!(entries[2].end, 19.0);
}

#[test]
fn invalid_bytes_and_bom_are_tolerated() {
    let dir = tempfile::tempdir().unwrap();
    let mut bytes = b"\xEF\xBB\xBF1\n00:00:20,000 --> 00:00:21,000\ncaf".to_vec();
    bytes.extend_from_slice(&[0xE9, 0xFF]);
    bytes.extend_from_slice(b"\n");

    let entries = parse_subtitles(write(&dir, "broken.srt", &bytes)).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].start, 20.0);
    assert!(entries[0].text.starts_with("caf"));
    assert!(entries[0].text.contains('\u{FFFD}'));
}

#[test]
fn extension_matching_ignores_case() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(&dir, "LOUD.VTT", LECTURE_VTT.as_bytes());
    assert_eq!(SubtitleFormat::from_path(&path).unwrap(), SubtitleFormat::WebVtt);
    assert_eq!(parse_subtitles(&path).unwrap().len(), 3);
}

#[test]
fn unknown_extension_is_a_typed_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(&dir, "lecture.ass", b"[Script Info]");
    assert!(matches!(
        parse_subtitles(&path),
        Err(FramecutError::UnsupportedSubtitleFormat(_))
    ));
}

#[test]
fn missing_file_is_a_file_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = parse_subtitles(dir.path().join("absent.srt"));
    let error = result.unwrap_err();
    assert!(matches!(error, FramecutError::FileOpen { .. }));
    assert!(error.to_string().contains("absent.srt"));
}

#[test]
fn overlap_text_from_a_parsed_file() {
    let dir = tempfile::tempdir().unwrap();
    let entries = parse_subtitles(write(&dir, "a.vtt", LECTURE_VTT.as_bytes())).unwrap();

    assert_eq!(
        collect_overlapping_text(&entries, 3.0, 16.0),
        "Welcome back.\nToday we look at\nperceptual hashing."
    );
    assert_eq!(collect_overlapping_text(&entries, 5.0, 14.0), "");
}
