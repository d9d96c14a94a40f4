use std::{
    path::PathBuf,
    sync::{Arc, OnceLock},
};

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use serde_json::json;
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};

use framecut::{
    DctHasher, FfmpegLogLevel, FfmpegProbe, OperationType, ProcessingOptions,
    ProgressCallback, ProgressInfo, SubtitleFormat, VideoJob, VideoProcessor, VideoReport,
    archive_directory, filter_by_video_name, load_manifest, parse_subtitles, run_batch,
};

const CLI_AFTER_HELP: &str = "Examples:\n  framecut process videos/Chan/talk.mp4 videos/Chan/talk.vtt --out frames --subs-per-chunk 6\n  framecut batch --manifest videos.jsonl --out frames --since 1724300000 --package\n  framecut subs talk.srt --json\n  framecut hash frames/Chan/talk/00-00-15-500.jpg\n  framecut completions zsh > _framecut";

#[derive(Debug, Parser)]
#[command(
    name = "framecut",
    version,
    about = "Extract subtitle-aligned, de-duplicated frames from videos",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show debug logging output.
    #[arg(long, global = true)]
    verbose: bool,

    /// Show a progress bar while processing.
    #[arg(long, global = true)]
    progress: bool,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long, global = true)]
    log_level: Option<String>,
}

/// Flags shared by `process` and `batch`.
#[derive(Debug, Args, Clone)]
struct TuningOptions {
    /// Maximum Hamming distance (0-64) at which a frame counts as a duplicate.
    #[arg(long, default_value_t = 5)]
    threshold: u32,

    /// Saved frames per subtitle chunk (0 disables chunking).
    #[arg(long, default_value_t = 6)]
    subs_per_chunk: usize,

    /// Only look at the first N subtitle entries.
    #[arg(long)]
    max_subs: Option<usize>,

    /// Skip entries starting in the first SECS seconds.
    #[arg(long, default_value_t = framecut::config::DEFAULT_WARM_UP)]
    warm_up: f64,

    /// Write subs_chunks_<N>.json next to the frames.
    #[arg(long)]
    write_chunks: bool,

    /// JPEG quality (1-100) for saved frames.
    #[arg(long, default_value_t = framecut::extractor::DEFAULT_JPEG_QUALITY)]
    jpeg_quality: u8,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Process one video and its subtitles.
    #[command(
        about = "Extract frames for one video",
        after_help = "Examples:\n  framecut process talk.mp4 talk.vtt --out frames\n  framecut process talk.mp4 talk.srt --out frames --threshold 8 --write-chunks --json"
    )]
    Process {
        /// Video file.
        video: PathBuf,
        /// Subtitle file (.vtt or .srt).
        subtitles: PathBuf,
        /// Root directory for frame output.
        #[arg(long)]
        out: PathBuf,
        /// Uploader directory name (defaults to the video's parent directory).
        #[arg(long)]
        uploader: Option<String>,
        #[command(flatten)]
        tuning: TuningOptions,
        /// Zip the frame directory into frames.zip afterwards.
        #[arg(long)]
        package: bool,
        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Process every video listed in a JSONL manifest.
    #[command(
        about = "Process a manifest of videos",
        after_help = "Examples:\n  framecut batch --manifest videos.jsonl --out frames\n  framecut batch --manifest videos.jsonl --out frames --only-video 2025-08-22 --package"
    )]
    Batch {
        /// Manifest file, one JSON object per line.
        #[arg(long)]
        manifest: PathBuf,
        /// Root directory for frame output.
        #[arg(long)]
        out: PathBuf,
        /// Only process videos whose file name contains this fragment.
        #[arg(long)]
        only_video: Option<String>,
        /// Only process entries with created_at >= this unix timestamp.
        #[arg(long)]
        since: Option<i64>,
        #[command(flatten)]
        tuning: TuningOptions,
        /// Zip each frame directory into frames.zip afterwards.
        #[arg(long)]
        package: bool,
        /// Print the summary as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Parse a subtitle file and print its entries.
    #[command(
        about = "Print parsed subtitle entries",
        after_help = "Examples:\n  framecut subs talk.vtt\n  framecut subs talk.srt --json"
    )]
    Subs {
        /// Subtitle file (.vtt or .srt).
        input: PathBuf,
        /// Output entries as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print the perceptual fingerprint of an image.
    #[command(about = "Fingerprint an image")]
    Hash {
        /// Image file.
        input: PathBuf,
    },

    /// Print a video's duration.
    #[command(about = "Probe video duration")]
    Probe {
        /// Video file.
        input: PathBuf,
    },

    /// Zip the files of a frames directory.
    #[command(
        about = "Archive a frames directory",
        after_help = "Examples:\n  framecut package frames/Chan/talk frames/Chan/talk/frames.zip"
    )]
    Package {
        /// Directory holding the frames.
        dir: PathBuf,
        /// Archive to write.
        zip: PathBuf,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_logging(global: &GlobalOptions) {
    let level = if global.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    // Keep any logger installed earlier.
    let _ = TermLogger::init(
        level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    );
}

fn apply_global_options(global: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(level) = &global.log_level {
        let parsed: FfmpegLogLevel = level
            .parse()
            .map_err(|_| format!("unsupported --log-level: {level}"))?;
        framecut::set_ffmpeg_log_level(parsed);
    }
    Ok(())
}

fn build_options(
    tuning: &TuningOptions,
    global: &GlobalOptions,
) -> Result<ProcessingOptions, Box<dyn std::error::Error>> {
    if !(1..=100).contains(&tuning.jpeg_quality) {
        return Err("--jpeg-quality must be between 1 and 100".into());
    }
    if tuning.warm_up < 0.0 {
        return Err("--warm-up must not be negative".into());
    }

    let mut options = ProcessingOptions::new()
        .with_similarity_threshold(tuning.threshold)
        .with_chunk_size(tuning.subs_per_chunk)
        .with_max_entries(tuning.max_subs)
        .with_warm_up(tuning.warm_up)
        .with_write_chunks(tuning.write_chunks)
        .with_jpeg_quality(tuning.jpeg_quality);

    if global.progress {
        options = options.with_progress(Arc::new(TerminalProgress::new()?));
    }

    options.validate()?;
    Ok(options)
}

/// Two bars, created on first use: videos of a batch and entries of the
/// current video.
struct TerminalProgress {
    multi: MultiProgress,
    style: ProgressStyle,
    videos: OnceLock<ProgressBar>,
    entries: OnceLock<ProgressBar>,
}

impl TerminalProgress {
    fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let style = ProgressStyle::with_template(
            "{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}",
        )?
        .progress_chars("##-");

        Ok(Self {
            multi: MultiProgress::new(),
            style,
            videos: OnceLock::new(),
            entries: OnceLock::new(),
        })
    }

    fn bar(&self, slot: &OnceLock<ProgressBar>, message: &'static str) -> ProgressBar {
        slot.get_or_init(|| {
            let bar = self.multi.add(ProgressBar::new(0));
            bar.set_style(self.style.clone());
            bar.set_message(message);
            bar
        })
        .clone()
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        let bar = match info.operation {
            OperationType::Batch => self.bar(&self.videos, "videos"),
            _ => self.bar(&self.entries, "subtitles"),
        };
        if let Some(total) = info.total {
            bar.set_length(total);
        }
        bar.set_position(info.current);
        if let Some(at) = info.current_timestamp {
            bar.set_message(format!("subtitles @ {}", framecut::format_clock(at.as_secs_f64())));
        }
    }
}

fn print_report(report: &VideoReport) {
    println!(
        "{} {}",
        "success:".green().bold(),
        format!(
            "saved {} frame(s), skipped {} similar, {} chunk(s) -> {}",
            report.saved,
            report.skipped_duplicates,
            report.chunks.len(),
            report.output_dir.display()
        )
        .green()
    );
    if report.extraction_failures > 0 || report.hash_failures > 0 {
        eprintln!(
            "{} {}",
            "warning:".yellow().bold(),
            format!(
                "{} extraction failure(s), {} hash failure(s)",
                report.extraction_failures, report.hash_failures
            )
            .yellow()
        );
    }
}

fn package_report(report: &VideoReport) -> Result<(), Box<dyn std::error::Error>> {
    if report.saved == 0 {
        return Ok(());
    }
    let zip_path = report.output_dir.join(framecut::FRAMES_ARCHIVE_NAME);
    let count = archive_directory(&report.output_dir, &zip_path)?;
    println!("{} {} ({count} files)", "saved".green().bold(), zip_path.display());
    Ok(())
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&cli.global);
    apply_global_options(&cli.global)?;

    match cli.command {
        Commands::Process {
            video,
            subtitles,
            out,
            uploader,
            tuning,
            package,
            json,
        } => {
            let options = build_options(&tuning, &cli.global)?;
            let mut processor = VideoProcessor::new(options)?;
            let mut job = VideoJob::new(video, subtitles);
            if let Some(uploader) = uploader {
                job = job.with_uploader(uploader);
            }

            let report = processor.process_to_dir(&job, &out)?;
            if package {
                package_report(&report)?;
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
        }
        Commands::Batch {
            manifest,
            out,
            only_video,
            since,
            tuning,
            package,
            json,
        } => {
            let options = build_options(&tuning, &cli.global)?;
            let mut processor = VideoProcessor::new(options)?;

            let mut entries = load_manifest(&manifest, since)?;
            if let Some(fragment) = &only_video {
                entries = filter_by_video_name(entries, fragment);
            }
            if entries.is_empty() {
                eprintln!(
                    "{} {}",
                    "warning:".yellow().bold(),
                    format!("no videos to process in {}", manifest.display()).yellow()
                );
                return Ok(());
            }

            let jobs: Vec<VideoJob> = entries.iter().map(|entry| entry.to_job()).collect();
            let summary = run_batch(&mut processor, &jobs, &out, package);

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                for report in &summary.completed {
                    print_report(report);
                }
                for failure in &summary.failed {
                    eprintln!(
                        "{} {}",
                        "warning:".yellow().bold(),
                        format!("{}: {}", failure.video_path.display(), failure.error).yellow()
                    );
                }
                println!(
                    "{} {}",
                    "success:".green().bold(),
                    format!(
                        "{} video(s) done, {} failed, {} frame(s) saved",
                        summary.completed.len(),
                        summary.failed.len(),
                        summary.total_saved()
                    )
                    .green()
                );
            }
        }
        Commands::Subs { input, json } => {
            let format = SubtitleFormat::from_path(&input)?;
            let entries = parse_subtitles(&input)?;
            if json {
                let payload: Vec<_> = entries
                    .iter()
                    .map(|entry| {
                        json!({
                            "start": entry.start,
                            "end": entry.end,
                            "text": entry.text,
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!("Format: {format}");
                println!("Entries: {}", entries.len());
                for entry in &entries {
                    println!(
                        "{} --> {}  {}",
                        framecut::format_clock(entry.start),
                        framecut::format_clock(entry.end),
                        entry.text.replace('\n', " / ")
                    );
                }
            }
        }
        Commands::Hash { input } => {
            let fingerprint = DctHasher::new().fingerprint_file(&input)?;
            println!("{fingerprint}");
        }
        Commands::Probe { input } => {
            let duration = FfmpegProbe.duration(&input)?;
            if duration <= 0.0 {
                eprintln!(
                    "{} {}",
                    "warning:".yellow().bold(),
                    format!("no duration reported for {}", input.display()).yellow()
                );
            }
            println!("Duration: {duration:.3}s ({})", framecut::format_clock(duration));
        }
        Commands::Package { dir, zip } => {
            let count = archive_directory(&dir, &zip)?;
            println!("{} {} ({count} files)", "saved".green().bold(), zip.display());
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "framecut", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}
