//! Where a video's outputs go.
//!
//! Every filesystem write the orchestrator makes goes through an
//! [`OutputSink`]: frame images, the JSONL record log, and the optional
//! chunk summary. [`DirectorySink`] writes to disk; [`MemorySink`] keeps
//! everything in memory so the dedup and chunking logic can be exercised
//! without touching the filesystem.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::FramecutError;

/// Destination for one video's frames and records.
pub trait OutputSink {
    /// The directory (real or virtual) outputs are placed in.
    fn location(&self) -> &Path;

    /// Prepare for a fresh run. The record log starts out empty.
    fn begin(&mut self) -> Result<(), FramecutError>;

    /// Store an encoded frame under `name` and return its full path.
    fn write_frame(&mut self, name: &str, bytes: &[u8]) -> Result<PathBuf, FramecutError>;

    /// Append one line (without trailing newline) to the record log.
    fn append_record(&mut self, line: &str) -> Result<(), FramecutError>;

    /// Write a pretty-printed JSON document under `name`.
    fn write_json(&mut self, name: &str, value: &Value) -> Result<PathBuf, FramecutError>;
}

/// Writes into a directory on disk.
#[derive(Debug)]
pub struct DirectorySink {
    dir: PathBuf,
    log_file_name: String,
    log: Option<BufWriter<File>>,
}

impl DirectorySink {
    /// A sink rooted at `dir`, logging records to `dir/log_file_name`.
    ///
    /// Nothing is created until [`begin`](OutputSink::begin).
    pub fn new(dir: impl Into<PathBuf>, log_file_name: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            log_file_name: log_file_name.into(),
            log: None,
        }
    }

    /// Path of the record log.
    pub fn log_path(&self) -> PathBuf {
        self.dir.join(&self.log_file_name)
    }
}

impl OutputSink for DirectorySink {
    fn location(&self) -> &Path {
        &self.dir
    }

    fn begin(&mut self) -> Result<(), FramecutError> {
        fs::create_dir_all(&self.dir)?;
        let log_path = self.log_path();
        let file = File::create(&log_path).map_err(|error| FramecutError::FileOpen {
            path: log_path,
            reason: error.to_string(),
        })?;
        self.log = Some(BufWriter::new(file));
        Ok(())
    }

    fn write_frame(&mut self, name: &str, bytes: &[u8]) -> Result<PathBuf, FramecutError> {
        let path = self.dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, bytes)?;
        Ok(path)
    }

    fn append_record(&mut self, line: &str) -> Result<(), FramecutError> {
        if self.log.is_none() {
            self.begin()?;
        }
        if let Some(log) = self.log.as_mut() {
            writeln!(log, "{line}")?;
            log.flush()?;
        }
        Ok(())
    }

    fn write_json(&mut self, name: &str, value: &Value) -> Result<PathBuf, FramecutError> {
        let path = self.dir.join(name);
        fs::write(&path, serde_json::to_string_pretty(value)?)?;
        Ok(path)
    }
}

/// Keeps everything in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    root: PathBuf,
    /// Frames currently stored, keyed by full path.
    pub frames: BTreeMap<PathBuf, Vec<u8>>,
    /// Record log lines, in order.
    pub records: Vec<String>,
    /// JSON documents by name.
    pub documents: BTreeMap<String, Value>,
    /// How many times [`begin`](OutputSink::begin) was called.
    pub runs: usize,
}

impl MemorySink {
    /// A sink whose paths are rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Parse every record line as JSON.
    pub fn parsed_records(&self) -> Result<Vec<Value>, FramecutError> {
        self.records
            .iter()
            .map(|line| serde_json::from_str(line).map_err(FramecutError::from))
            .collect()
    }
}

impl OutputSink for MemorySink {
    fn location(&self) -> &Path {
        &self.root
    }

    fn begin(&mut self) -> Result<(), FramecutError> {
        self.records.clear();
        self.runs += 1;
        Ok(())
    }

    fn write_frame(&mut self, name: &str, bytes: &[u8]) -> Result<PathBuf, FramecutError> {
        let path = self.root.join(name);
        self.frames.insert(path.clone(), bytes.to_vec());
        Ok(path)
    }

    fn append_record(&mut self, line: &str) -> Result<(), FramecutError> {
        self.records.push(line.to_string());
        Ok(())
    }

    fn write_json(&mut self, name: &str, value: &Value) -> Result<PathBuf, FramecutError> {
        self.documents.insert(name.to_string(), value.clone());
        Ok(self.root.join(name))
    }
}
