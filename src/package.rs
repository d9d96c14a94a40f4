//! Zip packaging of a frames directory.

use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::Path;

use zip::{CompressionMethod, ZipWriter, write::FileOptions};

use crate::error::FramecutError;

/// Archive every regular file directly inside `dir` into `zip_path`.
///
/// Files are added in name order with deflate compression. Subdirectories
/// are not descended into, and `zip_path` itself is skipped when it lives
/// inside `dir`. Any existing archive is replaced; missing parent
/// directories are created. Returns the number of files archived.
///
/// # Errors
///
/// [`FramecutError::FileOpen`] if `dir` cannot be listed,
/// [`FramecutError::ArchiveError`] or [`FramecutError::IoError`] if writing
/// the archive fails.
pub fn archive_directory(dir: &Path, zip_path: &Path) -> Result<usize, FramecutError> {
    let listing = fs::read_dir(dir).map_err(|error| FramecutError::FileOpen {
        path: dir.to_path_buf(),
        reason: error.to_string(),
    })?;

    let skip = fs::canonicalize(zip_path).ok();
    let mut files = Vec::new();
    for item in listing {
        let item = item?;
        if !item.file_type()?.is_file() {
            continue;
        }
        let path = item.path();
        if skip.is_some() && fs::canonicalize(&path).ok() == skip {
            continue;
        }
        files.push(path);
    }
    files.sort();

    if let Some(parent) = zip_path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let mut writer = ZipWriter::new(File::create(zip_path)?);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for path in &files {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        writer.start_file(name, options)?;
        io::copy(&mut BufReader::new(File::open(path)?), &mut writer)?;
    }
    writer.finish()?;

    log::info!(
        "Archived {} files from {} into {}",
        files.len(),
        dir.display(),
        zip_path.display()
    );
    Ok(files.len())
}
