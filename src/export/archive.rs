//! Deterministic zip packing of an export working directory.

use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::Path;

use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use crate::error::OcrLabelError;

/// Zips every file under `root` into `dest`.
///
/// Entries are visited in file-name order and stamped with a fixed
/// timestamp, so the same tree always produces the same bytes. Entry names
/// use `/` separators relative to `root`.
pub fn zip_dir(root: &Path, dest: &Path) -> Result<usize, OcrLabelError> {
    let archive_error = |source: zip::result::ZipError| OcrLabelError::Archive {
        path: dest.to_path_buf(),
        source,
    };

    let file = File::create(dest).map_err(OcrLabelError::Io)?;
    let mut writer = ZipWriter::new(BufWriter::new(file));
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default());

    let mut entries = 0;
    for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|err| OcrLabelError::Io(io::Error::other(err)))?;
        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        let name = relative
            .components()
            .map(|part| part.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        if entry.file_type().is_dir() {
            writer
                .add_directory(format!("{name}/"), options)
                .map_err(archive_error)?;
        } else if entry.file_type().is_file() {
            writer.start_file(name, options).map_err(archive_error)?;
            let mut source = File::open(entry.path()).map_err(OcrLabelError::Io)?;
            io::copy(&mut source, &mut writer).map_err(OcrLabelError::Io)?;
            entries += 1;
        }
    }

    let mut inner = writer.finish().map_err(archive_error)?;
    io::Write::flush(&mut inner).map_err(OcrLabelError::Io)?;
    tracing::debug!(archive = %dest.display(), entries, "wrote archive");
    Ok(entries)
}

/// Size of the archive at `path`, for reporting.
pub(crate) fn archive_size(path: &Path) -> Result<u64, OcrLabelError> {
    Ok(fs::metadata(path).map_err(OcrLabelError::Io)?.len())
}
