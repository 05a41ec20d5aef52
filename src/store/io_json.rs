//! JSON serialization for the project store.
//!
//! The store file is a single pretty-printed JSON document holding id
//! counters, projects, images and labels. Labels use the flat
//! [`LabelRecord`](crate::model::LabelRecord) form, so the file stays
//! readable by the CRUD shell and by hand.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use super::ProjectStore;
use crate::error::OcrLabelError;

/// Reads a project store from a JSON file.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed. Label records
/// with partial geometry are parse errors.
pub fn read_store(path: &Path) -> Result<ProjectStore, OcrLabelError> {
    let file = File::open(path).map_err(OcrLabelError::Io)?;
    let reader = BufReader::new(file);

    serde_json::from_reader(reader).map_err(|source| OcrLabelError::StoreParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes a project store to a JSON file.
pub fn write_store(path: &Path, store: &ProjectStore) -> Result<(), OcrLabelError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(OcrLabelError::Io)?;
    }

    let file = File::create(path).map_err(OcrLabelError::Io)?;
    let mut writer = BufWriter::new(file);

    serde_json::to_writer_pretty(&mut writer, store).map_err(|source| {
        OcrLabelError::StoreWrite {
            path: path.to_path_buf(),
            source,
        }
    })?;
    writer.flush().map_err(OcrLabelError::Io)
}

/// Reads a project store from a JSON string.
///
/// Useful for testing without file I/O.
pub fn from_json_str(json: &str) -> Result<ProjectStore, serde_json::Error> {
    serde_json::from_str(json)
}

/// Writes a project store to a JSON string.
///
/// Useful for testing without file I/O.
pub fn to_json_string(store: &ProjectStore) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(store)
}
