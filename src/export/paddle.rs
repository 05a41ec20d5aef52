//! PaddleOCR-style label files.
//!
//! Regional images get a per-image JSON file:
//!
//! ```text
//! [{"transcription": "Hi", "points": [[0,0],[10,0],[10,5],[0,5]], "difficult": false, "direction": 0}]
//! ```
//!
//! Text-only images share one tab-separated `labels.txt`.

use std::fs;
use std::path::Path;

use serde::ser::SerializeSeq;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::OcrLabelError;
use crate::geometry::{normalize_quad, CanonicalBox, Quad};
use crate::model::Label;

/// Largest magnitude at which every integer is exactly representable in f64.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// One entry of a per-image regional label file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegionalEntry {
    pub transcription: String,

    #[serde(serialize_with = "serialize_points")]
    pub points: Quad,

    #[serde(default)]
    pub difficult: bool,

    #[serde(default)]
    pub direction: i32,
}

impl RegionalEntry {
    /// Builds the entry for a regional box.
    pub fn new(transcription: impl Into<String>, bbox: &CanonicalBox) -> Self {
        Self {
            transcription: transcription.into(),
            points: bbox.to_quad(),
            difficult: false,
            direction: 0,
        }
    }

    /// Re-normalizes the entry's polygon into a canonical box.
    pub fn to_box(&self) -> Result<CanonicalBox, OcrLabelError> {
        normalize_quad(self.points)
    }
}

/// Builds regional entries for an image's labels, skipping text-only ones.
pub fn regional_entries(labels: &[Label]) -> Vec<RegionalEntry> {
    labels
        .iter()
        .filter_map(|label| {
            label
                .geometry
                .bbox()
                .map(|bbox| RegionalEntry::new(label.text.clone(), bbox))
        })
        .collect()
}

/// Renders a regional label file.
pub fn to_regional_json(entries: &[RegionalEntry]) -> Result<String, serde_json::Error> {
    serde_json::to_string(entries)
}

/// Parses a regional label file's contents.
pub fn from_regional_json(data: &str) -> Result<Vec<RegionalEntry>, serde_json::Error> {
    serde_json::from_str(data)
}

/// Writes a regional label file.
pub fn write_regional_label_file(
    path: &Path,
    entries: &[RegionalEntry],
) -> Result<(), OcrLabelError> {
    let json = to_regional_json(entries).map_err(|err| OcrLabelError::Io(err.into()))?;
    fs::write(path, json).map_err(OcrLabelError::Io)
}

/// Reads a regional label file back into entries.
pub fn read_regional_label_file(path: &Path) -> Result<Vec<RegionalEntry>, OcrLabelError> {
    let data = fs::read_to_string(path).map_err(OcrLabelError::Io)?;
    from_regional_json(&data).map_err(|source| OcrLabelError::LabelFileParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Formats one `labels.txt` line: the basename, then each text, tab
/// separated.
pub fn text_only_line(basename: &str, labels: &[Label]) -> String {
    let mut line = String::from(basename);
    for label in labels {
        line.push('\t');
        line.push_str(&label.text);
    }
    line.push('\n');
    line
}

fn serialize_points<S: Serializer>(points: &Quad, serializer: S) -> Result<S::Ok, S::Error> {
    let mut seq = serializer.serialize_seq(Some(points.len()))?;
    for point in points {
        seq.serialize_element(&[Coordinate(point[0]), Coordinate(point[1])])?;
    }
    seq.end()
}

/// Writes integral values as JSON integers, everything else as floats.
struct Coordinate(f64);

impl Serialize for Coordinate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let value = self.0;
        if value.is_finite() && value.fract() == 0.0 && value.abs() < MAX_SAFE_INTEGER {
            serializer.serialize_i64(value as i64)
        } else {
            serializer.serialize_f64(value)
        }
    }
}
