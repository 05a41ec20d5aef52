use std::path::PathBuf;
use thiserror::Error;

use crate::model::{ImageId, LabelId, ProjectId};
use crate::validation::ValidationReport;

/// The main error type for ocrlabel operations.
#[derive(Debug, Error)]
pub enum OcrLabelError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid geometry: {message}")]
    InvalidGeometry { message: String },

    #[error("Unsupported engine: {0}")]
    UnsupportedEngine(String),

    #[error("Failed to read image {path}: {source}")]
    ImageRead {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Project {0} not found")]
    ProjectNotFound(ProjectId),

    #[error("Image {0} not found")]
    ImageNotFound(ImageId),

    #[error("Label {0} not found")]
    LabelNotFound(LabelId),

    #[error("Source file for image {image_id} is missing: {path}")]
    SourceFileMissing { image_id: ImageId, path: PathBuf },

    #[error("Image {image_id} already holds {existing} labels; cannot add a {attempted} label")]
    MixedLabelKinds {
        image_id: ImageId,
        existing: &'static str,
        attempted: &'static str,
    },

    #[error("Images {first} and {second} share the file name '{name}'")]
    DuplicateImageName {
        name: String,
        first: ImageId,
        second: ImageId,
    },

    #[error("Images {first} and {second} would both write the label file '{name}'")]
    LabelFileConflict {
        name: String,
        first: ImageId,
        second: ImageId,
    },

    #[error("Image {image_id} would write its labels to '{name}', which holds the text-only labels")]
    ReservedLabelFile { name: String, image_id: ImageId },

    #[error("Text-only label on image {image_id} contains a tab or line break: {text:?}")]
    InvalidLabelText { image_id: ImageId, text: String },

    #[error("Invalid stored record: {message}")]
    InvalidRecord { message: String },

    #[error("Failed to load {model} model: {message}")]
    ModelLoad { model: &'static str, message: String },

    #[error("{model} inference failed: {message}")]
    Inference { model: &'static str, message: String },

    #[error("Failed to parse project store {path}: {source}")]
    StoreParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write project store {path}: {source}")]
    StoreWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to parse engine config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to parse label file {path}: {source}")]
    LabelFileParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to build archive {path}: {source}")]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("Validation failed with {error_count} error(s) and {warning_count} warning(s)")]
    ValidationFailed {
        error_count: usize,
        warning_count: usize,
        report: ValidationReport,
    },
}

impl OcrLabelError {
    pub(crate) fn invalid_geometry(message: impl Into<String>) -> Self {
        Self::InvalidGeometry {
            message: message.into(),
        }
    }
}
