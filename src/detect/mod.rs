//! Multi-engine text detection.
//!
//! A [`DetectionEngine`] turns an image path into a list of [`Detection`]s,
//! each a canonical box plus the text read inside it. Two pipelines exist:
//!
//! - **Joint** ([`EngineKind::Joint`]): one model locates and reads text in a
//!   single pass and reports four-point polygons.
//! - **Two-stage** ([`EngineKind::TwoStage`]): a detector reports two-corner
//!   boxes, then a recognizer reads each cropped region in turn.
//!
//! Models come from a [`ModelProvider`] and are cached in a
//! [`ModelRegistry`]; engines never construct models themselves.
//!
//! Regions whose geometry is degenerate are dropped with a warning and the
//! run continues. Everything else (unknown engine, unreadable image, model
//! load or inference failure) fails the whole call.

pub mod config;
mod joint;
pub mod provider;
mod registry;
mod two_stage;
pub mod worker;

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub use config::{EngineConfig, WorkerCommand};
pub use joint::JointEngine;
pub use provider::{
    JointReader, JointRegion, ModelKind, ModelProvider, TextDetector, TextRecognizer,
};
pub use registry::ModelRegistry;
pub use two_stage::TwoStageEngine;
pub use worker::WorkerProvider;

use crate::error::OcrLabelError;
use crate::geometry::CanonicalBox;
use crate::model::{ImageId, NewLabel};

/// Selector for the detection pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EngineKind {
    Joint,
    TwoStage,
}

impl EngineKind {
    /// Canonical selector string.
    pub fn name(&self) -> &'static str {
        match self {
            EngineKind::Joint => "joint",
            EngineKind::TwoStage => "two-stage",
        }
    }

    /// All supported engines.
    pub fn all() -> [EngineKind; 2] {
        [EngineKind::Joint, EngineKind::TwoStage]
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EngineKind {
    type Err = OcrLabelError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "joint" | "easyocr" => Ok(EngineKind::Joint),
            "two-stage" | "two_stage" | "paddle" => Ok(EngineKind::TwoStage),
            _ => Err(OcrLabelError::UnsupportedEngine(format!(
                "'{}' (supported: joint, two-stage)",
                value
            ))),
        }
    }
}

/// A located, transcribed text region.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub text: String,
}

impl Detection {
    /// Creates a detection from a canonical box.
    pub fn new(bbox: CanonicalBox, text: impl Into<String>) -> Self {
        Self {
            x: bbox.x(),
            y: bbox.y(),
            width: bbox.width(),
            height: bbox.height(),
            text: text.into(),
        }
    }

    /// Returns the detection's box.
    pub fn bbox(&self) -> Result<CanonicalBox, OcrLabelError> {
        CanonicalBox::new(self.x, self.y, self.width, self.height)
    }

    /// Converts the detection into a regional label for `image_id`.
    pub fn to_new_label(&self, image_id: ImageId) -> Result<NewLabel, OcrLabelError> {
        Ok(NewLabel::regional(image_id, self.text.clone(), self.bbox()?))
    }
}

/// A detection pipeline bound to a model registry.
#[derive(Debug)]
pub enum DetectionEngine {
    Joint(JointEngine),
    TwoStage(TwoStageEngine),
}

impl DetectionEngine {
    /// Creates an engine of the given kind.
    pub fn new(kind: EngineKind, registry: Arc<ModelRegistry>) -> Self {
        match kind {
            EngineKind::Joint => DetectionEngine::Joint(JointEngine::new(registry)),
            EngineKind::TwoStage => DetectionEngine::TwoStage(TwoStageEngine::new(registry)),
        }
    }

    /// Creates an engine from a selector string such as `"joint"`.
    ///
    /// # Errors
    /// Returns [`OcrLabelError::UnsupportedEngine`] for unknown selectors.
    pub fn from_selector(
        selector: &str,
        registry: Arc<ModelRegistry>,
    ) -> Result<Self, OcrLabelError> {
        Ok(Self::new(selector.parse()?, registry))
    }

    /// The kind of this engine.
    pub fn kind(&self) -> EngineKind {
        match self {
            DetectionEngine::Joint(_) => EngineKind::Joint,
            DetectionEngine::TwoStage(_) => EngineKind::TwoStage,
        }
    }

    /// Detects and reads text in an image.
    ///
    /// Results keep the backend's native order.
    pub fn process_image(&self, image_path: &Path) -> Result<Vec<Detection>, OcrLabelError> {
        let detections = match self {
            DetectionEngine::Joint(engine) => engine.process_image(image_path)?,
            DetectionEngine::TwoStage(engine) => engine.process_image(image_path)?,
        };
        tracing::info!(
            engine = %self.kind(),
            image = %image_path.display(),
            regions = detections.len(),
            "detection finished"
        );
        Ok(detections)
    }
}

/// Fails with [`OcrLabelError::ImageRead`] unless `path` holds a decodable
/// image header.
pub(crate) fn ensure_readable(path: &Path) -> Result<(u32, u32), OcrLabelError> {
    let read_error = |source: image::ImageError| OcrLabelError::ImageRead {
        path: path.to_path_buf(),
        source,
    };

    image::ImageReader::open(path)
        .map_err(|err| read_error(image::ImageError::IoError(err)))?
        .with_guessed_format()
        .map_err(|err| read_error(image::ImageError::IoError(err)))?
        .into_dimensions()
        .map_err(read_error)
}
