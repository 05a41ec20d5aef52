//! Capability traits for external detection and recognition models.
//!
//! ocrlabel does not implement OCR itself. A backend plugs in by providing
//! a [`ModelProvider`] that knows how to construct each model; the
//! [`ModelRegistry`](super::ModelRegistry) decides when construction
//! happens and keeps the result.

use std::fmt;
use std::path::Path;

use image::DynamicImage;

use crate::error::OcrLabelError;
use crate::geometry::{Corners, Quad};

/// The individually loadable models.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ModelKind {
    /// Locates and reads text in one pass.
    Joint,
    /// Locates text regions only.
    Detector,
    /// Reads the text of one cropped region.
    Recognizer,
}

impl ModelKind {
    pub fn name(&self) -> &'static str {
        match self {
            ModelKind::Joint => "joint",
            ModelKind::Detector => "detector",
            ModelKind::Recognizer => "recognizer",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One region reported by a joint model, in the model's native form.
#[derive(Clone, Debug, PartialEq)]
pub struct JointRegion {
    pub points: Quad,
    pub text: String,
    pub confidence: Option<f64>,
}

/// A model that both locates and reads text.
pub trait JointReader: Send + Sync {
    /// Returns regions in the model's native order.
    fn read_text(&self, image_path: &Path) -> Result<Vec<JointRegion>, OcrLabelError>;
}

/// A model that locates text regions as two-corner boxes.
pub trait TextDetector: Send + Sync {
    fn detect(&self, image_path: &Path) -> Result<Vec<Corners>, OcrLabelError>;
}

/// A model that reads the text in a cropped region.
pub trait TextRecognizer: Send + Sync {
    fn recognize(&self, region: &DynamicImage) -> Result<String, OcrLabelError>;
}

/// Constructs models. Construction is assumed to be expensive (weights are
/// loaded, processes spawned) and is only ever invoked by the registry.
pub trait ModelProvider: Send + Sync {
    fn load_joint(&self) -> Result<Box<dyn JointReader>, OcrLabelError>;

    fn load_detector(&self) -> Result<Box<dyn TextDetector>, OcrLabelError>;

    fn load_recognizer(&self) -> Result<Box<dyn TextRecognizer>, OcrLabelError>;
}
