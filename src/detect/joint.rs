//! Single-pass detector+recognizer pipeline.

use std::path::Path;
use std::sync::Arc;

use super::{ensure_readable, Detection, ModelRegistry};
use crate::error::OcrLabelError;
use crate::geometry::normalize_quad;

/// Runs a joint model that reports `(polygon, text, confidence)` triples.
#[derive(Debug, Clone)]
pub struct JointEngine {
    registry: Arc<ModelRegistry>,
}

impl JointEngine {
    pub fn new(registry: Arc<ModelRegistry>) -> Self {
        Self { registry }
    }

    pub fn process_image(&self, image_path: &Path) -> Result<Vec<Detection>, OcrLabelError> {
        ensure_readable(image_path)?;

        let reader = self.registry.joint_reader()?;
        let regions = reader.read_text(image_path)?;

        let mut detections = Vec::with_capacity(regions.len());
        for (index, region) in regions.into_iter().enumerate() {
            match normalize_quad(region.points) {
                Ok(bbox) => {
                    tracing::trace!(index, confidence = ?region.confidence, text = %region.text);
                    detections.push(Detection::new(bbox, region.text));
                }
                Err(err) => {
                    tracing::warn!(index, error = %err, "dropping region with invalid geometry");
                }
            }
        }
        Ok(detections)
    }
}
