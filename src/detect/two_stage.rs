//! Detector-then-recognizer pipeline.

use std::path::Path;
use std::sync::Arc;

use image::DynamicImage;

use super::{Detection, ModelRegistry};
use crate::error::OcrLabelError;
use crate::geometry::{normalize_corners, CanonicalBox};

/// Runs a region detector, then reads each region with a recognizer.
///
/// The recognizer is only loaded once the detector has produced at least
/// one usable region.
#[derive(Debug, Clone)]
pub struct TwoStageEngine {
    registry: Arc<ModelRegistry>,
}

impl TwoStageEngine {
    pub fn new(registry: Arc<ModelRegistry>) -> Self {
        Self { registry }
    }

    pub fn process_image(&self, image_path: &Path) -> Result<Vec<Detection>, OcrLabelError> {
        let image = image::open(image_path).map_err(|source| OcrLabelError::ImageRead {
            path: image_path.to_path_buf(),
            source,
        })?;

        let detector = self.registry.detector()?;
        let raw_boxes = detector.detect(image_path)?;

        let regions: Vec<(CanonicalBox, DynamicImage)> = raw_boxes
            .into_iter()
            .enumerate()
            .filter_map(|(index, corners)| {
                let region = normalize_corners(corners)
                    .and_then(|bbox| crop_region(&image, &bbox).map(|crop| (bbox, crop)));
                match region {
                    Ok(region) => Some(region),
                    Err(err) => {
                        tracing::warn!(index, error = %err, "dropping region with invalid geometry");
                        None
                    }
                }
            })
            .collect();

        if regions.is_empty() {
            return Ok(Vec::new());
        }

        let recognizer = self.registry.recognizer()?;
        let mut detections = Vec::with_capacity(regions.len());
        for (bbox, crop) in regions {
            let text = recognizer.recognize(&crop)?;
            tracing::debug!(?bbox, %text, "recognized region");
            detections.push(Detection::new(bbox, text));
        }
        Ok(detections)
    }
}

/// Crops `bbox` out of `image`, clipped to the image bounds.
///
/// Fractional edges are widened to whole pixels.
fn crop_region(image: &DynamicImage, bbox: &CanonicalBox) -> Result<DynamicImage, OcrLabelError> {
    let max = bbox.max();
    let x0 = (bbox.x().floor() as u32).min(image.width());
    let y0 = (bbox.y().floor() as u32).min(image.height());
    let x1 = (max.x.ceil() as u32).min(image.width());
    let y1 = (max.y.ceil() as u32).min(image.height());

    if x1 <= x0 || y1 <= y0 {
        return Err(OcrLabelError::invalid_geometry(format!(
            "region {:?} lies outside the {}x{} image",
            bbox,
            image.width(),
            image.height()
        )));
    }

    Ok(image.crop_imm(x0, y0, x1 - x0, y1 - y0))
}
