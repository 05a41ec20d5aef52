//! The canonical axis-aligned box.

use serde::{Deserialize, Serialize};

use super::coord::Point;
use crate::error::OcrLabelError;

/// Largest coordinate magnitude accepted from any backend, in pixels.
pub const MAX_COORDINATE: f64 = 1_000_000.0;

/// An axis-aligned box in XYWH format (top-left x, top-left y, width, height).
///
/// Construction is checked: a `CanonicalBox` always has a finite,
/// non-negative origin and strictly positive width and height, all within
/// [`MAX_COORDINATE`]. Backends that produce anything else are rejected with
/// [`OcrLabelError::InvalidGeometry`].
#[derive(Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBox", into = "RawBox")]
pub struct CanonicalBox {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

impl CanonicalBox {
    /// Creates a box from its top-left corner and size.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Result<Self, OcrLabelError> {
        for (name, value) in [("x", x), ("y", y), ("width", width), ("height", height)] {
            if !value.is_finite() {
                return Err(OcrLabelError::invalid_geometry(format!(
                    "{name} is not finite ({value})"
                )));
            }
            if value.abs() > MAX_COORDINATE {
                return Err(OcrLabelError::invalid_geometry(format!(
                    "{name} {value} exceeds the supported range of {MAX_COORDINATE}"
                )));
            }
        }

        if x < 0.0 || y < 0.0 {
            return Err(OcrLabelError::invalid_geometry(format!(
                "origin ({x}, {y}) is negative"
            )));
        }

        if width <= 0.0 || height <= 0.0 {
            return Err(OcrLabelError::invalid_geometry(format!(
                "size {width}x{height} must be positive"
            )));
        }

        if x + width > MAX_COORDINATE || y + height > MAX_COORDINATE {
            return Err(OcrLabelError::invalid_geometry(format!(
                "far corner ({}, {}) exceeds the supported range of {MAX_COORDINATE}",
                x + width,
                y + height
            )));
        }

        Ok(Self {
            x,
            y,
            width,
            height,
        })
    }

    /// Returns the top-left x coordinate.
    #[inline]
    pub fn x(&self) -> f64 {
        self.x
    }

    /// Returns the top-left y coordinate.
    #[inline]
    pub fn y(&self) -> f64 {
        self.y
    }

    /// Returns the width of the box.
    #[inline]
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Returns the height of the box.
    #[inline]
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Returns the area of the box.
    #[inline]
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Returns the bottom-right corner.
    #[inline]
    pub fn max(&self) -> Point {
        Point::new(self.x + self.width, self.y + self.height)
    }

    /// Converts to two-corner form `[x1, y1, x2, y2]`.
    pub fn to_corners(&self) -> [f64; 4] {
        let max = self.max();
        [self.x, self.y, max.x, max.y]
    }

    /// Re-expands the box into a clockwise four-point polygon starting at the
    /// top-left corner: `[[x,y],[x+w,y],[x+w,y+h],[x,y+h]]`.
    pub fn to_quad(&self) -> [[f64; 2]; 4] {
        let max = self.max();
        [
            [self.x, self.y],
            [max.x, self.y],
            [max.x, max.y],
            [self.x, max.y],
        ]
    }

    /// Returns true if the box lies entirely inside an image of the given size.
    pub fn fits_within(&self, image_width: u32, image_height: u32) -> bool {
        let max = self.max();
        max.x <= image_width as f64 && max.y <= image_height as f64
    }
}

impl std::fmt::Debug for CanonicalBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CanonicalBox")
            .field("x", &self.x)
            .field("y", &self.y)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

#[derive(Serialize, Deserialize)]
struct RawBox {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

impl TryFrom<RawBox> for CanonicalBox {
    type Error = OcrLabelError;

    fn try_from(raw: RawBox) -> Result<Self, Self::Error> {
        CanonicalBox::new(raw.x, raw.y, raw.width, raw.height)
    }
}

impl From<CanonicalBox> for RawBox {
    fn from(bbox: CanonicalBox) -> Self {
        Self {
            x: bbox.x,
            y: bbox.y,
            width: bbox.width,
            height: bbox.height,
        }
    }
}
