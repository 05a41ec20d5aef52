//! Conversion from backend-native box descriptions to [`CanonicalBox`].

use super::bbox::CanonicalBox;
use super::coord::Point;
use crate::error::OcrLabelError;

/// Two-corner form `[x1, y1, x2, y2]` as emitted by region detectors.
pub type Corners = [f64; 4];

/// Four-point polygon `[[x, y]; 4]`, clockwise from the top-left corner, as
/// emitted by joint detector+recognizer models.
pub type Quad = [[f64; 2]; 4];

/// Normalizes a two-corner box.
///
/// `x = x1`, `y = y1`, `width = x2 - x1`, `height = y2 - y1`.
pub fn normalize_corners(corners: Corners) -> Result<CanonicalBox, OcrLabelError> {
    let [x1, y1, x2, y2] = corners;
    CanonicalBox::new(x1, y1, x2 - x1, y2 - y1)
}

/// Normalizes a clockwise four-point polygon into its axis-aligned envelope.
///
/// The polygon may be skewed by perspective. The result takes the leftmost
/// of the two left points, the topmost of the two top points, and so on;
/// rotation is not preserved.
pub fn normalize_quad(quad: Quad) -> Result<CanonicalBox, OcrLabelError> {
    let [p0, p1, p2, p3] = quad.map(Point::from);
    if let Some(bad) = [p0, p1, p2, p3].iter().find(|p| !p.is_finite()) {
        return Err(OcrLabelError::invalid_geometry(format!(
            "polygon point {bad:?} is not finite"
        )));
    }

    let x = p0.x.min(p3.x);
    let y = p0.y.min(p1.y);
    let width = p1.x.max(p2.x) - x;
    let height = p2.y.max(p3.y) - y;
    CanonicalBox::new(x, y, width, height)
}
