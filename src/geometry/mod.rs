//! Canonical geometry for ocrlabel.
//!
//! Every detection backend describes text regions in its own convention.
//! This module converts those native descriptions into a single canonical,
//! axis-aligned box so that the rest of the crate (persistence, validation,
//! export) only ever deals with one representation.
//!
//! # Conventions
//!
//! 1. **Pixel space**: coordinates are absolute pixels, origin at the
//!    top-left corner of the image, axes not rotated.
//!
//! 2. **XYWH**: the canonical box stores its top-left corner plus width and
//!    height ([`CanonicalBox`]).
//!
//! 3. **Checked construction**: unlike raw backend output, a
//!    [`CanonicalBox`] is always non-degenerate. Normalizers return
//!    [`OcrLabelError::InvalidGeometry`](crate::OcrLabelError::InvalidGeometry)
//!    instead of building a broken box.
//!
//! # Example
//!
//! ```
//! use ocrlabel::geometry::{normalize_corners, normalize_quad};
//!
//! let from_corners = normalize_corners([10.0, 20.0, 110.0, 50.0]).unwrap();
//! let from_quad = normalize_quad([
//!     [10.0, 20.0],
//!     [110.0, 20.0],
//!     [110.0, 50.0],
//!     [10.0, 50.0],
//! ])
//! .unwrap();
//! assert_eq!(from_corners, from_quad);
//! assert_eq!(from_corners.width(), 100.0);
//! ```

mod bbox;
mod coord;
mod normalize;

pub use bbox::{CanonicalBox, MAX_COORDINATE};
pub use coord::Point;
pub use normalize::{normalize_corners, normalize_quad, Corners, Quad};
