//! Core records shared between the CRUD shell and the core pipeline.
//!
//! Projects own images, images own labels. A label is either *regional*
//! (text plus a [`CanonicalBox`](crate::geometry::CanonicalBox)) or
//! *text-only*; the geometry is a tagged union rather than four nullable
//! numbers, and [`LabelRecord`] is the flat form used on the wire.

mod ids;
mod label;
mod project;

pub use ids::{ImageId, LabelId, ProjectId};
pub use label::{fits_text_line, Label, LabelGeometry, LabelKind, LabelRecord, LabelUpdate, NewLabel};
pub use project::{Image, Project};
