//! Labels and their geometry.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{ImageId, LabelId};
use crate::error::OcrLabelError;
use crate::geometry::CanonicalBox;

/// The two kinds of annotation an image can hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LabelKind {
    /// Transcribed text only, no located region (caption style).
    TextOnly,
    /// Transcribed text plus a canonical box.
    Regional,
}

impl LabelKind {
    /// Human-readable name for the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            LabelKind::TextOnly => "text-only",
            LabelKind::Regional => "regional",
        }
    }
}

impl fmt::Display for LabelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Geometry carried by a label: either a located region or nothing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LabelGeometry {
    Regional(CanonicalBox),
    TextOnly,
}

impl LabelGeometry {
    /// Returns the kind of this geometry.
    pub fn kind(&self) -> LabelKind {
        match self {
            LabelGeometry::Regional(_) => LabelKind::Regional,
            LabelGeometry::TextOnly => LabelKind::TextOnly,
        }
    }

    /// Returns the box for regional geometry.
    pub fn bbox(&self) -> Option<&CanonicalBox> {
        match self {
            LabelGeometry::Regional(bbox) => Some(bbox),
            LabelGeometry::TextOnly => None,
        }
    }

    /// Builds geometry from four optional fields as they arrive from the
    /// CRUD shell. All present means regional, all absent means text-only,
    /// anything in between is rejected.
    pub fn from_parts(
        x: Option<f64>,
        y: Option<f64>,
        width: Option<f64>,
        height: Option<f64>,
    ) -> Result<Self, OcrLabelError> {
        match (x, y, width, height) {
            (Some(x), Some(y), Some(width), Some(height)) => {
                Ok(LabelGeometry::Regional(CanonicalBox::new(x, y, width, height)?))
            }
            (None, None, None, None) => Ok(LabelGeometry::TextOnly),
            _ => Err(OcrLabelError::invalid_geometry(
                "x, y, width and height must be either all present or all absent",
            )),
        }
    }
}

/// Whether `text` can sit in one tab-separated `labels.txt` field.
pub fn fits_text_line(text: &str) -> bool {
    !text.contains(['\t', '\n', '\r'])
}

/// A persisted annotation attached to an image.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "LabelRecord", into = "LabelRecord")]
pub struct Label {
    pub id: LabelId,
    pub image_id: ImageId,
    pub text: String,
    pub geometry: LabelGeometry,
}

impl Label {
    /// Returns the kind of this label.
    pub fn kind(&self) -> LabelKind {
        self.geometry.kind()
    }

    /// Returns true if the label has no located region.
    pub fn is_text_only(&self) -> bool {
        self.kind() == LabelKind::TextOnly
    }

    /// Converts the label into its flat wire form.
    pub fn to_record(&self) -> LabelRecord {
        self.clone().into()
    }
}

/// A label that has not been assigned an id yet.
#[derive(Clone, Debug, PartialEq)]
pub struct NewLabel {
    pub image_id: ImageId,
    pub text: String,
    pub geometry: LabelGeometry,
}

impl NewLabel {
    /// Creates a regional label.
    pub fn regional(image_id: impl Into<ImageId>, text: impl Into<String>, bbox: CanonicalBox) -> Self {
        Self {
            image_id: image_id.into(),
            text: text.into(),
            geometry: LabelGeometry::Regional(bbox),
        }
    }

    /// Creates a text-only label.
    pub fn text_only(image_id: impl Into<ImageId>, text: impl Into<String>) -> Self {
        Self {
            image_id: image_id.into(),
            text: text.into(),
            geometry: LabelGeometry::TextOnly,
        }
    }
}

/// A partial update to an existing label.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LabelUpdate {
    pub text: Option<String>,
    pub geometry: Option<LabelGeometry>,
}

impl From<LabelGeometry> for LabelUpdate {
    fn from(geometry: LabelGeometry) -> Self {
        LabelUpdate {
            text: None,
            geometry: Some(geometry),
        }
    }
}

/// Flat label record exchanged with the CRUD shell and stored on disk.
///
/// Geometry is four nullable numbers on the wire; [`LabelGeometry`] is the
/// checked form used inside the crate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LabelRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<LabelId>,

    pub image_id: ImageId,

    #[serde(default)]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

impl LabelRecord {
    /// Validates and returns the record's geometry.
    pub fn geometry(&self) -> Result<LabelGeometry, OcrLabelError> {
        LabelGeometry::from_parts(self.x, self.y, self.width, self.height)
    }
}

impl TryFrom<LabelRecord> for Label {
    type Error = OcrLabelError;

    fn try_from(record: LabelRecord) -> Result<Self, Self::Error> {
        let geometry = record.geometry()?;
        let id = record.id.ok_or_else(|| OcrLabelError::InvalidRecord {
            message: format!("label record on image {} has no id", record.image_id),
        })?;
        Ok(Label {
            id,
            image_id: record.image_id,
            text: record.text.unwrap_or_default(),
            geometry,
        })
    }
}

impl TryFrom<LabelRecord> for NewLabel {
    type Error = OcrLabelError;

    fn try_from(record: LabelRecord) -> Result<Self, Self::Error> {
        let geometry = record.geometry()?;
        Ok(NewLabel {
            image_id: record.image_id,
            text: record.text.unwrap_or_default(),
            geometry,
        })
    }
}

impl From<Label> for LabelRecord {
    fn from(label: Label) -> Self {
        let (x, y, width, height) = match label.geometry {
            LabelGeometry::Regional(bbox) => (
                Some(bbox.x()),
                Some(bbox.y()),
                Some(bbox.width()),
                Some(bbox.height()),
            ),
            LabelGeometry::TextOnly => (None, None, None, None),
        };
        LabelRecord {
            id: Some(label.id),
            image_id: label.image_id,
            text: Some(label.text),
            x,
            y,
            width,
            height,
        }
    }
}
