//! Projects and their uploaded images.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::ids::{ImageId, ProjectId};

/// A labelling project.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Unique identifier for this project.
    pub id: ProjectId,

    /// Display name.
    pub name: String,

    /// Optional free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// An uploaded image belonging to a project.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Image {
    /// Unique identifier for this image.
    pub id: ImageId,

    /// Project this image belongs to.
    pub project_id: ProjectId,

    /// Original upload file name.
    pub filename: String,

    /// Location of the image bytes on disk.
    pub file_path: PathBuf,
}

impl Image {
    /// Creates a new image record.
    pub fn new(
        id: impl Into<ImageId>,
        project_id: impl Into<ProjectId>,
        filename: impl Into<String>,
        file_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            id: id.into(),
            project_id: project_id.into(),
            filename: filename.into(),
            file_path: file_path.into(),
        }
    }

    /// The file name used inside exported datasets.
    ///
    /// Any directory components of the upload name are stripped.
    pub fn basename(&self) -> String {
        Path::new(&self.filename)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.filename.clone())
    }

    /// The basename without its extension.
    pub fn stem(&self) -> String {
        let basename = self.basename();
        Path::new(&basename)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or(basename)
    }
}
