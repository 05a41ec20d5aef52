//! Persistence for projects, images and labels.
//!
//! The core pipeline (detection, export, validation) never reaches into
//! storage directly; it reads through the [`ProjectSource`] trait. The
//! [`ProjectStore`] here is the crate's own implementation of that seam: a
//! small in-memory store that round-trips through a JSON file (see
//! [`io_json`]).
//!
//! The store is also where the label-kind invariant lives. Within one image
//! labels are either all regional or all text-only, and an image holds at
//! most one text-only label: creating another one replaces the first.

pub mod io_json;

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::detect::Detection;
use crate::error::OcrLabelError;
use crate::model::{
    fits_text_line, Image, ImageId, Label, LabelId, LabelKind, LabelUpdate, NewLabel, Project,
    ProjectId,
};

/// Read access to persisted projects, as needed by export and validation.
pub trait ProjectSource {
    /// Looks up a project.
    ///
    /// # Errors
    /// Returns [`OcrLabelError::ProjectNotFound`] if the project does not exist.
    fn project(&self, id: ProjectId) -> Result<Project, OcrLabelError>;

    /// Lists a project's images in their stable iteration order.
    fn project_images(&self, id: ProjectId) -> Result<Vec<Image>, OcrLabelError>;

    /// Lists an image's labels in creation order.
    fn image_labels(&self, id: ImageId) -> Result<Vec<Label>, OcrLabelError>;
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct Counters {
    project: u64,
    image: u64,
    label: u64,
}

impl Counters {
    fn next(counter: &mut u64) -> u64 {
        *counter += 1;
        *counter
    }
}

/// JSON-file-backed store of projects, images and labels.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ProjectStore {
    #[serde(default)]
    counters: Counters,

    #[serde(default)]
    projects: Vec<Project>,

    #[serde(default)]
    images: Vec<Image>,

    #[serde(default)]
    labels: Vec<Label>,
}

impl ProjectStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a store file, or returns an empty store if it does not exist yet.
    pub fn open(path: &Path) -> Result<Self, OcrLabelError> {
        if path.exists() {
            io_json::read_store(path)
        } else {
            Ok(Self::new())
        }
    }

    /// Writes the store to `path`.
    pub fn save(&self, path: &Path) -> Result<(), OcrLabelError> {
        io_json::write_store(path, self)
    }

    /// All projects, in creation order.
    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    /// Creates a new project.
    pub fn create_project(
        &mut self,
        name: impl Into<String>,
        description: Option<String>,
    ) -> Project {
        let project = Project {
            id: ProjectId::new(Counters::next(&mut self.counters.project)),
            name: name.into(),
            description,
        };
        self.projects.push(project.clone());
        project
    }

    /// Deletes a project together with its images and their labels.
    pub fn delete_project(&mut self, id: ProjectId) -> Result<(), OcrLabelError> {
        self.project_ref(id)?;

        let image_ids: Vec<ImageId> = self
            .images
            .iter()
            .filter(|image| image.project_id == id)
            .map(|image| image.id)
            .collect();

        self.labels
            .retain(|label| !image_ids.contains(&label.image_id));
        self.images.retain(|image| image.project_id != id);
        self.projects.retain(|project| project.id != id);

        tracing::debug!(project = %id, images = image_ids.len(), "deleted project");
        Ok(())
    }

    /// Copies an uploaded file into `uploads_dir` and records it as an image
    /// of the project.
    ///
    /// The original file name is kept as the image's `filename`. If a file of
    /// that name already exists in `uploads_dir`, the stored copy is prefixed
    /// with the new image id (and a counter if that is taken too); existing
    /// files are never overwritten.
    pub fn add_image(
        &mut self,
        project_id: ProjectId,
        source: &Path,
        uploads_dir: &Path,
    ) -> Result<Image, OcrLabelError> {
        self.project_ref(project_id)?;

        let filename = source
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| {
                OcrLabelError::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("'{}' has no file name", source.display()),
                ))
            })?;

        let id = ImageId::new(self.counters.image + 1);
        fs::create_dir_all(uploads_dir)?;
        let destination = copy_upload(source, uploads_dir, &filename, id)?;

        self.counters.image = id.as_u64();
        let image = Image::new(id, project_id, filename, destination);
        self.images.push(image.clone());
        Ok(image)
    }

    /// Records an image whose bytes are already on disk.
    pub fn register_image(
        &mut self,
        project_id: ProjectId,
        filename: impl Into<String>,
        file_path: impl Into<PathBuf>,
    ) -> Result<Image, OcrLabelError> {
        self.project_ref(project_id)?;
        let id = ImageId::new(Counters::next(&mut self.counters.image));
        let image = Image::new(id, project_id, filename, file_path);
        self.images.push(image.clone());
        Ok(image)
    }

    /// Looks up an image.
    pub fn image(&self, id: ImageId) -> Result<&Image, OcrLabelError> {
        self.images
            .iter()
            .find(|image| image.id == id)
            .ok_or(OcrLabelError::ImageNotFound(id))
    }

    /// Deletes an image and its labels.
    pub fn delete_image(&mut self, id: ImageId) -> Result<(), OcrLabelError> {
        self.image(id)?;
        self.labels.retain(|label| label.image_id != id);
        self.images.retain(|image| image.id != id);
        Ok(())
    }

    /// Creates a label, enforcing the per-image kind invariant.
    ///
    /// A text-only label replaces any text-only label the image already has.
    ///
    /// # Errors
    /// - [`OcrLabelError::ImageNotFound`] if the image does not exist.
    /// - [`OcrLabelError::MixedLabelKinds`] if the image already holds labels
    ///   of the other kind.
    pub fn create_label(&mut self, new_label: NewLabel) -> Result<Label, OcrLabelError> {
        let image_id = new_label.image_id;
        self.image(image_id)?;

        let kind = new_label.geometry.kind();
        check_text(image_id, kind, &new_label.text)?;
        if let Some(existing) = self.existing_kind(image_id, None) {
            if existing != kind {
                return Err(mixed(image_id, existing, kind));
            }
        }

        if kind == LabelKind::TextOnly {
            let before = self.labels.len();
            self.labels
                .retain(|label| !(label.image_id == image_id && label.is_text_only()));
            if self.labels.len() != before {
                tracing::debug!(image = %image_id, "replaced existing text-only label");
            }
        }

        let label = Label {
            id: LabelId::new(Counters::next(&mut self.counters.label)),
            image_id,
            text: new_label.text,
            geometry: new_label.geometry,
        };
        self.labels.push(label.clone());
        Ok(label)
    }

    /// Applies a partial update to a label.
    ///
    /// Changing the label's kind is only allowed when it is the image's sole
    /// label; otherwise the image would end up mixed.
    pub fn update_label(
        &mut self,
        id: LabelId,
        update: LabelUpdate,
    ) -> Result<Label, OcrLabelError> {
        let index = self
            .labels
            .iter()
            .position(|label| label.id == id)
            .ok_or(OcrLabelError::LabelNotFound(id))?;

        let image_id = self.labels[index].image_id;
        let geometry = update.geometry.unwrap_or(self.labels[index].geometry);
        let new_kind = geometry.kind();
        if update.geometry.is_some() {
            if let Some(existing) = self.existing_kind(image_id, Some(id)) {
                if existing != new_kind {
                    return Err(mixed(image_id, existing, new_kind));
                }
            }
        }
        check_text(
            image_id,
            new_kind,
            update.text.as_deref().unwrap_or(&self.labels[index].text),
        )?;

        let label = &mut self.labels[index];
        label.geometry = geometry;
        if let Some(text) = update.text {
            label.text = text;
        }
        Ok(label.clone())
    }

    /// Deletes a single label.
    pub fn delete_label(&mut self, id: LabelId) -> Result<(), OcrLabelError> {
        let before = self.labels.len();
        self.labels.retain(|label| label.id != id);
        if self.labels.len() == before {
            return Err(OcrLabelError::LabelNotFound(id));
        }
        Ok(())
    }

    /// Removes every label of an image, returning how many were removed.
    pub fn clean_image_labels(&mut self, image_id: ImageId) -> Result<usize, OcrLabelError> {
        self.image(image_id)?;
        let before = self.labels.len();
        self.labels.retain(|label| label.image_id != image_id);
        Ok(before - self.labels.len())
    }

    /// Removes every label of every image in a project, returning how many
    /// were removed.
    pub fn clean_project_labels(&mut self, project_id: ProjectId) -> Result<usize, OcrLabelError> {
        self.project_ref(project_id)?;
        let image_ids: Vec<ImageId> = self
            .images
            .iter()
            .filter(|image| image.project_id == project_id)
            .map(|image| image.id)
            .collect();

        let before = self.labels.len();
        self.labels
            .retain(|label| !image_ids.contains(&label.image_id));
        Ok(before - self.labels.len())
    }

    /// Persists detection results as regional labels of an image.
    ///
    /// Fails without storing anything if the image holds a text-only label.
    pub fn save_detections(
        &mut self,
        image_id: ImageId,
        detections: &[Detection],
    ) -> Result<Vec<Label>, OcrLabelError> {
        self.image(image_id)?;
        if let Some(LabelKind::TextOnly) = self.existing_kind(image_id, None) {
            return Err(mixed(image_id, LabelKind::TextOnly, LabelKind::Regional));
        }

        let new_labels = detections
            .iter()
            .map(|detection| detection.to_new_label(image_id))
            .collect::<Result<Vec<_>, _>>()?;

        new_labels
            .into_iter()
            .map(|new_label| self.create_label(new_label))
            .collect()
    }

    fn project_ref(&self, id: ProjectId) -> Result<&Project, OcrLabelError> {
        self.projects
            .iter()
            .find(|project| project.id == id)
            .ok_or(OcrLabelError::ProjectNotFound(id))
    }

    /// Kind of the labels an image currently holds, ignoring `exclude`.
    fn existing_kind(&self, image_id: ImageId, exclude: Option<LabelId>) -> Option<LabelKind> {
        self.labels
            .iter()
            .filter(|label| label.image_id == image_id && Some(label.id) != exclude)
            .map(|label| label.geometry.kind())
            .next()
    }
}

impl ProjectSource for ProjectStore {
    fn project(&self, id: ProjectId) -> Result<Project, OcrLabelError> {
        self.project_ref(id).cloned()
    }

    fn project_images(&self, id: ProjectId) -> Result<Vec<Image>, OcrLabelError> {
        self.project_ref(id)?;
        Ok(self
            .images
            .iter()
            .filter(|image| image.project_id == id)
            .cloned()
            .collect())
    }

    fn image_labels(&self, id: ImageId) -> Result<Vec<Label>, OcrLabelError> {
        self.image(id)?;
        Ok(self
            .labels
            .iter()
            .filter(|label| label.image_id == id)
            .cloned()
            .collect())
    }
}

/// Text-only labels end up as fields of a tab-separated line on export.
fn check_text(image_id: ImageId, kind: LabelKind, text: &str) -> Result<(), OcrLabelError> {
    if kind == LabelKind::TextOnly && !fits_text_line(text) {
        return Err(OcrLabelError::InvalidLabelText {
            image_id,
            text: text.to_string(),
        });
    }
    Ok(())
}

/// Copies `source` to the first free name in `uploads_dir`: the original
/// name, then `<id>_<name>`, then `<id>_<n>_<name>`.
fn copy_upload(
    source: &Path,
    uploads_dir: &Path,
    filename: &str,
    id: ImageId,
) -> Result<PathBuf, OcrLabelError> {
    let mut reader = File::open(source)?;
    let mut attempt = 0u32;
    loop {
        let name = match attempt {
            0 => filename.to_string(),
            1 => format!("{}_{}", id, filename),
            n => format!("{}_{}_{}", id, n - 1, filename),
        };
        let destination = uploads_dir.join(name);
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&destination)
        {
            Ok(mut file) => {
                io::copy(&mut reader, &mut file)?;
                return Ok(destination);
            }
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => attempt += 1,
            Err(err) => return Err(OcrLabelError::Io(err)),
        }
    }
}

fn mixed(image_id: ImageId, existing: LabelKind, attempted: LabelKind) -> OcrLabelError {
    OcrLabelError::MixedLabelKinds {
        image_id,
        existing: existing.as_str(),
        attempted: attempted.as_str(),
    }
}
