//! Project validation for ocrlabel.
//!
//! Checks a project for everything that would make an export fail or
//! produce a dataset that does not mean what the annotator intended:
//! - Source files present on disk and exported under unique names, with
//!   label files that do not overwrite each other
//! - Label-kind consistency within each image
//! - Box geometry that survives export and fits the image

mod report;

pub use report::{IssueCode, IssueContext, Severity, ValidationIssue, ValidationReport};

use std::collections::HashMap;
use std::path::Path;

use crate::classify::classify;
use crate::error::OcrLabelError;
use crate::export::{regional_label_file, TEXT_ONLY_FILE};
use crate::geometry::normalize_quad;
use crate::model::{fits_text_line, Image, ImageId, Label, LabelKind, ProjectId};
use crate::store::ProjectSource;

/// Options for validation behavior.
#[derive(Clone, Debug, Default)]
pub struct ValidateOptions {
    /// If true, treat warnings as errors.
    pub strict: bool,
}

impl ValidateOptions {
    /// Whether `report` passes under these options.
    pub fn passes(&self, report: &ValidationReport) -> bool {
        if self.strict {
            report.is_ok_strict()
        } else {
            report.is_ok()
        }
    }
}

/// Validates a project and returns a report of all issues found.
///
/// # Errors
/// Only lookup failures (e.g. [`OcrLabelError::ProjectNotFound`]) are
/// returned as errors; problems with the project's content become issues.
pub fn validate_project(
    source: &impl ProjectSource,
    project_id: ProjectId,
    _opts: &ValidateOptions,
) -> Result<ValidationReport, OcrLabelError> {
    source.project(project_id)?;
    let images = source.project_images(project_id)?;

    let mut report = ValidationReport::new();
    if images.is_empty() {
        report.add(ValidationIssue::warning(
            IssueCode::EmptyProject,
            "Project has no images",
            IssueContext::Project {
                id: project_id.as_u64(),
            },
        ));
        return Ok(report);
    }

    let mut seen_names: HashMap<String, ImageId> = HashMap::new();
    let mut label_files: HashMap<String, ImageId> = HashMap::new();
    for image in &images {
        let basename = image.basename();
        if let Some(first) = seen_names.get(&basename) {
            report.add(ValidationIssue::error(
                IssueCode::DuplicateImageName,
                format!(
                    "File name '{}' is also used by image {}",
                    basename, first
                ),
                IssueContext::Image {
                    id: image.id.as_u64(),
                },
            ));
        } else {
            seen_names.insert(basename, image.id);
        }

        let labels = source.image_labels(image.id)?;
        if !labels.is_empty() && classify(&labels) == LabelKind::Regional {
            validate_label_file(image, &mut label_files, &mut report);
        }
        let dims = validate_image_file(image, &mut report);
        validate_labels(image, &labels, dims, &mut report);
    }

    tracing::debug!(
        project = %project_id,
        errors = report.error_count(),
        warnings = report.warning_count(),
        "validated project"
    );
    Ok(report)
}

/// Checks that a regional image's label file name is free.
fn validate_label_file(
    image: &Image,
    label_files: &mut HashMap<String, ImageId>,
    report: &mut ValidationReport,
) {
    let name = regional_label_file(image);
    let context = IssueContext::Image {
        id: image.id.as_u64(),
    };
    if name == TEXT_ONLY_FILE {
        report.add(ValidationIssue::error(
            IssueCode::LabelFileConflict,
            format!("Label file '{}' is reserved for text-only labels", name),
            context,
        ));
    } else if let Some(first) = label_files.get(&name) {
        report.add(ValidationIssue::error(
            IssueCode::LabelFileConflict,
            format!("Label file '{}' is also written by image {}", name, first),
            context,
        ));
    } else {
        label_files.insert(name, image.id);
    }
}

/// Checks the image file and returns its dimensions when they can be read.
fn validate_image_file(image: &Image, report: &mut ValidationReport) -> Option<(u32, u32)> {
    let id = image.id.as_u64();

    if !image.file_path.is_file() {
        report.add(ValidationIssue::error(
            IssueCode::SourceFileMissing,
            format!("Source file '{}' does not exist", image.file_path.display()),
            IssueContext::Image { id },
        ));
        return None;
    }

    match read_image_dimensions(&image.file_path) {
        Ok(dims) => Some(dims),
        Err(message) => {
            report.add(ValidationIssue::warning(
                IssueCode::UnreadableImageHeader,
                message,
                IssueContext::Image { id },
            ));
            None
        }
    }
}

fn validate_labels(
    image: &Image,
    labels: &[Label],
    dims: Option<(u32, u32)>,
    report: &mut ValidationReport,
) {
    let id = image.id.as_u64();

    let text_only = labels.iter().filter(|label| label.is_text_only()).count();
    if text_only > 0 && text_only < labels.len() {
        report.add(ValidationIssue::error(
            IssueCode::MixedLabelKinds,
            format!(
                "{} text-only and {} regional labels; regional labels would be dropped on export",
                text_only,
                labels.len() - text_only
            ),
            IssueContext::Image { id },
        ));
    }
    if text_only > 1 {
        report.add(ValidationIssue::error(
            IssueCode::MultipleTextOnlyLabels,
            format!("{} text-only labels (at most one expected)", text_only),
            IssueContext::Image { id },
        ));
    }

    let kind = classify(labels);
    for label in labels {
        let context = IssueContext::Label {
            id: label.id.as_u64(),
            image_id: id,
        };

        if label.text.trim().is_empty() {
            report.add(ValidationIssue::warning(
                IssueCode::EmptyText,
                "Empty label text",
                context.clone(),
            ));
        }

        if label.is_text_only() && !fits_text_line(&label.text) {
            report.add(ValidationIssue::error(
                IssueCode::InvalidText,
                format!("Text {:?} contains a tab or line break", label.text),
                context.clone(),
            ));
        }

        let Some(bbox) = label.geometry.bbox() else {
            continue;
        };
        if kind != LabelKind::Regional {
            continue;
        }

        match normalize_quad(bbox.to_quad()) {
            Ok(restored) if restored == *bbox => {}
            Ok(restored) => report.add(ValidationIssue::error(
                IssueCode::InvalidBox,
                format!(
                    "Box {:?} reads back as {:?} after export",
                    bbox, restored
                ),
                context.clone(),
            )),
            Err(err) => report.add(ValidationIssue::error(
                IssueCode::InvalidBox,
                format!("Box {:?} cannot be exported: {}", bbox, err),
                context.clone(),
            )),
        }

        if let Some((width, height)) = dims {
            // Allow small tolerance for floating point
            let tolerance = 0.5;
            let max = bbox.max();
            if max.x > width as f64 + tolerance || max.y > height as f64 + tolerance {
                report.add(ValidationIssue::warning(
                    IssueCode::BoxOutOfBounds,
                    format!(
                        "Box ({:.1}, {:.1}, {:.1}, {:.1}) extends outside image bounds (0, 0, {}, {})",
                        bbox.x(),
                        bbox.y(),
                        max.x,
                        max.y,
                        width,
                        height
                    ),
                    context,
                ));
            }
        }
    }
}

fn read_image_dimensions(path: &Path) -> Result<(u32, u32), String> {
    let size = imagesize::size(path)
        .map_err(|err| format!("Cannot read image header of '{}': {}", path.display(), err))?;

    let width: u32 = size
        .width
        .try_into()
        .map_err(|_| format!("image width {} does not fit in u32", size.width))?;
    let height: u32 = size
        .height
        .try_into()
        .map_err(|_| format!("image height {} does not fit in u32", size.height))?;

    Ok((width, height))
}
