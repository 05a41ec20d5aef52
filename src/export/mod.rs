//! PaddleOCR-style dataset export.
//!
//! [`export_project`] packs a project into a zip with this layout:
//!
//! ```text
//! images/<original-filename>
//! labels/labels.txt        # text-only images, one tab-separated line each
//! labels/<image-stem>.txt  # regional images, JSON list of entries
//! ```
//!
//! Each image is classified on its own (see [`classify`]). An image
//! contributes either one `labels.txt` line or one per-image file, never
//! both. Regional images without labels contribute nothing to `labels/`.
//!
//! All intermediate files live in private temporary directories that are
//! removed when they go out of scope, whether the export succeeds or not.

mod archive;
pub mod paddle;
mod report;

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::TempDir;

pub use archive::zip_dir;
pub use paddle::{read_regional_label_file, RegionalEntry};
pub use report::ExportReport;

use crate::classify::classify;
use crate::error::OcrLabelError;
use crate::model::{fits_text_line, Image, ImageId, LabelKind, ProjectId};
use crate::store::ProjectSource;

const IMAGES_DIR: &str = "images";
const LABELS_DIR: &str = "labels";
/// Shared label file of text-only images.
pub const TEXT_ONLY_FILE: &str = "labels.txt";

/// A finished export archive.
///
/// The archive lives in a private temporary directory that is deleted when
/// this value is dropped; use [`ExportArchive::persist`] to keep a copy.
#[derive(Debug)]
pub struct ExportArchive {
    project_id: ProjectId,
    path: PathBuf,
    report: ExportReport,
    _dir: TempDir,
}

impl ExportArchive {
    /// Location of the zip file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name to offer the archive under: `project_<id>_dataset.zip`.
    pub fn suggested_filename(&self) -> String {
        suggested_filename(self.project_id)
    }

    /// What the export wrote.
    pub fn report(&self) -> &ExportReport {
        &self.report
    }

    /// Copies the archive to `dest`. If `dest` is an existing directory the
    /// archive is placed inside it under its suggested file name.
    ///
    /// Returns the path written.
    pub fn persist(&self, dest: &Path) -> Result<PathBuf, OcrLabelError> {
        let target = if dest.is_dir() {
            dest.join(self.suggested_filename())
        } else {
            if let Some(parent) = dest.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent).map_err(OcrLabelError::Io)?;
                }
            }
            dest.to_path_buf()
        };
        fs::copy(&self.path, &target).map_err(OcrLabelError::Io)?;
        Ok(target)
    }
}

/// Suggested archive file name for a project.
pub fn suggested_filename(project_id: ProjectId) -> String {
    format!("project_{}_dataset.zip", project_id)
}

/// Exports a project's images and labels into a zip archive.
///
/// # Errors
/// - [`OcrLabelError::ProjectNotFound`] before any file is touched.
/// - [`OcrLabelError::SourceFileMissing`] if an image's file is gone.
/// - [`OcrLabelError::DuplicateImageName`] if two images share a basename.
/// - [`OcrLabelError::LabelFileConflict`] if two regional images share a
///   stem, and [`OcrLabelError::ReservedLabelFile`] for the stem `labels`.
/// - [`OcrLabelError::InvalidLabelText`] if a text-only label would break
///   its `labels.txt` line.
/// - [`OcrLabelError::Io`] / [`OcrLabelError::Archive`] for write failures.
pub fn export_project(
    source: &impl ProjectSource,
    project_id: ProjectId,
) -> Result<ExportArchive, OcrLabelError> {
    export_project_in(source, project_id, &std::env::temp_dir())
}

/// [`export_project`] with scratch directories created under `scratch`.
fn export_project_in(
    source: &impl ProjectSource,
    project_id: ProjectId,
    scratch: &Path,
) -> Result<ExportArchive, OcrLabelError> {
    let project = source.project(project_id)?;
    let images = source.project_images(project_id)?;

    let work = TempDir::with_prefix_in("ocrlabel-export-", scratch).map_err(OcrLabelError::Io)?;
    let images_dir = work.path().join(IMAGES_DIR);
    let labels_dir = work.path().join(LABELS_DIR);
    fs::create_dir_all(&images_dir).map_err(OcrLabelError::Io)?;
    fs::create_dir_all(&labels_dir).map_err(OcrLabelError::Io)?;

    let mut report = ExportReport::default();
    let mut seen: BTreeMap<String, ImageId> = BTreeMap::new();
    let mut label_files: BTreeMap<String, ImageId> = BTreeMap::new();
    let mut text_only: Option<BufWriter<File>> = None;

    for image in &images {
        let basename = image.basename();
        if let Some(first) = seen.insert(basename.clone(), image.id) {
            return Err(OcrLabelError::DuplicateImageName {
                name: basename,
                first,
                second: image.id,
            });
        }

        copy_image(image, &images_dir.join(&basename))?;
        report.images += 1;

        let labels = source.image_labels(image.id)?;
        match classify(&labels) {
            LabelKind::TextOnly => {
                if let Some(label) = labels.iter().find(|label| !fits_text_line(&label.text)) {
                    return Err(OcrLabelError::InvalidLabelText {
                        image_id: image.id,
                        text: label.text.clone(),
                    });
                }
                if text_only.is_none() {
                    let file =
                        File::create(labels_dir.join(TEXT_ONLY_FILE)).map_err(OcrLabelError::Io)?;
                    text_only = Some(BufWriter::new(file));
                }
                if let Some(writer) = text_only.as_mut() {
                    writer
                        .write_all(paddle::text_only_line(&basename, &labels).as_bytes())
                        .map_err(OcrLabelError::Io)?;
                }
                report.text_only_lines += 1;
                report.labels += labels.len();
            }
            LabelKind::Regional if labels.is_empty() => {
                report.unlabeled_images += 1;
            }
            LabelKind::Regional => {
                let name = regional_label_file(image);
                if name == TEXT_ONLY_FILE {
                    return Err(OcrLabelError::ReservedLabelFile {
                        name,
                        image_id: image.id,
                    });
                }
                if let Some(first) = label_files.insert(name.clone(), image.id) {
                    return Err(OcrLabelError::LabelFileConflict {
                        name,
                        first,
                        second: image.id,
                    });
                }
                let entries = paddle::regional_entries(&labels);
                paddle::write_regional_label_file(&labels_dir.join(&name), &entries)?;
                report.regional_files += 1;
                report.labels += entries.len();
            }
        }
    }

    if let Some(mut writer) = text_only.take() {
        writer.flush().map_err(OcrLabelError::Io)?;
    }

    let out = TempDir::with_prefix_in("ocrlabel-archive-", scratch).map_err(OcrLabelError::Io)?;
    let path = out.path().join(suggested_filename(project_id));
    archive::zip_dir(work.path(), &path)?;
    report.archive_bytes = archive::archive_size(&path)?;
    drop(work);

    tracing::info!(
        project = %project.id,
        name = %project.name,
        images = report.images,
        labels = report.labels,
        "exported project"
    );

    Ok(ExportArchive {
        project_id,
        path,
        report,
        _dir: out,
    })
}

/// Name of an image's per-image label file inside `labels/`.
///
/// `labels.txt` is reserved for text-only images, so a regional image with
/// the stem `labels` cannot be exported.
pub fn regional_label_file(image: &Image) -> String {
    format!("{}.txt", image.stem())
}

fn copy_image(image: &Image, dest: &Path) -> Result<(), OcrLabelError> {
    match fs::copy(&image.file_path, dest) {
        Ok(_) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Err(OcrLabelError::SourceFileMissing {
            image_id: image.id,
            path: image.file_path.clone(),
        }),
        Err(err) => Err(OcrLabelError::Io(err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::CanonicalBox;
    use crate::model::{Label, LabelGeometry, LabelId, NewLabel};
    use crate::store::ProjectStore;
    use std::io::Read;

    fn entry_names(archive: &ExportArchive) -> Vec<String> {
        let file = File::open(archive.path()).expect("open archive");
        let zip = zip::ZipArchive::new(file).expect("read archive");
        let mut names: Vec<String> = zip.file_names().map(str::to_string).collect();
        names.sort();
        names
    }

    fn read_entry(archive: &ExportArchive, name: &str) -> String {
        let file = File::open(archive.path()).expect("open archive");
        let mut zip = zip::ZipArchive::new(file).expect("read archive");
        let mut contents = String::new();
        zip.by_name(name)
            .expect("entry exists")
            .read_to_string(&mut contents)
            .expect("read entry");
        contents
    }

    fn store_with_file(dir: &Path, name: &str) -> (ProjectStore, ProjectId, ImageId) {
        let mut store = ProjectStore::new();
        let project = store.create_project("p", None);
        let path = dir.join(name);
        fs::write(&path, b"pixels").expect("write image");
        let image = store
            .register_image(project.id, name, path)
            .expect("register image");
        (store, project.id, image.id)
    }

    #[test]
    fn unknown_project_fails_before_io() {
        let store = ProjectStore::new();
        let err = export_project(&store, ProjectId(9)).unwrap_err();
        assert!(matches!(err, OcrLabelError::ProjectNotFound(ProjectId(9))));
    }

    #[test]
    fn mixed_project_writes_both_formats() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let (mut store, project_id, a) = store_with_file(temp.path(), "a.png");
        let b_path = temp.path().join("b.png");
        fs::write(&b_path, b"pixels").expect("write image");
        let b = store
            .register_image(project_id, "b.png", b_path)
            .expect("register image");

        store
            .create_label(NewLabel::regional(
                a,
                "Hi",
                CanonicalBox::new(0.0, 0.0, 10.0, 5.0).unwrap(),
            ))
            .unwrap();
        store
            .create_label(NewLabel::text_only(b.id, "Caption"))
            .unwrap();

        let archive = export_project(&store, project_id).expect("export");
        assert_eq!(archive.suggested_filename(), "project_1_dataset.zip");

        let names = entry_names(&archive);
        assert!(names.contains(&"images/a.png".to_string()));
        assert!(names.contains(&"images/b.png".to_string()));
        assert!(names.contains(&"labels/a.txt".to_string()));
        assert!(names.contains(&"labels/labels.txt".to_string()));
        assert!(!names.contains(&"labels/b.txt".to_string()));
        assert_eq!(read_entry(&archive, "labels/labels.txt"), "b.png\tCaption\n");

        let report = archive.report();
        assert_eq!(report.images, 2);
        assert_eq!(report.regional_files, 1);
        assert_eq!(report.text_only_lines, 1);
        assert_eq!(report.labels, 2);
    }

    #[test]
    fn unlabeled_regional_image_gets_no_label_file() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let (store, project_id, _) = store_with_file(temp.path(), "c.png");

        let archive = export_project(&store, project_id).expect("export");
        let names = entry_names(&archive);
        assert!(names.contains(&"images/c.png".to_string()));
        assert!(!names.iter().any(|name| name.starts_with("labels/") && name != "labels/"));
        assert_eq!(archive.report().unlabeled_images, 1);
    }

    #[test]
    fn missing_source_file_fails() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let (mut store, project_id, _) = store_with_file(temp.path(), "a.png");
        let ghost = store
            .register_image(project_id, "ghost.png", temp.path().join("ghost.png"))
            .expect("register image");

        let err = export_project(&store, project_id).unwrap_err();
        match err {
            OcrLabelError::SourceFileMissing { image_id, .. } => assert_eq!(image_id, ghost.id),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn duplicate_basenames_fail() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let (mut store, project_id, first) = store_with_file(temp.path(), "a.png");
        let nested = temp.path().join("nested");
        fs::create_dir_all(&nested).expect("create nested dir");
        fs::write(nested.join("a.png"), b"other").expect("write image");
        let second = store
            .register_image(project_id, "nested/a.png", nested.join("a.png"))
            .expect("register image");

        let err = export_project(&store, project_id).unwrap_err();
        match err {
            OcrLabelError::DuplicateImageName {
                name,
                first: f,
                second: s,
            } => {
                assert_eq!(name, "a.png");
                assert_eq!(f, first);
                assert_eq!(s, second.id);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    fn add_regional(store: &mut ProjectStore, dir: &Path, project_id: ProjectId, name: &str) {
        let path = dir.join(name);
        fs::write(&path, b"pixels").expect("write image");
        let image = store
            .register_image(project_id, name, path)
            .expect("register image");
        store
            .create_label(NewLabel::regional(
                image.id,
                format!("text-{name}"),
                CanonicalBox::new(0.0, 0.0, 4.0, 4.0).unwrap(),
            ))
            .expect("create label");
    }

    #[test]
    fn regional_images_sharing_a_stem_fail() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let mut store = ProjectStore::new();
        let project = store.create_project("p", None);
        add_regional(&mut store, temp.path(), project.id, "a.png");
        add_regional(&mut store, temp.path(), project.id, "a.jpg");

        let err = export_project(&store, project.id).unwrap_err();
        match err {
            OcrLabelError::LabelFileConflict {
                name,
                first,
                second,
            } => {
                assert_eq!(name, "a.txt");
                assert_eq!((first, second), (ImageId(1), ImageId(2)));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn shared_stem_is_fine_when_one_image_is_text_only() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let (mut store, project_id, a) = store_with_file(temp.path(), "a.png");
        store
            .create_label(NewLabel::text_only(a, "Caption"))
            .expect("create label");
        add_regional(&mut store, temp.path(), project_id, "a.jpg");

        let archive = export_project(&store, project_id).expect("export");
        assert_eq!(read_entry(&archive, "labels/labels.txt"), "a.png\tCaption\n");
        assert!(read_entry(&archive, "labels/a.txt").contains("text-a.jpg"));
    }

    #[test]
    fn regional_image_named_labels_fails() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let (mut store, project_id, b) = store_with_file(temp.path(), "b.png");
        store
            .create_label(NewLabel::text_only(b, "Caption"))
            .expect("create label");
        add_regional(&mut store, temp.path(), project_id, "labels.png");

        let err = export_project(&store, project_id).unwrap_err();
        assert!(
            matches!(err, OcrLabelError::ReservedLabelFile { ref name, .. } if name == "labels.txt"),
            "{err}"
        );
    }

    /// Hands out labels verbatim, bypassing the store's text checks.
    struct RawSource {
        store: ProjectStore,
        labels: Vec<Label>,
    }

    impl ProjectSource for RawSource {
        fn project(&self, id: ProjectId) -> Result<crate::model::Project, OcrLabelError> {
            self.store.project(id)
        }

        fn project_images(&self, id: ProjectId) -> Result<Vec<Image>, OcrLabelError> {
            self.store.project_images(id)
        }

        fn image_labels(&self, id: ImageId) -> Result<Vec<Label>, OcrLabelError> {
            Ok(self
                .labels
                .iter()
                .filter(|label| label.image_id == id)
                .cloned()
                .collect())
        }
    }

    #[test]
    fn text_only_label_with_line_break_fails() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let (store, project_id, b) = store_with_file(temp.path(), "b.png");
        let source = RawSource {
            store,
            labels: vec![Label {
                id: LabelId(1),
                image_id: b,
                text: "line1\nc.png\tfake".into(),
                geometry: LabelGeometry::TextOnly,
            }],
        };

        let err = export_project(&source, project_id).unwrap_err();
        assert!(matches!(err, OcrLabelError::InvalidLabelText { image_id, .. } if image_id == b));
    }

    fn scratch_entries(scratch: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(scratch)
            .expect("read scratch dir")
            .map(|entry| entry.expect("dir entry").file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn working_dir_is_removed_on_success_and_failure() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let scratch = temp.path().join("scratch");
        fs::create_dir_all(&scratch).expect("create scratch dir");
        let (mut store, project_id, _) = store_with_file(temp.path(), "a.png");

        let archive = export_project_in(&store, project_id, &scratch).expect("export");
        let left = scratch_entries(&scratch);
        assert_eq!(left.len(), 1, "{left:?}");
        assert!(left[0].starts_with("ocrlabel-archive-"));
        drop(archive);
        assert!(scratch_entries(&scratch).is_empty());

        store
            .register_image(project_id, "ghost.png", temp.path().join("ghost.png"))
            .expect("register image");
        export_project_in(&store, project_id, &scratch).unwrap_err();
        assert!(scratch_entries(&scratch).is_empty());
    }

    #[test]
    fn dropping_archive_removes_it_and_persist_keeps_a_copy() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let (store, project_id, _) = store_with_file(temp.path(), "a.png");

        let archive = export_project(&store, project_id).expect("export");
        let path = archive.path().to_path_buf();
        let kept = archive.persist(temp.path()).expect("persist");
        assert_eq!(kept, temp.path().join("project_1_dataset.zip"));
        assert!(path.exists());

        drop(archive);
        assert!(!path.exists());
        assert!(kept.exists());
    }
}
