//! End-to-end export tests: store -> zip -> read back.

use std::fs;
use std::path::Path;

use ocrlabel::export::{export_project, RegionalEntry};
use ocrlabel::geometry::CanonicalBox;
use ocrlabel::model::{ImageId, NewLabel, ProjectId};
use ocrlabel::store::ProjectStore;
use ocrlabel::OcrLabelError;

mod common;

fn project_with_uploads(dir: &Path, names: &[&str]) -> (ProjectStore, ProjectId, Vec<ImageId>) {
    let mut store = ProjectStore::new();
    let project = store.create_project("dataset", None);
    let uploads = dir.join("uploads");
    let mut ids = Vec::new();
    for name in names {
        let source = dir.join("incoming").join(name);
        common::write_bmp(&source, 16, 8);
        let image = store
            .add_image(project.id, &source, &uploads)
            .expect("add image");
        ids.push(image.id);
    }
    (store, project.id, ids)
}

fn bbox(x: f64, y: f64, w: f64, h: f64) -> CanonicalBox {
    CanonicalBox::new(x, y, w, h).expect("valid box")
}

#[test]
fn regional_image_exports_polygon_entries() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let (mut store, project_id, ids) = project_with_uploads(temp.path(), &["a.png"]);
    store
        .create_label(NewLabel::regional(ids[0], "Hi", bbox(0.0, 0.0, 10.0, 5.0)))
        .expect("create label");

    let archive = export_project(&store, project_id).expect("export");
    assert_eq!(
        common::zip_file_names(archive.path()),
        vec!["images/a.png", "labels/a.txt"]
    );

    let label_file = common::read_zip_text(archive.path(), "labels/a.txt");
    let value: serde_json::Value = serde_json::from_str(&label_file).expect("parse label file");
    assert_eq!(
        value,
        serde_json::json!([{
            "transcription": "Hi",
            "points": [[0, 0], [10, 0], [10, 5], [0, 5]],
            "difficult": false,
            "direction": 0
        }])
    );
    assert!(label_file.contains("[[0,0],[10,0],[10,5],[0,5]]"));
}

#[test]
fn text_only_image_exports_a_caption_line() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let (mut store, project_id, ids) = project_with_uploads(temp.path(), &["b.png"]);
    store
        .create_label(NewLabel::text_only(ids[0], "Caption"))
        .expect("create label");

    let archive = export_project(&store, project_id).expect("export");
    assert_eq!(
        common::zip_file_names(archive.path()),
        vec!["images/b.png", "labels/labels.txt"]
    );
    assert_eq!(
        common::read_zip_text(archive.path(), "labels/labels.txt"),
        "b.png\tCaption\n"
    );
}

#[test]
fn caption_lines_follow_image_order_in_one_file() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let (mut store, project_id, ids) =
        project_with_uploads(temp.path(), &["z.png", "m.png", "a.png"]);
    store
        .create_label(NewLabel::text_only(ids[0], "last letter"))
        .expect("create label");
    store
        .create_label(NewLabel::regional(ids[1], "box", bbox(1.0, 1.0, 2.0, 2.0)))
        .expect("create label");
    store
        .create_label(NewLabel::text_only(ids[2], "first letter"))
        .expect("create label");

    let archive = export_project(&store, project_id).expect("export");
    assert_eq!(
        common::read_zip_text(archive.path(), "labels/labels.txt"),
        "z.png\tlast letter\na.png\tfirst letter\n"
    );
    let names = common::zip_file_names(archive.path());
    assert!(names.contains(&"labels/m.txt".to_string()));
    assert!(!names.contains(&"labels/z.txt".to_string()));
    assert!(!names.contains(&"labels/a.txt".to_string()));
}

#[test]
fn image_bytes_are_copied_verbatim() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let (store, project_id, ids) = project_with_uploads(temp.path(), &["a.bmp"]);

    let archive = export_project(&store, project_id).expect("export");
    let stored = fs::read(&store.image(ids[0]).expect("image").file_path).expect("read upload");
    assert_eq!(common::read_zip_entry(archive.path(), "images/a.bmp"), stored);
}

#[test]
fn regional_boxes_roundtrip_through_the_archive() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let (mut store, project_id, ids) = project_with_uploads(temp.path(), &["scan.jpg"]);
    let boxes = [
        bbox(0.0, 0.0, 10.0, 5.0),
        bbox(12.5, 3.25, 40.0, 7.75),
        bbox(100.0, 200.0, 1.0, 1.0),
    ];
    for (idx, b) in boxes.iter().enumerate() {
        store
            .create_label(NewLabel::regional(ids[0], format!("line {idx}"), *b))
            .expect("create label");
    }

    let archive = export_project(&store, project_id).expect("export");
    let extracted = temp.path().join("scan.txt");
    fs::write(
        &extracted,
        common::read_zip_entry(archive.path(), "labels/scan.txt"),
    )
    .expect("extract label file");

    let entries = ocrlabel::export::read_regional_label_file(&extracted).expect("read entries");
    let restored: Vec<CanonicalBox> = entries
        .iter()
        .map(RegionalEntry::to_box)
        .collect::<Result<_, _>>()
        .expect("restore boxes");
    assert_eq!(restored, boxes);
    assert_eq!(entries[1].transcription, "line 1");
}

#[test]
fn export_is_deterministic() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let (mut store, project_id, ids) = project_with_uploads(temp.path(), &["a.png", "b.png"]);
    store
        .create_label(NewLabel::regional(ids[0], "Hi", bbox(0.0, 0.0, 10.0, 5.0)))
        .expect("create label");
    store
        .create_label(NewLabel::text_only(ids[1], "Caption"))
        .expect("create label");

    let first = export_project(&store, project_id).expect("first export");
    let second = export_project(&store, project_id).expect("second export");
    assert_eq!(
        fs::read(first.path()).expect("read first"),
        fs::read(second.path()).expect("read second")
    );
}

#[test]
fn missing_upload_fails_export() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let (store, project_id, ids) = project_with_uploads(temp.path(), &["a.png"]);
    fs::remove_file(&store.image(ids[0]).expect("image").file_path).expect("delete upload");

    let err = export_project(&store, project_id).unwrap_err();
    assert!(matches!(err, OcrLabelError::SourceFileMissing { .. }));
}

#[test]
fn unknown_project_is_not_found() {
    let store = ProjectStore::new();
    let err = export_project(&store, ProjectId::new(3)).unwrap_err();
    assert!(matches!(err, OcrLabelError::ProjectNotFound(_)));
}

#[test]
fn label_file_clashes_fail_instead_of_overwriting() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let (mut store, project_id, ids) = project_with_uploads(temp.path(), &["a.png", "a.jpg"]);
    for id in &ids {
        store
            .create_label(NewLabel::regional(*id, format!("text-{id}"), bbox(0.0, 0.0, 4.0, 4.0)))
            .expect("create label");
    }
    let err = export_project(&store, project_id).unwrap_err();
    assert!(matches!(err, OcrLabelError::LabelFileConflict { .. }), "{err}");

    let temp = tempfile::tempdir().expect("create temp dir");
    let (mut store, project_id, ids) = project_with_uploads(temp.path(), &["labels.png", "b.png"]);
    store
        .create_label(NewLabel::regional(ids[0], "REGIONAL", bbox(0.0, 0.0, 4.0, 4.0)))
        .expect("create label");
    store
        .create_label(NewLabel::text_only(ids[1], "Caption"))
        .expect("create label");
    let err = export_project(&store, project_id).unwrap_err();
    assert!(matches!(err, OcrLabelError::ReservedLabelFile { .. }), "{err}");
}
