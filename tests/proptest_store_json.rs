use ocrlabel::model::{NewLabel, ProjectId};
use ocrlabel::store::io_json::{from_json_str, to_json_string};
use ocrlabel::store::{ProjectSource, ProjectStore};
use proptest::prelude::*;

mod proptest_helpers;

#[derive(Clone, Debug)]
enum LabelPlan {
    Regional(ocrlabel::geometry::CanonicalBox, String),
    TextOnly(String),
}

fn arb_label_plan() -> impl Strategy<Value = LabelPlan> {
    prop_oneof![
        (proptest_helpers::arb_box(), proptest_helpers::arb_text())
            .prop_map(|(bbox, text)| LabelPlan::Regional(bbox, text)),
        proptest_helpers::arb_text().prop_map(LabelPlan::TextOnly),
    ]
}

/// Builds a store with one image per entry, applying the label plans in
/// order and ignoring the ones the store refuses.
fn build_store(images: &[Vec<LabelPlan>]) -> (ProjectStore, ProjectId) {
    let mut store = ProjectStore::new();
    let project = store.create_project("generated", None);
    for (idx, plans) in images.iter().enumerate() {
        let name = format!("img_{idx}.png");
        let image = store
            .register_image(project.id, name.clone(), format!("uploads/{name}"))
            .expect("register image");
        for plan in plans {
            let new_label = match plan {
                LabelPlan::Regional(bbox, text) => NewLabel::regional(image.id, text.clone(), *bbox),
                LabelPlan::TextOnly(text) => NewLabel::text_only(image.id, text.clone()),
            };
            let _ = store.create_label(new_label);
        }
    }
    (store, project.id)
}

proptest! {
    #![proptest_config(proptest_helpers::proptest_config())]

    #[test]
    fn store_json_roundtrip_is_lossless(
        images in prop::collection::vec(prop::collection::vec(arb_label_plan(), 0..5), 0..5)
    ) {
        let (store, project_id) = build_store(&images);
        let json = to_json_string(&store).expect("serialize store");
        let restored = from_json_str(&json).expect("parse store");

        let before = store.project_images(project_id).expect("images before");
        let after = restored.project_images(project_id).expect("images after");
        prop_assert_eq!(&before, &after);
        for image in &before {
            prop_assert_eq!(
                store.image_labels(image.id).expect("labels before"),
                restored.image_labels(image.id).expect("labels after")
            );
        }
        prop_assert_eq!(to_json_string(&restored).expect("serialize again"), json);
    }

    #[test]
    fn images_never_hold_mixed_label_kinds(
        images in prop::collection::vec(prop::collection::vec(arb_label_plan(), 0..8), 1..4)
    ) {
        let (store, project_id) = build_store(&images);
        for image in store.project_images(project_id).expect("images") {
            let labels = store.image_labels(image.id).expect("labels");
            let text_only = labels.iter().filter(|label| label.is_text_only()).count();
            prop_assert!(text_only == 0 || labels.len() == 1,
                "image {} holds {} labels, {} text-only", image.id, labels.len(), text_only);
        }
    }
}
