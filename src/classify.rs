//! Per-image annotation style classification.
//!
//! Export needs to know, for each image independently, whether its labels
//! go into the shared `labels.txt` caption file or into a per-image
//! regional label file.

use crate::model::{Label, LabelKind};

/// Classifies the labels of a single image.
///
/// Returns [`LabelKind::TextOnly`] if any label lacks geometry, otherwise
/// [`LabelKind::Regional`]. An empty set is `Regional` by convention; it
/// simply exports nothing.
pub fn classify(labels: &[Label]) -> LabelKind {
    if labels.iter().any(Label::is_text_only) {
        LabelKind::TextOnly
    } else {
        LabelKind::Regional
    }
}
