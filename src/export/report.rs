//! Export report types.

use serde::Serialize;
use std::fmt;

/// Counts describing what an export wrote.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ExportReport {
    /// Images copied into `images/`.
    pub images: usize,
    /// Per-image regional label files written.
    pub regional_files: usize,
    /// Lines written to `labels/labels.txt`.
    pub text_only_lines: usize,
    /// Labels written across both formats.
    pub labels: usize,
    /// Regional images with no labels, which get no label file.
    pub unlabeled_images: usize,
    /// Size of the finished archive in bytes.
    pub archive_bytes: u64,
}

impl fmt::Display for ExportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "  {} images, {} labels ({} archive bytes)",
            self.images, self.labels, self.archive_bytes
        )?;
        writeln!(
            f,
            "  {} regional label files, {} labels.txt lines",
            self.regional_files, self.text_only_lines
        )?;
        if self.unlabeled_images > 0 {
            writeln!(f, "  {} images without labels", self.unlabeled_images)?;
        }
        Ok(())
    }
}
