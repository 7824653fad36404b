//! Partial-success policy for a finished batch.

use super::BuildReport;

/// How a finished batch is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Every item made it into the archive.
    Complete,
    /// At least one entry was written and at least one item failed: the
    /// archive is returned with the `X-Errors` flag, without the list.
    Partial,
    /// Nothing was written: no archive bytes, the error list is the answer.
    NothingAdded,
}

impl Disposition {
    pub fn from_report(report: &BuildReport) -> Self {
        if !report.has_success() {
            Disposition::NothingAdded
        } else if report.errors.is_empty() {
            Disposition::Complete
        } else {
            Disposition::Partial
        }
    }
}
