use crate::models::report::{ExportReport, ExportedFile, RecordFailure};

/// Progress notifications for an export run.
///
/// Called synchronously on the exporting thread, in record order.
pub trait ExportDelegate {
    /// Called after a record's file is written.
    fn on_record_exported(&self, position: usize, file: &ExportedFile);

    /// Called when a record is skipped.
    fn on_record_failed(&self, failure: &RecordFailure);

    /// Called once when the run ends, including runs stopped early.
    fn on_export_finished(&self, report: &ExportReport);
}
