use std::collections::BTreeMap;
use std::path::PathBuf;

use super::error::ExportError;

/// A WAV file produced for one record.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedFile {
    /// Normalized label (folder name).
    pub label: String,
    pub index: u32,
    pub path: PathBuf,
    /// Path relative to the output root, e.g. `Orca/Orca_1.wav`.
    pub relative_path: PathBuf,
    pub sample_rate: u32,
    pub channels: u16,
    pub frames: u64,
    pub checksum: String,
}

impl ExportedFile {
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames as f64 / self.sample_rate as f64
    }
}

/// Why a record was skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordFailure {
    /// Zero-based position of the record in the input sequence.
    pub position: usize,
    /// Label as it appeared in the dataset.
    pub label: String,
    pub source_id: Option<String>,
    /// Files numbered for this label when the record failed.
    pub index_so_far: u32,
    pub error: ExportError,
}

/// Outcome of processing a single record.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordOutcome {
    Exported { position: usize, file: ExportedFile },
    Failed(RecordFailure),
}

/// Summary of an export run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportReport {
    pub total_seen: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Successfully written files per normalized label.
    pub per_label_counts: BTreeMap<String, u32>,
    pub outcomes: Vec<RecordOutcome>,
    /// True when the run stopped early on consecutive failures.
    pub aborted: bool,
}

impl ExportReport {
    pub fn record_exported(&mut self, position: usize, file: ExportedFile) {
        self.total_seen += 1;
        self.succeeded += 1;
        *self.per_label_counts.entry(file.label.clone()).or_insert(0) += 1;
        self.outcomes.push(RecordOutcome::Exported { position, file });
    }

    pub fn record_failed(&mut self, failure: RecordFailure) {
        self.total_seen += 1;
        self.failed += 1;
        self.outcomes.push(RecordOutcome::Failed(failure));
    }

    pub fn exported_files(&self) -> impl Iterator<Item = &ExportedFile> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            RecordOutcome::Exported { file, .. } => Some(file),
            RecordOutcome::Failed(_) => None,
        })
    }

    pub fn failures(&self) -> impl Iterator<Item = &RecordFailure> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            RecordOutcome::Failed(failure) => Some(failure),
            RecordOutcome::Exported { .. } => None,
        })
    }
}
