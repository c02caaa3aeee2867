use std::fs;
use std::path::Path;
use std::sync::Arc;

use log::{debug, error, info, warn};

use crate::models::config::{ExportConfiguration, IndexPolicy};
use crate::models::counters::CounterTable;
use crate::models::error::ExportError;
use crate::models::record::Record;
use crate::models::report::{ExportReport, ExportedFile, RecordFailure};
use crate::processing::label::{check_folder_name, normalize_label, relative_output_path};
use crate::storage::manifest::{self, ExportManifest};
use crate::storage::wav_writer::write_wav_file;
use crate::traits::audio_decoder::AudioDecoder;
use crate::traits::export_delegate::ExportDelegate;
use crate::traits::record_source::RecordSource;

/// Writes labeled records as numbered WAV files, one folder per label.
///
/// Generic over the decode strategy via `AudioDecoder`. Records are handled
/// strictly in input order on the calling thread:
/// ```text
/// [Record] → decode → normalize label → ensure <root>/<label>/
///          → next index → write <label>_<n>.wav → report
/// ```
/// A record that fails at any step is logged, counted, and skipped.
pub struct Exporter<D: AudioDecoder> {
    decoder: D,
    config: ExportConfiguration,
    delegate: Option<Arc<dyn ExportDelegate>>,
}

impl<D: AudioDecoder> Exporter<D> {
    pub fn new(decoder: D, config: ExportConfiguration) -> Result<Self, ExportError> {
        config.validate().map_err(ExportError::ConfigurationFailed)?;
        Ok(Self {
            decoder,
            config,
            delegate: None,
        })
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn ExportDelegate>) {
        self.delegate = Some(delegate);
    }

    /// Export every record from `source`.
    pub fn export_source(&self, source: &mut dyn RecordSource) -> Result<ExportReport, ExportError> {
        info!(
            "exporting {} ({} records) into {}",
            source.name(),
            source
                .len_hint()
                .map(|n| n.to_string())
                .unwrap_or_else(|| "unknown number of".into()),
            self.config.output_root.display()
        );
        self.export(source.records())
    }

    /// Export a record sequence with a fresh counter table.
    pub fn export<I>(&self, records: I) -> Result<ExportReport, ExportError>
    where
        I: IntoIterator<Item = Result<Record, ExportError>>,
    {
        let (report, _) = self.export_with_counters(records, CounterTable::new())?;
        Ok(report)
    }

    /// Export a record sequence, numbering files on top of `counters`.
    ///
    /// Returns the report and the updated table. An `Err` item in `records`
    /// that is not a per-record error aborts the run; per-record errors are
    /// counted as failed records.
    pub fn export_with_counters<I>(
        &self,
        records: I,
        mut counters: CounterTable,
    ) -> Result<(ExportReport, CounterTable), ExportError>
    where
        I: IntoIterator<Item = Result<Record, ExportError>>,
    {
        prepare_output_root(&self.config.output_root)?;

        let mut report = ExportReport::default();
        let mut consecutive_failures = 0usize;

        for (position, item) in records.into_iter().enumerate() {
            let failure = match item {
                Ok(record) => match self.export_record(&record, &mut counters) {
                    Ok(file) => {
                        debug!("record {} → {}", position, file.relative_path.display());
                        consecutive_failures = 0;
                        if let Some(ref delegate) = self.delegate {
                            delegate.on_record_exported(position, &file);
                        }
                        report.record_exported(position, file);
                        continue;
                    }
                    Err(error) => RecordFailure {
                        position,
                        index_so_far: counters.current(&normalize_label(&record.label)),
                        label: record.label,
                        source_id: record.source_id,
                        error,
                    },
                },
                Err(error) if error.is_per_record() => RecordFailure {
                    position,
                    label: String::new(),
                    source_id: None,
                    index_so_far: 0,
                    error,
                },
                Err(error) => {
                    error!("dataset stream failed at record {}: {}", position, error);
                    return Err(error);
                }
            };

            warn!(
                "skipping record {} (label {:?}, source {}, {} files so far): {}",
                failure.position,
                failure.label,
                failure.source_id.as_deref().unwrap_or("-"),
                failure.index_so_far,
                failure.error
            );
            if let Some(ref delegate) = self.delegate {
                delegate.on_record_failed(&failure);
            }
            report.record_failed(failure);

            consecutive_failures += 1;
            if let Some(max) = self.config.max_consecutive_failures {
                if consecutive_failures >= max {
                    warn!("stopping export after {} consecutive failures", consecutive_failures);
                    report.aborted = true;
                    break;
                }
            }
        }

        if self.config.write_manifest {
            let manifest = ExportManifest::from_report(
                &report,
                self.config.source_name.clone(),
                self.decoder.name(),
                self.config.index_policy,
            );
            if let Err(e) = manifest::write_manifest(&manifest, &self.config.output_root) {
                error!("{}", e);
            }
        }

        info!(
            "export finished: {} records, {} written, {} failed{}",
            report.total_seen,
            report.succeeded,
            report.failed,
            if report.aborted { " (aborted)" } else { "" }
        );
        if let Some(ref delegate) = self.delegate {
            delegate.on_export_finished(&report);
        }

        Ok((report, counters))
    }

    fn export_record(&self, record: &Record, counters: &mut CounterTable) -> Result<ExportedFile, ExportError> {
        let audio = self.decoder.decode(record)?;

        let label = normalize_label(&record.label);
        check_folder_name(&label)?;
        ensure_directory(&self.config.output_root.join(&label))?;

        let index = counters.next_index(&label);
        if self.config.index_policy == IndexPolicy::ReserveBeforeWrite {
            counters.commit(&label, index);
        }

        let relative_path = relative_output_path(&label, index);
        let path = self.config.output_root.join(&relative_path);
        let written = write_wav_file(&path, &audio)?;

        if self.config.index_policy == IndexPolicy::CommitOnWrite {
            counters.commit(&label, index);
        }

        Ok(ExportedFile {
            label,
            index,
            path,
            relative_path,
            sample_rate: audio.sample_rate,
            channels: audio.channels,
            frames: audio.frames() as u64,
            checksum: written.checksum,
        })
    }
}

/// Create the output root, failing if it exists as something other than a directory.
fn prepare_output_root(root: &Path) -> Result<(), ExportError> {
    if root.exists() && !root.is_dir() {
        return Err(ExportError::InvalidOutputRoot(format!("{} is not a directory", root.display())));
    }
    fs::create_dir_all(root)
        .map_err(|e| ExportError::InvalidOutputRoot(format!("cannot create {}: {}", root.display(), e)))
}

/// Idempotent: an existing directory is fine.
fn ensure_directory(dir: &Path) -> Result<(), ExportError> {
    fs::create_dir_all(dir).map_err(|e| ExportError::DirectoryFailed(format!("cannot create {}: {}", dir.display(), e)))
}
