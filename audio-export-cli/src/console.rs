use std::sync::atomic::{AtomicUsize, Ordering};

use audio_export_core::{ExportDelegate, ExportReport, ExportedFile, RecordFailure};

/// How often, in records, a progress line is printed.
const PROGRESS_INTERVAL: usize = 100;

/// ExportDelegate that prints progress to the terminal.
pub struct ConsoleDelegate {
    total: Option<usize>,
    seen: AtomicUsize,
}

impl ConsoleDelegate {
    pub fn new(total: Option<usize>) -> Self {
        Self {
            total,
            seen: AtomicUsize::new(0),
        }
    }

    fn tick(&self) {
        let seen = self.seen.fetch_add(1, Ordering::Relaxed) + 1;
        if seen % PROGRESS_INTERVAL == 0 {
            match self.total {
                Some(total) => println!("  {}/{} records", seen, total),
                None => println!("  {} records", seen),
            }
        }
    }
}

impl ExportDelegate for ConsoleDelegate {
    fn on_record_exported(&self, _position: usize, _file: &ExportedFile) {
        self.tick();
    }

    fn on_record_failed(&self, failure: &RecordFailure) {
        eprintln!("  skipped record {}: {}", failure.position, failure.error);
        self.tick();
    }

    fn on_export_finished(&self, report: &ExportReport) {
        println!(
            "{} records: {} exported, {} skipped, {} labels",
            report.total_seen,
            report.succeeded,
            report.failed,
            report.per_label_counts.len()
        );
        for (label, count) in &report.per_label_counts {
            println!("  {:<32} {}", label, count);
        }
    }
}
