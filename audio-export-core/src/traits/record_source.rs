use crate::models::error::ExportError;
use crate::models::record::Record;

/// Stream of records produced by a dataset source.
///
/// A per-record `Err` item (see `ExportError::is_per_record`) fails only
/// that record. Any other `Err` means the dataset could not be read further
/// and aborts the export.
pub type RecordStream<'a> = Box<dyn Iterator<Item = Result<Record, ExportError>> + 'a>;

/// Interface for dataset-access providers.
///
/// Implemented by:
/// - `InMemorySource` (records already in memory)
/// - `HubDataset` in `audio-export-hub` (parquet shards from the Hugging Face Hub)
pub trait RecordSource {
    /// Name of the dataset, used in logs and the manifest.
    fn name(&self) -> &str;

    /// Number of records, when known up front.
    fn len_hint(&self) -> Option<usize> {
        None
    }

    /// Iterate the records in dataset order. Each record is read once.
    fn records(&mut self) -> RecordStream<'_>;
}

/// A `RecordSource` over records held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    name: String,
    records: Vec<Record>,
}

impl InMemorySource {
    pub fn new(name: impl Into<String>, records: Vec<Record>) -> Self {
        Self {
            name: name.into(),
            records,
        }
    }
}

impl RecordSource for InMemorySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn len_hint(&self) -> Option<usize> {
        Some(self.records.len())
    }

    fn records(&mut self) -> RecordStream<'_> {
        Box::new(std::mem::take(&mut self.records).into_iter().map(Ok))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_source_yields_each_record_once() {
        let mut source = InMemorySource::new(
            "whales",
            vec![Record::decoded("Orca", vec![0.0], 8000), Record::decoded("Blue Whale", vec![0.0], 8000)],
        );
        assert_eq!(source.len_hint(), Some(2));

        let labels: Vec<String> = source.records().map(|r| r.unwrap().label).collect();
        assert_eq!(labels, vec!["Orca", "Blue Whale"]);
        assert_eq!(source.records().count(), 0);
    }
}
