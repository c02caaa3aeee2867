//! Parquet shard reading: record batches to `Record`s.

use std::collections::{HashMap, VecDeque};
use std::fs::File;
use std::path::{Path, PathBuf};

use arrow::array::{Array, ArrayRef, AsArray, StructArray};
use arrow::datatypes::{
    DataType, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type, Int8Type, UInt16Type, UInt32Type,
    UInt64Type, UInt8Type,
};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::{ParquetRecordBatchReader, ParquetRecordBatchReaderBuilder};

use audio_export_core::{AudioPayload, DecodedAudio, ExportError, Record};

use crate::error::HubError;

/// Rows per record batch. Audio rows are large, so keep batches small.
const BATCH_SIZE: usize = 64;

/// Schema metadata key the `datasets` library stores its feature info under.
const HF_METADATA_KEY: &str = "huggingface";

/// Names of the columns records are built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Columns {
    pub audio: String,
    pub label: String,
}

/// Class names of a `ClassLabel` feature, from the schema's `huggingface` metadata.
///
/// Returns an empty list when the column is not a `ClassLabel` or the
/// metadata is absent or malformed.
pub fn class_label_names(metadata: &HashMap<String, String>, column: &str) -> Vec<String> {
    let Some(raw) = metadata.get(HF_METADATA_KEY) else {
        return Vec::new();
    };
    let Ok(info) = serde_json::from_str::<serde_json::Value>(raw) else {
        log::debug!("ignoring malformed {} schema metadata", HF_METADATA_KEY);
        return Vec::new();
    };
    info["info"]["features"][column]["names"]
        .as_array()
        .map(|names| {
            names
                .iter()
                .filter_map(|n| n.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

/// Total rows across `shards`, from parquet footers only.
pub fn count_rows(shards: &[PathBuf]) -> Result<usize, HubError> {
    let mut total = 0usize;
    for path in shards {
        let builder = ParquetRecordBatchReaderBuilder::try_new(File::open(path)?)?;
        total += builder.metadata().file_metadata().num_rows().max(0) as usize;
    }
    Ok(total)
}

struct OpenShard {
    name: String,
    reader: ParquetRecordBatchReader,
    class_names: Vec<String>,
    rows_read: usize,
}

impl OpenShard {
    fn open(path: &Path, columns: &Columns) -> Result<Self, HubError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let builder = ParquetRecordBatchReaderBuilder::try_new(File::open(path)?)?;
        let schema = builder.schema().clone();

        for column in [&columns.audio, &columns.label] {
            if schema.index_of(column).is_err() {
                return Err(HubError::MissingColumn {
                    column: column.clone(),
                    shard: name,
                });
            }
        }
        let audio_type = schema.field_with_name(&columns.audio)?.data_type().clone();
        check_audio_type(&columns.audio, &audio_type)?;
        let label_type = schema.field_with_name(&columns.label)?.data_type().clone();
        check_label_type(&columns.label, &label_type)?;

        let class_names = class_label_names(schema.metadata(), &columns.label);
        let reader = builder.with_batch_size(BATCH_SIZE).build()?;
        log::debug!("reading shard {} ({} class names)", name, class_names.len());

        Ok(Self {
            name,
            reader,
            class_names,
            rows_read: 0,
        })
    }

    fn records_from_batch(
        &mut self,
        batch: &RecordBatch,
        columns: &Columns,
    ) -> Vec<Result<Record, ExportError>> {
        let audio = batch.column_by_name(&columns.audio);
        let label = batch.column_by_name(&columns.label);
        let (Some(audio), Some(label)) = (audio, label) else {
            return vec![Err(ExportError::DatasetUnavailable(format!(
                "record batch in {} lacks the audio or label column",
                self.name
            )))];
        };

        let mut records = Vec::with_capacity(batch.num_rows());
        for row in 0..batch.num_rows() {
            let source_id = format!("{}#{}", self.name, self.rows_read + row);
            records.push(self.record_at(audio, label, row, source_id));
        }
        self.rows_read += batch.num_rows();
        records
    }

    fn record_at(
        &self,
        audio: &ArrayRef,
        label: &ArrayRef,
        row: usize,
        source_id: String,
    ) -> Result<Record, ExportError> {
        let label = label_at(label, row, &self.class_names)
            .ok_or_else(|| ExportError::InvalidLabel(format!("{} has no label", source_id)))?;
        let payload = audio_at(audio, row)
            .map_err(|reason| ExportError::DecodeFailed(format!("{}: {}", source_id, reason)))?;
        Ok(Record {
            label,
            payload,
            source_id: Some(source_id),
        })
    }
}

fn check_audio_type(column: &str, data_type: &DataType) -> Result<(), HubError> {
    let unsupported = || HubError::UnsupportedColumn {
        column: column.to_string(),
        data_type: format!("{:?}", data_type),
    };
    let DataType::Struct(fields) = data_type else {
        return Err(unsupported());
    };
    let has = |name: &str| fields.iter().any(|f| f.name() == name);
    if has("bytes") || has("path") || (has("array") && has("sampling_rate")) {
        Ok(())
    } else {
        Err(unsupported())
    }
}

fn check_label_type(column: &str, data_type: &DataType) -> Result<(), HubError> {
    if matches!(data_type, DataType::Utf8 | DataType::LargeUtf8) || data_type.is_integer() {
        Ok(())
    } else {
        Err(HubError::UnsupportedColumn {
            column: column.to_string(),
            data_type: format!("{:?}", data_type),
        })
    }
}

fn string_at(col: &ArrayRef, row: usize) -> Option<&str> {
    if col.is_null(row) {
        return None;
    }
    if let Some(a) = col.as_string_opt::<i32>() {
        Some(a.value(row))
    } else {
        col.as_string_opt::<i64>().map(|a| a.value(row))
    }
}

fn binary_at(col: &ArrayRef, row: usize) -> Option<&[u8]> {
    if col.is_null(row) {
        return None;
    }
    if let Some(a) = col.as_binary_opt::<i32>() {
        Some(a.value(row))
    } else {
        col.as_binary_opt::<i64>().map(|a| a.value(row))
    }
}

fn integer_at(col: &ArrayRef, row: usize) -> Option<i64> {
    if col.is_null(row) {
        return None;
    }
    macro_rules! try_int {
        ($($ty:ty),*) => {
            $(
                if let Some(a) = col.as_primitive_opt::<$ty>() {
                    return i64::try_from(a.value(row)).ok();
                }
            )*
        };
    }
    try_int!(Int64Type, Int32Type, Int16Type, Int8Type, UInt64Type, UInt32Type, UInt16Type, UInt8Type);
    None
}

fn floats_at(col: &ArrayRef, row: usize) -> Option<Vec<f32>> {
    if col.is_null(row) {
        return None;
    }
    let values = if let Some(list) = col.as_list_opt::<i32>() {
        list.value(row)
    } else {
        col.as_list_opt::<i64>()?.value(row)
    };
    if let Some(a) = values.as_primitive_opt::<Float32Type>() {
        Some(a.iter().map(|v| v.unwrap_or(0.0)).collect())
    } else {
        values
            .as_primitive_opt::<Float64Type>()
            .map(|a| a.iter().map(|v| v.unwrap_or(0.0) as f32).collect())
    }
}

/// Label text; integer class ids resolve through `class_names`.
fn label_at(col: &ArrayRef, row: usize, class_names: &[String]) -> Option<String> {
    if let Some(text) = string_at(col, row) {
        return Some(text.to_string());
    }
    let id = integer_at(col, row)?;
    let name = usize::try_from(id).ok().and_then(|i| class_names.get(i));
    Some(name.cloned().unwrap_or_else(|| id.to_string()))
}

/// Audio payload of one row of a `datasets` Audio struct column.
fn audio_at(col: &ArrayRef, row: usize) -> Result<AudioPayload, String> {
    if col.is_null(row) {
        return Err("audio cell is null".into());
    }
    let audio: &StructArray = col.as_struct_opt().ok_or("audio column is not a struct")?;

    if let (Some(array), Some(rate)) = (audio.column_by_name("array"), audio.column_by_name("sampling_rate")) {
        if let (Some(samples), Some(rate)) = (floats_at(array, row), integer_at(rate, row)) {
            let sample_rate = u32::try_from(rate).map_err(|_| format!("invalid sampling rate {}", rate))?;
            return Ok(AudioPayload::Decoded(DecodedAudio::mono(samples, sample_rate)));
        }
    }

    let path = audio.column_by_name("path").and_then(|c| string_at(c, row));
    if let Some(bytes) = audio.column_by_name("bytes").and_then(|c| binary_at(c, row)) {
        if !bytes.is_empty() {
            return Ok(AudioPayload::Encoded {
                bytes: bytes.to_vec(),
                hint: path.map(str::to_string),
            });
        }
    }
    match path {
        Some(path) if Path::new(path).is_file() => Ok(AudioPayload::File(PathBuf::from(path))),
        Some(path) => Err(format!("no audio bytes and {} is not a local file", path)),
        None => Err("no audio bytes or path".into()),
    }
}

/// Lazy iterator over the records of a list of parquet shards, in order.
///
/// Shard-level failures (unreadable file, wrong schema) end the stream with a
/// `DatasetUnavailable` error. Row-level problems are yielded as per-record
/// errors and the stream continues.
pub struct ShardRecords {
    shards: VecDeque<PathBuf>,
    columns: Columns,
    current: Option<OpenShard>,
    pending: VecDeque<Result<Record, ExportError>>,
    finished: bool,
}

impl ShardRecords {
    pub fn new(shards: Vec<PathBuf>, columns: Columns) -> Self {
        Self {
            shards: shards.into(),
            columns,
            current: None,
            pending: VecDeque::new(),
            finished: false,
        }
    }

    /// Queue the next batch of records. Returns false when all shards are read.
    fn fill(&mut self) -> Result<bool, HubError> {
        loop {
            if self.current.is_none() {
                match self.shards.pop_front() {
                    Some(path) => self.current = Some(OpenShard::open(&path, &self.columns)?),
                    None => return Ok(false),
                }
            }
            let Some(shard) = self.current.as_mut() else {
                return Ok(false);
            };
            match shard.reader.next() {
                Some(batch) => {
                    let batch = batch?;
                    let records = shard.records_from_batch(&batch, &self.columns);
                    self.pending.extend(records);
                    return Ok(true);
                }
                None => self.current = None,
            }
        }
    }
}

impl Iterator for ShardRecords {
    type Item = Result<Record, ExportError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.pending.pop_front() {
                return Some(item);
            }
            if self.finished {
                return None;
            }
            match self.fill() {
                Ok(true) => continue,
                Ok(false) => {
                    self.finished = true;
                    return None;
                }
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e.into()));
                }
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::fs;
    use std::sync::Arc;

    use arrow::array::{BinaryArray, Int64Array, ListArray, StringArray};
    use arrow::datatypes::{Field, Schema};
    use parquet::arrow::ArrowWriter;

    use audio_export_core::processing::wav_format;

    pub(crate) fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("audio_export_hub_{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    pub(crate) fn columns() -> Columns {
        Columns {
            audio: "audio".into(),
            label: "species".into(),
        }
    }

    pub(crate) fn write_batch(path: &Path, batch: &RecordBatch) {
        let file = File::create(path).unwrap();
        let mut writer = ArrowWriter::try_new(file, batch.schema(), None).unwrap();
        writer.write(batch).unwrap();
        writer.close().unwrap();
    }

    /// `audio: {bytes, path}`, `species: Utf8` shard, as `datasets.push_to_hub` writes it.
    pub(crate) fn encoded_batch(rows: &[(Option<&[u8]>, Option<&str>, Option<&str>)]) -> RecordBatch {
        let bytes: BinaryArray = rows.iter().map(|r| r.0).collect::<Vec<_>>().into();
        let paths = StringArray::from(rows.iter().map(|r| r.1).collect::<Vec<_>>());
        let species = StringArray::from(rows.iter().map(|r| r.2).collect::<Vec<_>>());

        let audio = StructArray::from(vec![
            (Arc::new(Field::new("bytes", DataType::Binary, true)), Arc::new(bytes) as ArrayRef),
            (Arc::new(Field::new("path", DataType::Utf8, true)), Arc::new(paths) as ArrayRef),
        ]);
        let schema = Schema::new(vec![
            Field::new("audio", audio.data_type().clone(), true),
            Field::new("species", DataType::Utf8, true),
        ]);
        RecordBatch::try_new(Arc::new(schema), vec![Arc::new(audio), Arc::new(species)]).unwrap()
    }

    pub(crate) fn wav_bytes(len: usize, sample_rate: u32) -> Vec<u8> {
        let samples: Vec<f32> = (0..len).map(|i| ((i % 50) as f32 / 50.0) - 0.5).collect();
        wav_format::encode_pcm16_wav(&samples, sample_rate, 1).unwrap()
    }

    fn read_all(shards: Vec<PathBuf>) -> Vec<Result<Record, ExportError>> {
        ShardRecords::new(shards, columns()).collect()
    }

    #[test]
    fn reads_encoded_rows_across_shards() {
        let dir = temp_dir();
        let wav = wav_bytes(160, 16000);
        let first = dir.join("train-00000-of-00002.parquet");
        let second = dir.join("train-00001-of-00002.parquet");
        write_batch(
            &first,
            &encoded_batch(&[
                (Some(wav.as_slice()), Some("blue_1.wav"), Some("Blue Whale")),
                (Some(wav.as_slice()), Some("orca_1.wav"), Some("Orca")),
            ]),
        );
        write_batch(&second, &encoded_batch(&[(Some(wav.as_slice()), Some("blue_2.wav"), Some("Blue Whale"))]));

        assert_eq!(count_rows(&[first.clone(), second.clone()]).unwrap(), 3);

        let records: Vec<Record> = read_all(vec![first, second]).into_iter().map(|r| r.unwrap()).collect();
        let labels: Vec<&str> = records.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["Blue Whale", "Orca", "Blue Whale"]);
        assert_eq!(records[1].source_id.as_deref(), Some("train-00000-of-00002.parquet#1"));
        assert_eq!(records[2].source_id.as_deref(), Some("train-00001-of-00002.parquet#0"));
        assert_eq!(
            records[0].payload,
            AudioPayload::Encoded {
                bytes: wav.clone(),
                hint: Some("blue_1.wav".into())
            }
        );

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn bad_rows_become_per_record_errors() {
        let dir = temp_dir();
        let wav = wav_bytes(16, 8000);
        let local = dir.join("local.wav");
        fs::write(&local, &wav).unwrap();
        let shard = dir.join("train.parquet");
        write_batch(
            &shard,
            &encoded_batch(&[
                (None, Some("/definitely/not/here.wav"), Some("Orca")),
                (Some(wav.as_slice()), None, None),
                (None, local.to_str(), Some("Walrus")),
            ]),
        );

        let items = read_all(vec![shard]);
        assert_eq!(items.len(), 3);
        assert!(matches!(items[0], Err(ExportError::DecodeFailed(_))));
        assert!(matches!(items[1], Err(ExportError::InvalidLabel(_))));
        let walrus = items[2].as_ref().unwrap();
        assert_eq!(walrus.payload, AudioPayload::File(local.clone()));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn class_label_ids_resolve_to_names() {
        let dir = temp_dir();
        let wav = wav_bytes(16, 8000);
        let bytes: BinaryArray = vec![Some(wav.as_slice()); 3].into();
        let audio = StructArray::from(vec![(
            Arc::new(Field::new("bytes", DataType::Binary, true)),
            Arc::new(bytes) as ArrayRef,
        )]);
        let species = Int64Array::from(vec![1, 0, 7]);
        let metadata = HashMap::from([(
            HF_METADATA_KEY.to_string(),
            r#"{"info": {"features": {"species": {"names": ["Blue Whale", "Orca"], "_type": "ClassLabel"}}}}"#
                .to_string(),
        )]);
        let schema = Schema::new_with_metadata(
            vec![
                Field::new("audio", audio.data_type().clone(), true),
                Field::new("species", DataType::Int64, false),
            ],
            metadata,
        );
        let batch = RecordBatch::try_new(Arc::new(schema), vec![Arc::new(audio), Arc::new(species)]).unwrap();
        let shard = dir.join("train.parquet");
        write_batch(&shard, &batch);

        let labels: Vec<String> = read_all(vec![shard]).into_iter().map(|r| r.unwrap().label).collect();
        assert_eq!(labels, vec!["Orca", "Blue Whale", "7"]);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn decoded_array_rows_are_passed_through() {
        let dir = temp_dir();
        let array = ListArray::from_iter_primitive::<Float32Type, _, _>(vec![Some(vec![Some(0.25f32), Some(-0.25)])]);
        let rates = Int64Array::from(vec![22050]);
        let audio = StructArray::from(vec![
            (Arc::new(Field::new("array", array.data_type().clone(), true)), Arc::new(array) as ArrayRef),
            (Arc::new(Field::new("sampling_rate", DataType::Int64, true)), Arc::new(rates) as ArrayRef),
        ]);
        let species = StringArray::from(vec!["Orca"]);
        let schema = Schema::new(vec![
            Field::new("audio", audio.data_type().clone(), true),
            Field::new("species", DataType::Utf8, false),
        ]);
        let batch = RecordBatch::try_new(Arc::new(schema), vec![Arc::new(audio), Arc::new(species)]).unwrap();
        let shard = dir.join("train.parquet");
        write_batch(&shard, &batch);

        let record = read_all(vec![shard]).remove(0).unwrap();
        assert_eq!(record.payload, AudioPayload::Decoded(DecodedAudio::mono(vec![0.25, -0.25], 22050)));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_column_ends_stream_with_dataset_error() {
        let dir = temp_dir();
        let shard = dir.join("train.parquet");
        write_batch(&shard, &encoded_batch(&[(Some(&b"x"[..]), None, Some("Orca"))]));

        let items: Vec<_> = ShardRecords::new(
            vec![shard],
            Columns {
                audio: "audio".into(),
                label: "label".into(),
            },
        )
        .collect();
        assert_eq!(items.len(), 1);
        assert!(matches!(items[0], Err(ExportError::DatasetUnavailable(_))));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn class_names_need_valid_metadata() {
        let metadata = HashMap::from([(HF_METADATA_KEY.to_string(), "{not json".to_string())]);
        assert!(class_label_names(&metadata, "species").is_empty());
        assert!(class_label_names(&HashMap::new(), "species").is_empty());
    }
}
