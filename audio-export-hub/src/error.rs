use audio_export_core::ExportError;
use thiserror::Error;

/// Errors raised while locating or reading a Hub dataset.
#[derive(Debug, Error)]
pub enum HubError {
    #[error("hub request failed: {0}")]
    Api(#[from] hf_hub::api::sync::ApiError),

    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no parquet shards for split {split:?} in {dataset}")]
    NoShards { dataset: String, split: String },

    #[error("column {column:?} not found in {shard}")]
    MissingColumn { column: String, shard: String },

    #[error("unsupported type for column {column:?}: {data_type}")]
    UnsupportedColumn { column: String, data_type: String },
}

impl From<HubError> for ExportError {
    fn from(err: HubError) -> Self {
        ExportError::DatasetUnavailable(err.to_string())
    }
}
