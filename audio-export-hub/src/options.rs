use std::path::PathBuf;

/// Revision the Hub publishes auto-converted parquet files under.
pub const PARQUET_REVISION: &str = "refs/convert/parquet";

/// Which dataset, split, and columns to read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubOptions {
    /// Repository id, e.g. `ardavey/marine_ocean_mammal_sound`.
    pub dataset_id: String,

    /// Split to export (default: `train`).
    pub split: String,

    /// Branch, tag, or commit (default: `main`).
    pub revision: String,

    /// Audio column (default: `audio`).
    pub audio_column: String,

    /// Label column (default: `species`).
    pub label_column: String,

    /// hf-hub cache directory, or None for the hf-hub default.
    pub cache_dir: Option<PathBuf>,

    /// Access token for gated or private datasets.
    pub token: Option<String>,
}

impl HubOptions {
    pub fn new(dataset_id: impl Into<String>) -> Self {
        Self {
            dataset_id: dataset_id.into(),
            ..Default::default()
        }
    }
}

impl Default for HubOptions {
    fn default() -> Self {
        Self {
            dataset_id: String::new(),
            split: "train".into(),
            revision: "main".into(),
            audio_column: "audio".into(),
            label_column: "species".into(),
            cache_dir: None,
            token: None,
        }
    }
}
