//! # audio-export-hub
//!
//! Hugging Face Hub dataset provider for audio-export.
//!
//! Provides:
//! - `HubDataset` — one split of a Hub dataset as a `RecordSource`
//! - `HubOptions` — dataset id, split, revision, and column names
//! - `select_split_shards` — picks a split's parquet files from a repo listing
//!
//! Audio columns are read in the layout the `datasets` library writes:
//! a struct of `{bytes, path}` (encoded audio) or `{array, sampling_rate}`
//! (decoded samples). Integer labels are mapped through the `ClassLabel`
//! names stored in the parquet schema metadata.
//!
//! ## Usage
//! ```ignore
//! use audio_export_core::{ExportConfiguration, Exporter, SymphoniaDecoder};
//! use audio_export_hub::{HubDataset, HubOptions};
//!
//! let mut dataset = HubDataset::open(&HubOptions::new("ardavey/marine_ocean_mammal_sound"))?;
//! let exporter = Exporter::new(SymphoniaDecoder::default(), ExportConfiguration::new("sorted_audio"))?;
//! let report = exporter.export_source(&mut dataset)?;
//! ```

pub mod dataset;
pub mod error;
pub mod options;
pub mod rows;
pub mod shards;

pub use dataset::HubDataset;
pub use error::HubError;
pub use options::{HubOptions, PARQUET_REVISION};
pub use shards::select_split_shards;
