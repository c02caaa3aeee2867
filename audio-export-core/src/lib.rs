//! # audio-export-core
//!
//! Labeled audio dataset export core library.
//!
//! Turns a sequence of labeled audio records into WAV files laid out as
//! `<root>/<label>/<label>_<n>.wav`, numbering files per label in input order.
//! Dataset providers (e.g. the Hugging Face Hub backend) implement the
//! `RecordSource` trait and plug into the generic `Exporter`.
//!
//! ## Architecture
//!
//! ```text
//! audio-export-core (this crate)
//! ├── traits/       ← RecordSource, AudioDecoder, ExportDelegate
//! ├── models/       ← ExportError, Record, ExportConfiguration, CounterTable, ExportReport
//! ├── processing/   ← decode strategies, label naming, WAV header + PCM conversion
//! ├── export/       ← Exporter (generic over the decode strategy)
//! └── storage/      ← WavFileWriter, export manifest
//! ```

pub mod export;
pub mod models;
pub mod processing;
pub mod storage;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use export::exporter::Exporter;
pub use models::config::{ExportConfiguration, IndexPolicy};
pub use models::counters::CounterTable;
pub use models::error::ExportError;
pub use models::record::{AudioPayload, DecodedAudio, Record};
pub use models::report::{ExportReport, ExportedFile, RecordFailure, RecordOutcome};
pub use processing::decoders::{DecodedOnly, SymphoniaDecoder};
pub use processing::label::normalize_label;
pub use storage::manifest::{ExportManifest, ManifestEntry};
pub use storage::wav_writer::WavFileWriter;
pub use traits::audio_decoder::AudioDecoder;
pub use traits::export_delegate::ExportDelegate;
pub use traits::record_source::{InMemorySource, RecordSource, RecordStream};
