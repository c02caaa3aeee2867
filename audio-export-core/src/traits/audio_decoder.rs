use crate::models::error::ExportError;
use crate::models::record::{DecodedAudio, Record};

/// Strategy that turns a record's payload into decoded samples.
///
/// Chosen once when the exporter is built. Implemented by:
/// - `DecodedOnly` (uses samples the dataset provider already decoded)
/// - `SymphoniaDecoder` (decodes raw bytes or files itself)
pub trait AudioDecoder {
    /// Produce decoded audio for `record`.
    ///
    /// Errors should be `ExportError::DecodeFailed`; the exporter skips the record.
    fn decode(&self, record: &Record) -> Result<DecodedAudio, ExportError>;

    /// Short identifier (e.g., "symphonia"), recorded in the manifest.
    fn name(&self) -> &str;
}

impl<D: AudioDecoder + ?Sized> AudioDecoder for Box<D> {
    fn decode(&self, record: &Record) -> Result<DecodedAudio, ExportError> {
        (**self).decode(record)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
