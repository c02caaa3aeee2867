use thiserror::Error;

/// Errors that can occur while exporting a labeled audio dataset.
///
/// Per-record variants (`DecodeFailed`, `DirectoryFailed`, `WriteFailed`,
/// `InvalidLabel`) are caught at the record boundary and recorded in the
/// report. The remaining variants abort the run.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExportError {
    #[error("decode failed: {0}")]
    DecodeFailed(String),

    #[error("directory creation failed: {0}")]
    DirectoryFailed(String),

    #[error("write failed: {0}")]
    WriteFailed(String),

    #[error("invalid label: {0}")]
    InvalidLabel(String),

    #[error("invalid output root: {0}")]
    InvalidOutputRoot(String),

    #[error("dataset unavailable: {0}")]
    DatasetUnavailable(String),

    #[error("configuration failed: {0}")]
    ConfigurationFailed(String),
}

impl ExportError {
    /// Whether this error only affects the record that produced it.
    pub fn is_per_record(&self) -> bool {
        matches!(
            self,
            Self::DecodeFailed(_) | Self::DirectoryFailed(_) | Self::WriteFailed(_) | Self::InvalidLabel(_)
        )
    }
}
