//! Label normalization and output naming.

use std::path::PathBuf;

use crate::models::error::ExportError;

/// Extension of every exported file.
pub const OUTPUT_EXTENSION: &str = "wav";

/// Replace every space with an underscore. Idempotent.
pub fn normalize_label(label: &str) -> String {
    label.replace(' ', "_")
}

/// Reject normalized labels that would not name a single folder under the root.
pub fn check_folder_name(normalized: &str) -> Result<(), ExportError> {
    if normalized.is_empty() {
        return Err(ExportError::InvalidLabel("label is empty".into()));
    }
    if normalized == "." || normalized == ".." {
        return Err(ExportError::InvalidLabel(format!("label {:?} is not a folder name", normalized)));
    }
    if normalized.contains(['/', '\\', '\0']) {
        return Err(ExportError::InvalidLabel(format!(
            "label {:?} contains a path separator",
            normalized
        )));
    }
    Ok(())
}

/// `<label>_<index>.wav`
pub fn output_file_name(normalized: &str, index: u32) -> String {
    format!("{}_{}.{}", normalized, index, OUTPUT_EXTENSION)
}

/// `<label>/<label>_<index>.wav`, relative to the output root.
pub fn relative_output_path(normalized: &str, index: u32) -> PathBuf {
    PathBuf::from(normalized).join(output_file_name(normalized, index))
}
