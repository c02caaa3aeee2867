use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::models::config::IndexPolicy;
use crate::models::error::ExportError;
use crate::models::report::{ExportReport, ExportedFile};

/// File name of the manifest written into the output root.
pub const MANIFEST_FILE_NAME: &str = "export_manifest.json";

/// One exported WAV file as listed in the manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub label: String,
    pub index: u32,
    /// Path relative to the output root, with `/` separators.
    pub path: String,
    pub sample_rate: u32,
    pub channels: u16,
    pub frames: u64,
    pub duration_secs: f64,
    pub checksum: String,
}

impl From<&ExportedFile> for ManifestEntry {
    fn from(file: &ExportedFile) -> Self {
        let path = file
            .relative_path
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        Self {
            label: file.label.clone(),
            index: file.index,
            path,
            sample_rate: file.sample_rate,
            channels: file.channels,
            frames: file.frames,
            duration_secs: file.duration_secs(),
            checksum: file.checksum.clone(),
        }
    }
}

/// Summary of an export run, serialized as `export_manifest.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportManifest {
    pub id: String,
    pub created_at: String,
    pub source: Option<String>,
    pub decoder: String,
    pub index_policy: IndexPolicy,
    pub total_seen: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub aborted: bool,
    pub files: Vec<ManifestEntry>,
}

impl ExportManifest {
    pub fn from_report(
        report: &ExportReport,
        source: Option<String>,
        decoder: &str,
        index_policy: IndexPolicy,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            source,
            decoder: decoder.to_string(),
            index_policy,
            total_seen: report.total_seen,
            succeeded: report.succeeded,
            failed: report.failed,
            aborted: report.aborted,
            files: report.exported_files().map(ManifestEntry::from).collect(),
        }
    }
}

/// Write the manifest as pretty JSON into `output_root`.
pub fn write_manifest(manifest: &ExportManifest, output_root: &Path) -> Result<(), ExportError> {
    let manifest_path = output_root.join(MANIFEST_FILE_NAME);
    let json = serde_json::to_string_pretty(manifest)
        .map_err(|e| ExportError::WriteFailed(format!("failed to serialize manifest: {}", e)))?;
    fs::write(&manifest_path, json)
        .map_err(|e| ExportError::WriteFailed(format!("failed to write manifest: {}", e)))?;
    Ok(())
}

/// Read the manifest from `output_root`.
pub fn read_manifest(output_root: &Path) -> Result<ExportManifest, ExportError> {
    let manifest_path = output_root.join(MANIFEST_FILE_NAME);
    let json = fs::read_to_string(&manifest_path)
        .map_err(|e| ExportError::InvalidOutputRoot(format!("failed to read manifest: {}", e)))?;
    let manifest: ExportManifest = serde_json::from_str(&json)
        .map_err(|e| ExportError::InvalidOutputRoot(format!("failed to parse manifest: {}", e)))?;
    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn exported(label: &str, index: u32) -> ExportedFile {
        ExportedFile {
            label: label.to_string(),
            index,
            path: PathBuf::from("/tmp/out").join(label).join(format!("{label}_{index}.wav")),
            relative_path: PathBuf::from(label).join(format!("{label}_{index}.wav")),
            sample_rate: 16000,
            channels: 1,
            frames: 4000,
            checksum: "ab".repeat(32),
        }
    }

    #[test]
    fn entries_use_forward_slashes() {
        let entry = ManifestEntry::from(&exported("Blue_Whale", 3));
        assert_eq!(entry.path, "Blue_Whale/Blue_Whale_3.wav");
        approx::assert_relative_eq!(entry.duration_secs, 0.25);
    }

    #[test]
    fn manifest_written_and_read_back() {
        let root = std::env::temp_dir().join(format!("audio_export_manifest_{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&root).unwrap();

        let mut report = ExportReport::default();
        report.record_exported(0, exported("Orca", 1));
        report.record_exported(1, exported("Orca", 2));

        let manifest = ExportManifest::from_report(
            &report,
            Some("ardavey/marine_ocean_mammal_sound".into()),
            "symphonia",
            IndexPolicy::CommitOnWrite,
        );
        write_manifest(&manifest, &root).unwrap();

        let json = fs::read_to_string(root.join(MANIFEST_FILE_NAME)).unwrap();
        assert!(json.contains("\"index_policy\": \"commit-on-write\""));

        let read = read_manifest(&root).unwrap();
        assert_eq!(read, manifest);
        assert_eq!(read.files.len(), 2);
        assert_eq!(read.succeeded, 2);

        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn missing_manifest_is_an_error() {
        let root = std::env::temp_dir().join(format!("audio_export_no_manifest_{}", uuid::Uuid::new_v4()));
        assert!(read_manifest(&root).is_err());
    }
}
