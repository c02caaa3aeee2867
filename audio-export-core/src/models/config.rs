use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// When a label's counter is advanced relative to the file write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IndexPolicy {
    /// Store the new count only after the file is written. Failed records
    /// never consume an index, so each label's files are numbered without gaps.
    #[default]
    CommitOnWrite,

    /// Store the new count once decoding and the directory step succeed,
    /// before writing. A failed write leaves a gap in that label's numbering.
    ReserveBeforeWrite,
}

impl fmt::Display for IndexPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CommitOnWrite => f.write_str("commit-on-write"),
            Self::ReserveBeforeWrite => f.write_str("reserve-before-write"),
        }
    }
}

impl FromStr for IndexPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "commit-on-write" => Ok(Self::CommitOnWrite),
            "reserve-before-write" => Ok(Self::ReserveBeforeWrite),
            other => Err(format!("unknown index policy: {}", other)),
        }
    }
}

/// Configuration for an export run.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportConfiguration {
    /// Root directory; one subdirectory per normalized label is created here.
    pub output_root: PathBuf,

    pub index_policy: IndexPolicy,

    /// Stop the run after this many records fail in a row (None = never).
    pub max_consecutive_failures: Option<usize>,

    /// Write `export_manifest.json` into the output root when the run ends.
    pub write_manifest: bool,

    /// Human-readable dataset name recorded in the manifest.
    pub source_name: Option<String>,
}

impl ExportConfiguration {
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.output_root.as_os_str().is_empty() {
            return Err("output root must not be empty".into());
        }
        if self.max_consecutive_failures == Some(0) {
            return Err("max consecutive failures must be at least 1".into());
        }
        Ok(())
    }
}

impl Default for ExportConfiguration {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from("."),
            index_policy: IndexPolicy::default(),
            max_consecutive_failures: None,
            write_manifest: false,
            source_name: None,
        }
    }
}
