use std::path::PathBuf;

use hf_hub::api::sync::ApiBuilder;
use hf_hub::{Repo, RepoType};
use log::{debug, info};

use audio_export_core::{RecordSource, RecordStream};

use crate::error::HubError;
use crate::options::{HubOptions, PARQUET_REVISION};
use crate::rows::{self, Columns, ShardRecords};
use crate::shards::select_split_shards;

/// One split of a Hugging Face Hub dataset, read from its parquet shards.
///
/// `open` downloads the shards into the hf-hub cache (reusing cached files)
/// and reads row counts from their footers. Rows are decoded lazily while
/// the exporter iterates, one record batch at a time.
///
/// ## Usage
/// ```ignore
/// let options = HubOptions::new("ardavey/marine_ocean_mammal_sound");
/// let mut dataset = HubDataset::open(&options)?;
/// let report = exporter.export_source(&mut dataset)?;
/// ```
pub struct HubDataset {
    name: String,
    shards: Vec<PathBuf>,
    columns: Columns,
    rows: usize,
}

impl HubDataset {
    /// Locate and download the parquet shards of `options.split`.
    ///
    /// Looks at `options.revision` first. When it holds no parquet files for
    /// the split (script- or folder-based datasets), falls back to the
    /// Hub's auto-converted `refs/convert/parquet` revision.
    pub fn open(options: &HubOptions) -> Result<Self, HubError> {
        let mut builder = ApiBuilder::new().with_progress(false);
        if let Some(dir) = &options.cache_dir {
            builder = builder.with_cache_dir(dir.clone());
        }
        if let Some(token) = &options.token {
            builder = builder.with_token(Some(token.clone()));
        }
        let api = builder.build()?;

        let (revision, files) = resolve_split_files(&options.revision, &options.split, |revision| {
            let repo = api.repo(dataset_repo(&options.dataset_id, revision));
            let info = repo.info()?;
            Ok(info.siblings.into_iter().map(|s| s.rfilename).collect())
        })?;
        if files.is_empty() {
            return Err(HubError::NoShards {
                dataset: options.dataset_id.clone(),
                split: options.split.clone(),
            });
        }

        let repo = api.repo(dataset_repo(&options.dataset_id, &revision));
        let mut shards = Vec::with_capacity(files.len());
        for file in &files {
            debug!("fetching {}", file);
            shards.push(repo.get(file)?);
        }
        info!(
            "{} split {} at {}: {} parquet shard(s)",
            options.dataset_id,
            options.split,
            revision,
            shards.len()
        );

        Self::from_shards(options.dataset_id.clone(), shards, options)
    }

    /// A dataset over parquet shards already on disk, read in the given order.
    pub fn from_shards(
        name: impl Into<String>,
        shards: Vec<PathBuf>,
        options: &HubOptions,
    ) -> Result<Self, HubError> {
        let rows = rows::count_rows(&shards)?;
        Ok(Self {
            name: name.into(),
            shards,
            columns: Columns {
                audio: options.audio_column.clone(),
                label: options.label_column.clone(),
            },
            rows,
        })
    }
}

fn dataset_repo(dataset_id: &str, revision: &str) -> Repo {
    Repo::with_revision(dataset_id.to_string(), RepoType::Dataset, revision.to_string())
}

/// The revision to download from and the split's parquet files in it.
///
/// `list_files` returns every file of the repository at a revision. When
/// `revision` has no parquet files for `split`, the converted parquet revision
/// is listed instead and its listing errors are returned as they are.
fn resolve_split_files<F>(
    revision: &str,
    split: &str,
    mut list_files: F,
) -> Result<(String, Vec<String>), HubError>
where
    F: FnMut(&str) -> Result<Vec<String>, HubError>,
{
    let files = select_split_shards(&list_files(revision)?, split);
    if !files.is_empty() || revision == PARQUET_REVISION {
        return Ok((revision.to_string(), files));
    }

    info!("no parquet files for split {} at {}, trying {}", split, revision, PARQUET_REVISION);
    let files = select_split_shards(&list_files(PARQUET_REVISION)?, split);
    Ok((PARQUET_REVISION.to_string(), files))
}

impl RecordSource for HubDataset {
    fn name(&self) -> &str {
        &self.name
    }

    fn len_hint(&self) -> Option<usize> {
        Some(self.rows)
    }

    fn records(&mut self) -> RecordStream<'_> {
        Box::new(ShardRecords::new(self.shards.clone(), self.columns.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    use audio_export_core::models::report::RecordOutcome;
    use audio_export_core::{ExportConfiguration, ExportError, Exporter, SymphoniaDecoder};

    use crate::rows::tests::{encoded_batch, temp_dir, wav_bytes, write_batch};

    #[test]
    fn exports_parquet_shards_end_to_end() {
        let dir = temp_dir();
        let wav = wav_bytes(800, 16000);
        let shard = dir.join("train-00000-of-00001.parquet");
        write_batch(
            &shard,
            &encoded_batch(&[
                (Some(wav.as_slice()), Some("a.wav"), Some("Blue Whale")),
                (Some(wav.as_slice()), Some("b.wav"), Some("Orca")),
                (Some(&b"broken"[..]), Some("c.wav"), Some("Blue Whale")),
                (Some(wav.as_slice()), Some("d.wav"), Some("Blue Whale")),
            ]),
        );

        let options = HubOptions::new("local/whales");
        let mut dataset = HubDataset::from_shards("local/whales", vec![shard], &options).unwrap();
        assert_eq!(dataset.len_hint(), Some(4));

        let out = dir.join("out");
        let exporter = Exporter::new(SymphoniaDecoder::default(), ExportConfiguration::new(&out)).unwrap();
        let report = exporter.export_source(&mut dataset).unwrap();

        assert_eq!(report.total_seen, 4);
        assert_eq!(report.succeeded, 3);
        assert_eq!(report.failed, 1);
        assert!(out.join("Blue_Whale").join("Blue_Whale_1.wav").is_file());
        assert!(out.join("Blue_Whale").join("Blue_Whale_2.wav").is_file());
        assert!(out.join("Orca").join("Orca_1.wav").is_file());
        assert!(!out.join("Blue_Whale").join("Blue_Whale_3.wav").exists());

        let failure = report.failures().next().unwrap();
        assert_eq!(failure.position, 2);
        assert_eq!(failure.source_id.as_deref(), Some("train-00000-of-00001.parquet#2"));
        assert!(matches!(failure.error, ExportError::DecodeFailed(_)));
        assert!(matches!(report.outcomes[3], RecordOutcome::Exported { .. }));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn unreadable_shard_is_reported_up_front() {
        let dir = temp_dir();
        let shard = dir.join("train.parquet");
        fs::write(&shard, b"not parquet").unwrap();

        let result = HubDataset::from_shards("broken", vec![shard], &HubOptions::default());
        assert!(matches!(result, Err(HubError::Parquet(_))));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn wrong_label_column_aborts_export() {
        let dir = temp_dir();
        let wav = wav_bytes(80, 8000);
        let shard = dir.join("train.parquet");
        write_batch(&shard, &encoded_batch(&[(Some(wav.as_slice()), None, Some("Orca"))]));

        let options = HubOptions {
            label_column: "label".into(),
            ..HubOptions::new("local/whales")
        };
        let mut dataset = HubDataset::from_shards("local/whales", vec![shard], &options).unwrap();
        let config = ExportConfiguration::new(dir.join("out"));
        let exporter = Exporter::new(SymphoniaDecoder::default(), config).unwrap();

        let result = exporter.export_source(&mut dataset);
        assert!(matches!(result, Err(ExportError::DatasetUnavailable(_))));

        fs::remove_dir_all(&dir).ok();
    }

    fn listing(files: &[&str]) -> Result<Vec<String>, HubError> {
        Ok(files.iter().map(|f| f.to_string()).collect())
    }

    #[test]
    fn uses_requested_revision_when_it_has_shards() {
        let mut listed = Vec::new();
        let (revision, files) = resolve_split_files("main", "train", |rev| {
            listed.push(rev.to_string());
            listing(&["README.md", "data/train-00000-of-00001.parquet", "data/test-00000-of-00001.parquet"])
        })
        .unwrap();

        assert_eq!(revision, "main");
        assert_eq!(files, vec!["data/train-00000-of-00001.parquet"]);
        assert_eq!(listed, vec!["main"]);
    }

    #[test]
    fn falls_back_to_converted_parquet() {
        let (revision, files) = resolve_split_files("main", "train", |rev| match rev {
            "main" => listing(&["README.md", "audio/clip_001.wav"]),
            _ => listing(&["default/train/0000.parquet", "default/train/0001.parquet"]),
        })
        .unwrap();

        assert_eq!(revision, PARQUET_REVISION);
        assert_eq!(files, vec!["default/train/0000.parquet", "default/train/0001.parquet"]);
    }

    #[test]
    fn converted_listing_error_is_returned() {
        let result = resolve_split_files("main", "train", |rev| match rev {
            "main" => listing(&["README.md"]),
            _ => Err(HubError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "401 unauthorized",
            ))),
        });

        match result {
            Err(HubError::Io(e)) => assert_eq!(e.kind(), std::io::ErrorKind::PermissionDenied),
            other => panic!("expected the listing error, got {:?}", other.map(|(rev, _)| rev)),
        }
    }

    #[test]
    fn no_second_listing_when_already_on_converted_revision() {
        let mut calls = 0;
        let (revision, files) = resolve_split_files(PARQUET_REVISION, "train", |_| {
            calls += 1;
            listing(&["default/test/0000.parquet"])
        })
        .unwrap();

        assert_eq!(revision, PARQUET_REVISION);
        assert!(files.is_empty());
        assert_eq!(calls, 1);
    }
}
