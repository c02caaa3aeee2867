mod console;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;

use audio_export_core::{ExportConfiguration, Exporter, IndexPolicy, RecordSource, SymphoniaDecoder};
use audio_export_hub::{HubDataset, HubOptions};

use crate::console::ConsoleDelegate;

/// Export a labeled Hugging Face audio dataset into per-label WAV folders.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Dataset repository id
    #[arg(default_value = "ardavey/marine_ocean_mammal_sound")]
    dataset: String,

    /// Output root; files land in <OUTPUT_DIR>/<label>/<label>_<n>.wav
    #[arg(default_value = "sorted_audio")]
    output_dir: PathBuf,

    /// Split to export
    #[arg(long, default_value = "train")]
    split: String,

    /// Dataset revision (branch, tag, or commit)
    #[arg(long, default_value = "main")]
    revision: String,

    #[arg(long, default_value = "audio")]
    audio_column: String,

    #[arg(long, default_value = "species")]
    label_column: String,

    /// hf-hub cache directory
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Access token for gated or private datasets
    #[arg(long, env = "HF_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// commit-on-write (gapless numbering) or reserve-before-write
    #[arg(long, default_value_t = IndexPolicy::CommitOnWrite)]
    index_policy: IndexPolicy,

    /// Stop after this many failed records in a row
    #[arg(long)]
    max_consecutive_failures: Option<usize>,

    /// Keep all channels instead of mixing down to mono
    #[arg(long)]
    no_downmix: bool,

    /// Write export_manifest.json into the output root
    #[arg(long)]
    manifest: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let options = HubOptions {
        dataset_id: args.dataset.clone(),
        split: args.split,
        revision: args.revision,
        audio_column: args.audio_column,
        label_column: args.label_column,
        cache_dir: args.cache_dir,
        token: args.token,
    };

    println!("Loading dataset {}...", options.dataset_id);
    let mut dataset =
        HubDataset::open(&options).with_context(|| format!("failed to load dataset {}", options.dataset_id))?;

    let config = ExportConfiguration {
        output_root: args.output_dir.clone(),
        index_policy: args.index_policy,
        max_consecutive_failures: args.max_consecutive_failures,
        write_manifest: args.manifest,
        source_name: Some(args.dataset),
    };
    let mut exporter = Exporter::new(SymphoniaDecoder::new(!args.no_downmix), config)?;
    exporter.set_delegate(Arc::new(ConsoleDelegate::new(dataset.len_hint())));

    println!("Starting export...");
    let report = exporter.export_source(&mut dataset)?;

    if report.aborted {
        bail!(
            "export stopped after {} consecutive failures; {} files written to {}",
            args.max_consecutive_failures.unwrap_or_default(),
            report.succeeded,
            args.output_dir.display()
        );
    }
    println!("Export complete! Files saved to {}", args.output_dir.display());
    Ok(())
}
