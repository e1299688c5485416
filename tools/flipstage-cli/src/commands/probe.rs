//! Probe a sequence on disk.

use std::path::PathBuf;
use std::sync::Arc;

use flipstage_common::config::StageConfig;
use flipstage_sequence_loader::{FsFrameSource, LoaderConfig, SequenceLoader};
use flipstage_sequence_model::catalog::SequenceCatalog;

pub async fn run(
    config: &StageConfig,
    name: String,
    root: PathBuf,
    retries: Option<u32>,
    ceiling: Option<u32>,
    list: bool,
) -> anyhow::Result<()> {
    let catalog = Arc::new(
        SequenceCatalog::from_config(config)
            .map_err(|e| anyhow::anyhow!("Invalid catalog: {e}"))?,
    );

    let mut loader_config = LoaderConfig::from(&config.assets);
    if let Some(retries) = retries {
        loader_config.max_probe_retries = retries;
    }
    if let Some(ceiling) = ceiling {
        loader_config.probe_ceiling = ceiling;
    }

    println!("Probing '{}' under {}", name, root.display());
    let loader = SequenceLoader::new(Arc::new(FsFrameSource::new(&root)), catalog, loader_config);
    let sequence = loader.load_by_name(&name).await?;

    if sequence.is_empty() {
        println!("  No frames found (first probe failed).");
        return Ok(());
    }

    let first = sequence.start_frame();
    let last = first + sequence.len() as u32 - 1;
    println!("  Frames: {} (assets {first:04}..={last:04})", sequence.len());
    println!("  Cached: {} bytes", loader.cache().total_bytes());
    if sequence.len() as u32 >= loader_config.probe_ceiling {
        println!("  Probe ceiling of {} reached.", loader_config.probe_ceiling);
    }

    if list {
        for (i, locator) in sequence.frames().iter().enumerate() {
            println!("  [{i:>4}] {locator}");
        }
    }

    Ok(())
}
