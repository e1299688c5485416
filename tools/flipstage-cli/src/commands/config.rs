//! Show or write configuration.

use std::path::PathBuf;

use flipstage_common::config::{config_file_path, StageConfig};

pub fn run(
    config: StageConfig,
    defaults: bool,
    write: Option<PathBuf>,
    save: bool,
) -> anyhow::Result<()> {
    let config = if defaults {
        StageConfig::default()
    } else {
        config
    };
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Configuration is invalid: {e}"))?;

    println!("{}", serde_json::to_string_pretty(&config)?);

    if let Some(path) = write {
        config.save_to(&path)?;
        println!("Wrote {}", path.display());
    }
    if save {
        config.save()?;
        println!("Wrote {}", config_file_path().display());
    }

    Ok(())
}
