//! Effective config dump.

use anyhow::Context;
use clap::Args;
use polysub_config::EngineConfig;
use std::path::PathBuf;

#[derive(Args)]
pub struct ConfigArgs {
    /// Also write the config to this file
    #[arg(long, value_name = "PATH")]
    write: Option<PathBuf>,
}

pub fn run(args: ConfigArgs, config: &EngineConfig) -> anyhow::Result<()> {
    print!("{}", config.to_toml_string()?);
    if let Some(path) = &args.write {
        config
            .save(path)
            .with_context(|| format!("saving config to {}", path.display()))?;
        tracing::info!(path = %path.display(), "config written");
    }
    Ok(())
}
