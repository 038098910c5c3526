//! polysub CLI - offline rendering and inspection for the polysub synthesizer.

mod commands;
mod wav;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "polysub")]
#[command(author, version, about = "Polyphonic subtractive synthesizer", long_about = None)]
struct Cli {
    /// Engine config file (TOML). Defaults to the user config file when present.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render notes to a WAV file
    Render(commands::render::RenderArgs),

    /// List the synth parameters and their ranges
    Params(commands::params::ParamsArgs),

    /// List the MIDI control-change map
    CcMap(commands::cc_map::CcMapArgs),

    /// Print (and optionally write) the effective engine config
    Config(commands::config::ConfigArgs),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = commands::common::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Render(args) => commands::render::run(args, config),
        Commands::Params(args) => commands::params::run(args),
        Commands::CcMap(args) => commands::cc_map::run(args),
        Commands::Config(args) => commands::config::run(args, &config),
    }
}
