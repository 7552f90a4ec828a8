mod cli;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use resonance_archive::config::ArchiveConfig;
use resonance_archive::server;

#[derive(Parser)]
#[command(name = "resonance", version, about = "Emotional resonance archive and ghost curator")]
struct Cli {
    /// Config file (defaults to ~/.resonance/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP server and the ghost curator
    Serve,
    /// Create the data directory and empty collections
    Init,
    /// Show archive statistics
    Stats,
    /// Print the lineage of an entry as JSON
    Trace {
        /// Entry id
        id: u64,
    },
    /// Run one ghost reflection immediately
    Reflect,
    /// Copy every collection into a timestamped backup directory
    Backup {
        /// Backup root (defaults to ~/.resonance/backups)
        #[arg(long)]
        dest: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ArchiveConfig::load_from(path)?,
        None => ArchiveConfig::load()?,
    };

    // Log to stderr so command output on stdout stays clean.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve => server::serve(config).await?,
        Command::Init => cli::init(&config)?,
        Command::Stats => cli::stats(&config)?,
        Command::Trace { id } => cli::trace(&config, id).await?,
        Command::Reflect => cli::reflect(&config).await?,
        Command::Backup { dest } => cli::backup(&config, dest)?,
    }

    Ok(())
}
