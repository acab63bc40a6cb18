pub mod audio;
pub mod cli;
pub mod config;
pub mod editor;
pub mod export;
pub mod input;
pub mod orchestrator;
pub mod session;
pub mod tts;

pub use audio::{PcmBuffer, SharedBuffer};
pub use editor::{EditOutcome, EditorSession, NoOpReason};
pub use session::{Group, Segment, Workspace};

use clap::Parser;
use tracing_subscriber::EnvFilter;

pub fn run() -> anyhow::Result<()> {
    // Load environment variables from .env file
    let _ = dotenvy::dotenv();

    let cli = cli::Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    cli::execute(cli)
}
