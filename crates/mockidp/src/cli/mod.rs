mod run;
mod tapes;

pub use run::RunCommand;
pub use tapes::TapesCommand;

use std::path::Path;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mockidp_core::config::MockConfig;

/// mockidp - replay recorded identity provider traffic
#[derive(Parser)]
#[command(name = "mockidp")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Run the mock server.
    Run(RunCommand),

    /// Print the tapes in a directory.
    Tapes(TapesCommand),
}

impl Cli {
    /// Execute the CLI command.
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Run(cmd) => cmd.execute().await,
            Commands::Tapes(cmd) => cmd.execute(),
        }
    }
}

/// Load `.env` if present, then the config file. A missing file yields
/// the defaults.
fn load_config(path: &str) -> Result<MockConfig> {
    dotenvy::dotenv().ok();

    MockConfig::from_file_or_default(Path::new(path))
        .with_context(|| format!("Failed to load configuration from {}", path))
}
