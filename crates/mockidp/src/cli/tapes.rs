use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use mockidp_core::{pretty_json, TapeStore};

use super::load_config;

/// Print tape details as JSON.
#[derive(Parser)]
pub struct TapesCommand {
    /// Configuration file path.
    #[arg(short, long, default_value = "mockidp.toml")]
    pub config: String,

    /// Tape directory (overrides config).
    #[arg(long)]
    pub tapes_dir: Option<PathBuf>,
}

impl TapesCommand {
    /// Execute the tapes command.
    pub fn execute(self) -> Result<()> {
        println!("{}", self.render()?);
        Ok(())
    }

    fn render(&self) -> Result<String> {
        let dir = match &self.tapes_dir {
            Some(dir) => dir.clone(),
            None => load_config(&self.config)?.tapes.dir,
        };

        let details = TapeStore::new(dir).details()?;
        Ok(pretty_json(&details)?)
    }
}
