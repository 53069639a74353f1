use anyhow::Result;
use clap::Parser;

use mockidp::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.execute().await
}
