use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use console::style;
use mockidp_core::config::{LoggingConfig, MockConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::load_config;
use crate::runtime::MockIdp;

/// Run the mock server.
#[derive(Parser)]
pub struct RunCommand {
    /// Configuration file path.
    #[arg(short, long, default_value = "mockidp.toml")]
    pub config: String,

    /// Port to listen on (overrides config).
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Host to bind to (overrides config).
    #[arg(long)]
    pub host: Option<String>,

    /// Tape directory (overrides config).
    #[arg(long)]
    pub tapes_dir: Option<PathBuf>,

    /// Record missing tapes from the upstream.
    #[arg(long)]
    pub record: bool,

    /// Upstream base URL used when recording (overrides config).
    #[arg(long)]
    pub upstream: Option<String>,

    /// Enable development mode (verbose logging).
    #[arg(long)]
    pub dev: bool,
}

impl RunCommand {
    /// Execute the run command.
    pub async fn execute(self) -> Result<()> {
        let mut config = load_config(&self.config)?;
        self.apply_overrides(&mut config);

        init_logging(&config.logging, self.dev)?;

        println!();
        println!(
            "  {}  v{}",
            style("mockidp").bold().cyan(),
            env!("CARGO_PKG_VERSION")
        );
        println!();

        info!("Using tapes from {}", config.tapes.dir.display());

        let idp = MockIdp::builder()
            .config(config)
            .build()
            .map_err(|e| anyhow::anyhow!("{}", e))?;

        let server = &idp.config().server;
        println!(
            "  {} Listening on {}",
            style("→").bold(),
            style(format!("http://{}:{}", server.host, server.port)).cyan()
        );
        println!(
            "  {} {} tape(s) loaded",
            style("→").bold(),
            idp.tape_count()
        );
        if idp.is_recording() {
            println!("  {} Recording missing tapes", style("●").red().bold());
        }
        if self.dev {
            println!("  {} Development mode enabled", style("→").bold());
        }
        println!();

        idp.run().await.map_err(|e| anyhow::anyhow!("{}", e))?;

        println!("\n  {} Stopped", style("■").bold());

        Ok(())
    }

    /// Apply command-line flags on top of the file configuration.
    fn apply_overrides(&self, config: &mut MockConfig) {
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(dir) = &self.tapes_dir {
            config.tapes.dir = dir.clone();
        }
        if self.record {
            config.tapes.record = true;
        }
        if let Some(upstream) = &self.upstream {
            config.tapes.upstream = Some(upstream.clone());
        }
    }
}

/// The filter used when `RUST_LOG` is unset.
fn default_filter(logging: &LoggingConfig, dev: bool) -> String {
    if dev {
        "debug".to_string()
    } else {
        logging.level.clone()
    }
}

fn init_logging(logging: &LoggingConfig, dev: bool) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_filter(logging, dev))?,
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = if logging.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))
}
