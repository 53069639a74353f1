//! Runtime wiring for the mock identity provider.
//!
//! Loads the tape directory, seeds the unused-tapes set, and serves the
//! request handler behind the gateway until shutdown.

use std::future::Future;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::broadcast;

use mockidp_core::config::MockConfig;
use mockidp_core::error::{MockError, Result};
use mockidp_core::{Standardizer, TapeStore, UnusedTapes};
use mockidp_runtime::{
    GatewayConfig, GatewayServer, HandlerOptions, Recorder, RequestHandler, TapeProxy,
};

/// Prelude module for common imports.
pub mod prelude {
    pub use mockidp_core::config::MockConfig;
    pub use mockidp_core::error::{MockError, Result};
    pub use mockidp_core::testing::ScenarioClient;
    pub use mockidp_core::{StandardizedRequest, Tape, TapeDetail, TapeStore, UnusedTapes};

    pub use crate::{MockIdp, MockIdpBuilder};
}

/// A configured mock server, ready to serve.
pub struct MockIdp {
    config: MockConfig,
    server: GatewayServer,
    unused_tapes: UnusedTapes,
    tape_count: usize,
    recording: bool,
    shutdown_tx: broadcast::Sender<()>,
}

impl MockIdp {
    /// Create a new builder for configuring the server.
    pub fn builder() -> MockIdpBuilder {
        MockIdpBuilder::new()
    }

    /// Get the configuration.
    pub fn config(&self) -> &MockConfig {
        &self.config
    }

    /// Tapes not yet served. Shared with the running handler.
    pub fn unused_tapes(&self) -> &UnusedTapes {
        &self.unused_tapes
    }

    /// Number of tapes found at startup.
    pub fn tape_count(&self) -> usize {
        self.tape_count
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// Serve on the configured address until Ctrl-C or a shutdown message.
    pub async fn run(self) -> Result<()> {
        let listener = TcpListener::bind(self.server.addr()).await?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener until Ctrl-C or a shutdown message.
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        let shutdown = wait_for_shutdown(self.shutdown_tx.subscribe());
        self.serve_until(listener, shutdown).await
    }

    async fn serve_until<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tracing::info!(
            tapes = self.tape_count,
            recording = self.recording,
            "Mock server starting"
        );

        self.server.serve(listener, shutdown).await?;

        report_unused(&self.unused_tapes);
        tracing::info!("Mock server stopped");
        Ok(())
    }

    /// A handle that can stop the server after it has been moved into `run`.
    pub fn shutdown_handle(&self) -> broadcast::Sender<()> {
        self.shutdown_tx.clone()
    }
}

async fn wait_for_shutdown(mut shutdown_rx: broadcast::Receiver<()>) {
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received shutdown signal");
        }
        _ = shutdown_rx.recv() => {
            tracing::info!("Received shutdown notification");
        }
    }
}

fn report_unused(unused: &UnusedTapes) {
    if unused.is_empty() {
        tracing::info!("All tapes were used");
        return;
    }
    for name in unused.names() {
        tracing::warn!(tape = %name, "Tape was never used");
    }
    tracing::warn!("{} tape(s) unused", unused.len());
}

/// Builder for configuring the mock server.
pub struct MockIdpBuilder {
    config: Option<MockConfig>,
}

impl MockIdpBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self { config: None }
    }

    /// Set the configuration.
    pub fn config(mut self, config: MockConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Load tapes and assemble the server.
    pub fn build(self) -> Result<MockIdp> {
        let config = self
            .config
            .ok_or_else(|| MockError::Config("Configuration is required".to_string()))?;

        let store = TapeStore::new(config.tapes.dir.clone());
        let tape_details = store.details()?;
        let unused_tapes = UnusedTapes::seeded(tape_details.iter().map(|d| d.tape.clone()));
        tracing::info!(
            "Loaded {} tape(s) from {}",
            tape_details.len(),
            store.dir().display()
        );

        let recorder = Recorder::from_config(&config.tapes)?;
        if let Some(recorder) = &recorder {
            tracing::info!("Recording missing tapes from {}", recorder.upstream());
        }
        let proxy = TapeProxy::new(store).with_recorder(recorder);
        let recording = proxy.is_recording();

        let tape_count = tape_details.len();
        let handler = RequestHandler::new(HandlerOptions {
            tapes_dir: config.tapes.dir.clone(),
            unused_tapes: unused_tapes.clone(),
            tape_details: Arc::new(tape_details),
            standardizer: Standardizer::from_config(
                &config.standardize,
                config.server.body_limit_bytes,
            ),
            proxy: Arc::new(proxy),
        });

        let server = GatewayServer::new(
            GatewayConfig {
                host: config.server.host.clone(),
                port: config.server.port,
            },
            handler,
        );

        let (shutdown_tx, _) = broadcast::channel(1);

        Ok(MockIdp {
            config,
            server,
            unused_tapes,
            tape_count,
            recording,
            shutdown_tx,
        })
    }
}

impl Default for MockIdpBuilder {
    fn default() -> Self {
        Self::new()
    }
}
