use std::future::Future;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::response::{error_response, BufferedResponse};
use super::tracing::tracing_middleware;
use crate::intercept::RequestHandler;

/// Gateway server configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub unused_tapes: usize,
}

/// Gateway HTTP server.
pub struct GatewayServer {
    config: GatewayConfig,
    handler: Arc<RequestHandler>,
}

impl GatewayServer {
    /// Create a new gateway server.
    pub fn new(config: GatewayConfig, handler: RequestHandler) -> Self {
        Self {
            config,
            handler: Arc::new(handler),
        }
    }

    /// Build the Axum router.
    ///
    /// Everything except the health check goes to the request handler.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .fallback(intercept_handler)
            .with_state(self.handler.clone())
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(middleware::from_fn(tracing_middleware)),
            )
    }

    /// Get the address to bind to. Host names are resolved on bind.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }

    /// Serve on an already bound listener until `shutdown` resolves.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tracing::info!("Mock server listening on {}", listener.local_addr()?);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
    }
}

/// Health check handler.
async fn health_handler(State(handler): State<Arc<RequestHandler>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        unused_tapes: handler.unused_tapes().len(),
    })
}

/// Feed a request through the request handler.
async fn intercept_handler(
    State(handler): State<Arc<RequestHandler>>,
    req: Request,
) -> Response {
    let mut res = BufferedResponse::new();
    match handler.handle(req, &mut res).await {
        Ok(()) => res.into_response(),
        Err(e) => {
            tracing::error!("Request failed: {}", e);
            error_response(&e)
        }
    }
}
