use std::path::PathBuf;
use std::sync::Arc;

use axum::http::Request;
use bytes::Bytes;
use hyper::body::Body;
use mockidp_core::error::Result;
use mockidp_core::protocol::UNUSED_TAPES_PATH;
use mockidp_core::{
    get_tape_details, pretty_json, RequestSummary, Standardizer, TapeDetail, UnusedTapes,
};

use super::decorators::{MissingTapeDiagnostics, TapeTracking};
use crate::gateway::ResponseSink;
use crate::proxy::Proxy;

/// Everything the request handler needs, supplied by the runtime.
#[derive(Clone)]
pub struct HandlerOptions {
    /// Directory listed by the unused-tapes endpoint.
    pub tapes_dir: PathBuf,
    /// Shared set of tapes not yet replayed.
    pub unused_tapes: UnusedTapes,
    /// Details of every tape known at startup.
    pub tape_details: Arc<Vec<TapeDetail>>,
    /// Request standardization settings.
    pub standardizer: Standardizer,
    /// Delegate that produces the actual response.
    pub proxy: Arc<dyn Proxy>,
}

/// Intercepts every request in front of the delegate proxy.
#[derive(Clone)]
pub struct RequestHandler {
    opts: HandlerOptions,
}

impl RequestHandler {
    /// Create a new request handler.
    pub fn new(opts: HandlerOptions) -> Self {
        Self { opts }
    }

    pub fn unused_tapes(&self) -> &UnusedTapes {
        &self.opts.unused_tapes
    }

    /// Handle one request, writing the result into `res`.
    ///
    /// Requests to the unused-tapes endpoint are answered directly. All
    /// others are standardized and passed to the proxy through a response
    /// that tracks tape use and explains missing tapes.
    pub async fn handle<B>(&self, req: Request<B>, res: &mut dyn ResponseSink) -> Result<()>
    where
        B: Body<Data = Bytes> + Send,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let is_unused_tapes = req
            .uri()
            .path_and_query()
            .is_some_and(|pq| pq.as_str() == UNUSED_TAPES_PATH);
        if is_unused_tapes {
            let details = get_tape_details(&self.opts.tapes_dir, &self.opts.unused_tapes)?;
            res.set_header("content-type", "application/json");
            res.end(pretty_json(&details)?);
            return Ok(());
        }

        let (parts, body) = req.into_parts();
        let original = RequestSummary::from_parts(&parts);
        let standard = self.opts.standardizer.standardize(&parts, body).await?;

        tracing::debug!(
            method = %standard.method,
            url = %standard.url,
            tape = %standard.tape_name(),
            "Standardized request"
        );

        let mut res = MissingTapeDiagnostics::new(
            TapeTracking::new(res, self.opts.unused_tapes.clone()),
            original,
            standard.clone(),
            self.opts.tape_details.clone(),
        );

        self.opts.proxy.proxy(standard, &mut res).await
    }
}
