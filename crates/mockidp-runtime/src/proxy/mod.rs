//! Delegates that produce the response for a standardized request.

mod recorder;
mod tape;

pub use recorder::Recorder;
pub use tape::TapeProxy;

use std::future::Future;
use std::pin::Pin;

use mockidp_core::error::Result;
use mockidp_core::StandardizedRequest;

use crate::gateway::ResponseSink;

/// Produces a response for a standardized request.
///
/// Implementations write through `response`; the request handler has
/// already wrapped it to observe tape use and missing tapes.
pub trait Proxy: Send + Sync + 'static {
    fn proxy<'a>(
        &'a self,
        request: StandardizedRequest,
        response: &'a mut dyn ResponseSink,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;
}
