use axum::extract::Request;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use tracing::Instrument;
use uuid::Uuid;

/// Header name for request ID.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request tracing state.
#[derive(Debug, Clone)]
pub struct TracingState {
    /// Unique request ID.
    pub request_id: String,
    /// When the request started.
    pub start_time: std::time::Instant,
}

impl TracingState {
    /// Create a new tracing state.
    pub fn new() -> Self {
        Self::with_request_id(Uuid::new_v4().to_string())
    }

    /// Create with an existing request ID (for propagation).
    pub fn with_request_id(request_id: String) -> Self {
        Self {
            request_id,
            start_time: std::time::Instant::now(),
        }
    }

    /// Get elapsed time since request start.
    pub fn elapsed(&self) -> std::time::Duration {
        self.start_time.elapsed()
    }
}

impl Default for TracingState {
    fn default() -> Self {
        Self::new()
    }
}

/// Attach a request ID to every request, its log span and its response.
pub async fn tracing_middleware(mut req: Request, next: Next) -> Response {
    let state = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|id| TracingState::with_request_id(id.to_string()))
        .unwrap_or_default();

    let span = tracing::info_span!(
        "request",
        request_id = %state.request_id,
        method = %req.method(),
        path = %req.uri().path(),
    );
    req.extensions_mut().insert(state.clone());

    let mut response = next.run(req).instrument(span.clone()).await;

    span.in_scope(|| {
        tracing::info!(
            status = response.status().as_u16(),
            elapsed_ms = state.elapsed().as_millis() as u64,
            "Request completed"
        );
    });

    if let Ok(val) = HeaderValue::from_str(&state.request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, val);
    }

    response
}
