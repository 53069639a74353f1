use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use mockidp_core::MockError;

/// The operations a handler or proxy may perform on a response.
///
/// Decorators wrap a sink to observe or rewrite these calls before they
/// reach the underlying response.
pub trait ResponseSink: Send {
    /// Set the status code.
    fn set_status(&mut self, status: StatusCode);

    /// Set a header, replacing any previous value.
    fn set_header(&mut self, name: &str, value: &str);

    /// Finalize the response with a body.
    fn end(&mut self, body: String);
}

impl<S: ResponseSink + ?Sized> ResponseSink for &mut S {
    fn set_status(&mut self, status: StatusCode) {
        (**self).set_status(status)
    }

    fn set_header(&mut self, name: &str, value: &str) {
        (**self).set_header(name, value)
    }

    fn end(&mut self, body: String) {
        (**self).end(body)
    }
}

/// A response held in memory until the handler returns.
#[derive(Debug)]
pub struct BufferedResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Option<String>,
}

impl BufferedResponse {
    /// Create an empty 200 response.
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The final body, if the response has been ended.
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    pub fn is_ended(&self) -> bool {
        self.body.is_some()
    }
}

impl Default for BufferedResponse {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseSink for BufferedResponse {
    fn set_status(&mut self, status: StatusCode) {
        if self.is_ended() {
            tracing::warn!("Ignoring status {} set after response ended", status);
            return;
        }
        self.status = status;
    }

    fn set_header(&mut self, name: &str, value: &str) {
        if self.is_ended() {
            tracing::warn!("Ignoring header {} set after response ended", name);
            return;
        }
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
            }
            _ => tracing::warn!("Dropping invalid response header {:?}", name),
        }
    }

    fn end(&mut self, body: String) {
        if self.is_ended() {
            tracing::warn!("Ignoring second end of response");
            return;
        }
        self.body = Some(body);
    }
}

impl IntoResponse for BufferedResponse {
    fn into_response(self) -> Response {
        let mut response = (self.status, self.body.unwrap_or_default()).into_response();
        // The recorded headers win over the defaults axum adds for a String body.
        for (name, value) in self.headers.iter() {
            response.headers_mut().insert(name.clone(), value.clone());
        }
        response
    }
}

/// HTTP status for an error escaping the handler.
pub fn error_status(err: &MockError) -> StatusCode {
    match err {
        MockError::Body(_) => StatusCode::BAD_REQUEST,
        MockError::Upstream(_) | MockError::Http(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Plain-text error response.
pub fn error_response(err: &MockError) -> Response {
    (error_status(err), err.to_string()).into_response()
}
