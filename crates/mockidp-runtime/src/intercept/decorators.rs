//! Response decorators composed by the request handler.

use std::sync::Arc;

use axum::http::StatusCode;
use mockidp_core::protocol::{MISSING_DESCRIPTION, RECORDING_DISABLED, TAPE_HEADER};
use mockidp_core::{pretty_json, RequestSummary, StandardizedRequest, TapeDetail, UnusedTapes};
use serde::Serialize;

use crate::gateway::ResponseSink;

/// Removes a tape from the unused set when the tape header is set.
pub struct TapeTracking<S> {
    inner: S,
    unused: UnusedTapes,
}

impl<S: ResponseSink> TapeTracking<S> {
    pub fn new(inner: S, unused: UnusedTapes) -> Self {
        Self { inner, unused }
    }
}

impl<S: ResponseSink> ResponseSink for TapeTracking<S> {
    fn set_status(&mut self, status: StatusCode) {
        self.inner.set_status(status)
    }

    fn set_header(&mut self, name: &str, value: &str) {
        if name.eq_ignore_ascii_case(TAPE_HEADER) && self.unused.remove(value) {
            tracing::debug!("Tape {} used", value);
        }
        self.inner.set_header(name, value)
    }

    fn end(&mut self, body: String) {
        self.inner.end(body)
    }
}

/// Diagnostic body sent instead of the "Recording Disabled" sentinel.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingTapeReport<'a> {
    pub req: &'a RequestSummary,
    pub standard_req: RequestSummary,
    pub possible_tapes: Vec<&'a TapeDetail>,
}

impl<'a> MissingTapeReport<'a> {
    /// Build the report, or `None` if the request has no test description.
    /// An empty description counts as none.
    ///
    /// Possible tapes are every known tape with the same method as the
    /// original request and the same test description. All matches are
    /// listed.
    pub fn build(
        original: &'a RequestSummary,
        standard: &StandardizedRequest,
        tape_details: &'a [TapeDetail],
    ) -> Option<Self> {
        let description = standard.test_description().filter(|d| !d.is_empty())?;
        let possible_tapes = tape_details
            .iter()
            .filter(|detail| detail.matches(&original.method, description))
            .collect();

        Some(Self {
            req: original,
            standard_req: standard.summary(),
            possible_tapes,
        })
    }
}

/// Replaces the "Recording Disabled" sentinel body with a diagnostic.
pub struct MissingTapeDiagnostics<S> {
    inner: S,
    original: RequestSummary,
    standard: StandardizedRequest,
    tape_details: Arc<Vec<TapeDetail>>,
}

impl<S: ResponseSink> MissingTapeDiagnostics<S> {
    pub fn new(
        inner: S,
        original: RequestSummary,
        standard: StandardizedRequest,
        tape_details: Arc<Vec<TapeDetail>>,
    ) -> Self {
        Self {
            inner,
            original,
            standard,
            tape_details,
        }
    }

    fn diagnostic(&self) -> String {
        match MissingTapeReport::build(&self.original, &self.standard, &self.tape_details) {
            Some(report) => match pretty_json(&report) {
                Ok(rendered) => rendered,
                Err(e) => {
                    tracing::error!("Failed to render missing tape report: {}", e);
                    RECORDING_DISABLED.to_string()
                }
            },
            None => MISSING_DESCRIPTION.to_string(),
        }
    }
}

impl<S: ResponseSink> ResponseSink for MissingTapeDiagnostics<S> {
    fn set_status(&mut self, status: StatusCode) {
        self.inner.set_status(status)
    }

    fn set_header(&mut self, name: &str, value: &str) {
        self.inner.set_header(name, value)
    }

    fn end(&mut self, body: String) {
        if body != RECORDING_DISABLED {
            return self.inner.end(body);
        }
        let diagnostic = self.diagnostic();
        tracing::warn!(
            method = %self.original.method,
            url = %self.original.url,
            diagnostic = ?diagnostic,
            "No tape for request"
        );
        self.inner.end(diagnostic)
    }
}
