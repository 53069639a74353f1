//! Recorded request/response fixtures.
//!
//! A tape is one JSON file in the tape directory. Its file stem is the
//! tape name, which is the hash of the standardized request it answers.

mod store;
mod unused;

pub use store::{get_tape_details, TapeStore};
pub use unused::UnusedTapes;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::protocol::TEST_DESCRIPTION_HEADER;
use crate::request::StandardizedRequest;

/// A recorded request/response pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tape {
    /// Tape name (file stem). Not part of the file contents.
    #[serde(skip)]
    pub name: String,
    /// The standardized request this tape answers.
    pub request: StandardizedRequest,
    /// The recorded response.
    pub response: TapeResponse,
}

impl Tape {
    /// Build a tape for a request, naming it after the request hash.
    pub fn new(request: StandardizedRequest, response: TapeResponse) -> Self {
        Self {
            name: request.tape_name(),
            request,
            response,
        }
    }

    /// Summary used by diagnostics.
    pub fn detail(&self) -> TapeDetail {
        TapeDetail {
            tape: self.name.clone(),
            method: self.request.method.clone(),
            url: self.request.url.clone(),
            headers: self.request.headers.clone(),
        }
    }
}

/// A recorded response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TapeResponse {
    pub status: u16,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub body: String,
}

/// Descriptive view of a tape: what request it answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TapeDetail {
    pub tape: String,
    pub method: String,
    pub url: String,
    pub headers: BTreeMap<String, String>,
}

impl TapeDetail {
    pub fn test_description(&self) -> Option<&str> {
        self.headers.get(TEST_DESCRIPTION_HEADER).map(String::as_str)
    }

    /// Whether this tape could answer a request with the given method and
    /// test description. Both must match exactly.
    pub fn matches(&self, method: &str, description: &str) -> bool {
        self.method == method && self.test_description() == Some(description)
    }
}
