//! Client for test suites talking to a running mock server.
//!
//! Every request made through a described client carries the
//! `x-test-description` header, which is what ties a request to the tape
//! recorded for that test.

use reqwest::{Client, Method, RequestBuilder};

use crate::error::{MockError, Result};
use crate::protocol::{TEST_DESCRIPTION_HEADER, UNUSED_TAPES_PATH};
use crate::tape::TapeDetail;

/// HTTP client bound to a mock server and, optionally, a test description.
#[derive(Debug, Clone)]
pub struct ScenarioClient {
    client: Client,
    base_url: String,
    description: Option<String>,
}

impl ScenarioClient {
    /// Create a client for the server at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            description: None,
        }
    }

    /// A client whose requests are tagged with `description`.
    pub fn describe(&self, description: impl Into<String>) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            description: Some(description.into()),
        }
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Start a request, stamped with the test description if there is one.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match &self.description {
            Some(description) => builder.header(TEST_DESCRIPTION_HEADER, description.as_str()),
            None => builder,
        }
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.request(Method::GET, path)
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        self.request(Method::POST, path)
    }

    pub fn put(&self, path: &str) -> RequestBuilder {
        self.request(Method::PUT, path)
    }

    pub fn delete(&self, path: &str) -> RequestBuilder {
        self.request(Method::DELETE, path)
    }

    /// Fetch the tapes the server has not replayed yet.
    pub async fn unused_tapes(&self) -> Result<Vec<TapeDetail>> {
        let response = self
            .client
            .get(self.url(UNUSED_TAPES_PATH))
            .send()
            .await?
            .error_for_status()?;
        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| MockError::Serialization(format!("Unexpected unused-tapes body: {}", e)))
    }

    /// Panic if any tape in the server's directory was never replayed.
    pub async fn assert_all_tapes_used(&self) {
        let unused = match self.unused_tapes().await {
            Ok(unused) => unused,
            Err(e) => panic!("Failed to fetch unused tapes: {}", e),
        };
        assert!(
            unused.is_empty(),
            "Expected every tape to be used, but {} remain: {:?}",
            unused.len(),
            unused
                .iter()
                .map(|t| format!("{} {} ({})", t.method, t.url, t.tape))
                .collect::<Vec<_>>()
        );
    }
}
