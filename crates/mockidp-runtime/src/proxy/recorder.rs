use std::collections::BTreeMap;

use mockidp_core::config::TapesConfig;
use mockidp_core::error::{MockError, Result};
use mockidp_core::protocol::TEST_DESCRIPTION_HEADER;
use mockidp_core::{StandardizedRequest, TapeResponse};
use reqwest::{Client, Method};

/// Response headers that describe the upstream connection, not the payload.
const SKIPPED_RESPONSE_HEADERS: &[&str] = &[
    "connection",
    "content-encoding",
    "content-length",
    "keep-alive",
    "transfer-encoding",
];

/// Forwards requests to the real identity provider to capture new tapes.
#[derive(Debug, Clone)]
pub struct Recorder {
    client: Client,
    upstream: String,
    headers: BTreeMap<String, String>,
}

impl Recorder {
    /// Create a recorder for the given upstream base URL.
    pub fn new(upstream: impl Into<String>, headers: BTreeMap<String, String>) -> Self {
        Self {
            client: Client::new(),
            upstream: upstream.into().trim_end_matches('/').to_string(),
            headers,
        }
    }

    /// Build a recorder if recording is enabled.
    pub fn from_config(config: &TapesConfig) -> Result<Option<Self>> {
        if !config.record {
            return Ok(None);
        }
        let upstream = config.upstream.as_deref().ok_or_else(|| {
            MockError::Config("Recording is enabled but no upstream is configured".to_string())
        })?;
        Ok(Some(Self::new(upstream, config.upstream_headers.clone())))
    }

    pub fn upstream(&self) -> &str {
        &self.upstream
    }

    /// Send the request upstream and capture its response.
    pub async fn record(&self, request: &StandardizedRequest) -> Result<TapeResponse> {
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|e| MockError::Upstream(format!("Invalid method {}: {}", request.method, e)))?;
        let url = format!("{}{}", self.upstream, request.url);

        tracing::info!("Recording {} {}", request.method, url);

        let mut builder = self.client.request(method, &url);
        for (name, value) in &request.headers {
            if name != TEST_DESCRIPTION_HEADER {
                builder = builder.header(name.as_str(), value.as_str());
            }
        }
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !request.body.is_empty() {
            builder = builder.body(request.body.clone());
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter(|(name, _)| !SKIPPED_RESPONSE_HEADERS.contains(&name.as_str()))
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response.text().await?;

        Ok(TapeResponse {
            status,
            headers,
            body,
        })
    }
}
