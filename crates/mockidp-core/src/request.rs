//! Request standardization.
//!
//! Incoming requests are reduced to a stable form before they are matched
//! against tapes: header names are lowercased and volatile headers dropped,
//! query parameters are sorted, and JSON bodies are re-serialized with
//! sorted keys. Two requests that differ only in those respects produce
//! the same [`StandardizedRequest`] and therefore the same tape name.

use std::collections::{BTreeMap, HashSet};

use bytes::Bytes;
use http_body_util::{BodyExt, Limited};
use hyper::body::Body;
use hyper::http::request::Parts;
use hyper::http::HeaderMap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::StandardizeConfig;
use crate::error::{MockError, Result};
use crate::protocol::TEST_DESCRIPTION_HEADER;

/// Headers, method and URL of a request, as shown in diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestSummary {
    pub headers: BTreeMap<String, String>,
    pub method: String,
    pub url: String,
}

impl RequestSummary {
    /// Summarize a request exactly as received.
    pub fn from_parts(parts: &Parts) -> Self {
        Self {
            headers: flatten_headers(&parts.headers, |_| true),
            method: parts.method.as_str().to_string(),
            url: parts
                .uri
                .path_and_query()
                .map(|pq| pq.as_str().to_string())
                .unwrap_or_else(|| "/".to_string()),
        }
    }
}

/// Normalized view of a request, derived once and used for matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardizedRequest {
    pub method: String,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub body: String,
}

impl StandardizedRequest {
    /// Look up a header by lowercase name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// The free-text test description, if the request carries one.
    pub fn test_description(&self) -> Option<&str> {
        self.header(TEST_DESCRIPTION_HEADER)
    }

    pub fn summary(&self) -> RequestSummary {
        RequestSummary {
            headers: self.headers.clone(),
            method: self.method.clone(),
            url: self.url.clone(),
        }
    }

    /// Deterministic tape name: hex SHA-256 over method, URL, headers and body.
    pub fn tape_name(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.method.as_bytes());
        hasher.update(b"\n");
        hasher.update(self.url.as_bytes());
        hasher.update(b"\n");
        for (name, value) in &self.headers {
            hasher.update(name.as_bytes());
            hasher.update(b":");
            hasher.update(value.as_bytes());
            hasher.update(b"\n");
        }
        hasher.update(b"\n");
        hasher.update(self.body.as_bytes());

        hasher
            .finalize()
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect()
    }
}

/// Turns raw requests into [`StandardizedRequest`]s.
#[derive(Debug, Clone)]
pub struct Standardizer {
    ignored_headers: HashSet<String>,
    body_limit: usize,
}

impl Standardizer {
    /// Create a standardizer dropping the given headers.
    pub fn new<I, S>(ignored_headers: I, body_limit: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            ignored_headers: ignored_headers
                .into_iter()
                .map(|h| h.as_ref().to_ascii_lowercase())
                .collect(),
            body_limit,
        }
    }

    pub fn from_config(config: &StandardizeConfig, body_limit: usize) -> Self {
        Self::new(&config.ignored_headers, body_limit)
    }

    /// Collect the body and standardize the request.
    pub async fn standardize<B>(&self, parts: &Parts, body: B) -> Result<StandardizedRequest>
    where
        B: Body<Data = Bytes>,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let collected = Limited::new(body, self.body_limit)
            .collect()
            .await
            .map_err(|e| MockError::Body(e.to_string()))?
            .to_bytes();

        Ok(self.standardize_bytes(parts, &collected))
    }

    /// Standardize a request whose body is already in memory.
    pub fn standardize_bytes(&self, parts: &Parts, body: &[u8]) -> StandardizedRequest {
        let path = parts.uri.path();
        let url = match parts.uri.query() {
            Some(query) if !query.is_empty() => format!("{}?{}", path, sort_query(query)),
            _ => path.to_string(),
        };

        StandardizedRequest {
            method: parts.method.as_str().to_ascii_uppercase(),
            url,
            headers: flatten_headers(&parts.headers, |name| !self.ignored_headers.contains(name)),
            body: normalize_body(body),
        }
    }
}

/// Collapse a header map into lowercase name -> comma-joined values.
fn flatten_headers(headers: &HeaderMap, keep: impl Fn(&str) -> bool) -> BTreeMap<String, String> {
    let mut flat: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let name = name.as_str();
        if !keep(name) {
            continue;
        }
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        flat.entry(name.to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    flat
}

/// Sort `k=v` pairs by key, keeping the order of repeated keys.
fn sort_query(query: &str) -> String {
    let mut pairs: Vec<&str> = query.split('&').filter(|p| !p.is_empty()).collect();
    pairs.sort_by(|a, b| query_key(a).cmp(query_key(b)));
    pairs.join("&")
}

fn query_key(pair: &str) -> &str {
    pair.split_once('=').map(|(k, _)| k).unwrap_or(pair)
}

fn normalize_body(body: &[u8]) -> String {
    if body.is_empty() {
        return String::new();
    }
    // serde_json maps are ordered, so a round trip sorts object keys
    match serde_json::from_slice::<serde_json::Value>(body) {
        Ok(value) => value.to_string(),
        Err(_) => String::from_utf8_lossy(body).into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::Full;
    use hyper::http::Request;

    fn parts(method: &str, uri: &str, headers: &[(&str, &str)]) -> Parts {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    fn standardizer() -> Standardizer {
        Standardizer::from_config(&StandardizeConfig::default(), 1024)
    }

    #[test]
    fn test_drops_ignored_headers() {
        let p = parts(
            "GET",
            "/api/v1/users/me",
            &[
                ("Host", "localhost:3000"),
                ("User-Agent", "okta-sdk-java/1.0"),
                ("Accept", "application/json"),
            ],
        );
        let req = standardizer().standardize_bytes(&p, b"");
        assert_eq!(req.headers.len(), 1);
        assert_eq!(req.header("accept"), Some("application/json"));
        assert_eq!(req.header("host"), None);
    }

    #[test]
    fn test_sorts_query_parameters() {
        let p = parts("get", "/api/v1/users?limit=20&filter=status&after=abc", &[]);
        let req = standardizer().standardize_bytes(&p, b"");
        assert_eq!(req.method, "GET");
        assert_eq!(req.url, "/api/v1/users?after=abc&filter=status&limit=20");
    }

    #[test]
    fn test_repeated_query_keys_keep_order() {
        let p = parts("GET", "/search?b=1&a=2&b=0", &[]);
        let req = standardizer().standardize_bytes(&p, b"");
        assert_eq!(req.url, "/search?a=2&b=1&b=0");
    }

    #[test]
    fn test_json_body_keys_sorted() {
        let p = parts("POST", "/api/v1/sessions", &[]);
        let a = standardizer().standardize_bytes(&p, br#"{"sessionToken":"x","additionalFields":1}"#);
        let b = standardizer().standardize_bytes(&p, br#"{ "additionalFields": 1, "sessionToken": "x" }"#);
        assert_eq!(a.body, r#"{"additionalFields":1,"sessionToken":"x"}"#);
        assert_eq!(a, b);
        assert_eq!(a.tape_name(), b.tape_name());
    }

    #[test]
    fn test_non_json_body_kept() {
        let p = parts("POST", "/oauth2/v1/token", &[]);
        let req = standardizer().standardize_bytes(&p, b"grant_type=password&username=a");
        assert_eq!(req.body, "grant_type=password&username=a");
    }

    #[test]
    fn test_tape_name_stable_across_volatile_headers() {
        let a = parts(
            "POST",
            "/api/v1/sessions?b=2&a=1",
            &[("X-Test-Description", "refresh session"), ("User-Agent", "one")],
        );
        let b = parts(
            "POST",
            "/api/v1/sessions?a=1&b=2",
            &[("x-test-description", "refresh session"), ("Date", "today")],
        );
        let s = standardizer();
        let name = s.standardize_bytes(&a, b"").tape_name();
        assert_eq!(name, s.standardize_bytes(&b, b"").tape_name());
        assert_eq!(name.len(), 64);
    }

    #[test]
    fn test_tape_name_differs_by_description() {
        let s = standardizer();
        let a = s.standardize_bytes(&parts("GET", "/", &[("x-test-description", "a")]), b"");
        let b = s.standardize_bytes(&parts("GET", "/", &[("x-test-description", "b")]), b"");
        assert_ne!(a.tape_name(), b.tape_name());
        assert_eq!(a.test_description(), Some("a"));
    }

    #[test]
    fn test_default_ignored_headers() {
        let s = standardizer();
        let a = parts(
            "GET",
            "/api/v1/users/me",
            &[
                ("X-Request-Id", "req-1"),
                ("Authorization", "SSWS one"),
                ("X-Okta-User-Agent-Extended", "okta-auth-js/7.0"),
                ("Connection", "keep-alive"),
                ("Accept-Encoding", "gzip"),
            ],
        );
        let b = parts("GET", "/api/v1/users/me", &[("x-request-id", "req-2")]);

        let req = s.standardize_bytes(&a, b"");
        assert!(req.headers.is_empty());
        assert_eq!(req.tape_name(), s.standardize_bytes(&b, b"").tape_name());
    }

    #[test]
    fn test_summary_keeps_original_request() {
        let p = parts("POST", "/api/v1/sessions?z=1&a=2", &[("User-Agent", "sdk")]);
        let summary = RequestSummary::from_parts(&p);
        assert_eq!(summary.method, "POST");
        assert_eq!(summary.url, "/api/v1/sessions?z=1&a=2");
        assert_eq!(summary.headers.get("user-agent").map(String::as_str), Some("sdk"));
    }

    #[test]
    fn test_repeated_headers_joined() {
        let p = parts("GET", "/", &[("accept", "a"), ("accept", "b")]);
        let req = standardizer().standardize_bytes(&p, b"");
        assert_eq!(req.header("accept"), Some("a, b"));
    }

    #[tokio::test]
    async fn test_standardize_collects_body() {
        let p = parts("POST", "/api/v1/authn", &[]);
        let body = Full::new(Bytes::from_static(br#"{"username":"u"}"#));
        let req = standardizer().standardize(&p, body).await.unwrap();
        assert_eq!(req.body, r#"{"username":"u"}"#);
    }

    #[tokio::test]
    async fn test_standardize_rejects_oversized_body() {
        let p = parts("POST", "/api/v1/authn", &[]);
        let body = Full::new(Bytes::from(vec![b'a'; 2048]));
        let result = standardizer().standardize(&p, body).await;
        assert!(matches!(result, Err(MockError::Body(_))));
    }
}
