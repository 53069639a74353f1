use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Tape directory and recording configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TapesConfig {
    /// Directory holding one JSON file per tape.
    #[serde(default = "default_tapes_dir")]
    pub dir: PathBuf,

    /// Record missing tapes against the upstream instead of failing.
    #[serde(default)]
    pub record: bool,

    /// Base URL of the real identity provider, used when recording.
    #[serde(default)]
    pub upstream: Option<String>,

    /// Extra headers sent upstream when recording, e.g. an API token.
    /// Never written into tapes.
    #[serde(default)]
    pub upstream_headers: BTreeMap<String, String>,
}

impl Default for TapesConfig {
    fn default() -> Self {
        Self {
            dir: default_tapes_dir(),
            record: false,
            upstream: None,
            upstream_headers: BTreeMap::new(),
        }
    }
}

fn default_tapes_dir() -> PathBuf {
    PathBuf::from("tapes")
}

/// Request standardization configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardizeConfig {
    /// Header names dropped before matching. Compared case-insensitively.
    #[serde(default = "default_ignored_headers")]
    pub ignored_headers: Vec<String>,
}

impl Default for StandardizeConfig {
    fn default() -> Self {
        Self {
            ignored_headers: default_ignored_headers(),
        }
    }
}

fn default_ignored_headers() -> Vec<String> {
    [
        "host",
        "connection",
        "content-length",
        "user-agent",
        "accept-encoding",
        "date",
        "authorization",
        "x-okta-user-agent-extended",
        "x-request-id",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
