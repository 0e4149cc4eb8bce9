//! Catalog configuration.
//!
//! [`CatalogConfig`] holds everything that ties the crate to a concrete set of
//! hosts: the catalog mirrors tried for the result table, the URL markers the
//! mirror classifier looks for, and the transport settings of the HTTP client.
//! The defaults reproduce the public Library Genesis mirror network.
//!
//! A configuration can be loaded from JSON; missing keys fall back to their
//! defaults:
//!
//! ```rust
//! use bookwyrm::config::CatalogConfig;
//! use bookwyrm::types::RowPolicy;
//!
//! let config = CatalogConfig::from_json_str(r#"{
//!     "mirrors": ["http://libgen.example"],
//!     "row_policy": "strict"
//! }"#).unwrap();
//!
//! assert_eq!(config.mirrors, vec!["http://libgen.example"]);
//! assert_eq!(config.row_policy, RowPolicy::Strict);
//! assert_eq!(config.form_trigger_marker, "golibgen");
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{error::Result, net::HttpClient, types::RowPolicy};

/// Default catalog mirrors, tried in order.
pub const DEFAULT_MIRRORS: [&str; 2] = ["http://libgen.io", "http://gen.lib.rus.ec"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Base URLs (scheme and host) of the catalog mirrors, in failover order
    pub mirrors: Vec<String>,
    /// Substring identifying links to the form-trigger mirror
    pub form_trigger_marker: String,
    /// Host the reconstructed form-trigger download URL points at
    pub form_trigger_host: String,
    /// Substring identifying links to the direct-hosting mirror
    pub direct_host_marker: String,
    /// Path prefix of site-relative torrent-listing links
    pub torrent_path_prefix: String,
    pub user_agent: String,
    /// Minimum delay between two requests, in milliseconds
    pub rate_limit_ms: u64,
    pub max_retries: u32,
    /// Keep response bodies in memory and answer repeated GETs from there
    pub cache_responses: bool,
    pub row_policy: RowPolicy,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            mirrors: DEFAULT_MIRRORS.iter().map(|m| m.to_string()).collect(),
            form_trigger_marker: "golibgen".to_string(),
            form_trigger_host: "golibgen.io".to_string(),
            direct_host_marker: "bookzz".to_string(),
            torrent_path_prefix: "/ads".to_string(),
            user_agent: "Mozilla/5.0 (X11; Linux x86_64; rv:57.0) Gecko/20100101 Firefox/57.0"
                .to_string(),
            rate_limit_ms: 500,
            max_retries: 2,
            cache_responses: false,
            row_policy: RowPolicy::Skip,
        }
    }
}

impl CatalogConfig {
    /// Parses a configuration from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Replaces the catalog mirror list.
    pub fn with_mirrors<I, S>(mut self, mirrors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mirrors = mirrors.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_row_policy(mut self, policy: RowPolicy) -> Self {
        self.row_policy = policy;
        self
    }

    pub fn with_rate_limit(mut self, delay_ms: u64) -> Self {
        self.rate_limit_ms = delay_ms;
        self
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.cache_responses = enabled;
        self
    }

    /// Builds the HTTP client described by the transport settings.
    pub fn http_client(&self) -> HttpClient {
        HttpClient::new("libgen")
            .with_rate_limit(self.rate_limit_ms)
            .with_max_retries(self.max_retries)
            .with_header("User-Agent", &self.user_agent)
            .with_header(
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .with_cache(self.cache_responses)
    }
}
