//! Latest-release lookup against the release-hosting API.
//!
//! The API is GitHub compatible: `GET {api}/repos/{owner}/{name}/releases/latest`
//! returns the tag and the list of downloadable assets.
//!
//! ```json
//! {
//!   "tag_name": "v0.4.1",
//!   "assets": [
//!     {
//!       "name": "lux-linux-x86_64",
//!       "browser_download_url": "https://github.com/lux-runtime/lux/releases/download/v0.4.1/lux-linux-x86_64"
//!     }
//!   ]
//! }
//! ```
//!
//! Lookup failures of any kind (transport, HTTP status, payload shape) are
//! reported as "no release". The cause is logged, not returned.

use anyhow::{Context, Result};
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;
use std::time::Duration;

/// Request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 300;

/// Timeout for establishing a connection, in seconds.
const CONNECT_TIMEOUT_SECS: u64 = 30;

/// User-Agent header for HTTP requests.
const USER_AGENT: &str = concat!("lux-install/", env!("CARGO_PKG_VERSION"));

/// Media type requested from the release API.
const GITHUB_JSON: &str = "application/vnd.github+json";

/// A downloadable file attached to a release.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Asset {
    /// File name as published.
    pub name: String,
    /// Direct download URL.
    #[serde(rename = "browser_download_url")]
    pub url: String,
}

/// The newest published release of a repository.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ReleaseInfo {
    /// Release tag, e.g. `v0.4.1`.
    #[serde(rename = "tag_name")]
    pub tag: String,
    /// Assets in the order the API lists them.
    #[serde(default)]
    pub assets: Vec<Asset>,
}

/// HTTP client for release lookups and artifact transfers.
#[derive(Debug, Clone)]
pub struct ReleaseClient {
    http: reqwest::Client,
    api_url: String,
}

impl ReleaseClient {
    /// Builds a client for `api_url`, authenticating with `token` when given.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is not a valid header value or the
    /// underlying HTTP client cannot be constructed.
    pub fn new(api_url: &str, token: Option<&str>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(token) = token {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .context("GITHUB_TOKEN contains characters not allowed in a header")?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }

    /// Returns the underlying HTTP client.
    #[must_use]
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Returns the latest-release endpoint for `repository`.
    #[must_use]
    pub fn latest_release_url(&self, repository: &str) -> String {
        format!("{}/repos/{repository}/releases/latest", self.api_url)
    }

    /// Fetches the latest published release of `repository` (`owner/name`).
    ///
    /// Returns `None` when the repository has no release or the lookup fails
    /// for any reason.
    pub async fn latest_release(&self, repository: &str) -> Option<ReleaseInfo> {
        match self.fetch_latest(repository).await {
            Ok(release) => {
                log::info!(
                    "{repository}: latest release {} with {} assets",
                    release.tag,
                    release.assets.len()
                );
                Some(release)
            }
            Err(e) => {
                log::warn!("{repository}: no release available: {e:#}");
                None
            }
        }
    }

    async fn fetch_latest(&self, repository: &str) -> Result<ReleaseInfo> {
        let url = self.latest_release_url(repository);
        log::debug!("GET {url}");

        let response = self
            .http
            .get(&url)
            .header(ACCEPT, GITHUB_JSON)
            .send()
            .await
            .with_context(|| format!("Failed to fetch release from {url}"))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("HTTP error {status}: {url}");
        }

        let text = response
            .text()
            .await
            .with_context(|| format!("Failed to read response from {url}"))?;

        serde_json::from_str(&text).with_context(|| format!("Failed to parse release from {url}"))
    }
}
