//! Release feed client.
//!
//! The release feed is the JSON document published at
//! `https://go.dev/dl/?mode=json&include=all`: a flat array of releases, each
//! carrying its artifacts.
//!
//! ```json
//! [
//!   {
//!     "version": "go1.21.3",
//!     "stable": true,
//!     "files": [
//!       {
//!         "filename": "go1.21.3.linux-amd64.tar.gz",
//!         "os": "linux",
//!         "arch": "amd64",
//!         "version": "go1.21.3",
//!         "sha256": "1241381b...",
//!         "size": 66641205,
//!         "kind": "archive"
//!       }
//!     ]
//!   }
//! ]
//! ```
//!
//! Fetching is abstracted behind [`ReleaseFeed`] so the catalog can be tested
//! without network access. [`HttpFeed`] is the production implementation. The
//! feed URL can be overridden with the `GOM_DIST_SERVER` environment variable
//! for testing or when using a mirror.

use std::future::Future;
use std::time::Duration;

use crate::errors::{GomError, Result};

/// Environment variable to override the release feed URL.
pub const DIST_SERVER_ENV: &str = "GOM_DIST_SERVER";

/// Default release feed URL, including unstable releases.
pub const DEFAULT_FEED_URL: &str = "https://go.dev/dl/?mode=json&include=all";

/// Base URL that artifact filenames are resolved against.
pub const DOWNLOAD_BASE: &str = "https://go.dev/dl/";

/// Request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// User-Agent header for HTTP requests.
pub(crate) const USER_AGENT: &str = concat!("gom/", env!("CARGO_PKG_VERSION"));

/// Source of the raw release feed document.
pub trait ReleaseFeed: Sync {
    /// The URL the feed is read from, used in diagnostics.
    fn url(&self) -> &str;

    /// Retrieves the feed body.
    ///
    /// Implementations return [`GomError::FetchError`] on transport failure or a
    /// non-success status.
    fn get(&self) -> impl Future<Output = Result<String>> + Send;
}

/// Release feed over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpFeed {
    client: reqwest::Client,
    url: String,
}

impl HttpFeed {
    /// Creates a feed client for [`feed_url`] routed through `proxies`.
    ///
    /// # Errors
    ///
    /// Returns [`GomError::FetchError`] if a proxy URL is invalid or the client
    /// cannot be built.
    pub fn new(proxies: &[String]) -> Result<Self> {
        Self::with_url(feed_url(), proxies)
    }

    /// Creates a feed client for an explicit URL.
    ///
    /// # Errors
    ///
    /// Returns [`GomError::FetchError`] if a proxy URL is invalid or the client
    /// cannot be built.
    pub fn with_url(url: impl Into<String>, proxies: &[String]) -> Result<Self> {
        let url = url.into();
        let client = http_client(proxies, Some(Duration::from_secs(REQUEST_TIMEOUT_SECS)))
            .map_err(|e| GomError::fetch_error(&url, e.to_string()))?;
        Ok(Self { client, url })
    }
}

impl ReleaseFeed for HttpFeed {
    fn url(&self) -> &str {
        &self.url
    }

    async fn get(&self) -> Result<String> {
        tracing::debug!(url = %self.url, "fetching release feed");

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| GomError::fetch_error(&self.url, e.to_string()))?;

        if !response.status().is_success() {
            return Err(handle_http_error(response.status(), &self.url));
        }

        response
            .text()
            .await
            .map_err(|e| GomError::fetch_error(&self.url, format!("failed to read body: {e}")))
    }
}

/// Builds a reqwest client with the gom user agent and the given proxies.
///
/// Every proxy is registered for all schemes; reqwest tries them in order.
pub(crate) fn http_client(
    proxies: &[String],
    timeout: Option<Duration>,
) -> std::result::Result<reqwest::Client, reqwest::Error> {
    let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    for proxy in proxies.iter().map(|p| p.trim()).filter(|p| !p.is_empty()) {
        builder = builder.proxy(reqwest::Proxy::all(proxy)?);
    }
    builder.build()
}

/// Returns the release feed URL.
///
/// Checks the `GOM_DIST_SERVER` environment variable first, then falls back to
/// [`DEFAULT_FEED_URL`]. Empty or whitespace-only values are treated as unset.
#[must_use]
pub fn feed_url() -> String {
    std::env::var(DIST_SERVER_ENV)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_FEED_URL.to_string())
}

/// Maps a non-success status to a `FetchError` with a readable message.
fn handle_http_error(status: reqwest::StatusCode, url: &str) -> GomError {
    match status.as_u16() {
        404 => GomError::fetch_error(url, "release feed not found (HTTP 404)"),
        code if code >= 500 => GomError::fetch_error(url, format!("server error (HTTP {code})")),
        code => GomError::fetch_error(url, format!("HTTP {code}")),
    }
}
