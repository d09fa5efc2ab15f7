//! GitHub release API client
//!
//! Fetches Tailwind release metadata and downloads release assets.

use crate::download::download_to;
use crate::error::{Error, Result};
use crate::types::{Release, ReleaseAsset};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::StatusCode;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://api.github.com/repos/tailwindlabs/tailwindcss";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for one repository's releases.
///
/// The underlying connection pool lives as long as this value; build one per
/// task execution and let it drop.
#[derive(Debug, Clone)]
pub struct ReleaseClient {
    http: reqwest::Client,
    api_base: String,
}

impl ReleaseClient {
    pub fn new() -> Result<Self> {
        Self::with_options(DEFAULT_API_BASE, DEFAULT_TIMEOUT)
    }

    /// Build a client for `api_base` (`https://host/repos/{owner}/{repo}`).
    pub fn with_options(api_base: &str, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        // GitHub rejects unauthenticated requests without a user agent.
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("tailwind-build/", env!("CARGO_PKG_VERSION"))),
        );

        if let Ok(token) = std::env::var("GITHUB_TOKEN") {
            match HeaderValue::from_str(&format!("token {}", token)) {
                Ok(value) => {
                    headers.insert(AUTHORIZATION, value);
                    tracing::debug!("Using GITHUB_TOKEN");
                }
                Err(_) => tracing::warn!("Ignoring GITHUB_TOKEN: not a valid header value"),
            }
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Fetch the release tagged `tag`, or the newest release for `latest`.
    pub async fn get_release(&self, tag: &str) -> Result<Release> {
        let url = build_release_url(&self.api_base, tag);
        tracing::debug!("Fetching release info from: {}", url);

        let response = self
            .http
            .get(&url)
            .header(ACCEPT, "application/vnd.github+json")
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(Error::ReleaseNotFound {
                tag: tag.to_string(),
            });
        }
        if !status.is_success() {
            return Err(Error::RequestFailed { url, status });
        }

        let release: Release = response.json().await?;
        tracing::debug!(
            "Release {} has {} asset(s)",
            release.tag_name,
            release.assets.len()
        );
        Ok(release)
    }

    /// Download `asset` to `dest`. Returns the number of bytes written.
    ///
    /// `dest` is only replaced once the full body has arrived.
    pub async fn download_asset(&self, asset: &ReleaseAsset, dest: &Path) -> Result<u64> {
        tracing::debug!("Downloading {} from {}", asset.name, asset.browser_download_url);

        let response = self
            .http
            .get(&asset.browser_download_url)
            .header(ACCEPT, "application/octet-stream")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::RequestFailed {
                url: asset.browser_download_url.clone(),
                status,
            });
        }

        download_to(response, &asset.name, dest).await
    }
}

/// Build the release endpoint for `tag` under `api_base`.
///
/// `latest` selects the newest release. A tag starting with a digit gets a
/// `v` prefix, matching how Tailwind tags its releases.
pub fn build_release_url(api_base: &str, tag: &str) -> String {
    let api_base = api_base.trim_end_matches('/');
    if tag.is_empty() || tag == "latest" {
        return format!("{}/releases/latest", api_base);
    }

    let numeric = tag.chars().next().is_some_and(|c| c.is_ascii_digit());
    let tag = if numeric && !tag.contains('/') {
        format!("v{}", tag)
    } else {
        tag.to_string()
    };
    format!("{}/releases/tags/{}", api_base, tag)
}
