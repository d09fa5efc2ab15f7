use std::path::PathBuf;
use std::time::Duration;

use reqwest::StatusCode;

/// Errors raised while provisioning or running the Tailwind CLI.
///
/// Variants fall into the same groups the build tasks report:
/// - configuration errors (unsupported platform, unknown release or asset)
/// - network errors (transport failures, unexpected statuses, short bodies)
/// - filesystem errors (install verification, lock file I/O)
/// - process errors (launch failures, timeouts)
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// No standalone CLI build is published for this OS and architecture.
    #[error("unsupported platform: no Tailwind CLI build for {os}/{arch}")]
    UnsupportedPlatform { os: String, arch: String },

    /// The release API returned 404 for the requested tag.
    #[error("Tailwind release '{tag}' not found")]
    ReleaseNotFound { tag: String },

    #[error("request to {url} failed with status {status}")]
    RequestFailed { url: String, status: StatusCode },

    /// The release exists but carries no asset for this platform.
    #[error("unable to find a download link for '{asset}' with Tailwind version '{version}'")]
    AssetNotFound { asset: String, version: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The connection closed before the declared body length arrived.
    #[error("download of {url} ended after {received} of {expected} bytes")]
    IncompleteDownload {
        url: String,
        expected: u64,
        received: u64,
    },

    #[error("unable to download the Tailwind CLI to '{}'", path.display())]
    WriteVerificationFailed { path: PathBuf },

    #[error("failed to start '{}': {source}", path.display())]
    LaunchFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("'{}' did not exit within {:?}", path.display(), timeout)]
    ProcessTimedOut { path: PathBuf, timeout: Duration },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode lock file: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
