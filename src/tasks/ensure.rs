use crate::error::Result;
use crate::github::{ReleaseClient, DEFAULT_API_BASE, DEFAULT_TIMEOUT};
use crate::install::Installer;
use crate::log::TaskLog;
use crate::platform::PlatformKey;
use std::path::PathBuf;
use std::time::Duration;

/// Makes sure the standalone Tailwind CLI for `version` is installed under
/// `root_install_path`, downloading it if needed.
///
/// Output: [`standalone_cli_path`](Self::standalone_cli_path).
#[derive(Debug, Clone)]
pub struct EnsureTailwindCli {
    pub version: String,
    pub root_install_path: PathBuf,
    pub api_base: String,
    pub http_timeout: Duration,
    pub standalone_cli_path: Option<PathBuf>,
}

impl EnsureTailwindCli {
    pub fn new(version: impl Into<String>, root_install_path: impl Into<PathBuf>) -> Self {
        Self {
            version: version.into(),
            root_install_path: root_install_path.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            http_timeout: DEFAULT_TIMEOUT,
            standalone_cli_path: None,
        }
    }

    /// Returns `true` when no error was logged.
    pub async fn execute(&mut self, log: &dyn TaskLog) -> bool {
        match self.install().await {
            Ok(path) => self.standalone_cli_path = Some(path),
            Err(e) => log.error_from(&e),
        }
        !log.has_logged_errors()
    }

    async fn install(&self) -> Result<PathBuf> {
        let platform = PlatformKey::detect()?;
        let client = ReleaseClient::with_options(&self.api_base, self.http_timeout)?;
        let installer = Installer::new(client, &self.root_install_path, platform);
        installer.ensure_binary(&self.version).await
    }
}
