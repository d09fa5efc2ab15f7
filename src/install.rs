use crate::error::{Error, Result};
use crate::github::ReleaseClient;
use crate::platform::{Os, PlatformKey};
use std::fs;
use std::path::{Path, PathBuf};

/// Keeps one Tailwind CLI binary per version under a root directory.
///
/// Layout: `{root}/{version}/tailwindcss-{os}-{arch}[.exe]`.
#[derive(Debug, Clone)]
pub struct Installer {
    client: ReleaseClient,
    root: PathBuf,
    platform: PlatformKey,
}

impl Installer {
    pub fn new(client: ReleaseClient, root: impl Into<PathBuf>, platform: PlatformKey) -> Self {
        Self {
            client,
            root: root.into(),
            platform,
        }
    }

    /// Where the binary for `version` lives, whether or not it is installed.
    pub fn binary_path(&self, version: &str) -> PathBuf {
        self.root
            .join(sanitize_version(version))
            .join(self.platform.artifact_file_name())
    }

    /// Return the path to an installed binary for `version`, downloading it
    /// on a cache miss.
    ///
    /// A file already present at the expected path is trusted as-is.
    pub async fn ensure_binary(&self, version: &str) -> Result<PathBuf> {
        let file_name = self.platform.artifact_file_name();
        let binary_path = self.binary_path(version);
        tracing::debug!("Tailwind CLI path: {}", binary_path.display());

        if binary_path.exists() {
            tracing::info!("Tailwind CLI {} is already installed.", version);
            return Ok(binary_path);
        }

        if let Some(parent) = binary_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let release = self.client.get_release(version).await?;
        let asset = release
            .find_asset(&file_name)
            .ok_or_else(|| Error::AssetNotFound {
                asset: file_name.clone(),
                version: version.to_string(),
            })?;

        tracing::info!(
            "Installing Tailwind CLI {} ({})...",
            release.tag_name,
            asset.name
        );
        self.client.download_asset(asset, &binary_path).await?;

        if !binary_path.exists() {
            return Err(Error::WriteVerificationFailed { path: binary_path });
        }

        if self.platform.os() != Os::Windows {
            if let Err(e) = make_executable(&binary_path) {
                tracing::warn!(
                    "Could not mark {} as executable: {}",
                    binary_path.display(),
                    e
                );
            }
        }

        tracing::info!("Installed Tailwind CLI to {}", binary_path.display());
        Ok(binary_path)
    }
}

/// Version strings may carry slashes; keep each version in a single directory.
fn sanitize_version(version: &str) -> String {
    version.replace(['/', '\\'], "__")
}

#[cfg(unix)]
fn make_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms)
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::DEFAULT_TIMEOUT;
    use crate::platform::Arch;
    use tempfile::tempdir;

    fn installer(root: &Path) -> Installer {
        // Nothing listens here; any network access fails the test.
        let client =
            ReleaseClient::with_options("http://127.0.0.1:9/repos/a/b", DEFAULT_TIMEOUT).unwrap();
        let platform = PlatformKey::new(Os::Linux, Arch::X64).unwrap();
        Installer::new(client, root, platform)
    }

    #[test]
    fn test_binary_path_layout() {
        let installer = installer(Path::new("/opt/tw"));
        assert_eq!(
            installer.binary_path("v4.1.18"),
            Path::new("/opt/tw/v4.1.18/tailwindcss-linux-x64")
        );
        assert_eq!(
            installer.binary_path("nightly/2024"),
            Path::new("/opt/tw/nightly__2024/tailwindcss-linux-x64")
        );
    }

    #[tokio::test]
    async fn test_cache_hit_skips_network() {
        let root = tempdir().unwrap();
        let installer = installer(root.path());
        let expected = installer.binary_path("v4.1.18");
        fs::create_dir_all(expected.parent().unwrap()).unwrap();
        fs::write(&expected, b"cached").unwrap();

        let path = installer.ensure_binary("v4.1.18").await.unwrap();
        assert_eq!(path, expected);
        assert_eq!(fs::read(&path).unwrap(), b"cached");
    }

    #[tokio::test]
    async fn test_network_failure_leaves_no_file() {
        let root = tempdir().unwrap();
        let installer = installer(root.path());

        let err = installer.ensure_binary("v4.1.18").await.unwrap_err();
        assert!(matches!(err, Error::Network(_)), "unexpected error: {err}");
        assert!(!installer.binary_path("v4.1.18").exists());
    }
}
