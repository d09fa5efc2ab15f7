use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const APP_NAME: &str = "tailwind-build";
pub const CONFIG_FILE_NAME: &str = "tailwind-build.json";

/// Build settings for one project.
///
/// Relative paths are resolved against the project directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "default_install_path")]
    pub install_path: PathBuf,
    #[serde(default = "default_config_dir")]
    pub config_dir: PathBuf,
    #[serde(default = "default_input_file")]
    pub input_file: String,
    #[serde(default = "default_output_file")]
    pub output_file: PathBuf,
    #[serde(default)]
    pub minify: bool,
    #[serde(default = "default_lock_file")]
    pub lock_file: Option<PathBuf>,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    #[serde(default)]
    pub process_timeout_secs: Option<u64>,
}

fn default_version() -> String {
    "latest".to_string()
}
fn default_install_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
        .join("cli")
}
fn default_config_dir() -> PathBuf {
    PathBuf::from(".")
}
fn default_input_file() -> String {
    "tailwind.css".to_string()
}
fn default_output_file() -> PathBuf {
    PathBuf::from("wwwroot").join("css").join("site.css")
}
fn default_lock_file() -> Option<PathBuf> {
    Some(PathBuf::from("obj").join("tailwindcss.lock"))
}
fn default_api_base() -> String {
    tailwind_build::github::DEFAULT_API_BASE.to_string()
}
fn default_http_timeout_secs() -> u64 {
    300
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            install_path: default_install_path(),
            config_dir: default_config_dir(),
            input_file: default_input_file(),
            output_file: default_output_file(),
            minify: false,
            lock_file: default_lock_file(),
            api_base: default_api_base(),
            http_timeout_secs: default_http_timeout_secs(),
            process_timeout_secs: None,
        }
    }
}

impl Settings {
    /// Load `tailwind-build.json` from `project_dir` if present, then apply
    /// environment overrides.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let config_path = project_dir.join(CONFIG_FILE_NAME);
        tracing::debug!("Config file path: {}", config_path.display());

        let mut settings = if config_path.exists() {
            let content = fs::read_to_string(&config_path).with_context(|| {
                format!("Could not read config file at {}", config_path.display())
            })?;
            serde_json::from_str(&content).with_context(|| {
                format!("Could not parse {} as JSON", config_path.display())
            })?
        } else {
            Settings::default()
        };

        settings.apply_env(|key| std::env::var(key).ok());
        Ok(settings)
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(version) = var("TAILWIND_VERSION") {
            self.version = version;
        }
        if let Some(path) = var("TAILWIND_INSTALL_PATH") {
            self.install_path = PathBuf::from(path);
        }
        if let Some(path) = var("TAILWIND_LOCK_FILE") {
            self.lock_file = if path.is_empty() {
                None
            } else {
                Some(PathBuf::from(path))
            };
        }
        if let Some(minify) = var("TAILWIND_MINIFY") {
            self.minify = parse_bool(&minify);
        }
        if let Some(api_base) = var("TAILWIND_API_BASE") {
            self.api_base = api_base;
        }
        if let Some(secs) = var("TAILWIND_HTTP_TIMEOUT_SECS") {
            match secs.parse::<u64>() {
                Ok(secs) => self.http_timeout_secs = secs,
                Err(_) => tracing::warn!("Ignoring invalid TAILWIND_HTTP_TIMEOUT_SECS '{}'", secs),
            }
        }
    }

    /// Return `self` with relative paths anchored at `project_dir`.
    pub fn resolve_paths(mut self, project_dir: &Path) -> Self {
        self.install_path = anchor(project_dir, &self.install_path);
        self.config_dir = anchor(project_dir, &self.config_dir);
        self.output_file = anchor(project_dir, &self.output_file);
        self.lock_file = self.lock_file.map(|p| anchor(project_dir, &p));
        self
    }
}

/// `path` if absolute, else `path` under `base`.
pub fn anchor(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

pub fn parse_bool(value: &str) -> bool {
    value.eq_ignore_ascii_case("true") || value == "1"
}
