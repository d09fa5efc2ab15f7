use crate::error::Result;
use crate::lockfile::{Acquisition, LockFileStore};
use crate::log::TaskLog;
use crate::runner::{ProcessRunner, RunOutcome};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Content written to a missing input stylesheet.
pub const DEFAULT_INPUT_CSS: &str = "@import \"tailwindcss\";\n";

/// Runs the Tailwind CLI over one input stylesheet.
///
/// In watch mode the CLI is left running in the background, and the lock file
/// (when set) keeps repeated builds from starting a second watcher for the
/// same project.
///
/// Output: [`generated_css_file`](Self::generated_css_file), set after a
/// successful foreground build.
#[derive(Debug, Clone)]
pub struct BuildTailwindCss {
    pub standalone_cli_path: PathBuf,
    pub config_dir: PathBuf,
    pub input_file: String,
    pub output_file: PathBuf,
    pub minify: bool,
    pub watch: bool,
    pub lock_file: Option<PathBuf>,
    pub project_directory: PathBuf,
    pub process_timeout: Option<Duration>,
    pub lock_store: LockFileStore,
    pub generated_css_file: Option<PathBuf>,
}

impl BuildTailwindCss {
    pub fn new(
        standalone_cli_path: impl Into<PathBuf>,
        project_directory: impl Into<PathBuf>,
        output_file: impl Into<PathBuf>,
    ) -> Self {
        let project_directory = project_directory.into();
        Self {
            standalone_cli_path: standalone_cli_path.into(),
            config_dir: project_directory.clone(),
            input_file: "tailwind.css".to_string(),
            output_file: output_file.into(),
            minify: false,
            watch: false,
            lock_file: None,
            project_directory,
            process_timeout: None,
            lock_store: LockFileStore::default(),
            generated_css_file: None,
        }
    }

    /// Returns `true` when no error was logged.
    pub async fn execute(&mut self, log: &dyn TaskLog) -> bool {
        if let Err(e) = self.build(log).await {
            log.error_from(&e);
        }
        !log.has_logged_errors()
    }

    /// Arguments passed to the CLI for `input`.
    pub fn cli_args(&self, input: &Path) -> Vec<String> {
        let mut args = vec![
            "-i".to_string(),
            input.display().to_string(),
            "-o".to_string(),
            self.output_file.display().to_string(),
        ];
        if self.minify {
            args.push("--minify".to_string());
        }
        if self.watch {
            // Keep watching after stdin closes; the watcher runs detached.
            args.push("--watch=always".to_string());
        }
        args
    }

    async fn build(&mut self, log: &dyn TaskLog) -> Result<()> {
        fs::create_dir_all(&self.config_dir)?;

        let input = self.config_dir.join(&self.input_file);
        if !input.exists() {
            fs::write(&input, DEFAULT_INPUT_CSS)?;
            log.message(&format!("Created {}", input.display()));
        }

        let args = self.cli_args(&input);
        log.command_line(&format!(
            "{} {}",
            self.standalone_cli_path.display(),
            args.join(" ")
        ));

        let runner = ProcessRunner::with_timeout(self.process_timeout);
        if self.watch {
            return self.start_watcher(&runner, &args, log).await;
        }

        if let Some(parent) = self.output_file.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let outcome = runner
            .run(&self.standalone_cli_path, &args, &self.config_dir, false, log)
            .await?;

        match outcome {
            RunOutcome::Exited(status) if status.success() => {
                self.generated_css_file = Some(self.output_file.clone());
            }
            RunOutcome::Exited(status) => {
                log.error(&format!("TailwindCSS build failed ({})", status));
            }
            RunOutcome::Detached { pid } => {
                tracing::debug!("TailwindCSS detached unexpectedly (pid {})", pid);
            }
        }
        Ok(())
    }

    async fn start_watcher(
        &self,
        runner: &ProcessRunner,
        args: &[String],
        log: &dyn TaskLog,
    ) -> Result<()> {
        let project = fs::canonicalize(&self.project_directory)
            .unwrap_or_else(|_| self.project_directory.clone())
            .to_string_lossy()
            .to_string();

        let guard = match &self.lock_file {
            None => None,
            Some(lock_path) => match self.lock_store.acquire(lock_path, &project).await? {
                Acquisition::Acquired(guard) => Some(guard),
                Acquisition::AlreadyRunning { pid } => {
                    log.message(&format!(
                        "TailwindCSS is already watching {} (pid {})",
                        project, pid
                    ));
                    return Ok(());
                }
                Acquisition::Unavailable => {
                    log.warning(&format!(
                        "Could not lock {}; not starting another TailwindCSS watcher",
                        lock_path.display()
                    ));
                    return Ok(());
                }
            },
        };

        let outcome = runner
            .run(&self.standalone_cli_path, args, &self.config_dir, true, log)
            .await?;

        if let RunOutcome::Detached { pid } = outcome {
            log.message(&format!("TailwindCSS is watching {} (pid {})", project, pid));
            if let Some(guard) = guard {
                guard.record(pid)?;
            }
        }
        Ok(())
    }
}
