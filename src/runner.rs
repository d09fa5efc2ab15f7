//! Launching the Tailwind CLI.

use crate::error::{Error, Result};
use crate::log::TaskLog;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};

#[cfg(windows)]
const CREATE_NEW_CONSOLE: u32 = 0x0000_0010;
#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

#[derive(Debug)]
pub enum RunOutcome {
    /// The process ran to completion.
    Exited(ExitStatus),
    /// The process was started in the background and left running.
    Detached { pid: u32 },
}

#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    timeout: Option<Duration>,
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill foreground runs that take longer than `timeout`.
    pub fn with_timeout(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    /// Run `executable` in `working_directory`.
    ///
    /// In the foreground, each non-blank line the process prints on stdout or
    /// stderr is forwarded to `log` as it arrives, and the call returns when
    /// the process exits. With `watch` set the process is started detached,
    /// without captured output, and the call returns right away.
    pub async fn run(
        &self,
        executable: &Path,
        args: &[String],
        working_directory: &Path,
        watch: bool,
        log: &dyn TaskLog,
    ) -> Result<RunOutcome> {
        if watch {
            let pid = spawn_detached(executable, args, working_directory)?;
            tracing::debug!("Started detached process {} ({})", pid, executable.display());
            return Ok(RunOutcome::Detached { pid });
        }

        let mut cmd = Command::new(executable);
        cmd.args(args)
            .current_dir(working_directory)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(windows)]
        cmd.creation_flags(CREATE_NO_WINDOW);

        let mut child = cmd.spawn().map_err(|source| Error::LaunchFailed {
            path: executable.to_path_buf(),
            source,
        })?;

        let status = match self.timeout {
            None => wait_forwarding(&mut child, log).await?,
            Some(timeout) => {
                let result =
                    tokio::time::timeout(timeout, wait_forwarding(&mut child, log)).await;
                match result {
                    Ok(status) => status?,
                    Err(_) => {
                        if let Err(e) = child.kill().await {
                            tracing::warn!("Failed to kill {}: {}", executable.display(), e);
                        }
                        return Err(Error::ProcessTimedOut {
                            path: executable.to_path_buf(),
                            timeout,
                        });
                    }
                }
            }
        };

        tracing::debug!("{} exited with {}", executable.display(), status);
        Ok(RunOutcome::Exited(status))
    }
}

/// Forward both output streams line by line until they close, then reap.
///
/// Lines are decoded lossily; the CLI may print paths that are not UTF-8.
async fn wait_forwarding(child: &mut Child, log: &dyn TaskLog) -> Result<ExitStatus> {
    let stdout = child.stdout.take().ok_or_else(|| not_captured("stdout"))?;
    let stderr = child.stderr.take().ok_or_else(|| not_captured("stderr"))?;

    let mut out = BufReader::new(stdout);
    let mut err = BufReader::new(stderr);
    let (mut out_buf, mut err_buf) = (Vec::new(), Vec::new());
    let (mut out_open, mut err_open) = (true, true);

    // Partial reads stay in the buffers when the other branch wins.
    while out_open || err_open {
        tokio::select! {
            read = out.read_until(b'\n', &mut out_buf), if out_open => {
                out_open = forward_buffered(log, read?, &mut out_buf);
            }
            read = err.read_until(b'\n', &mut err_buf), if err_open => {
                err_open = forward_buffered(log, read?, &mut err_buf);
            }
        }
    }

    Ok(child.wait().await?)
}

/// Returns `false` once the stream hit end of file.
fn forward_buffered(log: &dyn TaskLog, read: usize, buf: &mut Vec<u8>) -> bool {
    if read == 0 {
        return false;
    }
    forward_line(log, &String::from_utf8_lossy(buf));
    buf.clear();
    true
}

fn forward_line(log: &dyn TaskLog, line: &str) {
    let line = line.trim_end();
    if !line.trim().is_empty() {
        log.message(line);
    }
}

fn not_captured(stream: &str) -> Error {
    Error::Io(std::io::Error::new(
        std::io::ErrorKind::Other,
        format!("{} was not captured", stream),
    ))
}

fn spawn_detached(executable: &Path, args: &[String], working_directory: &Path) -> Result<u32> {
    let mut cmd = std::process::Command::new(executable);
    cmd.args(args)
        .current_dir(working_directory)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }
    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        cmd.creation_flags(CREATE_NEW_CONSOLE);
    }

    let mut child = cmd.spawn().map_err(|source| Error::LaunchFailed {
        path: executable.to_path_buf(),
        source,
    })?;
    let pid = child.id();

    // Reap the watcher when it exits so a long-lived host does not keep a
    // zombie that still answers liveness checks.
    let reaper = std::thread::Builder::new()
        .name(format!("tailwind-watch-{}", pid))
        .spawn(move || match child.wait() {
            Ok(status) => tracing::debug!("Watcher {} exited with {}", pid, status),
            Err(e) => tracing::debug!("Could not wait for watcher {}: {}", pid, e),
        });
    if let Err(e) = reaper {
        tracing::warn!("Could not watch process {} for exit: {}", pid, e);
    }
    Ok(pid)
}
