//! Cross-process registry of running watch-mode CLI instances.
//!
//! The lock file is a JSON array of entries, one per watcher believed to be
//! running. All reads and writes for one `acquire` go through a single handle
//! holding an exclusive OS lock, so two builds cannot both decide to start a
//! watcher for the same project.

use crate::error::Result;
use chrono::{DateTime, Utc};
use fs4::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_LOCK_ATTEMPTS: u32 = 5;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LockFileEntry {
    #[serde(rename = "pid")]
    pub process_id: i32,
    pub started_at_utc: DateTime<Utc>,
    #[serde(default)]
    pub project_directory: String,
}

impl LockFileEntry {
    fn is_for(&self, project_directory: &str) -> bool {
        self.project_directory.to_lowercase() == project_directory.to_lowercase()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LockFile {
    pub entries: Vec<LockFileEntry>,
}

impl LockFile {
    /// Parse lock file contents. Blank content means no entries.
    pub fn from_json(content: &[u8]) -> serde_json::Result<Self> {
        if content.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        let entries: Vec<LockFileEntry> = serde_json::from_slice(content)?;
        Ok(Self { entries })
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.entries)
    }

    /// Read the whole file from the start. Unparseable content yields an empty
    /// lock file and `true` for the corruption flag.
    fn read_from(file: &mut File) -> std::io::Result<(Self, bool)> {
        let mut content = Vec::new();
        file.seek(SeekFrom::Start(0))?;
        file.read_to_end(&mut content)?;

        match Self::from_json(&content) {
            Ok(lock_file) => Ok((lock_file, false)),
            Err(e) => {
                tracing::debug!("Lock file parse error: {}", e);
                Ok((Self::default(), true))
            }
        }
    }

    fn write_to(&self, file: &mut File) -> Result<()> {
        let json = self.to_json()?;
        file.set_len(0)?;
        file.seek(SeekFrom::Start(0))?;
        file.write_all(json.as_bytes())?;
        file.flush()?;
        file.sync_all()?;
        Ok(())
    }
}

/// Outcome of [`LockFileStore::acquire`].
#[derive(Debug)]
pub enum Acquisition {
    /// No live watcher exists; start one and call [`LockGuard::record`].
    Acquired(LockGuard),
    /// A watcher for the project is already running.
    AlreadyRunning { pid: i32 },
    /// The lock file stayed busy for every attempt.
    Unavailable,
}

/// Exclusive access to the lock file, held between the liveness check and
/// recording the new process.
///
/// The OS lock is released when the guard drops and its handle closes.
#[derive(Debug)]
pub struct LockGuard {
    file: File,
    path: PathBuf,
    lock_file: LockFile,
    project_directory: String,
}

impl LockGuard {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Entries that will be written back, stale entries for this project
    /// already removed.
    pub fn entries(&self) -> &[LockFileEntry] {
        &self.lock_file.entries
    }

    /// Append an entry for `pid` and persist the full entry set through the
    /// held handle.
    pub fn record(mut self, pid: u32) -> Result<()> {
        self.lock_file.entries.push(LockFileEntry {
            process_id: pid as i32,
            started_at_utc: Utc::now(),
            project_directory: self.project_directory.clone(),
        });
        self.lock_file.write_to(&mut self.file)?;
        tracing::debug!(
            "Recorded watcher pid {} for {} in {}",
            pid,
            self.project_directory,
            self.path.display()
        );
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct LockFileStore {
    attempts: u32,
    retry_delay: Duration,
}

impl Default for LockFileStore {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_LOCK_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl LockFileStore {
    pub fn with_retry(attempts: u32, retry_delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            retry_delay,
        }
    }

    /// Check whether a watcher is running for `project_directory`, and if
    /// not, hand back exclusive access so the caller can start and record one.
    pub async fn acquire(&self, lock_path: &Path, project_directory: &str) -> Result<Acquisition> {
        let Some(mut file) = self.open_exclusive(lock_path).await? else {
            tracing::warn!(
                "Lock file {} is in use; not starting another watcher",
                lock_path.display()
            );
            return Ok(Acquisition::Unavailable);
        };

        let (mut lock_file, corrupt) = LockFile::read_from(&mut file)?;
        if corrupt {
            tracing::warn!(
                "Lock file {} is corrupt; resetting it",
                lock_path.display()
            );
        }

        let live = lock_file
            .entries
            .iter()
            .filter(|entry| entry.is_for(project_directory))
            .find(|entry| is_process_running(entry.process_id));

        if let Some(entry) = live {
            tracing::info!(
                "Tailwind watcher already running for {} (pid {})",
                project_directory,
                entry.process_id
            );
            return Ok(Acquisition::AlreadyRunning {
                pid: entry.process_id,
            });
        }

        let before = lock_file.entries.len();
        lock_file
            .entries
            .retain(|entry| !entry.is_for(project_directory));
        if lock_file.entries.len() != before {
            tracing::debug!(
                "Removed {} stale lock entries for {}",
                before - lock_file.entries.len(),
                project_directory
            );
        }

        Ok(Acquisition::Acquired(LockGuard {
            file,
            path: lock_path.to_path_buf(),
            lock_file,
            project_directory: project_directory.to_string(),
        }))
    }

    async fn open_exclusive(&self, path: &Path) -> Result<Option<File>> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        for attempt in 1..=self.attempts {
            match try_open_exclusive(path) {
                Ok(file) => return Ok(Some(file)),
                Err(e) => {
                    tracing::debug!(
                        "Lock file {} unavailable (attempt {}/{}): {}",
                        path.display(),
                        attempt,
                        self.attempts,
                        e
                    );
                    if attempt < self.attempts {
                        tokio::time::sleep(self.retry_delay).await;
                    }
                }
            }
        }

        Ok(None)
    }
}

fn try_open_exclusive(path: &Path) -> std::io::Result<File> {
    let file = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .truncate(false)
        .open(path)?;
    file.try_lock_exclusive()?;
    Ok(file)
}

/// Lookup failures of any kind count as "not running".
#[cfg(unix)]
pub fn is_process_running(pid: i32) -> bool {
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    if pid <= 0 {
        return false;
    }
    kill(Pid::from_raw(pid), None).is_ok()
}

#[cfg(windows)]
pub fn is_process_running(pid: i32) -> bool {
    if pid <= 0 {
        return false;
    }
    let filter = format!("PID eq {}", pid);
    match std::process::Command::new("tasklist")
        .args(["/FI", &filter, "/NH", "/FO", "CSV"])
        .output()
    {
        Ok(output) if output.status.success() => String::from_utf8_lossy(&output.stdout)
            .contains(&format!("\"{}\"", pid)),
        _ => false,
    }
}
