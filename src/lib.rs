//! Provision the standalone Tailwind CSS CLI and run it as a build step.
//!
//! - [`install::Installer`] downloads the platform build from GitHub releases
//!   and caches it per version.
//! - [`lockfile::LockFileStore`] keeps one watch-mode CLI per project across
//!   concurrent builds.
//! - [`tasks`] wires both together behind the host-facing task surface.

pub mod download;
pub mod error;
pub mod github;
pub mod install;
pub mod lockfile;
pub mod log;
pub mod platform;
pub mod runner;
pub mod tasks;
pub mod types;

pub use error::{Error, Result};
