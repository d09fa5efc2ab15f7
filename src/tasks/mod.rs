//! Build tasks exposed to the host build.
//!
//! Each task takes its inputs as public fields, reports through a
//! [`TaskLog`](crate::log::TaskLog), and returns `true` from `execute` when
//! nothing was logged as an error.

pub mod build;
pub mod ensure;

pub use build::BuildTailwindCss;
pub use ensure::EnsureTailwindCli;
