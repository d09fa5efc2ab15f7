//! Logging sink supplied by the build host.
//!
//! Tasks report everything through a [`TaskLog`]; a task succeeds when no
//! error was logged while it ran.

use std::sync::atomic::{AtomicBool, Ordering};

pub trait TaskLog {
    fn message(&self, text: &str);
    fn warning(&self, text: &str);
    fn error(&self, text: &str);

    /// The command line about to be executed.
    fn command_line(&self, text: &str) {
        self.message(text);
    }

    fn has_logged_errors(&self) -> bool;

    /// Log `err` and its source chain as one error.
    fn error_from(&self, err: &dyn std::error::Error) {
        let mut text = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            let cause_text = cause.to_string();
            if !text.contains(&cause_text) {
                text.push_str(": ");
                text.push_str(&cause_text);
            }
            source = cause.source();
        }
        self.error(&text);
    }
}

/// Forwards task output to `tracing`.
#[derive(Debug, Default)]
pub struct TracingLog {
    errored: AtomicBool,
}

impl TracingLog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TaskLog for TracingLog {
    fn message(&self, text: &str) {
        tracing::info!("{}", text);
    }

    fn warning(&self, text: &str) {
        tracing::warn!("{}", text);
    }

    fn error(&self, text: &str) {
        self.errored.store(true, Ordering::SeqCst);
        tracing::error!("{}", text);
    }

    fn command_line(&self, text: &str) {
        tracing::info!("Executing: {}", text);
    }

    fn has_logged_errors(&self) -> bool {
        self.errored.load(Ordering::SeqCst)
    }
}
