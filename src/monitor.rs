// src/monitor.rs

//! Progress and cancellation monitoring
//!
//! Resolution is a single unit of potentially long-running, blocking work.
//! The caller supplies a monitor; operations report coarse progress through
//! it and poll `is_cancelled` at checkpoint boundaries (per relaxation
//! config in remediation, per unit in update lookup). Cancellation is
//! cooperative; nothing is interrupted mid-step.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::info;

/// Core trait for progress reporting and cancellation polling
///
/// Implementations should be thread-safe (Send + Sync) so a resolution can
/// run on a worker thread while the caller observes or cancels it.
pub trait ProgressMonitor: Send + Sync {
    /// Set the current status message
    fn set_message(&self, message: &str);

    /// Report completed work units
    fn worked(&self, amount: u64);

    /// Whether the caller has requested cancellation
    fn is_cancelled(&self) -> bool;
}

/// Shared cancellation flag, cloneable across threads
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    cancelled: Arc<AtomicBool>,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; observed at the next checkpoint
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Silent monitor (no-op reporting)
///
/// Use for scripted or embedded usage where progress output is not wanted.
/// Still honors cancellation via its [`CancelFlag`].
#[derive(Debug, Default)]
pub struct SilentMonitor {
    cancel: CancelFlag,
    position: AtomicU64,
}

impl SilentMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a monitor wired to an external cancellation flag
    pub fn with_cancel(cancel: CancelFlag) -> Self {
        Self {
            cancel,
            position: AtomicU64::new(0),
        }
    }

    pub fn position(&self) -> u64 {
        self.position.load(Ordering::Relaxed)
    }
}

impl ProgressMonitor for SilentMonitor {
    fn set_message(&self, _message: &str) {}

    fn worked(&self, amount: u64) {
        self.position.fetch_add(amount, Ordering::Relaxed);
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Logging monitor
///
/// Reports progress to tracing at info level. Useful for non-interactive
/// environments or when progress belongs in logs.
#[derive(Debug)]
pub struct LogMonitor {
    name: String,
    cancel: CancelFlag,
    position: AtomicU64,
}

impl LogMonitor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cancel: CancelFlag::new(),
            position: AtomicU64::new(0),
        }
    }

    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }
}

impl ProgressMonitor for LogMonitor {
    fn set_message(&self, message: &str) {
        info!("{}: {}", self.name, message);
    }

    fn worked(&self, amount: u64) {
        let position = self.position.fetch_add(amount, Ordering::Relaxed) + amount;
        info!("{}: {} steps done", self.name, position);
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silent_monitor_counts_work() {
        let monitor = SilentMonitor::new();
        monitor.set_message("resolving");
        monitor.worked(3);
        monitor.worked(2);
        assert_eq!(monitor.position(), 5);
        assert!(!monitor.is_cancelled());
    }

    #[test]
    fn test_cancel_flag_is_shared() {
        let cancel = CancelFlag::new();
        let monitor = SilentMonitor::with_cancel(cancel.clone());
        assert!(!monitor.is_cancelled());

        cancel.cancel();
        assert!(monitor.is_cancelled());
    }

    #[test]
    fn test_log_monitor_cancellation() {
        let cancel = CancelFlag::new();
        let monitor = LogMonitor::new("update").with_cancel(cancel.clone());
        monitor.worked(1);
        assert!(!monitor.is_cancelled());
        cancel.cancel();
        assert!(monitor.is_cancelled());
    }
}
