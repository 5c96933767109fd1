//! # Event loop configuration.
//!
//! Provides [`LoopConfig`], the settings used by [`EventLoop::start`](crate::EventLoop::start).
//!
//! ## Sentinel values
//! - `max_blocking_threads = 0` → tokio's default cap for the blocking pool
//! - `shutdown_grace = 0s` → do not wait for in-flight blocking handlers on shutdown

use std::time::Duration;

/// Configuration for a dedicated event loop.
///
/// ## Field semantics
/// - `thread_name`: name of the OS thread that drives the loop
/// - `max_blocking_threads`: cap for the worker pool running blocking handlers (`0` = default)
/// - `shutdown_grace`: how long shutdown waits for blocking handlers still running
#[derive(Clone, Debug)]
pub struct LoopConfig {
    /// Name of the loop thread (visible in debuggers and panic messages).
    pub thread_name: String,

    /// Maximum number of worker threads for blocking handlers.
    ///
    /// - `0` = tokio default (effectively unbounded for this use)
    /// - `n > 0` = at most `n` blocking handlers run at once; extra ones queue
    pub max_blocking_threads: usize,

    /// Grace period for blocking handlers when the loop shuts down.
    ///
    /// Handlers still running after this are detached, not interrupted.
    pub shutdown_grace: Duration,
}

impl LoopConfig {
    /// Returns the blocking pool cap as an `Option`.
    ///
    /// - `None` → keep tokio's default
    /// - `Some(n)` → explicit cap
    #[inline]
    pub fn blocking_limit(&self) -> Option<usize> {
        if self.max_blocking_threads == 0 {
            None
        } else {
            Some(self.max_blocking_threads)
        }
    }
}

impl Default for LoopConfig {
    /// Default configuration:
    ///
    /// - `thread_name = "loopbus"`
    /// - `max_blocking_threads = 0` (tokio default)
    /// - `shutdown_grace = 5s`
    fn default() -> Self {
        Self {
            thread_name: "loopbus".to_string(),
            max_blocking_threads: 0,
            shutdown_grace: Duration::from_secs(5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_means_default_blocking_limit() {
        let mut cfg = LoopConfig::default();
        assert_eq!(cfg.blocking_limit(), None);
        cfg.max_blocking_threads = 4;
        assert_eq!(cfg.blocking_limit(), Some(4));
    }
}
