//! Error types used by the bus, the bridge and the loop.
//!
//! This module defines two enums:
//!
//! - [`BusError`]: errors returned by bus operations and bridged calls.
//! - [`LoopError`]: errors raised while starting or stopping an [`EventLoop`](crate::EventLoop).
//!
//! Both types provide `as_label` for logs. Soft conditions (duplicate
//! registration, unknown handler on unsubscribe) and handler failures are
//! **not** errors: they are logged and reported through
//! [`Registration`](crate::Registration) / [`Removal`](crate::Removal).

use thiserror::Error;

/// # Errors produced by bus operations.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BusError {
    /// The event name shape is not acceptable (empty list or empty name).
    #[error("invalid argument: {reason}")]
    InvalidArgument {
        /// What was wrong with the argument.
        reason: String,
    },

    /// A loop-only operation was called from another thread.
    ///
    /// Use the `*_threadsafe` variant instead.
    #[error("operation must run on the loop thread")]
    NotOnLoop,

    /// The loop stopped before the call could run.
    #[error("event loop is closed")]
    LoopClosed,

    /// A bridged call was awaited on the loop thread while still queued
    /// behind the waiting job.
    #[error("waiting on the loop thread for a call queued behind it")]
    Deadlock,

    /// The bus owning a subscription no longer exists.
    #[error("bus dropped")]
    BusDropped,

    /// A bridged call panicked on the loop thread.
    #[error("bridged call panicked: {message}")]
    Panicked {
        /// Panic payload rendered as text.
        message: String,
    },
}

impl BusError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use loopbus::BusError;
    ///
    /// assert_eq!(BusError::NotOnLoop.as_label(), "bus_not_on_loop");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            BusError::InvalidArgument { .. } => "bus_invalid_argument",
            BusError::NotOnLoop => "bus_not_on_loop",
            BusError::LoopClosed => "bus_loop_closed",
            BusError::Deadlock => "bus_bridge_deadlock",
            BusError::BusDropped => "bus_dropped",
            BusError::Panicked { .. } => "bus_bridge_panicked",
        }
    }

    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        BusError::InvalidArgument {
            reason: reason.into(),
        }
    }
}

/// # Errors produced by the event loop lifecycle.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum LoopError {
    /// The runtime or the loop thread could not be created.
    #[error("failed to start event loop: {0}")]
    Spawn(#[from] std::io::Error),

    /// The loop thread terminated by panicking.
    #[error("event loop thread panicked")]
    Panicked,
}

impl LoopError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            LoopError::Spawn(_) => "loop_spawn_failed",
            LoopError::Panicked => "loop_panicked",
        }
    }
}

/// Renders a panic payload captured by `catch_unwind` as text.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
