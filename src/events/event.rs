//! # Events published through the bus.
//!
//! An [`Event`] is an immutable `(name, payload)` value. The bus creates one
//! per publish and hands a clone to every matching handler; the payload is
//! shared behind an `Arc`, so cloning is cheap.
//!
//! ## Ordering guarantees
//! Each event has a process-wide sequence number (`seq`) that increases
//! monotonically. Use it to restore publish order when handlers running in
//! different modes complete out of order.
//!
//! ## Example
//! ```rust
//! use loopbus::Event;
//!
//! let ev = Event::new("user.created", Some(Event::payload_of(42_u32)));
//!
//! assert_eq!(ev.name(), "user.created");
//! assert_eq!(ev.payload::<u32>(), Some(&42));
//! assert_eq!(ev.payload::<String>(), None);
//! assert_eq!(ev.to_string(), "<Event user.created>");
//! ```

use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Opaque event payload shared between handlers.
pub type Payload = Arc<dyn Any + Send + Sync>;

/// Immutable event value.
#[derive(Clone)]
pub struct Event {
    name: Arc<str>,
    payload: Option<Payload>,
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp of creation.
    pub at: SystemTime,
}

impl Event {
    /// Creates an event with the next sequence number and the current time.
    pub fn new(name: impl Into<Arc<str>>, payload: Option<Payload>) -> Self {
        Self {
            name: name.into(),
            payload,
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
        }
    }

    /// Wraps any value as a [`Payload`].
    pub fn payload_of<T: Any + Send + Sync>(value: T) -> Payload {
        Arc::new(value)
    }

    /// Event name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// True if the event carries a payload.
    #[inline]
    pub fn has_payload(&self) -> bool {
        self.payload.is_some()
    }

    /// Typed view of the payload; `None` if absent or of another type.
    pub fn payload<T: Any>(&self) -> Option<&T> {
        self.payload.as_deref()?.downcast_ref::<T>()
    }

    /// Raw shared payload.
    pub fn raw_payload(&self) -> Option<&Payload> {
        self.payload.as_ref()
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Event {}>", self.name)
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("name", &self.name)
            .field("has_payload", &self.payload.is_some())
            .field("seq", &self.seq)
            .finish()
    }
}
