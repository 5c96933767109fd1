//! # Struct-based event subscriber.
//!
//! Provides [`Subscribe`], an extension point for plugging stateful handlers
//! into the bus. Wrap one with [`Handler::subscriber`](crate::Handler::subscriber).
//!
//! Each subscriber is dispatched as an async task on the loop:
//! - the publish call does not wait for it;
//! - `Err` results and panics are caught and logged per call;
//! - it always receives the [`Subscription`] it was registered under.
//!
//! ## Example
//! ```rust
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use async_trait::async_trait;
//! use loopbus::{Event, Subscribe, Subscription};
//!
//! #[derive(Default)]
//! struct Counter(AtomicUsize);
//!
//! #[async_trait]
//! impl Subscribe for Counter {
//!     async fn on_event(&self, _ev: &Event, _sub: &Subscription) -> anyhow::Result<()> {
//!         self.0.fetch_add(1, Ordering::Relaxed);
//!         Ok(())
//!     }
//!
//!     fn name(&self) -> &'static str { "counter" }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;
use crate::subscribers::Subscription;

/// Async event subscriber.
///
/// ### Implementation requirements
/// - Use async I/O; avoid blocking the loop. For blocking work use a
///   blocking [`Handler`](crate::Handler) instead.
/// - Returning `Err` is fine: the failure is logged and other handlers
///   are unaffected.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Processes a single event.
    ///
    /// Runs as its own task on the loop, not inside the publish call.
    async fn on_event(&self, event: &Event, subscription: &Subscription) -> anyhow::Result<()>;

    /// Returns the subscriber name used in logs.
    ///
    /// The default uses `type_name::<Self>()`, which can be verbose; override it when possible.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
