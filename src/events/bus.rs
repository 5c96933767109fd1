//! # Event bus: subscribe, publish, dispatch.
//!
//! [`Bus`] owns a subscription registry and the [`LoopHandle`] of the loop it
//! dispatches on. Every registry access happens on that loop; other threads
//! use the `*_threadsafe` variants, which hop onto the loop through the bridge.
//!
//! ## Architecture
//! ```text
//! any thread:   bus.publish_threadsafe(name, payload) ──► run_on_loop ──┐
//! loop thread:  bus.publish(name, payload) ◄──────────────────────────────┘
//!                 ├─► Event::new(name, payload)
//!                 ├─► registry.resolve(name)      (list(name) ++ list(ALL_EVENTS))
//!                 └─► for each subscription, by handler kind:
//!                       Pending  ──► loop.spawn(future)          (first publish only)
//!                       Async    ──► loop.spawn(handler(event))
//!                       Blocking ──► loop.spawn_blocking(handler(event))
//!                       Deferred ──► loop.defer(handler(event))  (next turn)
//! ```
//!
//! ## Rules
//! - `publish` never waits for handlers and never fails because of one.
//! - Handlers are started in resolved order; completion order is not defined.
//! - The registry lock is released before any handler is dispatched.
//! - Loop-only methods return [`BusError::NotOnLoop`] when called elsewhere.
//!
//! ## Example
//! ```rust
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//! use loopbus::{Bus, EventLoop, Handler};
//!
//! let ev_loop = EventLoop::with_defaults().unwrap();
//! let bus = Bus::new(ev_loop.handle());
//!
//! let calls = Arc::new(AtomicUsize::new(0));
//! let counter = Arc::clone(&calls);
//! bus.subscribe_threadsafe("ping", Handler::sync(move |ev| {
//!     assert_eq!(ev.name(), "ping");
//!     counter.fetch_add(1, Ordering::SeqCst);
//!     Ok(())
//! }))
//! .wait()
//! .unwrap();
//!
//! bus.publish_threadsafe("ping", None).wait().unwrap();
//! ev_loop.handle().barrier().wait().unwrap();
//! assert_eq!(calls.load(Ordering::SeqCst), 1);
//! ```

use std::any::Any;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::core::{run_on_loop, Bridged, LoopHandle, Registry, Removal};
use crate::error::BusError;
use crate::events::{Event, EventNames, Payload};
use crate::subscribers::handler::{call_sync, drive_future, make_future, Callback};
use crate::subscribers::{Handler, Subscription};

/// State shared by all clones of a [`Bus`].
pub(crate) struct BusShared {
    handle: LoopHandle,
    registry: Mutex<Registry>,
}

/// In-process event bus bound to one loop.
///
/// Cloning is cheap; clones share the registry.
#[derive(Clone)]
pub struct Bus {
    shared: Arc<BusShared>,
}

impl Bus {
    /// Creates an empty bus dispatching on the loop behind `handle`.
    pub fn new(handle: LoopHandle) -> Self {
        Self {
            shared: Arc::new(BusShared {
                handle,
                registry: Mutex::new(Registry::new()),
            }),
        }
    }

    pub(crate) fn from_shared(shared: Arc<BusShared>) -> Self {
        Self { shared }
    }

    /// Loop this bus dispatches on.
    pub fn loop_handle(&self) -> &LoopHandle {
        &self.shared.handle
    }

    // ---------------------------
    // Loop-thread operations
    // ---------------------------

    /// Registers `handler` under `names`. Loop thread only.
    ///
    /// Fails with [`BusError::InvalidArgument`] for an empty list or an empty
    /// name; nothing is registered in that case.
    pub fn subscribe(
        &self,
        names: impl Into<EventNames>,
        handler: Handler,
    ) -> Result<Subscription, BusError> {
        self.ensure_on_loop()?;
        let sub = Subscription::new(names.into(), handler, Arc::downgrade(&self.shared));

        let mut registry = self.registry();
        registry.register(sub.names(), &sub)?;
        debug!(
            subscription = %sub.name(),
            names = ?sub.names(),
            kind = ?sub.kind(),
            indexed_names = registry.len(),
            "subscribed"
        );
        Ok(sub)
    }

    /// Removes `sub` from every name it was registered under. Loop thread only.
    ///
    /// Names it is not (or no longer) registered under are reported as
    /// [`Removal::Unknown`] and logged; this is not an error.
    pub fn unsubscribe(&self, sub: &Subscription) -> Result<Vec<Removal>, BusError> {
        self.ensure_on_loop()?;
        let removals = self.registry().unregister(sub);
        debug!(subscription = %sub.name(), ?removals, "unsubscribed");
        Ok(removals)
    }

    /// Publishes an event to every matching subscription. Loop thread only.
    pub fn publish(
        &self,
        name: impl Into<Arc<str>>,
        payload: Option<Payload>,
    ) -> Result<(), BusError> {
        self.ensure_on_loop()?;
        let event = Event::new(name, payload);
        let targets = self.registry().resolve(event.name());

        if targets.is_empty() {
            debug!(event = %event.name(), seq = event.seq, "no subscribers");
            return Ok(());
        }
        for sub in targets {
            self.dispatch(sub, &event);
        }
        Ok(())
    }

    /// Publishes `value` as the payload. Loop thread only.
    pub fn publish_value<T>(&self, name: impl Into<Arc<str>>, value: T) -> Result<(), BusError>
    where
        T: Any + Send + Sync,
    {
        self.publish(name, Some(Event::payload_of(value)))
    }

    /// Current name → subscriptions mapping. Loop thread only.
    pub fn handlers(&self) -> Result<BTreeMap<String, Vec<Subscription>>, BusError> {
        self.ensure_on_loop()?;
        Ok(self.registry().snapshot())
    }

    // ---------------------------
    // Thread-safe variants
    // ---------------------------

    /// [`Bus::subscribe`] from any thread.
    pub fn subscribe_threadsafe(
        &self,
        names: impl Into<EventNames>,
        handler: Handler,
    ) -> Bridged<Subscription> {
        let bus = self.clone();
        let names = names.into();
        run_on_loop(&self.shared.handle, move || bus.subscribe(names, handler))
    }

    /// [`Bus::unsubscribe`] from any thread.
    pub fn unsubscribe_threadsafe(&self, sub: &Subscription) -> Bridged<Vec<Removal>> {
        let bus = self.clone();
        let sub = sub.clone();
        run_on_loop(&self.shared.handle, move || bus.unsubscribe(&sub))
    }

    /// [`Bus::publish`] from any thread.
    pub fn publish_threadsafe(
        &self,
        name: impl Into<Arc<str>>,
        payload: Option<Payload>,
    ) -> Bridged<()> {
        let bus = self.clone();
        let name = name.into();
        run_on_loop(&self.shared.handle, move || bus.publish(name, payload))
    }

    /// [`Bus::handlers`] from any thread.
    pub fn handlers_threadsafe(&self) -> Bridged<BTreeMap<String, Vec<Subscription>>> {
        let bus = self.clone();
        run_on_loop(&self.shared.handle, move || bus.handlers())
    }

    // ---------------------------
    // Helpers
    // ---------------------------

    fn ensure_on_loop(&self) -> Result<(), BusError> {
        if self.shared.handle.is_current() {
            Ok(())
        } else {
            Err(BusError::NotOnLoop)
        }
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.shared
            .registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts one handler for `event` according to its kind.
    fn dispatch(&self, sub: Subscription, event: &Event) {
        let handle = &self.shared.handle;

        match &sub.handler().callback {
            Callback::Pending(_) => match sub.handler().take_pending() {
                Some(fut) => {
                    handle.spawn(drive_future(fut, event.clone(), sub.clone()));
                }
                None => {
                    debug!(
                        event = %event.name(),
                        subscription = %sub.name(),
                        "pending handler already started; skipping"
                    );
                }
            },
            Callback::Async(f) => {
                if let Some(fut) = make_future(f, event, &sub) {
                    handle.spawn(drive_future(fut, event.clone(), sub.clone()));
                }
            }
            Callback::Sync(f) if sub.is_blocking() => {
                let (f, event) = (Arc::clone(f), event.clone());
                let sub = sub.clone();
                handle.spawn_blocking(move || call_sync(&f, &event, &sub));
            }
            Callback::Sync(f) => {
                let (f, ev, target) = (Arc::clone(f), event.clone(), sub.clone());
                if let Err(e) = handle.defer(move || call_sync(&f, &ev, &target)) {
                    warn!(
                        event = %event.name(),
                        subscription = %sub.name(),
                        error = %e,
                        "deferred handler dropped"
                    );
                }
            }
        }
    }
}

impl std::fmt::Debug for Bus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bus")
            .field("loop", &self.shared.handle)
            .finish_non_exhaustive()
    }
}
