//! # Subscription: a handler bound to event names.
//!
//! A [`Subscription`] is created by `Bus::subscribe` and never changes
//! afterwards. Identity is the allocation: clones compare equal, two
//! subscriptions built from the same closure do not.
//!
//! It keeps a non-owning back-reference to its bus, so it can unsubscribe
//! itself without keeping the bus alive.

use std::fmt;
use std::sync::{Arc, Weak};

use crate::core::{Bridged, Removal};
use crate::error::BusError;
use crate::events::bus::{Bus, BusShared};
use crate::events::EventNames;
use crate::subscribers::{Handler, HandlerKind};

struct Inner {
    names: EventNames,
    handler: Handler,
    bus: Weak<BusShared>,
}

/// Registered binding of one or more event names to a handler.
#[derive(Clone)]
pub struct Subscription {
    inner: Arc<Inner>,
}

impl Subscription {
    pub(crate) fn new(names: EventNames, handler: Handler, bus: Weak<BusShared>) -> Self {
        Self {
            inner: Arc::new(Inner {
                names,
                handler,
                bus,
            }),
        }
    }

    /// Names this subscription was created for.
    pub fn names(&self) -> &EventNames {
        &self.inner.names
    }

    /// Handler label used in logs.
    pub fn name(&self) -> &str {
        self.inner.handler.name()
    }

    /// True if the handler receives this subscription as a second argument.
    pub fn context_enabled(&self) -> bool {
        self.inner.handler.context_enabled()
    }

    /// True if the handler was marked blocking.
    pub fn is_blocking(&self) -> bool {
        self.inner.handler.is_blocking()
    }

    /// Resolved invocation mode.
    pub fn kind(&self) -> HandlerKind {
        self.inner.handler.kind()
    }

    pub(crate) fn handler(&self) -> &Handler {
        &self.inner.handler
    }

    /// Removes this subscription from its bus. Loop thread only.
    ///
    /// Safe to call more than once; later calls report [`Removal::Unknown`].
    pub fn unsubscribe(&self) -> Result<Vec<Removal>, BusError> {
        self.bus()?.unsubscribe(self)
    }

    /// Removes this subscription from any thread.
    pub fn unsubscribe_threadsafe(&self) -> Bridged<Vec<Removal>> {
        match self.bus() {
            Ok(bus) => bus.unsubscribe_threadsafe(self),
            Err(e) => Bridged::resolved(Err(e)),
        }
    }

    fn bus(&self) -> Result<Bus, BusError> {
        self.inner
            .bus
            .upgrade()
            .map(Bus::from_shared)
            .ok_or(BusError::BusDropped)
    }
}

impl PartialEq for Subscription {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Subscription {}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Subscription {}>", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detached(names: impl Into<EventNames>) -> Subscription {
        Subscription::new(names.into(), Handler::sync(|_| Ok(())), Weak::new())
    }

    #[test]
    fn identity_is_allocation() {
        let a = detached("x");
        let b = detached("x");
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn unsubscribe_without_bus_reports_dropped() {
        let sub = detached(["x", "y"]);
        assert_eq!(sub.unsubscribe(), Err(BusError::BusDropped));
        assert_eq!(sub.unsubscribe_threadsafe().wait(), Err(BusError::BusDropped));
    }

    #[test]
    fn debug_shows_label() {
        let sub = Subscription::new(
            "x".into(),
            Handler::sync(|_| Ok(())).named("audit"),
            Weak::new(),
        );
        assert_eq!(format!("{sub:?}"), "<Subscription audit>");
    }
}
