//! # Subscription registry.
//!
//! Maps each event name to the subscriptions bound to it, in insertion order.
//!
//! ## Architecture
//! ```text
//! Bus::subscribe   → Registry::register(names, sub)  → one entry per name
//! Bus::unsubscribe → Registry::unregister(sub)       → drop entry per name, prune empty names
//! Bus::publish     → Registry::resolve(name)         → list(name) ++ list(ALL_EVENTS)
//! Bus::handlers    → Registry::snapshot()
//! ```
//!
//! ## Rules
//! - Only ever touched on the loop thread (the bus checks this).
//! - A subscription appears under name N iff N is one of its names and it
//!   has not been unsubscribed.
//! - Re-adding the same subscription under a name is a no-op with a warning.
//! - Removing an unknown subscription is a no-op with a warning.
//! - Names with no subscriptions are removed from the map.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tracing::warn;

use crate::error::BusError;
use crate::events::{EventNames, ALL_EVENTS};
use crate::subscribers::Subscription;

/// Outcome of registering a subscription under one name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// Appended to the name's list.
    Added,
    /// Already present; nothing changed.
    Duplicate,
}

/// Outcome of removing a subscription from one name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// Removed from the name's list.
    Removed,
    /// Not registered under this name; nothing changed.
    Unknown,
}

/// Name → ordered subscriptions.
#[derive(Default)]
pub(crate) struct Registry {
    handlers: HashMap<Arc<str>, Vec<Subscription>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `sub` under every name in `names`.
    ///
    /// The shape is validated first, so an invalid argument registers nothing.
    pub fn register(
        &mut self,
        names: &EventNames,
        sub: &Subscription,
    ) -> Result<Vec<Registration>, BusError> {
        names.validate()?;
        Ok(names.iter().map(|name| self.insert(name, sub)).collect())
    }

    /// Removes `sub` from every name it was created for.
    pub fn unregister(&mut self, sub: &Subscription) -> Vec<Removal> {
        sub.names()
            .iter()
            .map(|name| self.remove(name, sub))
            .collect()
    }

    /// Subscriptions to invoke for a publish of `name`, in order.
    pub fn resolve(&self, name: &str) -> Vec<Subscription> {
        let direct = self.handlers.get(name).map(Vec::as_slice).unwrap_or(&[]);
        let wildcard: &[Subscription] = if name == ALL_EVENTS {
            &[]
        } else {
            self.handlers
                .get(ALL_EVENTS)
                .map(Vec::as_slice)
                .unwrap_or(&[])
        };
        direct.iter().chain(wildcard).cloned().collect()
    }

    /// Copy of the current mapping, sorted by name.
    pub fn snapshot(&self) -> BTreeMap<String, Vec<Subscription>> {
        self.handlers
            .iter()
            .map(|(name, subs)| (name.to_string(), subs.clone()))
            .collect()
    }

    /// Number of names with at least one subscription.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    fn insert(&mut self, name: &str, sub: &Subscription) -> Registration {
        let list = self.handlers.entry(Arc::from(name)).or_default();
        if list.contains(sub) {
            warn!(event = %name, subscription = %sub.name(), "subscription already registered");
            return Registration::Duplicate;
        }
        list.push(sub.clone());
        Registration::Added
    }

    fn remove(&mut self, name: &str, sub: &Subscription) -> Removal {
        let Some(list) = self.handlers.get_mut(name) else {
            warn!(event = %name, subscription = %sub.name(), "unable to remove unknown subscription");
            return Removal::Unknown;
        };

        let outcome = match list.iter().position(|s| s == sub) {
            Some(idx) => {
                list.remove(idx);
                Removal::Removed
            }
            None => {
                warn!(event = %name, subscription = %sub.name(), "unable to remove unknown subscription");
                Removal::Unknown
            }
        };

        if list.is_empty() {
            self.handlers.remove(name);
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscribers::Handler;
    use std::sync::Weak;

    fn sub(names: impl Into<EventNames>) -> Subscription {
        Subscription::new(names.into(), Handler::sync(|_| Ok(())), Weak::new())
    }

    fn register(reg: &mut Registry, s: &Subscription) -> Vec<Registration> {
        reg.register(s.names(), s).unwrap()
    }

    #[test]
    fn keeps_insertion_order() {
        let mut reg = Registry::new();
        let (a, b, c) = (sub("x"), sub("x"), sub("x"));
        for s in [&a, &b, &c] {
            register(&mut reg, s);
        }
        assert_eq!(reg.resolve("x"), vec![a, b, c]);
    }

    #[test]
    fn duplicate_is_noop() {
        let mut reg = Registry::new();
        let a = sub("x");
        assert_eq!(register(&mut reg, &a), vec![Registration::Added]);
        assert_eq!(register(&mut reg, &a), vec![Registration::Duplicate]);
        assert_eq!(reg.resolve("x").len(), 1);
    }

    #[test]
    fn repeated_name_in_list_registers_once() {
        let mut reg = Registry::new();
        let a = sub(["x", "x"]);
        assert_eq!(
            register(&mut reg, &a),
            vec![Registration::Added, Registration::Duplicate]
        );
        assert_eq!(reg.unregister(&a), vec![Removal::Removed, Removal::Unknown]);
        assert!(reg.is_empty());
    }

    #[test]
    fn invalid_names_register_nothing() {
        let mut reg = Registry::new();
        let bad = sub(vec!["ok", ""]);
        assert!(matches!(
            reg.register(bad.names(), &bad),
            Err(BusError::InvalidArgument { .. })
        ));
        assert!(reg.is_empty());
    }

    #[test]
    fn unregister_prunes_empty_names() {
        let mut reg = Registry::new();
        let a = sub(["x", "y"]);
        let b = sub("y");
        register(&mut reg, &a);
        register(&mut reg, &b);
        assert_eq!(reg.len(), 2);

        assert_eq!(reg.unregister(&a), vec![Removal::Removed, Removal::Removed]);
        let snap = reg.snapshot();
        assert_eq!(snap.keys().collect::<Vec<_>>(), vec!["y"]);
        assert_eq!(snap["y"], vec![b]);
    }

    #[test]
    fn unregister_twice_reports_unknown() {
        let mut reg = Registry::new();
        let a = sub("x");
        let other = sub("x");
        register(&mut reg, &a);
        register(&mut reg, &other);

        assert_eq!(reg.unregister(&a), vec![Removal::Removed]);
        assert_eq!(reg.unregister(&a), vec![Removal::Unknown]);
        assert_eq!(reg.resolve("x"), vec![other]);
    }

    #[test]
    fn wildcard_is_appended_except_for_itself() {
        let mut reg = Registry::new();
        let direct = sub("x");
        let all = sub(ALL_EVENTS);
        register(&mut reg, &direct);
        register(&mut reg, &all);

        assert_eq!(reg.resolve("x"), vec![direct, all.clone()]);
        assert_eq!(reg.resolve("unrelated"), vec![all.clone()]);
        assert_eq!(reg.resolve(ALL_EVENTS), vec![all]);
    }
}
