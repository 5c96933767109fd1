//! # Event name shapes accepted by `subscribe`.
//!
//! A subscription binds to one name or to a list of names. [`EventNames`]
//! keeps that distinction (it shows up in `Debug` output and in the order
//! names are registered) and validates the shape before the registry is touched.
//!
//! ## Rules
//! - A list must not be empty.
//! - No name may be the empty string.
//! - Duplicates inside a list are allowed; the registry reports the second
//!   insertion as a duplicate.

use std::sync::Arc;

use crate::error::BusError;

/// Reserved name matching every published event.
///
/// Subscriptions under this name receive every publish except a publish of
/// `ALL_EVENTS` itself, which reaches them exactly once.
pub const ALL_EVENTS: &str = "loopbus:all_events";

/// One event name or a list of them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EventNames {
    /// A single name.
    One(Arc<str>),
    /// Several names, registered in this order.
    Many(Vec<Arc<str>>),
}

impl EventNames {
    /// Iterates names in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        let slice: &[Arc<str>] = match self {
            EventNames::One(name) => std::slice::from_ref(name),
            EventNames::Many(names) => names,
        };
        slice.iter().map(|n| n.as_ref())
    }

    /// True if `name` is one of these names.
    pub fn contains(&self, name: &str) -> bool {
        self.iter().any(|n| n == name)
    }

    /// Rejects empty lists and empty names.
    pub fn validate(&self) -> Result<(), BusError> {
        if let EventNames::Many(names) = self {
            if names.is_empty() {
                return Err(BusError::invalid("empty list of event names"));
            }
        }
        if self.iter().any(str::is_empty) {
            return Err(BusError::invalid("event name must not be empty"));
        }
        Ok(())
    }
}

impl From<&str> for EventNames {
    fn from(name: &str) -> Self {
        EventNames::One(name.into())
    }
}

impl From<String> for EventNames {
    fn from(name: String) -> Self {
        EventNames::One(name.into())
    }
}

impl From<&String> for EventNames {
    fn from(name: &String) -> Self {
        EventNames::One(name.as_str().into())
    }
}

impl<S: AsRef<str>> From<Vec<S>> for EventNames {
    fn from(names: Vec<S>) -> Self {
        EventNames::Many(names.iter().map(|n| n.as_ref().into()).collect())
    }
}

impl<S: AsRef<str>> From<&[S]> for EventNames {
    fn from(names: &[S]) -> Self {
        EventNames::Many(names.iter().map(|n| n.as_ref().into()).collect())
    }
}

impl<S: AsRef<str>, const N: usize> From<[S; N]> for EventNames {
    fn from(names: [S; N]) -> Self {
        EventNames::Many(names.iter().map(|n| n.as_ref().into()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_and_list() {
        let one = EventNames::from("a");
        let many = EventNames::from(["a", "b"]);

        assert_eq!(one.iter().collect::<Vec<_>>(), vec!["a"]);
        assert_eq!(many.iter().collect::<Vec<_>>(), vec!["a", "b"]);
        assert!(many.contains("b"));
        assert!(!one.contains("b"));
    }

    #[test]
    fn invalid_shapes() {
        let empty: Vec<String> = Vec::new();
        assert!(matches!(
            EventNames::from(empty).validate(),
            Err(BusError::InvalidArgument { .. })
        ));
        assert!(EventNames::from("").validate().is_err());
        assert!(EventNames::from(vec!["ok", ""]).validate().is_err());
        assert!(EventNames::from(vec!["ok", "ok"]).validate().is_ok());
    }
}
