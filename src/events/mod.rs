//! Events and the bus that routes them.
//!
//! ## Contents
//! - [`Event`], [`Payload`]: what a publish delivers to handlers
//! - [`EventNames`], [`ALL_EVENTS`]: names a subscription binds to
//! - [`Bus`]: subscribe, unsubscribe, publish and their thread-safe variants
//!
//! See `core/mod.rs` for the loop and bridge the bus runs on.

pub(crate) mod bus;
mod event;
mod names;

pub use bus::Bus;
pub use event::{Event, Payload};
pub use names::{EventNames, ALL_EVENTS};
