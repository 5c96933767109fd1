//! Runtime core: the loop, the bridge and the registry.
//!
//! The public pieces are [`EventLoop`] / [`LoopHandle`], [`LoopConfig`] and
//! the bridge ([`run_on_loop`], [`Bridged`]).
//!
//! Internal modules:
//! - [`event_loop`]: dedicated loop thread and its job queue;
//! - [`bridge`]: marshals calls from any thread onto the loop;
//! - [`registry`]: name → subscriptions index owned by the bus;
//! - [`config`]: loop settings.
//!
//! ```text
//! any thread ──run_on_loop──► job queue ──► loop thread
//!                                              ├─► Bus::{subscribe, unsubscribe, publish}
//!                                              │       └─► Registry
//!                                              └─► handler tasks / deferred calls
//!                                  blocking pool ◄── blocking handlers
//! ```

mod bridge;
mod config;
mod event_loop;
mod registry;

pub use bridge::{run_on_loop, Bridged};
pub use config::LoopConfig;
pub use event_loop::{EventLoop, LoopHandle};
pub(crate) use registry::Registry;
pub use registry::{Registration, Removal};
