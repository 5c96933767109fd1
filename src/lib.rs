//! # loopbus
//!
//! **Loopbus** is an in-process event bus whose dispatch happens on one
//! dedicated event loop.
//!
//! Components register handlers under event names; publishers emit named
//! events with an optional payload; the bus starts every matching handler
//! without waiting for it. Calls from other threads are marshalled onto the
//! loop through a small bridge.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   thread A              thread B                     loop thread
//! ┌────────────┐      ┌────────────┐      ┌──────────────────────────────────┐
//! │ *_threadsafe│     │ *_threadsafe│     │  EventLoop (tokio current-thread)│
//! │  (Bridged) │      │  (Bridged) │      │                                  │
//! └─────┬──────┘      └─────┬──────┘      │  drive(): job queue, FIFO        │
//!       │  run_on_loop      │             │    │                             │
//!       └─────────┬─────────┘             │    ▼                             │
//!                 └──────── job ─────────►│  Bus::{subscribe, unsubscribe,   │
//!                                         │        publish, handlers}        │
//!                                         │    │                             │
//!                                         │    ├─► Registry (name → subs)    │
//!                                         │    │                             │
//!                                         │    └─► dispatch per handler kind │
//!                                         │          ├─ Pending  ─► task     │
//!                                         │          ├─ Async    ─► task     │
//!                                         │          └─ Deferred ─► next job │
//!                                         └──────────────┬───────────────────┘
//!                                                        │ Blocking
//!                                                        ▼
//!                                              worker pool (spawn_blocking)
//! ```
//!
//! ### Publish
//! ```text
//! publish(name, payload)
//!   ├─► Event { name, payload, seq, at }
//!   ├─► subs = registry[name] ++ registry[ALL_EVENTS]   (wildcard once for ALL_EVENTS)
//!   └─► for sub in subs:
//!         start handler (never awaited)
//!         handler Err / panic ─► logged, other handlers unaffected
//! ```
//!
//! ## Features
//! | Area               | Description                                            | Key types                                  |
//! |--------------------|--------------------------------------------------------|--------------------------------------------|
//! | **Bus**            | Subscribe, unsubscribe, publish, inspect.              | [`Bus`], [`Event`], [`EventNames`]         |
//! | **Handlers**       | Sync, blocking, async, pending and struct handlers.    | [`Handler`], [`HandlerKind`], [`Subscribe`]|
//! | **Subscriptions**  | Identity-compared bindings that can remove themselves. | [`Subscription`]                           |
//! | **Loop**           | Dedicated loop thread with a FIFO job queue.           | [`EventLoop`], [`LoopHandle`]              |
//! | **Bridge**         | Run a call on the loop from any thread.                | [`run_on_loop`], [`Bridged`]               |
//! | **Errors**         | Typed errors with stable log labels.                   | [`BusError`], [`LoopError`]                |
//! | **Configuration**  | Loop thread name, worker pool size, shutdown grace.    | [`LoopConfig`]                             |
//!
//! ## Example
//! ```rust
//! use std::sync::mpsc;
//! use loopbus::{Bus, EventLoop, Handler, ALL_EVENTS};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let ev_loop = EventLoop::with_defaults()?;
//!     let bus = Bus::new(ev_loop.handle());
//!     let (tx, rx) = mpsc::channel();
//!
//!     let greet = tx.clone();
//!     bus.subscribe_threadsafe("greet", Handler::sync(move |ev| {
//!         let who = ev.payload::<String>().cloned().unwrap_or_default();
//!         greet.send(format!("hello, {who}"))?;
//!         Ok(())
//!     }))
//!     .wait()?;
//!
//!     bus.subscribe_threadsafe(ALL_EVENTS, Handler::spawn(move |ev| {
//!         let tx = tx.clone();
//!         async move {
//!             tx.send(format!("saw {ev}"))?;
//!             Ok(())
//!         }
//!     }))
//!     .wait()?;
//!
//!     bus.publish_threadsafe("greet", Some(loopbus::Event::payload_of("world".to_string())))
//!         .wait()?;
//!
//!     let mut got = vec![rx.recv()?, rx.recv()?];
//!     got.sort();
//!     assert_eq!(got, ["hello, world", "saw <Event greet>"]);
//!
//!     ev_loop.shutdown()?;
//!     Ok(())
//! }
//! ```

mod core;
mod error;
mod events;
mod subscribers;
#[cfg(test)]
mod testing;

// ---- Public re-exports ----

pub use crate::core::{
    run_on_loop, Bridged, EventLoop, LoopConfig, LoopHandle, Registration, Removal,
};
pub use error::{BusError, LoopError};
pub use events::{Bus, Event, EventNames, Payload, ALL_EVENTS};
pub use subscribers::{Handler, HandlerKind, Subscribe, Subscription};
