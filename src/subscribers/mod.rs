//! # Handlers and subscriptions.
//!
//! A [`Handler`] is what runs when an event is delivered; a [`Subscription`]
//! binds it to one or more event names on a bus.
//!
//! ## Architecture
//! ```text
//! Handler::sync / spawn / pending / subscriber
//!        │
//!        ▼
//! Bus::subscribe(names, handler) ──► Subscription { names, handler, weak bus }
//!                                          │
//!                                          ├─► registry entry per name
//!                                          └─► Subscription::unsubscribe()
//! ```
//!
//! ## Handler modes
//! - **Pending**: an existing future, started by the first matching publish
//! - **Async**: a new loop task per event ([`Subscribe`] implementors use this)
//! - **Blocking**: a synchronous call on the worker pool
//! - **Deferred**: a synchronous call on the loop, next turn
//!
//! ## Implementing custom subscribers
//! ```no_run
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use loopbus::{Event, Handler, Subscribe, Subscription};
//!
//! struct Audit;
//!
//! #[async_trait]
//! impl Subscribe for Audit {
//!     async fn on_event(&self, event: &Event, sub: &Subscription) -> anyhow::Result<()> {
//!         println!("{event} via {sub:?}");
//!         Ok(())
//!     }
//! }
//!
//! let handler = Handler::subscriber(Arc::new(Audit));
//! ```

pub(crate) mod handler;
mod subscribe;
mod subscription;

pub use handler::{Handler, HandlerKind};
pub use subscribe::Subscribe;
pub use subscription::Subscription;
