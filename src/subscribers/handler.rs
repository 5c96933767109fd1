//! # Handler variants.
//!
//! A [`Handler`] is the callable side of a subscription. Its invocation mode
//! is fixed when it is built, so publish never inspects callables at runtime.
//!
//! | Constructor                          | Mode         | Runs                                  |
//! |--------------------------------------|--------------|---------------------------------------|
//! | [`Handler::pending`]                 | `Pending`    | as a task on the loop (once)          |
//! | [`Handler::spawn`], [`Handler::subscriber`] | `Async` | as a new task on the loop per event |
//! | [`Handler::sync`] + [`Handler::blocking`]   | `Blocking` | on the worker pool, off the loop |
//! | [`Handler::sync`]                    | `Deferred`   | on the loop, at the next turn         |
//!
//! The `*_with_context` constructors receive the [`Subscription`] as a second
//! argument (context mode).
//!
//! ## Failure isolation
//! Handler bodies return `anyhow::Result<()>`. An `Err` is logged with
//! `warn!`, a panic with `error!`; neither reaches the publisher nor
//! stops delivery to other handlers.

use std::borrow::Cow;
use std::fmt;
use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};

use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::{error, warn};

use crate::error::panic_message;
use crate::events::Event;
use crate::subscribers::{Subscribe, Subscription};

pub(crate) type HandlerFuture = BoxFuture<'static, anyhow::Result<()>>;
pub(crate) type SyncFn = Arc<dyn Fn(&Event, &Subscription) -> anyhow::Result<()> + Send + Sync>;
pub(crate) type AsyncFn = Arc<dyn Fn(Event, Subscription) -> HandlerFuture + Send + Sync>;

/// Invocation mode, in dispatch priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    /// Already-created future, driven once as a loop task.
    Pending,
    /// Async function, a new loop task per event.
    Async,
    /// Synchronous function on the worker pool.
    Blocking,
    /// Synchronous function on the loop, next turn.
    Deferred,
}

pub(crate) enum Callback {
    Pending(Mutex<Option<HandlerFuture>>),
    Async(AsyncFn),
    Sync(SyncFn),
}

/// Callable bound to a subscription.
pub struct Handler {
    pub(crate) callback: Callback,
    context: bool,
    blocking: bool,
    name: Cow<'static, str>,
}

impl Handler {
    fn build<F: ?Sized>(callback: Callback, context: bool) -> Self {
        Self {
            callback,
            context,
            blocking: false,
            name: Cow::Borrowed(std::any::type_name::<F>()),
        }
    }

    /// Synchronous handler, run on the loop at the next turn.
    ///
    /// Combine with [`Handler::blocking`] to run it on the worker pool instead.
    pub fn sync<F>(f: F) -> Self
    where
        F: Fn(&Event) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self::build::<F>(
            Callback::Sync(Arc::new(move |ev: &Event, _sub: &Subscription| f(ev))),
            false,
        )
    }

    /// Synchronous handler that also receives its own [`Subscription`].
    pub fn sync_with_context<F>(f: F) -> Self
    where
        F: Fn(&Event, &Subscription) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self::build::<F>(Callback::Sync(Arc::new(f)), true)
    }

    /// Async handler: each event starts a new task on the loop.
    pub fn spawn<F, Fut>(f: F) -> Self
    where
        F: Fn(Event) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self::build::<F>(
            Callback::Async(Arc::new(move |ev: Event, _sub: Subscription| f(ev).boxed())),
            false,
        )
    }

    /// Async handler that also receives its own [`Subscription`].
    pub fn spawn_with_context<F, Fut>(f: F) -> Self
    where
        F: Fn(Event, Subscription) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self::build::<F>(
            Callback::Async(Arc::new(move |ev: Event, sub: Subscription| f(ev, sub).boxed())),
            true,
        )
    }

    /// Struct-based async handler; see [`Subscribe`].
    pub fn subscriber(s: Arc<dyn Subscribe>) -> Self {
        let name = s.name();
        let f: AsyncFn = Arc::new(move |ev: Event, sub: Subscription| {
            let s = Arc::clone(&s);
            async move { s.on_event(&ev, &sub).await }.boxed()
        });
        Self::build::<()>(Callback::Async(f), true).named(name)
    }

    /// An already-created unit of work.
    ///
    /// The first matching publish starts it as a task on the loop; a future
    /// can only run once, so later publishes skip it.
    pub fn pending<Fut>(fut: Fut) -> Self
    where
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self::build::<Fut>(Callback::Pending(Mutex::new(Some(fut.boxed()))), false)
    }

    /// Runs a synchronous handler on the worker pool instead of the loop.
    ///
    /// Has no effect on async and pending handlers, which always run as loop tasks.
    #[must_use]
    pub fn blocking(mut self) -> Self {
        self.blocking = true;
        self
    }

    /// Overrides the label used in logs and `Debug` output.
    #[must_use]
    pub fn named(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }

    /// Label used in logs.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// True if the handler receives its subscription (context mode).
    pub fn context_enabled(&self) -> bool {
        self.context
    }

    /// True if [`Handler::blocking`] was requested.
    pub fn is_blocking(&self) -> bool {
        self.blocking
    }

    /// Resolved invocation mode.
    pub fn kind(&self) -> HandlerKind {
        match self.callback {
            Callback::Pending(_) => HandlerKind::Pending,
            Callback::Async(_) => HandlerKind::Async,
            Callback::Sync(_) if self.blocking => HandlerKind::Blocking,
            Callback::Sync(_) => HandlerKind::Deferred,
        }
    }

    /// Takes the pending future out; `None` once it has been started.
    pub(crate) fn take_pending(&self) -> Option<HandlerFuture> {
        match &self.callback {
            Callback::Pending(slot) => slot
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take(),
            _ => None,
        }
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("name", &self.name)
            .field("kind", &self.kind())
            .field("context", &self.context)
            .finish()
    }
}

/// Calls a synchronous handler, logging `Err` and panics.
pub(crate) fn call_sync(f: &SyncFn, event: &Event, sub: &Subscription) {
    match catch_unwind(AssertUnwindSafe(|| f(event, sub))) {
        Ok(Ok(())) => {}
        Ok(Err(e)) => report_error(event, sub, &e),
        Err(panic) => report_panic(event, sub, panic.as_ref()),
    }
}

/// Builds the future for an async handler; creation itself may panic.
pub(crate) fn make_future(
    f: &AsyncFn,
    event: &Event,
    sub: &Subscription,
) -> Option<HandlerFuture> {
    match catch_unwind(AssertUnwindSafe(|| f(event.clone(), sub.clone()))) {
        Ok(fut) => Some(fut),
        Err(panic) => {
            report_panic(event, sub, panic.as_ref());
            None
        }
    }
}

/// Drives a handler future to completion, logging `Err` and panics.
pub(crate) async fn drive_future(fut: HandlerFuture, event: Event, sub: Subscription) {
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => report_error(&event, &sub, &e),
        Err(panic) => report_panic(&event, &sub, panic.as_ref()),
    }
}

fn report_error(event: &Event, sub: &Subscription, err: &anyhow::Error) {
    warn!(
        event = %event.name(),
        subscription = %sub.name(),
        error = %err,
        "handler failed"
    );
}

fn report_panic(event: &Event, sub: &Subscription, panic: &(dyn std::any::Any + Send)) {
    error!(
        event = %event.name(),
        subscription = %sub.name(),
        panic = %panic_message(panic),
        "handler panicked"
    );
}
