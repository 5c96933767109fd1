//! # Thread-safe bridge onto the event loop.
//!
//! [`run_on_loop`] marshals a closure from any thread onto the loop thread and
//! returns a [`Bridged`] handle for its result.
//!
//! ## Flow
//! ```text
//! caller thread                         loop thread
//!   run_on_loop(handle, f)
//!     ├─► oneshot::channel()
//!     ├─► handle.schedule(wrapper) ───► wrapper()
//!     │                                   ├─ f() under catch_unwind
//!     │                                   └─ tx.send(value | error | panic)
//!     └─► Bridged { rx } ◄─────────────────────┘
//!           ├─ wait()   (blocks the calling thread)
//!           └─ .await   (async callers)
//! ```
//!
//! ## Rules
//! - `f` runs exactly once; the handle resolves exactly once.
//! - Errors and panics from `f` go to the waiter, never to the loop.
//! - Called on the loop thread itself, `f` runs inline and the handle is
//!   returned already resolved.
//! - A failed call whose handle is never read is logged once.

use std::fmt;
use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::pin::Pin;
use std::task::{Context, Poll};
use std::thread::{self, ThreadId};

use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;
use tracing::warn;

use crate::core::event_loop::LoopHandle;
use crate::error::{panic_message, BusError};

type Outcome<T> = Result<T, BusError>;

/// Pending result of a call marshalled onto the loop.
///
/// Either block on it with [`Bridged::wait`] or `.await` it.
#[must_use = "a bridged call's failure is only logged if the handle is never read"]
pub struct Bridged<T> {
    rx: oneshot::Receiver<Outcome<T>>,
    loop_thread: ThreadId,
    observed: bool,
}

impl<T> Bridged<T> {
    /// A handle that is already resolved with `outcome`.
    pub(crate) fn resolved(outcome: Outcome<T>) -> Self {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(outcome);
        Self {
            rx,
            loop_thread: thread::current().id(),
            observed: false,
        }
    }

    /// Blocks the calling thread until the call completes on the loop.
    ///
    /// Returns the call's value, or the error/panic it produced.
    /// Returns [`BusError::LoopClosed`] if the loop stopped before running it,
    /// and [`BusError::Deadlock`] if called on the loop thread while the call
    /// is still queued behind the caller.
    pub fn wait(mut self) -> Outcome<T> {
        self.observed = true;

        if thread::current().id() == self.loop_thread {
            return match self.rx.try_recv() {
                Ok(outcome) => outcome,
                Err(TryRecvError::Empty) => Err(BusError::Deadlock),
                Err(TryRecvError::Closed) => Err(BusError::LoopClosed),
            };
        }

        futures::executor::block_on(&mut self.rx)
            .unwrap_or_else(|_| Err(BusError::LoopClosed))
    }

    /// Returns the result if the call already completed, without blocking.
    pub fn try_result(&mut self) -> Option<Outcome<T>> {
        match self.rx.try_recv() {
            Ok(outcome) => {
                self.observed = true;
                Some(outcome)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => {
                self.observed = true;
                Some(Err(BusError::LoopClosed))
            }
        }
    }
}

impl<T> Future for Bridged<T> {
    type Output = Outcome<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = &mut *self;
        match Pin::new(&mut this.rx).poll(cx) {
            Poll::Ready(res) => {
                this.observed = true;
                Poll::Ready(res.unwrap_or_else(|_| Err(BusError::LoopClosed)))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<T> Drop for Bridged<T> {
    fn drop(&mut self) {
        if self.observed {
            return;
        }
        // After close() the loop side can no longer deliver, so exactly one
        // of the two sides sees an unread failure.
        self.rx.close();
        if let Ok(Err(e)) = self.rx.try_recv() {
            warn!(
                error = %e,
                label = e.as_label(),
                "bridged call failed and its result was never observed"
            );
        }
    }
}

impl<T> fmt::Debug for Bridged<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridged")
            .field("observed", &self.observed)
            .finish_non_exhaustive()
    }
}

/// Runs `f` on the loop behind `handle` and returns a handle to its outcome.
///
/// Never blocks. If the caller already is on the loop thread, `f` runs
/// immediately.
///
/// # Example
/// ```
/// use loopbus::{run_on_loop, EventLoop};
///
/// let ev_loop = EventLoop::with_defaults().unwrap();
/// let handle = ev_loop.handle();
///
/// let on_loop = run_on_loop(&handle, {
///     let h = handle.clone();
///     move || Ok(h.is_current())
/// });
/// assert_eq!(on_loop.wait(), Ok(true));
/// ```
pub fn run_on_loop<T, F>(handle: &LoopHandle, f: F) -> Bridged<T>
where
    T: Send + 'static,
    F: FnOnce() -> Outcome<T> + Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    let call = move || resolve(tx, invoke(f));

    if handle.is_current() {
        call();
    } else {
        // On failure the wrapper is dropped with its sender, and the
        // receiver reports LoopClosed.
        let _ = handle.schedule(call);
    }

    Bridged {
        rx,
        loop_thread: handle.thread_id(),
        observed: false,
    }
}

fn invoke<T, F>(f: F) -> Outcome<T>
where
    F: FnOnce() -> Outcome<T>,
{
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(outcome) => outcome,
        Err(panic) => Err(BusError::Panicked {
            message: panic_message(panic.as_ref()),
        }),
    }
}

fn resolve<T>(tx: oneshot::Sender<Outcome<T>>, outcome: Outcome<T>) {
    if let Err(Err(e)) = tx.send(outcome) {
        warn!(
            error = %e,
            label = e.as_label(),
            "bridged call failed and its caller stopped waiting"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::LoopConfig;
    use crate::core::event_loop::EventLoop;
    use crate::testing::CapturedLogs;

    const UNOBSERVED: usize = 20;

    fn start() -> EventLoop {
        EventLoop::start(LoopConfig::default()).expect("loop starts")
    }

    #[test]
    fn returns_value_from_loop() {
        let ev_loop = start();
        let handle = ev_loop.handle();

        let h = handle.clone();
        let res = run_on_loop(&handle, move || Ok((h.is_current(), 40 + 2))).wait();
        assert_eq!(res, Ok((true, 42)));
    }

    #[test]
    fn error_is_returned_to_waiter() {
        let ev_loop = start();
        let res: Outcome<()> =
            run_on_loop(&ev_loop.handle(), || Err(BusError::invalid("nope"))).wait();
        assert_eq!(res, Err(BusError::invalid("nope")));
    }

    #[test]
    fn panic_is_captured_and_loop_survives() {
        let ev_loop = start();
        let handle = ev_loop.handle();

        let res: Outcome<()> = run_on_loop(&handle, || panic!("kaboom")).wait();
        assert_eq!(
            res,
            Err(BusError::Panicked {
                message: "kaboom".into()
            })
        );
        assert_eq!(handle.run(|| Ok("alive")).wait(), Ok("alive"));
    }

    const STOPPED_WAITING: &str = "its caller stopped waiting";
    const NEVER_OBSERVED: &str = "its result was never observed";

    #[test]
    fn failure_dropped_before_it_runs_is_logged_once_by_the_loop() {
        let logs = CapturedLogs::default();
        let _log = logs.install();
        let ev_loop = start();
        let handle = ev_loop.handle();

        // Hold the loop so every handle is dropped while its call is queued.
        let (gate_tx, gate_rx) = std::sync::mpsc::channel::<()>();
        handle
            .schedule(move || {
                let _ = gate_rx.recv();
            })
            .unwrap();
        for i in 0..UNOBSERVED {
            if i % 2 == 0 {
                drop(run_on_loop::<(), _>(&handle, || Err(BusError::BusDropped)));
            } else {
                drop(run_on_loop::<(), _>(&handle, || panic!("nobody listens")));
            }
            drop(run_on_loop(&handle, move || Ok(i)));
        }
        gate_tx.send(()).unwrap();
        handle.barrier().wait().unwrap();

        assert_eq!(logs.count(STOPPED_WAITING), UNOBSERVED);
        assert_eq!(logs.count(NEVER_OBSERVED), 0);
    }

    #[test]
    fn failure_dropped_after_it_ran_is_logged_once_by_the_handle() {
        let logs = CapturedLogs::default();
        let _log = logs.install();
        let ev_loop = start();
        let handle = ev_loop.handle();

        let failed: Vec<Bridged<()>> = (0..UNOBSERVED)
            .map(|_| run_on_loop(&handle, || Err(BusError::BusDropped)))
            .collect();
        let succeeded: Vec<Bridged<usize>> =
            (0..UNOBSERVED).map(|i| run_on_loop(&handle, move || Ok(i))).collect();
        handle.barrier().wait().unwrap();
        drop(failed);
        drop(succeeded);

        assert_eq!(logs.count(NEVER_OBSERVED), UNOBSERVED);
        assert_eq!(logs.count(STOPPED_WAITING), 0);
    }

    #[test]
    fn observed_failure_is_not_logged() {
        let logs = CapturedLogs::default();
        let _log = logs.install();
        let ev_loop = start();

        let res: Outcome<()> =
            run_on_loop(&ev_loop.handle(), || Err(BusError::BusDropped)).wait();
        assert_eq!(res, Err(BusError::BusDropped));
        assert_eq!(logs.count("bridged call failed"), 0);
    }

    #[test]
    fn runs_inline_when_already_on_loop() {
        let ev_loop = start();
        let handle = ev_loop.handle();

        let h = handle.clone();
        let res = handle
            .run(move || {
                let mut inner = run_on_loop(&h, || Ok(5));
                Ok(inner.try_result())
            })
            .wait();
        assert_eq!(res, Ok(Some(Ok(5))));
    }

    #[test]
    fn waiting_on_loop_for_queued_call_reports_deadlock() {
        let ev_loop = start();
        let handle = ev_loop.handle();
        let (pending_tx, pending_rx) = std::sync::mpsc::channel::<Bridged<u8>>();
        let (out_tx, out_rx) = std::sync::mpsc::channel();

        handle
            .schedule(move || {
                if let Ok(pending) = pending_rx.recv() {
                    let _ = out_tx.send(pending.wait());
                }
            })
            .unwrap();
        pending_tx.send(handle.run(|| Ok(1))).unwrap();

        let res = out_rx
            .recv_timeout(std::time::Duration::from_secs(5))
            .unwrap();
        assert_eq!(res, Err(BusError::Deadlock));
    }

    #[test]
    fn loop_closed_before_run() {
        let ev_loop = start();
        let handle = ev_loop.handle();
        ev_loop.shutdown().unwrap();

        let res = run_on_loop(&handle, || Ok(1)).wait();
        assert_eq!(res, Err(BusError::LoopClosed));
    }

    #[tokio::test]
    async fn can_be_awaited_from_another_runtime() {
        let ev_loop = start();
        let handle = ev_loop.handle();

        let h = handle.clone();
        let res = run_on_loop(&handle, move || Ok(h.is_current())).await;
        assert_eq!(res, Ok(true));

        // The loop joins its thread on drop; do it off the async runtime.
        tokio::task::spawn_blocking(move || drop(ev_loop))
            .await
            .unwrap();
    }
}
