//! # Dedicated single-threaded event loop.
//!
//! [`EventLoop`] owns one OS thread driving a tokio current-thread runtime.
//! All work reaches it through a FIFO job queue; [`LoopHandle`] is the cheap,
//! cloneable side that the bus and callers use to hand work over.
//!
//! ## Architecture
//! ```text
//! caller thread(s)                     loop thread
//!   handle.schedule(f) ──┐
//!   handle.defer(f)    ──┼──► [unbounded job queue] ──► drive() ──► f()
//!   run_on_loop(f)     ──┘                                │
//!                                                         ├─► yield (lets spawned tasks run)
//!   handle.spawn(fut)  ───────────────────────────────────┼─► runtime task
//!   handle.spawn_blocking(f) ─────► blocking pool (off-loop worker threads)
//! ```
//!
//! ## Rules
//! - Jobs run one at a time, in submission order, on the loop thread.
//! - A job scheduled from inside another job runs on a later turn, never nested.
//! - A panicking job is caught and logged; the loop keeps running.
//! - On shutdown, jobs already queued still run; later submissions fail with
//!   [`BusError::LoopClosed`].

use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::thread::{self, ThreadId};

use tokio::runtime::{Builder, Handle};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, Dispatch};

use crate::core::bridge::{run_on_loop, Bridged};
use crate::core::config::LoopConfig;
use crate::error::{panic_message, BusError, LoopError};

/// Unit of work executed on the loop thread.
pub(crate) type Job = Box<dyn FnOnce() + Send + 'static>;

/// Handle to a running [`EventLoop`].
///
/// This is the collaborator interface the bus relies on. Cloning is cheap.
#[derive(Clone, Debug)]
pub struct LoopHandle {
    tx: mpsc::UnboundedSender<Job>,
    thread: ThreadId,
    runtime: Handle,
}

impl LoopHandle {
    /// True if the caller is running on this loop's thread.
    #[must_use]
    pub fn is_current(&self) -> bool {
        thread::current().id() == self.thread
    }

    pub(crate) fn thread_id(&self) -> ThreadId {
        self.thread
    }

    /// True once the loop stopped accepting jobs.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Schedules `f` to run on the loop, from any thread.
    ///
    /// Returns [`BusError::LoopClosed`] if the loop no longer accepts work;
    /// in that case `f` is dropped without running.
    pub fn schedule<F>(&self, f: F) -> Result<(), BusError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.tx
            .send(Box::new(f))
            .map_err(|_| BusError::LoopClosed)
    }

    /// Schedules `f` for the next loop turn. Loop thread only.
    ///
    /// `f` is queued behind the job that is currently running instead of being
    /// nested inside it. Returns [`BusError::NotOnLoop`] off the loop thread and
    /// [`BusError::LoopClosed`] once the loop stopped accepting work; in both
    /// cases `f` is dropped without running.
    pub fn defer<F>(&self, f: F) -> Result<(), BusError>
    where
        F: FnOnce() + Send + 'static,
    {
        if !self.is_current() {
            return Err(BusError::NotOnLoop);
        }
        self.schedule(f)
    }

    /// Starts `fut` as a fire-and-forget task on the loop's runtime.
    pub fn spawn<Fut>(&self, fut: Fut) -> JoinHandle<Fut::Output>
    where
        Fut: Future + Send + 'static,
        Fut::Output: Send + 'static,
    {
        self.runtime.spawn(fut)
    }

    /// Runs `f` on the worker pool, off the loop thread.
    pub fn spawn_blocking<F, R>(&self, f: F) -> JoinHandle<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        self.runtime.spawn_blocking(f)
    }

    /// Runs `f` on the loop and returns a handle to its result.
    ///
    /// Shorthand for [`run_on_loop`].
    pub fn run<T, F>(&self, f: F) -> Bridged<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, BusError> + Send + 'static,
    {
        run_on_loop(self, f)
    }

    /// Resolves once every job queued before it has run.
    pub fn barrier(&self) -> Bridged<()> {
        run_on_loop(self, || Ok(()))
    }
}

/// A dedicated loop thread with its own runtime.
///
/// Dropping an `EventLoop` stops it (see [`EventLoop::shutdown`]).
#[derive(Debug)]
pub struct EventLoop {
    handle: LoopHandle,
    stop: CancellationToken,
    thread: Option<thread::JoinHandle<()>>,
}

impl EventLoop {
    /// Builds the runtime and starts the loop thread.
    ///
    /// The loop thread logs through the `tracing` dispatcher that is current
    /// for the caller of `start`.
    pub fn start(cfg: LoopConfig) -> Result<Self, LoopError> {
        let mut builder = Builder::new_current_thread();
        builder.enable_all();
        if let Some(n) = cfg.blocking_limit() {
            builder.max_blocking_threads(n);
        }
        let runtime = builder.build()?;
        let runtime_handle = runtime.handle().clone();

        let (tx, rx) = mpsc::unbounded_channel::<Job>();
        let stop = CancellationToken::new();
        let grace = cfg.shutdown_grace;

        let token = stop.clone();
        let dispatch = tracing::dispatcher::get_default(Dispatch::clone);
        let thread = thread::Builder::new()
            .name(cfg.thread_name.clone())
            .spawn(move || {
                let _log = tracing::dispatcher::set_default(&dispatch);
                runtime.block_on(drive(rx, token));
                runtime.shutdown_timeout(grace);
            })?;

        debug!(thread = %cfg.thread_name, "event loop started");
        let handle = LoopHandle {
            tx,
            thread: thread.thread().id(),
            runtime: runtime_handle,
        };

        Ok(Self {
            handle,
            stop,
            thread: Some(thread),
        })
    }

    /// Starts a loop with [`LoopConfig::default`].
    pub fn with_defaults() -> Result<Self, LoopError> {
        Self::start(LoopConfig::default())
    }

    /// Returns a handle for scheduling work on this loop.
    #[must_use]
    pub fn handle(&self) -> LoopHandle {
        self.handle.clone()
    }

    /// Stops the loop and waits for its thread to exit.
    ///
    /// Jobs already queued still run. Blocking handlers get up to
    /// [`LoopConfig::shutdown_grace`] to finish.
    pub fn shutdown(mut self) -> Result<(), LoopError> {
        self.stop_and_join()
    }

    fn stop_and_join(&mut self) -> Result<(), LoopError> {
        self.stop.cancel();
        let Some(thread) = self.thread.take() else {
            return Ok(());
        };
        if self.handle.is_current() {
            // Joining ourselves would deadlock; the loop exits after this job.
            return Ok(());
        }
        thread.join().map_err(|_| LoopError::Panicked)
    }
}

impl Drop for EventLoop {
    fn drop(&mut self) {
        if let Err(e) = self.stop_and_join() {
            error!(error = %e, "event loop did not stop cleanly");
        }
    }
}

/// Drains the job queue until cancelled.
async fn drive(mut rx: mpsc::UnboundedReceiver<Job>, stop: CancellationToken) {
    loop {
        tokio::select! {
            biased;
            _ = stop.cancelled() => break,
            job = rx.recv() => match job {
                Some(job) => run_job(job),
                None => break,
            },
        }
        // Give tasks started by this job a turn before the next job.
        tokio::task::yield_now().await;
    }

    rx.close();
    while let Ok(job) = rx.try_recv() {
        run_job(job);
    }
    debug!("event loop stopped");
}

fn run_job(job: Job) {
    if let Err(panic) = catch_unwind(AssertUnwindSafe(job)) {
        error!(
            panic = %panic_message(panic.as_ref()),
            "job panicked on the event loop"
        );
    }
}
