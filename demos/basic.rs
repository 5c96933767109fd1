//! # Example: basic
//!
//! Starts a loop, subscribes handlers in every mode and publishes a few events
//! from the main thread.
//!
//! Shows how to:
//! - Start an [`EventLoop`] and bind a [`Bus`] to it.
//! - Use deferred, blocking and async [`Handler`]s.
//! - Listen to every event with [`ALL_EVENTS`].
//! - Unsubscribe from inside a handler.
//!
//! ## Flow
//! ```text
//! main thread ──subscribe_threadsafe──► loop: Registry
//! main thread ──publish_threadsafe────► loop: resolve ──► handlers
//!                                                ├─ deferred ─► next loop turn
//!                                                ├─ blocking ─► worker pool
//!                                                └─ async    ─► loop task
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=debug cargo run --example basic
//! ```

use std::time::Duration;

use loopbus::{Bus, Event, EventLoop, Handler, ALL_EVENTS};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
struct Order {
    id: u32,
    total_cents: u64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let ev_loop = EventLoop::with_defaults()?;
    let bus = Bus::new(ev_loop.handle());

    bus.subscribe_threadsafe(
        "order.created",
        Handler::sync(|ev| {
            if let Some(order) = ev.payload::<Order>() {
                println!("[ledger] order #{} for {} cents", order.id, order.total_cents);
            }
            Ok(())
        })
        .named("ledger"),
    )
    .wait()?;

    bus.subscribe_threadsafe(
        "order.created",
        Handler::sync(|ev| {
            std::thread::sleep(Duration::from_millis(50));
            println!("[mailer] receipt sent for {ev}");
            Ok(())
        })
        .blocking()
        .named("mailer"),
    )
    .wait()?;

    bus.subscribe_threadsafe(
        ["order.created", "order.cancelled"],
        Handler::spawn(|ev| async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            println!("[audit] {} (seq {})", ev, ev.seq);
            Ok(())
        })
        .named("audit"),
    )
    .wait()?;

    bus.subscribe_threadsafe(
        "order.created",
        Handler::sync_with_context(|ev, sub| {
            println!("[welcome] first order seen: {ev}; unsubscribing");
            sub.unsubscribe()?;
            Ok(())
        })
        .named("welcome"),
    )
    .wait()?;

    bus.subscribe_threadsafe(
        ALL_EVENTS,
        Handler::sync(|ev| {
            println!("[tap] {ev}");
            Ok(())
        })
        .named("tap"),
    )
    .wait()?;

    for id in 1..=2 {
        let order = Order {
            id,
            total_cents: 1_250 * u64::from(id),
        };
        bus.publish_threadsafe("order.created", Some(Event::payload_of(order)))
            .wait()?;
    }
    bus.publish_threadsafe("order.cancelled", None).wait()?;

    for (name, subs) in bus.handlers_threadsafe().wait()? {
        println!("[handlers] {name}: {subs:?}");
    }

    // Let async and blocking handlers finish before stopping the loop.
    std::thread::sleep(Duration::from_millis(200));
    ev_loop.shutdown()?;
    Ok(())
}
