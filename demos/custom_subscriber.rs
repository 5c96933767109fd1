//! # Example: custom_subscriber
//!
//! Demonstrates a struct-based subscriber that keeps its own state.
//!
//! Shows how to:
//! - Implement the [`Subscribe`] trait.
//! - Attach it with [`Handler::subscriber`].
//! - Publish from several threads at once.
//!
//! ## Run
//! ```bash
//! cargo run --example custom_subscriber
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use async_trait::async_trait;
use loopbus::{Bus, Event, EventLoop, Handler, Subscribe, Subscription, ALL_EVENTS};
use tracing_subscriber::EnvFilter;

/// Counts events per name.
#[derive(Default)]
struct Tally {
    counts: Mutex<HashMap<String, usize>>,
}

#[async_trait]
impl Subscribe for Tally {
    async fn on_event(&self, ev: &Event, sub: &Subscription) -> anyhow::Result<()> {
        let mut counts = self
            .counts
            .lock()
            .map_err(|_| anyhow::anyhow!("tally poisoned"))?;
        *counts.entry(ev.name().to_string()).or_default() += 1;

        if ev.name() == "tally.stop" {
            println!("[tally] stop requested; detaching {sub:?}");
            sub.unsubscribe()?;
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "tally"
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let ev_loop = EventLoop::with_defaults()?;
    let bus = Bus::new(ev_loop.handle());

    let tally = Arc::new(Tally::default());
    bus.subscribe_threadsafe(ALL_EVENTS, Handler::subscriber(tally.clone()))
        .wait()?;

    let producers: Vec<_> = ["sensor.a", "sensor.b", "sensor.c"]
        .into_iter()
        .map(|name| {
            let bus = bus.clone();
            thread::spawn(move || {
                for _ in 0..5 {
                    if let Err(e) = bus.publish_threadsafe(name, None).wait() {
                        eprintln!("[producer {name}] publish failed: {e}");
                    }
                }
            })
        })
        .collect();
    for p in producers {
        let _ = p.join();
    }

    bus.publish_threadsafe("tally.stop", None).wait()?;
    bus.publish_threadsafe("sensor.a", None).wait()?;
    thread::sleep(Duration::from_millis(100));

    let mut counts: Vec<_> = tally
        .counts
        .lock()
        .map_err(|_| "tally poisoned")?
        .clone()
        .into_iter()
        .collect();
    counts.sort();
    for (name, n) in counts {
        println!("[tally] {name}: {n}");
    }

    ev_loop.shutdown()?;
    Ok(())
}
