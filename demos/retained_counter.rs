//! DeferredOwner Usage Example
//!
//! Simulates a retained-mode host: the value-type views are rebuilt on every
//! render pass, while the expensive session object is constructed once and
//! retained in a persistent slot.

use std::cell::Cell;
use std::rc::Rc;

use deferred_owner::DeferredOwner;

struct AnalyticsSession {
    endpoint: String,
    events: Vec<String>,
}

type SessionSlot = Rc<DeferredOwner<AnalyticsSession, Box<dyn FnOnce() -> AnalyticsSession>>>;

/// A cheap value-type view description, rebuilt on every render pass.
struct CounterView {
    clicks: u32,
    session: SessionSlot,
}

impl CounterView {
    fn body(&self) {
        println!("  [view] clicks = {}", self.clicks);
        self.session.with_mut(|session| {
            session
                .events
                .push(format!("render at {} clicks", self.clicks));
        });
    }
}

fn main() {
    println!("DeferredOwner Usage Example");
    println!("===========================");

    let builds = Rc::new(Cell::new(0u32));
    let slot: SessionSlot = Rc::new(DeferredOwner::new(Box::new({
        let builds = builds.clone();
        move || {
            builds.set(builds.get() + 1);
            println!("  [session] connecting (expensive, happens once)...");
            AnalyticsSession {
                endpoint: "https://telemetry.example.net".to_owned(),
                events: Vec::new(),
            }
        }
    })));

    println!("\n1. Slot created - nothing constructed yet:");
    println!("  initialized: {}", slot.is_initialized());

    println!("\n2. Three render passes, each with a fresh view value:");
    for clicks in 0..3 {
        let view = CounterView {
            clicks,
            session: slot.clone(),
        };
        view.body();
    }

    println!("\n3. One session behind all of them:");
    println!("  builds: {}", builds.get());
    let session = slot.borrow();
    println!("  endpoint: {}", session.endpoint);
    println!("  events recorded: {}", session.events.len());
}
