//! Fixed-rate tick loop and subscriber fan-out.
//!
//! The cadence/timing-statistics split mirrors
//! `evo_control_unit::cycle::{CycleRunner, CycleStats}`: a small stats
//! struct updated in O(1) per tick, and a loop body that never blocks on a
//! subscriber falling behind.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;
use tokio::time::{Duration, Instant};

use kpp_common::sim::snapshot::{PublisherStats, Snapshot};

/// Running tick-timing statistics, recorded once per executed tick.
#[derive(Debug, Clone, Copy, Default)]
struct TickStats {
    tick_count: u64,
    overruns: u64,
    window_start: Option<Instant>,
    window_ticks: u64,
    effective_rate_hz: f64,
}

impl TickStats {
    fn record(&mut self, now: Instant, overran: bool) {
        self.tick_count += 1;
        if overran {
            self.overruns += 1;
        }
        match self.window_start {
            None => {
                self.window_start = Some(now);
                self.window_ticks = 1;
            }
            Some(start) => {
                self.window_ticks += 1;
                let elapsed = now.saturating_duration_since(start).as_secs_f64();
                if elapsed >= 1.0 {
                    self.effective_rate_hz = self.window_ticks as f64 / elapsed;
                    self.window_start = Some(now);
                    self.window_ticks = 0;
                }
            }
        }
    }
}

struct SubscriberQueue {
    id: u64,
    capacity: usize,
    queue: Mutex<VecDeque<Arc<Snapshot>>>,
    notify: Notify,
    drops: AtomicU64,
}

/// A registered subscription; dropped automatically if the handle is
/// dropped without an explicit `unsubscribe`.
pub struct SubscriberHandle {
    id: u64,
    inner: Arc<SubscriberQueue>,
}

impl SubscriberHandle {
    /// Subscriber id, used with [`Publisher::unsubscribe`].
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Await the next snapshot. Never blocks the publisher — drop-oldest
    /// happens on the publish side, not here.
    pub async fn recv(&self) -> Arc<Snapshot> {
        loop {
            if let Some(snap) = self.inner.queue.lock().expect("subscriber lock poisoned").pop_front() {
                return snap;
            }
            self.inner.notify.notified().await;
        }
    }
}

/// Fans out committed snapshots to registered subscribers with a bounded
/// per-subscriber buffer and drop-oldest overflow policy.
pub struct Publisher {
    subscribers: Mutex<Vec<Arc<SubscriberQueue>>>,
    next_id: AtomicU64,
    stats: Mutex<TickStats>,
    tick_interval: Duration,
}

impl Publisher {
    /// Construct a publisher targeting `tick_rate_hz`.
    pub fn new(tick_rate_hz: f64) -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            stats: Mutex::new(TickStats::default()),
            tick_interval: Duration::from_secs_f64(1.0 / tick_rate_hz),
        }
    }

    /// Configured tick interval, for the owning loop's `tokio::time::interval`.
    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Register a new subscriber with the given bounded buffer size.
    pub fn subscribe(&self, buffer_size: usize) -> SubscriberHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let inner = Arc::new(SubscriberQueue {
            id,
            capacity: buffer_size.max(1),
            queue: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
            drops: AtomicU64::new(0),
        });
        self.subscribers.lock().expect("subscriber list poisoned").push(Arc::clone(&inner));
        SubscriberHandle { id, inner }
    }

    /// Remove a subscriber; future publishes no longer reach it.
    pub fn unsubscribe(&self, id: u64) {
        self.subscribers.lock().expect("subscriber list poisoned").retain(|s| s.id != id);
    }

    /// Fan out `snapshot` to every registered subscriber, dropping the
    /// oldest undelivered frame for any subscriber whose buffer is full.
    /// Never blocks on a slow subscriber.
    pub fn publish(&self, snapshot: &Arc<Snapshot>) {
        let subscribers = self.subscribers.lock().expect("subscriber list poisoned");
        for sub in subscribers.iter() {
            let mut queue = sub.queue.lock().expect("subscriber lock poisoned");
            if queue.len() >= sub.capacity {
                queue.pop_front();
                sub.drops.fetch_add(1, Ordering::Relaxed);
            }
            queue.push_back(Arc::clone(snapshot));
            drop(queue);
            sub.notify.notify_waiters();
        }
    }

    /// Record one executed tick's timing for the `PublisherStats` block.
    /// `overran` is true when the tick's actual interval exceeded the
    /// target by more than 50% (the clock-drift threshold).
    pub fn record_tick(&self, now: Instant, overran: bool) {
        self.stats.lock().expect("stats lock poisoned").record(now, overran);
    }

    /// Build the `PublisherStats` block for the next committed snapshot.
    pub fn stats(&self, ring_buffer_count: usize, ring_buffer_bytes: usize) -> PublisherStats {
        let stats = *self.stats.lock().expect("stats lock poisoned");
        let subscriber_drops = self
            .subscribers
            .lock()
            .expect("subscriber list poisoned")
            .iter()
            .map(|s| (s.id, s.drops.load(Ordering::Relaxed)))
            .collect();

        PublisherStats {
            effective_tick_rate_hz: stats.effective_rate_hz,
            overrun_count: stats.overruns,
            subscriber_drops,
            ring_buffer_bytes,
            ring_buffer_count,
        }
    }
}
