//! Bounded ring buffer of committed snapshots: single writer, many readers,
//! capped by both entry count and approximate byte size.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use kpp_common::sim::snapshot::Snapshot;

/// The state manager. Readers never block the writer and vice versa beyond
/// the brief critical section each `RwLock` acquisition represents — a
/// writer that appends under a brief mutex, rather than a fully lock-free
/// structure.
pub struct StateManager {
    buffer: RwLock<VecDeque<Arc<Snapshot>>>,
    bytes_used: AtomicUsize,
    max_count: usize,
    max_bytes: usize,
}

impl StateManager {
    /// Construct an empty ring buffer with the given caps.
    pub fn new(max_count: usize, max_bytes: usize) -> Self {
        Self {
            buffer: RwLock::new(VecDeque::new()),
            bytes_used: AtomicUsize::new(0),
            max_count,
            max_bytes,
        }
    }

    /// Append `snapshot`, evicting the oldest entries until both caps are
    /// satisfied. Single-writer only; O(1) amortized.
    pub fn commit(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let snapshot = Arc::new(snapshot);
        let size = snapshot.approx_size_bytes();
        let mut buf = self.buffer.write().expect("state manager lock poisoned");
        buf.push_back(Arc::clone(&snapshot));
        self.bytes_used.fetch_add(size, Ordering::Relaxed);

        while buf.len() > self.max_count || self.bytes_used.load(Ordering::Relaxed) > self.max_bytes {
            match buf.pop_front() {
                Some(evicted) => {
                    self.bytes_used.fetch_sub(evicted.approx_size_bytes(), Ordering::Relaxed);
                }
                None => break,
            }
        }

        snapshot
    }

    /// Most recent snapshot, by shared reference. Never blocks the writer
    /// for longer than the read lock's critical section.
    pub fn latest(&self) -> Option<Arc<Snapshot>> {
        self.buffer.read().expect("state manager lock poisoned").back().cloned()
    }

    /// A coherent slice of up to `limit` entries with `step_index >= from_index`,
    /// ending at the most recent snapshot.
    pub fn range(&self, from_index: u64, limit: usize) -> Vec<Arc<Snapshot>> {
        let buf = self.buffer.read().expect("state manager lock poisoned");
        let matching: Vec<_> = buf.iter().filter(|s| s.step_index >= from_index).cloned().collect();
        let start = matching.len().saturating_sub(limit);
        matching[start..].to_vec()
    }

    /// Current occupancy: `(entry_count, bytes)`, reported in each
    /// snapshot's `PublisherStats` block.
    pub fn occupancy(&self) -> (usize, usize) {
        let count = self.buffer.read().expect("state manager lock poisoned").len();
        (count, self.bytes_used.load(Ordering::Relaxed))
    }
}
