use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Work counters shared by a worker and its status reports.
pub struct Activity {
    started: Instant,
    /// Millis after `started` at which work was last accepted.
    last_work_ms: AtomicU64,
    handled: AtomicU64,
}

impl Activity {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            last_work_ms: AtomicU64::new(0),
            handled: AtomicU64::new(0),
        }
    }

    pub fn record(&self) {
        self.last_work_ms.store(self.elapsed_ms(), Ordering::Relaxed);
        self.handled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn idle_ms(&self) -> u64 {
        self.elapsed_ms()
            .saturating_sub(self.last_work_ms.load(Ordering::Relaxed))
    }

    pub fn handled(&self) -> u64 {
        self.handled.load(Ordering::Relaxed)
    }

    fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }
}

impl Default for Activity {
    fn default() -> Self {
        Self::new()
    }
}
