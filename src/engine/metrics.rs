//! SKIPTTL - Engine Metrics & Observability
//! Provides atomic counters for tracking engine operations.
//!
//! Counters are bumped from `&self` lookups as well as `&mut self`
//! mutations, so they use `AtomicU64` with `Ordering::Relaxed`:
//! only eventual consistency is needed for observability.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Atomic operation counters for a skip list.
#[derive(Debug)]
pub struct EngineMetrics {
    /// Inserts that linked a new node.
    pub inserts: AtomicU64,
    /// Inserts that overwrote an existing key in place.
    pub updates: AtomicU64,
    /// Total number of lookups.
    pub searches: AtomicU64,
    /// Lookups that returned a live value.
    pub hits: AtomicU64,
    /// Nodes unlinked by explicit erase.
    pub erases: AtomicU64,
    /// Completed sweep passes.
    pub sweeps: AtomicU64,
    /// Nodes unlinked by sweeps.
    pub expired_removed: AtomicU64,
    /// Timestamp when the list was created.
    created: Instant,
}

impl EngineMetrics {
    /// Create a new metrics instance with all counters at zero.
    pub fn new() -> Self {
        Self {
            inserts: AtomicU64::new(0),
            updates: AtomicU64::new(0),
            searches: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            erases: AtomicU64::new(0),
            sweeps: AtomicU64::new(0),
            expired_removed: AtomicU64::new(0),
            created: Instant::now(),
        }
    }

    /// Record an insert that linked a new node.
    pub fn record_insert(&self) {
        self.inserts.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an insert that overwrote an existing key.
    pub fn record_update(&self) {
        self.updates.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a lookup and whether it found a live value.
    pub fn record_search(&self, hit: bool) {
        self.searches.fetch_add(1, Ordering::Relaxed);
        if hit {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record an explicit erase.
    pub fn record_erase(&self) {
        self.erases.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a finished sweep that removed `removed` nodes.
    pub fn record_sweep(&self, removed: usize) {
        self.sweeps.fetch_add(1, Ordering::Relaxed);
        self.expired_removed
            .fetch_add(removed as u64, Ordering::Relaxed);
    }

    /// Get uptime in seconds.
    pub fn uptime_secs(&self) -> f64 {
        self.created.elapsed().as_secs_f64()
    }

    /// Inserts + updates + searches + erases.
    pub fn total_ops(&self) -> u64 {
        self.inserts.load(Ordering::Relaxed)
            + self.updates.load(Ordering::Relaxed)
            + self.searches.load(Ordering::Relaxed)
            + self.erases.load(Ordering::Relaxed)
    }

    /// Fraction of lookups that found a live value.
    pub fn hit_ratio(&self) -> f64 {
        let searches = self.searches.load(Ordering::Relaxed);
        if searches == 0 {
            return 0.0;
        }
        self.hits.load(Ordering::Relaxed) as f64 / searches as f64
    }

    /// Format metrics as a human-readable report.
    pub fn report(&self) -> String {
        format!(
            "\n═══ SKIPTTL Metrics ═══\n\
             Operations:\n\
               inserts:   {}\n\
               updates:   {}\n\
               searches:  {}\n\
               hits:      {} ({:.1}%)\n\
               erases:    {}\n\
             Expiration:\n\
               sweeps:    {}\n\
               expired:   {}\n\
             Total ops: {}\n\
             Uptime: {:.2}s",
            self.inserts.load(Ordering::Relaxed),
            self.updates.load(Ordering::Relaxed),
            self.searches.load(Ordering::Relaxed),
            self.hits.load(Ordering::Relaxed),
            self.hit_ratio() * 100.0,
            self.erases.load(Ordering::Relaxed),
            self.sweeps.load(Ordering::Relaxed),
            self.expired_removed.load(Ordering::Relaxed),
            self.total_ops(),
            self.uptime_secs(),
        )
    }
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self::new()
    }
}
