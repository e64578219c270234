//! SKIPTTL - Time-To-Live (TTL) Support
//! Provides per-entry expiration, similar to Redis EXPIRE.
//!
//! Entries with an expiry are treated as absent by lookups once their
//! deadline has passed, but stay linked in the list until a sweep
//! (`remove_expired_nodes` / `cleanup_expired_nodes`) removes them.
//!
//! ## Clock
//! Deadlines are `std::time::Instant`s, read from the monotonic clock.
//! There is no wall-clock or timezone dependency.

use std::time::{Duration, Instant};

/// Expiration deadline of a single entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Expiry {
    /// The entry lives until it is erased.
    #[default]
    Never,
    /// The entry is logically deleted once the clock is past this instant.
    At(Instant),
}

impl Expiry {
    /// Expire `ttl` from now.
    pub fn after(ttl: Duration) -> Self {
        Self::after_from(Instant::now(), ttl)
    }

    /// Expire `ttl` after `now`. Saturates to `Never` if the deadline
    /// cannot be represented.
    pub fn after_from(now: Instant, ttl: Duration) -> Self {
        match now.checked_add(ttl) {
            Some(deadline) => Expiry::At(deadline),
            None => Expiry::Never,
        }
    }

    /// Returns true if this entry never expires.
    pub fn is_never(&self) -> bool {
        matches!(self, Expiry::Never)
    }

    /// Absolute deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        match *self {
            Expiry::Never => None,
            Expiry::At(deadline) => Some(deadline),
        }
    }

    /// Check whether the deadline has passed as of `now`.
    /// An entry is still live at exactly its deadline.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        match *self {
            Expiry::Never => false,
            Expiry::At(deadline) => now > deadline,
        }
    }

    /// Check against the current monotonic time.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    /// Time left before expiry as of `now`.
    /// Returns `None` for entries without a TTL and `Some(ZERO)` once expired.
    pub fn remaining_at(&self, now: Instant) -> Option<Duration> {
        self.deadline()
            .map(|deadline| deadline.saturating_duration_since(now))
    }
}
