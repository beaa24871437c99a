use std::sync::{Mutex, PoisonError};
use std::time::Instant;

use chrono::{Duration, Utc};
use stow_types::Timestamp;

/// Monotonic, sub-millisecond timestamp source for writes.
///
/// The wall clock is read once, when the clock is created. Every later
/// reading is that anchor plus the elapsed time of the monotonic
/// high-resolution counter, so two writes issued back to back never collide
/// on a coarse system-clock tick.
///
/// # Guarantee
///
/// Readings are strictly increasing across all threads sharing the clock: if
/// the counter has not advanced since the last reading, the new reading is
/// bumped one nanosecond past it.
pub struct WriteClock {
    anchor_wall: Timestamp,
    anchor_instant: Instant,
    last: Mutex<Option<Timestamp>>,
}

impl WriteClock {
    /// Create a clock anchored at the current wall-clock time.
    pub fn new() -> Self {
        Self::starting_at(Utc::now())
    }

    /// Create a clock whose first readings start at `anchor`.
    pub fn starting_at(anchor: Timestamp) -> Self {
        Self {
            anchor_wall: anchor,
            anchor_instant: Instant::now(),
            last: Mutex::new(None),
        }
    }

    /// Take the next timestamp.
    pub fn now(&self) -> Timestamp {
        let elapsed = Duration::from_std(self.anchor_instant.elapsed()).unwrap_or(Duration::zero());
        let candidate = self
            .anchor_wall
            .checked_add_signed(elapsed)
            .unwrap_or(self.anchor_wall);

        // The guarded value is a plain timestamp; a panic elsewhere cannot
        // leave it half-written.
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);

        let next = match *last {
            Some(prev) if candidate <= prev => prev + Duration::nanoseconds(1),
            _ => candidate,
        };

        *last = Some(next);
        next
    }

    /// The wall-clock instant this clock is anchored at.
    pub fn anchor(&self) -> Timestamp {
        self.anchor_wall
    }
}

impl Default for WriteClock {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for WriteClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriteClock")
            .field("anchor", &self.anchor_wall)
            .finish()
    }
}
