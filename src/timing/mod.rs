//! Capture pacing
//!
//! Monotonic spacing between capture attempts of one session.

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Rejects capture attempts that arrive sooner than `min_interval` after the
/// previous accepted one.
///
/// The interval runs from when an attempt was accepted, whatever its
/// outcome, so a failed capture still paces the next one.
#[derive(Debug)]
pub struct CaptureThrottle {
    min_interval: Duration,
    last_accepted: Mutex<Option<Instant>>,
}

impl CaptureThrottle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_accepted: Mutex::new(None),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Accept an attempt now, or return how long until one would be accepted.
    pub fn try_acquire(&self) -> Result<(), Duration> {
        self.try_acquire_at(Instant::now())
    }

    /// Same as [`try_acquire`](Self::try_acquire) for a given instant.
    ///
    /// Instants earlier than the last accepted one are treated as arriving
    /// at the same time.
    pub fn try_acquire_at(&self, now: Instant) -> Result<(), Duration> {
        let mut last = self
            .last_accepted
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = *last {
            let elapsed = now.saturating_duration_since(previous);
            if elapsed < self.min_interval {
                return Err(self.min_interval - elapsed);
            }
        }
        *last = Some(now);
        Ok(())
    }

    /// Forget the last accepted attempt.
    pub fn reset(&self) {
        *self
            .last_accepted
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = None;
    }
}
