use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Default interval between dropped-report warnings.
pub const DEFAULT_WARN_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Default)]
struct DropTally {
    pending: u64,
    last_warned: Option<Instant>,
}

impl DropTally {
    fn take(&mut self, now: Instant) -> Option<u64> {
        if self.pending == 0 {
            return None;
        }
        self.last_warned = Some(now);
        Some(std::mem::take(&mut self.pending))
    }
}

/// Counts declined reports and decides when a summary warning is due.
///
/// [`record_drop`](Self::record_drop) hands back the number of drops to warn
/// about at most once per interval; the first drop is reported straight
/// away. [`take_pending`](Self::take_pending) empties the tally
/// unconditionally, for use on flush.
#[derive(Debug)]
pub struct RateLimitedWarner {
    interval: Duration,
    tally: Mutex<DropTally>,
}

impl Default for RateLimitedWarner {
    fn default() -> Self {
        Self::new(DEFAULT_WARN_INTERVAL)
    }
}

impl RateLimitedWarner {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            tally: Mutex::new(DropTally::default()),
        }
    }

    /// Count one drop. Returns `Some(count)` when a warning should be
    /// emitted now.
    pub fn record_drop(&self) -> Option<u64> {
        let now = Instant::now();
        let mut tally = self.tally.lock();
        tally.pending += 1;
        let due = tally
            .last_warned
            .is_none_or(|last| now.duration_since(last) >= self.interval);
        if due { tally.take(now) } else { None }
    }

    /// Drops counted since the last warning, if any, resetting the tally.
    pub fn take_pending(&self) -> Option<u64> {
        self.tally.lock().take(Instant::now())
    }
}
