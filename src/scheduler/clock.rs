use chrono::{DateTime, Duration, Utc};
use std::sync::{Mutex, PoisonError};
use tokio::time::Instant;

/// Source of the instant each refresh and tick propagates to.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Starts at `origin` and advances `scale` times faster than the runtime's
/// monotonic clock. Saturates at the latest representable instant.
#[derive(Debug, Clone)]
pub struct SimulatedClock {
    origin: DateTime<Utc>,
    started: Instant,
    scale: f64,
}

impl SimulatedClock {
    /// Negative or non-finite scales freeze the clock at `origin`.
    pub fn new(origin: DateTime<Utc>, scale: f64) -> Self {
        let scale = if scale.is_finite() && scale >= 0.0 {
            scale
        } else {
            0.0
        };
        Self {
            origin,
            started: Instant::now(),
            scale,
        }
    }
}

impl Clock for SimulatedClock {
    fn now(&self) -> DateTime<Utc> {
        let scaled = self.started.elapsed().as_secs_f64() * self.scale;
        std::time::Duration::try_from_secs_f64(scaled)
            .ok()
            .and_then(|elapsed| Duration::from_std(elapsed).ok())
            .and_then(|elapsed| self.origin.checked_add_signed(elapsed))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

/// Moves only when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
