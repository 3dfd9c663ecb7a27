// ── Wall clock abstraction ──

use chrono::{DateTime, Utc};

/// Source of wall-clock time. The engine never calls `Utc::now()`
/// directly so tests can drive time by hand.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// The real clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
