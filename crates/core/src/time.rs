use chrono::{DateTime, Duration, Utc};

/// Where suspension checkpoints read wall time from.
///
/// A live exam reads the system clock. Tests pin it and step it forward to
/// stand in for minutes spent in the background, since no ticks arrive
/// while suspended and only the wall-clock gap tells how much to deduct.
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    /// System time, for a candidate actually sitting the exam.
    #[default]
    Default,
    /// Frozen at a timestamp until `advance` moves it.
    Fixed(DateTime<Utc>),
}

impl Clock {
    #[must_use]
    pub fn default_clock() -> Self {
        Self::Default
    }

    /// Pins checkpoints to `at`, so a suspension gap is exactly what the
    /// caller advances by.
    #[must_use]
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self::Fixed(at)
    }

    /// Reading taken when the host leaves or returns to the foreground.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::Default => Utc::now(),
            Clock::Fixed(t) => *t,
        }
    }

    /// Simulates time passing in the background. A live clock is untouched.
    pub fn advance(&mut self, delta: Duration) {
        if let Clock::Fixed(t) = self {
            *t += delta;
        }
    }

    #[must_use]
    pub fn is_fixed(&self) -> bool {
        matches!(self, Clock::Fixed(_))
    }
}

/// Time between `earlier` and `later`, never negative.
///
/// A clock that jumped backwards yields a zero gap rather than adding time
/// back to a countdown.
#[must_use]
pub fn gap_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> Duration {
    (later - earlier).max(Duration::zero())
}

/// Unix seconds every suspension test starts from (2023-11-14T22:13:20Z).
pub const FIXED_TEST_TIMESTAMP: i64 = 1_700_000_000;

/// The moment a test exam goes to the background.
///
/// # Panics
///
/// Panics if `FIXED_TEST_TIMESTAMP` is out of chrono's range.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(FIXED_TEST_TIMESTAMP, 0)
        .expect("test timestamp is in range")
}

/// Clock for tests that step through a background gap.
#[must_use]
pub fn fixed_clock() -> Clock {
    Clock::fixed(fixed_now())
}
