//! Countdown for a timed exam.
//!
//! While the host is in the foreground every tick removes exactly one second,
//! whatever wall time actually passed between ticks. Time spent suspended is
//! corrected on resume from the wall-clock gap, since no ticks are delivered
//! while the host is in the background.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::time::gap_between;

/// Above this much remaining time the countdown is `Urgency::Normal`.
pub const WARNING_THRESHOLD_SECS: i64 = 300;
/// At or below this much remaining time the countdown is `Urgency::Critical`.
pub const CRITICAL_THRESHOLD_SECS: i64 = 60;

//
// ─── PHASE / EVENTS ────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerPhase {
    /// Created, never started.
    Ready,
    Running,
    Paused,
    /// Halted by the owner. Terminal.
    Stopped,
    /// Reached zero. Terminal.
    Expired,
}

impl TimerPhase {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, TimerPhase::Stopped | TimerPhase::Expired)
    }
}

/// What a tick or a resume did to the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// Nothing changed (not running, suspended, or already finished).
    Idle,
    /// Time was removed and some is left.
    Counting { remaining: Duration },
    /// Remaining time reached zero. Emitted once per timer.
    Expired,
}

/// Three-tier classification used to color the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Normal,
    Warning,
    Critical,
}

impl Urgency {
    #[must_use]
    pub fn for_remaining(remaining: Duration) -> Self {
        if remaining > Duration::seconds(WARNING_THRESHOLD_SECS) {
            Urgency::Normal
        } else if remaining > Duration::seconds(CRITICAL_THRESHOLD_SECS) {
            Urgency::Warning
        } else {
            Urgency::Critical
        }
    }
}

/// Formats a duration as `MM:SS`, truncating sub-second parts.
///
/// Minutes are not wrapped into hours, so three hours reads `180:00`.
#[must_use]
pub fn format_mm_ss(remaining: Duration) -> String {
    let secs = remaining.num_seconds().max(0);
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

//
// ─── TIMER ─────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountdownTimer {
    total: Duration,
    remaining: Duration,
    phase: TimerPhase,
    suspended_at: Option<DateTime<Utc>>,
}

impl CountdownTimer {
    /// Creates a timer holding `total`. Negative input is treated as zero.
    #[must_use]
    pub fn new(total: Duration) -> Self {
        let total = total.max(Duration::zero());
        Self {
            total,
            remaining: total,
            phase: TimerPhase::Ready,
            suspended_at: None,
        }
    }

    #[must_use]
    pub fn total(&self) -> Duration {
        self.total
    }

    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    /// Whole seconds left, for display and snapshots.
    #[must_use]
    pub fn remaining_secs(&self) -> u64 {
        u64::try_from(self.remaining.num_seconds()).unwrap_or(0)
    }

    /// Time consumed so far.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.total - self.remaining
    }

    #[must_use]
    pub fn phase(&self) -> TimerPhase {
        self.phase
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.phase == TimerPhase::Running
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.phase == TimerPhase::Expired
    }

    #[must_use]
    pub fn is_suspended(&self) -> bool {
        self.suspended_at.is_some()
    }

    #[must_use]
    pub fn time_string(&self) -> String {
        format_mm_ss(self.remaining)
    }

    #[must_use]
    pub fn urgency(&self) -> Urgency {
        Urgency::for_remaining(self.remaining)
    }

    /// Starts or continues counting. Returns `false` if already running, the
    /// timer has finished, or the host is still suspended.
    pub fn start(&mut self) -> bool {
        if self.suspended_at.is_some() {
            debug!("start refused while suspended");
            return false;
        }
        match self.phase {
            TimerPhase::Ready | TimerPhase::Paused => {
                self.phase = TimerPhase::Running;
                info!(remaining = %self.time_string(), "countdown started");
                true
            }
            _ => false,
        }
    }

    /// Halts counting and keeps the remaining time for a later `start`.
    pub fn pause(&mut self) -> bool {
        if self.phase != TimerPhase::Running {
            return false;
        }
        self.phase = TimerPhase::Paused;
        debug!(remaining = %self.time_string(), "countdown paused");
        true
    }

    /// Halts counting for good.
    pub fn stop(&mut self) -> bool {
        if self.phase.is_terminal() {
            return false;
        }
        self.phase = TimerPhase::Stopped;
        self.suspended_at = None;
        debug!(remaining = %self.time_string(), "countdown stopped");
        true
    }

    /// Removes one second. Emits `Expired` on the tick that reaches zero.
    ///
    /// Ticks are ignored unless running, and while a suspension checkpoint is
    /// outstanding.
    pub fn tick(&mut self) -> TimerEvent {
        if self.phase != TimerPhase::Running || self.suspended_at.is_some() {
            return TimerEvent::Idle;
        }

        self.remaining = self
            .remaining
            .checked_sub(&Duration::seconds(1))
            .unwrap_or_else(Duration::zero)
            .max(Duration::zero());

        if self.remaining.is_zero() {
            return self.expire();
        }

        trace!(remaining = %self.time_string(), "tick");
        TimerEvent::Counting {
            remaining: self.remaining,
        }
    }

    /// Records the moment the host lost the foreground.
    ///
    /// Only a running countdown is checkpointed; time spent paused or not yet
    /// started is never deducted.
    pub fn on_suspend(&mut self, now: DateTime<Utc>) {
        if self.phase != TimerPhase::Running {
            return;
        }
        self.suspended_at = Some(now);
        info!(remaining = %self.time_string(), "countdown suspended");
    }

    /// Removes the wall time spent suspended.
    ///
    /// The checkpoint is consumed either way. Without a checkpoint, or when
    /// the timer is not running, nothing is deducted.
    pub fn on_resume(&mut self, now: DateTime<Utc>) -> TimerEvent {
        let Some(checkpoint) = self.suspended_at.take() else {
            return TimerEvent::Idle;
        };
        if self.phase != TimerPhase::Running {
            return TimerEvent::Idle;
        }

        let gap = gap_between(checkpoint, now);
        self.remaining = self
            .remaining
            .checked_sub(&gap)
            .unwrap_or_else(Duration::zero)
            .max(Duration::zero());
        info!(
            gap_ms = gap.num_milliseconds(),
            remaining = %self.time_string(),
            "countdown resumed"
        );

        if self.remaining.is_zero() {
            return self.expire();
        }
        TimerEvent::Counting {
            remaining: self.remaining,
        }
    }

    fn expire(&mut self) -> TimerEvent {
        self.remaining = Duration::zero();
        self.phase = TimerPhase::Expired;
        self.suspended_at = None;
        info!("countdown expired");
        TimerEvent::Expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::{fixed_clock, fixed_now};

    fn running(secs: i64) -> CountdownTimer {
        let mut timer = CountdownTimer::new(Duration::seconds(secs));
        assert!(timer.start());
        timer
    }

    #[test]
    fn five_ticks_count_down_and_expire_once() {
        let mut timer = running(5);
        let mut seen = Vec::new();
        for _ in 0..4 {
            match timer.tick() {
                TimerEvent::Counting { remaining } => seen.push(remaining.num_seconds()),
                other => panic!("unexpected {other:?}"),
            }
        }
        assert_eq!(seen, vec![4, 3, 2, 1]);
        assert_eq!(timer.tick(), TimerEvent::Expired);
        assert_eq!(timer.remaining(), Duration::zero());
        assert!(timer.is_expired());
        assert!(!timer.is_running());

        assert_eq!(timer.tick(), TimerEvent::Idle);
        assert_eq!(timer.tick(), TimerEvent::Idle);
    }

    #[test]
    fn zero_length_timer_expires_on_first_tick() {
        let mut timer = running(0);
        assert_eq!(timer.tick(), TimerEvent::Expired);
        assert_eq!(timer.tick(), TimerEvent::Idle);
    }

    #[test]
    fn tick_before_start_is_idle() {
        let mut timer = CountdownTimer::new(Duration::seconds(10));
        assert_eq!(timer.tick(), TimerEvent::Idle);
        assert_eq!(timer.remaining(), Duration::seconds(10));
        assert_eq!(timer.phase(), TimerPhase::Ready);
    }

    #[test]
    fn pause_preserves_remaining_for_restart() {
        let mut timer = running(10);
        timer.tick();
        assert!(timer.pause());
        assert_eq!(timer.tick(), TimerEvent::Idle);
        assert_eq!(timer.remaining(), Duration::seconds(9));

        assert!(timer.start());
        assert_eq!(
            timer.tick(),
            TimerEvent::Counting {
                remaining: Duration::seconds(8)
            }
        );
    }

    #[test]
    fn stop_is_terminal() {
        let mut timer = running(10);
        assert!(timer.stop());
        assert!(!timer.stop());
        assert!(!timer.start());
        assert_eq!(timer.tick(), TimerEvent::Idle);
        assert_eq!(timer.phase(), TimerPhase::Stopped);
    }

    #[test]
    fn resume_deducts_the_suspension_gap() {
        let mut clock = fixed_clock();
        let mut timer = running(30);

        timer.on_suspend(clock.now());
        clock.advance(Duration::seconds(10));
        let event = timer.on_resume(clock.now());

        assert_eq!(
            event,
            TimerEvent::Counting {
                remaining: Duration::seconds(20)
            }
        );
        assert!(timer.is_running());
        assert!(!timer.is_suspended());
    }

    #[test]
    fn resume_keeps_sub_second_precision() {
        let mut clock = fixed_clock();
        let mut timer = running(30);

        timer.on_suspend(clock.now());
        clock.advance(Duration::milliseconds(10_400));
        timer.on_resume(clock.now());

        assert_eq!(timer.remaining(), Duration::milliseconds(19_600));
        assert_eq!(timer.time_string(), "00:19");
    }

    #[test]
    fn long_suspension_clamps_to_zero_and_expires_once() {
        let mut clock = fixed_clock();
        let mut timer = running(5);

        timer.on_suspend(clock.now());
        clock.advance(Duration::seconds(20));
        assert_eq!(timer.on_resume(clock.now()), TimerEvent::Expired);
        assert_eq!(timer.remaining(), Duration::zero());

        assert_eq!(timer.on_resume(clock.now()), TimerEvent::Idle);
        assert_eq!(timer.tick(), TimerEvent::Idle);
    }

    #[test]
    fn ticks_are_ignored_while_suspended() {
        let now = fixed_now();
        let mut timer = running(30);
        timer.on_suspend(now);
        assert_eq!(timer.tick(), TimerEvent::Idle);
        assert_eq!(timer.remaining(), Duration::seconds(30));
    }

    #[test]
    fn resume_without_suspend_is_a_no_op() {
        let mut timer = running(30);
        assert_eq!(timer.on_resume(fixed_now()), TimerEvent::Idle);
        assert_eq!(timer.remaining(), Duration::seconds(30));
    }

    #[test]
    fn resume_while_paused_deducts_nothing() {
        let mut clock = fixed_clock();
        let mut timer = running(30);
        timer.pause();
        timer.on_suspend(clock.now());
        clock.advance(Duration::seconds(10));

        assert_eq!(timer.on_resume(clock.now()), TimerEvent::Idle);
        assert_eq!(timer.remaining(), Duration::seconds(30));
        assert!(!timer.is_suspended());
    }

    #[test]
    fn start_is_refused_while_suspended() {
        let mut clock = fixed_clock();
        let mut timer = running(30);
        timer.on_suspend(clock.now());
        timer.pause();
        assert!(!timer.start());

        clock.advance(Duration::seconds(10));
        assert_eq!(timer.on_resume(clock.now()), TimerEvent::Idle);
        assert!(timer.start());
        assert_eq!(timer.remaining(), Duration::seconds(30));
    }

    #[test]
    fn restart_after_paused_background_keeps_remaining_time() {
        let mut clock = fixed_clock();
        let mut timer = running(600);
        timer.pause();
        timer.on_suspend(clock.now());
        clock.advance(Duration::seconds(300));

        assert!(timer.start());
        clock.advance(Duration::seconds(1));
        timer.tick();
        assert_eq!(timer.on_resume(clock.now()), TimerEvent::Idle);
        assert_eq!(timer.remaining(), Duration::seconds(599));
    }

    #[test]
    fn suspend_before_start_is_not_checkpointed() {
        let mut clock = fixed_clock();
        let mut timer = CountdownTimer::new(Duration::seconds(60));
        timer.on_suspend(clock.now());
        assert!(!timer.is_suspended());
        clock.advance(Duration::seconds(20));
        assert!(timer.start());
        assert_eq!(timer.on_resume(clock.now()), TimerEvent::Idle);
        assert_eq!(timer.remaining(), Duration::seconds(60));
    }

    #[test]
    fn backwards_clock_does_not_add_time() {
        let mut clock = fixed_clock();
        let mut timer = running(30);
        timer.on_suspend(clock.now());
        clock.advance(Duration::seconds(-50));
        timer.on_resume(clock.now());
        assert_eq!(timer.remaining(), Duration::seconds(30));
    }

    #[test]
    fn formats_minutes_and_seconds() {
        assert_eq!(format_mm_ss(Duration::seconds(0)), "00:00");
        assert_eq!(format_mm_ss(Duration::seconds(59)), "00:59");
        assert_eq!(format_mm_ss(Duration::seconds(61)), "01:01");
        assert_eq!(format_mm_ss(Duration::milliseconds(1_999)), "00:01");
        assert_eq!(format_mm_ss(Duration::hours(3)), "180:00");
    }

    #[test]
    fn urgency_thresholds() {
        assert_eq!(Urgency::for_remaining(Duration::seconds(301)), Urgency::Normal);
        assert_eq!(Urgency::for_remaining(Duration::seconds(300)), Urgency::Warning);
        assert_eq!(Urgency::for_remaining(Duration::seconds(61)), Urgency::Warning);
        assert_eq!(Urgency::for_remaining(Duration::seconds(60)), Urgency::Critical);
        assert_eq!(Urgency::for_remaining(Duration::zero()), Urgency::Critical);
    }

    #[test]
    fn elapsed_tracks_consumed_time() {
        let mut timer = running(10);
        timer.tick();
        timer.tick();
        assert_eq!(timer.elapsed(), Duration::seconds(2));
        assert_eq!(timer.remaining_secs(), 8);
    }
}
