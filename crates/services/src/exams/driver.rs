use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration as StdDuration;

use chrono::{DateTime, Utc};
use exam_core::{Clock, ExamReport, ExamSession, ExamSnapshot, TimerEvent};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::error::ExamServiceError;

const DEFAULT_TICK_INTERVAL: StdDuration = StdDuration::from_secs(1);

//
// ─── SHARED STATE ──────────────────────────────────────────────────────────────
//

struct DriverState {
    session: ExamSession,
    /// Bumped on every cancellation; a tick task only applies ticks while its
    /// own generation is current.
    generation: u64,
    ticker: Option<JoinHandle<()>>,
}

impl DriverState {
    fn cancel_ticker(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        if let Some(handle) = self.ticker.take() {
            handle.abort();
        }
    }
}

struct Shared {
    state: Mutex<DriverState>,
    updates: watch::Sender<ExamSnapshot>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, DriverState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publishes while the state lock is held so snapshots never go out of order.
    fn publish(&self, state: &DriverState) {
        self.updates.send_replace(state.session.snapshot());
    }
}

//
// ─── DRIVER ────────────────────────────────────────────────────────────────────
//

/// Runs an `ExamSession` on a tokio runtime.
///
/// Owns the periodic tick, forwards host lifecycle hooks and publishes an
/// `ExamSnapshot` on a watch channel after every change. Hosts keep it behind
/// an `Arc` and call it from their event handlers.
pub struct ExamDriver {
    shared: Arc<Shared>,
    clock: Clock,
    tick_interval: StdDuration,
}

impl ExamDriver {
    #[must_use]
    pub fn new(session: ExamSession) -> Self {
        let (updates, _) = watch::channel(session.snapshot());
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(DriverState {
                    session,
                    generation: 0,
                    ticker: None,
                }),
                updates,
            }),
            clock: Clock::default_clock(),
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Real-time spacing between ticks. Each tick still removes one second.
    #[must_use]
    pub fn with_tick_interval(mut self, tick_interval: StdDuration) -> Self {
        self.tick_interval = tick_interval;
        self
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ExamSnapshot> {
        self.shared.updates.subscribe()
    }

    #[must_use]
    pub fn snapshot(&self) -> ExamSnapshot {
        self.shared.lock().session.snapshot()
    }

    #[must_use]
    pub fn report(&self) -> Option<ExamReport> {
        self.shared.lock().session.report()
    }

    /// Read access to the session, e.g. for the current question or palette.
    pub fn with_session<R>(&self, f: impl FnOnce(&ExamSession) -> R) -> R {
        f(&self.shared.lock().session)
    }

    #[must_use]
    pub fn is_ticking(&self) -> bool {
        self.shared.lock().ticker.is_some()
    }

    //
    // ─── TIMER CONTROL ─────────────────────────────────────────────────────────
    //

    /// Starts the countdown and the periodic tick.
    ///
    /// Returns `Ok(false)` if the countdown was already running or has ended.
    ///
    /// # Errors
    ///
    /// Returns `ExamServiceError::NoRuntime` when called outside a tokio runtime.
    pub fn start(&self) -> Result<bool, ExamServiceError> {
        let runtime = Handle::try_current().map_err(|_| ExamServiceError::NoRuntime)?;
        let mut state = self.shared.lock();
        if !state.session.start_timer() {
            return Ok(false);
        }
        self.spawn_ticker(&runtime, &mut state);
        self.shared.publish(&state);
        Ok(true)
    }

    /// Halts the countdown, keeping the remaining time.
    pub fn pause(&self) -> bool {
        let mut state = self.shared.lock();
        state.cancel_ticker();
        let paused = state.session.pause_timer();
        if paused {
            self.shared.publish(&state);
        }
        paused
    }

    /// Host lost the foreground: checkpoint and stop ticking.
    pub fn suspend(&self) {
        self.suspend_at(self.clock.now());
    }

    pub fn suspend_at(&self, now: DateTime<Utc>) {
        let mut state = self.shared.lock();
        state.cancel_ticker();
        state.session.on_suspend(now);
    }

    /// Host regained the foreground: deduct the gap and resume ticking.
    ///
    /// # Errors
    ///
    /// Returns `ExamServiceError::NoRuntime` when ticking must restart outside
    /// a tokio runtime.
    pub fn resume(&self) -> Result<TimerEvent, ExamServiceError> {
        self.resume_at(self.clock.now())
    }

    /// # Errors
    ///
    /// Returns `ExamServiceError::NoRuntime` when ticking must restart outside
    /// a tokio runtime.
    pub fn resume_at(&self, now: DateTime<Utc>) -> Result<TimerEvent, ExamServiceError> {
        let mut state = self.shared.lock();
        let event = state.session.on_resume(now);
        if event != TimerEvent::Idle {
            self.shared.publish(&state);
        }

        let timer = state.session.timer();
        if timer.is_running() && !timer.is_suspended() && state.ticker.is_none() {
            let runtime = Handle::try_current().map_err(|_| ExamServiceError::NoRuntime)?;
            self.spawn_ticker(&runtime, &mut state);
        }
        Ok(event)
    }

    //
    // ─── ANSWERING / NAVIGATION ────────────────────────────────────────────────
    //

    pub fn select_option(&self, index: usize) -> bool {
        self.mutate(|session| session.select_option(index))
    }

    pub fn mark_for_review(&self) -> bool {
        self.mutate(ExamSession::mark_for_review)
    }

    pub fn next_question(&self) -> bool {
        self.mutate(ExamSession::next_question)
    }

    pub fn go_to_question(&self, index: usize) -> bool {
        self.mutate(|session| session.go_to_question(index))
    }

    /// Ends the exam. The pending tick is cancelled before the session is
    /// submitted, so no tick can land afterwards. Idempotent.
    pub fn submit(&self) -> bool {
        let mut state = self.shared.lock();
        state.cancel_ticker();
        let submitted = state.session.submit_exam();
        if submitted {
            self.shared.publish(&state);
        }
        submitted
    }

    /// Resolves once the exam is submitted, by the candidate or by expiry.
    pub async fn wait_until_submitted(&self) -> Option<ExamReport> {
        let mut updates = self.subscribe();
        if updates.wait_for(ExamSnapshot::is_submitted).await.is_err() {
            return None;
        }
        self.report()
    }

    fn mutate(&self, action: impl FnOnce(&mut ExamSession) -> bool) -> bool {
        let mut state = self.shared.lock();
        let applied = action(&mut state.session);
        if applied {
            self.shared.publish(&state);
        }
        applied
    }

    fn spawn_ticker(&self, runtime: &Handle, state: &mut DriverState) {
        state.cancel_ticker();
        let generation = state.generation;
        let shared = Arc::clone(&self.shared);
        let period = self.tick_interval;
        state.ticker = Some(runtime.spawn(run_ticker(shared, generation, period)));
        debug!(generation, ?period, "tick task spawned");
    }
}

async fn run_ticker(shared: Arc<Shared>, generation: u64, period: StdDuration) {
    let mut interval = time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;

        let mut state = shared.lock();
        if state.generation != generation {
            return;
        }
        match state.session.tick() {
            TimerEvent::Counting { .. } => shared.publish(&state),
            TimerEvent::Expired => {
                state.ticker = None;
                shared.publish(&state);
                info!("exam auto-submitted on expiry");
                return;
            }
            TimerEvent::Idle => {
                state.ticker = None;
                return;
            }
        }
    }
}

impl Drop for ExamDriver {
    fn drop(&mut self) {
        self.shared.lock().cancel_ticker();
    }
}

impl fmt::Debug for ExamDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExamDriver")
            .field("clock", &self.clock)
            .field("tick_interval", &self.tick_interval)
            .finish_non_exhaustive()
    }
}
