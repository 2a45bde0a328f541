//! Cancellable once-per-second countdown drivers.
//!
//! The phase engine owns exactly one [`Countdown`]. Every time it starts or
//! resumes it cancels the previous driver and arms a new one under a fresh
//! generation number; ticks carry that generation so anything already in
//! flight from an older driver is recognised as stale and dropped.

use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

/// One elapsed second, tagged with the generation that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub generation: u64,
}

/// Capability the engine needs from a timer driver.
pub trait Countdown {
    /// Begin delivering ticks for `generation`. Implementations must stop
    /// any previous driver first.
    fn arm(&mut self, generation: u64);

    /// Stop delivering ticks. Idempotent.
    fn cancel(&mut self);

    fn is_armed(&self) -> bool;
}

/// Caller-driven countdown: nothing fires on its own, the owner calls
/// `PhaseEngine::tick` once per second. Records the armed generation for
/// inspection.
#[derive(Debug, Clone, Default)]
pub struct ManualCountdown {
    armed: Option<u64>,
}

impl ManualCountdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generation currently armed, if any.
    pub fn armed_generation(&self) -> Option<u64> {
        self.armed
    }
}

impl Countdown for ManualCountdown {
    fn arm(&mut self, generation: u64) {
        self.armed = Some(generation);
    }

    fn cancel(&mut self) {
        self.armed = None;
    }

    fn is_armed(&self) -> bool {
        self.armed.is_some()
    }
}

/// Real-time driver backed by a tokio interval task.
///
/// Ticks are pushed into an unbounded channel; the receiving side feeds them
/// to `PhaseEngine::on_tick`. Arming must happen inside a tokio runtime.
#[derive(Debug)]
pub struct IntervalCountdown {
    period: Duration,
    tx: UnboundedSender<Tick>,
    task: Option<JoinHandle<()>>,
}

impl IntervalCountdown {
    pub fn new(tx: UnboundedSender<Tick>) -> Self {
        Self::with_period(tx, Duration::from_secs(1))
    }

    /// Use a custom tick period (tests, accelerated demos).
    pub fn with_period(tx: UnboundedSender<Tick>, period: Duration) -> Self {
        Self {
            period,
            tx,
            task: None,
        }
    }
}

impl Countdown for IntervalCountdown {
    fn arm(&mut self, generation: u64) {
        self.cancel();
        let tx = self.tx.clone();
        let period = self.period;
        self.task = Some(tokio::spawn(async move {
            // First tick one full period after arming, not immediately.
            let start = tokio::time::Instant::now() + period;
            let mut interval = tokio::time::interval_at(start, period);
            loop {
                interval.tick().await;
                if tx.send(Tick { generation }).is_err() {
                    break;
                }
            }
        }));
    }

    fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    fn is_armed(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for IntervalCountdown {
    fn drop(&mut self) {
        self.cancel();
    }
}
