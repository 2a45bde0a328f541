//! Exercise phase engine.
//!
//! A tick-driven state machine. It does not spawn anything itself; a
//! [`Countdown`] decides where ticks come from and the caller hands each
//! one to [`PhaseEngine::on_tick`] (or calls [`PhaseEngine::tick`] directly
//! when driving the engine by hand).
//!
//! ## State Transitions
//!
//! ```text
//! Ready -> Contracting <-> Relaxing -> Completed
//!   ^___________ reset() from anywhere ____|
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = PhaseEngine::new(ExerciseProtocol::default());
//! engine.start();
//! // once per second:
//! if let Some(event) = engine.tick() { /* switch / complete */ }
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::countdown::{Countdown, ManualCountdown, Tick};
use super::protocol::ExerciseProtocol;
use crate::events::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Ready,
    Contracting,
    Relaxing,
    Completed,
}

/// In-memory view of the active run. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    pub phase: Phase,
    /// Finished repetitions, excluding the one in progress.
    pub repetition: u32,
    pub remaining_secs: u32,
    pub running: bool,
}

impl TimerState {
    fn ready(protocol: &ExerciseProtocol) -> Self {
        Self {
            phase: Phase::Ready,
            repetition: 0,
            remaining_secs: protocol.contraction_secs(),
            running: false,
        }
    }
}

/// Contract/relax phase engine.
///
/// Owns its countdown driver; every path out of a running state cancels it.
#[derive(Debug)]
pub struct PhaseEngine<D: Countdown = ManualCountdown> {
    protocol: ExerciseProtocol,
    state: TimerState,
    /// Bumped every time a driver is armed. Ticks from older generations
    /// are ignored.
    generation: u64,
    countdown: D,
}

impl PhaseEngine<ManualCountdown> {
    /// Engine driven by explicit `tick()` calls.
    pub fn new(protocol: ExerciseProtocol) -> Self {
        Self::with_countdown(protocol, ManualCountdown::new())
    }
}

impl<D: Countdown> PhaseEngine<D> {
    pub fn with_countdown(protocol: ExerciseProtocol, countdown: D) -> Self {
        Self {
            state: TimerState::ready(&protocol),
            protocol,
            generation: 0,
            countdown,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn protocol(&self) -> &ExerciseProtocol {
        &self.protocol
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn repetition(&self) -> u32 {
        self.state.repetition
    }

    pub fn remaining_secs(&self) -> u32 {
        self.state.remaining_secs
    }

    pub fn is_running(&self) -> bool {
        self.state.running
    }

    /// Contracting or relaxing but not counting down.
    pub fn is_paused(&self) -> bool {
        !self.state.running
            && matches!(self.state.phase, Phase::Contracting | Phase::Relaxing)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn countdown(&self) -> &D {
        &self.countdown
    }

    /// Seconds of the protocol already elapsed.
    pub fn elapsed_secs(&self) -> u64 {
        let p = &self.protocol;
        let done = u64::from(self.state.repetition) * p.cycle_secs();
        match self.state.phase {
            Phase::Ready => 0,
            Phase::Completed => p.total_secs(),
            Phase::Contracting => {
                done + u64::from(p.contraction_secs() - self.state.remaining_secs)
            }
            Phase::Relaxing => {
                done + u64::from(p.contraction_secs())
                    + u64::from(p.relaxation_secs() - self.state.remaining_secs)
            }
        }
    }

    /// 0.0 .. 100.0 progress across the whole run.
    pub fn progress_pct(&self) -> f64 {
        let total = self.protocol.total_secs();
        if total == 0 {
            return 0.0;
        }
        (self.elapsed_secs() as f64 / total as f64 * 100.0).min(100.0)
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            phase: self.state.phase,
            repetition: self.state.repetition,
            total_repetitions: self.protocol.repetitions(),
            remaining_secs: self.state.remaining_secs,
            running: self.state.running,
            progress_pct: self.progress_pct(),
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin a run. Only valid from `Ready`.
    pub fn start(&mut self) -> Option<Event> {
        if self.state.phase != Phase::Ready {
            return None;
        }
        self.state = TimerState {
            phase: Phase::Contracting,
            repetition: 0,
            remaining_secs: self.protocol.contraction_secs(),
            running: true,
        };
        self.rearm();
        Some(Event::ExerciseStarted {
            protocol: self.protocol,
            at: Utc::now(),
        })
    }

    pub fn pause(&mut self) -> Option<Event> {
        if !self.state.running {
            return None;
        }
        self.countdown.cancel();
        self.state.running = false;
        Some(Event::ExercisePaused {
            phase: self.state.phase,
            remaining_secs: self.state.remaining_secs,
            at: Utc::now(),
        })
    }

    pub fn resume(&mut self) -> Option<Event> {
        if !self.is_paused() {
            return None;
        }
        self.state.running = true;
        self.rearm();
        Some(Event::ExerciseResumed {
            phase: self.state.phase,
            remaining_secs: self.state.remaining_secs,
            at: Utc::now(),
        })
    }

    /// Return to `Ready` from any state.
    pub fn reset(&mut self) -> Event {
        self.countdown.cancel();
        // Anything still queued from the cancelled driver is now stale.
        self.generation += 1;
        self.state = TimerState::ready(&self.protocol);
        Event::ExerciseReset { at: Utc::now() }
    }

    /// Replace the protocol for the next run. Resets the engine.
    pub fn set_protocol(&mut self, protocol: ExerciseProtocol) -> Event {
        self.protocol = protocol;
        self.reset()
    }

    /// Advance one second on the current generation.
    pub fn tick(&mut self) -> Option<Event> {
        self.on_tick(Tick {
            generation: self.generation,
        })
    }

    /// Apply a tick delivered by the countdown driver.
    ///
    /// Returns `Some(PhaseSwitched)` or `Some(ExerciseCompleted)` on a phase
    /// boundary. Ticks that arrive while paused or that belong to a
    /// cancelled driver are dropped.
    pub fn on_tick(&mut self, tick: Tick) -> Option<Event> {
        if !self.state.running || tick.generation != self.generation {
            return None;
        }
        if self.state.remaining_secs > 1 {
            self.state.remaining_secs -= 1;
            return None;
        }

        match self.state.phase {
            Phase::Contracting => {
                self.state.phase = Phase::Relaxing;
                self.state.remaining_secs = self.protocol.relaxation_secs();
                Some(self.switched(Phase::Contracting))
            }
            Phase::Relaxing => {
                self.state.repetition += 1;
                if self.state.repetition >= self.protocol.repetitions() {
                    self.countdown.cancel();
                    self.state.phase = Phase::Completed;
                    self.state.remaining_secs = 0;
                    self.state.running = false;
                    Some(Event::ExerciseCompleted {
                        protocol: self.protocol,
                        at: Utc::now(),
                    })
                } else {
                    self.state.phase = Phase::Contracting;
                    self.state.remaining_secs = self.protocol.contraction_secs();
                    Some(self.switched(Phase::Relaxing))
                }
            }
            Phase::Ready | Phase::Completed => None,
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn rearm(&mut self) {
        self.countdown.cancel();
        self.generation += 1;
        self.countdown.arm(self.generation);
    }

    fn switched(&self, from: Phase) -> Event {
        Event::PhaseSwitched {
            from,
            to: self.state.phase,
            repetition: self.state.repetition,
            remaining_secs: self.state.remaining_secs,
            at: Utc::now(),
        }
    }
}
