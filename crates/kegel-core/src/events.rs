use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{ExerciseProtocol, Phase};

/// Every engine command produces an Event.
/// The front end renders them; the coach routes them to notifications
/// and persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    ExerciseStarted {
        protocol: ExerciseProtocol,
        at: DateTime<Utc>,
    },
    PhaseSwitched {
        from: Phase,
        to: Phase,
        repetition: u32,
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    ExercisePaused {
        phase: Phase,
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    ExerciseResumed {
        phase: Phase,
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    ExerciseReset {
        at: DateTime<Utc>,
    },
    /// Emitted exactly once per run, on the final relax boundary.
    ExerciseCompleted {
        protocol: ExerciseProtocol,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        phase: Phase,
        repetition: u32,
        total_repetitions: u32,
        remaining_secs: u32,
        running: bool,
        progress_pct: f64,
        at: DateTime<Utc>,
    },
}
