mod countdown;
mod engine;
mod protocol;

pub use countdown::{Countdown, IntervalCountdown, ManualCountdown, Tick};
pub use engine::{Phase, PhaseEngine, TimerState};
pub use protocol::ExerciseProtocol;
