mod record;
mod recorder;

pub use record::{ExerciseSession, SessionId};
pub use recorder::SessionRecorder;
