//! Audible/haptic cue hooks.
//!
//! Playback itself lives outside the core. The core only says which cue is
//! due; implementations are fire-and-forget.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::events::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Start,
    Switch,
    Complete,
}

impl NotificationKind {
    /// Cue owed for an engine event, if any.
    pub fn for_event(event: &Event) -> Option<Self> {
        match event {
            Event::ExerciseStarted { .. } => Some(NotificationKind::Start),
            Event::PhaseSwitched { .. } => Some(NotificationKind::Switch),
            Event::ExerciseCompleted { .. } => Some(NotificationKind::Complete),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Start => "start",
            NotificationKind::Switch => "switch",
            NotificationKind::Complete => "complete",
        }
    }
}

pub trait Notifier {
    fn notify(&self, kind: NotificationKind);
}

/// Writes each cue to the log instead of playing a sound.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, kind: NotificationKind) {
        tracing::info!(kind = kind.as_str(), "cue");
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _kind: NotificationKind) {}
}

/// Keeps every cue for later inspection.
#[derive(Debug, Default)]
pub struct CollectingNotifier {
    seen: Mutex<Vec<NotificationKind>>,
}

impl CollectingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kinds(&self) -> Vec<NotificationKind> {
        self.seen.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

impl Notifier for CollectingNotifier {
    fn notify(&self, kind: NotificationKind) {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(kind);
        }
    }
}

impl<N: Notifier + ?Sized> Notifier for &N {
    fn notify(&self, kind: NotificationKind) {
        (**self).notify(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn only_cue_events_map_to_kinds() {
        assert_eq!(
            NotificationKind::for_event(&Event::ExerciseReset { at: Utc::now() }),
            None
        );
        assert_eq!(
            NotificationKind::for_event(&Event::ExerciseCompleted {
                protocol: Default::default(),
                at: Utc::now(),
            }),
            Some(NotificationKind::Complete)
        );
    }

    #[test]
    fn collecting_notifier_keeps_order() {
        let n = CollectingNotifier::new();
        n.notify(NotificationKind::Start);
        n.notify(NotificationKind::Switch);
        assert_eq!(n.kinds(), vec![NotificationKind::Start, NotificationKind::Switch]);
    }
}
