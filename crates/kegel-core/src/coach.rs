//! Exercise coach: the phase engine plus its side effects.
//!
//! Every engine event goes through [`Coach::dispatch`]: cues go to the
//! notifier, and the single `ExerciseCompleted` of a run is recorded and
//! folded into progress. The engine has already settled in `Completed`
//! before anything is written, so storage can't hold up or undo it.

use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver};

use crate::events::Event;
use crate::identity::AuthContext;
use crate::notify::{NotificationKind, Notifier};
use crate::progress::{ProgressTracker, UserProgress};
use crate::session::{ExerciseSession, SessionRecorder};
use crate::storage::{KeyValueStore, ProgressConfig, ProgressStore};
use crate::timer::{
    Countdown, ExerciseProtocol, IntervalCountdown, ManualCountdown, PhaseEngine, Tick,
};

pub struct Coach<S: KeyValueStore, N: Notifier, D: Countdown = ManualCountdown> {
    engine: PhaseEngine<D>,
    store: ProgressStore<S>,
    notifier: N,
    ctx: AuthContext,
    settings: ProgressConfig,
    last_session: Option<ExerciseSession>,
    last_progress: Option<UserProgress>,
}

impl<S: KeyValueStore, N: Notifier> Coach<S, N, ManualCountdown> {
    pub fn new(
        protocol: ExerciseProtocol,
        store: ProgressStore<S>,
        notifier: N,
        ctx: AuthContext,
        settings: ProgressConfig,
    ) -> Self {
        Self::with_countdown(protocol, ManualCountdown::new(), store, notifier, ctx, settings)
    }
}

impl<S: KeyValueStore, N: Notifier, D: Countdown> Coach<S, N, D> {
    pub fn with_countdown(
        protocol: ExerciseProtocol,
        countdown: D,
        store: ProgressStore<S>,
        notifier: N,
        ctx: AuthContext,
        settings: ProgressConfig,
    ) -> Self {
        Self {
            engine: PhaseEngine::with_countdown(protocol, countdown),
            store,
            notifier,
            ctx,
            settings,
            last_session: None,
            last_progress: None,
        }
    }

    pub fn engine(&self) -> &PhaseEngine<D> {
        &self.engine
    }

    pub fn store(&self) -> &ProgressStore<S> {
        &self.store
    }

    pub fn context(&self) -> &AuthContext {
        &self.ctx
    }

    /// Switch user. Any run in progress is abandoned.
    pub fn set_context(&mut self, ctx: AuthContext) {
        if self.engine.is_running() || self.engine.is_paused() {
            self.reset();
        }
        self.ctx = ctx;
    }

    /// The record written by the most recent completion.
    pub fn last_session(&self) -> Option<&ExerciseSession> {
        self.last_session.as_ref()
    }

    pub fn last_progress(&self) -> Option<&UserProgress> {
        self.last_progress.as_ref()
    }

    pub fn tracker(&self) -> ProgressTracker<'_, S> {
        ProgressTracker::new(&self.store)
            .with_strategy(self.settings.strategy)
            .with_policy(self.settings.policy)
            .with_weekly_goal(self.settings.weekly_goal)
    }

    pub fn start(&mut self) -> Option<Event> {
        let event = self.engine.start()?;
        self.dispatch(&event);
        Some(event)
    }

    pub fn pause(&mut self) -> Option<Event> {
        self.engine.pause()
    }

    pub fn resume(&mut self) -> Option<Event> {
        self.engine.resume()
    }

    pub fn reset(&mut self) -> Event {
        self.engine.reset()
    }

    pub fn tick(&mut self) -> Option<Event> {
        let event = self.engine.tick()?;
        self.dispatch(&event);
        Some(event)
    }

    pub fn on_tick(&mut self, tick: Tick) -> Option<Event> {
        let event = self.engine.on_tick(tick)?;
        self.dispatch(&event);
        Some(event)
    }

    fn dispatch(&mut self, event: &Event) {
        if let Some(kind) = NotificationKind::for_event(event) {
            self.notifier.notify(kind);
        }
        if let Event::ExerciseCompleted { protocol, .. } = event {
            let session = SessionRecorder::new(&self.store).record_protocol(&self.ctx, protocol);
            let progress = self.tracker().record(&self.ctx, &session);
            self.last_session = Some(session);
            self.last_progress = Some(progress);
        }
    }
}

/// Front-end commands for a live run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Pause,
    Resume,
    /// Abandon the run.
    Reset,
}

/// Build a coach whose countdown is a tokio interval, plus the receiving
/// end of its tick channel.
pub fn interval_coach<S: KeyValueStore, N: Notifier>(
    protocol: ExerciseProtocol,
    store: ProgressStore<S>,
    notifier: N,
    ctx: AuthContext,
    settings: ProgressConfig,
    period: Duration,
) -> (Coach<S, N, IntervalCountdown>, UnboundedReceiver<Tick>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let countdown = IntervalCountdown::with_period(tx, period);
    (
        Coach::with_countdown(protocol, countdown, store, notifier, ctx, settings),
        rx,
    )
}

/// Run one exercise in real time.
///
/// Starts the coach, feeds it ticks and front-end controls until the run
/// completes (returns the stored record) or is reset (returns `None`).
/// `on_event` sees every event, including pause/resume/reset.
pub async fn run_live<S, N, F>(
    coach: &mut Coach<S, N, IntervalCountdown>,
    ticks: &mut UnboundedReceiver<Tick>,
    controls: &mut UnboundedReceiver<Control>,
    mut on_event: F,
) -> Option<ExerciseSession>
where
    S: KeyValueStore,
    N: Notifier,
    F: FnMut(&Event),
{
    on_event(&coach.start()?);
    let mut controls_open = true;

    loop {
        if !controls_open && !coach.engine().is_running() {
            // Paused with nobody left to resume.
            return None;
        }
        tokio::select! {
            tick = ticks.recv() => {
                let tick = tick?;
                if let Some(event) = coach.on_tick(tick) {
                    on_event(&event);
                    if matches!(event, Event::ExerciseCompleted { .. }) {
                        return coach.last_session().cloned();
                    }
                }
            }
            control = controls.recv(), if controls_open => match control {
                Some(Control::Pause) => {
                    if let Some(event) = coach.pause() {
                        on_event(&event);
                    }
                }
                Some(Control::Resume) => {
                    if let Some(event) = coach.resume() {
                        on_event(&event);
                    }
                }
                Some(Control::Reset) => {
                    on_event(&coach.reset());
                    return None;
                }
                None => controls_open = false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{User, UserId};
    use crate::notify::CollectingNotifier;
    use crate::progress::SkillLevel;
    use crate::storage::MemoryStore;
    use crate::timer::Phase;

    fn user_ctx() -> AuthContext {
        AuthContext::for_user(User {
            id: UserId::new("u1"),
            email: "u1@example.com".into(),
        })
    }

    fn protocol(c: u32, l: u32, r: u32) -> ExerciseProtocol {
        ExerciseProtocol::new(c, l, r).unwrap()
    }

    #[test]
    fn cues_follow_the_run() {
        let notifier = CollectingNotifier::new();
        let mut coach = Coach::new(
            protocol(1, 1, 2),
            ProgressStore::new(MemoryStore::new()),
            &notifier,
            user_ctx(),
            ProgressConfig::default(),
        );
        coach.start();
        for _ in 0..4 {
            coach.tick();
        }
        use NotificationKind::*;
        assert_eq!(notifier.kinds(), vec![Start, Switch, Switch, Switch, Complete]);
    }

    #[test]
    fn completion_records_once_and_updates_progress() {
        let mut coach = Coach::new(
            protocol(5, 5, 10),
            ProgressStore::new(MemoryStore::new()),
            crate::notify::NullNotifier,
            user_ctx(),
            ProgressConfig::default(),
        );
        coach.start();
        for _ in 0..150 {
            coach.tick();
            coach.pause();
            coach.resume();
        }
        assert_eq!(coach.engine().phase(), Phase::Completed);

        let ctx = user_ctx();
        let sessions = coach.store().user_sessions(&ctx);
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].repetitions, 10);
        assert_eq!(sessions[0].contraction_duration, 5);
        assert_eq!(sessions[0].relaxation_duration, 5);

        let progress = coach.store().user_progress(&ctx).unwrap();
        assert_eq!(progress.total_sessions, 1);
        assert_eq!(progress.level(), SkillLevel::Beginner);
        assert_eq!(coach.last_progress(), Some(&progress));
    }

    #[test]
    fn reset_mid_run_records_nothing() {
        let mut coach = Coach::new(
            protocol(2, 2, 1),
            ProgressStore::new(MemoryStore::new()),
            crate::notify::NullNotifier,
            user_ctx(),
            ProgressConfig::default(),
        );
        coach.start();
        coach.tick();
        coach.tick();
        coach.reset();
        for _ in 0..10 {
            assert!(coach.tick().is_none());
        }
        assert!(coach.store().user_sessions(&user_ctx()).is_empty());
        assert!(coach.last_session().is_none());
    }

    #[test]
    fn switching_user_abandons_run() {
        let mut coach = Coach::new(
            protocol(2, 2, 1),
            ProgressStore::new(MemoryStore::new()),
            crate::notify::NullNotifier,
            AuthContext::anonymous(),
            ProgressConfig::default(),
        );
        coach.start();
        coach.set_context(user_ctx());
        assert_eq!(coach.engine().phase(), Phase::Ready);
        assert!(coach.context().is_authenticated());
    }

    #[tokio::test(start_paused = true)]
    async fn live_run_completes_and_records() {
        let (mut coach, mut ticks) = interval_coach(
            protocol(2, 1, 2),
            ProgressStore::new(MemoryStore::new()),
            crate::notify::NullNotifier,
            user_ctx(),
            ProgressConfig::default(),
            Duration::from_secs(1),
        );
        let (_controls_tx, mut controls) = mpsc::unbounded_channel();
        let mut seen = Vec::new();
        let session = run_live(&mut coach, &mut ticks, &mut controls, |e| seen.push(e.clone()))
            .await
            .expect("run completes");

        assert_eq!(session.repetitions, 2);
        assert_eq!(coach.store().user_sessions(&user_ctx()), vec![session]);
        assert!(matches!(seen.first(), Some(Event::ExerciseStarted { .. })));
        assert!(matches!(seen.last(), Some(Event::ExerciseCompleted { .. })));
        assert!(!coach.engine().countdown().is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn live_reset_abandons_run() {
        let (mut coach, mut ticks) = interval_coach(
            protocol(5, 5, 3),
            ProgressStore::new(MemoryStore::new()),
            crate::notify::NullNotifier,
            user_ctx(),
            ProgressConfig::default(),
            Duration::from_secs(1),
        );
        let (controls_tx, mut controls) = mpsc::unbounded_channel();
        controls_tx.send(Control::Pause).unwrap();
        controls_tx.send(Control::Resume).unwrap();
        controls_tx.send(Control::Reset).unwrap();

        let result = run_live(&mut coach, &mut ticks, &mut controls, |_| {}).await;
        assert!(result.is_none());
        assert_eq!(coach.engine().phase(), Phase::Ready);
        assert!(coach.store().user_sessions(&user_ctx()).is_empty());
    }
}
