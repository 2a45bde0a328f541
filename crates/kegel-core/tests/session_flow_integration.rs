//! Integration tests for a full exercise run against an on-disk store.

use kegel_core::identity::validate_sign_up;
use kegel_core::notify::CollectingNotifier;
use kegel_core::storage::ProgressConfig;
use kegel_core::{
    AuthContext, Coach, ExerciseProtocol, IdentityProvider, LocalIdentity, NotificationKind,
    Phase, ProgressStore, SkillLevel, SqliteStore,
};

fn run_to_completion<S: kegel_core::KeyValueStore, N: kegel_core::Notifier>(
    coach: &mut Coach<S, N>,
) {
    coach.start();
    let total = coach.engine().protocol().total_secs();
    for _ in 0..total {
        coach.tick();
    }
    assert_eq!(coach.engine().phase(), Phase::Completed);
}

#[test]
fn test_signed_in_run_is_persisted_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("kegel.db");
    let db = SqliteStore::open_at(&path).unwrap();

    validate_sign_up("ana@example.com", "secret1", "secret1").unwrap();
    let mut identity = LocalIdentity::new(&db);
    let user = identity.sign_up("ana@example.com", "secret1").unwrap();
    let ctx = identity.context();

    let notifier = CollectingNotifier::new();
    let mut coach = Coach::new(
        ExerciseProtocol::default(),
        ProgressStore::new(&db),
        &notifier,
        ctx.clone(),
        ProgressConfig::default(),
    );
    run_to_completion(&mut coach);

    let kinds = notifier.kinds();
    assert_eq!(kinds.first(), Some(&NotificationKind::Start));
    assert_eq!(kinds.last(), Some(&NotificationKind::Complete));
    assert_eq!(
        kinds.iter().filter(|k| **k == NotificationKind::Switch).count(),
        19
    );
    drop(coach);
    drop(identity);
    drop(db);

    // Reopen and read back as the same user.
    let db = SqliteStore::open_at(&path).unwrap();
    let identity = LocalIdentity::new(&db);
    assert_eq!(identity.current_user(), Some(&user));
    let store = ProgressStore::new(&db);
    let sessions = store.user_sessions(&identity.context());
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].repetitions, 10);
    assert_eq!(sessions[0].contraction_duration, 5);
    assert_eq!(sessions[0].relaxation_duration, 5);

    let progress = store.user_progress(&identity.context()).unwrap();
    assert_eq!(progress.total_sessions, 1);
    assert_eq!(progress.total_time, 2);
    assert_eq!(progress.level(), SkillLevel::Beginner);
}

#[test]
fn test_users_do_not_see_each_other() {
    let db = SqliteStore::open_memory().unwrap();
    let mut identity = LocalIdentity::new(&db);
    let first = identity.sign_up("one@example.com", "secret1").unwrap();
    let first_ctx = AuthContext::for_user(first);
    let second = identity.sign_up("two@example.com", "secret2").unwrap();
    let second_ctx = AuthContext::for_user(second);

    let protocol = ExerciseProtocol::new(1, 1, 1).unwrap();
    let mut coach = Coach::new(
        protocol,
        ProgressStore::new(&db),
        kegel_core::NullNotifier,
        first_ctx.clone(),
        ProgressConfig::default(),
    );
    run_to_completion(&mut coach);
    coach.reset();
    run_to_completion(&mut coach);

    coach.set_context(second_ctx.clone());
    coach.reset();
    run_to_completion(&mut coach);

    let store = ProgressStore::new(&db);
    assert_eq!(store.user_sessions(&first_ctx).len(), 2);
    assert_eq!(store.user_sessions(&second_ctx).len(), 1);
    assert_eq!(store.user_progress(&first_ctx).unwrap().total_sessions, 2);
    assert_eq!(store.user_progress(&second_ctx).unwrap().total_sessions, 1);
}

#[test]
fn test_anonymous_run_still_completes() {
    let db = SqliteStore::open_memory().unwrap();
    let mut coach = Coach::new(
        ExerciseProtocol::new(2, 1, 2).unwrap(),
        ProgressStore::new(&db),
        kegel_core::NullNotifier,
        AuthContext::anonymous(),
        ProgressConfig::default(),
    );
    run_to_completion(&mut coach);

    let store = ProgressStore::new(&db);
    assert!(store.user_sessions(&AuthContext::anonymous()).is_empty());
    assert_eq!(store.stored_sessions().len(), 1);
    assert_eq!(store.stored_progress().unwrap().total_sessions, 1);
}

#[test]
fn test_fresh_user_reads_defaults() {
    let db = SqliteStore::open_memory().unwrap();
    let mut identity = LocalIdentity::new(&db);
    identity.sign_up("new@example.com", "secret1").unwrap();
    let ctx = identity.context();

    let store = ProgressStore::new(&db);
    assert!(store.user_sessions(&ctx).is_empty());
    assert!(store.user_progress(&ctx).is_none());

    let progress = kegel_core::ProgressTracker::new(&store).progress(&ctx);
    assert_eq!(progress.total_sessions, 0);
    assert_eq!(progress.weekly_goal, 5);
}
