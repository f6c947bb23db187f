use odd1out_core::memory::{MemoryAuth, MemoryLocalStore, MemoryRemoteStore, StaticCatalog};
use odd1out_core::{
    ActionOutcome, DayKey, GameAction, GameController, GameRules, Identity, PersistenceGateway,
    PersistenceMode, Puzzle, SessionContext, SessionRecord, StartError, StartOutcome,
    UserDocument, UserStats,
};
use odd1out_core::context::LoadOutcome;
use odd1out_core::session::Session;

type Controller = GameController<MemoryAuth, MemoryRemoteStore, MemoryLocalStore, StaticCatalog>;

fn puzzle(n: usize) -> Puzzle {
    Puzzle {
        tokens: (0..5).map(|i| format!("p{n}-t{i}")).collect(),
        answer_index: (n + 2) % 5,
        category: format!("category {n}"),
        explanation: format!("explanation {n}"),
        completed: false,
    }
}

fn catalog() -> Vec<Puzzle> {
    (0..5).map(puzzle).collect()
}

fn today() -> DayKey {
    DayKey::parse("2024-03-09").unwrap()
}

fn yesterday() -> DayKey {
    DayKey::parse("2024-03-08").unwrap()
}

fn record_for(date: DayKey) -> SessionRecord {
    Session::new(date, catalog(), &GameRules::default()).to_record()
}

fn controller(auth: &MemoryAuth, remote: &MemoryRemoteStore, local: &MemoryLocalStore) -> Controller {
    GameController::new(
        auth.clone(),
        remote.clone(),
        local.clone(),
        StaticCatalog::new(catalog()),
        GameRules::default(),
        7,
    )
}

fn current_answer(controller: &Controller) -> usize {
    controller
        .context()
        .session()
        .and_then(|session| session.current_puzzle())
        .map(|puzzle| puzzle.answer_index)
        .unwrap()
}

async fn answer(controller: &Controller, token: usize) -> ActionOutcome {
    controller.act(GameAction::Select { token }).await;
    controller.act(GameAction::Submit).await
}

#[tokio::test]
async fn anonymous_start_writes_local_slot() {
    let (auth, remote, local): (MemoryAuth, MemoryRemoteStore, MemoryLocalStore) =
        Default::default();
    let controller = controller(&auth, &remote, &local);

    let outcome = controller.identity_changed(None, today()).await.unwrap();
    assert_eq!(outcome, StartOutcome::Fresh);
    let stored = local.snapshot().unwrap();
    assert_eq!(stored.date, today());
    assert_eq!(stored.puzzles.len(), 5);
    assert_eq!(stored.lives, 3);
    assert_eq!(remote.write_count(), 0);
    assert_eq!(controller.context().persistence_mode(), PersistenceMode::Local);
}

#[tokio::test]
async fn migration_keeps_lives_and_clears_local() {
    let (auth, remote, local): (MemoryAuth, MemoryRemoteStore, MemoryLocalStore) =
        Default::default();
    let controller = controller(&auth, &remote, &local);
    controller.identity_changed(None, today()).await.unwrap();

    let wrong = (current_answer(&controller) + 1) % 5;
    answer(&controller, wrong).await;
    assert_eq!(local.snapshot().unwrap().lives, 2);

    auth.register("ada@example.com", "secret1");
    let outcome = controller
        .sign_in("ada@example.com", "secret1", today())
        .await
        .unwrap();
    assert_eq!(outcome, StartOutcome::Migrated);

    let identity = auth.current().unwrap();
    let document = remote.document(&identity).unwrap();
    assert_eq!(document.days[&today()].lives, 2);
    assert!(local.snapshot().is_none());
    let context = controller.context();
    let session = context.session().unwrap();
    assert_eq!(session.lives(), 2);
    assert_eq!(session.struck(), &[wrong]);
}

#[tokio::test]
async fn beaten_migration_records_one_win() {
    let (auth, remote, local): (MemoryAuth, MemoryRemoteStore, MemoryLocalStore) =
        Default::default();
    let controller = controller(&auth, &remote, &local);
    controller.identity_changed(None, today()).await.unwrap();
    for index in 0..5 {
        let token = current_answer(&controller);
        answer(&controller, token).await;
        if index < 4 {
            controller.act(GameAction::Continue).await;
        }
    }
    assert!(local.snapshot().unwrap().is_game_beaten);

    auth.register("ada@example.com", "secret1");
    let outcome = controller
        .sign_in("ada@example.com", "secret1", today())
        .await
        .unwrap();
    assert_eq!(outcome, StartOutcome::Migrated);

    let won_once = UserStats {
        games_played: 1,
        wins: 1,
        current_streak: 1,
        max_streak: 1,
    };
    let identity = auth.current().unwrap();
    assert_eq!(remote.document(&identity).unwrap().stats, Some(won_once));
    assert_eq!(controller.context().stats(), won_once);
    // one write for the session, one for the stats
    assert_eq!(remote.write_count(), 2);
}

#[tokio::test]
async fn failed_migration_write_keeps_local_progress() {
    let (auth, remote, local): (MemoryAuth, MemoryRemoteStore, MemoryLocalStore) =
        Default::default();
    let controller = controller(&auth, &remote, &local);
    controller.identity_changed(None, today()).await.unwrap();
    let wrong = (current_answer(&controller) + 1) % 5;
    answer(&controller, wrong).await;

    auth.register("ada@example.com", "secret1");
    remote.set_fail_writes(true);
    let outcome = controller
        .sign_in("ada@example.com", "secret1", today())
        .await
        .unwrap();
    assert_eq!(outcome, StartOutcome::Migrated);

    {
        let context = controller.context();
        let session = context.session().unwrap();
        assert_eq!(session.lives(), 2);
        assert_eq!(session.struck(), &[wrong]);
        assert_eq!(context.persistence_mode(), PersistenceMode::MemoryOnly);
    }
    assert_eq!(local.snapshot().unwrap().lives, 2);
    let identity = auth.current().unwrap();
    assert!(remote.document(&identity).is_none());
}

#[tokio::test]
async fn empty_session_never_overwrites_stored_state() {
    let remote = MemoryRemoteStore::new();
    let local = MemoryLocalStore::new();
    let identity = Identity::new("user-1");
    let stored = record_for(today());
    local.set_snapshot(Some(stored.clone()));
    remote.insert_document(identity.clone(), UserDocument::day(today(), stored.clone()));
    let gateway = PersistenceGateway::new(remote.clone(), local.clone());

    let mut empty = record_for(today());
    empty.puzzles.clear();
    assert_eq!(gateway.save(None, &empty).await, Ok(false));
    assert_eq!(gateway.save(Some(&identity), &empty).await, Ok(false));

    assert_eq!(local.snapshot(), Some(stored.clone()));
    assert_eq!(remote.document(&identity).unwrap().days[&today()], stored);
    assert_eq!(remote.write_count(), 0);
}

#[tokio::test]
async fn lost_local_session_stays_behind() {
    let (auth, remote, local): (MemoryAuth, MemoryRemoteStore, MemoryLocalStore) =
        Default::default();
    let mut lost = record_for(today());
    lost.lives = 0;
    lost.in_review_mode = true;
    local.set_snapshot(Some(lost));
    auth.register("ada@example.com", "secret1");
    let controller = controller(&auth, &remote, &local);

    let outcome = controller
        .sign_in("ada@example.com", "secret1", today())
        .await
        .unwrap();
    assert_eq!(outcome, StartOutcome::Fresh);
    assert_eq!(local.snapshot().unwrap().lives, 0);
    assert_eq!(controller.context().session().unwrap().lives(), 3);
}

#[tokio::test]
async fn previous_day_is_never_resumed() {
    let (auth, remote, local): (MemoryAuth, MemoryRemoteStore, MemoryLocalStore) =
        Default::default();
    let mut old = record_for(yesterday());
    old.lives = 1;
    local.set_snapshot(Some(old));
    let controller = controller(&auth, &remote, &local);

    let outcome = controller.identity_changed(None, today()).await.unwrap();
    assert_eq!(outcome, StartOutcome::Fresh);
    let stored = local.snapshot().unwrap();
    assert_eq!(stored.date, today());
    assert_eq!(stored.lives, 3);
}

#[tokio::test]
async fn remote_save_keeps_other_days() {
    let (auth, remote, local): (MemoryAuth, MemoryRemoteStore, MemoryLocalStore) =
        Default::default();
    let identity = auth.register("ada@example.com", "secret1");
    remote.insert_document(identity.clone(), UserDocument::day(yesterday(), record_for(yesterday())));
    let controller = controller(&auth, &remote, &local);

    controller
        .sign_in("ada@example.com", "secret1", today())
        .await
        .unwrap();
    let document = remote.document(&identity).unwrap();
    assert!(document.days.contains_key(&yesterday()));
    assert!(document.days.contains_key(&today()));
}

#[tokio::test]
async fn signed_in_session_resumes_from_remote() {
    let (auth, remote, local): (MemoryAuth, MemoryRemoteStore, MemoryLocalStore) =
        Default::default();
    let identity = auth.register("ada@example.com", "secret1");
    let mut record = record_for(today());
    record.puzzles[0].completed = true;
    record.puzzles[1].completed = true;
    record.current_puzzle_index = 2;
    record.lives = 2;
    remote.insert_document(identity, UserDocument::day(today(), record));
    let controller = controller(&auth, &remote, &local);

    let outcome = controller
        .sign_in("ada@example.com", "secret1", today())
        .await
        .unwrap();
    assert_eq!(outcome, StartOutcome::Resumed);
    let context = controller.context();
    let session = context.session().unwrap();
    assert_eq!(session.current_index(), 2);
    assert_eq!(session.lives(), 2);
    assert_eq!(session.score(), 2);
}

#[tokio::test]
async fn sign_out_discards_session_and_stats() {
    let (auth, remote, local): (MemoryAuth, MemoryRemoteStore, MemoryLocalStore) =
        Default::default();
    let identity = auth.register("ada@example.com", "secret1");
    let stats = UserStats {
        games_played: 4,
        wins: 3,
        current_streak: 0,
        max_streak: 3,
    };
    remote.insert_document(identity.clone(), UserDocument::with_stats(stats));
    let controller = controller(&auth, &remote, &local);
    controller
        .sign_in("ada@example.com", "secret1", today())
        .await
        .unwrap();
    let wrong = (current_answer(&controller) + 1) % 5;
    answer(&controller, wrong).await;
    assert_eq!(controller.context().stats(), stats);

    let outcome = controller.sign_out(today()).await.unwrap();
    assert_eq!(outcome, StartOutcome::Fresh);
    let context = controller.context();
    assert!(context.identity().is_none());
    assert_eq!(context.stats(), UserStats::default());
    assert_eq!(context.session().unwrap().lives(), 3);
    assert_eq!(remote.document(&identity).unwrap().days[&today()].lives, 2);
}

#[tokio::test]
async fn failed_remote_write_falls_back_to_memory() {
    let (auth, remote, local): (MemoryAuth, MemoryRemoteStore, MemoryLocalStore) =
        Default::default();
    auth.register("ada@example.com", "secret1");
    remote.set_fail_writes(true);
    let controller = controller(&auth, &remote, &local);

    controller
        .sign_in("ada@example.com", "secret1", today())
        .await
        .unwrap();
    assert_eq!(
        controller.context().persistence_mode(),
        PersistenceMode::MemoryOnly
    );

    let token = current_answer(&controller);
    let step = controller.dispatch(GameAction::Select { token });
    assert!(step.effects.is_empty());
    controller.act(GameAction::Submit).await;
    assert_eq!(controller.context().session().unwrap().score(), 1);
    assert!(local.snapshot().is_none());
}

#[tokio::test]
async fn catalog_failure_produces_no_session() {
    let (auth, remote, local): (MemoryAuth, MemoryRemoteStore, MemoryLocalStore) =
        Default::default();
    let controller: Controller = GameController::new(
        auth,
        remote,
        local,
        StaticCatalog::failing("offline"),
        GameRules::default(),
        7,
    );

    let result = controller.identity_changed(None, today()).await;
    assert!(matches!(result, Err(StartError::Catalog(_))));
    assert!(controller.context().session().is_none());
}

#[test]
fn completions_from_a_previous_identity_are_dropped() {
    let mut context = SessionContext::new(GameRules::default());
    context.identity_changed(None);
    let tag = context.begin_load(today());
    context.identity_changed(Some(Identity::new("user-1")));

    assert_eq!(
        context.finish_load(&tag, Some(record_for(today()))),
        LoadOutcome::Stale
    );
    assert!(context.session().is_none());
    context.persistence_failed(&tag, &odd1out_core::StoreError::Encode);
    assert_eq!(context.persistence_mode(), PersistenceMode::Remote);
}
