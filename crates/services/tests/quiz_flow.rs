use std::sync::Arc;

use async_trait::async_trait;
use quiz_core::PROGRESS_KEY;
use quiz_core::model::{AnswerOutcome, Card, CardId, GroupId, PersistedProgress, RestoreError};
use quiz_core::time::{fixed_clock, fixed_now};
use services::quiz::testing::RecordingPresenter;
use services::{
    Feedback, PrimaryAction, QuizEngine, QuizError, QuizEvent, QuizStart, QuizStep, SelectedGroup,
    Severity, SubmitOutcome,
};
use storage::repository::{InMemoryStore, KeyValueStore, StorageError};

struct Harness {
    engine: QuizEngine,
    presenter: Arc<RecordingPresenter>,
    groups: Arc<SelectedGroup>,
    store: InMemoryStore,
}

fn harness_with_store(store: InMemoryStore) -> Harness {
    let presenter = Arc::new(RecordingPresenter::new());
    let groups = Arc::new(SelectedGroup::new(Some(GroupId::new(1))));
    let engine = QuizEngine::new(
        fixed_clock(),
        Arc::new(store.clone()),
        groups.clone(),
        presenter.clone(),
    );
    Harness {
        engine,
        presenter,
        groups,
        store,
    }
}

fn harness() -> Harness {
    harness_with_store(InMemoryStore::new())
}

fn arithmetic() -> Vec<Card> {
    vec![
        Card::new(Some(CardId::new(1)), "2+2?", "4").unwrap(),
        Card::new(Some(CardId::new(2)), "3+3?", "6").unwrap(),
    ]
}

fn capitals() -> Vec<Card> {
    vec![
        Card::new(Some(CardId::new(10)), "Capital of France?", "Paris").unwrap(),
        Card::new(Some(CardId::new(11)), "Capital of Italy?", "Rome").unwrap(),
        Card::new(Some(CardId::new(12)), "Capital of Spain?", "Madrid").unwrap(),
    ]
}

async fn saved_record(store: &InMemoryStore) -> PersistedProgress {
    let raw = store.get(PROGRESS_KEY).await.unwrap().expect("progress saved");
    serde_json::from_str(&raw).unwrap()
}

#[tokio::test]
async fn two_card_walkthrough_completes() {
    let mut h = harness();

    h.engine.start(QuizStart::Fresh(arithmetic())).await.unwrap();
    assert_eq!(h.presenter.last_question().as_deref(), Some("2+2?"));

    assert_eq!(
        h.engine.check_answer("4").unwrap(),
        AnswerOutcome::Correct { streak: 1 }
    );
    assert_eq!(h.engine.primary_action(), Some(PrimaryAction::Advance));

    h.engine.advance().await.unwrap();
    assert_eq!(h.presenter.last_question().as_deref(), Some("3+3?"));

    assert_eq!(h.engine.check_answer("5").unwrap(), AnswerOutcome::Wrong);
    assert_eq!(h.engine.session().cards()[1].correct_streak(), 0);
    assert_eq!(h.engine.primary_action(), Some(PrimaryAction::Retry));

    h.engine.retry().unwrap();
    assert_eq!(
        h.engine.check_answer("6").unwrap(),
        AnswerOutcome::Correct { streak: 1 }
    );

    h.engine.advance().await.unwrap();
    assert_eq!(h.presenter.last_question().as_deref(), Some("2+2?"));
    assert_eq!(h.engine.check_answer("4").unwrap(), AnswerOutcome::Mastered);
    assert_eq!(h.engine.session().mastered_count(), 1);

    h.engine.advance().await.unwrap();
    assert_eq!(h.presenter.last_question().as_deref(), Some("3+3?"));
    assert_eq!(h.engine.check_answer("6").unwrap(), AnswerOutcome::Mastered);
    assert_eq!(h.engine.score().mastered, 2);

    let step = h.engine.advance().await.unwrap();
    assert_eq!(step, QuizStep::Completed);
    assert!(!h.engine.is_active());
    assert!(h.presenter.contains(&QuizEvent::Completed { total: 2 }));
    assert!(h.presenter.contains(&QuizEvent::Ended));
    assert!(
        h.presenter
            .notifications()
            .iter()
            .any(|(severity, _)| *severity == Severity::Success)
    );
}

#[tokio::test]
async fn enter_key_routes_to_current_action() {
    let mut h = harness();
    h.engine.start(QuizStart::Fresh(arithmetic())).await.unwrap();

    assert_eq!(
        h.engine.submit("wrong").await.unwrap(),
        SubmitOutcome::Checked(AnswerOutcome::Wrong)
    );
    assert_eq!(h.engine.submit("").await.unwrap(), SubmitOutcome::Retried);
    assert_eq!(
        h.engine.submit("4").await.unwrap(),
        SubmitOutcome::Checked(AnswerOutcome::Correct { streak: 1 })
    );
    assert_eq!(
        h.engine.submit("").await.unwrap(),
        SubmitOutcome::Advanced(QuizStep::Question { index: 1 })
    );
}

#[tokio::test]
async fn wrong_feedback_carries_word_diff() {
    let mut h = harness();
    let card = Card::new(None, "Motto?", "Liberty Equality Fraternity").unwrap();
    h.engine.start(QuizStart::Fresh(vec![card])).await.unwrap();

    h.engine.check_answer("liberty fraternity").unwrap();
    let Some(Feedback::Wrong {
        correct_answer,
        diff,
    }) = h.presenter.last_feedback()
    else {
        panic!("expected wrong feedback");
    };
    assert_eq!(correct_answer, "Liberty Equality Fraternity");
    assert_eq!(diff.len(), 3);
    assert!(diff[0].is_same());
    assert!(!diff[1].is_same());
}

#[tokio::test]
async fn mastered_count_tracks_cards_after_every_check() {
    let mut h = harness();
    h.engine.start(QuizStart::Fresh(capitals())).await.unwrap();

    // Answer pattern: right, wrong, right, right, ... until done.
    let mut turn = 0_usize;
    while h.engine.is_active() {
        let answer = {
            let card = h.engine.session().current_card().unwrap();
            assert!(!card.is_mastered(), "advance never shows a mastered card");
            if turn % 4 == 1 {
                "nope".to_owned()
            } else {
                card.answer().to_owned()
            }
        };
        let outcome = h.engine.check_answer(&answer).unwrap();
        let session = h.engine.session();
        assert!(session.mastered_count_is_consistent());
        if outcome == AnswerOutcome::Wrong {
            assert_eq!(session.current_card().unwrap().correct_streak(), 0);
            h.engine.retry().unwrap();
        } else {
            h.engine.advance().await.unwrap();
        }
        turn += 1;
        assert!(turn < 100, "quiz should finish");
    }
}

#[tokio::test]
async fn advance_is_round_robin() {
    let mut h = harness();
    h.engine.start(QuizStart::Fresh(capitals())).await.unwrap();

    let mut seen = Vec::new();
    for _ in 0..4 {
        seen.push(h.engine.session().current_index().unwrap());
        let answer = h.engine.session().current_card().unwrap().answer().to_owned();
        h.engine.check_answer(&answer).unwrap();
        h.engine.advance().await.unwrap();
    }
    assert_eq!(seen, vec![0, 1, 2, 0]);
}

#[tokio::test]
async fn pause_then_restore_reproduces_progress() {
    let mut h = harness();
    h.engine.start(QuizStart::Fresh(capitals())).await.unwrap();
    h.engine.check_answer("Paris").unwrap();
    h.engine.advance().await.unwrap();
    h.engine.check_answer("Rome").unwrap();
    h.engine.advance().await.unwrap();
    h.engine.check_answer("wrong").unwrap();
    h.engine.retry().unwrap();

    let before = h.engine.session().clone();
    h.engine.pause().await.unwrap();
    assert!(!h.engine.is_active());
    assert!(h.presenter.contains(&QuizEvent::ResumeIndicatorChanged));

    let record = saved_record(&h.store).await;
    assert_eq!(record.group_id, GroupId::new(1));
    assert_eq!(record.current_index, 2);
    assert_eq!(record.saved_at(), Some(fixed_now()));

    let rebuilt = record.restore(GroupId::new(1), &capitals()).unwrap();
    assert_eq!(rebuilt.cards(), before.cards());
    assert_eq!(rebuilt.current_index(), before.current_index());
    assert_eq!(rebuilt.mastered_count(), before.mastered_count());

    // Resuming moves round-robin past the paused card.
    let step = h.engine.restore(&capitals()).await.unwrap();
    assert_eq!(step, QuizStep::Question { index: 0 });
    let after = h.engine.session();
    assert_eq!(after.cards(), before.cards());
    assert_eq!(after.mastered_count(), before.mastered_count());
    assert!(after.is_active());
    assert_eq!(h.presenter.last_question().as_deref(), Some("Capital of France?"));
}

#[tokio::test]
async fn resume_after_correct_answer_moves_to_next_card() {
    let mut h = harness();
    h.engine.start(QuizStart::Fresh(capitals())).await.unwrap();
    h.engine.check_answer("Paris").unwrap();
    assert_eq!(h.engine.primary_action(), Some(PrimaryAction::Advance));
    h.engine.pause().await.unwrap();

    let step = h.engine.restore(&capitals()).await.unwrap();
    assert_eq!(step, QuizStep::Question { index: 1 });
    assert_eq!(h.presenter.last_question().as_deref(), Some("Capital of Italy?"));
    assert_eq!(h.engine.session().cards()[0].correct_streak(), 1);
    assert_eq!(h.engine.primary_action(), Some(PrimaryAction::Check));
}

#[tokio::test]
async fn restore_without_group_fails_and_keeps_record() {
    let mut h = harness();
    h.engine.start(QuizStart::Fresh(arithmetic())).await.unwrap();
    h.engine.pause().await.unwrap();

    h.groups.select(None);
    let err = h.engine.restore(&arithmetic()).await.unwrap_err();
    assert!(matches!(err, QuizError::NoGroupSelected));
    assert!(!h.engine.is_active());
    assert!(h.store.get(PROGRESS_KEY).await.unwrap().is_some());
}

#[tokio::test]
async fn restore_for_other_group_keeps_record() {
    let mut h = harness();
    h.engine.start(QuizStart::Fresh(arithmetic())).await.unwrap();
    h.engine.pause().await.unwrap();

    h.groups.select(Some(GroupId::new(2)));
    let err = h.engine.restore(&arithmetic()).await.unwrap_err();
    assert!(matches!(
        err,
        QuizError::Restore(RestoreError::GroupMismatch { .. })
    ));
    assert!(h.store.get(PROGRESS_KEY).await.unwrap().is_some());
    assert_eq!(h.engine.saved_progress().await.unwrap(), None);

    h.groups.select(Some(GroupId::new(1)));
    h.engine.restore(&arithmetic()).await.unwrap();
    assert!(h.engine.is_active());
}

#[tokio::test]
async fn restore_without_saved_progress_fails() {
    let mut h = harness();
    let err = h.engine.restore(&arithmetic()).await.unwrap_err();
    assert!(matches!(err, QuizError::NoSavedProgress));
    assert!(!h.engine.is_active());
}

#[tokio::test]
async fn corrupt_record_is_deleted() {
    let mut h = harness();
    h.store
        .set(PROGRESS_KEY, r#"{"groupId":1,"mastered":0}"#)
        .await
        .unwrap();

    let err = h.engine.restore(&arithmetic()).await.unwrap_err();
    assert!(matches!(err, QuizError::CorruptProgress(_)));
    assert_eq!(h.store.get(PROGRESS_KEY).await.unwrap(), None);
}

#[tokio::test]
async fn restore_with_all_cards_deleted_discards_record() {
    let mut h = harness();
    h.engine.start(QuizStart::Fresh(arithmetic())).await.unwrap();
    h.engine.pause().await.unwrap();

    let err = h.engine.restore(&[]).await.unwrap_err();
    assert!(matches!(
        err,
        QuizError::Restore(RestoreError::NoMatchingCards)
    ));
    assert_eq!(h.store.get(PROGRESS_KEY).await.unwrap(), None);
}

#[tokio::test]
async fn restore_merges_added_and_deleted_cards() {
    let mut h = harness();
    h.engine.start(QuizStart::Fresh(arithmetic())).await.unwrap();
    h.engine.check_answer("4").unwrap();
    h.engine.pause().await.unwrap();

    let mut group = vec![arithmetic().remove(0)];
    group.push(Card::new(Some(CardId::new(3)), "4+4?", "8").unwrap());
    h.engine.restore(&group).await.unwrap();

    let session = h.engine.session();
    assert_eq!(session.total(), 2);
    assert_eq!(session.cards()[0].correct_streak(), 1);
    assert_eq!(session.cards()[1].correct_streak(), 0);
}

#[tokio::test]
async fn restoring_a_fully_mastered_record_completes() {
    let mut h = harness();
    let record = r#"{
        "groupId": 1,
        "cardStates": [
            { "key": 1, "correctStreak": 2, "isMastered": true },
            { "key": 2, "correctStreak": 2, "isMastered": true }
        ],
        "currentIndex": 1,
        "mastered": 2,
        "timestamp": 0
    }"#;
    h.store.set(PROGRESS_KEY, record).await.unwrap();

    let step = h.engine.restore(&arithmetic()).await.unwrap();
    assert_eq!(step, QuizStep::Completed);
    assert_eq!(h.store.get(PROGRESS_KEY).await.unwrap(), None);
    assert!(!h.engine.is_active());
}

#[tokio::test]
async fn pause_without_group_keeps_session() {
    let mut h = harness();
    h.engine.start(QuizStart::Fresh(arithmetic())).await.unwrap();
    h.groups.select(None);

    let err = h.engine.pause().await.unwrap_err();
    assert!(matches!(err, QuizError::NoGroupSelected));
    assert!(h.engine.is_active());
    assert!(
        h.presenter
            .notifications()
            .contains(&(Severity::Error, "no group is selected".to_owned()))
    );
}

#[tokio::test]
async fn pause_with_full_storage_keeps_session() {
    let mut h = harness_with_store(InMemoryStore::new().with_capacity(8));
    h.engine.start(QuizStart::Fresh(arithmetic())).await.unwrap();

    let err = h.engine.pause().await.unwrap_err();
    assert!(matches!(err, QuizError::StorageFull));
    assert!(h.engine.is_active());
    assert_eq!(h.engine.primary_action(), Some(PrimaryAction::Check));
    assert!(
        h.presenter
            .notifications()
            .iter()
            .any(|(severity, message)| *severity == Severity::Error && message.contains("full"))
    );
}

struct BrokenStore;

#[async_trait]
impl KeyValueStore for BrokenStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Connection("disk unplugged".into()))
    }

    async fn remove(&self, _key: &str) -> Result<(), StorageError> {
        Ok(())
    }
}

#[tokio::test]
async fn pause_with_storage_failure_reports_generic_error() {
    let presenter = Arc::new(RecordingPresenter::new());
    let mut engine = QuizEngine::new(
        fixed_clock(),
        Arc::new(BrokenStore),
        Arc::new(SelectedGroup::new(Some(GroupId::new(1)))),
        presenter.clone(),
    );
    engine.start(QuizStart::Fresh(arithmetic())).await.unwrap();

    let err = engine.pause().await.unwrap_err();
    assert!(matches!(err, QuizError::Storage(_)));
    assert!(engine.is_active());
    assert!(
        presenter
            .notifications()
            .contains(&(Severity::Error, "Could not save quiz progress.".to_owned()))
    );
}

#[tokio::test]
async fn saved_progress_summarizes_current_group() {
    let mut h = harness();
    assert_eq!(h.engine.saved_progress().await.unwrap(), None);

    h.engine.start(QuizStart::Fresh(arithmetic())).await.unwrap();
    h.engine.check_answer("4").unwrap();
    h.engine.advance().await.unwrap();
    h.engine.check_answer("6").unwrap();
    h.engine.advance().await.unwrap();
    h.engine.check_answer("4").unwrap();
    h.engine.pause().await.unwrap();

    let summary = h.engine.saved_progress().await.unwrap().expect("summary");
    assert_eq!(summary.group_id, GroupId::new(1));
    assert_eq!(summary.mastered, 1);
    assert_eq!(summary.total, 2);
    assert_eq!(summary.saved_at, Some(fixed_now()));
}

#[tokio::test]
async fn saved_progress_ignores_unreadable_record() {
    let h = harness();
    h.store.set(PROGRESS_KEY, "not json").await.unwrap();

    assert_eq!(h.engine.saved_progress().await.unwrap(), None);
    assert_eq!(
        h.store.get(PROGRESS_KEY).await.unwrap().as_deref(),
        Some("not json")
    );
}

#[tokio::test]
async fn pause_overwrites_previous_record() {
    let mut h = harness();
    h.engine.start(QuizStart::Fresh(arithmetic())).await.unwrap();
    h.engine.pause().await.unwrap();

    h.groups.select(Some(GroupId::new(7)));
    h.engine.start(QuizStart::Fresh(capitals())).await.unwrap();
    h.engine.pause().await.unwrap();

    let record = saved_record(&h.store).await;
    assert_eq!(record.group_id, GroupId::new(7));
    assert_eq!(record.card_states.len(), 3);
}
