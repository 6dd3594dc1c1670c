use std::fmt;
use std::sync::Arc;

use rand::rng;
use rand::seq::SliceRandom;

use quiz_core::answer::{answers_match, word_diff};
use quiz_core::model::{
    AnswerOutcome, Card, MASTERY_THRESHOLD, NextCard, PersistedProgress, QuizSession,
    RestoreError, SavedProgressSummary,
};
use quiz_core::{Clock, PROGRESS_KEY};
use storage::repository::{KeyValueStore, StorageError};

use super::events::{Feedback, Presenter, PrimaryAction, QuizEvent, Severity};
use super::group::GroupResolver;
use super::progress::QuizScore;
use crate::error::QuizError;

//
// ─── INPUTS AND RESULTS ────────────────────────────────────────────────────────
//

/// How a quiz begins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizStart {
    /// New attempt over these cards; any saved progress is discarded.
    Fresh(Vec<Card>),
    /// Continue the session previously rebuilt by `restore`.
    Resume,
}

/// Where the quiz stands after moving to a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizStep {
    Question { index: usize },
    Completed,
}

/// What a press of the primary button did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Checked(AnswerOutcome),
    Retried,
    Advanced(QuizStep),
}

//
// ─── ENGINE ────────────────────────────────────────────────────────────────────
//

/// Drives one quiz session: question selection, answer checking, pause and resume.
///
/// The engine owns its `QuizSession`; collaborators are injected so the same
/// engine runs against a terminal, a web front end or test doubles.
pub struct QuizEngine {
    clock: Clock,
    store: Arc<dyn KeyValueStore>,
    groups: Arc<dyn GroupResolver>,
    presenter: Arc<dyn Presenter>,
    session: QuizSession,
    action: Option<PrimaryAction>,
    shuffle: bool,
}

impl QuizEngine {
    #[must_use]
    pub fn new(
        clock: Clock,
        store: Arc<dyn KeyValueStore>,
        groups: Arc<dyn GroupResolver>,
        presenter: Arc<dyn Presenter>,
    ) -> Self {
        Self {
            clock,
            store,
            groups,
            presenter,
            session: QuizSession::default(),
            action: None,
            shuffle: false,
        }
    }

    /// Shuffle the card order of fresh sessions.
    #[must_use]
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    #[must_use]
    pub fn session(&self) -> &QuizSession {
        &self.session
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.session.is_active()
    }

    /// The action the primary button currently performs, if a quiz is running.
    #[must_use]
    pub fn primary_action(&self) -> Option<PrimaryAction> {
        self.action
    }

    #[must_use]
    pub fn score(&self) -> QuizScore {
        QuizScore::of(&self.session)
    }

    /// Begin a quiz and show its first question.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::EmptyCardSet` for a fresh start without cards, or
    /// `QuizError::NothingToResume` when resuming without a restored session.
    pub async fn start(&mut self, start: QuizStart) -> Result<QuizStep, QuizError> {
        match start {
            QuizStart::Fresh(mut cards) => {
                if cards.is_empty() {
                    return Err(self.report(Severity::Warning, QuizError::EmptyCardSet));
                }
                self.clear_saved().await;
                if self.shuffle {
                    cards.as_mut_slice().shuffle(&mut rng());
                }
                self.session = QuizSession::fresh(cards);
                tracing::info!(total = self.session.total(), "starting quiz");
                self.announce_start(false);
                Ok(self.present_next().await)
            }
            QuizStart::Resume => {
                if self.session.is_empty() {
                    let err = self.report(Severity::Error, QuizError::NothingToResume);
                    self.force_end();
                    return Err(err);
                }
                self.session.activate();
                tracing::info!(
                    total = self.session.total(),
                    mastered = self.session.mastered_count(),
                    "resuming quiz"
                );
                self.announce_start(true);
                Ok(self.present_next().await)
            }
        }
    }

    /// Rebuild the paused session for the current group and resume it.
    ///
    /// Resuming moves on from the card that was current at pause time, so
    /// the next question is the nearest unmastered card after it.
    ///
    /// A record saved for a different group is left in place; unreadable
    /// records and records with no surviving cards are deleted.
    ///
    /// # Errors
    ///
    /// Returns `QuizError` describing why nothing could be resumed.
    pub async fn restore(&mut self, group_cards: &[Card]) -> Result<QuizStep, QuizError> {
        let Some(group_id) = self.groups.current_group_id() else {
            return Err(self.report(Severity::Warning, QuizError::NoGroupSelected));
        };

        let raw = match self.store.get(PROGRESS_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Err(self.report(Severity::Warning, QuizError::NoSavedProgress)),
            Err(err) => return Err(self.report(Severity::Error, err.into())),
        };

        let record: PersistedProgress = match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(err) => {
                tracing::warn!(error = %err, "discarding unreadable quiz progress");
                self.clear_saved().await;
                return Err(self.report(
                    Severity::Warning,
                    QuizError::CorruptProgress(err.to_string()),
                ));
            }
        };

        let session = match record.restore(group_id, group_cards) {
            Ok(session) => session,
            Err(err @ RestoreError::GroupMismatch { .. }) => {
                return Err(self.report(Severity::Warning, err.into()));
            }
            Err(err) => {
                self.clear_saved().await;
                return Err(self.report(Severity::Warning, err.into()));
            }
        };

        if session.mastered_count() != record.mastered {
            tracing::warn!(
                saved = record.mastered,
                actual = session.mastered_count(),
                "saved mastered count disagrees with card states"
            );
        }

        self.session = session;
        self.start(QuizStart::Resume).await
    }

    /// Move to the next unmastered card after a correct answer.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::ActionUnavailable` unless the primary action is `Advance`.
    pub async fn advance(&mut self) -> Result<QuizStep, QuizError> {
        self.require_action(PrimaryAction::Advance)?;
        Ok(self.present_next().await)
    }

    /// Compare `raw` with the current card's answer and update its streak.
    ///
    /// # Errors
    ///
    /// Returns `QuizError` if no quiz is running, no question is shown, or
    /// the previous answer's feedback has not been dismissed.
    pub fn check_answer(&mut self, raw: &str) -> Result<AnswerOutcome, QuizError> {
        if !self.session.is_active() {
            return Err(self.report(Severity::Warning, QuizError::NotActive));
        }
        let (index, expected) = match (self.session.current_index(), self.session.current_card())
        {
            (Some(index), Some(card)) => (index, card.answer().to_owned()),
            _ => return Err(self.report(Severity::Warning, QuizError::NoCurrentQuestion)),
        };
        self.require_action(PrimaryAction::Check)?;

        self.emit(QuizEvent::InputEnabled { enabled: false });
        let matched = answers_match(raw, &expected);
        let Some(outcome) = self.session.record_answer(matched) else {
            return Err(self.report(Severity::Warning, QuizError::NoCurrentQuestion));
        };
        tracing::debug!(index, ?outcome, "checked answer");

        let feedback = match outcome {
            AnswerOutcome::Correct { streak } => Feedback::Correct {
                streak,
                threshold: MASTERY_THRESHOLD,
            },
            AnswerOutcome::Mastered => Feedback::Mastered,
            AnswerOutcome::StillMastered { .. } => Feedback::StillMastered,
            AnswerOutcome::Wrong => Feedback::Wrong {
                diff: word_diff(raw, &expected),
                correct_answer: expected,
            },
        };
        self.emit(QuizEvent::Feedback { feedback });

        if outcome == AnswerOutcome::Mastered {
            tracing::info!(
                mastered = self.session.mastered_count(),
                total = self.session.total(),
                "card mastered"
            );
            self.emit(QuizEvent::Score {
                score: self.score(),
            });
        }

        if outcome.is_correct() {
            self.set_action(PrimaryAction::Advance);
        } else {
            self.set_action(PrimaryAction::Retry);
            self.emit(QuizEvent::InputEnabled { enabled: true });
        }

        Ok(outcome)
    }

    /// Ask the current card again after a wrong answer.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::ActionUnavailable` unless the primary action is `Retry`.
    pub fn retry(&mut self) -> Result<(), QuizError> {
        self.require_action(PrimaryAction::Retry)?;
        let Some(index) = self.session.current_index() else {
            return Err(self.report(Severity::Warning, QuizError::NoCurrentQuestion));
        };
        self.show(index);
        Ok(())
    }

    /// Run whatever the primary button currently does (the Enter key path).
    ///
    /// # Errors
    ///
    /// Propagates the error of the dispatched action.
    pub async fn submit(&mut self, raw: &str) -> Result<SubmitOutcome, QuizError> {
        match self.action {
            Some(PrimaryAction::Check) => self.check_answer(raw).map(SubmitOutcome::Checked),
            Some(PrimaryAction::Retry) => self.retry().map(|()| SubmitOutcome::Retried),
            Some(PrimaryAction::Advance) => self.advance().await.map(SubmitOutcome::Advanced),
            None => Err(self.report(Severity::Warning, QuizError::NotActive)),
        }
    }

    /// Save progress for the current group and leave quiz mode.
    ///
    /// On a failed write the session stays active so the user can retry.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::StorageFull` when the store is out of space, or
    /// another `QuizError` for missing preconditions and storage failures.
    pub async fn pause(&mut self) -> Result<(), QuizError> {
        if !self.session.is_active() || self.session.is_empty() {
            return Err(self.report(Severity::Warning, QuizError::NotActive));
        }
        let Some(group_id) = self.groups.current_group_id() else {
            return Err(self.report(Severity::Error, QuizError::NoGroupSelected));
        };

        let record = PersistedProgress::capture(group_id, &self.session, self.clock.now());
        let encoded = serde_json::to_string(&record)
            .map_err(|err| self.report(Severity::Error, QuizError::Encode(err.to_string())))?;

        match self.store.set(PROGRESS_KEY, &encoded).await {
            Ok(()) => {
                tracing::info!(group = %group_id, mastered = record.mastered, "quiz paused");
                self.notify("Quiz paused.", Severity::Info);
                self.force_end();
                Ok(())
            }
            Err(StorageError::CapacityExceeded) => {
                tracing::warn!("quiz progress not saved: storage full");
                Err(self.report(Severity::Error, QuizError::StorageFull))
            }
            Err(err) => {
                tracing::warn!(error = %err, "quiz progress not saved");
                self.notify("Could not save quiz progress.", Severity::Error);
                Err(QuizError::Storage(err))
            }
        }
    }

    /// Tear down the session unconditionally. Safe to call when inactive.
    pub fn force_end(&mut self) {
        if self.session.is_active() {
            tracing::debug!("ending quiz");
        }
        self.session.reset();
        self.action = None;
        self.emit(QuizEvent::Ended);
        self.emit(QuizEvent::ResumeIndicatorChanged);
    }

    /// Saved progress for the currently selected group, if any.
    ///
    /// Records for other groups and unreadable records are reported as absent.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` if the store cannot be read.
    pub async fn saved_progress(&self) -> Result<Option<SavedProgressSummary>, QuizError> {
        let Some(group_id) = self.groups.current_group_id() else {
            return Ok(None);
        };
        let Some(raw) = self.store.get(PROGRESS_KEY).await? else {
            return Ok(None);
        };
        let record: PersistedProgress = match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(err) => {
                tracing::debug!(error = %err, "ignoring unreadable quiz progress");
                return Ok(None);
            }
        };
        Ok((record.group_id == group_id).then(|| record.summary()))
    }

    //
    // ─── INTERNALS ─────────────────────────────────────────────────────────────
    //

    async fn present_next(&mut self) -> QuizStep {
        if self.session.is_complete() {
            self.complete().await;
            return QuizStep::Completed;
        }

        let index = match self.session.next_unmastered() {
            NextCard::Found(index) => index,
            NextCard::Recovered(index) => {
                tracing::warn!(index, "circular scan missed an unmastered card");
                index
            }
            NextCard::Exhausted => {
                tracing::warn!(
                    mastered = self.session.mastered_count(),
                    total = self.session.total(),
                    "mastered count out of sync with cards; ending quiz"
                );
                self.complete().await;
                return QuizStep::Completed;
            }
        };

        self.show(index);
        QuizStep::Question { index }
    }

    fn show(&mut self, index: usize) {
        let Some(card) = self.session.present(index) else {
            return;
        };
        let text = card.question().to_owned();
        tracing::debug!(index, "showing question");
        self.emit(QuizEvent::FeedbackCleared);
        self.emit(QuizEvent::Question { index, text });
        self.set_action(PrimaryAction::Check);
        self.emit(QuizEvent::InputEnabled { enabled: true });
    }

    async fn complete(&mut self) {
        let total = self.session.total();
        tracing::info!(total, "all cards mastered");
        self.notify(
            format!("Congratulations! You mastered all {total} cards."),
            Severity::Success,
        );
        self.emit(QuizEvent::Completed { total });
        self.clear_saved().await;
        self.force_end();
    }

    fn announce_start(&mut self, resumed: bool) {
        self.action = None;
        self.emit(QuizEvent::Started {
            total: self.session.total(),
            resumed,
        });
        self.emit(QuizEvent::Score {
            score: self.score(),
        });
    }

    async fn clear_saved(&self) {
        if let Err(err) = self.store.remove(PROGRESS_KEY).await {
            tracing::warn!(error = %err, "failed to clear saved quiz progress");
        }
    }

    fn require_action(&self, requested: PrimaryAction) -> Result<(), QuizError> {
        if !self.session.is_active() {
            return Err(self.report(Severity::Warning, QuizError::NotActive));
        }
        if self.action != Some(requested) {
            return Err(self.report(
                Severity::Warning,
                QuizError::ActionUnavailable {
                    requested,
                    current: self.action,
                },
            ));
        }
        Ok(())
    }

    fn set_action(&mut self, action: PrimaryAction) {
        self.action = Some(action);
        self.emit(QuizEvent::PrimaryAction { action });
    }

    fn notify(&self, message: impl Into<String>, severity: Severity) {
        self.emit(QuizEvent::Notify {
            message: message.into(),
            severity,
        });
    }

    fn report(&self, severity: Severity, err: QuizError) -> QuizError {
        self.notify(err.to_string(), severity);
        err
    }

    fn emit(&self, event: QuizEvent) {
        self.presenter.emit(event);
    }
}

impl fmt::Debug for QuizEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizEngine")
            .field("clock", &self.clock)
            .field("cards_len", &self.session.total())
            .field("current_index", &self.session.current_index())
            .field("mastered", &self.session.mastered_count())
            .field("active", &self.session.is_active())
            .field("action", &self.action)
            .field("shuffle", &self.shuffle)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
