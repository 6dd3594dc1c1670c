use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::card::Card;
use crate::model::ids::{CardKey, GroupId};
use crate::model::session::{QuizSession, SessionCard};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RestoreError {
    #[error("saved progress belongs to group {saved}, not {current}")]
    GroupMismatch { saved: GroupId, current: GroupId },

    #[error("none of the saved cards are still in the group")]
    NoMatchingCards,
}

//
// ─── PERSISTED SHAPE ───────────────────────────────────────────────────────────
//

/// Saved progress of one card, matched back by key on resume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardState {
    #[serde(alias = "id")]
    pub key: CardKey,
    #[serde(default)]
    pub correct_streak: u32,
    #[serde(default)]
    pub is_mastered: bool,
}

/// Snapshot written on pause and read on resume.
///
/// `current_index` keeps the `-1` sentinel for "no question shown" and
/// `timestamp` is Unix milliseconds, so records stay readable by older clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedProgress {
    pub group_id: GroupId,
    pub card_states: Vec<CardState>,
    #[serde(default = "no_current_index")]
    pub current_index: i64,
    #[serde(default)]
    pub mastered: usize,
    #[serde(default)]
    pub timestamp: i64,
}

fn no_current_index() -> i64 {
    -1
}

/// What a "resume" affordance needs to describe a saved quiz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedProgressSummary {
    pub group_id: GroupId,
    pub mastered: usize,
    pub total: usize,
    pub saved_at: Option<DateTime<Utc>>,
}

impl PersistedProgress {
    /// Capture the progress of `session` for `group_id`.
    #[must_use]
    pub fn capture(group_id: GroupId, session: &QuizSession, saved_at: DateTime<Utc>) -> Self {
        let card_states = session
            .cards()
            .iter()
            .map(|c| CardState {
                key: c.card().key(),
                correct_streak: c.correct_streak(),
                is_mastered: c.is_mastered(),
            })
            .collect();

        Self {
            group_id,
            card_states,
            current_index: session
                .current_index()
                .and_then(|i| i64::try_from(i).ok())
                .unwrap_or(-1),
            mastered: session.mastered_count(),
            timestamp: saved_at.timestamp_millis(),
        }
    }

    #[must_use]
    pub fn current_index(&self) -> Option<usize> {
        usize::try_from(self.current_index).ok()
    }

    #[must_use]
    pub fn saved_at(&self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp_millis(self.timestamp)
    }

    #[must_use]
    pub fn summary(&self) -> SavedProgressSummary {
        SavedProgressSummary {
            group_id: self.group_id,
            mastered: self.mastered,
            total: self.card_states.len(),
            saved_at: self.saved_at(),
        }
    }

    /// Rebuild a session for `current_group` from the group's live cards.
    ///
    /// Cards are taken in group order. A card with saved state carries it
    /// over; a card added since the pause starts fresh; saved states for
    /// cards that left the group are dropped.
    ///
    /// # Errors
    ///
    /// Returns `RestoreError::GroupMismatch` if the record belongs to another
    /// group, or `RestoreError::NoMatchingCards` if nothing can be rebuilt.
    pub fn restore(
        &self,
        current_group: GroupId,
        group_cards: &[Card],
    ) -> Result<QuizSession, RestoreError> {
        if self.group_id != current_group {
            return Err(RestoreError::GroupMismatch {
                saved: self.group_id,
                current: current_group,
            });
        }

        let saved: HashMap<&CardKey, &CardState> =
            self.card_states.iter().map(|s| (&s.key, s)).collect();

        let cards: Vec<SessionCard> = group_cards
            .iter()
            .map(|card| match saved.get(&card.key()) {
                Some(state) => {
                    SessionCard::with_progress(card.clone(), state.correct_streak, state.is_mastered)
                }
                None => SessionCard::fresh(card.clone()),
            })
            .collect();

        if cards.is_empty() {
            return Err(RestoreError::NoMatchingCards);
        }

        Ok(QuizSession::resumed(cards, self.current_index()))
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ids::CardId;
    use crate::time::{FIXED_TEST_MILLIS, fixed_now};

    fn card(id: u64, q: &str, a: &str) -> Card {
        Card::new(Some(CardId::new(id)), q, a).unwrap()
    }

    fn played_session() -> QuizSession {
        let mut session = QuizSession::fresh(vec![card(1, "2+2?", "4"), card(2, "3+3?", "6")]);
        session.present(0);
        session.record_answer(true);
        session.record_answer(true);
        session.present(1);
        session.record_answer(true);
        session
    }

    #[test]
    fn capture_then_restore_reproduces_state() {
        let session = played_session();
        let group = GroupId::new(3);
        let record = PersistedProgress::capture(group, &session, fixed_now());

        let restored = record
            .restore(group, &[card(1, "2+2?", "4"), card(2, "3+3?", "6")])
            .unwrap();

        assert_eq!(restored.cards(), session.cards());
        assert_eq!(restored.current_index(), Some(1));
        assert_eq!(restored.mastered_count(), 1);
        assert!(!restored.is_active());
    }

    #[test]
    fn json_shape_uses_camel_case_and_sentinel() {
        let session = QuizSession::fresh(vec![card(1, "q", "a")]);
        let record = PersistedProgress::capture(GroupId::new(9), &session, fixed_now());
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["groupId"], 9);
        assert_eq!(json["currentIndex"], -1);
        assert_eq!(json["cardStates"][0]["key"], 1);
        assert_eq!(json["cardStates"][0]["correctStreak"], 0);
        assert_eq!(json["timestamp"], FIXED_TEST_MILLIS);
        assert_eq!(record.saved_at(), Some(fixed_now()));
    }

    #[test]
    fn reads_legacy_records() {
        let raw = r#"{
            "groupId": 4,
            "cardStates": [{ "id": 12, "correctStreak": 1, "isMastered": false }],
            "mastered": 0
        }"#;
        let record: PersistedProgress = serde_json::from_str(raw).unwrap();
        assert_eq!(record.card_states[0].key, CardKey::Id(12));
        assert_eq!(record.current_index(), None);
    }

    #[test]
    fn missing_required_fields_fail_to_parse() {
        let raw = r#"{ "groupId": 4, "mastered": 0 }"#;
        assert!(serde_json::from_str::<PersistedProgress>(raw).is_err());
    }

    #[test]
    fn restore_rejects_other_group() {
        let record = PersistedProgress::capture(GroupId::new(1), &played_session(), fixed_now());
        let err = record
            .restore(GroupId::new(2), &[card(1, "2+2?", "4")])
            .unwrap_err();
        assert_eq!(
            err,
            RestoreError::GroupMismatch {
                saved: GroupId::new(1),
                current: GroupId::new(2)
            }
        );
    }

    #[test]
    fn restore_drops_deleted_and_adds_new_cards() {
        let group = GroupId::new(1);
        let record = PersistedProgress::capture(group, &played_session(), fixed_now());

        // Card 1 (mastered) was deleted, card 3 was added.
        let restored = record
            .restore(group, &[card(2, "3+3?", "6"), card(3, "4+4?", "8")])
            .unwrap();

        assert_eq!(restored.total(), 2);
        assert_eq!(restored.cards()[0].correct_streak(), 1);
        assert_eq!(restored.cards()[1].correct_streak(), 0);
        assert_eq!(restored.mastered_count(), 0);
        assert!(restored.mastered_count_is_consistent());
        assert_eq!(restored.current_index(), Some(1));
    }

    #[test]
    fn restore_keeps_id_and_question_keys_apart() {
        let group = GroupId::new(1);
        let raw = r#"{
            "groupId": 1,
            "cardStates": [
                { "key": 12, "correctStreak": 1, "isMastered": false },
                { "key": "12", "correctStreak": 2, "isMastered": true }
            ],
            "currentIndex": 0
        }"#;
        let record: PersistedProgress = serde_json::from_str(raw).unwrap();

        let restored = record
            .restore(
                group,
                &[
                    card(12, "Twelve?", "12"),
                    Card::new(None, "12", "twelve").unwrap(),
                ],
            )
            .unwrap();

        assert_eq!(restored.cards()[0].correct_streak(), 1);
        assert!(!restored.cards()[0].is_mastered());
        assert!(restored.cards()[1].is_mastered());
        assert_eq!(restored.mastered_count(), 1);
    }

    #[test]
    fn restore_with_empty_group_fails() {
        let group = GroupId::new(1);
        let record = PersistedProgress::capture(group, &played_session(), fixed_now());
        assert_eq!(
            record.restore(group, &[]).unwrap_err(),
            RestoreError::NoMatchingCards
        );
    }

    #[test]
    fn summary_counts_saved_cards() {
        let record = PersistedProgress::capture(GroupId::new(5), &played_session(), fixed_now());
        let summary = record.summary();
        assert_eq!(summary.mastered, 1);
        assert_eq!(summary.total, 2);
        assert_eq!(summary.saved_at, Some(fixed_now()));
    }
}
