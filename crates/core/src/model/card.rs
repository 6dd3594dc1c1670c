use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{CardId, CardKey};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CardError {
    #[error("question cannot be empty")]
    EmptyQuestion,

    #[error("answer cannot be empty")]
    EmptyAnswer,
}

//
// ─── CARD ──────────────────────────────────────────────────────────────────────
//

/// A question/answer pair as supplied by the card provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<CardId>,
    pub question: String,
    pub answer: String,
}

impl Card {
    /// Build a card, rejecting blank question or answer text.
    ///
    /// # Errors
    ///
    /// Returns `CardError::EmptyQuestion` or `CardError::EmptyAnswer`.
    pub fn new(
        id: Option<CardId>,
        question: impl Into<String>,
        answer: impl Into<String>,
    ) -> Result<Self, CardError> {
        let question = question.into();
        let answer = answer.into();
        if question.trim().is_empty() {
            return Err(CardError::EmptyQuestion);
        }
        if answer.trim().is_empty() {
            return Err(CardError::EmptyAnswer);
        }
        Ok(Self {
            id,
            question,
            answer,
        })
    }

    /// Key used to match this card against persisted progress.
    ///
    /// Falls back to the question text when the card has no id, so two id-less
    /// cards with the same question collapse onto one key. Id keys and question
    /// keys are distinct kinds and never collide with each other.
    #[must_use]
    pub fn key(&self) -> CardKey {
        match self.id {
            Some(id) => CardKey::from(id),
            None => CardKey::Question(self.question.clone()),
        }
    }
}
