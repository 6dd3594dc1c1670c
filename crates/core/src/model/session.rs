use crate::model::card::Card;

/// Consecutive correct answers required before a card is considered learned.
pub const MASTERY_THRESHOLD: u32 = 2;

//
// ─── SESSION CARD ──────────────────────────────────────────────────────────────
//

/// A card plus the progress it has made in the current session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCard {
    card: Card,
    correct_streak: u32,
    is_mastered: bool,
}

impl SessionCard {
    #[must_use]
    pub fn fresh(card: Card) -> Self {
        Self {
            card,
            correct_streak: 0,
            is_mastered: false,
        }
    }

    pub(crate) fn with_progress(card: Card, correct_streak: u32, is_mastered: bool) -> Self {
        Self {
            card,
            correct_streak,
            is_mastered,
        }
    }

    #[must_use]
    pub fn card(&self) -> &Card {
        &self.card
    }

    #[must_use]
    pub fn question(&self) -> &str {
        &self.card.question
    }

    #[must_use]
    pub fn answer(&self) -> &str {
        &self.card.answer
    }

    #[must_use]
    pub fn correct_streak(&self) -> u32 {
        self.correct_streak
    }

    #[must_use]
    pub fn is_mastered(&self) -> bool {
        self.is_mastered
    }
}

//
// ─── OUTCOMES ──────────────────────────────────────────────────────────────────
//

/// What recording an answer did to the current card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// Correct, but the streak is still below the mastery threshold.
    Correct { streak: u32 },
    /// This answer pushed the card over the threshold.
    Mastered,
    /// Correct answer on a card that was already mastered.
    StillMastered { streak: u32 },
    /// Wrong answer; the streak was reset.
    Wrong,
}

impl AnswerOutcome {
    #[must_use]
    pub fn is_correct(self) -> bool {
        !matches!(self, AnswerOutcome::Wrong)
    }
}

/// Result of searching for the next question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextCard {
    /// Found by the circular scan.
    Found(usize),
    /// Only the linear fallback scan found a card.
    Recovered(usize),
    /// No unmastered card left.
    Exhausted,
}

//
// ─── QUIZ SESSION ──────────────────────────────────────────────────────────────
//

/// In-memory state of one quiz attempt over a fixed set of cards.
///
/// Card membership never changes after construction; only per-card progress,
/// the current index and the mastered count move. `mastered_count` always
/// equals the number of mastered cards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuizSession {
    cards: Vec<SessionCard>,
    current_index: Option<usize>,
    mastered_count: usize,
    active: bool,
}

impl QuizSession {
    /// Start a new active session with every card at zero progress.
    #[must_use]
    pub fn fresh(cards: Vec<Card>) -> Self {
        Self {
            cards: cards.into_iter().map(SessionCard::fresh).collect(),
            current_index: None,
            mastered_count: 0,
            active: true,
        }
    }

    /// Rebuild an inactive session from previously saved progress.
    ///
    /// The mastered count is recomputed from the cards; an out-of-range index
    /// is dropped.
    #[must_use]
    pub fn resumed(cards: Vec<SessionCard>, current_index: Option<usize>) -> Self {
        let mastered_count = cards.iter().filter(|c| c.is_mastered).count();
        let current_index = current_index.filter(|i| *i < cards.len());
        Self {
            cards,
            current_index,
            mastered_count,
            active: false,
        }
    }

    #[must_use]
    pub fn cards(&self) -> &[SessionCard] {
        &self.cards
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    #[must_use]
    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    #[must_use]
    pub fn mastered_count(&self) -> usize {
        self.mastered_count
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// True once every card is mastered.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.mastered_count >= self.cards.len()
    }

    #[must_use]
    pub fn current_card(&self) -> Option<&SessionCard> {
        self.current_index.and_then(|i| self.cards.get(i))
    }

    pub fn activate(&mut self) {
        self.active = true;
    }

    /// Round-robin search for the next unmastered card.
    ///
    /// The circular scan starts one past the current index so every
    /// unmastered card is visited before any is repeated.
    #[must_use]
    pub fn next_unmastered(&self) -> NextCard {
        let n = self.cards.len();
        if n == 0 {
            return NextCard::Exhausted;
        }

        let start = self.current_index.map_or(0, |i| (i + 1) % n);
        for step in 0..n {
            let idx = (start + step) % n;
            if !self.cards[idx].is_mastered {
                return NextCard::Found(idx);
            }
        }

        match self.cards.iter().position(|c| !c.is_mastered) {
            Some(idx) => NextCard::Recovered(idx),
            None => NextCard::Exhausted,
        }
    }

    /// Make `index` the displayed question. Returns the card, or `None` when out of range.
    pub fn present(&mut self, index: usize) -> Option<&SessionCard> {
        if index >= self.cards.len() {
            return None;
        }
        self.current_index = Some(index);
        self.cards.get(index)
    }

    /// Apply a checked answer to the current card.
    ///
    /// Returns `None` when no question is displayed.
    pub fn record_answer(&mut self, matched: bool) -> Option<AnswerOutcome> {
        let index = self.current_index?;
        let card = self.cards.get_mut(index)?;

        if !matched {
            card.correct_streak = 0;
            return Some(AnswerOutcome::Wrong);
        }

        card.correct_streak += 1;
        let streak = card.correct_streak;
        if streak < MASTERY_THRESHOLD {
            return Some(AnswerOutcome::Correct { streak });
        }
        if card.is_mastered {
            return Some(AnswerOutcome::StillMastered { streak });
        }

        card.is_mastered = true;
        self.mastered_count += 1;
        Some(AnswerOutcome::Mastered)
    }

    /// Drop all state and become inactive.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Whether the cached mastered count agrees with the cards.
    #[must_use]
    pub fn mastered_count_is_consistent(&self) -> bool {
        self.mastered_count == self.cards.iter().filter(|c| c.is_mastered).count()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
