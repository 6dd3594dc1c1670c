use serde::Serialize;

use quiz_core::model::QuizSession;

/// Aggregated view of quiz progress, useful for the score display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuizScore {
    pub total: usize,
    pub mastered: usize,
    pub remaining: usize,
}

impl QuizScore {
    #[must_use]
    pub fn of(session: &QuizSession) -> Self {
        let total = session.total();
        let mastered = session.mastered_count();
        Self {
            total,
            mastered,
            remaining: total.saturating_sub(mastered),
        }
    }
}
