mod card;
mod ids;
mod progress;
mod session;

pub use ids::{CardId, CardKey, GroupId, ParseIdError};

pub use card::{Card, CardError};
pub use progress::{CardState, PersistedProgress, RestoreError, SavedProgressSummary};
pub use session::{AnswerOutcome, MASTERY_THRESHOLD, NextCard, QuizSession, SessionCard};
