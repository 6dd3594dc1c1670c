use std::fmt;

use serde::Serialize;

use quiz_core::answer::DiffToken;

use super::progress::QuizScore;

/// What pressing the main quiz button (or Enter) does right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimaryAction {
    /// Check the typed answer against the current card.
    Check,
    /// Clear the wrong-answer feedback and ask the same card again.
    Retry,
    /// Move on to the next unmastered card.
    Advance,
}

impl fmt::Display for PrimaryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PrimaryAction::Check => "check an answer",
            PrimaryAction::Retry => "retry the question",
            PrimaryAction::Advance => "move to the next question",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// Result of an answer check, as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Feedback {
    Correct {
        streak: u32,
        threshold: u32,
    },
    Mastered,
    StillMastered,
    Wrong {
        correct_answer: String,
        diff: Vec<DiffToken>,
    },
}

/// Everything the engine tells the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum QuizEvent {
    Started { total: usize, resumed: bool },
    Question { index: usize, text: String },
    FeedbackCleared,
    Feedback { feedback: Feedback },
    PrimaryAction { action: PrimaryAction },
    InputEnabled { enabled: bool },
    Score { score: QuizScore },
    Notify { message: String, severity: Severity },
    Completed { total: usize },
    Ended,
    ResumeIndicatorChanged,
}

/// Receives quiz events. Implementations own all display concerns,
/// including any animation timing between consecutive feedback renders.
pub trait Presenter: Send + Sync {
    fn emit(&self, event: QuizEvent);
}
