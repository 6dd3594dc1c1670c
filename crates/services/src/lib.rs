#![forbid(unsafe_code)]

pub mod error;
pub mod quiz;

pub use quiz_core::Clock;

pub use error::QuizError;
pub use quiz::{
    Feedback, GroupResolver, Presenter, PrimaryAction, QuizEngine, QuizEvent, QuizScore,
    QuizStart, QuizStep, SelectedGroup, Severity, SubmitOutcome,
};
