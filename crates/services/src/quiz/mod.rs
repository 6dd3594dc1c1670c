mod engine;
mod events;
mod group;
mod progress;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Public API of the quiz subsystem.
pub use crate::error::QuizError;
pub use engine::{QuizEngine, QuizStart, QuizStep, SubmitOutcome};
pub use events::{Feedback, Presenter, PrimaryAction, QuizEvent, Severity};
pub use group::{GroupResolver, SelectedGroup};
pub use progress::QuizScore;
