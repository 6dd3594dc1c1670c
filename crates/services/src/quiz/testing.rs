//! Test doubles for driving a `QuizEngine` without a real front end.

use std::sync::Mutex;

use super::events::{Feedback, Presenter, QuizEvent, Severity};

/// Presenter that records every event in order.
#[derive(Debug, Default)]
pub struct RecordingPresenter {
    events: Mutex<Vec<QuizEvent>>,
}

impl RecordingPresenter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn events(&self) -> Vec<QuizEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Text of the most recent question shown.
    #[must_use]
    pub fn last_question(&self) -> Option<String> {
        self.events().into_iter().rev().find_map(|e| match e {
            QuizEvent::Question { text, .. } => Some(text),
            _ => None,
        })
    }

    #[must_use]
    pub fn last_feedback(&self) -> Option<Feedback> {
        self.events().into_iter().rev().find_map(|e| match e {
            QuizEvent::Feedback { feedback } => Some(feedback),
            _ => None,
        })
    }

    #[must_use]
    pub fn notifications(&self) -> Vec<(Severity, String)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                QuizEvent::Notify { message, severity } => Some((severity, message)),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn contains(&self, event: &QuizEvent) -> bool {
        self.events().iter().any(|e| e == event)
    }
}

impl Presenter for RecordingPresenter {
    fn emit(&self, event: QuizEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
