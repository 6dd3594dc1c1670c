//! Terminal renderings of quiz events.

use quiz_core::answer::DiffToken;
use services::{Feedback, Presenter, PrimaryAction, QuizEvent, Severity};

/// Prints events as human-readable lines on stdout.
#[derive(Debug, Default)]
pub struct ConsolePresenter;

impl Presenter for ConsolePresenter {
    fn emit(&self, event: QuizEvent) {
        if let Some(line) = render(&event) {
            println!("{line}");
        }
    }
}

/// Prints every event as one JSON object per line, for scripting.
#[derive(Debug, Default)]
pub struct JsonLinesPresenter;

impl Presenter for JsonLinesPresenter {
    fn emit(&self, event: QuizEvent) {
        match serde_json::to_string(&event) {
            Ok(line) => println!("{line}"),
            Err(err) => tracing::warn!(error = %err, "failed to encode quiz event"),
        }
    }
}

fn render(event: &QuizEvent) -> Option<String> {
    match event {
        QuizEvent::Started { total, resumed } => Some(if *resumed {
            format!("Resuming quiz with {total} cards.")
        } else {
            format!("Starting quiz with {total} cards.")
        }),
        QuizEvent::Question { text, .. } => Some(format!("\nQ: {text}")),
        QuizEvent::Feedback { feedback } => Some(render_feedback(feedback)),
        QuizEvent::PrimaryAction { action } => Some(hint(*action).to_owned()),
        QuizEvent::Score { score } => Some(format!(
            "Mastered {}/{} cards.",
            score.mastered, score.total
        )),
        QuizEvent::Notify { message, severity } => Some(format!("{} {message}", tag(*severity))),
        QuizEvent::Completed { .. } => Some("Quiz complete.".to_owned()),
        QuizEvent::FeedbackCleared
        | QuizEvent::InputEnabled { .. }
        | QuizEvent::Ended
        | QuizEvent::ResumeIndicatorChanged => None,
    }
}

fn render_feedback(feedback: &Feedback) -> String {
    match feedback {
        Feedback::Correct { streak, threshold } => {
            format!("Correct! ({streak}/{threshold} in a row)")
        }
        Feedback::Mastered => "Correct! Card mastered.".to_owned(),
        Feedback::StillMastered => "Correct! (already mastered)".to_owned(),
        Feedback::Wrong {
            correct_answer,
            diff,
        } => format!(
            "Wrong.\n   Correct answer: {correct_answer}\n   Your answer:    {}",
            render_diff(diff)
        ),
    }
}

fn render_diff(diff: &[DiffToken]) -> String {
    diff.iter()
        .map(|token| match token {
            DiffToken::Same { word } => word.clone(),
            DiffToken::Changed {
                expected,
                submitted,
            } => format!("[{submitted} -> {expected}]"),
            DiffToken::Omitted { expected } => format!("[missing: {expected}]"),
            DiffToken::Extra { submitted } => format!("[missing] ~{submitted}~"),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn hint(action: PrimaryAction) -> &'static str {
    match action {
        PrimaryAction::Check => "Type your answer (:pause to save, :quit to stop).",
        PrimaryAction::Retry => "Press Enter to try again.",
        PrimaryAction::Advance => "Press Enter for the next question.",
    }
}

fn tag(severity: Severity) -> &'static str {
    match severity {
        Severity::Info => "[info]",
        Severity::Success => "[done]",
        Severity::Warning => "[warn]",
        Severity::Error => "[error]",
    }
}
