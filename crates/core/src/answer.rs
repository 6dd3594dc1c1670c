//! Answer comparison: normalization and a word-level diff for feedback.

use serde::Serialize;

/// Trim, lowercase and collapse every whitespace run to a single space.
#[must_use]
pub fn normalize_answer(raw: &str) -> String {
    raw.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Exact comparison after normalizing both sides. No fuzzy matching.
#[must_use]
pub fn answers_match(submitted: &str, expected: &str) -> bool {
    normalize_answer(submitted) == normalize_answer(expected)
}

/// One position of a word-by-word comparison between a submitted and the correct answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiffToken {
    /// Words agree (case-insensitively); carries the correct word.
    Same { word: String },
    /// Both sides have a word here but they differ.
    Changed { expected: String, submitted: String },
    /// The submission ran out of words; the correct word is highlighted alone.
    Omitted { expected: String },
    /// The correct answer ran out of words; shown as missing plus the struck word.
    Extra { submitted: String },
}

impl DiffToken {
    #[must_use]
    pub fn is_same(&self) -> bool {
        matches!(self, DiffToken::Same { .. })
    }
}

/// Position-by-position comparison up to the longer word sequence.
#[must_use]
pub fn word_diff(submitted: &str, expected: &str) -> Vec<DiffToken> {
    let submitted: Vec<&str> = submitted.split_whitespace().collect();
    let expected: Vec<&str> = expected.split_whitespace().collect();
    let len = submitted.len().max(expected.len());

    (0..len)
        .filter_map(|i| match (expected.get(i), submitted.get(i)) {
            (Some(exp), Some(sub)) if exp.to_lowercase() == sub.to_lowercase() => {
                Some(DiffToken::Same {
                    word: (*exp).to_owned(),
                })
            }
            (Some(exp), Some(sub)) => Some(DiffToken::Changed {
                expected: (*exp).to_owned(),
                submitted: (*sub).to_owned(),
            }),
            (Some(exp), None) => Some(DiffToken::Omitted {
                expected: (*exp).to_owned(),
            }),
            (None, Some(sub)) => Some(DiffToken::Extra {
                submitted: (*sub).to_owned(),
            }),
            (None, None) => None,
        })
        .collect()
}
