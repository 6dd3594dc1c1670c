use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Backend identifier for a flashcard.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(u64);

impl CardId {
    /// Creates a new `CardId`
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

/// Identifier for the card group that owns a quiz.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(u64);

impl GroupId {
    /// Creates a new `GroupId`
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

/// Identity of a card inside persisted quiz progress.
///
/// Stored as a JSON number for cards with an id and as a string (the question
/// text) for cards without one, so id `12` and a question `"12"` never meet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CardKey {
    Id(u64),
    Question(String),
}

impl From<CardId> for CardKey {
    fn from(id: CardId) -> Self {
        Self::Id(id.0)
    }
}

impl fmt::Debug for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CardId({})", self.0)
    }
}

impl fmt::Debug for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GroupId({})", self.0)
    }
}

// ─── Display Implementations ───────────────────────────────────────────────────

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ─── FromStr Implementations ───────────────────────────────────────────────────

/// Error type for parsing ID from string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: &'static str,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {} from string", self.kind)
    }
}

impl std::error::Error for ParseIdError {}

impl FromStr for GroupId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(GroupId::new)
            .map_err(|_| ParseIdError { kind: "GroupId" })
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_id_from_str() {
        let id: GroupId = " 12 ".parse().unwrap();
        assert_eq!(id, GroupId::new(12));
    }

    #[test]
    fn test_group_id_from_str_invalid() {
        let err = "twelve".parse::<GroupId>().unwrap_err();
        assert_eq!(err.to_string(), "failed to parse GroupId from string");
    }

    #[test]
    fn test_card_id_serializes_as_plain_number() {
        let json = serde_json::to_string(&CardId::new(42)).unwrap();
        assert_eq!(json, "42");
    }

    #[test]
    fn test_card_key_keeps_numbers_and_strings_apart() {
        let keys: Vec<CardKey> = serde_json::from_str(r#"[7, "7", "2+2?"]"#).unwrap();
        assert_eq!(keys[0], CardKey::Id(7));
        assert_eq!(keys[1], CardKey::Question("7".to_owned()));
        assert_ne!(keys[0], keys[1]);
        assert_eq!(serde_json::to_string(&keys[0]).unwrap(), "7");
        assert_eq!(serde_json::to_string(&keys[2]).unwrap(), r#""2+2?""#);
    }

    #[test]
    fn test_card_key_from_id() {
        assert_eq!(CardKey::from(CardId::new(3)), CardKey::Id(3));
    }
}
