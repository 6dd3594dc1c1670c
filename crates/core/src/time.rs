use chrono::{DateTime, Utc};

/// Where progress timestamps come from.
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    #[default]
    System,
    Fixed(DateTime<Utc>),
}

impl Clock {
    #[must_use]
    pub fn system() -> Self {
        Self::System
    }

    #[must_use]
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self::Fixed(at)
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::System => Utc::now(),
            Clock::Fixed(at) => *at,
        }
    }
}

/// Saved-progress timestamp used across tests, in Unix milliseconds.
pub const FIXED_TEST_MILLIS: i64 = 1_700_000_000_000;

/// The instant behind `FIXED_TEST_MILLIS` (2023-11-14T22:13:20Z).
///
/// # Panics
///
/// Panics if the fixed timestamp cannot be represented.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(FIXED_TEST_MILLIS)
        .expect("fixed timestamp should be valid")
}

/// A `Clock` pinned to `fixed_now()`.
#[must_use]
pub fn fixed_clock() -> Clock {
    Clock::fixed(fixed_now())
}
