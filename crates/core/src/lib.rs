#![forbid(unsafe_code)]

pub mod answer;
pub mod model;
pub mod time;

pub use time::Clock;

/// Fixed key under which paused quiz progress is stored.
pub const PROGRESS_KEY: &str = "quizProgress";
