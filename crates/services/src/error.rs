//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::RestoreError;
use storage::repository::StorageError;

use crate::quiz::PrimaryAction;

/// Errors emitted by `QuizEngine`.
///
/// Every variant ends only the operation that produced it; none of them
/// leave the engine unusable.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizError {
    #[error("this group has no cards to quiz")]
    EmptyCardSet,
    #[error("no quiz is in progress")]
    NotActive,
    #[error("no question is being shown")]
    NoCurrentQuestion,
    #[error("cannot {requested} right now")]
    ActionUnavailable {
        requested: PrimaryAction,
        current: Option<PrimaryAction>,
    },
    #[error("no group is selected")]
    NoGroupSelected,
    #[error("no saved quiz progress was found")]
    NoSavedProgress,
    #[error("saved quiz progress was unreadable and has been discarded: {0}")]
    CorruptProgress(String),
    #[error("there is no quiz state to resume")]
    NothingToResume,
    #[error(transparent)]
    Restore(#[from] RestoreError),
    #[error("storage is full; free some space and try pausing again")]
    StorageFull,
    #[error("failed to encode quiz progress: {0}")]
    Encode(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
