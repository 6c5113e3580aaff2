use thiserror::Error;

/// Errors for rejected deck operations.
///
/// Malformed stored data is never an error here: the normalizer repairs it
/// and reports the repair through a changed flag instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeckError {
    #[error("nothing to undo")]
    NothingToUndo,

    #[error("nothing to redo")]
    NothingToRedo,

    #[error("slide not found: {id}")]
    SlideNotFound { id: String },
}

pub type Result<T> = std::result::Result<T, DeckError>;
