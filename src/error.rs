//! Error types for the search crate

use thiserror::Error;

/// Structural failures. Running out of states to explore is not one of these;
/// see [`crate::solver::SearchOutcome::Exhausted`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    #[error("invalid configuration: {message}")]
    Config { message: String },

    #[error("illegal move {mv}: {reason}")]
    IllegalMove { mv: String, reason: String },

    #[error("invariant violated: {message}")]
    InvariantViolation { message: String },

    #[error("search reached a finished position without checking for it: {context}")]
    PrecedingTerminalCheckMissing { context: String },

    #[error("no move to undo")]
    NothingToUndo,
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
        }
    }

    pub(crate) fn illegal_move(mv: impl ToString, reason: impl Into<String>) -> Self {
        Error::IllegalMove {
            mv: mv.to_string(),
            reason: reason.into(),
        }
    }
}
