//! State construction errors.

use crate::error::{ErrorSeverity, GameError};
use crate::grid::Position;

/// Errors raised while building or re-seeding a [`GameState`].
///
/// [`GameState`]: super::GameState
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StateError {
    /// The level has no rows at all.
    #[error("level grid is empty")]
    EmptyGrid,

    /// Start position is not a cell of the grid.
    #[error("start position {position} is outside the grid")]
    StartOutOfBounds {
        /// The rejected position.
        position: Position,
    },

    /// Start position lies on a row with no visible character.
    #[error("start position {position} is on a blank row")]
    StartOnBlankRow {
        /// The rejected position.
        position: Position,
    },
}

impl GameError for StateError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyGrid => "STATE_EMPTY_GRID",
            Self::StartOutOfBounds { .. } => "STATE_START_OUT_OF_BOUNDS",
            Self::StartOnBlankRow { .. } => "STATE_START_ON_BLANK_ROW",
        }
    }
}
