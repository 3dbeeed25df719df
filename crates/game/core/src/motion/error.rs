use crate::error::{ErrorSeverity, GameError};

/// Malformed motion requests.
///
/// These are input-translation bugs, never gameplay outcomes: a well-formed
/// motion that cannot land is reported as a blocked [`MotionResult`]
/// instead.
///
/// [`MotionResult`]: super::MotionResult
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MotionError {
    #[error("unknown motion {name:?}")]
    UnknownMotion { name: String },

    #[error("character search {command:?} is missing its target character")]
    MissingSearchTarget { command: String },

    #[error("invalid count prefix in {input:?}")]
    InvalidCount { input: String },
}

impl GameError for MotionError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            MotionError::UnknownMotion { .. } => "MOTION_UNKNOWN",
            MotionError::MissingSearchTarget { .. } => "MOTION_MISSING_SEARCH_TARGET",
            MotionError::InvalidCount { .. } => "MOTION_INVALID_COUNT",
        }
    }
}
