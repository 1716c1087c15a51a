use crate::parser::ParseError;
use thiserror::Error;

/// A settings combination that cannot produce or play a progression.
/// Raised before any session state changes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("select at least one chord type")]
    NoChordTypes,

    #[error("select at least one inversion")]
    NoInversions,

    #[error("unknown progression style '{0}'")]
    UnknownStyle(String),

    #[error("tempo must be between {min} and {max} BPM, got {got}")]
    InvalidTempo { got: u32, min: u32, max: u32 },

    #[error("progression length must be between 1 and {max}, got {got}")]
    InvalidLength { got: usize, max: usize },

    #[error("there is no progression to play")]
    EmptyProgression,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrainerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A pattern token failed to parse; `position` is its slot in the
    /// generated progression
    #[error("chord {position} ('{token}'): {source}")]
    Parse {
        position: usize,
        token: String,
        #[source]
        source: ParseError,
    },
}

pub type Result<T, E = TrainerError> = std::result::Result<T, E>;
