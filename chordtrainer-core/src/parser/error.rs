use thiserror::Error;

/// Errors raised while reading notation: Roman numerals, chord symbols,
/// note names and the small value types settings are built from.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty chord token")]
    EmptyToken,

    /// The numeral (or the secondary-dominant target after `/`) is not I-VII
    #[error("unrecognized Roman numeral degree in '{0}'")]
    UnparsableDegree(String),

    #[error("unrecognized chord symbol '{0}'")]
    UnparsableSymbol(String),

    #[error("unknown note name '{0}'")]
    UnknownNote(String),

    #[error("unknown chord type '{0}'")]
    UnknownChordType(String),

    #[error("unknown inversion '{0}'")]
    UnknownInversion(String),

    #[error("invalid time signature '{0}'")]
    InvalidTimeSignature(String),

    #[error("invalid note value '{0}' (use whole, half, quarter or eighth)")]
    InvalidNoteValue(String),
}
