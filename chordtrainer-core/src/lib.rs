//! # Chordtrainer Core
//!
//! Audio- and terminal-free core of the chord-progression trainer: the
//! note/interval model, Roman-numeral and chord-symbol parsing, the
//! progression generator and the playback scheduler.
//!
//! ## Features
//!
//! - **serde**: Serialization derives and the JSON pattern-file format
//!
//! ## Example
//!
//! ```ignore
//! use chordtrainer_core::scheduler::{PracticeScheduler, Silent};
//! use chordtrainer_core::types::TrainerSettings;
//!
//! let mut scheduler = PracticeScheduler::new(Silent, my_highlighter, TrainerSettings::default());
//! scheduler.start()?;
//! scheduler.advance_by(500);
//! ```

pub mod error;
pub mod generator;
pub mod parser;
pub mod random;
pub mod scheduler;
pub mod types;

pub use error::{ConfigError, TrainerError};
pub use generator::{generate, GeneratorRequest};
pub use parser::{parse_chord_symbol, ParseError, RomanNumeral};
pub use scheduler::{BeatIndicator, Highlighter, Phase, PracticeScheduler, ToneGenerator};
pub use types::{Chord, ChordType, Inversion, Key, Progression, StyleLibrary, TrainerSettings};
