//! Value types shared by the generator and the scheduler

pub mod chord;
pub mod key;
pub mod note;
pub mod progression;
pub mod settings;
pub mod song;
pub mod style;
pub mod time;
pub mod voice_leading;

pub use chord::{Chord, ChordType, Hand, Inversion};
pub use key::{Key, Mode};
pub use note::{note_index, PitchClass, Spelling};
pub use progression::Progression;
pub use settings::TrainerSettings;
pub use song::{SongBook, SongChart};
pub use style::{StyleLibrary, StylePattern, VaryChord, RANDOM_STYLE};
pub use time::{ChordSpan, NoteValue, TimeSignature};
