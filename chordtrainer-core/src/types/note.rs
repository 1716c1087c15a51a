//! Pitch classes, note names and the three-octave keyboard

use crate::parser::ParseError;
use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

/// Number of semitones covered by the on-screen keyboard (three octaves)
pub const KEYBOARD_SPAN: i32 = 36;

/// Sharp spellings, indexed by pitch class
const SHARP_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Flat spellings, indexed by pitch class
const FLAT_NAMES: [&str; 12] = [
    "C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B",
];

/// Which accidental to use when naming a black key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Spelling {
    #[default]
    Sharp,
    Flat,
}

/// A chromatic pitch class (0-11)
/// 0=C, 1=C#/Db, 2=D, 3=D#/Eb, 4=E, 5=F, 6=F#/Gb, 7=G, 8=G#/Ab, 9=A, 10=A#/Bb, 11=B
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PitchClass(u8);

impl PitchClass {
    pub const C: PitchClass = PitchClass(0);

    /// Build a pitch class from any integer, wrapping into 0-11
    pub fn new(value: i32) -> Self {
        PitchClass(value.rem_euclid(12) as u8)
    }

    /// The chromatic index (0-11)
    pub fn index(self) -> u8 {
        self.0
    }

    /// Transpose by a signed number of semitones, wrapping around the octave
    pub fn transpose(self, semitones: i32) -> Self {
        Self::new(self.0 as i32 + semitones)
    }

    /// Upward interval from `self` to `other` (0-11)
    pub fn interval_to(self, other: PitchClass) -> u8 {
        (other.0 as i32 - self.0 as i32).rem_euclid(12) as u8
    }

    /// Shortest distance around the pitch circle (0-6)
    pub fn circular_distance(self, other: PitchClass) -> u8 {
        let up = self.interval_to(other);
        up.min(12 - up)
    }

    /// Whether this pitch class is a white key
    pub fn is_natural(self) -> bool {
        matches!(self.0, 0 | 2 | 4 | 5 | 7 | 9 | 11)
    }

    /// Display name using the given accidental preference
    pub fn name(self, spelling: Spelling) -> &'static str {
        match spelling {
            Spelling::Sharp => SHARP_NAMES[self.0 as usize],
            Spelling::Flat => FLAT_NAMES[self.0 as usize],
        }
    }

    /// Strict note-name lookup. Accepts `#`, `♯`, `b`, `♭` and the legacy `s`
    /// suffix, any number of them, so `E#`, `Cb` and `Bbb` resolve too.
    pub fn parse_name(name: &str) -> Option<PitchClass> {
        let trimmed = name.trim();
        let mut chars = trimmed.chars();
        let letter = chars.next()?.to_ascii_uppercase();

        let natural = match letter {
            'C' => 0,
            'D' => 2,
            'E' => 4,
            'F' => 5,
            'G' => 7,
            'A' => 9,
            'B' => 11,
            _ => return None,
        };

        let mut offset = 0i32;
        for c in chars {
            match c {
                '#' | '♯' | 's' | 'S' => offset += 1,
                'b' | '♭' => offset -= 1,
                _ => return None,
            }
        }

        Some(Self::new(natural + offset))
    }
}

/// Tolerant note-name lookup used by display code and settings.
///
/// Unknown names resolve to C and emit a warning instead of failing.
pub fn note_index(name: &str) -> PitchClass {
    match PitchClass::parse_name(name) {
        Some(pc) => pc,
        None => {
            tracing::warn!(name, "unknown note name, defaulting to C");
            PitchClass::C
        }
    }
}

/// Preferred spelling implied by how a note was written (`Eb` → flat)
pub fn spelling_of(name: &str) -> Option<Spelling> {
    let rest: String = name.trim().chars().skip(1).collect();
    if rest.contains('b') || rest.contains('♭') {
        Some(Spelling::Flat)
    } else if rest.contains('#') || rest.contains('♯') {
        Some(Spelling::Sharp)
    } else {
        None
    }
}

/// Fold a keyboard pitch down by octaves until it fits the keyboard window
pub fn fold_into_keyboard(pitch: i32) -> i32 {
    let mut folded = pitch;
    while folded >= KEYBOARD_SPAN {
        folded -= 12;
    }
    folded
}

impl FromStr for PitchClass {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_name(s).ok_or_else(|| ParseError::UnknownNote(s.trim().to_string()))
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name(Spelling::Sharp))
    }
}

impl Add<i32> for PitchClass {
    type Output = PitchClass;

    fn add(self, semitones: i32) -> Self::Output {
        self.transpose(semitones)
    }
}

impl Sub<i32> for PitchClass {
    type Output = PitchClass;

    fn sub(self, semitones: i32) -> Self::Output {
        self.transpose(-semitones)
    }
}

// Upward interval between two pitch classes
impl Sub<PitchClass> for PitchClass {
    type Output = u8;

    fn sub(self, other: PitchClass) -> Self::Output {
        other.interval_to(self)
    }
}
