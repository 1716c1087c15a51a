//! Keys, scales and the diatonic chord-quality tables

use crate::parser::ParseError;
use crate::types::chord::ChordType;
use crate::types::note::{spelling_of, PitchClass, Spelling};
use std::fmt;
use std::str::FromStr;

/// Semitone offsets of the major scale degrees
pub const MAJOR_SCALE: [u8; 7] = [0, 2, 4, 5, 7, 9, 11];

/// Semitone offsets of the natural minor scale degrees
pub const NATURAL_MINOR_SCALE: [u8; 7] = [0, 2, 3, 5, 7, 8, 10];

/// Triad quality on each degree of the major scale (I ii iii IV V vi vii°)
pub const MAJOR_QUALITIES: [ChordType; 7] = [
    ChordType::Major,
    ChordType::Minor,
    ChordType::Minor,
    ChordType::Major,
    ChordType::Major,
    ChordType::Minor,
    ChordType::Diminished,
];

/// Triad quality on each degree of the natural minor scale (i ii° III iv v VI VII)
pub const MINOR_QUALITIES: [ChordType; 7] = [
    ChordType::Minor,
    ChordType::Diminished,
    ChordType::Major,
    ChordType::Minor,
    ChordType::Minor,
    ChordType::Major,
    ChordType::Major,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Mode {
    #[default]
    Major,
    Minor,
}

impl Mode {
    pub fn scale(self) -> &'static [u8; 7] {
        match self {
            Mode::Major => &MAJOR_SCALE,
            Mode::Minor => &NATURAL_MINOR_SCALE,
        }
    }

    pub fn qualities(self) -> &'static [ChordType; 7] {
        match self {
            Mode::Major => &MAJOR_QUALITIES,
            Mode::Minor => &MINOR_QUALITIES,
        }
    }
}

/// A key: tonic, mode and the accidental spelling used for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Key {
    pub root: PitchClass,
    pub mode: Mode,
    pub spelling: Spelling,
}

impl Key {
    /// Create a key, picking the conventional spelling for its signature
    pub fn new(root: PitchClass, mode: Mode) -> Self {
        Key {
            root,
            mode,
            spelling: Self::conventional_spelling(root, mode),
        }
    }

    pub fn major(root: PitchClass) -> Self {
        Self::new(root, Mode::Major)
    }

    pub fn minor(root: PitchClass) -> Self {
        Self::new(root, Mode::Minor)
    }

    pub fn is_minor(&self) -> bool {
        self.mode == Mode::Minor
    }

    /// Flat keys: F Bb Eb Ab Db major, D G C F Bb Eb minor
    fn conventional_spelling(root: PitchClass, mode: Mode) -> Spelling {
        let flat = match mode {
            Mode::Major => matches!(root.index(), 1 | 3 | 5 | 8 | 10),
            Mode::Minor => matches!(root.index(), 0 | 2 | 3 | 5 | 7 | 10),
        };
        if flat {
            Spelling::Flat
        } else {
            Spelling::Sharp
        }
    }

    /// Root of a scale degree (0-6) in this key's own scale
    pub fn degree_root(&self, degree: u8) -> PitchClass {
        self.root + self.mode.scale()[degree as usize % 7] as i32
    }

    /// Diatonic triad quality of a scale degree (0-6)
    pub fn degree_quality(&self, degree: u8) -> ChordType {
        self.mode.qualities()[degree as usize % 7]
    }

    /// Name of the tonic in this key's spelling
    pub fn root_name(&self) -> &'static str {
        self.root.name(self.spelling)
    }

    /// The same key moved by `semitones`, respelled for the new signature
    pub fn transpose(&self, semitones: i32) -> Self {
        Self::new(self.root + semitones, self.mode)
    }
}

impl Default for Key {
    fn default() -> Self {
        Key::major(PitchClass::C)
    }
}

impl FromStr for Key {
    type Err = ParseError;

    /// Accepts `C`, `Am`, `F# minor`, `Eb major`, `c#-minor`, `Bbmin`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();

        let (note_part, mode) = if let Some(stripped) =
            strip_mode_suffix(trimmed, &[" minor", "-minor", "minor", "min", "m"])
        {
            (stripped, Mode::Minor)
        } else if let Some(stripped) =
            strip_mode_suffix(trimmed, &[" major", "-major", "major", "maj"])
        {
            (stripped, Mode::Major)
        } else {
            (trimmed, Mode::Major)
        };

        let root: PitchClass = note_part.trim().parse()?;
        let mut key = Key::new(root, mode);
        if let Some(spelling) = spelling_of(note_part) {
            key.spelling = spelling;
        }
        Ok(key)
    }
}

/// `s` without the first matching ASCII suffix, compared case-insensitively
fn strip_mode_suffix<'a>(s: &'a str, suffixes: &[&str]) -> Option<&'a str> {
    suffixes.iter().find_map(|suffix| {
        let split = s.len().checked_sub(suffix.len()).filter(|&split| split > 0)?;
        if !s.is_char_boundary(split) {
            return None;
        }
        let (head, tail) = s.split_at(split);
        tail.eq_ignore_ascii_case(suffix).then_some(head)
    })
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = match self.mode {
            Mode::Major => "major",
            Mode::Minor => "minor",
        };
        write!(f, "{} {}", self.root_name(), mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_parsing() {
        let c: Key = "C".parse().unwrap();
        assert_eq!(c, Key::major(PitchClass::C));

        let am: Key = "Am".parse().unwrap();
        assert_eq!(am.root.index(), 9);
        assert!(am.is_minor());

        let fs: Key = "F# minor".parse().unwrap();
        assert_eq!(fs.root.index(), 6);
        assert_eq!(fs.mode, Mode::Minor);

        let eb: Key = "Eb major".parse().unwrap();
        assert_eq!(eb.root.index(), 3);
        assert_eq!(eb.spelling, Spelling::Flat);

        let bbmin: Key = "Bbmin".parse().unwrap();
        assert_eq!(bbmin.root.index(), 10);
        assert!(bbmin.is_minor());

        assert!("X major".parse::<Key>().is_err());
    }

    #[test]
    fn test_mode_suffix_is_case_insensitive_and_char_safe() {
        let key: Key = "G MINOR".parse().unwrap();
        assert_eq!(key, Key::minor(PitchClass::new(7)));
        let key: Key = "dMaj".parse().unwrap();
        assert_eq!(key, Key::major(PitchClass::new(2)));

        // Lowercasing these changes their byte length
        assert!("İm".parse::<Key>().is_err());
        assert!("Ⱥ minor".parse::<Key>().is_err());
        assert!("é".parse::<Key>().is_err());
    }

    #[test]
    fn test_degree_roots() {
        let c = Key::major(PitchClass::C);
        assert_eq!(c.degree_root(4).index(), 7);
        assert_eq!(c.degree_root(6).index(), 11);

        let a_minor = Key::minor(PitchClass::new(9));
        assert_eq!(a_minor.degree_root(2).index(), 0); // III = C
        assert_eq!(a_minor.degree_root(6).index(), 7); // VII = G
    }

    #[test]
    fn test_degree_qualities() {
        let c = Key::major(PitchClass::C);
        assert_eq!(c.degree_quality(0), ChordType::Major);
        assert_eq!(c.degree_quality(1), ChordType::Minor);
        assert_eq!(c.degree_quality(6), ChordType::Diminished);

        let cm = Key::minor(PitchClass::C);
        assert_eq!(cm.degree_quality(0), ChordType::Minor);
        assert_eq!(cm.degree_quality(1), ChordType::Diminished);
        assert_eq!(cm.degree_quality(2), ChordType::Major);
    }

    #[test]
    fn test_conventional_spelling() {
        assert_eq!(Key::major(PitchClass::new(5)).spelling, Spelling::Flat);
        assert_eq!(Key::major(PitchClass::new(7)).spelling, Spelling::Sharp);
        assert_eq!(Key::minor(PitchClass::new(2)).spelling, Spelling::Flat);
        assert_eq!(Key::minor(PitchClass::new(4)).spelling, Spelling::Sharp);
    }

    #[test]
    fn test_key_display_and_transpose() {
        let f = Key::major(PitchClass::new(5));
        assert_eq!(f.to_string(), "F major");
        let g = f.transpose(2);
        assert_eq!(g.to_string(), "G major");
    }
}
