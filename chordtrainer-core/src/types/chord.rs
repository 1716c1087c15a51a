//! Chord descriptors and the interval model behind every voicing.
//!
//! A [`Chord`] is the unit the generator produces and the scheduler plays:
//! a root, a closed [`ChordType`], an [`Inversion`] and the scale degree it
//! came from (when it came from one). All pitch math for keyboard voicings
//! lives here so the parser, generator and highlighter agree on one table.

use crate::parser::ParseError;
use crate::types::note::{fold_into_keyboard, PitchClass, Spelling};
use std::fmt;
use std::str::FromStr;

/// MIDI note number of keyboard pitch 0 (C3)
pub const KEYBOARD_BASE_MIDI: u8 = 48;

/// The closed set of chord qualities the trainer voices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ChordType {
    Major,
    Minor,
    Dominant7,
    Major7,
    Minor7,
    Diminished,
    Augmented,
    Sus2,
    Sus4,
}

impl ChordType {
    pub const ALL: [ChordType; 9] = [
        ChordType::Major,
        ChordType::Minor,
        ChordType::Dominant7,
        ChordType::Major7,
        ChordType::Minor7,
        ChordType::Diminished,
        ChordType::Augmented,
        ChordType::Sus2,
        ChordType::Sus4,
    ];

    /// Canonical lowercase name, as used in settings and pattern files
    pub fn name(self) -> &'static str {
        match self {
            ChordType::Major => "major",
            ChordType::Minor => "minor",
            ChordType::Dominant7 => "dominant7",
            ChordType::Major7 => "major7",
            ChordType::Minor7 => "minor7",
            ChordType::Diminished => "diminished",
            ChordType::Augmented => "augmented",
            ChordType::Sus2 => "sus2",
            ChordType::Sus4 => "sus4",
        }
    }

    /// Suffix used in chord symbols (`C`, `Cm`, `C7`, `Cmaj7` ...)
    pub fn symbol(self) -> &'static str {
        match self {
            ChordType::Major => "",
            ChordType::Minor => "m",
            ChordType::Dominant7 => "7",
            ChordType::Major7 => "maj7",
            ChordType::Minor7 => "m7",
            ChordType::Diminished => "dim",
            ChordType::Augmented => "aug",
            ChordType::Sus2 => "sus2",
            ChordType::Sus4 => "sus4",
        }
    }

    /// Interval from the root to the chord tone that starts first inversion
    pub fn third_interval(self) -> u8 {
        match self {
            ChordType::Major | ChordType::Augmented | ChordType::Dominant7 | ChordType::Major7 => 4,
            ChordType::Minor | ChordType::Diminished | ChordType::Minor7 => 3,
            ChordType::Sus2 => 2,
            ChordType::Sus4 => 5,
        }
    }

    /// Interval from the root to the chord tone that starts second inversion
    pub fn fifth_interval(self) -> u8 {
        match self {
            ChordType::Diminished => 6,
            ChordType::Augmented => 8,
            _ => 7,
        }
    }

    pub fn is_seventh(self) -> bool {
        matches!(
            self,
            ChordType::Dominant7 | ChordType::Major7 | ChordType::Minor7
        )
    }
}

impl FromStr for ChordType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let chord_type = match s.trim().to_lowercase().as_str() {
            "major" | "maj" => ChordType::Major,
            "minor" | "min" | "m" => ChordType::Minor,
            "dominant7" | "dom7" | "7" => ChordType::Dominant7,
            "major7" | "maj7" => ChordType::Major7,
            "minor7" | "min7" | "m7" => ChordType::Minor7,
            // Half-diminished has no table of its own and collapses to diminished
            "diminished" | "dim" | "half-diminished" | "halfdiminished" => ChordType::Diminished,
            "augmented" | "aug" => ChordType::Augmented,
            "sus2" => ChordType::Sus2,
            "sus4" => ChordType::Sus4,
            other => return Err(ParseError::UnknownChordType(other.to_string())),
        };
        Ok(chord_type)
    }
}

impl fmt::Display for ChordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which chord tone sits in the bass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Inversion {
    Root,
    First,
    Second,
    /// Only produced by `/7` slash notation. There is no third-inversion
    /// table, so it voices exactly like root position.
    Third,
}

impl Inversion {
    /// Inversions a user can select for generation
    pub const SELECTABLE: [Inversion; 3] = [Inversion::Root, Inversion::First, Inversion::Second];

    pub fn name(self) -> &'static str {
        match self {
            Inversion::Root => "root",
            Inversion::First => "first",
            Inversion::Second => "second",
            Inversion::Third => "third",
        }
    }
}

impl FromStr for Inversion {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "root" | "0" => Ok(Inversion::Root),
            "first" | "1st" | "1" => Ok(Inversion::First),
            "second" | "2nd" | "2" => Ok(Inversion::Second),
            "third" | "3rd" | "3" => Ok(Inversion::Third),
            other => Err(ParseError::UnknownInversion(other.to_string())),
        }
    }
}

impl fmt::Display for Inversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Semitone offsets from the start note for a (type, inversion) pair.
///
/// Every list starts with 0. Third inversion uses the root-position row.
pub fn intervals_for(chord_type: ChordType, inversion: Inversion) -> &'static [u8] {
    use ChordType::*;
    use Inversion::*;

    match (chord_type, inversion) {
        (Major, First) => &[0, 3, 8],
        (Major, Second) => &[0, 5, 9],
        (Major, _) => &[0, 4, 7],

        (Minor, First) => &[0, 4, 9],
        (Minor, Second) => &[0, 5, 8],
        (Minor, _) => &[0, 3, 7],

        (Dominant7, First) => &[0, 3, 6, 8],
        (Dominant7, Second) => &[0, 3, 5, 9],
        (Dominant7, _) => &[0, 4, 7, 10],

        (Major7, First) => &[0, 3, 7, 8],
        (Major7, Second) => &[0, 4, 5, 9],
        (Major7, _) => &[0, 4, 7, 11],

        (Minor7, First) => &[0, 4, 7, 9],
        (Minor7, Second) => &[0, 3, 5, 8],
        (Minor7, _) => &[0, 3, 7, 10],

        (Diminished, First) => &[0, 3, 9],
        (Diminished, Second) => &[0, 6, 9],
        (Diminished, _) => &[0, 3, 6],

        // Augmented is symmetric: every inversion stacks major thirds
        (Augmented, _) => &[0, 4, 8],

        (Sus2, First) => &[0, 5, 10],
        (Sus2, Second) => &[0, 5, 7],
        (Sus2, _) => &[0, 2, 7],

        (Sus4, First) => &[0, 2, 7],
        (Sus4, Second) => &[0, 5, 10],
        (Sus4, _) => &[0, 5, 7],
    }
}

/// Interval from the root to the lowest chord tone of an inversion
fn bass_offset(chord_type: ChordType, inversion: Inversion) -> u8 {
    match inversion {
        Inversion::First => chord_type.third_interval(),
        Inversion::Second => chord_type.fifth_interval(),
        Inversion::Root | Inversion::Third => 0,
    }
}

/// Keyboard pitch of the lowest note of a voicing in the given octave
pub fn start_note(root: PitchClass, chord_type: ChordType, inversion: Inversion, octave: i32) -> i32 {
    let pitch_class = root + bass_offset(chord_type, inversion) as i32;
    pitch_class.index() as i32 + octave * 12
}

/// Pitch class that sounds in the bass for an inversion (slash-chord bass)
pub fn bass_note(root: PitchClass, chord_type: ChordType, inversion: Inversion) -> PitchClass {
    root + bass_offset(chord_type, inversion) as i32
}

/// Which hand a voicing or fingering is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hand {
    Left,
    Right,
}

impl Hand {
    /// Keyboard octave the hand plays in
    pub fn octave(self) -> i32 {
        match self {
            Hand::Left => 0,
            Hand::Right => 1,
        }
    }
}

/// A chord as produced for one progression slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Chord {
    pub root: PitchClass,
    pub chord_type: ChordType,
    pub inversion: Inversion,
    /// Scale degree (0-6) the chord was built on; `None` for secondary
    /// dominants and chords written as symbols
    pub degree_index: Option<u8>,
    /// Informational only, no voicing uses it yet
    pub has_add9: bool,
    pub spelling: Spelling,
}

impl Chord {
    /// Create a root-position chord with no degree information
    pub fn new(root: PitchClass, chord_type: ChordType) -> Self {
        Chord {
            root,
            chord_type,
            inversion: Inversion::Root,
            degree_index: None,
            has_add9: false,
            spelling: Spelling::Sharp,
        }
    }

    pub fn with_inversion(mut self, inversion: Inversion) -> Self {
        self.inversion = inversion;
        self
    }

    pub fn with_degree(mut self, degree: u8) -> Self {
        self.degree_index = Some(degree);
        self
    }

    pub fn with_spelling(mut self, spelling: Spelling) -> Self {
        self.spelling = spelling;
        self
    }

    pub fn root_name(&self) -> &'static str {
        self.root.name(self.spelling)
    }

    pub fn bass(&self) -> PitchClass {
        bass_note(self.root, self.chord_type, self.inversion)
    }

    pub fn bass_name(&self) -> &'static str {
        self.bass().name(self.spelling)
    }

    /// Chord symbol, e.g. `Am7`, or `C/E` when slash notation is requested
    pub fn name(&self, slash: bool) -> String {
        let mut name = format!("{}{}", self.root_name(), self.chord_type.symbol());
        if self.has_add9 {
            name.push_str("add9");
        }
        if slash && self.inversion != Inversion::Root && self.bass() != self.root {
            name.push('/');
            name.push_str(self.bass_name());
        }
        name
    }

    /// Pitch class the listener hears on top of the right-hand voicing,
    /// approximated as: root position → fifth, first → root, second → third
    pub fn top_note(&self) -> PitchClass {
        match self.inversion {
            Inversion::Root | Inversion::Third => {
                self.root + self.chord_type.fifth_interval() as i32
            }
            Inversion::First => self.root,
            Inversion::Second => self.root + self.chord_type.third_interval() as i32,
        }
    }

    /// Keyboard pitches (0-35) for one hand.
    ///
    /// The left hand plays only the bass note; the right hand plays the
    /// whole inversion starting an octave higher.
    pub fn keyboard_pitches(&self, hand: Hand) -> Vec<i32> {
        let start = start_note(self.root, self.chord_type, self.inversion, hand.octave());
        match hand {
            Hand::Left => vec![fold_into_keyboard(start)],
            Hand::Right => intervals_for(self.chord_type, self.inversion)
                .iter()
                .map(|&interval| fold_into_keyboard(start + interval as i32))
                .collect(),
        }
    }

    /// MIDI notes for both hands, bass first
    pub fn midi_notes(&self) -> Vec<u8> {
        self.keyboard_pitches(Hand::Left)
            .into_iter()
            .chain(self.keyboard_pitches(Hand::Right))
            .map(|pitch| KEYBOARD_BASE_MIDI + pitch as u8)
            .collect()
    }

    /// Standard fingering numbers, lowest key first
    pub fn fingering(&self, hand: Hand) -> Vec<u8> {
        let voices = intervals_for(self.chord_type, self.inversion).len();
        match (hand, voices) {
            (Hand::Right, 4) => vec![1, 2, 3, 5],
            (Hand::Right, _) => vec![1, 3, 5],
            (Hand::Left, 4) => vec![5, 3, 2, 1],
            (Hand::Left, _) => vec![5, 3, 1],
        }
    }

    /// Move the chord by `semitones`, keeping type and inversion
    pub fn transpose(&self, semitones: i32, spelling: Spelling) -> Self {
        Chord {
            root: self.root + semitones,
            spelling,
            ..*self
        }
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::note::note_index;

    const ALL_INVERSIONS: [Inversion; 4] = [
        Inversion::Root,
        Inversion::First,
        Inversion::Second,
        Inversion::Third,
    ];

    #[test]
    fn test_intervals_start_at_zero() {
        for chord_type in ChordType::ALL {
            for inversion in ALL_INVERSIONS {
                let intervals = intervals_for(chord_type, inversion);
                assert_eq!(intervals[0], 0, "{:?} {:?}", chord_type, inversion);
                assert!(intervals.windows(2).all(|w| w[0] < w[1]));
            }
        }
    }

    #[test]
    fn test_inversions_contain_same_pitch_classes() {
        let root = note_index("D");
        for chord_type in ChordType::ALL {
            let mut expected: Vec<u8> = intervals_for(chord_type, Inversion::Root)
                .iter()
                .map(|&i| (root + i as i32).index())
                .collect();
            expected.sort();

            for inversion in Inversion::SELECTABLE {
                let start = start_note(root, chord_type, inversion, 0);
                let mut actual: Vec<u8> = intervals_for(chord_type, inversion)
                    .iter()
                    .map(|&i| PitchClass::new(start + i as i32).index())
                    .collect();
                actual.sort();
                assert_eq!(actual, expected, "{:?} {:?}", chord_type, inversion);
            }
        }
    }

    #[test]
    fn test_third_inversion_falls_back_to_root_position() {
        for chord_type in ChordType::ALL {
            assert_eq!(
                intervals_for(chord_type, Inversion::Third),
                intervals_for(chord_type, Inversion::Root)
            );
        }
        let c = note_index("C");
        assert_eq!(
            start_note(c, ChordType::Dominant7, Inversion::Third, 1),
            start_note(c, ChordType::Dominant7, Inversion::Root, 1)
        );
    }

    #[test]
    fn test_start_note_rules() {
        let c = note_index("C");
        assert_eq!(start_note(c, ChordType::Major, Inversion::Root, 1), 12);
        assert_eq!(start_note(c, ChordType::Major, Inversion::First, 1), 16);
        assert_eq!(start_note(c, ChordType::Minor, Inversion::First, 0), 3);
        assert_eq!(start_note(c, ChordType::Sus2, Inversion::First, 0), 2);
        assert_eq!(start_note(c, ChordType::Sus4, Inversion::First, 0), 5);
        assert_eq!(start_note(c, ChordType::Diminished, Inversion::Second, 0), 6);
        assert_eq!(start_note(c, ChordType::Augmented, Inversion::Second, 0), 8);
        assert_eq!(start_note(c, ChordType::Major7, Inversion::Second, 2), 31);

        // Wraps within the octave before adding the octave offset
        let a = note_index("A");
        assert_eq!(start_note(a, ChordType::Major, Inversion::First, 0), 1);
    }

    #[test]
    fn test_bass_note_matches_start_rule() {
        for root_index in 0..12 {
            let root = PitchClass::new(root_index);
            for chord_type in ChordType::ALL {
                for inversion in ALL_INVERSIONS {
                    let bass = bass_note(root, chord_type, inversion);
                    let start = start_note(root, chord_type, inversion, 0);
                    assert_eq!(bass, PitchClass::new(start));
                }
            }
        }
    }

    #[test]
    fn test_chord_names() {
        let c_first = Chord::new(note_index("C"), ChordType::Major).with_inversion(Inversion::First);
        assert_eq!(c_first.name(false), "C");
        assert_eq!(c_first.name(true), "C/E");

        let bb7 = Chord::new(note_index("Bb"), ChordType::Dominant7).with_spelling(Spelling::Flat);
        assert_eq!(bb7.to_string(), "Bb7");

        let am7 = Chord::new(note_index("A"), ChordType::Minor7).with_inversion(Inversion::Second);
        assert_eq!(am7.name(true), "Am7/E");

        // Augmented second inversion still names its real bass
        let caug = Chord::new(note_index("C"), ChordType::Augmented).with_inversion(Inversion::Second);
        assert_eq!(caug.name(true), "Caug/G#");
    }

    #[test]
    fn test_keyboard_pitches_and_midi() {
        let g7 = Chord::new(note_index("G"), ChordType::Dominant7);
        assert_eq!(g7.keyboard_pitches(Hand::Left), vec![7]);
        assert_eq!(g7.keyboard_pitches(Hand::Right), vec![19, 23, 26, 29]);
        assert_eq!(g7.midi_notes(), vec![55, 67, 71, 74, 77]);

        // B major second inversion starts on F# (octave 1 = 18) and stays in range
        let b = Chord::new(note_index("B"), ChordType::Major).with_inversion(Inversion::Second);
        for pitch in b.keyboard_pitches(Hand::Right) {
            assert!((0..36).contains(&pitch));
        }
    }

    #[test]
    fn test_top_note_approximation() {
        let c = note_index("C");
        let root = Chord::new(c, ChordType::Major);
        assert_eq!(root.top_note().index(), 7);
        assert_eq!(root.with_inversion(Inversion::First).top_note().index(), 0);
        assert_eq!(root.with_inversion(Inversion::Second).top_note().index(), 4);
    }

    #[test]
    fn test_fingering() {
        let c = Chord::new(note_index("C"), ChordType::Major);
        assert_eq!(c.fingering(Hand::Right), vec![1, 3, 5]);
        assert_eq!(c.fingering(Hand::Left), vec![5, 3, 1]);
        let c7 = Chord::new(note_index("C"), ChordType::Dominant7);
        assert_eq!(c7.fingering(Hand::Right), vec![1, 2, 3, 5]);
    }

    #[test]
    fn test_chord_type_parsing() {
        assert_eq!("dom7".parse::<ChordType>().unwrap(), ChordType::Dominant7);
        assert_eq!("half-diminished".parse::<ChordType>().unwrap(), ChordType::Diminished);
        assert!("power".parse::<ChordType>().is_err());
        assert_eq!("2nd".parse::<Inversion>().unwrap(), Inversion::Second);
    }

    #[test]
    fn test_transpose_keeps_shape() {
        let d = Chord::new(note_index("D"), ChordType::Minor7).with_inversion(Inversion::First);
        let e = d.transpose(2, Spelling::Sharp);
        assert_eq!(e.root.index(), 4);
        assert_eq!(e.chord_type, ChordType::Minor7);
        assert_eq!(e.inversion, Inversion::First);
    }
}
