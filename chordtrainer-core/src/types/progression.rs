use crate::types::chord::Chord;
use crate::types::note::Spelling;
use std::fmt;
use std::ops::Index;

/// An ordered chord progression; insertion order is playback order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Progression {
    chords: Vec<Chord>,
}

impl Progression {
    /// Create a new empty progression
    pub fn new() -> Self {
        Progression { chords: Vec::new() }
    }

    /// Create a progression from a vector of chords
    pub fn from_chords(chords: Vec<Chord>) -> Self {
        Progression { chords }
    }

    /// Add a chord to the end of the progression
    pub fn push(&mut self, chord: Chord) {
        self.chords.push(chord);
    }

    pub fn len(&self) -> usize {
        self.chords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chords.is_empty()
    }

    pub fn chords(&self) -> &[Chord] {
        &self.chords
    }

    pub fn get(&self, index: usize) -> Option<&Chord> {
        self.chords.get(index)
    }

    pub fn last(&self) -> Option<&Chord> {
        self.chords.last()
    }

    /// Transpose every chord, respelling for the destination key
    pub fn transpose(&self, semitones: i32, spelling: Spelling) -> Self {
        Progression {
            chords: self
                .chords
                .iter()
                .map(|chord| chord.transpose(semitones, spelling))
                .collect(),
        }
    }

    /// Chord names in order, for pills and listings
    pub fn names(&self, slash: bool) -> Vec<String> {
        self.chords.iter().map(|chord| chord.name(slash)).collect()
    }
}

impl Index<usize> for Progression {
    type Output = Chord;

    fn index(&self, index: usize) -> &Self::Output {
        &self.chords[index]
    }
}

impl From<Vec<Chord>> for Progression {
    fn from(chords: Vec<Chord>) -> Self {
        Progression::from_chords(chords)
    }
}

impl<'a> IntoIterator for &'a Progression {
    type Item = &'a Chord;
    type IntoIter = std::slice::Iter<'a, Chord>;

    fn into_iter(self) -> Self::IntoIter {
        self.chords.iter()
    }
}

impl fmt::Display for Progression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.names(false).join(" - "))
    }
}
