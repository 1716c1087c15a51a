//! Roman-numeral notation (`V7/V`, `bVII`, `ii°`, `I/3`, `IVadd9`)
//!
//! Parsing is split in two stages. [`RomanNumeral::parse`] reads the token
//! structurally and fails on anything it cannot place on a scale degree.
//! [`RomanNumeral::resolve`] turns the parsed numeral into a [`Chord`] for a
//! key, applying the caller's chord-type and inversion selection.

use crate::parser::ParseError;
use crate::random::choose_from;
use crate::types::chord::{Chord, ChordType, Inversion};
use crate::types::key::Key;
use crate::types::note::Spelling;
use rand::Rng;
use std::collections::BTreeSet;

/// Numerals ordered so longer spellings are tried before their prefixes
const NUMERALS: [(&str, u8); 14] = [
    ("VII", 6),
    ("vii", 6),
    ("III", 2),
    ("iii", 2),
    ("VI", 5),
    ("vi", 5),
    ("IV", 3),
    ("iv", 3),
    ("II", 1),
    ("ii", 1),
    ("V", 4),
    ("v", 4),
    ("I", 0),
    ("i", 0),
];

/// A structurally parsed Roman numeral, not yet tied to a key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RomanNumeral {
    /// Scale degree 0-6
    pub degree: u8,
    /// Leading `b` lowers the root a semitone
    pub flat: bool,
    /// Quality implied by the numeral's case and suffix
    pub quality: ChordType,
    /// Inversion requested with `/3`, `/5` or `/7`
    pub inversion: Option<Inversion>,
    /// Degree targeted by a secondary dominant (`V7/V` → 4)
    pub secondary_target: Option<u8>,
    /// The secondary target is lowered (`V/bVII`)
    pub secondary_flat: bool,
    pub has_add9: bool,
}

/// Caller-supplied policy for turning a numeral into a chord
#[derive(Debug, Clone, Copy)]
pub struct ResolveOptions<'a> {
    /// Whether the style lets inversions and qualities vary (`varychord`)
    pub vary: bool,
    pub selected_types: &'a BTreeSet<ChordType>,
    pub selected_inversions: &'a BTreeSet<Inversion>,
}

impl RomanNumeral {
    /// Parse a notation token
    pub fn parse(token: &str) -> Result<Self, ParseError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(ParseError::EmptyToken);
        }

        let (main, slash) = match token.split_once('/') {
            Some((main, right)) => (main, Some(right.trim())),
            None => (token, None),
        };

        let mut inversion = None;
        let mut secondary_target = None;
        let mut secondary_flat = false;
        match slash {
            Some("3") => inversion = Some(Inversion::First),
            Some("5") => inversion = Some(Inversion::Second),
            Some("7") => inversion = Some(Inversion::Third),
            Some(target) => {
                let (flat, target_body) = strip_flat(target);
                let (degree, _, _) = match_numeral(target_body)
                    .ok_or_else(|| ParseError::UnparsableDegree(token.to_string()))?;
                secondary_target = Some(degree);
                secondary_flat = flat;
            }
            None => {}
        }

        let (flat, body) = strip_flat(main);
        let (degree, lowercase, suffix) =
            match_numeral(body).ok_or_else(|| ParseError::UnparsableDegree(token.to_string()))?;

        let has_add9 = suffix.contains("add9");
        let suffix = suffix.replace("add9", "");

        Ok(RomanNumeral {
            degree,
            flat,
            quality: classify_suffix(&suffix, lowercase),
            inversion,
            secondary_target,
            secondary_flat,
            has_add9,
        })
    }

    /// Build the chord this numeral names in `key`.
    ///
    /// Secondary dominants are rooted a fifth above their target's scale
    /// root and carry no degree index. Without variation the parsed quality
    /// is kept verbatim; with variation an unselected quality is replaced by
    /// a random selected one, and the inversion is drawn from the selection
    /// unless the token spelled one out.
    pub fn resolve<R: Rng + ?Sized>(
        &self,
        key: &Key,
        options: &ResolveOptions<'_>,
        rng: &mut R,
    ) -> Chord {
        let (root, degree_index, mut quality) = match self.secondary_target {
            Some(target) => {
                let lowered = if self.secondary_flat { 1 } else { 0 };
                let target_root = key.degree_root(target) - lowered;
                let quality = if self.quality.is_seventh() {
                    self.quality
                } else {
                    ChordType::Dominant7
                };
                (target_root + 7, None, quality)
            }
            None => {
                let lowered = if self.flat { 1 } else { 0 };
                (key.degree_root(self.degree) - lowered, Some(self.degree), self.quality)
            }
        };

        let inversion = match self.inversion {
            Some(explicit) => explicit,
            None if options.vary => {
                choose_from(options.selected_inversions, rng).unwrap_or(Inversion::Root)
            }
            None => Inversion::Root,
        };

        if options.vary && !options.selected_types.contains(&quality) {
            if let Some(substitute) = choose_from(options.selected_types, rng) {
                quality = substitute;
            }
        }

        let spelling = if self.flat {
            Spelling::Flat
        } else {
            key.spelling
        };

        Chord {
            root,
            chord_type: quality,
            inversion,
            degree_index,
            has_add9: self.has_add9,
            spelling,
        }
    }
}

fn strip_flat(s: &str) -> (bool, &str) {
    if let Some(rest) = s.strip_prefix('b') {
        (true, rest)
    } else if let Some(rest) = s.strip_prefix('♭') {
        (true, rest)
    } else {
        (false, s)
    }
}

/// Longest numeral prefix: (degree, is_lowercase, remaining suffix)
fn match_numeral(body: &str) -> Option<(u8, bool, &str)> {
    NUMERALS.iter().find_map(|&(numeral, degree)| {
        body.strip_prefix(numeral).map(|suffix| {
            let lowercase = numeral.chars().all(|c| c.is_ascii_lowercase());
            (degree, lowercase, suffix)
        })
    })
}

/// Quality markers in priority order; the numeral's case decides plain triads
fn classify_suffix(suffix: &str, lowercase: bool) -> ChordType {
    if suffix.contains('°') || suffix.contains("dim") {
        ChordType::Diminished
    } else if suffix.contains('ø') {
        // Half-diminished is voiced as a diminished triad
        ChordType::Diminished
    } else if suffix.contains('+') || suffix.contains("aug") {
        ChordType::Augmented
    } else if suffix.contains("sus2") {
        ChordType::Sus2
    } else if suffix.contains("sus4") {
        ChordType::Sus4
    } else if suffix.contains("maj7") || suffix.contains("M7") {
        ChordType::Major7
    } else if (lowercase && suffix.contains('7')) || suffix.contains("m7") {
        ChordType::Minor7
    } else if suffix.contains('7') {
        ChordType::Dominant7
    } else if lowercase {
        ChordType::Minor
    } else {
        ChordType::Major
    }
}
