//! Chord symbols as written in lead sheets (`C`, `Am7`, `F#m7/C#`, `Bbsus4`)
//!
//! Song charts are stored as symbols rather than Roman numerals. The quality
//! suffixes map onto the same closed [`ChordType`] set the generator uses; a
//! slash bass that matches the chord's third or fifth selects the
//! corresponding inversion.

use crate::parser::ParseError;
use crate::types::chord::{bass_note, Chord, ChordType, Inversion};
use crate::types::note::{spelling_of, PitchClass};

/// Quality suffixes, longest first so `m7b5` wins over `m7` and `m`
const SUFFIXES: [(&str, ChordType); 22] = [
    ("m7b5", ChordType::Diminished),
    ("min7", ChordType::Minor7),
    ("maj7", ChordType::Major7),
    ("sus2", ChordType::Sus2),
    ("sus4", ChordType::Sus4),
    ("dim7", ChordType::Diminished),
    ("sus", ChordType::Sus4),
    ("dim", ChordType::Diminished),
    ("aug", ChordType::Augmented),
    ("min", ChordType::Minor),
    ("maj", ChordType::Major),
    ("m7", ChordType::Minor7),
    ("M7", ChordType::Major7),
    ("-7", ChordType::Minor7),
    ("°7", ChordType::Diminished),
    ("ø7", ChordType::Diminished),
    ("ø", ChordType::Diminished),
    ("°", ChordType::Diminished),
    ("+", ChordType::Augmented),
    ("m", ChordType::Minor),
    ("-", ChordType::Minor),
    ("7", ChordType::Dominant7),
];

/// Parse a chord symbol into a root-position (or slash-inverted) chord
pub fn parse_chord_symbol(symbol: &str) -> Result<Chord, ParseError> {
    let symbol = symbol.trim();
    if symbol.is_empty() {
        return Err(ParseError::EmptyToken);
    }
    let unparsable = || ParseError::UnparsableSymbol(symbol.to_string());

    let (main, bass) = match symbol.split_once('/') {
        Some((main, bass)) => (main, Some(bass)),
        None => (symbol, None),
    };

    let root_len = root_length(main);
    if root_len == 0 {
        return Err(unparsable());
    }
    let (root_text, mut suffix) = main.split_at(root_len);
    let root = PitchClass::parse_name(root_text).ok_or_else(unparsable)?;

    let has_add9 = suffix.ends_with("add9");
    if has_add9 {
        suffix = &suffix[..suffix.len() - "add9".len()];
    }

    let chord_type = if suffix.is_empty() {
        ChordType::Major
    } else {
        SUFFIXES
            .iter()
            .find(|(text, _)| *text == suffix)
            .map(|&(_, chord_type)| chord_type)
            .ok_or_else(unparsable)?
    };

    let inversion = match bass {
        Some(bass_text) => {
            let bass = PitchClass::parse_name(bass_text).ok_or_else(unparsable)?;
            inversion_for_bass(root, chord_type, bass)
        }
        None => Inversion::Root,
    };

    let mut chord = Chord::new(root, chord_type).with_inversion(inversion);
    chord.has_add9 = has_add9;
    if let Some(spelling) = spelling_of(root_text) {
        chord.spelling = spelling;
    }
    Ok(chord)
}

/// Byte length of the note-name prefix (letter plus accidentals)
fn root_length(main: &str) -> usize {
    let mut chars = main.char_indices();
    match chars.next() {
        Some((_, c)) if matches!(c.to_ascii_uppercase(), 'A'..='G') => {}
        _ => return 0,
    }
    let mut end = 1;
    for (i, c) in chars {
        match c {
            '#' | '♯' | 'b' | '♭' => end = i + c.len_utf8(),
            _ => break,
        }
    }
    end
}

/// Inversion whose bass is `bass`; unrelated basses fall back to root position
fn inversion_for_bass(root: PitchClass, chord_type: ChordType, bass: PitchClass) -> Inversion {
    [Inversion::First, Inversion::Second]
        .into_iter()
        .find(|&inversion| bass_note(root, chord_type, inversion) == bass)
        .unwrap_or(Inversion::Root)
}
