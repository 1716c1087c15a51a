//! Fixed chord charts for song mode
//!
//! Charts are written as chord symbols in their original key, one symbol per
//! bar. Playing a song resolves the symbols and optionally transposes them;
//! the result runs through the same scheduler as generated progressions.

use crate::error::TrainerError;
use crate::parser::parse_chord_symbol;
use crate::types::key::Key;
use crate::types::note::PitchClass;
use crate::types::progression::Progression;
use crate::types::time::TimeSignature;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongChart {
    pub title: String,
    pub key: Key,
    pub bpm: u32,
    pub time_signature: TimeSignature,
    pub chords: Vec<String>,
}

impl SongChart {
    pub fn new(title: &str, key: Key, bpm: u32, time_signature: TimeSignature, chords: &[&str]) -> Self {
        SongChart {
            title: title.to_string(),
            key,
            bpm,
            time_signature,
            chords: chords.iter().map(|symbol| symbol.to_string()).collect(),
        }
    }

    /// Key the chart sounds in after moving it `semitones`
    pub fn transposed_key(&self, semitones: i32) -> Key {
        self.key.transpose(semitones)
    }

    /// Resolve the chart, moved by `semitones` and spelled for the new key
    pub fn progression(&self, semitones: i32) -> Result<Progression, TrainerError> {
        let spelling = self.transposed_key(semitones).spelling;
        let chords = self
            .chords
            .iter()
            .enumerate()
            .map(|(position, symbol)| {
                parse_chord_symbol(symbol)
                    .map(|chord| chord.transpose(semitones, spelling))
                    .map_err(|source| TrainerError::Parse {
                        position,
                        token: symbol.clone(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Progression::from_chords(chords))
    }
}

/// Semitone shift that takes `from` to `to`, choosing the smaller direction
pub fn interval_between(from: PitchClass, to: PitchClass) -> i32 {
    let up = from.interval_to(to) as i32;
    if up > 6 {
        up - 12
    } else {
        up
    }
}

/// The built-in chart collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongBook {
    songs: Vec<SongChart>,
}

impl SongBook {
    pub fn builtin() -> Self {
        let g = Key::major(PitchClass::new(7));
        let c = Key::major(PitchClass::C);
        let f = Key::major(PitchClass::new(5));
        let d = Key::major(PitchClass::new(2));
        let am = Key::minor(PitchClass::new(9));
        let three_four = TimeSignature { beats: 3, unit: 4 };
        let six_eight = TimeSignature { beats: 6, unit: 8 };

        SongBook {
            songs: vec![
                SongChart::new(
                    "Amazing Grace",
                    g,
                    80,
                    three_four,
                    &[
                        "G", "G7", "C", "G", "G", "Em", "A7", "D7", "G", "G7", "C", "G", "G/D",
                        "D7", "G", "G",
                    ],
                ),
                SongChart::new(
                    "House of the Rising Sun",
                    am,
                    76,
                    six_eight,
                    &["Am", "C", "D", "F", "Am", "C", "E", "E", "Am", "C", "D", "F", "Am", "E", "Am", "E"],
                ),
                SongChart::new(
                    "When the Saints Go Marching In",
                    c,
                    120,
                    TimeSignature::COMMON,
                    &[
                        "C", "C", "C", "C", "C", "C", "G7", "G7", "C", "C7", "F", "Fm", "C/G", "G7",
                        "C", "C",
                    ],
                ),
                SongChart::new(
                    "Greensleeves",
                    am,
                    90,
                    six_eight,
                    &[
                        "Am", "G", "Am", "E", "Am", "G", "Am/E", "E", "C", "G", "Am", "E", "C", "G",
                        "Am/E", "E",
                    ],
                ),
                SongChart::new(
                    "Auld Lang Syne",
                    f,
                    84,
                    TimeSignature::COMMON,
                    &["F", "C7", "F", "Bb", "F", "C7", "Dm", "Bb/D", "F/C", "C7", "F", "F"],
                ),
                SongChart::new(
                    "Scarborough Fair",
                    am,
                    88,
                    three_four,
                    &["Am", "G", "Am", "C", "Am/C", "D", "Am", "Am", "C", "G", "Am", "Em", "Am", "G", "Am", "Am"],
                ),
                SongChart::new(
                    "Oh! Susanna",
                    d,
                    110,
                    TimeSignature::COMMON,
                    &["D", "D", "D", "A7", "D", "D", "D/A", "A7", "G", "G", "D", "A7", "D", "D", "A7", "D"],
                ),
            ],
        }
    }

    pub fn songs(&self) -> &[SongChart] {
        &self.songs
    }

    pub fn get(&self, index: usize) -> Option<&SongChart> {
        self.songs.get(index)
    }

    /// Lookup by case-insensitive title prefix
    pub fn find(&self, query: &str) -> Option<&SongChart> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return None;
        }
        self.songs
            .iter()
            .find(|song| song.title.to_lowercase().starts_with(&query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::chord::{ChordType, Inversion};

    #[test]
    fn test_builtin_charts_parse() {
        for song in SongBook::builtin().songs() {
            let progression = song.progression(0).unwrap();
            assert_eq!(progression.len(), song.chords.len(), "{}", song.title);
        }
    }

    #[test]
    fn test_transpose_up_a_whole_step() {
        let book = SongBook::builtin();
        let grace = book.find("amazing").unwrap();
        let moved = grace.progression(2).unwrap();
        assert_eq!(moved[0].to_string(), "A");
        assert_eq!(moved[1].chord_type, ChordType::Dominant7);
        assert_eq!(moved[2].to_string(), "D");
        assert_eq!(grace.transposed_key(2).to_string(), "A major");
    }

    #[test]
    fn test_transpose_respells_for_flat_keys() {
        let book = SongBook::builtin();
        let saints = book.find("when").unwrap();
        // C → Eb major uses flats throughout
        let moved = saints.progression(3).unwrap();
        assert_eq!(moved[0].to_string(), "Eb");
        assert_eq!(moved[6].to_string(), "Bb7");
        assert_eq!(moved[11].to_string(), "Abm");
    }

    #[test]
    fn test_slash_chords_keep_inversion() {
        let book = SongBook::builtin();
        let saints = book.find("when the saints").unwrap();
        let chords = saints.progression(5).unwrap();
        assert_eq!(chords[12].inversion, Inversion::Second);
    }

    #[test]
    fn test_interval_between_picks_short_way() {
        let c = PitchClass::C;
        assert_eq!(interval_between(c, PitchClass::new(2)), 2);
        assert_eq!(interval_between(c, PitchClass::new(10)), -2);
        assert_eq!(interval_between(c, PitchClass::new(6)), 6);
    }

    #[test]
    fn test_find() {
        let book = SongBook::builtin();
        assert!(book.find("green").is_some());
        assert!(book.find("").is_none());
        assert!(book.find("bohemian").is_none());
    }
}
