//! Tempo, time signature and note-value arithmetic
//!
//! Every duration the scheduler uses comes from the functions in this module,
//! so the chord-advance delay and the beat counter can never disagree about
//! how many beats a chord lasts.

use crate::parser::ParseError;
use std::fmt;
use std::str::FromStr;

/// A time signature such as 4/4 or 6/8
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeSignature {
    /// Beats per measure (numerator)
    pub beats: u8,
    /// Note value that gets one beat (denominator)
    pub unit: u8,
}

impl TimeSignature {
    pub const COMMON: TimeSignature = TimeSignature { beats: 4, unit: 4 };

    pub fn new(beats: u8, unit: u8) -> Result<Self, ParseError> {
        if beats == 0 || beats > 16 || !matches!(unit, 1 | 2 | 4 | 8 | 16) {
            return Err(ParseError::InvalidTimeSignature(format!("{}/{}", beats, unit)));
        }
        Ok(TimeSignature { beats, unit })
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self::COMMON
    }
}

impl FromStr for TimeSignature {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseError::InvalidTimeSignature(s.trim().to_string());
        let (beats, unit) = s.trim().split_once('/').ok_or_else(invalid)?;
        let beats = beats.trim().parse::<u8>().map_err(|_| invalid())?;
        let unit = unit.trim().parse::<u8>().map_err(|_| invalid())?;
        Self::new(beats, unit)
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.beats, self.unit)
    }
}

/// Rhythmic value each chord strike lasts, as a note-value denominator
/// (1 = whole, 2 = half, 4 = quarter, 8 = eighth)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NoteValue(u8);

impl NoteValue {
    pub const WHOLE: NoteValue = NoteValue(1);
    pub const HALF: NoteValue = NoteValue(2);
    pub const QUARTER: NoteValue = NoteValue(4);
    pub const EIGHTH: NoteValue = NoteValue(8);

    pub fn new(denominator: u8) -> Result<Self, ParseError> {
        if matches!(denominator, 1 | 2 | 4 | 8) {
            Ok(NoteValue(denominator))
        } else {
            Err(ParseError::InvalidNoteValue(denominator.to_string()))
        }
    }

    pub fn denominator(self) -> u8 {
        self.0
    }

    /// The note value that lasts `beats` beats in `time_signature`, if any
    pub fn from_beats(beats: u32, time_signature: TimeSignature) -> Option<Self> {
        if beats == 0 || time_signature.unit as u32 % beats != 0 {
            return None;
        }
        Self::new((time_signature.unit as u32 / beats) as u8).ok()
    }

    pub fn name(self) -> &'static str {
        match self.0 {
            1 => "whole",
            2 => "half",
            4 => "quarter",
            _ => "eighth",
        }
    }
}

impl Default for NoteValue {
    fn default() -> Self {
        Self::QUARTER
    }
}

impl FromStr for NoteValue {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "whole" | "1" => Ok(Self::WHOLE),
            "half" | "2" => Ok(Self::HALF),
            "quarter" | "4" => Ok(Self::QUARTER),
            "eighth" | "8" => Ok(Self::EIGHTH),
            other => Err(ParseError::InvalidNoteValue(other.to_string())),
        }
    }
}

impl fmt::Display for NoteValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Length of one beat in milliseconds
pub fn beat_ms(bpm: u32) -> u64 {
    60_000 / bpm.max(1) as u64
}

/// How many beats one strike of a chord lasts.
///
/// A quarter note in 4/4 is one beat, a half note two, a whole note four.
/// Values shorter than the beat unit are held for one beat.
pub fn beats_per_chord(time_signature: TimeSignature, note_value: NoteValue) -> u32 {
    (time_signature.unit as u32 / note_value.denominator() as u32).max(1)
}

/// How many strikes of the same chord fill one measure.
///
/// In 4/4 this equals the note value: whole 1, half 2, quarter 4.
pub fn repetitions_per_chord(time_signature: TimeSignature, note_value: NoteValue) -> u32 {
    (time_signature.beats as u32 / beats_per_chord(time_signature, note_value)).max(1)
}

/// Length of one chord strike in milliseconds
pub fn chord_duration_ms(bpm: u32, time_signature: TimeSignature, note_value: NoteValue) -> u64 {
    beat_ms(bpm) * beats_per_chord(time_signature, note_value) as u64
}

/// How long one strike of a chord is held
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChordSpan {
    /// A note value, repeated to fill the measure
    Note(NoteValue),
    /// The whole measure, whatever the meter
    Measure,
}

impl ChordSpan {
    pub fn beats(self, time_signature: TimeSignature) -> u32 {
        match self {
            ChordSpan::Note(note_value) => beats_per_chord(time_signature, note_value),
            ChordSpan::Measure => (time_signature.beats as u32).max(1),
        }
    }

    pub fn repetitions(self, time_signature: TimeSignature) -> u32 {
        match self {
            ChordSpan::Note(note_value) => repetitions_per_chord(time_signature, note_value),
            ChordSpan::Measure => 1,
        }
    }

    pub fn duration_ms(self, bpm: u32, time_signature: TimeSignature) -> u64 {
        match self {
            ChordSpan::Note(note_value) => chord_duration_ms(bpm, time_signature, note_value),
            ChordSpan::Measure => beat_ms(bpm) * self.beats(time_signature) as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_beat_duration() {
        assert_eq!(beat_ms(120), 500);
        assert_eq!(beat_ms(60), 1000);
        assert_eq!(beat_ms(180), 333);
    }

    #[test]
    fn test_beats_per_chord_common_time() {
        let ts = TimeSignature::COMMON;
        assert_eq!(beats_per_chord(ts, NoteValue::QUARTER), 1);
        assert_eq!(beats_per_chord(ts, NoteValue::HALF), 2);
        assert_eq!(beats_per_chord(ts, NoteValue::WHOLE), 4);
        assert_eq!(beats_per_chord(ts, NoteValue::EIGHTH), 1);
    }

    #[test]
    fn test_repetitions_match_note_value_in_common_time() {
        let ts = TimeSignature::COMMON;
        for nv in [NoteValue::WHOLE, NoteValue::HALF, NoteValue::QUARTER] {
            assert_eq!(repetitions_per_chord(ts, nv), nv.denominator() as u32);
        }
    }

    #[test]
    fn test_compound_and_odd_meters() {
        let six_eight: TimeSignature = "6/8".parse().unwrap();
        assert_eq!(beats_per_chord(six_eight, NoteValue::QUARTER), 2);
        assert_eq!(repetitions_per_chord(six_eight, NoteValue::QUARTER), 3);

        let three_four: TimeSignature = "3/4".parse().unwrap();
        assert_eq!(repetitions_per_chord(three_four, NoteValue::HALF), 1);
        assert_eq!(repetitions_per_chord(three_four, NoteValue::QUARTER), 3);
    }

    #[test]
    fn test_chord_duration() {
        let ts = TimeSignature::COMMON;
        assert_eq!(chord_duration_ms(120, ts, NoteValue::QUARTER), 500);
        assert_eq!(chord_duration_ms(120, ts, NoteValue::HALF), 1000);
        assert_eq!(chord_duration_ms(60, ts, NoteValue::WHOLE), 4000);
    }

    #[test]
    fn test_measure_span_follows_the_meter() {
        let three_four: TimeSignature = "3/4".parse().unwrap();
        let six_eight: TimeSignature = "6/8".parse().unwrap();
        assert_eq!(ChordSpan::Measure.beats(three_four), 3);
        assert_eq!(ChordSpan::Measure.beats(six_eight), 6);
        assert_eq!(ChordSpan::Measure.repetitions(six_eight), 1);
        assert_eq!(ChordSpan::Measure.duration_ms(60, three_four), 3000);

        // A whole note overshoots a 3/4 bar
        assert_eq!(ChordSpan::Note(NoteValue::WHOLE).beats(three_four), 4);
        assert_eq!(
            ChordSpan::Note(NoteValue::HALF).duration_ms(120, TimeSignature::COMMON),
            chord_duration_ms(120, TimeSignature::COMMON, NoteValue::HALF)
        );
    }

    #[test]
    fn test_parsing() {
        assert_eq!(
            "4/3".parse::<TimeSignature>(),
            Err(ParseError::InvalidTimeSignature("4/3".to_string()))
        );
        assert!("0/4".parse::<TimeSignature>().is_err());
        assert!("four".parse::<TimeSignature>().is_err());
        assert_eq!("half".parse::<NoteValue>().unwrap(), NoteValue::HALF);
        assert_eq!("8".parse::<NoteValue>().unwrap(), NoteValue::EIGHTH);
        assert_eq!(
            "16".parse::<NoteValue>(),
            Err(ParseError::InvalidNoteValue("16".to_string()))
        );
    }

    #[test]
    fn test_note_value_from_beats() {
        let ts = TimeSignature::COMMON;
        assert_eq!(NoteValue::from_beats(1, ts), Some(NoteValue::QUARTER));
        assert_eq!(NoteValue::from_beats(2, ts), Some(NoteValue::HALF));
        assert_eq!(NoteValue::from_beats(4, ts), Some(NoteValue::WHOLE));
        assert_eq!(NoteValue::from_beats(3, ts), None);
    }
}
