use crate::error::ConfigError;
use crate::types::chord::{ChordType, Inversion};
use crate::types::key::Key;
use crate::types::style::{StyleLibrary, StylePattern, RANDOM_STYLE};
use crate::types::time::{ChordSpan, NoteValue, TimeSignature};
use std::collections::BTreeSet;

pub const MIN_BPM: u32 = 30;
pub const MAX_BPM: u32 = 240;
pub const MAX_LENGTH: usize = 32;
pub const MAX_LEAD_IN_BEATS: u32 = 16;

/// Everything the generator and scheduler read at call time
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrainerSettings {
    pub key: Key,
    pub length: usize,
    pub selected_types: BTreeSet<ChordType>,
    pub selected_inversions: BTreeSet<Inversion>,
    pub style: String,
    pub bpm: u32,
    pub time_signature: TimeSignature,
    pub note_value: NoteValue,
    /// Hold each chord for one full measure instead of `note_value`
    #[cfg_attr(feature = "serde", serde(default))]
    pub chord_per_measure: bool,
    pub lead_in_beats: u32,
    pub step_mode: bool,
    pub practice_beats: bool,
    pub metronome: bool,
    pub arpeggiate: bool,
    pub slash_notation: bool,
    pub sound: bool,
    /// Generate a fresh progression each time a cycle completes
    pub regenerate_each_cycle: bool,
}

impl Default for TrainerSettings {
    fn default() -> Self {
        TrainerSettings {
            key: Key::default(),
            length: 4,
            selected_types: [ChordType::Major, ChordType::Minor].into_iter().collect(),
            selected_inversions: [Inversion::Root].into_iter().collect(),
            style: RANDOM_STYLE.to_string(),
            bpm: 90,
            time_signature: TimeSignature::COMMON,
            note_value: NoteValue::WHOLE,
            chord_per_measure: false,
            lead_in_beats: 4,
            step_mode: false,
            practice_beats: false,
            metronome: true,
            arpeggiate: false,
            slash_notation: false,
            sound: true,
            regenerate_each_cycle: false,
        }
    }
}

impl TrainerSettings {
    pub fn is_random_style(&self) -> bool {
        self.style.eq_ignore_ascii_case(RANDOM_STYLE)
    }

    /// Check the settings can produce a progression with `library`
    pub fn validate(&self, library: &StyleLibrary) -> Result<(), ConfigError> {
        if self.selected_inversions.is_empty() {
            return Err(ConfigError::NoInversions);
        }
        if self.is_random_style() {
            if self.selected_types.is_empty() {
                return Err(ConfigError::NoChordTypes);
            }
        } else if library.get(&self.style).is_none() {
            return Err(ConfigError::UnknownStyle(self.style.clone()));
        }
        self.validate_timing()?;
        if self.length == 0 || self.length > MAX_LENGTH {
            return Err(ConfigError::InvalidLength {
                got: self.length,
                max: MAX_LENGTH,
            });
        }
        Ok(())
    }

    /// Tempo checks shared by practice and song playback
    pub fn validate_timing(&self) -> Result<(), ConfigError> {
        if !(MIN_BPM..=MAX_BPM).contains(&self.bpm) {
            return Err(ConfigError::InvalidTempo {
                got: self.bpm,
                min: MIN_BPM,
                max: MAX_BPM,
            });
        }
        Ok(())
    }

    pub fn chord_span(&self) -> ChordSpan {
        if self.chord_per_measure {
            ChordSpan::Measure
        } else {
            ChordSpan::Note(self.note_value)
        }
    }

    /// Adopt a style's suggested length, tempo and chord duration
    pub fn apply_style(&mut self, name: &str, style: &StylePattern) {
        self.style = name.to_string();
        if style.length > 0 {
            self.length = style.length.min(MAX_LENGTH);
        }
        if style.tempo > 0 {
            self.bpm = style.tempo.clamp(MIN_BPM, MAX_BPM);
        }
        match NoteValue::from_beats(style.beats_per_chord, self.time_signature) {
            Some(note_value) => self.note_value = note_value,
            None => tracing::warn!(
                style = name,
                beats = style.beats_per_chord,
                time_signature = %self.time_signature,
                "style chord length does not fit the meter, keeping note value"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = TrainerSettings::default();
        assert!(settings.validate(&StyleLibrary::builtin()).is_ok());
        assert!(settings.is_random_style());
    }

    #[test]
    fn test_empty_selections_are_rejected() {
        let library = StyleLibrary::builtin();
        let mut settings = TrainerSettings::default();
        settings.selected_types.clear();
        assert_eq!(settings.validate(&library), Err(ConfigError::NoChordTypes));

        // A fixed style does not need chord types
        settings.style = "Pop".to_string();
        assert!(settings.validate(&library).is_ok());

        settings.selected_inversions.clear();
        assert_eq!(settings.validate(&library), Err(ConfigError::NoInversions));
    }

    #[test]
    fn test_range_checks() {
        let library = StyleLibrary::builtin();
        let mut settings = TrainerSettings::default();
        settings.bpm = 10;
        assert!(matches!(settings.validate(&library), Err(ConfigError::InvalidTempo { .. })));
        settings.bpm = 100;
        settings.length = 0;
        assert!(matches!(settings.validate(&library), Err(ConfigError::InvalidLength { .. })));
        settings.length = 4;
        settings.style = "Polka".to_string();
        assert_eq!(
            settings.validate(&library),
            Err(ConfigError::UnknownStyle("Polka".to_string()))
        );
    }

    #[test]
    fn test_apply_style() {
        let library = StyleLibrary::builtin();
        let mut settings = TrainerSettings::default();
        let canon = library.get("Canon").unwrap();
        settings.apply_style("Canon", canon);
        assert_eq!(settings.style, "Canon");
        assert_eq!(settings.length, 8);
        assert_eq!(settings.bpm, 80);
        assert_eq!(settings.note_value, NoteValue::HALF);
    }

    #[test]
    fn test_chord_span_follows_measure_toggle() {
        let mut settings = TrainerSettings {
            note_value: NoteValue::HALF,
            time_signature: TimeSignature { beats: 3, unit: 4 },
            ..TrainerSettings::default()
        };
        assert_eq!(settings.chord_span(), ChordSpan::Note(NoteValue::HALF));
        settings.chord_per_measure = true;
        assert_eq!(settings.chord_span(), ChordSpan::Measure);
        assert_eq!(settings.chord_span().beats(settings.time_signature), 3);
    }
}
