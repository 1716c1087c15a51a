//! Terminal rendering of the keyboard, the progression pills and the beat
//! counter

use chordtrainer_core::scheduler::{BeatIndicator, Highlighter};
use chordtrainer_core::types::note::KEYBOARD_SPAN;
use chordtrainer_core::types::{Chord, Hand, PitchClass};
use colored::*;
use std::io::Write;

/// What to draw on one key of the three-octave keyboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyMark {
    Off,
    Left(u8),
    Right(u8),
}

fn is_black(key: usize) -> bool {
    !PitchClass::new(key as i32).is_natural()
}

/// Marks for every key, fingering numbers included
pub fn key_marks(chord: &Chord) -> [KeyMark; KEYBOARD_SPAN as usize] {
    let mut marks = [KeyMark::Off; KEYBOARD_SPAN as usize];
    for hand in [Hand::Left, Hand::Right] {
        let mut pitches = chord.keyboard_pitches(hand);
        pitches.sort_unstable();
        let fingers = chord.fingering(hand);
        for (pitch, finger) in pitches.into_iter().zip(fingers) {
            let Ok(slot) = usize::try_from(pitch) else {
                continue;
            };
            if let Some(mark) = marks.get_mut(slot) {
                *mark = match hand {
                    Hand::Left => KeyMark::Left(finger),
                    Hand::Right => KeyMark::Right(finger),
                };
            }
        }
    }
    marks
}

fn paint(mark: KeyMark, idle: &str) -> ColoredString {
    match mark {
        KeyMark::Off => idle.normal(),
        KeyMark::Left(finger) => finger.to_string().bright_cyan().bold(),
        KeyMark::Right(finger) => finger.to_string().bright_green().bold(),
    }
}

/// Two text rows: black keys above, white keys below
pub fn render_keyboard(marks: &[KeyMark]) -> [String; 2] {
    let mut black_row = String::new();
    let mut white_row = String::new();
    for (pitch, &mark) in marks.iter().enumerate() {
        if is_black(pitch) {
            continue;
        }
        white_row.push('|');
        white_row.push_str(&paint(mark, " ").to_string());
        white_row.push(' ');

        black_row.push_str("  ");
        match marks.get(pitch + 1) {
            Some(&next) if is_black(pitch + 1) => {
                black_row.push_str(&paint(next, "#").dimmed().to_string())
            }
            _ => black_row.push(' '),
        }
    }
    white_row.push('|');
    [black_row, white_row]
}

/// Progression names with the active one bracketed
pub fn render_pills(names: &[String], active: Option<usize>) -> String {
    names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            if Some(i) == active {
                format!("[{}]", name).bright_yellow().bold().to_string()
            } else {
                format!(" {} ", name)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn render_beat(indicator: BeatIndicator) -> Option<String> {
    match indicator {
        BeatIndicator::Beat { current, total } => {
            let dots: String = (1..=total)
                .map(|beat| if beat == current { '●' } else { '○' })
                .collect();
            Some(format!("beat {}/{} {}", current, total, dots))
        }
        BeatIndicator::Practice { remaining } => Some(format!("P {}", remaining)),
        BeatIndicator::Waiting => Some("waiting: type `step` to continue".to_string()),
        BeatIndicator::Off => None,
    }
}

/// Highlighter that draws to the terminal
pub struct TerminalKeyboard {
    label: &'static str,
    slash: bool,
    names: Vec<String>,
    active: Option<usize>,
}

impl TerminalKeyboard {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            slash: false,
            names: Vec::new(),
            active: None,
        }
    }

    pub fn set_slash_notation(&mut self, slash: bool) {
        self.slash = slash;
    }

    pub fn active(&self) -> Option<usize> {
        self.active
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    fn status(&self, text: &str) {
        let mut out = std::io::stdout();
        let _ = write!(out, "\r{} {}   ", format!("[{}]", self.label).dimmed(), text);
        let _ = out.flush();
    }
}

impl Highlighter for TerminalKeyboard {
    fn highlight_chord(&mut self, chord: &Chord) {
        let [black, white] = render_keyboard(&key_marks(chord));
        println!();
        println!("{} {}", "▶".bright_magenta(), chord.name(self.slash).bright_white().bold());
        println!("{}", black);
        println!("{}", white);
    }

    fn clear_highlights(&mut self) {
        self.active = None;
    }

    fn display_progression(&mut self, chords: &[Chord]) {
        self.names = chords.iter().map(|chord| chord.name(self.slash)).collect();
        self.active = None;
        println!(
            "{} {}",
            format!("[{}]", self.label).dimmed(),
            render_pills(&self.names, None)
        );
    }

    fn update_active_pill(&mut self, index: usize) {
        self.active = Some(index);
        if !self.names.is_empty() {
            println!("{}", render_pills(&self.names, self.active));
        }
    }

    fn show_beat(&mut self, indicator: BeatIndicator) {
        if let Some(text) = render_beat(indicator) {
            self.status(&text);
        }
    }

    fn show_countdown(&mut self, remaining: u32) {
        if remaining > 0 {
            self.status(&format!("lead-in {}", remaining.to_string().bright_yellow().bold()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chordtrainer_core::types::{ChordType, Inversion};

    fn marked(marks: &[KeyMark]) -> Vec<(usize, KeyMark)> {
        marks
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, mark)| *mark != KeyMark::Off)
            .collect()
    }

    #[test]
    fn test_c_major_marks() {
        let chord = Chord::new(PitchClass::C, ChordType::Major);
        assert_eq!(
            marked(&key_marks(&chord)),
            vec![
                (0, KeyMark::Left(5)),
                (12, KeyMark::Right(1)),
                (16, KeyMark::Right(3)),
                (19, KeyMark::Right(5)),
            ]
        );
    }

    #[test]
    fn test_seventh_uses_four_fingers() {
        let chord = Chord::new(PitchClass::new(7), ChordType::Dominant7);
        let right: Vec<u8> = key_marks(&chord)
            .iter()
            .filter_map(|mark| match mark {
                KeyMark::Right(finger) => Some(*finger),
                _ => None,
            })
            .collect();
        assert_eq!(right, vec![1, 2, 3, 5]);
    }

    #[test]
    fn test_first_inversion_bass_is_the_third() {
        let chord = Chord::new(PitchClass::C, ChordType::Major).with_inversion(Inversion::First);
        let left: Vec<usize> = marked(&key_marks(&chord))
            .into_iter()
            .filter(|(_, mark)| matches!(mark, KeyMark::Left(_)))
            .map(|(pitch, _)| pitch % 12)
            .collect();
        assert_eq!(left, vec![4]);
    }

    #[test]
    fn test_keyboard_rows_have_matching_width() {
        colored::control::set_override(false);
        let [black, white] = render_keyboard(&[KeyMark::Off; KEYBOARD_SPAN as usize]);
        // 21 white keys, three columns each
        assert_eq!(white.chars().count(), 21 * 3 + 1);
        assert_eq!(black.chars().count(), 21 * 3);
        assert_eq!(black.matches('#').count(), 15);
    }

    #[test]
    fn test_pills_bracket_active_chord() {
        colored::control::set_override(false);
        let names = vec!["C".to_string(), "Am".to_string(), "F".to_string()];
        assert_eq!(render_pills(&names, Some(1)), " C  [Am]  F ");
        assert_eq!(render_pills(&names, None), " C   Am   F ");
    }

    #[test]
    fn test_beat_text() {
        assert_eq!(
            render_beat(BeatIndicator::Beat { current: 2, total: 4 }).as_deref(),
            Some("beat 2/4 ○●○○")
        );
        assert_eq!(
            render_beat(BeatIndicator::Practice { remaining: 2 }).as_deref(),
            Some("P 2")
        );
        assert_eq!(render_beat(BeatIndicator::Off), None);
    }

    #[test]
    fn test_black_keys_follow_the_octave() {
        let black: Vec<usize> = (0..12).filter(|&key| is_black(key)).collect();
        assert_eq!(black, vec![1, 3, 6, 8, 10]);
        assert!(is_black(25));
        assert!(!is_black(35));
    }

    #[test]
    fn test_progression_names_follow_slash_setting() {
        let mut keyboard = TerminalKeyboard::new("test");
        keyboard.set_slash_notation(true);
        let chords = [Chord::new(PitchClass::C, ChordType::Major).with_inversion(Inversion::First)];
        keyboard.display_progression(&chords);
        assert_eq!(keyboard.names(), ["C/E".to_string()]);
        keyboard.update_active_pill(0);
        assert_eq!(keyboard.active(), Some(0));
        keyboard.clear_highlights();
        assert_eq!(keyboard.active(), None);
    }
}
