//! The two outputs a scheduler drives: sound and display

use crate::types::chord::Chord;

/// Fire-and-forget sound output. Nothing here may block the scheduler.
pub trait ToneGenerator {
    /// Sound `midi_notes` for `duration_secs`, optionally rolled low to high
    fn play_chord(&mut self, midi_notes: &[u8], duration_secs: f32, arpeggiate: bool);

    /// Release every sounding chord note immediately
    fn stop_current_chord(&mut self);

    fn play_metronome_click(&mut self, downbeat: bool);
}

/// What the beat display should show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeatIndicator {
    /// Beat `current` (1-based) of `total` beats in the chord
    Beat { current: u32, total: u32 },
    /// A practice-beat replay; `remaining` slices left after this one
    Practice { remaining: u32 },
    /// Waiting for a manual step
    Waiting,
    Off,
}

pub trait Highlighter {
    fn highlight_chord(&mut self, chord: &Chord);

    fn clear_highlights(&mut self);

    fn display_progression(&mut self, chords: &[Chord]);

    fn update_active_pill(&mut self, index: usize);

    fn show_beat(&mut self, indicator: BeatIndicator);

    /// Lead-in beats left, `0` to hide the countdown
    fn show_countdown(&mut self, remaining: u32);
}

/// A tone generator that makes no sound
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl ToneGenerator for Silent {
    fn play_chord(&mut self, _midi_notes: &[u8], _duration_secs: f32, _arpeggiate: bool) {}

    fn stop_current_chord(&mut self) {}

    fn play_metronome_click(&mut self, _downbeat: bool) {}
}

impl<T: ToneGenerator + ?Sized> ToneGenerator for Box<T> {
    fn play_chord(&mut self, midi_notes: &[u8], duration_secs: f32, arpeggiate: bool) {
        (**self).play_chord(midi_notes, duration_secs, arpeggiate)
    }

    fn stop_current_chord(&mut self) {
        (**self).stop_current_chord()
    }

    fn play_metronome_click(&mut self, downbeat: bool) {
        (**self).play_metronome_click(downbeat)
    }
}

impl<H: Highlighter + ?Sized> Highlighter for Box<H> {
    fn highlight_chord(&mut self, chord: &Chord) {
        (**self).highlight_chord(chord)
    }

    fn clear_highlights(&mut self) {
        (**self).clear_highlights()
    }

    fn display_progression(&mut self, chords: &[Chord]) {
        (**self).display_progression(chords)
    }

    fn update_active_pill(&mut self, index: usize) {
        (**self).update_active_pill(index)
    }

    fn show_beat(&mut self, indicator: BeatIndicator) {
        (**self).show_beat(indicator)
    }

    fn show_countdown(&mut self, remaining: u32) {
        (**self).show_countdown(remaining)
    }
}
