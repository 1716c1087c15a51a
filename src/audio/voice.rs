//! Sound sources mixed by the player: piano-ish chord notes and the
//! metronome click

use super::adsr::{AdsrEnvelope, AdsrParams};
use std::f32::consts::PI;

/// Relative strength of the first harmonics of a chord note
const PARTIALS: [f32; 4] = [1.0, 0.45, 0.2, 0.08];

/// Frequency of a MIDI note in equal temperament, A4 = 440 Hz
pub fn midi_to_frequency(midi: u8) -> f32 {
    440.0 * 2f32.powf((midi as f32 - 69.0) / 12.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceKind {
    Chord,
    Click,
}

/// One sounding note
pub struct Voice {
    kind: VoiceKind,
    frequency: f32,
    phase: f32,
    sample_rate: f32,
    envelope: AdsrEnvelope,
    /// Samples of silence before the note strikes (arpeggio offset)
    delay: usize,
    /// Samples the note is held once struck; `None` lets the envelope run out
    hold: Option<usize>,
    started: bool,
}

impl Voice {
    /// A chord note held for `hold_secs` after an initial `delay_secs`
    pub fn chord_note(midi: u8, sample_rate: f32, hold_secs: f32, delay_secs: f32) -> Self {
        Self {
            kind: VoiceKind::Chord,
            frequency: midi_to_frequency(midi),
            phase: 0.0,
            sample_rate,
            envelope: AdsrEnvelope::new(AdsrParams::piano(), sample_rate),
            delay: (delay_secs.max(0.0) * sample_rate) as usize,
            hold: Some((hold_secs.max(0.0) * sample_rate) as usize),
            started: false,
        }
    }

    /// A short tick, pitched higher on the downbeat
    pub fn click(downbeat: bool, sample_rate: f32) -> Self {
        Self {
            kind: VoiceKind::Click,
            frequency: if downbeat { 1760.0 } else { 1320.0 },
            phase: 0.0,
            sample_rate,
            envelope: AdsrEnvelope::new(AdsrParams::click(), sample_rate),
            delay: 0,
            hold: None,
            started: false,
        }
    }

    pub fn kind(&self) -> VoiceKind {
        self.kind
    }

    /// Cut the note short. A note still waiting for its arpeggio slot is
    /// dropped without sounding.
    pub fn silence(&mut self) {
        if self.started {
            self.envelope.damp();
        } else {
            self.delay = 0;
            self.hold = Some(0);
            self.started = true;
        }
    }

    pub fn is_finished(&self) -> bool {
        self.started && self.envelope.is_finished()
    }

    pub fn next_sample(&mut self) -> f32 {
        if self.delay > 0 {
            self.delay -= 1;
            return 0.0;
        }
        if !self.started {
            self.started = true;
            if self.hold != Some(0) {
                self.envelope.trigger();
            }
        }
        match self.hold {
            Some(0) => {
                self.envelope.release();
                self.hold = None;
            }
            Some(ref mut remaining) => *remaining -= 1,
            None => {}
        }

        let value = match self.kind {
            VoiceKind::Chord => self.piano(),
            VoiceKind::Click => (2.0 * PI * self.phase).sin(),
        };
        self.phase += self.frequency / self.sample_rate;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }
        value * self.envelope.next_sample()
    }

    /// Sum of the first partials, normalized to [-1, 1]
    fn piano(&self) -> f32 {
        let total: f32 = PARTIALS.iter().sum();
        PARTIALS
            .iter()
            .enumerate()
            .map(|(i, amplitude)| amplitude * (2.0 * PI * self.phase * (i + 1) as f32).sin())
            .sum::<f32>()
            / total
    }
}
