//! The playback state machine
//!
//! [`PracticeScheduler`] owns one [`Session`], the progression being played
//! and four timer slots. Every transition cancels the timers it replaces
//! before arming new ones, and every fired timer is checked against the
//! session epoch before it may touch state.

use super::collaborators::{BeatIndicator, Highlighter, ToneGenerator};
use super::session::{Phase, Session};
use super::timers::{Fired, TimerSlot, TimerTable};
use crate::error::{ConfigError, Result};
use crate::generator::{generate, GeneratorRequest};
use crate::types::chord::Chord;
use crate::types::progression::Progression;
use crate::types::settings::TrainerSettings;
use crate::types::style::StyleLibrary;
use crate::types::time::beat_ms;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Where the progression being played came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressionSource {
    /// Produced by the generator; may be regenerated between cycles
    Generated,
    /// Supplied by the caller, e.g. a song chart
    Fixed,
}

pub struct PracticeScheduler<T: ToneGenerator, H: Highlighter> {
    tone: T,
    highlighter: H,
    settings: TrainerSettings,
    library: StyleLibrary,
    rng: StdRng,
    progression: Progression,
    source: ProgressionSource,
    session: Session,
    timers: TimerTable,
}

impl<T: ToneGenerator, H: Highlighter> PracticeScheduler<T, H> {
    pub fn new(tone: T, highlighter: H, settings: TrainerSettings) -> Self {
        PracticeScheduler {
            tone,
            highlighter,
            settings,
            library: StyleLibrary::builtin(),
            rng: StdRng::from_entropy(),
            progression: Progression::new(),
            source: ProgressionSource::Generated,
            session: Session::default(),
            timers: TimerTable::new(),
        }
    }

    /// Use a deterministic random sequence
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn with_library(mut self, library: StyleLibrary) -> Self {
        self.library = library;
        self
    }

    pub fn settings(&self) -> &TrainerSettings {
        &self.settings
    }

    /// Settings are read at every transition, so edits apply from the next one
    pub fn settings_mut(&mut self) -> &mut TrainerSettings {
        &mut self.settings
    }

    pub fn library(&self) -> &StyleLibrary {
        &self.library
    }

    pub fn library_mut(&mut self) -> &mut StyleLibrary {
        &mut self.library
    }

    pub fn progression(&self) -> &Progression {
        &self.progression
    }

    pub fn source(&self) -> ProgressionSource {
        self.source
    }

    pub fn phase(&self) -> Phase {
        self.session.phase
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn is_running(&self) -> bool {
        self.session.phase.is_running()
    }

    pub fn is_step_mode(&self) -> bool {
        self.session.step_mode
    }

    /// The chord at the current position, if playing
    pub fn current_chord(&self) -> Option<&Chord> {
        let (index, _) = self.session.phase.position()?;
        self.progression.get(index)
    }

    pub fn tone(&self) -> &T {
        &self.tone
    }

    pub fn tone_mut(&mut self) -> &mut T {
        &mut self.tone
    }

    pub fn highlighter(&self) -> &H {
        &self.highlighter
    }

    pub fn highlighter_mut(&mut self) -> &mut H {
        &mut self.highlighter
    }

    /// Virtual clock in milliseconds
    pub fn now(&self) -> u64 {
        self.timers.now()
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.timers.next_deadline()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.pending()
    }

    /// Fire every timer due up to `until` in order, then move the clock there
    pub fn advance_to(&mut self, until: u64) {
        while let Some(fired) = self.timers.pop_due(until) {
            self.dispatch(fired);
        }
        self.timers.settle(until);
    }

    pub fn advance_by(&mut self, millis: u64) {
        self.advance_to(self.timers.now() + millis);
    }

    /// Generate a new progression without playing it. Stops any session.
    pub fn regenerate(&mut self) -> Result<&Progression> {
        self.settings.validate(&self.library)?;
        let progression = self.generate_progression()?;
        if self.is_running() {
            self.stop();
        }
        self.progression = progression;
        self.source = ProgressionSource::Generated;
        self.highlighter.display_progression(self.progression.chords());
        Ok(&self.progression)
    }

    /// Generate a progression and play it. Configuration and parse errors
    /// leave the scheduler untouched.
    pub fn start(&mut self) -> Result<()> {
        self.settings.validate(&self.library)?;
        let progression = self.generate_progression()?;
        let step_mode = self.settings.step_mode;
        self.begin(progression, ProgressionSource::Generated, step_mode);
        Ok(())
    }

    /// Play a fixed chord chart through the same state machine
    pub fn start_song(&mut self, progression: Progression) -> Result<()> {
        self.settings.validate_timing()?;
        if progression.is_empty() {
            return Err(ConfigError::EmptyProgression.into());
        }
        let step_mode = self.settings.step_mode;
        self.begin(progression, ProgressionSource::Fixed, step_mode);
        Ok(())
    }

    /// Manual advance.
    ///
    /// When idle this starts a session in step mode. While running it turns
    /// step mode on, silences the current chord and moves exactly one unit
    /// (a repetition or a chord).
    pub fn step(&mut self) -> Result<()> {
        match self.session.phase {
            Phase::Idle => {
                let (progression, source) = match self.source {
                    ProgressionSource::Fixed if !self.progression.is_empty() => {
                        self.settings.validate_timing()?;
                        (self.progression.clone(), ProgressionSource::Fixed)
                    }
                    _ => {
                        self.settings.validate(&self.library)?;
                        (self.generate_progression()?, ProgressionSource::Generated)
                    }
                };
                self.begin(progression, source, true);
            }
            Phase::LeadIn { .. } => {
                self.session.step_mode = true;
                self.interrupt();
                self.render(0, 1);
            }
            Phase::Playing { index, repetition }
            | Phase::PracticeBeat {
                index, repetition, ..
            }
            | Phase::WaitingForStep { index, repetition } => {
                self.session.step_mode = true;
                self.interrupt();
                self.continue_after(index, repetition);
            }
        }
        Ok(())
    }

    /// Go back one unit.
    ///
    /// A chord past its first strike restarts from its first strike;
    /// otherwise the previous chord plays, wrapping from the first to the
    /// last. When idle with a progression, a step-mode session opens on the
    /// last chord.
    pub fn rewind(&mut self) {
        match self.session.phase {
            Phase::Idle => {
                if self.progression.is_empty() {
                    tracing::debug!("rewind with nothing to play");
                    return;
                }
                let last = self.progression.len() - 1;
                self.halt();
                self.session.step_mode = true;
                self.highlighter.display_progression(self.progression.chords());
                self.render(last, 1);
            }
            Phase::LeadIn { .. } => {
                self.interrupt();
                self.enter_lead_in();
            }
            Phase::Playing { index, repetition }
            | Phase::PracticeBeat {
                index, repetition, ..
            }
            | Phase::WaitingForStep { index, repetition } => {
                self.interrupt();
                let target = if repetition > 1 {
                    index
                } else if index == 0 {
                    self.progression.len().saturating_sub(1)
                } else {
                    index - 1
                };
                self.render(target, 1);
            }
        }
    }

    /// Cancel everything and return to idle. The progression is kept.
    pub fn stop(&mut self) {
        let was_running = self.is_running();
        self.halt();
        self.highlighter.clear_highlights();
        self.highlighter.show_beat(BeatIndicator::Off);
        self.highlighter.show_countdown(0);
        if was_running {
            tracing::debug!("session stopped");
        }
    }

    fn generate_progression(&mut self) -> Result<Progression> {
        generate(
            &GeneratorRequest::from(&self.settings),
            &self.library,
            &mut self.rng,
        )
    }

    fn begin(&mut self, progression: Progression, source: ProgressionSource, step_mode: bool) {
        self.halt();
        self.progression = progression;
        self.source = source;
        self.session.step_mode = step_mode;
        self.highlighter.display_progression(self.progression.chords());
        tracing::debug!(
            chords = self.progression.len(),
            step_mode,
            lead_in = self.settings.lead_in_beats,
            "session started"
        );

        if self.settings.lead_in_beats > 0 {
            self.enter_lead_in();
        } else {
            self.render(0, 1);
        }
    }

    /// Cancel timers, silence the chord and reset the session
    fn halt(&mut self) {
        self.timers.cancel_all();
        self.tone.stop_current_chord();
        self.session.reset();
    }

    /// Cancel timers and silence the chord, keeping the session
    fn interrupt(&mut self) {
        self.timers.cancel_all();
        self.tone.stop_current_chord();
    }

    fn beat_ms(&self) -> u64 {
        beat_ms(self.settings.bpm)
    }

    fn beats_per_chord(&self) -> u32 {
        self.settings.chord_span().beats(self.settings.time_signature)
    }

    fn enter_lead_in(&mut self) {
        self.timers.cancel_all();
        let beats = self.settings.lead_in_beats;
        if beats == 0 {
            self.render(0, 1);
            return;
        }

        self.session.phase = Phase::LeadIn { remaining: beats };
        self.highlighter.show_beat(BeatIndicator::Off);
        self.highlighter.show_countdown(beats);
        self.tone.play_metronome_click(true);
        self.timers
            .set_interval(TimerSlot::Countdown, self.beat_ms(), self.session.epoch);
        tracing::debug!(beats, "lead-in");
    }

    /// Enter `Playing(index, repetition)`: draw, sound and time the chord
    fn render(&mut self, index: usize, repetition: u32) {
        self.timers.cancel_all();
        let Some(chord) = self.progression.get(index).copied() else {
            tracing::warn!(index, len = self.progression.len(), "chord index out of range");
            self.stop();
            return;
        };

        self.session.phase = Phase::Playing { index, repetition };
        self.highlighter.show_countdown(0);
        self.highlighter.highlight_chord(&chord);
        self.highlighter.update_active_pill(index);

        let duration = self
            .settings
            .chord_span()
            .duration_ms(self.settings.bpm, self.settings.time_signature);
        if self.settings.sound {
            self.tone.play_chord(
                &chord.midi_notes(),
                duration as f32 / 1000.0,
                self.settings.arpeggiate,
            );
        }

        self.start_beat_counter();
        self.timers
            .set_timeout(TimerSlot::Advance, duration, self.session.epoch);
        tracing::debug!(index, repetition, chord = %chord, "chord");
    }

    /// Restart the beat display and metronome at the start of a strike
    fn start_beat_counter(&mut self) {
        let period = self.beat_ms();
        let epoch = self.session.epoch;
        self.session.beat_in_chord = 0;
        self.session.metronome_beat = 0;
        self.highlighter.show_beat(BeatIndicator::Beat {
            current: 1,
            total: self.beats_per_chord(),
        });
        self.timers.set_interval(TimerSlot::Beat, period, epoch);

        if self.settings.metronome {
            self.tone.play_metronome_click(self.is_downbeat());
            self.timers.set_interval(TimerSlot::Metronome, period, epoch);
        }
    }

    /// Whether the metronome's current beat starts a measure
    fn is_downbeat(&self) -> bool {
        let repetition = self
            .session
            .phase
            .position()
            .map(|(_, repetition)| repetition)
            .unwrap_or(1);
        let beat = (repetition.saturating_sub(1)) * self.beats_per_chord() + self.session.metronome_beat;
        beat % self.settings.time_signature.beats.max(1) as u32 == 0
    }

    fn dispatch(&mut self, fired: Fired) {
        if fired.epoch != self.session.epoch || !self.is_running() {
            tracing::trace!(slot = ?fired.slot, at = fired.at, "dropping stale timer");
            return;
        }

        match fired.slot {
            TimerSlot::Advance => self.on_advance(),
            TimerSlot::Countdown => self.on_countdown(),
            TimerSlot::Beat => self.on_beat(),
            TimerSlot::Metronome => self.on_metronome(),
        }
    }

    fn on_countdown(&mut self) {
        let Phase::LeadIn { remaining } = self.session.phase else {
            self.timers.cancel(TimerSlot::Countdown);
            return;
        };

        let remaining = remaining.saturating_sub(1);
        if remaining == 0 {
            self.timers.cancel(TimerSlot::Countdown);
            self.render(0, 1);
        } else {
            self.session.phase = Phase::LeadIn { remaining };
            self.highlighter.show_countdown(remaining);
            self.tone.play_metronome_click(remaining == 1);
        }
    }

    fn on_beat(&mut self) {
        if !matches!(self.session.phase, Phase::Playing { .. }) {
            self.timers.cancel(TimerSlot::Beat);
            return;
        }
        let total = self.beats_per_chord();
        self.session.beat_in_chord = (self.session.beat_in_chord + 1) % total;
        self.highlighter.show_beat(BeatIndicator::Beat {
            current: self.session.beat_in_chord + 1,
            total,
        });
    }

    fn on_metronome(&mut self) {
        if !self.settings.metronome {
            self.timers.cancel(TimerSlot::Metronome);
            return;
        }
        self.session.metronome_beat += 1;
        self.tone.play_metronome_click(self.is_downbeat());
    }

    fn on_advance(&mut self) {
        match self.session.phase {
            Phase::Playing { index, repetition } => {
                if self.session.step_mode {
                    self.timers.cancel_all();
                    self.session.phase = Phase::WaitingForStep { index, repetition };
                    self.highlighter.show_beat(BeatIndicator::Waiting);
                    tracing::debug!(index, repetition, "waiting for step");
                } else if self.settings.practice_beats {
                    let slices = self.beats_per_chord().saturating_sub(1);
                    self.enter_practice(index, repetition, slices);
                } else {
                    self.continue_after(index, repetition);
                }
            }
            Phase::PracticeBeat {
                index,
                repetition,
                remaining,
            } => self.enter_practice(index, repetition, remaining.saturating_sub(1)),
            phase => {
                tracing::trace!(phase = phase.name(), "advance timer with no chord to advance");
            }
        }
    }

    /// Replay the chord in one-beat slices, `remaining` of them
    fn enter_practice(&mut self, index: usize, repetition: u32, remaining: u32) {
        if remaining == 0 {
            self.continue_after(index, repetition);
            return;
        }
        self.timers.cancel_all();
        let Some(chord) = self.progression.get(index).copied() else {
            self.stop();
            return;
        };

        self.session.phase = Phase::PracticeBeat {
            index,
            repetition,
            remaining,
        };
        let slice = self.beat_ms();
        self.highlighter.highlight_chord(&chord);
        self.highlighter.show_beat(BeatIndicator::Practice {
            remaining: remaining - 1,
        });
        if self.settings.sound {
            self.tone.play_chord(
                &chord.midi_notes(),
                slice as f32 / 1000.0,
                self.settings.arpeggiate,
            );
        }
        if self.settings.metronome {
            self.tone.play_metronome_click(false);
        }
        self.timers
            .set_timeout(TimerSlot::Advance, slice, self.session.epoch);
    }

    /// The auto-advance rule: next repetition, next chord, or a new cycle
    fn continue_after(&mut self, index: usize, repetition: u32) {
        let total = self.settings.chord_span().repetitions(self.settings.time_signature);
        if repetition < total {
            self.render(index, repetition + 1);
        } else if index + 1 >= self.progression.len() {
            self.complete_cycle();
        } else {
            self.render(index + 1, 1);
        }
    }

    fn complete_cycle(&mut self) {
        self.session.cycles += 1;
        tracing::debug!(cycles = self.session.cycles, "cycle complete");

        if self.source == ProgressionSource::Generated && self.settings.regenerate_each_cycle {
            match self.generate_progression() {
                Ok(progression) => {
                    self.progression = progression;
                    self.highlighter.display_progression(self.progression.chords());
                }
                Err(err) => tracing::warn!(%err, "keeping previous progression"),
            }
        }

        if self.settings.lead_in_beats > 0 && !self.session.step_mode {
            self.enter_lead_in();
        } else {
            self.render(0, 1);
        }
    }
}
