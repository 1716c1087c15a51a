/// Where a playback session is. Exactly one phase is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    /// Counting in; `remaining` clicks until the first chord
    LeadIn { remaining: u32 },
    /// Chord `index` sounding for strike `repetition` (1-based)
    Playing { index: usize, repetition: u32 },
    /// Replaying chord `index` in one-beat slices before moving on
    PracticeBeat {
        index: usize,
        repetition: u32,
        remaining: u32,
    },
    /// Chord `index` finished; nothing moves until the next step
    WaitingForStep { index: usize, repetition: u32 },
}

impl Phase {
    pub fn is_running(&self) -> bool {
        !matches!(self, Phase::Idle)
    }

    /// Chord position for phases that have one
    pub fn position(&self) -> Option<(usize, u32)> {
        match *self {
            Phase::Playing { index, repetition }
            | Phase::PracticeBeat {
                index, repetition, ..
            }
            | Phase::WaitingForStep { index, repetition } => Some((index, repetition)),
            Phase::Idle | Phase::LeadIn { .. } => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::LeadIn { .. } => "lead-in",
            Phase::Playing { .. } => "playing",
            Phase::PracticeBeat { .. } => "practice beat",
            Phase::WaitingForStep { .. } => "waiting for step",
        }
    }
}

/// Mutable state of one playback session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub phase: Phase,
    /// Step mode for this session (forced on by `step` and `rewind`)
    pub step_mode: bool,
    /// Beat within the current chord strike (0-based)
    pub beat_in_chord: u32,
    /// Beats the metronome has clicked since the chord strike began
    pub metronome_beat: u32,
    /// Completed passes through the progression
    pub cycles: u32,
    /// Bumped on every reset; timers armed under an older epoch are stale
    pub epoch: u64,
}

impl Session {
    /// Return to the initial state, invalidating every armed timer
    pub fn reset(&mut self) {
        let epoch = self.epoch + 1;
        *self = Session {
            epoch,
            ..Session::default()
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_bumps_epoch() {
        let mut session = Session {
            phase: Phase::Playing {
                index: 2,
                repetition: 3,
            },
            step_mode: true,
            beat_in_chord: 1,
            metronome_beat: 5,
            cycles: 4,
            epoch: 7,
        };
        session.reset();
        assert_eq!(session.phase, Phase::Idle);
        assert!(!session.step_mode);
        assert_eq!(session.cycles, 0);
        assert_eq!(session.epoch, 8);
    }

    #[test]
    fn test_phase_position() {
        assert_eq!(Phase::Idle.position(), None);
        assert_eq!(Phase::LeadIn { remaining: 2 }.position(), None);
        assert_eq!(
            Phase::WaitingForStep {
                index: 1,
                repetition: 2
            }
            .position(),
            Some((1, 2))
        );
        assert!(!Phase::Idle.is_running());
        assert!(Phase::LeadIn { remaining: 1 }.is_running());
    }
}
