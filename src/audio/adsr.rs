//! ADSR amplitude envelope
//!
//! Exponential segments, sample-rate independent. A chord voice is triggered
//! when the chord strikes and released when its hold time runs out or when
//! playback moves on.

/// Where an envelope is in its life
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeStage {
    Idle,
    Attack,
    Decay,
    Sustain,
    Release,
}

/// Envelope shape. Times are in seconds; `sustain` is a level (0.0-1.0).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdsrParams {
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
}

impl AdsrParams {
    pub fn new(attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        Self {
            attack: attack.max(0.001),
            decay: decay.max(0.0),
            sustain: sustain.clamp(0.0, 1.0),
            release: release.max(0.001),
        }
    }

    /// Hammer strike: instant attack, long fall toward a low sustain
    pub fn piano() -> Self {
        Self::new(0.004, 1.2, 0.25, 0.35)
    }

    /// Metronome tick: gone within a few tens of milliseconds
    pub fn click() -> Self {
        Self::new(0.001, 0.03, 0.0, 0.01)
    }

    /// Release used when a chord is cut off by the next one
    pub fn damped(self) -> Self {
        Self::new(self.attack, self.decay, self.sustain, 0.04)
    }
}

impl Default for AdsrParams {
    fn default() -> Self {
        Self::piano()
    }
}

/// Per-sample envelope generator
#[derive(Debug, Clone)]
pub struct AdsrEnvelope {
    params: AdsrParams,
    stage: EnvelopeStage,
    level: f32,
    sample_rate: f32,
    attack_coeff: f32,
    decay_coeff: f32,
    release_coeff: f32,
}

/// ln(1000): a segment reaches 99.9% of its target in its nominal time
const TIME_CONSTANT: f32 = 6.9;

fn coefficient(seconds: f32, sample_rate: f32) -> f32 {
    if seconds > 0.0 {
        1.0 - (-TIME_CONSTANT / (seconds * sample_rate)).exp()
    } else {
        1.0
    }
}

impl AdsrEnvelope {
    pub fn new(params: AdsrParams, sample_rate: f32) -> Self {
        Self {
            params,
            stage: EnvelopeStage::Idle,
            level: 0.0,
            sample_rate,
            attack_coeff: coefficient(params.attack, sample_rate),
            decay_coeff: coefficient(params.decay, sample_rate),
            release_coeff: coefficient(params.release, sample_rate),
        }
    }

    pub fn trigger(&mut self) {
        self.stage = EnvelopeStage::Attack;
    }

    pub fn release(&mut self) {
        if self.stage != EnvelopeStage::Idle {
            self.stage = EnvelopeStage::Release;
        }
    }

    /// Release quickly with a short fade instead of the voice's own tail
    pub fn damp(&mut self) {
        self.release_coeff = coefficient(self.params.damped().release, self.sample_rate);
        self.release();
    }

    pub fn stage(&self) -> EnvelopeStage {
        self.stage
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn is_finished(&self) -> bool {
        self.stage == EnvelopeStage::Idle
    }

    pub fn next_sample(&mut self) -> f32 {
        match self.stage {
            EnvelopeStage::Idle => self.level = 0.0,
            EnvelopeStage::Attack => {
                self.level += (1.0 - self.level) * self.attack_coeff;
                if self.level >= 0.999 {
                    self.level = 1.0;
                    self.stage = EnvelopeStage::Decay;
                }
            }
            EnvelopeStage::Decay => {
                let target = self.params.sustain;
                self.level += (target - self.level) * self.decay_coeff;
                if (self.level - target).abs() < 0.001 {
                    self.level = target;
                    self.stage = if target > 0.0 {
                        EnvelopeStage::Sustain
                    } else {
                        EnvelopeStage::Idle
                    };
                }
            }
            EnvelopeStage::Sustain => self.level = self.params.sustain,
            EnvelopeStage::Release => {
                self.level -= self.level * self.release_coeff;
                if self.level < 0.0001 {
                    self.level = 0.0;
                    self.stage = EnvelopeStage::Idle;
                }
            }
        }
        self.level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 44100.0;

    fn run(env: &mut AdsrEnvelope, samples: usize) {
        for _ in 0..samples {
            env.next_sample();
        }
    }

    #[test]
    fn test_envelope_starts_idle() {
        let env = AdsrEnvelope::new(AdsrParams::piano(), SAMPLE_RATE);
        assert_eq!(env.stage(), EnvelopeStage::Idle);
        assert_eq!(env.level(), 0.0);
    }

    #[test]
    fn test_piano_reaches_peak_quickly() {
        let mut env = AdsrEnvelope::new(AdsrParams::piano(), SAMPLE_RATE);
        env.trigger();
        run(&mut env, 441);
        assert_eq!(env.stage(), EnvelopeStage::Decay);
    }

    #[test]
    fn test_piano_settles_at_sustain() {
        let mut env = AdsrEnvelope::new(AdsrParams::piano(), SAMPLE_RATE);
        env.trigger();
        run(&mut env, SAMPLE_RATE as usize * 3);
        assert_eq!(env.stage(), EnvelopeStage::Sustain);
        assert!((env.level() - 0.25).abs() < 0.01);
    }

    #[test]
    fn test_click_finishes_without_release() {
        let mut env = AdsrEnvelope::new(AdsrParams::click(), SAMPLE_RATE);
        env.trigger();
        run(&mut env, SAMPLE_RATE as usize / 2);
        assert!(env.is_finished());
    }

    #[test]
    fn test_damp_is_faster_than_release() {
        let mut released = AdsrEnvelope::new(AdsrParams::piano(), SAMPLE_RATE);
        let mut damped = released.clone();
        for env in [&mut released, &mut damped] {
            env.trigger();
            run(env, 2000);
        }
        released.release();
        damped.damp();
        run(&mut released, 2000);
        run(&mut damped, 2000);
        assert!(damped.level() < released.level());
    }

    #[test]
    fn test_output_range() {
        let mut env = AdsrEnvelope::new(AdsrParams::piano(), SAMPLE_RATE);
        env.trigger();
        for _ in 0..20000 {
            let sample = env.next_sample();
            assert!((0.0..=1.0).contains(&sample), "sample {} out of range", sample);
        }
        env.release();
        for _ in 0..20000 {
            let sample = env.next_sample();
            assert!((0.0..=1.0).contains(&sample), "sample {} out of range", sample);
        }
    }
}
