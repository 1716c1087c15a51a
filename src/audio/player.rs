use super::voice::{Voice, VoiceKind};
use anyhow::{anyhow, Context, Result};
use chordtrainer_core::scheduler::ToneGenerator;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Sample, SampleFormat, SizedSample, Stream, StreamConfig};
use std::sync::{Arc, Mutex};

/// Seconds between successive notes of a rolled chord
pub const ARPEGGIO_STEP_SECS: f32 = 0.06;

/// Oldest voices are dropped past this many
const MAX_VOICES: usize = 64;

const DEFAULT_SAMPLE_RATE: f32 = 44100.0;

/// Voices shared between the scheduler side and the audio callback
struct Mixer {
    voices: Vec<Voice>,
    volume: f32,
}

impl Mixer {
    fn new() -> Self {
        Self {
            voices: Vec::new(),
            volume: 0.6,
        }
    }

    fn add(&mut self, voice: Voice) {
        self.voices.retain(|v| !v.is_finished());
        if self.voices.len() >= MAX_VOICES {
            self.voices.remove(0);
        }
        self.voices.push(voice);
    }

    /// Next mono sample, soft-clipped
    fn next_sample(&mut self) -> f32 {
        let sum: f32 = self.voices.iter_mut().map(Voice::next_sample).sum();
        (sum * self.volume * 0.25).tanh()
    }

    fn active_voices(&self) -> usize {
        self.voices.iter().filter(|v| !v.is_finished()).count()
    }
}

/// Cheap, cloneable handle the scheduler plays through.
///
/// A handle with no stream behind it keeps accepting notes; nothing renders
/// them, so playback runs silently.
#[derive(Clone)]
pub struct AudioPlayerHandle {
    mixer: Arc<Mutex<Mixer>>,
    sample_rate: f32,
}

impl AudioPlayerHandle {
    /// A handle not connected to any output device
    pub fn detached() -> Self {
        Self::with_sample_rate(DEFAULT_SAMPLE_RATE)
    }

    fn with_sample_rate(sample_rate: f32) -> Self {
        Self {
            mixer: Arc::new(Mutex::new(Mixer::new())),
            sample_rate,
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn volume(&self) -> f32 {
        self.mixer.lock().map(|mixer| mixer.volume).unwrap_or(0.0)
    }

    pub fn set_volume(&self, volume: f32) -> Result<()> {
        let mut mixer = self
            .mixer
            .lock()
            .map_err(|e| anyhow!("Failed to lock mixer: {}", e))?;
        mixer.volume = volume.clamp(0.0, 1.0);
        Ok(())
    }

    pub fn active_voices(&self) -> usize {
        self.mixer.lock().map(|mixer| mixer.active_voices()).unwrap_or(0)
    }

    /// Render `frames` mono samples; used by the output stream
    fn render(&self, frames: usize, mut write: impl FnMut(f32)) {
        match self.mixer.lock() {
            Ok(mut mixer) => {
                for _ in 0..frames {
                    write(mixer.next_sample());
                }
            }
            Err(_) => {
                for _ in 0..frames {
                    write(0.0);
                }
            }
        }
    }

    fn with_mixer(&self, f: impl FnOnce(&mut Mixer)) {
        match self.mixer.lock() {
            Ok(mut mixer) => f(&mut mixer),
            Err(e) => tracing::warn!("mixer unavailable: {}", e),
        }
    }
}

impl ToneGenerator for AudioPlayerHandle {
    fn play_chord(&mut self, midi_notes: &[u8], duration_secs: f32, arpeggiate: bool) {
        let sample_rate = self.sample_rate;
        self.with_mixer(|mixer| {
            for (i, &note) in midi_notes.iter().enumerate() {
                let delay = if arpeggiate {
                    i as f32 * ARPEGGIO_STEP_SECS
                } else {
                    0.0
                };
                mixer.add(Voice::chord_note(note, sample_rate, duration_secs, delay));
            }
        });
    }

    fn stop_current_chord(&mut self) {
        self.with_mixer(|mixer| {
            mixer
                .voices
                .iter_mut()
                .filter(|voice| voice.kind() == VoiceKind::Chord)
                .for_each(Voice::silence);
        });
    }

    fn play_metronome_click(&mut self, downbeat: bool) {
        let sample_rate = self.sample_rate;
        self.with_mixer(|mixer| mixer.add(Voice::click(downbeat, sample_rate)));
    }
}

/// Owns the cpal output stream. Keep it alive for as long as sound is wanted.
pub struct AudioPlayer {
    _stream: Stream,
    handle: AudioPlayerHandle,
}

impl AudioPlayer {
    /// Open the default output device and start rendering
    pub fn open() -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| anyhow!("No output device available"))?;
        let config = device
            .default_output_config()
            .context("failed to query the output configuration")?;

        let sample_format = config.sample_format();
        let config: StreamConfig = config.into();
        let handle = AudioPlayerHandle::with_sample_rate(config.sample_rate.0 as f32);

        let stream = match sample_format {
            SampleFormat::F32 => Self::build_stream::<f32>(&device, &config, handle.clone())?,
            SampleFormat::I16 => Self::build_stream::<i16>(&device, &config, handle.clone())?,
            SampleFormat::U16 => Self::build_stream::<u16>(&device, &config, handle.clone())?,
            _ => return Err(anyhow!("Unsupported sample format: {:?}", sample_format)),
        };
        stream
            .play()
            .map_err(|e| anyhow!("Failed to play stream: {}", e))?;

        tracing::debug!(
            sample_rate = handle.sample_rate(),
            channels = config.channels,
            "audio output opened"
        );
        Ok(AudioPlayer {
            _stream: stream,
            handle,
        })
    }

    fn build_stream<T>(
        device: &cpal::Device,
        config: &StreamConfig,
        handle: AudioPlayerHandle,
    ) -> Result<Stream>
    where
        T: Sample + SizedSample + Send + 'static + cpal::FromSample<f32>,
    {
        let channels = config.channels as usize;
        let err_fn = |err| tracing::error!("audio output stream error: {}", err);

        let stream = device
            .build_output_stream(
                config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    let frame_count = data.len() / channels.max(1);
                    let mut frames = data.chunks_mut(channels);
                    handle.render(frame_count, |value| {
                        if let Some(frame) = frames.next() {
                            let value: T = T::from_sample(value);
                            frame.iter_mut().for_each(|sample| *sample = value);
                        }
                    });
                },
                err_fn,
                None,
            )
            .map_err(|e| anyhow!("Failed to build output stream: {}", e))?;

        Ok(stream)
    }

    pub fn handle(&self) -> AudioPlayerHandle {
        self.handle.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(handle: &AudioPlayerHandle, frames: usize) -> Vec<f32> {
        let mut out = Vec::with_capacity(frames);
        handle.render(frames, |value| out.push(value));
        out
    }

    #[test]
    fn test_audio_player_creation() {
        // No audio device on CI; both outcomes are fine
        match AudioPlayer::open() {
            Ok(player) => assert!(player.handle().sample_rate() > 0.0),
            Err(e) => println!("AudioPlayer unavailable: {}", e),
        }
    }

    #[test]
    fn test_chord_adds_one_voice_per_note() {
        let mut handle = AudioPlayerHandle::detached();
        handle.play_chord(&[48, 60, 64, 67], 1.0, false);
        assert_eq!(handle.active_voices(), 4);
        let samples = drain(&handle, 2000);
        assert!(samples.iter().any(|s| s.abs() > 0.01));
    }

    #[test]
    fn test_stop_silences_chord_but_not_click() {
        let mut handle = AudioPlayerHandle::detached();
        handle.play_chord(&[60, 64, 67], 2.0, false);
        drain(&handle, 500);
        handle.stop_current_chord();
        handle.play_metronome_click(true);
        drain(&handle, 44100 / 4);
        assert_eq!(handle.active_voices(), 0);
    }

    #[test]
    fn test_arpeggiated_notes_start_in_turn() {
        let mut handle = AudioPlayerHandle::detached();
        handle.play_chord(&[60, 64, 67], 1.0, true);
        let samples = drain(&handle, 100);
        assert!(samples.iter().any(|s| s.abs() > 0.0));
        // Second note is still waiting for its slot
        assert_eq!(handle.active_voices(), 3);
    }

    #[test]
    fn test_volume_is_clamped() {
        let handle = AudioPlayerHandle::detached();
        handle.set_volume(3.0).unwrap();
        assert_eq!(handle.volume(), 1.0);
        handle.set_volume(0.0).unwrap();
        let mut tone = handle.clone();
        tone.play_chord(&[60], 1.0, false);
        assert!(drain(&handle, 1000).iter().all(|s| *s == 0.0));
    }
}
