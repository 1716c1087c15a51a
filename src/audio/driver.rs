//! Real-time driver for the playback schedulers
//!
//! The schedulers run on a virtual millisecond clock. A single driver thread
//! owns both of them and moves their clocks forward to wall-clock time,
//! sleeping until the earliest armed timer or the next command. Every
//! mutation happens on this thread.

use super::player::AudioPlayerHandle;
use crate::display::TerminalKeyboard;
use anyhow::{anyhow, Result};
use chordtrainer_core::scheduler::PracticeScheduler;
use chordtrainer_core::types::{SongBook, SongChart, StyleLibrary, TrainerSettings};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

pub type Scheduler = PracticeScheduler<AudioPlayerHandle, TerminalKeyboard>;

/// Wake-up period while nothing is scheduled
const IDLE_POLL: Duration = Duration::from_millis(250);

/// The song loaded into the song session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NowPlaying {
    pub chart: SongChart,
    pub transpose: i32,
}

/// Everything the driver thread owns
pub struct Sessions {
    pub practice: Scheduler,
    pub song: Scheduler,
    pub songbook: SongBook,
    pub now_playing: Option<NowPlaying>,
    pub audio: AudioPlayerHandle,
}

impl Sessions {
    pub fn new(
        audio: AudioPlayerHandle,
        settings: TrainerSettings,
        library: StyleLibrary,
        seed: Option<u64>,
    ) -> Self {
        let mut practice_display = TerminalKeyboard::new("practice");
        practice_display.set_slash_notation(settings.slash_notation);
        let mut practice =
            PracticeScheduler::new(audio.clone(), practice_display, settings.clone())
                .with_library(library);
        let mut song = PracticeScheduler::new(audio.clone(), TerminalKeyboard::new("song"), settings);
        if let Some(seed) = seed {
            practice = practice.with_seed(seed);
            song = song.with_seed(seed);
        }

        Self {
            practice,
            song,
            songbook: SongBook::builtin(),
            now_playing: None,
            audio,
        }
    }

    fn advance_to(&mut self, now: u64) {
        self.practice.advance_to(now);
        self.song.advance_to(now);
    }

    fn next_deadline(&self) -> Option<u64> {
        match (self.practice.next_deadline(), self.song.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Load `chart` into the song session and start it.
    ///
    /// The song keeps the practice session's toggles but plays at the
    /// chart's tempo and meter. Each chord fills one measure and the count-in
    /// is one measure long.
    pub fn play_song(&mut self, chart: SongChart, transpose: i32) -> Result<()> {
        let progression = chart.progression(transpose)?;
        let practice = self.practice.settings();
        let settings = TrainerSettings {
            key: chart.transposed_key(transpose),
            bpm: chart.bpm,
            time_signature: chart.time_signature,
            chord_per_measure: true,
            lead_in_beats: chart.time_signature.beats as u32,
            practice_beats: false,
            regenerate_each_cycle: false,
            ..practice.clone()
        };
        let slash = settings.slash_notation;
        *self.song.settings_mut() = settings;
        self.song.highlighter_mut().set_slash_notation(slash);
        self.song.start_song(progression)?;
        tracing::debug!(title = %chart.title, transpose, "song started");
        self.now_playing = Some(NowPlaying { chart, transpose });
        Ok(())
    }

    pub fn stop_song(&mut self) {
        self.song.stop();
    }

    fn shutdown(&mut self) {
        self.practice.stop();
        self.song.stop();
    }
}

type Job = Box<dyn FnOnce(&mut Sessions) + Send>;

enum DriverCommand {
    Run(Job),
    Shutdown,
}

/// Handle to the driver thread. Dropping it stops playback and joins the
/// thread.
pub struct Driver {
    command_tx: Sender<DriverCommand>,
    thread: Option<JoinHandle<()>>,
}

impl Driver {
    pub fn spawn(sessions: Sessions) -> Result<Self> {
        let (command_tx, command_rx) = bounded(64);
        let thread = thread::Builder::new()
            .name("playback-driver".into())
            .spawn(move || DriverThread::new(sessions, command_rx).run())
            .map_err(|e| anyhow!("Failed to spawn playback driver: {}", e))?;

        Ok(Driver {
            command_tx,
            thread: Some(thread),
        })
    }

    /// Run `f` on the driver thread with the clocks brought up to date, and
    /// wait for its result
    pub fn with<R, F>(&self, f: F) -> Result<R>
    where
        R: Send + 'static,
        F: FnOnce(&mut Sessions) -> R + Send + 'static,
    {
        let (reply_tx, reply_rx) = bounded(1);
        let job: Job = Box::new(move |sessions| {
            let _ = reply_tx.send(f(sessions));
        });
        self.command_tx
            .send(DriverCommand::Run(job))
            .map_err(|_| anyhow!("playback driver has shut down"))?;
        reply_rx
            .recv()
            .map_err(|_| anyhow!("playback driver dropped the request"))
    }
}

impl Drop for Driver {
    fn drop(&mut self) {
        let _ = self.command_tx.send(DriverCommand::Shutdown);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

struct DriverThread {
    sessions: Sessions,
    command_rx: Receiver<DriverCommand>,
    origin: Instant,
}

impl DriverThread {
    fn new(sessions: Sessions, command_rx: Receiver<DriverCommand>) -> Self {
        Self {
            sessions,
            command_rx,
            origin: Instant::now(),
        }
    }

    fn elapsed_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }

    fn pump(&mut self) -> u64 {
        let now = self.elapsed_ms();
        self.sessions.advance_to(now);
        now
    }

    fn run(mut self) {
        loop {
            let now = self.pump();
            let timeout = self
                .sessions
                .next_deadline()
                .map(|deadline| Duration::from_millis(deadline.saturating_sub(now)))
                .unwrap_or(IDLE_POLL);

            match self.command_rx.recv_timeout(timeout) {
                Ok(DriverCommand::Run(job)) => {
                    self.pump();
                    job(&mut self.sessions);
                }
                Ok(DriverCommand::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => {}
            }
        }
        self.sessions.shutdown();
        tracing::debug!("playback driver stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chordtrainer_core::scheduler::Phase;
    use chordtrainer_core::types::TimeSignature;

    fn sessions() -> Sessions {
        let settings = TrainerSettings {
            sound: false,
            metronome: false,
            lead_in_beats: 0,
            ..TrainerSettings::default()
        };
        Sessions::new(AudioPlayerHandle::detached(), settings, StyleLibrary::builtin(), Some(3))
    }

    #[test]
    fn test_jobs_run_on_driver_thread() {
        let driver = Driver::spawn(sessions()).unwrap();
        let name = driver
            .with(|_| thread::current().name().map(str::to_string))
            .unwrap();
        assert_eq!(name.as_deref(), Some("playback-driver"));
    }

    #[test]
    fn test_practice_session_advances_in_real_time() {
        let driver = Driver::spawn(sessions()).unwrap();
        driver
            .with(|s| {
                let settings = s.practice.settings_mut();
                settings.bpm = 240;
                settings.time_signature = TimeSignature { beats: 3, unit: 4 };
                settings.chord_per_measure = true;
                s.practice.start()
            })
            .unwrap()
            .unwrap();
        assert_eq!(
            driver.with(|s| s.practice.phase()).unwrap(),
            Phase::Playing {
                index: 0,
                repetition: 1
            }
        );

        // Three 250 ms beats per chord
        thread::sleep(Duration::from_millis(1_000));
        let phase = driver.with(|s| s.practice.phase()).unwrap();
        assert!(
            matches!(phase, Phase::Playing { index, repetition: 1 } if index >= 1),
            "{:?}",
            phase
        );
    }

    #[test]
    fn test_song_runs_beside_practice() {
        let driver = Driver::spawn(sessions()).unwrap();
        driver
            .with(|s| {
                s.practice.start()?;
                let chart = s.songbook.songs()[0].clone();
                s.play_song(chart, 2)
            })
            .unwrap()
            .unwrap();
        let (practice, song, transpose) = driver
            .with(|s| {
                (
                    s.practice.is_running(),
                    s.song.is_running(),
                    s.now_playing.as_ref().map(|playing| playing.transpose),
                )
            })
            .unwrap();
        assert!(practice && song);
        assert_eq!(transpose, Some(2));
    }

    #[test]
    fn test_song_counts_in_one_measure_of_its_meter() {
        let driver = Driver::spawn(sessions()).unwrap();
        let (phase, settings) = driver
            .with(|s| {
                let chart = s.songbook.find("amazing").unwrap().clone();
                s.play_song(chart, 0)?;
                anyhow::Ok((s.song.phase(), s.song.settings().clone()))
            })
            .unwrap()
            .unwrap();
        assert_eq!(phase, Phase::LeadIn { remaining: 3 });
        assert!(settings.chord_per_measure);
        assert_eq!(settings.time_signature, TimeSignature { beats: 3, unit: 4 });
        assert_eq!(settings.bpm, 80);
    }

    #[test]
    fn test_drop_stops_sessions() {
        let driver = Driver::spawn(sessions()).unwrap();
        driver.with(|s| s.practice.start()).unwrap().unwrap();
        drop(driver);
    }
}
