//! Interactive prompt for the chord trainer

use crate::audio::driver::{Driver, Sessions};
use crate::audio::player::{AudioPlayer, AudioPlayerHandle};
use crate::commands::general::load_patterns;
use crate::commands::{create_registry, CommandContext, CommandRegistry, CommandResult};
use crate::config::AppConfig;
use crate::repl::watcher::FileWatcher;
use anyhow::{anyhow, Context, Result};
use chordtrainer_core::types::StyleLibrary;
use colored::*;
use crossbeam_channel::{unbounded, Receiver, Sender};
use notify::{Event, EventKind};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::Path;
use std::thread;

pub mod watcher;

/// Startup switches from the command line
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplOptions {
    pub no_audio: bool,
    pub seed: Option<u64>,
}

/// Interactive REPL driving the practice and song sessions
pub struct Repl {
    editor: Option<DefaultEditor>,
    registry: CommandRegistry,
    ctx: CommandContext,
    /// Keeps the output stream open
    _audio: Option<AudioPlayer>,

    tx_input: Sender<Result<String, ReadlineError>>,
    rx_input: Receiver<Result<String, ReadlineError>>,
    tx_watcher: Sender<notify::Result<Event>>,
    rx_watcher: Receiver<notify::Result<Event>>,
    watcher: Option<FileWatcher>,
}

fn open_audio(options: ReplOptions) -> (Option<AudioPlayer>, AudioPlayerHandle) {
    if options.no_audio {
        return (None, AudioPlayerHandle::detached());
    }
    match AudioPlayer::open() {
        Ok(player) => {
            let handle = player.handle();
            (Some(player), handle)
        }
        Err(e) => {
            tracing::warn!("audio unavailable, continuing silently: {:#}", e);
            (None, AudioPlayerHandle::detached())
        }
    }
}

impl Repl {
    pub fn new(config: AppConfig, options: ReplOptions) -> Result<Self> {
        let editor = DefaultEditor::new().context("Failed to initialize line editor")?;
        let (audio, handle) = open_audio(options);
        handle.set_volume(config.volume)?;

        let mut library = StyleLibrary::builtin();
        if let Some(path) = &config.patterns_path {
            let loaded = StyleLibrary::load(path)?;
            library.merge(loaded);
        }
        config
            .settings
            .validate(&library)
            .context("invalid trainer settings")?;

        let sessions = Sessions::new(handle, config.settings, library, options.seed);
        let ctx = CommandContext::new(Driver::spawn(sessions)?, config.patterns_path);

        let (tx_input, rx_input) = unbounded();
        let (tx_watcher, rx_watcher) = unbounded();

        Ok(Repl {
            editor: Some(editor),
            registry: create_registry(),
            ctx,
            _audio: audio,
            tx_input,
            rx_input,
            tx_watcher,
            rx_watcher,
            watcher: None,
        })
    }

    pub fn run(&mut self) -> Result<()> {
        println!(
            "{} {}",
            "🎹".bright_yellow(),
            "Chord Progression Trainer".bright_cyan().bold()
        );
        println!(
            "Type {} to play, {} to step through, {} for everything else, {} to leave.\n",
            "start".cyan(),
            "step".cyan(),
            "help".bright_green(),
            "quit".bright_red()
        );

        let mut editor = self
            .editor
            .take()
            .ok_or_else(|| anyhow!("REPL is already running"))?;
        let tx_input = self.tx_input.clone();

        thread::spawn(move || loop {
            let prompt = format!("{} ", "chords>".bright_magenta().bold());
            match editor.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim().to_string();
                    if !line.is_empty() {
                        let _ = editor.add_history_entry(&line);
                    }
                    if tx_input.send(Ok(line)).is_err() {
                        break;
                    }
                }
                Err(err) => {
                    let _ = tx_input.send(Err(err));
                    break;
                }
            }
        });

        loop {
            crossbeam_channel::select! {
                recv(self.rx_input) -> msg => match msg {
                    Ok(Ok(line)) => {
                        if !self.handle_line(&line) {
                            break;
                        }
                    }
                    Ok(Err(ReadlineError::Interrupted)) | Ok(Err(ReadlineError::Eof)) => {
                        println!("{} 🎹", "Goodbye!".bright_cyan());
                        break;
                    }
                    Ok(Err(err)) => {
                        println!(
                            "{} {}",
                            "Error reading input:".bright_red().bold(),
                            err.to_string().red()
                        );
                        break;
                    }
                    Err(_) => break,
                },

                recv(self.rx_watcher) -> msg => match msg {
                    Ok(Ok(event)) => self.handle_file_event(event),
                    Ok(Err(e)) => println!("{} Watch error: {}", "Error:".red(), e),
                    Err(_) => break,
                }
            }
        }

        Ok(())
    }

    /// Execute one line. Returns false when the REPL should exit.
    fn handle_line(&mut self, line: &str) -> bool {
        if line.is_empty() {
            return true;
        }
        match self.registry.execute(line, &mut self.ctx) {
            CommandResult::Success => {}
            CommandResult::Message(msg) => println!("{}", msg),
            CommandResult::Exit => {
                println!("{} 🎹", "Goodbye!".bright_cyan());
                return false;
            }
            CommandResult::Error(e) => println!("{} {}", "Error:".bright_red().bold(), e.red()),
            CommandResult::Watch(path) => self.watch(&path),
            CommandResult::NotACommand => println!(
                "{} Unknown command '{}'. Type {} for a list.",
                "?".yellow(),
                line,
                "help".bright_green()
            ),
        }
        true
    }

    fn watch(&mut self, path: &Path) {
        if self.watcher.is_none() {
            match FileWatcher::new(self.tx_watcher.clone()) {
                Ok(w) => self.watcher = Some(w),
                Err(e) => {
                    println!("{} Failed to create watcher: {}", "Error:".red(), e);
                    return;
                }
            }
        }
        let Some(watcher) = &mut self.watcher else {
            return;
        };
        if let Err(e) = watcher.watch(path) {
            println!("{} Failed to watch {}: {}", "Error:".red(), path.display(), e);
            return;
        }
        println!(
            "{} Watching {} for changes...",
            "👀".bright_cyan(),
            path.display().to_string().bright_green()
        );
        self.reload(path);
    }

    fn handle_file_event(&mut self, event: Event) {
        if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
            return;
        }
        for path in event.paths {
            println!("{} File changed: {}", "⚡".bright_yellow(), path.display());
            self.reload(&path);
        }
    }

    fn reload(&mut self, path: &Path) {
        match load_patterns(&mut self.ctx, path) {
            Ok(count) => println!("{} Reloaded {} styles", "✓".bright_green(), count),
            Err(e) => println!("{} {:#}", "Error:".red(), e),
        }
    }
}

/// Build a REPL from `config` and run it until the user quits
pub fn start(config: AppConfig, options: ReplOptions) -> Result<()> {
    let mut repl = Repl::new(config, options)?;
    repl.run()
}
