//! Command registry for REPL commands
//!
//! Every line typed at the prompt is matched against registered prefixes,
//! longest first. Handlers talk to the playback driver through
//! [`CommandContext`].

pub mod general;
pub mod practice;
pub mod settings;
pub mod song;

use crate::audio::driver::{Driver, Sessions};
use std::path::PathBuf;

/// Result of executing a command
#[derive(Debug, PartialEq)]
pub enum CommandResult {
    /// Command executed successfully, continue REPL
    Success,
    /// Command executed, show this message
    Message(String),
    /// Exit the REPL
    Exit,
    /// No command matched
    NotACommand,
    /// Error occurred
    Error(String),
    /// Watch a pattern file for changes
    Watch(PathBuf),
}

/// Context passed to command handlers
pub struct CommandContext {
    pub driver: Driver,
    /// Pattern file last loaded or saved, reused when no path is given
    pub patterns_path: Option<PathBuf>,
}

impl CommandContext {
    pub fn new(driver: Driver, patterns_path: Option<PathBuf>) -> Self {
        Self {
            driver,
            patterns_path,
        }
    }

    /// Run `f` on the driver thread, turning a dead driver into an error
    pub fn with<R, F>(&self, f: F) -> Result<R, String>
    where
        R: Send + 'static,
        F: FnOnce(&mut Sessions) -> R + Send + 'static,
    {
        self.driver.with(f).map_err(|e| e.to_string())
    }

    /// Run a fallible job and render its outcome
    pub fn report<E, F>(&self, f: F) -> CommandResult
    where
        E: std::fmt::Display + Send + 'static,
        F: FnOnce(&mut Sessions) -> Result<String, E> + Send + 'static,
    {
        match self.with(f) {
            Ok(Ok(message)) if message.is_empty() => CommandResult::Success,
            Ok(Ok(message)) => CommandResult::Message(message),
            Ok(Err(e)) => CommandResult::Error(e.to_string()),
            Err(e) => CommandResult::Error(e),
        }
    }
}

/// A command handler function
pub type CommandHandler = fn(&str, &mut CommandContext) -> CommandResult;

/// Registry of available commands
pub struct CommandRegistry {
    /// Sorted by prefix length, longest first
    commands: Vec<(String, CommandHandler)>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    pub fn register(&mut self, prefix: &str, handler: CommandHandler) {
        self.commands.push((prefix.to_string(), handler));
        self.commands.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
    }

    /// Execute a command, returning NotACommand if no match found
    pub fn execute(&self, input: &str, ctx: &mut CommandContext) -> CommandResult {
        match self.lookup(input) {
            Some((handler, args)) => handler(args, ctx),
            None => CommandResult::NotACommand,
        }
    }

    /// Matching handler and its argument text
    fn lookup<'a>(&self, input: &'a str) -> Option<(CommandHandler, &'a str)> {
        let input = input.trim();
        self.commands.iter().find_map(|(prefix, handler)| {
            let rest = input.strip_prefix(prefix.as_str())?;
            if rest.is_empty() || rest.starts_with(' ') {
                Some((*handler, rest.trim()))
            } else {
                None
            }
        })
    }

    pub fn list_commands(&self) -> Vec<&str> {
        self.commands.iter().map(|(p, _)| p.as_str()).collect()
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a fully populated command registry with all built-in commands
pub fn create_registry() -> CommandRegistry {
    let mut registry = CommandRegistry::new();

    // Practice session
    registry.register("start", practice::cmd_start);
    registry.register("stop", practice::cmd_stop);
    registry.register("step", practice::cmd_step);
    registry.register("rewind", practice::cmd_rewind);
    registry.register("generate", practice::cmd_generate);
    registry.register("show", practice::cmd_show);

    // Settings
    registry.register("key", settings::cmd_key);
    registry.register("bpm", settings::cmd_bpm);
    registry.register("time", settings::cmd_time);
    registry.register("note", settings::cmd_note);
    registry.register("length", settings::cmd_length);
    registry.register("types", settings::cmd_types);
    registry.register("inversions", settings::cmd_inversions);
    registry.register("style", settings::cmd_style);
    registry.register("styles", settings::cmd_styles);
    registry.register("leadin", settings::cmd_leadin);
    registry.register("toggle", settings::cmd_toggle);
    registry.register("volume", settings::cmd_volume);
    registry.register("settings", settings::cmd_settings);

    // Song mode
    registry.register("song list", song::cmd_song_list);
    registry.register("song play", song::cmd_song_play);
    registry.register("song stop", song::cmd_song_stop);
    registry.register("song transpose", song::cmd_song_transpose);

    // General
    registry.register("patterns load", general::cmd_patterns_load);
    registry.register("patterns save", general::cmd_patterns_save);
    registry.register("watch", general::cmd_watch);
    registry.register("help", general::cmd_help);
    registry.register("quit", general::cmd_quit);
    registry.register("exit", general::cmd_quit);

    registry
}
