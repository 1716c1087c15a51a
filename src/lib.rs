//! # Chord Trainer
//!
//! Terminal front end for `chordtrainer-core`: a cpal synthesizer as the
//! tone generator, an ASCII keyboard as the highlighter, a driver thread
//! that runs the playback schedulers in real time, and a REPL to control
//! it all.
//!
//! ## Modules
//!
//! - `audio`: envelopes, voices, the output stream and the playback driver
//! - `commands`: the REPL command registry and its handlers
//! - `config`: TOML configuration with environment overrides
//! - `display`: keyboard, progression and beat rendering
//! - `repl`: the interactive prompt and pattern-file watching

pub mod audio;
pub mod commands;
pub mod config;
pub mod display;
pub mod repl;

pub use crate::config::AppConfig;
pub use crate::repl::{start, Repl, ReplOptions};
