//! General REPL commands (patterns, watch, help, quit)

use crate::commands::{CommandContext, CommandResult};
use crate::config::default_patterns_path;
use anyhow::{anyhow, Context, Result};
use chordtrainer_core::types::StyleLibrary;
use colored::*;
use std::path::{Path, PathBuf};

/// Merge the styles in `path` into the practice library. Returns how many
/// styles were read.
pub fn load_patterns(ctx: &mut CommandContext, path: &Path) -> Result<usize> {
    let loaded = StyleLibrary::load(path)?;
    let count = loaded.len();
    ctx.driver.with(move |s| s.practice.library_mut().merge(loaded))?;
    ctx.patterns_path = Some(path.to_path_buf());
    tracing::debug!(path = %path.display(), count, "patterns loaded");
    Ok(count)
}

fn resolve_path(args: &str, ctx: &CommandContext) -> Option<PathBuf> {
    if args.is_empty() {
        ctx.patterns_path.clone().or_else(default_patterns_path)
    } else {
        Some(PathBuf::from(args))
    }
}

/// Handle `patterns load [file]`
pub fn cmd_patterns_load(args: &str, ctx: &mut CommandContext) -> CommandResult {
    let Some(path) = resolve_path(args, ctx) else {
        return CommandResult::Error("Usage: patterns load <file>".to_string());
    };
    match load_patterns(ctx, &path) {
        Ok(count) => CommandResult::Message(format!(
            "{} Loaded {} styles from {}",
            "✓".bright_green(),
            count,
            path.display()
        )),
        Err(e) => CommandResult::Error(format!("{:#}", e)),
    }
}

fn save_patterns(ctx: &mut CommandContext, path: &Path) -> Result<usize> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let library = ctx.driver.with(|s| s.practice.library().clone())?;
    library.save(path)?;
    ctx.patterns_path = Some(path.to_path_buf());
    Ok(library.len())
}

/// Handle `patterns save [file]`
pub fn cmd_patterns_save(args: &str, ctx: &mut CommandContext) -> CommandResult {
    let result = resolve_path(args, ctx)
        .ok_or_else(|| anyhow!("no config directory; give a file name"))
        .and_then(|path| save_patterns(ctx, &path).map(|count| (count, path)));
    match result {
        Ok((count, path)) => CommandResult::Message(format!(
            "{} Saved {} styles to {}",
            "✓".bright_green(),
            count,
            path.display()
        )),
        Err(e) => CommandResult::Error(format!("{:#}", e)),
    }
}

/// Handle `watch [file]`
pub fn cmd_watch(args: &str, ctx: &mut CommandContext) -> CommandResult {
    let path = if args.is_empty() {
        ctx.patterns_path.clone()
    } else {
        Some(PathBuf::from(args))
    };
    match path {
        Some(path) => CommandResult::Watch(path),
        None => CommandResult::Error("Usage: watch <patterns file>".to_string()),
    }
}

/// Handle `help`
pub fn cmd_help(_args: &str, _ctx: &mut CommandContext) -> CommandResult {
    print_help();
    CommandResult::Success
}

/// Handle `quit` or `exit`
pub fn cmd_quit(_args: &str, _ctx: &mut CommandContext) -> CommandResult {
    CommandResult::Exit
}

fn print_help() {
    let section = |title: &str| println!("\n{}", title.green());
    let row = |command: &str, text: &str| println!("  {:<28} {}", command.cyan(), text);

    println!("{}", "🎹 Chord Trainer Help".bold());
    println!("{}", "====================".bold());

    section("Practice:");
    row("start", "Generate a progression and play it");
    row("stop", "Stop playback (the progression is kept)");
    row("step", "Advance one chord or repetition (turns on step mode)");
    row("rewind", "Go back one chord, or restart the current one");
    row("generate", "Make a new progression without playing it");
    row("show", "Show the current progression");

    section("Settings:");
    row("key [C | Am | F# minor]", "Key for generated progressions");
    row("bpm [30-240]", "Tempo");
    row("time [4/4 | 3/4 | 6/8]", "Time signature");
    row("note [whole|half|quarter|eighth]", "How long each chord lasts");
    row("length [1-32]", "Chords per progression");
    row("types [all | major minor dom7 ...]", "Chord types to draw from");
    row("inversions [all | root first second]", "Inversions to draw from");
    row("style [name | random]", "Use a progression style");
    row("styles", "List styles");
    row("leadin [0-16]", "Count-in beats before the first chord");
    row("toggle <flag>", "step practice metronome arpeggiate slash sound regen");
    row("volume [0-100]", "Output volume");
    row("settings", "Show every setting");

    section("Songs:");
    row("song list", "List the song charts");
    row("song play <n | title>", "Play a song");
    row("song transpose <+n | key>", "Move the current song");
    row("song stop", "Stop the song");

    section("Patterns:");
    row("patterns load [file]", "Merge styles from a JSON file");
    row("patterns save [file]", "Write all styles to a JSON file");
    row("watch [file]", "Reload a patterns file whenever it changes");

    section("General:");
    row("help", "Show this help");
    row("quit | exit", "Leave the trainer");
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::context;

    #[test]
    fn test_save_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("styles").join("patterns.json");
        let mut ctx = context();

        let saved = cmd_patterns_save(path.to_str().unwrap(), &mut ctx);
        assert!(matches!(saved, CommandResult::Message(_)), "{:?}", saved);
        assert_eq!(ctx.patterns_path.as_deref(), Some(path.as_path()));

        let count = load_patterns(&mut ctx, &path).unwrap();
        assert_eq!(count, StyleLibrary::builtin().len());
    }

    #[test]
    fn test_loaded_styles_become_selectable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mine.json");
        std::fs::write(
            &path,
            r#"{ "Four Chords Reversed": { "pattern": ["IV", "vi", "V", "I"], "length": 4, "tempo": 96, "beatsPerChord": 4 } }"#,
        )
        .unwrap();

        let mut ctx = context();
        assert_eq!(load_patterns(&mut ctx, &path).unwrap(), 1);
        let found = ctx
            .with(|s| s.practice.library().get("four chords reversed").is_some())
            .unwrap();
        assert!(found);
    }

    #[test]
    fn test_load_reports_bad_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        let mut ctx = context();
        let result = cmd_patterns_load(path.to_str().unwrap(), &mut ctx);
        assert!(matches!(result, CommandResult::Error(_)));
        assert_eq!(ctx.patterns_path, None);
    }

    #[test]
    fn test_watch_needs_a_file() {
        let mut ctx = context();
        assert!(matches!(cmd_watch("", &mut ctx), CommandResult::Error(_)));
        assert_eq!(
            cmd_watch("styles.json", &mut ctx),
            CommandResult::Watch(PathBuf::from("styles.json"))
        );
    }
}
