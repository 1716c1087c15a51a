//! Song mode commands (song list, song play, song stop, song transpose)

use crate::commands::{CommandContext, CommandResult};
use chordtrainer_core::types::song::interval_between;
use chordtrainer_core::types::{Key, SongBook, SongChart};
use colored::*;

fn find_song(songbook: &SongBook, query: &str) -> Option<SongChart> {
    match query.parse::<usize>() {
        Ok(number) => songbook.get(number.checked_sub(1)?).cloned(),
        Err(_) => songbook.find(query).cloned(),
    }
}

/// Handle `song list`
pub fn cmd_song_list(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    let listing = ctx.with(|s| {
        let mut out = format!("{}\n", "Songs:".green());
        for (i, chart) in s.songbook.songs().iter().enumerate() {
            out.push_str(&format!(
                "  {:>2}. {} ({}, {}, {} BPM)\n",
                i + 1,
                chart.title.cyan(),
                chart.key,
                chart.time_signature,
                chart.bpm
            ));
        }
        out
    });
    match listing {
        Ok(listing) => CommandResult::Message(listing.trim_end().to_string()),
        Err(e) => CommandResult::Error(e),
    }
}

/// Handle `song play <number | title>`
pub fn cmd_song_play(args: &str, ctx: &mut CommandContext) -> CommandResult {
    if args.is_empty() {
        return CommandResult::Error("Usage: song play <number | title>".to_string());
    }
    let query = args.to_string();
    ctx.report(move |s| {
        let chart = find_song(&s.songbook, &query)
            .ok_or_else(|| format!("No song matches '{}'. Type `song list`.", query))?;
        let title = chart.title.clone();
        let key = chart.key;
        s.play_song(chart, 0).map_err(|e| e.to_string())?;
        Ok::<_, String>(format!("{} {} in {}", "▶ Playing".bright_green(), title, key))
    })
}

/// Handle `song stop`
pub fn cmd_song_stop(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    match ctx.with(|s| s.stop_song()) {
        Ok(()) => CommandResult::Message("⏹ Song stopped".to_string()),
        Err(e) => CommandResult::Error(e),
    }
}

/// Semitones from `+2`/`-3`, or the shift that brings `original` to a key
fn parse_transpose(args: &str, original: Key) -> Result<i32, String> {
    if let Ok(semitones) = args.trim_start_matches('+').parse::<i32>() {
        return Ok(semitones.clamp(-11, 11));
    }
    let target = args
        .parse::<Key>()
        .map_err(|e| format!("Expected semitones or a key: {}", e))?;
    Ok(interval_between(original.root, target.root))
}

/// Handle `song transpose <semitones | key>`; restarts the current song
pub fn cmd_song_transpose(args: &str, ctx: &mut CommandContext) -> CommandResult {
    if args.is_empty() {
        return match ctx.with(|s| s.now_playing.as_ref().map(|playing| playing.transpose)) {
            Ok(Some(semitones)) => CommandResult::Message(format!("transpose: {:+}", semitones)),
            Ok(None) => CommandResult::Message("No song loaded".to_string()),
            Err(e) => CommandResult::Error(e),
        };
    }
    let args = args.to_string();
    ctx.report(move |s| {
        let chart = s
            .now_playing
            .as_ref()
            .map(|playing| playing.chart.clone())
            .ok_or_else(|| "No song loaded. Use `song play` first.".to_string())?;
        let semitones = parse_transpose(&args, chart.key)?;
        let key = chart.transposed_key(semitones);
        s.play_song(chart, semitones).map_err(|e| e.to_string())?;
        Ok::<_, String>(format!("Transposed {:+} to {}", semitones, key))
    })
}
