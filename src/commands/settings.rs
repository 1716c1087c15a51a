//! Commands that read or change the practice settings.
//!
//! Changes take effect at the next chord transition of a running session.

use crate::commands::{CommandContext, CommandResult};
use chordtrainer_core::types::settings::{MAX_BPM, MAX_LEAD_IN_BEATS, MAX_LENGTH, MIN_BPM};
use chordtrainer_core::types::{
    ChordType, Inversion, Key, NoteValue, TimeSignature, TrainerSettings, RANDOM_STYLE,
};
use colored::*;
use std::collections::BTreeSet;
use std::str::FromStr;

/// Show the current value when `args` is empty, otherwise parse and store it
fn get_or_set<T, F, G>(args: &str, ctx: &mut CommandContext, label: &str, get: G, set: F) -> CommandResult
where
    T: FromStr + Send + 'static,
    T::Err: std::fmt::Display,
    G: FnOnce(&TrainerSettings) -> String + Send + 'static,
    F: FnOnce(&mut TrainerSettings, T) -> Result<String, String> + Send + 'static,
{
    if args.is_empty() {
        return match ctx.with(move |s| get(s.practice.settings())) {
            Ok(value) => CommandResult::Message(format!("{}: {}", label, value)),
            Err(e) => CommandResult::Error(e),
        };
    }
    let value = match args.parse::<T>() {
        Ok(value) => value,
        Err(e) => return CommandResult::Error(format!("Invalid {}: {}", label, e)),
    };
    ctx.report(move |s| set(s.practice.settings_mut(), value))
}

/// Handle `key [name]`
pub fn cmd_key(args: &str, ctx: &mut CommandContext) -> CommandResult {
    get_or_set::<Key, _, _>(
        args,
        ctx,
        "key",
        |settings| settings.key.to_string(),
        |settings, key| {
            settings.key = key;
            Ok(format!("🎹 Key set to {}", key).bright_green().to_string())
        },
    )
}

/// Handle `bpm [n]`
pub fn cmd_bpm(args: &str, ctx: &mut CommandContext) -> CommandResult {
    get_or_set::<u32, _, _>(
        args,
        ctx,
        "tempo",
        |settings| format!("{} BPM", settings.bpm),
        |settings, bpm| {
            if !(MIN_BPM..=MAX_BPM).contains(&bpm) {
                return Err(format!(
                    "Invalid tempo. Use a value between {}-{} BPM",
                    MIN_BPM, MAX_BPM
                ));
            }
            settings.bpm = bpm;
            Ok(format!("🎵 Tempo set to {} BPM", bpm).bright_green().to_string())
        },
    )
}

/// Handle `time [beats/unit]`
pub fn cmd_time(args: &str, ctx: &mut CommandContext) -> CommandResult {
    get_or_set::<TimeSignature, _, _>(
        args,
        ctx,
        "time signature",
        |settings| settings.time_signature.to_string(),
        |settings, time_signature| {
            settings.time_signature = time_signature;
            Ok(format!("Time signature set to {}", time_signature))
        },
    )
}

/// Handle `note [whole|half|quarter|eighth]`
pub fn cmd_note(args: &str, ctx: &mut CommandContext) -> CommandResult {
    get_or_set::<NoteValue, _, _>(
        args,
        ctx,
        "note value",
        |settings| settings.note_value.to_string(),
        |settings, note_value| {
            settings.note_value = note_value;
            Ok(format!("Each chord now lasts a {} note", note_value))
        },
    )
}

/// Handle `length [n]`
pub fn cmd_length(args: &str, ctx: &mut CommandContext) -> CommandResult {
    get_or_set::<usize, _, _>(
        args,
        ctx,
        "length",
        |settings| format!("{} chords", settings.length),
        |settings, length| {
            if length == 0 || length > MAX_LENGTH {
                return Err(format!("Length must be between 1 and {}", MAX_LENGTH));
            }
            settings.length = length;
            Ok(format!("Progressions will have {} chords", length))
        },
    )
}

/// Handle `leadin [beats]`
pub fn cmd_leadin(args: &str, ctx: &mut CommandContext) -> CommandResult {
    get_or_set::<u32, _, _>(
        args,
        ctx,
        "lead-in",
        |settings| format!("{} beats", settings.lead_in_beats),
        |settings, beats| {
            if beats > MAX_LEAD_IN_BEATS {
                return Err(format!("Lead-in must be 0-{} beats", MAX_LEAD_IN_BEATS));
            }
            settings.lead_in_beats = beats;
            Ok(format!("Lead-in set to {} beats", beats))
        },
    )
}

fn parse_selection<T>(args: &str, all: &[T]) -> Result<BTreeSet<T>, String>
where
    T: FromStr + Ord + Copy,
    T::Err: std::fmt::Display,
{
    if args.eq_ignore_ascii_case("all") {
        return Ok(all.iter().copied().collect());
    }
    args.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|item| !item.is_empty())
        .map(|item| item.parse::<T>().map_err(|e| e.to_string()))
        .collect()
}

fn list<T: std::fmt::Display>(items: &BTreeSet<T>) -> String {
    if items.is_empty() {
        return "(none)".to_string();
    }
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Handle `types [all | type...]`
pub fn cmd_types(args: &str, ctx: &mut CommandContext) -> CommandResult {
    if args.is_empty() {
        return match ctx.with(|s| list(&s.practice.settings().selected_types)) {
            Ok(types) => CommandResult::Message(format!("chord types: {}", types)),
            Err(e) => CommandResult::Error(e),
        };
    }
    let types = match parse_selection(args, &ChordType::ALL) {
        Ok(types) => types,
        Err(e) => return CommandResult::Error(e),
    };
    ctx.report(move |s| {
        let message = format!("chord types: {}", list(&types));
        s.practice.settings_mut().selected_types = types;
        Ok::<_, String>(message)
    })
}

/// Handle `inversions [all | inversion...]`
pub fn cmd_inversions(args: &str, ctx: &mut CommandContext) -> CommandResult {
    if args.is_empty() {
        return match ctx.with(|s| list(&s.practice.settings().selected_inversions)) {
            Ok(inversions) => CommandResult::Message(format!("inversions: {}", inversions)),
            Err(e) => CommandResult::Error(e),
        };
    }
    let inversions = match parse_selection(args, &Inversion::SELECTABLE) {
        Ok(inversions) => inversions,
        Err(e) => return CommandResult::Error(e),
    };
    if inversions.contains(&Inversion::Third) {
        return CommandResult::Error("Third inversion only comes from /7 chords".to_string());
    }
    ctx.report(move |s| {
        let message = format!("inversions: {}", list(&inversions));
        s.practice.settings_mut().selected_inversions = inversions;
        Ok::<_, String>(message)
    })
}

/// Handle `style [name | random]`
pub fn cmd_style(args: &str, ctx: &mut CommandContext) -> CommandResult {
    if args.is_empty() {
        return match ctx.with(|s| s.practice.settings().style.clone()) {
            Ok(style) => CommandResult::Message(format!("style: {}", style)),
            Err(e) => CommandResult::Error(e),
        };
    }
    let name = args.to_string();
    ctx.report(move |s| {
        if name.eq_ignore_ascii_case(RANDOM_STYLE) {
            s.practice.settings_mut().style = RANDOM_STYLE.to_string();
            return Ok(format!("style: {}", RANDOM_STYLE));
        }
        let Some((canonical, pattern)) = s
            .practice
            .library()
            .canonical_name(&name)
            .and_then(|canonical| {
                let pattern = s.practice.library().get(canonical)?.clone();
                Some((canonical.to_string(), pattern))
            })
        else {
            return Err(format!("Unknown style '{}'. Type `styles` to list them.", name));
        };
        let settings = s.practice.settings_mut();
        settings.apply_style(&canonical, &pattern);
        Ok(format!(
            "style: {} ({} chords, {} BPM, {} notes)",
            canonical, settings.length, settings.bpm, settings.note_value
        ))
    })
}

/// Handle `styles`
pub fn cmd_styles(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    let listing = ctx.with(|s| {
        let current = s.practice.settings().style.clone();
        let mut out = format!("{}\n", "Styles:".green());
        let marker = |name: &str| if name.eq_ignore_ascii_case(&current) { "*" } else { " " };
        out.push_str(&format!(
            " {} {}\n",
            marker(RANDOM_STYLE),
            "Random (theory-driven walk)".cyan()
        ));
        for (name, pattern) in s.practice.library().iter() {
            let fixed = if pattern.allows_variation() { "" } else { " [fixed]" };
            out.push_str(&format!(
                " {} {} - {}{}\n",
                marker(name),
                name.cyan(),
                pattern.pattern.join(" "),
                fixed.dimmed()
            ));
        }
        out
    });
    match listing {
        Ok(listing) => CommandResult::Message(listing.trim_end().to_string()),
        Err(e) => CommandResult::Error(e),
    }
}

/// Handle `toggle <step|practice|metronome|arpeggiate|slash|sound|regen>`
pub fn cmd_toggle(args: &str, ctx: &mut CommandContext) -> CommandResult {
    let name = args.to_lowercase();
    ctx.report(move |s| {
        let settings = s.practice.settings_mut();
        let (label, flag) = match name.as_str() {
            "step" => ("step mode", &mut settings.step_mode),
            "practice" => ("practice beats", &mut settings.practice_beats),
            "metronome" => ("metronome", &mut settings.metronome),
            "arpeggiate" | "arp" => ("arpeggiate", &mut settings.arpeggiate),
            "slash" => ("slash notation", &mut settings.slash_notation),
            "sound" => ("sound", &mut settings.sound),
            "regen" => ("regenerate each cycle", &mut settings.regenerate_each_cycle),
            _ => {
                return Err(
                    "Usage: toggle <step|practice|metronome|arpeggiate|slash|sound|regen>"
                        .to_string(),
                )
            }
        };
        *flag = !*flag;
        let on = *flag;
        let slash = settings.slash_notation;
        s.practice.highlighter_mut().set_slash_notation(slash);
        Ok(format!("{}: {}", label, if on { "on" } else { "off" }))
    })
}

/// Handle `volume [0-100]`
pub fn cmd_volume(args: &str, ctx: &mut CommandContext) -> CommandResult {
    if args.is_empty() {
        return match ctx.with(|s| s.audio.volume()) {
            Ok(volume) => CommandResult::Message(format!("volume: {:.0}%", volume * 100.0)),
            Err(e) => CommandResult::Error(e),
        };
    }
    match args.trim_end_matches('%').parse::<f32>() {
        Ok(percent) if (0.0..=100.0).contains(&percent) => {
            ctx.report(move |s| {
                s.audio
                    .set_volume(percent / 100.0)
                    .map(|_| format!("🔊 Volume set to {:.0}%", percent))
            })
        }
        _ => CommandResult::Error("Invalid volume. Use a value between 0-100".to_string()),
    }
}

/// Handle `settings`
pub fn cmd_settings(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    match ctx.with(|s| describe(s.practice.settings())) {
        Ok(text) => CommandResult::Message(text),
        Err(e) => CommandResult::Error(e),
    }
}

fn describe(settings: &TrainerSettings) -> String {
    let flag = |on: bool| if on { "on".green() } else { "off".dimmed() };
    let rows = [
        ("key", settings.key.to_string()),
        ("style", settings.style.clone()),
        ("length", settings.length.to_string()),
        ("tempo", format!("{} BPM", settings.bpm)),
        ("time", settings.time_signature.to_string()),
        ("note value", settings.note_value.to_string()),
        ("lead-in", format!("{} beats", settings.lead_in_beats)),
        ("chord types", list(&settings.selected_types)),
        ("inversions", list(&settings.selected_inversions)),
        ("step mode", flag(settings.step_mode).to_string()),
        ("practice beats", flag(settings.practice_beats).to_string()),
        ("metronome", flag(settings.metronome).to_string()),
        ("arpeggiate", flag(settings.arpeggiate).to_string()),
        ("slash notation", flag(settings.slash_notation).to_string()),
        ("sound", flag(settings.sound).to_string()),
        ("regenerate", flag(settings.regenerate_each_cycle).to_string()),
    ];
    rows.iter()
        .map(|(label, value)| format!("  {:<15} {}", label.bright_blue(), value))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::context;

    fn settings(ctx: &CommandContext) -> TrainerSettings {
        ctx.with(|s| s.practice.settings().clone()).unwrap()
    }

    #[test]
    fn test_bpm_range() {
        let mut ctx = context();
        assert!(matches!(cmd_bpm("120", &mut ctx), CommandResult::Message(_)));
        assert_eq!(settings(&ctx).bpm, 120);
        assert!(matches!(cmd_bpm("10", &mut ctx), CommandResult::Error(_)));
        assert!(matches!(cmd_bpm("fast", &mut ctx), CommandResult::Error(_)));
        assert_eq!(settings(&ctx).bpm, 120);
    }

    #[test]
    fn test_key_time_and_note() {
        let mut ctx = context();
        cmd_key("F# minor", &mut ctx);
        cmd_time("6/8", &mut ctx);
        cmd_note("half", &mut ctx);
        let settings = settings(&ctx);
        assert_eq!(settings.key, "F#m".parse::<Key>().unwrap());
        assert_eq!(settings.time_signature, TimeSignature::new(6, 8).unwrap());
        assert_eq!(settings.note_value, NoteValue::HALF);
    }

    #[test]
    fn test_types_and_inversions() {
        let mut ctx = context();
        cmd_types("major, dom7 sus4", &mut ctx);
        assert_eq!(
            settings(&ctx).selected_types,
            [ChordType::Major, ChordType::Dominant7, ChordType::Sus4]
                .into_iter()
                .collect()
        );
        cmd_inversions("all", &mut ctx);
        assert_eq!(settings(&ctx).selected_inversions.len(), 3);
        assert!(matches!(cmd_inversions("third", &mut ctx), CommandResult::Error(_)));
        assert!(matches!(cmd_types("ninth", &mut ctx), CommandResult::Error(_)));
    }

    #[test]
    fn test_style_adopts_suggestions() {
        let mut ctx = context();
        assert!(matches!(cmd_style("jazz ii-v-i", &mut ctx), CommandResult::Message(_)));
        let applied = settings(&ctx);
        assert_eq!(applied.style, "Jazz ii-V-I");
        assert!(matches!(cmd_style("polka", &mut ctx), CommandResult::Error(_)));
        cmd_style("random", &mut ctx);
        assert!(settings(&ctx).is_random_style());
    }

    #[test]
    fn test_toggle_flips_flags() {
        let mut ctx = context();
        cmd_toggle("arpeggiate", &mut ctx);
        cmd_toggle("slash", &mut ctx);
        cmd_toggle("metronome", &mut ctx);
        let toggled = settings(&ctx);
        assert!(toggled.arpeggiate);
        assert!(toggled.slash_notation);
        assert!(toggled.metronome);
        assert!(matches!(cmd_toggle("lasers", &mut ctx), CommandResult::Error(_)));
    }

    #[test]
    fn test_volume_percent() {
        let mut ctx = context();
        cmd_volume("25%", &mut ctx);
        let volume = ctx.with(|s| s.audio.volume()).unwrap();
        assert!((volume - 0.25).abs() < 1e-6);
        assert!(matches!(cmd_volume("120", &mut ctx), CommandResult::Error(_)));
    }

    #[test]
    fn test_length_and_leadin_limits() {
        let mut ctx = context();
        assert!(matches!(cmd_length("0", &mut ctx), CommandResult::Error(_)));
        assert!(matches!(cmd_length("8", &mut ctx), CommandResult::Message(_)));
        assert!(matches!(cmd_leadin("40", &mut ctx), CommandResult::Error(_)));
        let applied = settings(&ctx);
        assert_eq!(applied.length, 8);
        assert_eq!(applied.lead_in_beats, 0);
    }
}
