//! Practice-session commands (start, stop, step, rewind, generate, show)

use crate::commands::{CommandContext, CommandResult};
use colored::*;

/// Handle `start`
pub fn cmd_start(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    ctx.report(|s| {
        s.practice.start()?;
        let settings = s.practice.settings();
        Ok::<_, chordtrainer_core::TrainerError>(format!(
            "{} {} in {} at {} BPM",
            "▶ Playing".bright_green(),
            s.practice.progression(),
            settings.key,
            settings.bpm
        ))
    })
}

/// Handle `stop`
pub fn cmd_stop(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    match ctx.with(|s| s.practice.stop()) {
        Ok(()) => CommandResult::Message("⏹ Stopped".to_string()),
        Err(e) => CommandResult::Error(e),
    }
}

/// Handle `step`
pub fn cmd_step(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    ctx.report(|s| {
        s.practice.step()?;
        Ok::<_, chordtrainer_core::TrainerError>(String::new())
    })
}

/// Handle `rewind`
pub fn cmd_rewind(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    match ctx.with(|s| {
        s.practice.rewind();
        s.practice.progression().is_empty()
    }) {
        Ok(true) => CommandResult::Message("Nothing to rewind yet. Try `generate`.".to_string()),
        Ok(false) => CommandResult::Success,
        Err(e) => CommandResult::Error(e),
    }
}

/// Handle `generate`
pub fn cmd_generate(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    ctx.report(|s| {
        let progression = s.practice.regenerate()?;
        Ok::<_, chordtrainer_core::TrainerError>(format!("🎲 {}", progression))
    })
}

/// Handle `show`
pub fn cmd_show(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    let summary = ctx.with(|s| {
        let slash = s.practice.settings().slash_notation;
        let names = s.practice.progression().names(slash);
        let phase = s.practice.phase();
        let step = s.practice.is_step_mode();
        (names, phase, step)
    });
    let (names, phase, step) = match summary {
        Ok(summary) => summary,
        Err(e) => return CommandResult::Error(e),
    };

    if names.is_empty() {
        return CommandResult::Message("No progression yet. Try `generate` or `start`.".to_string());
    }
    let active = phase.position().map(|(index, _)| index);
    let mut out = crate::display::render_pills(&names, active);
    out.push_str(&format!("\n{} {}", "state:".dimmed(), phase.name()));
    if step {
        out.push_str(" (step mode)");
    }
    CommandResult::Message(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::context;
    use chordtrainer_core::scheduler::Phase;

    #[test]
    fn test_start_then_stop() {
        let mut ctx = context();
        assert!(matches!(cmd_start("", &mut ctx), CommandResult::Message(_)));
        assert!(ctx.with(|s| s.practice.is_running()).unwrap());
        cmd_stop("", &mut ctx);
        assert_eq!(ctx.with(|s| s.practice.phase()).unwrap(), Phase::Idle);
    }

    #[test]
    fn test_start_reports_configuration_errors() {
        let mut ctx = context();
        ctx.with(|s| s.practice.settings_mut().selected_inversions.clear())
            .unwrap();
        match cmd_start("", &mut ctx) {
            CommandResult::Error(message) => assert!(message.contains("inversion"), "{}", message),
            other => panic!("expected an error, got {:?}", other),
        }
        assert!(!ctx.with(|s| s.practice.is_running()).unwrap());
    }

    #[test]
    fn test_step_from_idle_enters_step_mode() {
        let mut ctx = context();
        assert_eq!(cmd_step("", &mut ctx), CommandResult::Success);
        let (phase, step) = ctx
            .with(|s| (s.practice.phase(), s.practice.is_step_mode()))
            .unwrap();
        assert!(step);
        assert_eq!(
            phase,
            Phase::Playing {
                index: 0,
                repetition: 1
            }
        );
    }

    #[test]
    fn test_rewind_with_nothing_generated() {
        let mut ctx = context();
        assert!(matches!(cmd_rewind("", &mut ctx), CommandResult::Message(_)));
        assert_eq!(ctx.with(|s| s.practice.phase()).unwrap(), Phase::Idle);
    }

    #[test]
    fn test_generate_then_show() {
        let mut ctx = context();
        assert!(matches!(cmd_generate("", &mut ctx), CommandResult::Message(_)));
        match cmd_show("", &mut ctx) {
            CommandResult::Message(text) => assert!(text.contains("idle")),
            other => panic!("unexpected {:?}", other),
        }
    }
}
