//! Startup configuration: built-in defaults, then the TOML file, then
//! environment overrides

use anyhow::{anyhow, Context, Result};
use chordtrainer_core::types::settings::MAX_LEAD_IN_BEATS;
use chordtrainer_core::types::{ChordType, Inversion, Key, NoteValue, TimeSignature, TrainerSettings};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "chordtrainer";
const CONFIG_FILE_NAME: &str = "config.toml";
const PATTERNS_FILE_NAME: &str = "patterns.json";
const ENV_CONFIG_PATH: &str = "CHORDTRAINER_CONFIG";
const ENV_BPM: &str = "CHORDTRAINER_BPM";
const ENV_KEY: &str = "CHORDTRAINER_KEY";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub settings: TrainerSettings,
    /// Style pattern file merged over the built-in styles
    pub patterns_path: Option<PathBuf>,
    pub volume: f32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            settings: TrainerSettings::default(),
            patterns_path: None,
            volume: 0.6,
        }
    }
}

impl AppConfig {
    /// Load from `explicit`, else `$CHORDTRAINER_CONFIG`, else the default
    /// location. A missing default file is not an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        Self::load_with(explicit, |name| env::var(name).ok())
    }

    fn load_with(explicit: Option<&Path>, var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => var(ENV_CONFIG_PATH)
                .filter(|value| !value.trim().is_empty())
                .map(PathBuf::from),
        };
        match path {
            Some(path) => {
                let partial = read_partial(&path)?;
                config.apply_partial(partial)?;
            }
            None => {
                if let Some(path) = default_config_path().filter(|path| path.exists()) {
                    let partial = read_partial(&path)?;
                    config.apply_partial(partial)?;
                }
            }
        }

        config.apply_env(var)?;
        config.settings.validate_timing()?;
        tracing::debug!(?config, "configuration loaded");
        Ok(config)
    }

    fn apply_partial(&mut self, partial: PartialConfig) -> Result<()> {
        let settings = &mut self.settings;
        if let Some(key) = partial.key {
            settings.key = parse_key(&key)?;
        }
        if let Some(bpm) = partial.bpm {
            settings.bpm = bpm;
        }
        if let Some(length) = partial.length {
            settings.length = length;
        }
        if let Some(style) = partial.style {
            settings.style = style;
        }
        if let Some(time_signature) = partial.time_signature {
            settings.time_signature = time_signature
                .parse::<TimeSignature>()
                .with_context(|| format!("invalid time_signature {:?}", time_signature))?;
        }
        if let Some(note_value) = partial.note_value {
            settings.note_value = note_value
                .parse::<NoteValue>()
                .with_context(|| format!("invalid note_value {:?}", note_value))?;
        }
        if let Some(beats) = partial.lead_in_beats {
            if beats > MAX_LEAD_IN_BEATS {
                return Err(anyhow!(
                    "lead_in_beats must be at most {}, got {}",
                    MAX_LEAD_IN_BEATS,
                    beats
                ));
            }
            settings.lead_in_beats = beats;
        }
        if let Some(types) = partial.chord_types {
            settings.selected_types = parse_set::<ChordType>(&types, "chord_types")?;
        }
        if let Some(inversions) = partial.inversions {
            settings.selected_inversions = parse_set::<Inversion>(&inversions, "inversions")?;
        }

        let toggles = [
            (partial.step_mode, &mut settings.step_mode),
            (partial.practice_beats, &mut settings.practice_beats),
            (partial.metronome, &mut settings.metronome),
            (partial.arpeggiate, &mut settings.arpeggiate),
            (partial.slash_notation, &mut settings.slash_notation),
            (partial.sound, &mut settings.sound),
            (partial.regenerate_each_cycle, &mut settings.regenerate_each_cycle),
        ];
        for (value, target) in toggles {
            if let Some(value) = value {
                *target = value;
            }
        }

        if let Some(volume) = partial.volume {
            self.volume = volume.clamp(0.0, 1.0);
        }
        if let Some(path) = partial.patterns {
            self.patterns_path = Some(path);
        }
        Ok(())
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(value) = var(ENV_BPM).filter(|value| !value.trim().is_empty()) {
            self.settings.bpm = value
                .trim()
                .parse()
                .with_context(|| format!("{} must be a whole number of BPM", ENV_BPM))?;
        }
        if let Some(value) = var(ENV_KEY).filter(|value| !value.trim().is_empty()) {
            self.settings.key = parse_key(&value).with_context(|| format!("invalid {}", ENV_KEY))?;
        }
        Ok(())
    }
}

pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR))
}

pub fn default_config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
}

/// Where `patterns save` writes when no path is given
pub fn default_patterns_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(PATTERNS_FILE_NAME))
}

fn read_partial(path: &Path) -> Result<PartialConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let partial: PartialConfig =
        toml::from_str(&contents).with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(partial)
}

fn parse_key(text: &str) -> Result<Key> {
    text.parse::<Key>()
        .with_context(|| format!("invalid key {:?}", text))
}

fn parse_set<T>(items: &[String], field: &str) -> Result<BTreeSet<T>>
where
    T: std::str::FromStr + Ord,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    items
        .iter()
        .map(|item| {
            item.parse::<T>()
                .with_context(|| format!("invalid entry {:?} in {}", item, field))
        })
        .collect()
}

#[derive(Debug, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
struct PartialConfig {
    key: Option<String>,
    bpm: Option<u32>,
    length: Option<usize>,
    style: Option<String>,
    time_signature: Option<String>,
    note_value: Option<String>,
    lead_in_beats: Option<u32>,
    chord_types: Option<Vec<String>>,
    inversions: Option<Vec<String>>,
    step_mode: Option<bool>,
    practice_beats: Option<bool>,
    metronome: Option<bool>,
    arpeggiate: Option<bool>,
    slash_notation: Option<bool>,
    sound: Option<bool>,
    regenerate_each_cycle: Option<bool>,
    volume: Option<f32>,
    patterns: Option<PathBuf>,
}
