//! Named progression styles and the pattern-file format
//!
//! A style is a cyclic list of Roman-numeral tokens plus suggested length,
//! tempo and chord duration. The pattern file is a JSON object keyed by
//! style name:
//!
//! ```json
//! { "Pop": { "pattern": ["I", "V", "vi", "IV"], "length": 4,
//!            "tempo": 100, "beatsPerChord": 4, "varychord": "no" } }
//! ```
//!
//! `Random` is not stored in the library; it selects the rule-based walk.

use crate::error::TrainerError;
use crate::parser::RomanNumeral;
use std::collections::BTreeMap;

/// Name of the pseudo-style that generates from harmonic rules
pub const RANDOM_STYLE: &str = "Random";

/// Whether a style lets inversions and chord qualities vary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum VaryChord {
    Yes,
    No,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct StylePattern {
    pub pattern: Vec<String>,
    pub length: usize,
    pub tempo: u32,
    pub beats_per_chord: u32,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub varychord: Option<VaryChord>,
}

impl StylePattern {
    pub fn new(pattern: &[&str], length: usize, tempo: u32, beats_per_chord: u32) -> Self {
        StylePattern {
            pattern: pattern.iter().map(|token| token.to_string()).collect(),
            length,
            tempo,
            beats_per_chord,
            varychord: None,
        }
    }

    pub fn fixed(mut self) -> Self {
        self.varychord = Some(VaryChord::No);
        self
    }

    /// Absent `varychord` allows variation
    pub fn allows_variation(&self) -> bool {
        self.varychord != Some(VaryChord::No)
    }

    /// A pattern only drives generation when it has tokens and a length
    pub fn is_playable(&self) -> bool {
        !self.pattern.is_empty() && self.length > 0
    }

    /// Token for progression slot `position`, repeating the pattern cyclically
    pub fn token_at(&self, position: usize) -> Option<&str> {
        if self.pattern.is_empty() {
            return None;
        }
        Some(self.pattern[position % self.pattern.len()].as_str())
    }
}

/// Style name → pattern
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct StyleLibrary {
    styles: BTreeMap<String, StylePattern>,
}

impl StyleLibrary {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The styles that ship with the trainer
    pub fn builtin() -> Self {
        let mut library = Self::empty();
        library.insert("Pop", StylePattern::new(&["I", "V", "vi", "IV"], 4, 100, 4));
        library.insert("Fifties", StylePattern::new(&["I", "vi", "IV", "V"], 4, 90, 4));
        library.insert(
            "Canon",
            StylePattern::new(&["I", "V", "vi", "iii", "IV", "I", "IV", "V"], 8, 80, 2),
        );
        library.insert(
            "Jazz ii-V-I",
            StylePattern::new(&["ii7", "V7", "Imaj7", "Imaj7"], 4, 120, 4).fixed(),
        );
        library.insert(
            "Minor ii-V-i",
            StylePattern::new(&["iiø7", "V7", "i", "i"], 4, 110, 4).fixed(),
        );
        library.insert(
            "Blues",
            StylePattern::new(
                &[
                    "I7", "I7", "I7", "I7", "IV7", "IV7", "I7", "I7", "V7", "IV7", "I7", "V7",
                ],
                12,
                110,
                4,
            )
            .fixed(),
        );
        library.insert(
            "Andalusian",
            StylePattern::new(&["i", "bVII", "bVI", "V"], 4, 90, 4),
        );
        library.insert(
            "Secondary Dominants",
            StylePattern::new(&["I", "V7/vi", "vi", "V7/V", "V7", "I", "IV", "V7"], 8, 100, 4)
                .fixed(),
        );
        library.insert(
            "Modal Mixture",
            StylePattern::new(&["I", "iv", "bVI", "bVII"], 4, 90, 2),
        );
        library.insert(
            "Royal Road",
            StylePattern::new(&["IVmaj7", "V7", "iii7", "vi"], 4, 95, 2),
        );
        library
    }

    pub fn insert(&mut self, name: impl Into<String>, pattern: StylePattern) {
        self.styles.insert(name.into(), pattern);
    }

    pub fn remove(&mut self, name: &str) -> Option<StylePattern> {
        self.styles.remove(name)
    }

    /// Case-insensitive lookup
    pub fn get(&self, name: &str) -> Option<&StylePattern> {
        self.styles.get(name).or_else(|| {
            self.styles
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, pattern)| pattern)
        })
    }

    /// Canonical stored name for a case-insensitive query
    pub fn canonical_name(&self, name: &str) -> Option<&str> {
        if name.eq_ignore_ascii_case(RANDOM_STYLE) {
            return Some(RANDOM_STYLE);
        }
        self.styles
            .keys()
            .find(|key| key.eq_ignore_ascii_case(name))
            .map(String::as_str)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.styles.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &StylePattern)> {
        self.styles.iter().map(|(name, pattern)| (name.as_str(), pattern))
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    /// Add every style from `other`, replacing styles with the same name.
    /// Returns how many styles were added or replaced.
    pub fn merge(&mut self, other: StyleLibrary) -> usize {
        let count = other.styles.len();
        self.styles.extend(other.styles);
        count
    }

    /// Check every token of every style parses as a Roman numeral
    pub fn validate(&self) -> Result<(), (String, TrainerError)> {
        for (name, style) in &self.styles {
            for (position, token) in style.pattern.iter().enumerate() {
                if let Err(source) = RomanNumeral::parse(token) {
                    return Err((
                        name.clone(),
                        TrainerError::Parse {
                            position,
                            token: token.clone(),
                            source,
                        },
                    ));
                }
            }
        }
        Ok(())
    }
}

#[cfg(feature = "serde")]
mod persist {
    use super::StyleLibrary;
    use anyhow::{anyhow, Context, Result};
    use std::path::Path;

    impl StyleLibrary {
        /// Parse a pattern file, rejecting styles with unparsable tokens
        pub fn from_json(json: &str) -> Result<Self> {
            let library: StyleLibrary =
                serde_json::from_str(json).context("Failed to parse pattern file")?;
            library
                .validate()
                .map_err(|(name, err)| anyhow!("style '{}': {}", name, err))?;
            Ok(library)
        }

        pub fn to_json(&self) -> Result<String> {
            serde_json::to_string_pretty(self).context("Failed to serialize patterns")
        }

        pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
            let path = path.as_ref();
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read pattern file {}", path.display()))?;
            Self::from_json(&json).with_context(|| format!("In {}", path.display()))
        }

        pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
            let path = path.as_ref();
            std::fs::write(path, self.to_json()?)
                .with_context(|| format!("Failed to write pattern file {}", path.display()))
        }
    }
}
