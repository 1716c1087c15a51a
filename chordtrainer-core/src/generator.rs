//! Progression generation
//!
//! Two paths produce a [`Progression`]:
//!
//! - **Fixed styles** repeat a Roman-numeral pattern up to the requested
//!   length, resolving each token in the active key.
//! - **Random** walks scale degrees through a functional-harmony transition
//!   table, decorates some degrees with sevenths and suspensions, and picks
//!   inversions that keep the top voice moving by small steps.
//!
//! Every chord on the random path has a type and inversion from the user's
//! selection.

use crate::error::{ConfigError, Result, TrainerError};
use crate::parser::{ResolveOptions, RomanNumeral};
use crate::random::{chance, choose_from, choose_slice};
use crate::types::chord::{Chord, ChordType, Inversion};
use crate::types::key::{Key, Mode};
use crate::types::progression::Progression;
use crate::types::settings::TrainerSettings;
use crate::types::style::{StyleLibrary, StylePattern};
use crate::types::voice_leading::smoothest_inversion;
use rand::Rng;
use std::collections::BTreeSet;

/// Likely next degrees, indexed by the previous degree
/// (I→IV V vi, ii→V vii°, iii→vi IV, IV→V I, V→I vi, vi→IV ii, vii°→I)
const TRANSITIONS: [&[u8]; 7] = [&[3, 4, 5], &[4, 6], &[5, 3], &[4, 0], &[0, 5], &[3, 1], &[0]];

const FOLLOW_TRANSITION: f64 = 0.8;
const VOICE_LEAD: f64 = 0.7;

/// Probabilistic quality overrides, checked independently in this order
const EMBELLISHMENTS: [Embellishment; 6] = [
    Embellishment { degree: 4, major_key_only: false, chance: 0.7, chord_type: ChordType::Dominant7 },
    Embellishment { degree: 0, major_key_only: true, chance: 0.3, chord_type: ChordType::Major7 },
    Embellishment { degree: 5, major_key_only: false, chance: 0.3, chord_type: ChordType::Minor7 },
    Embellishment { degree: 4, major_key_only: false, chance: 0.15, chord_type: ChordType::Sus4 },
    Embellishment { degree: 1, major_key_only: false, chance: 0.15, chord_type: ChordType::Sus2 },
    Embellishment { degree: 2, major_key_only: false, chance: 0.1, chord_type: ChordType::Augmented },
];

struct Embellishment {
    degree: u8,
    major_key_only: bool,
    chance: f64,
    chord_type: ChordType,
}

/// What to generate; borrowed from the settings at call time
#[derive(Debug, Clone, Copy)]
pub struct GeneratorRequest<'a> {
    pub key: Key,
    pub length: usize,
    pub selected_types: &'a BTreeSet<ChordType>,
    pub selected_inversions: &'a BTreeSet<Inversion>,
    pub style: &'a str,
    pub random_style: bool,
}

impl<'a> From<&'a TrainerSettings> for GeneratorRequest<'a> {
    fn from(settings: &'a TrainerSettings) -> Self {
        GeneratorRequest {
            key: settings.key,
            length: settings.length,
            selected_types: &settings.selected_types,
            selected_inversions: &settings.selected_inversions,
            style: &settings.style,
            random_style: settings.is_random_style(),
        }
    }
}

impl GeneratorRequest<'_> {
    fn options(&self, vary: bool) -> ResolveOptions<'_> {
        ResolveOptions {
            vary,
            selected_types: self.selected_types,
            selected_inversions: self.selected_inversions,
        }
    }
}

/// Generate a progression for `request`
pub fn generate<R: Rng + ?Sized>(
    request: &GeneratorRequest<'_>,
    library: &StyleLibrary,
    rng: &mut R,
) -> Result<Progression> {
    if request.selected_inversions.is_empty() {
        return Err(ConfigError::NoInversions.into());
    }

    let fixed = if request.random_style {
        None
    } else {
        let style = library
            .get(request.style)
            .ok_or_else(|| ConfigError::UnknownStyle(request.style.to_string()))?;
        Some(style).filter(|style| style.is_playable())
    };

    let progression = match fixed {
        Some(style) => from_pattern(request, style, rng)?,
        None => {
            if request.selected_types.is_empty() {
                return Err(ConfigError::NoChordTypes.into());
            }
            random_walk(request, rng)
        }
    };

    tracing::debug!(
        style = request.style,
        key = %request.key,
        progression = %progression,
        "generated progression"
    );
    Ok(progression)
}

/// Repeat a style's pattern cyclically up to the requested length
pub fn from_pattern<R: Rng + ?Sized>(
    request: &GeneratorRequest<'_>,
    style: &StylePattern,
    rng: &mut R,
) -> Result<Progression> {
    let options = request.options(style.allows_variation());
    let mut progression = Progression::new();

    for position in 0..request.length {
        let Some(token) = style.token_at(position) else {
            break;
        };
        let numeral = RomanNumeral::parse(token).map_err(|source| TrainerError::Parse {
            position,
            token: token.to_string(),
            source,
        })?;
        progression.push(numeral.resolve(&request.key, &options, rng));
    }

    Ok(progression)
}

/// Rule-based walk over scale degrees
pub fn random_walk<R: Rng + ?Sized>(request: &GeneratorRequest<'_>, rng: &mut R) -> Progression {
    let mut progression = Progression::new();
    if request.length == 0 {
        return progression;
    }

    progression.push(tonic_chord(request, rng));

    while progression.len() < request.length {
        let previous = match progression.last() {
            Some(chord) => *chord,
            None => break,
        };
        let degree = next_degree(previous.degree_index, rng);
        progression.push(chord_on_degree(request, degree, &previous, rng));
    }

    progression
}

fn tonic_chord<R: Rng + ?Sized>(request: &GeneratorRequest<'_>, rng: &mut R) -> Chord {
    let tonic_type = match request.key.mode {
        Mode::Major => ChordType::Major,
        Mode::Minor => ChordType::Minor,
    };
    let chord_type = selected_or_substitute(tonic_type, request.selected_types, rng);
    let inversion = choose_from(request.selected_inversions, rng).unwrap_or(Inversion::Root);

    Chord::new(request.key.root, chord_type)
        .with_inversion(inversion)
        .with_degree(0)
        .with_spelling(request.key.spelling)
}

/// Next scale degree after `previous`.
///
/// A chord without a degree (a secondary dominant) continues as if from
/// the tonic, which is also the tonic's own row.
pub fn next_degree<R: Rng + ?Sized>(previous: Option<u8>, rng: &mut R) -> u8 {
    if chance(rng, FOLLOW_TRANSITION) {
        let row = TRANSITIONS[previous.unwrap_or(0) as usize % 7];
        choose_slice(row, rng).unwrap_or(0)
    } else {
        rng.gen_range(0..7)
    }
}

fn chord_on_degree<R: Rng + ?Sized>(
    request: &GeneratorRequest<'_>,
    degree: u8,
    previous: &Chord,
    rng: &mut R,
) -> Chord {
    let key = &request.key;
    let mut chord_type = selected_or_substitute(key.degree_quality(degree), request.selected_types, rng);

    for embellishment in &EMBELLISHMENTS {
        if embellishment.degree != degree
            || (embellishment.major_key_only && key.is_minor())
            || !request.selected_types.contains(&embellishment.chord_type)
        {
            continue;
        }
        if chance(rng, embellishment.chance) {
            chord_type = embellishment.chord_type;
        }
    }

    let chord = Chord::new(key.degree_root(degree), chord_type)
        .with_degree(degree)
        .with_spelling(key.spelling);

    let inversion = if chance(rng, VOICE_LEAD) {
        smoothest_inversion(previous, &chord, request.selected_inversions, rng)
    } else {
        choose_from(request.selected_inversions, rng)
    };

    chord.with_inversion(inversion.unwrap_or(Inversion::Root))
}

fn selected_or_substitute<R: Rng + ?Sized>(
    chord_type: ChordType,
    selected: &BTreeSet<ChordType>,
    rng: &mut R,
) -> ChordType {
    if selected.contains(&chord_type) {
        chord_type
    } else {
        choose_from(selected, rng).unwrap_or(chord_type)
    }
}
