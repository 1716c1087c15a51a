//! Top-voice smoothness between consecutive chords
//!
//! The trainer only tracks the melodic line heard on top of the right hand,
//! approximated per inversion by [`Chord::top_note`]. Choosing the inversion
//! whose top note moves the least keeps generated progressions singable.

use crate::random::choose_slice;
use crate::types::chord::{Chord, Inversion};
use rand::Rng;
use std::collections::BTreeSet;

/// Semitone movement of the top voice from `from` to `to` (0-6)
pub fn top_voice_motion(from: &Chord, to: &Chord) -> u8 {
    from.top_note().circular_distance(to.top_note())
}

/// Selected inversions of `target` whose top note is closest to `previous`
pub fn closest_inversions(
    previous: &Chord,
    target: &Chord,
    selected: &BTreeSet<Inversion>,
) -> Vec<Inversion> {
    let scored: Vec<(Inversion, u8)> = selected
        .iter()
        .map(|&inversion| {
            let candidate = target.with_inversion(inversion);
            (inversion, top_voice_motion(previous, &candidate))
        })
        .collect();

    let best = match scored.iter().map(|&(_, distance)| distance).min() {
        Some(best) => best,
        None => return Vec::new(),
    };

    scored
        .into_iter()
        .filter(|&(_, distance)| distance == best)
        .map(|(inversion, _)| inversion)
        .collect()
}

/// Pick the smoothest selected inversion, breaking ties at random
pub fn smoothest_inversion<R: Rng + ?Sized>(
    previous: &Chord,
    target: &Chord,
    selected: &BTreeSet<Inversion>,
    rng: &mut R,
) -> Option<Inversion> {
    choose_slice(&closest_inversions(previous, target, selected), rng)
}
