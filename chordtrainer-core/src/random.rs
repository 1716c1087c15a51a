//! Small helpers for the weighted choices the generator and parser make

use rand::Rng;
use std::collections::BTreeSet;

/// True with probability `p`
pub fn chance<R: Rng + ?Sized>(rng: &mut R, p: f64) -> bool {
    rng.gen_bool(p.clamp(0.0, 1.0))
}

/// Uniform pick from an ordered set; `None` when the set is empty
pub fn choose_from<T: Copy, R: Rng + ?Sized>(items: &BTreeSet<T>, rng: &mut R) -> Option<T> {
    if items.is_empty() {
        return None;
    }
    items.iter().nth(rng.gen_range(0..items.len())).copied()
}

/// Uniform pick from a slice; `None` when the slice is empty
pub fn choose_slice<T: Copy, R: Rng + ?Sized>(items: &[T], rng: &mut R) -> Option<T> {
    if items.is_empty() {
        return None;
    }
    Some(items[rng.gen_range(0..items.len())])
}
