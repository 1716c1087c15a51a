use chordtrainer_core::generator::{generate, GeneratorRequest};
use chordtrainer_core::parser::{ResolveOptions, RomanNumeral};
use chordtrainer_core::types::chord::{bass_note, intervals_for, start_note};
use chordtrainer_core::types::{
    note_index, ChordType, Inversion, Key, Mode, PitchClass, StyleLibrary, TrainerSettings,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeSet;

fn random_subset<T: Copy + Ord, R: Rng>(items: &[T], rng: &mut R) -> BTreeSet<T> {
    let mut subset: BTreeSet<T> = items.iter().copied().filter(|_| rng.gen_bool(0.5)).collect();
    if subset.is_empty() {
        subset.insert(items[rng.gen_range(0..items.len())]);
    }
    subset
}

#[test]
fn test_random_path_respects_selection() {
    let library = StyleLibrary::builtin();
    let mut rng = StdRng::seed_from_u64(0xC40D);

    for _ in 0..200 {
        let mode = if rng.gen_bool(0.5) { Mode::Major } else { Mode::Minor };
        let settings = TrainerSettings {
            key: Key::new(PitchClass::new(rng.gen_range(0..12)), mode),
            length: rng.gen_range(1..=16),
            selected_types: random_subset(&ChordType::ALL, &mut rng),
            selected_inversions: random_subset(&Inversion::SELECTABLE, &mut rng),
            ..TrainerSettings::default()
        };

        let progression = generate(&GeneratorRequest::from(&settings), &library, &mut rng).unwrap();
        assert_eq!(progression.len(), settings.length);
        for chord in &progression {
            assert!(settings.selected_types.contains(&chord.chord_type), "{:?}", chord);
            assert!(settings.selected_inversions.contains(&chord.inversion), "{:?}", chord);
        }
        assert_eq!(progression[0].root, settings.key.root);
        assert_eq!(progression[0].degree_index, Some(0));
    }
}

#[test]
fn test_generation_is_reproducible_with_seed() {
    let settings = TrainerSettings {
        length: 12,
        selected_types: ChordType::ALL.into_iter().collect(),
        selected_inversions: Inversion::SELECTABLE.into_iter().collect(),
        ..TrainerSettings::default()
    };
    let library = StyleLibrary::builtin();
    let first = generate(&GeneratorRequest::from(&settings), &library, &mut StdRng::seed_from_u64(8)).unwrap();
    let second = generate(&GeneratorRequest::from(&settings), &library, &mut StdRng::seed_from_u64(8)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_embellishments_appear_when_selected() {
    let settings = TrainerSettings {
        length: 32,
        selected_types: ChordType::ALL.into_iter().collect(),
        ..TrainerSettings::default()
    };
    let library = StyleLibrary::builtin();
    let mut rng = StdRng::seed_from_u64(77);

    let mut dominant_sevenths = 0;
    for _ in 0..20 {
        let progression = generate(&GeneratorRequest::from(&settings), &library, &mut rng).unwrap();
        dominant_sevenths += progression
            .chords()
            .iter()
            .filter(|chord| chord.degree_index == Some(4) && chord.chord_type == ChordType::Dominant7)
            .count();
    }
    assert!(dominant_sevenths > 0);
}

#[test]
fn test_triads_only_selection_never_embellishes() {
    let settings = TrainerSettings {
        length: 32,
        selected_types: [ChordType::Major].into_iter().collect(),
        ..TrainerSettings::default()
    };
    let mut rng = StdRng::seed_from_u64(5);
    let progression =
        generate(&GeneratorRequest::from(&settings), &StyleLibrary::builtin(), &mut rng).unwrap();
    assert!(progression.chords().iter().all(|c| c.chord_type == ChordType::Major));
}

#[test]
fn test_enharmonic_pairs() {
    for (sharp, flat) in [("C#", "Db"), ("D#", "Eb"), ("F#", "Gb"), ("G#", "Ab"), ("A#", "Bb")] {
        assert_eq!(note_index(sharp), note_index(flat));
    }
}

#[test]
fn test_bass_note_follows_start_rule_for_every_shape() {
    let inversions = [Inversion::Root, Inversion::First, Inversion::Second, Inversion::Third];
    for root in 0..12 {
        let root = PitchClass::new(root);
        for chord_type in ChordType::ALL {
            for inversion in inversions {
                assert_eq!(intervals_for(chord_type, inversion)[0], 0);
                let start = start_note(root, chord_type, inversion, 1);
                assert_eq!(bass_note(root, chord_type, inversion), PitchClass::new(start));
            }
        }
    }
}

#[test]
fn test_numeral_examples_in_c() {
    let key: Key = "C".parse().unwrap();
    let types: BTreeSet<ChordType> = ChordType::ALL.into_iter().collect();
    let inversions: BTreeSet<Inversion> = [Inversion::Root].into_iter().collect();
    let options = ResolveOptions {
        vary: false,
        selected_types: &types,
        selected_inversions: &inversions,
    };
    let mut rng = StdRng::seed_from_u64(0);
    let resolve = |token: &str, rng: &mut StdRng| {
        RomanNumeral::parse(token).unwrap().resolve(&key, &options, rng)
    };

    let tonic = resolve("I", &mut rng);
    assert_eq!((tonic.chord_type, tonic.degree_index), (ChordType::Major, Some(0)));

    let dominant = resolve("V7", &mut rng);
    assert_eq!((dominant.chord_type, dominant.degree_index), (ChordType::Dominant7, Some(4)));

    assert_eq!(resolve("bVII", &mut rng).root.index(), 10);

    let secondary = resolve("V/V", &mut rng);
    assert_eq!(secondary.root, note_index("D"));
    assert_eq!(secondary.chord_type, ChordType::Dominant7);
}
