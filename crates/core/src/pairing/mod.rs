//! Randomised assignment of tones to pair values and pair values to slots.
//!
//! Both steps use rejection sampling over a uniform integer draw, which gives
//! uniform permutation semantics: every ordering of the tones and every
//! partition of the slots into pairs is equally likely.

use std::collections::HashSet;

use rand::Rng;

use crate::{
    tones::{Tone, CATALOG_LEN, CHROMATIC_TONES},
    Result, ToneMemoryError,
};

/// The randomised layout of one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pairing {
    slot_values: Vec<usize>,
    tones: Vec<Tone>,
}

impl Pairing {
    /// Draws a fresh tone order and slot assignment for `active` tones.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R, active: &[Tone]) -> Result<Self> {
        if active.is_empty() || active.len() > CATALOG_LEN {
            return Err(ToneMemoryError::Configuration {
                pair_count: active.len(),
            });
        }

        let tones = sample_tones(rng, active);
        let slot_values = assign_slots(rng, tones.len());
        Ok(Self { slot_values, tones })
    }

    pub fn pair_count(&self) -> usize {
        self.tones.len()
    }

    /// Pair value held by every slot, indexed by slot.
    pub fn slot_values(&self) -> &[usize] {
        &self.slot_values
    }

    /// Tone bound to each pair value for this session.
    pub fn tones(&self) -> &[Tone] {
        &self.tones
    }

    pub fn tone_for_value(&self, pair_value: usize) -> Option<Tone> {
        self.tones.get(pair_value).copied()
    }

    pub fn tone_for_slot(&self, slot: usize) -> Option<Tone> {
        self.slot_values
            .get(slot)
            .and_then(|&value| self.tone_for_value(value))
    }
}

/// Picks which catalog tone each pair value stands for.
///
/// The candidates are the catalog entries present in `active`, kept in
/// catalog order; the result draws every candidate exactly once so the pair
/// value order never mirrors the catalog order.
pub fn sample_tones<R: Rng + ?Sized>(rng: &mut R, active: &[Tone]) -> Vec<Tone> {
    let candidates: Vec<Tone> = CHROMATIC_TONES
        .iter()
        .copied()
        .filter(|tone| active.contains(tone))
        .collect();
    let count = active.len().min(candidates.len());

    let mut taken = HashSet::with_capacity(count);
    let mut tones = Vec::with_capacity(count);
    while tones.len() < count {
        let index = rng.gen_range(0..candidates.len());
        if taken.insert(index) {
            tones.push(candidates[index]);
        }
    }
    tones
}

/// Places every pair value `0..pair_count` on two distinct, unclaimed slots.
pub fn assign_slots<R: Rng + ?Sized>(rng: &mut R, pair_count: usize) -> Vec<usize> {
    let len = pair_count * 2;
    let mut slots: Vec<Option<usize>> = vec![None; len];

    for value in 0..pair_count {
        let (first, second) = loop {
            let first = rng.gen_range(0..len);
            let second = rng.gen_range(0..len);
            if first != second && slots[first].is_none() && slots[second].is_none() {
                break (first, second);
            }
        };
        slots[first] = Some(value);
        slots[second] = Some(value);
    }

    // Every slot is claimed once all `pair_count` values are placed.
    slots.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tones::lookup;
    use rand::SeedableRng;
    use rand_pcg::Pcg64;

    fn rng(seed: u64) -> Pcg64 {
        Pcg64::seed_from_u64(seed)
    }

    #[test]
    fn every_value_lands_on_exactly_two_slots() {
        let mut rng = rng(7);
        for pairs in 1..=CATALOG_LEN {
            let slots = assign_slots(&mut rng, pairs);
            assert_eq!(slots.len(), pairs * 2);
            for value in 0..pairs {
                let hits = slots.iter().filter(|&&v| v == value).count();
                assert_eq!(hits, 2, "value {value} with {pairs} pairs");
            }
        }
    }

    #[test]
    fn single_pair_fills_both_slots() {
        let mut rng = rng(1);
        assert_eq!(assign_slots(&mut rng, 1), vec![0, 0]);

        let a = lookup("A").unwrap();
        let pairing = Pairing::generate(&mut rng, &[a]).unwrap();
        assert_eq!(pairing.pair_count(), 1);
        assert_eq!(pairing.tones(), &[a]);
        assert_eq!(pairing.tone_for_slot(1), Some(a));
    }

    #[test]
    fn sampled_tones_are_a_permutation_of_the_active_set() {
        let mut rng = rng(42);
        let active: Vec<Tone> = ["E", "A", "C#/Db", "G"]
            .iter()
            .map(|name| lookup(name).unwrap())
            .collect();

        let mut sampled = sample_tones(&mut rng, &active);
        assert_eq!(sampled.len(), active.len());
        sampled.sort_by_key(|tone| tone.semitone_offset);
        let mut expected = active.clone();
        expected.sort_by_key(|tone| tone.semitone_offset);
        assert_eq!(sampled, expected);
    }

    #[test]
    fn tone_order_is_not_fixed() {
        let mut rng = rng(3);
        let first_tones: HashSet<&str> = (0..64)
            .map(|_| sample_tones(&mut rng, &CHROMATIC_TONES)[0].name)
            .collect();
        assert!(first_tones.len() > 6, "saw {first_tones:?}");
    }

    #[test]
    fn slot_positions_are_roughly_uniform() {
        // Slot 0 should share its pair value with each other slot about
        // equally often.
        let mut rng = rng(11);
        let pairs = 4;
        let rounds = 7_000;
        let mut partner_counts = [0usize; 8];
        for _ in 0..rounds {
            let slots = assign_slots(&mut rng, pairs);
            let partner = (1..8).find(|&i| slots[i] == slots[0]).unwrap();
            partner_counts[partner] += 1;
        }
        let expected = rounds / 7;
        for &count in &partner_counts[1..] {
            assert!(count.abs_diff(expected) < expected / 5, "{partner_counts:?}");
        }
    }

    #[test]
    fn rejects_empty_and_oversized_sets() {
        let mut rng = rng(0);
        assert!(matches!(
            Pairing::generate(&mut rng, &[]),
            Err(ToneMemoryError::Configuration { pair_count: 0 })
        ));
        let too_many: Vec<Tone> = CHROMATIC_TONES.iter().chain(CHROMATIC_TONES.iter()).copied().collect();
        assert!(Pairing::generate(&mut rng, &too_many).is_err());
    }
}
