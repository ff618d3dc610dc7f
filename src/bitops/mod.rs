// src/bitops/mod.rs

//! Single-state transforms of lattice configurations.
//!
//! [`BitOps`] is the capability set the basis engine consumes: cyclic shift by a unit cell,
//! left-right reflection, global flip and the two sublattice flips. Batch versions act in
//! place on slices of state encodings and default to the single-state ones.

use crate::core::{SiteParams, Transform};

/// Bit-operation provider.
///
/// Implementations must be involutive for the reflections and flips, and cyclic with period
/// `L/a` for the shift. A provider that cannot perform a transform reports it through
/// [`BitOps::supports`], and bases needing that transform refuse to build.
pub trait BitOps: Send + Sync {
    /// Name of the local space family, used to refuse appending bases of different families.
    fn family(&self) -> &str;

    /// Whether the provider implements `transform`.
    fn supports(&self, _transform: Transform) -> bool {
        true
    }

    /// Whether the provider implements translations.
    fn supports_shift(&self) -> bool {
        true
    }

    /// Translates the chain by `a` sites: site `i` of the result holds site `i - a` of `state`.
    fn shift_state(&self, state: u64, a: usize, pars: &SiteParams) -> u64;

    /// Maps site `i` to site `L-1-i`.
    fn reflect_state(&self, state: u64, pars: &SiteParams) -> u64;

    /// Flips the local state of every site.
    fn flip_all_state(&self, state: u64, pars: &SiteParams) -> u64;

    /// Flips the local state of the even sites.
    fn flip_sublattice_a_state(&self, state: u64, pars: &SiteParams) -> u64;

    /// Flips the local state of the odd sites.
    fn flip_sublattice_b_state(&self, state: u64, pars: &SiteParams) -> u64;

    /// Applies one point-group transform to a single state.
    fn apply_state(&self, transform: Transform, state: u64, pars: &SiteParams) -> u64 {
        match transform {
            Transform::FlipSublatticeA => self.flip_sublattice_a_state(state, pars),
            Transform::FlipSublatticeB => self.flip_sublattice_b_state(state, pars),
            Transform::FlipAll => self.flip_all_state(state, pars),
            Transform::Reflect => self.reflect_state(state, pars),
            Transform::ReflectFlip => self.flip_all_state(self.reflect_state(state, pars), pars),
        }
    }

    fn shift(&self, states: &mut [u64], a: usize, pars: &SiteParams) {
        for s in states.iter_mut() {
            *s = self.shift_state(*s, a, pars);
        }
    }

    fn reflect(&self, states: &mut [u64], pars: &SiteParams) {
        for s in states.iter_mut() {
            *s = self.reflect_state(*s, pars);
        }
    }

    fn flip_all(&self, states: &mut [u64], pars: &SiteParams) {
        for s in states.iter_mut() {
            *s = self.flip_all_state(*s, pars);
        }
    }

    fn flip_sublattice_a(&self, states: &mut [u64], pars: &SiteParams) {
        for s in states.iter_mut() {
            *s = self.flip_sublattice_a_state(*s, pars);
        }
    }

    fn flip_sublattice_b(&self, states: &mut [u64], pars: &SiteParams) {
        for s in states.iter_mut() {
            *s = self.flip_sublattice_b_state(*s, pars);
        }
    }

    /// Applies one point-group transform to a batch of states in place.
    fn apply(&self, transform: Transform, states: &mut [u64], pars: &SiteParams) {
        match transform {
            Transform::FlipSublatticeA => self.flip_sublattice_a(states, pars),
            Transform::FlipSublatticeB => self.flip_sublattice_b(states, pars),
            Transform::FlipAll => self.flip_all(states, pars),
            Transform::Reflect => self.reflect(states, pars),
            Transform::ReflectFlip => {
                self.reflect(states, pars);
                self.flip_all(states, pars);
            }
        }
    }
}

/// Transforms for spins (or bosons with particle-hole flips) with `sps` local states.
///
/// The flip maps local state `n` to `sps - 1 - n`, which is spin inversion `m -> -m`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LocalSpinOps;

impl LocalSpinOps {
    fn flip_sites(&self, state: u64, pars: &SiteParams, keep: impl Fn(usize) -> bool) -> u64 {
        let top = pars.sps() as u64 - 1;
        let digits: Vec<u64> = pars
            .digits(state)
            .into_iter()
            .enumerate()
            .map(|(i, d)| if keep(i) { top - d } else { d })
            .collect();
        pars.from_digits(&digits)
    }
}

impl BitOps for LocalSpinOps {
    fn family(&self) -> &str {
        "spin"
    }

    fn shift_state(&self, state: u64, a: usize, pars: &SiteParams) -> u64 {
        let l = pars.l();
        let old = pars.digits(state);
        let shifted: Vec<u64> = (0..l).map(|i| old[(i + l - a % l) % l]).collect();
        pars.from_digits(&shifted)
    }

    fn reflect_state(&self, state: u64, pars: &SiteParams) -> u64 {
        let mut digits = pars.digits(state);
        digits.reverse();
        pars.from_digits(&digits)
    }

    fn flip_all_state(&self, state: u64, pars: &SiteParams) -> u64 {
        pars.full_dim() - 1 - state
    }

    fn flip_sublattice_a_state(&self, state: u64, pars: &SiteParams) -> u64 {
        self.flip_sites(state, pars, |i| i % 2 == 0)
    }

    fn flip_sublattice_b_state(&self, state: u64, pars: &SiteParams) -> u64 {
        self.flip_sites(state, pars, |i| i % 2 == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::BasisError;

    #[test]
    fn test_shift_is_cyclic() -> Result<(), BasisError> {
        let pars = SiteParams::new(6, 2)?;
        let ops = LocalSpinOps;
        let s = pars.state_to_int("110100")?;
        assert_eq!(pars.int_to_state(ops.shift_state(s, 1, &pars)), "011010");
        assert_eq!(pars.int_to_state(ops.shift_state(s, 2, &pars)), "001101");
        let mut t = s;
        for _ in 0..3 {
            t = ops.shift_state(t, 2, &pars);
        }
        assert_eq!(t, s);
        Ok(())
    }

    #[test]
    fn test_flips_are_involutions() -> Result<(), BasisError> {
        let pars = SiteParams::new(5, 3)?;
        let ops = LocalSpinOps;
        let s = pars.state_to_int("01202")?;
        assert_eq!(pars.int_to_state(ops.flip_all_state(s, &pars)), "21020");
        assert_eq!(pars.int_to_state(ops.flip_sublattice_a_state(s, &pars)), "21000");
        assert_eq!(pars.int_to_state(ops.flip_sublattice_b_state(s, &pars)), "01222");
        assert_eq!(pars.int_to_state(ops.reflect_state(s, &pars)), "20210");
        for t in [Transform::FlipAll, Transform::FlipSublatticeA, Transform::FlipSublatticeB, Transform::Reflect, Transform::ReflectFlip] {
            assert_eq!(ops.apply_state(t, ops.apply_state(t, s, &pars), &pars), s);
        }
        Ok(())
    }

    #[test]
    fn test_reflection_reverses_translation() -> Result<(), BasisError> {
        // P T P = T^-1
        let pars = SiteParams::new(5, 2)?;
        let ops = LocalSpinOps;
        for s in 0..pars.full_dim() {
            let ptp = ops.reflect_state(ops.shift_state(ops.reflect_state(s, &pars), 1, &pars), &pars);
            assert_eq!(ops.shift_state(ptp, 1, &pars), s);
        }
        Ok(())
    }

    #[test]
    fn test_batch_matches_single() -> Result<(), BasisError> {
        let pars = SiteParams::new(4, 2)?;
        let ops = LocalSpinOps;
        let mut states: Vec<u64> = (0..16).collect();
        ops.apply(Transform::ReflectFlip, &mut states, &pars);
        for (s, t) in (0..16u64).zip(states) {
            assert_eq!(t, ops.flip_all_state(ops.reflect_state(s, &pars), &pars));
        }
        Ok(())
    }
}
