// src/core/sector.rs

//! The sixteen mutually exclusive symmetry sectors.
//!
//! Sector selection happens once, at construction, from the resolved [`SymmetryBlocks`].
//! Normalization, embedding and operator application all match on the resulting [`Sector`].

use super::blocks::SymmetryBlocks;
use std::fmt;

/// A single-state transform of the point group (everything except translation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transform {
    /// Local flip on the even sites.
    FlipSublatticeA,
    /// Local flip on the odd sites.
    FlipSublatticeB,
    /// Local flip on every site (spin inversion / particle-hole).
    FlipAll,
    /// Left-right reflection of the chain.
    Reflect,
    /// Reflection combined with a global flip.
    ReflectFlip,
}

impl Transform {
    /// Block name of the eigenvalue attached to this transform.
    pub fn block_name(&self) -> &'static str {
        match self {
            Transform::FlipSublatticeA => "zAblock",
            Transform::FlipSublatticeB => "zBblock",
            Transform::FlipAll => "zblock",
            Transform::Reflect => "pblock",
            Transform::ReflectFlip => "pzblock",
        }
    }
}

/// Symmetry sector of a basis, carrying exactly the quantum numbers its formulas need.
///
/// `k` is the momentum already reduced modulo `L/a`; every other field is a ±1 eigenvalue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sector {
    Full,
    Translation { k: usize },
    Parity { p: i8 },
    Flip { z: i8 },
    FlipA { za: i8 },
    FlipB { zb: i8 },
    ParityFlip { pz: i8 },
    TranslationParity { k: usize, p: i8 },
    TranslationFlip { k: usize, z: i8 },
    TranslationFlipA { k: usize, za: i8 },
    TranslationFlipB { k: usize, zb: i8 },
    TranslationParityFlip { k: usize, pz: i8 },
    ParityAndFlip { p: i8, z: i8 },
    FlipAAndFlipB { za: i8, zb: i8 },
    TranslationParityAndFlip { k: usize, p: i8, z: i8 },
    TranslationFlipAAndFlipB { k: usize, za: i8, zb: i8 },
}

impl Sector {
    /// Selects the sector for resolved blocks.
    ///
    /// Three-way combinations are tried before two-way ones, and two-way ones before single
    /// symmetries; translation alone comes last.
    pub fn select(blocks: &SymmetryBlocks) -> Sector {
        let k = blocks.kblock.map(|k| k as usize);
        match (k, blocks.pblock, blocks.zblock, blocks.zablock, blocks.zbblock, blocks.pzblock) {
            (Some(k), Some(p), Some(z), ..) => Sector::TranslationParityAndFlip { k, p, z },
            (Some(k), _, _, Some(za), Some(zb), _) => Sector::TranslationFlipAAndFlipB { k, za, zb },
            (Some(k), _, _, _, _, Some(pz)) => Sector::TranslationParityFlip { k, pz },
            (Some(k), Some(p), ..) => Sector::TranslationParity { k, p },
            (Some(k), _, Some(z), ..) => Sector::TranslationFlip { k, z },
            (Some(k), _, _, Some(za), ..) => Sector::TranslationFlipA { k, za },
            (Some(k), _, _, _, Some(zb), _) => Sector::TranslationFlipB { k, zb },
            (None, Some(p), Some(z), ..) => Sector::ParityAndFlip { p, z },
            (None, _, _, Some(za), Some(zb), _) => Sector::FlipAAndFlipB { za, zb },
            (None, Some(p), ..) => Sector::Parity { p },
            (None, _, Some(z), ..) => Sector::Flip { z },
            (None, _, _, Some(za), ..) => Sector::FlipA { za },
            (None, _, _, _, Some(zb), _) => Sector::FlipB { zb },
            (None, _, _, _, _, Some(pz)) => Sector::ParityFlip { pz },
            (Some(k), ..) => Sector::Translation { k },
            (None, ..) => Sector::Full,
        }
    }

    /// Pattern name used to key the enumeration provider routines.
    pub fn name(&self) -> &'static str {
        match self {
            Sector::Full => "none",
            Sector::Translation { .. } => "t",
            Sector::Parity { .. } => "p",
            Sector::Flip { .. } => "z",
            Sector::FlipA { .. } => "zA",
            Sector::FlipB { .. } => "zB",
            Sector::ParityFlip { .. } => "pz",
            Sector::TranslationParity { .. } => "t_p",
            Sector::TranslationFlip { .. } => "t_z",
            Sector::TranslationFlipA { .. } => "t_zA",
            Sector::TranslationFlipB { .. } => "t_zB",
            Sector::TranslationParityFlip { .. } => "t_pz",
            Sector::ParityAndFlip { .. } => "p_z",
            Sector::FlipAAndFlipB { .. } => "zA_zB",
            Sector::TranslationParityAndFlip { .. } => "t_p_z",
            Sector::TranslationFlipAAndFlipB { .. } => "t_zA_zB",
        }
    }

    /// Conserved-quantity label, e.g. `"T & P & Z"`.
    pub fn label(&self) -> &'static str {
        match self {
            Sector::Full => "",
            Sector::Translation { .. } => "T",
            Sector::Parity { .. } => "P",
            Sector::Flip { .. } => "Z",
            Sector::FlipA { .. } => "ZA",
            Sector::FlipB { .. } => "ZB",
            Sector::ParityFlip { .. } => "PZ",
            Sector::TranslationParity { .. } => "T & P",
            Sector::TranslationFlip { .. } => "T & Z",
            Sector::TranslationFlipA { .. } => "T & ZA",
            Sector::TranslationFlipB { .. } => "T & ZB",
            Sector::TranslationParityFlip { .. } => "T & PZ",
            Sector::ParityAndFlip { .. } => "P & Z",
            Sector::FlipAAndFlipB { .. } => "ZA & ZB",
            Sector::TranslationParityAndFlip { .. } => "T & P & Z",
            Sector::TranslationFlipAAndFlipB { .. } => "T & ZA & ZB",
        }
    }

    /// Momentum quantum number, when translation is part of the sector.
    pub fn momentum(&self) -> Option<usize> {
        match *self {
            Sector::Translation { k }
            | Sector::TranslationParity { k, .. }
            | Sector::TranslationFlip { k, .. }
            | Sector::TranslationFlipA { k, .. }
            | Sector::TranslationFlipB { k, .. }
            | Sector::TranslationParityFlip { k, .. }
            | Sector::TranslationParityAndFlip { k, .. }
            | Sector::TranslationFlipAAndFlipB { k, .. } => Some(k),
            _ => None,
        }
    }

    /// Point-group transforms with their eigenvalues, in the fixed embedding order
    /// `ZA, ZB, Z, P, PZ`. The identity is implied and not listed.
    pub fn point_group(&self) -> Vec<(Transform, i8)> {
        use Transform::*;
        match *self {
            Sector::Full | Sector::Translation { .. } => vec![],
            Sector::Parity { p } | Sector::TranslationParity { p, .. } => vec![(Reflect, p)],
            Sector::Flip { z } | Sector::TranslationFlip { z, .. } => vec![(FlipAll, z)],
            Sector::FlipA { za } | Sector::TranslationFlipA { za, .. } => vec![(FlipSublatticeA, za)],
            Sector::FlipB { zb } | Sector::TranslationFlipB { zb, .. } => vec![(FlipSublatticeB, zb)],
            Sector::ParityFlip { pz } | Sector::TranslationParityFlip { pz, .. } => vec![(ReflectFlip, pz)],
            Sector::ParityAndFlip { p, z } | Sector::TranslationParityAndFlip { p, z, .. } => {
                vec![(FlipAll, z), (Reflect, p), (ReflectFlip, p * z)]
            }
            Sector::FlipAAndFlipB { za, zb } | Sector::TranslationFlipAAndFlipB { za, zb, .. } => {
                vec![(FlipSublatticeA, za), (FlipSublatticeB, zb), (FlipAll, za * zb)]
            }
        }
    }

    /// Momentum sectors whose point group reverses translations. Their basis states come in
    /// cosine (`N > 0`) and sine (`N < 0`) branches and an operator can reach both.
    pub fn has_parity_branch(&self) -> bool {
        matches!(
            self,
            Sector::TranslationParity { .. } | Sector::TranslationParityFlip { .. } | Sector::TranslationParityAndFlip { .. }
        )
    }

    /// `true` when the sector stores the orbit-size array `N`.
    pub fn uses_n(&self) -> bool {
        !matches!(self, Sector::Full)
    }

    /// `true` when the sector stores the packed orbit-structure array `M`.
    pub fn uses_m(&self) -> bool {
        self.momentum().is_some() && !self.point_group().is_empty()
    }

    /// Same sector pattern, ignoring the quantum numbers.
    pub fn same_kind(&self, other: &Sector) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if matches!(self, Sector::Full) { write!(f, "no symmetry") } else { write!(f, "{}", self.label()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolved(blocks: SymmetryBlocks, l: usize) -> SymmetryBlocks {
        blocks.resolve(l, 2, None, true).unwrap()
    }

    #[test]
    fn test_priority_three_way_first() {
        let b = resolved(SymmetryBlocks { kblock: Some(0), pblock: Some(1), zblock: Some(-1), ..SymmetryBlocks::new() }, 6);
        assert_eq!(Sector::select(&b), Sector::TranslationParityAndFlip { k: 0, p: 1, z: -1 });
        assert_eq!(Sector::select(&b).point_group().len(), 3);
    }

    #[test]
    fn test_priority_two_way_before_single() {
        let b = resolved(SymmetryBlocks { pblock: Some(-1), zblock: Some(1), ..SymmetryBlocks::new() }, 6);
        assert_eq!(Sector::select(&b), Sector::ParityAndFlip { p: -1, z: 1 });

        let b = resolved(SymmetryBlocks { kblock: Some(2), zbblock: Some(1), a: 2, ..SymmetryBlocks::new() }, 8);
        assert_eq!(Sector::select(&b), Sector::TranslationFlipB { k: 2, zb: 1 });
    }

    #[test]
    fn test_single_and_empty() {
        assert_eq!(Sector::select(&SymmetryBlocks::new()), Sector::Full);
        let b = resolved(SymmetryBlocks { kblock: Some(1), ..SymmetryBlocks::new() }, 4);
        let sector = Sector::select(&b);
        assert_eq!(sector, Sector::Translation { k: 1 });
        assert!(sector.uses_n());
        assert!(!sector.uses_m());
        assert!(!sector.has_parity_branch());
    }

    #[test]
    fn test_embedding_order_is_fixed() {
        let sector = Sector::FlipAAndFlipB { za: 1, zb: -1 };
        let order: Vec<Transform> = sector.point_group().into_iter().map(|(t, _)| t).collect();
        assert_eq!(order, vec![Transform::FlipSublatticeA, Transform::FlipSublatticeB, Transform::FlipAll]);
        assert_eq!(sector.point_group()[2].1, -1);
    }
}
