// src/core/blocks.rs

//! Symmetry-block configuration and its validation rules.

use super::error::BasisError;
use std::fmt;

/// Quantum numbers requested for a basis. `None` means the symmetry is not used.
///
/// `kblock` is the translation momentum in units of `2π/(L/a)`, every other entry is a ±1
/// eigenvalue. `a` is the translation unit cell.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SymmetryBlocks {
    pub kblock: Option<i64>,
    pub pblock: Option<i8>,
    pub zblock: Option<i8>,
    pub zablock: Option<i8>,
    pub zbblock: Option<i8>,
    pub pzblock: Option<i8>,
    pub a: usize,
}

impl Default for SymmetryBlocks {
    fn default() -> Self {
        Self { kblock: None, pblock: None, zblock: None, zablock: None, zbblock: None, pzblock: None, a: 1 }
    }
}

fn check_eigenvalue(name: &str, value: Option<i8>) -> Result<(), BasisError> {
    match value {
        Some(v) if v != 1 && v != -1 => Err(BasisError::config(name, format!("{} must be +/- 1", name))),
        _ => Ok(()),
    }
}

/// Fills in the third member of a closed triple `x·y = xy` when two are known.
fn close_triple(
    names: [&str; 3],
    x: &mut Option<i8>,
    y: &mut Option<i8>,
    xy: &mut Option<i8>,
) -> Result<(), BasisError> {
    match (*x, *y, *xy) {
        (Some(a), Some(b), Some(c)) if a * b != c => Err(BasisError::config(
            names[2],
            format!("{} must equal {}*{} when all three are given", names[2], names[0], names[1]),
        )),
        (Some(a), Some(b), None) => {
            *xy = Some(a * b);
            Ok(())
        }
        (Some(a), None, Some(c)) => {
            *y = Some(a * c);
            Ok(())
        }
        (None, Some(b), Some(c)) => {
            *x = Some(b * c);
            Ok(())
        }
        _ => Ok(()),
    }
}

impl SymmetryBlocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when no symmetry is requested.
    pub fn is_empty(&self) -> bool {
        self.kblock.is_none()
            && self.pblock.is_none()
            && self.zblock.is_none()
            && self.zablock.is_none()
            && self.zbblock.is_none()
            && self.pzblock.is_none()
    }

    /// True when a global spin-flip type symmetry (`zblock` or `pzblock`) is requested.
    pub fn has_global_flip(&self) -> bool {
        self.zblock.is_some() || self.pzblock.is_some()
    }

    /// True when a sublattice flip is requested.
    pub fn has_sublattice_flip(&self) -> bool {
        self.zablock.is_some() || self.zbblock.is_some()
    }

    /// Validates the blocks for a chain of `l` sites and returns the resolved configuration.
    ///
    /// Resolution reduces the momentum modulo `L/a` (dropping it when `a == L`), and closes the
    /// `{p, z, pz}` and `{zA, zB, z}` triples. With `check_particles` set, `particles` is checked
    /// against the flip symmetries.
    pub fn resolve(
        &self,
        l: usize,
        sps: usize,
        particles: Option<usize>,
        check_particles: bool,
    ) -> Result<SymmetryBlocks, BasisError> {
        let a = self.a;
        if a == 0 {
            return Err(BasisError::config("a", "a must be a positive integer"));
        }
        if l % a != 0 {
            return Err(BasisError::config("a", "L must be interger multiple of lattice spacing a"));
        }
        let max_particles = l * (sps - 1);
        if let Some(np) = particles {
            if np > max_particles {
                return Err(BasisError::config("Np", format!("0 <= Number of particles <= {}", max_particles)));
            }
        }

        check_eigenvalue("pblock", self.pblock)?;
        check_eigenvalue("zblock", self.zblock)?;
        check_eigenvalue("zAblock", self.zablock)?;
        check_eigenvalue("zBblock", self.zbblock)?;
        check_eigenvalue("pzblock", self.pzblock)?;

        let mut resolved = self.clone();
        let cells = (l / a) as i64;
        resolved.kblock = match self.kblock {
            Some(k) if a < l => Some(k.rem_euclid(cells)),
            _ => None,
        };

        if (resolved.pblock.is_some() || resolved.pzblock.is_some()) && resolved.has_sublattice_flip() {
            return Err(BasisError::config("pblock", "zA and zB symmetries incompatible with parity symmetry"));
        }
        close_triple(["pblock", "zblock", "pzblock"], &mut resolved.pblock, &mut resolved.zblock, &mut resolved.pzblock)?;
        close_triple(["zAblock", "zBblock", "zblock"], &mut resolved.zablock, &mut resolved.zbblock, &mut resolved.zblock)?;
        if resolved.pblock.is_some() && resolved.has_sublattice_flip() {
            return Err(BasisError::config("pblock", "zA and zB symmetries incompatible with parity symmetry"));
        }

        if check_particles {
            if let Some(np) = particles {
                if resolved.has_global_flip() {
                    let name = if resolved.zblock.is_some() { "zblock" } else { "pzblock" };
                    if max_particles % 2 != 0 {
                        return Err(BasisError::config(name, "spin inversion/particle-hole symmetry with particle/magnetization conservation must be used with chains with 0 magnetization sector or at half filling"));
                    }
                    if np != max_particles / 2 {
                        return Err(BasisError::config(name, "spin inversion/particle-hole symmetry only reduces the 0 magnetization or half filled particle sector"));
                    }
                }
                if resolved.has_sublattice_flip() {
                    let name = if resolved.zablock.is_some() { "zAblock" } else { "zBblock" };
                    return Err(BasisError::config(name, "zA/cA and zB/cB symmetries incompatible with magnetisation/particle symmetry"));
                }
            }
        }

        if resolved.kblock.is_some() && resolved.has_sublattice_flip() && a % 2 != 0 {
            return Err(BasisError::config("a", "unit cell size 'a' must be even"));
        }
        Ok(resolved)
    }
}

impl fmt::Display for SymmetryBlocks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries: [(&str, Option<i64>); 6] = [
            ("kblock", self.kblock),
            ("pblock", self.pblock.map(i64::from)),
            ("zblock", self.zblock.map(i64::from)),
            ("zAblock", self.zablock.map(i64::from)),
            ("zBblock", self.zbblock.map(i64::from)),
            ("pzblock", self.pzblock.map(i64::from)),
        ];
        let mut first = true;
        for (name, value) in entries {
            if let Some(v) = value {
                write!(f, "{}{} = {}", if first { "" } else { ", " }, name, v)?;
                first = false;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blocks() -> SymmetryBlocks {
        SymmetryBlocks::new()
    }

    #[test]
    fn test_momentum_reduced_modulo_cells() -> Result<(), BasisError> {
        let b = SymmetryBlocks { kblock: Some(-1), a: 2, ..blocks() }.resolve(8, 2, None, true)?;
        assert_eq!(b.kblock, Some(3));
        Ok(())
    }

    #[test]
    fn test_momentum_dropped_when_cell_spans_chain() -> Result<(), BasisError> {
        let b = SymmetryBlocks { kblock: Some(1), a: 4, ..blocks() }.resolve(4, 2, None, true)?;
        assert_eq!(b.kblock, None);
        Ok(())
    }

    #[test]
    fn test_eigenvalues_must_be_unit() {
        let err = SymmetryBlocks { zbblock: Some(2), ..blocks() }.resolve(4, 2, None, true).unwrap_err();
        assert_eq!(err.parameter(), Some("zBblock"));
    }

    #[test]
    fn test_triples_are_closed() -> Result<(), BasisError> {
        let b = SymmetryBlocks { pblock: Some(-1), zblock: Some(-1), ..blocks() }.resolve(6, 2, None, true)?;
        assert_eq!(b.pzblock, Some(1));
        let b = SymmetryBlocks { zablock: Some(1), zbblock: Some(-1), ..blocks() }.resolve(6, 2, None, true)?;
        assert_eq!(b.zblock, Some(-1));
        let err = SymmetryBlocks { pblock: Some(1), zblock: Some(1), pzblock: Some(-1), ..blocks() }
            .resolve(6, 2, None, true)
            .unwrap_err();
        assert_eq!(err.parameter(), Some("pzblock"));
        Ok(())
    }

    #[test]
    fn test_incompatible_combinations() {
        let err = SymmetryBlocks { pblock: Some(1), zablock: Some(1), ..blocks() }.resolve(4, 2, None, true).unwrap_err();
        assert_eq!(err.parameter(), Some("pblock"));

        let err = SymmetryBlocks { zblock: Some(1), ..blocks() }.resolve(4, 2, Some(1), true).unwrap_err();
        assert_eq!(err.parameter(), Some("zblock"));

        let err = SymmetryBlocks { zablock: Some(1), ..blocks() }.resolve(4, 2, Some(2), true).unwrap_err();
        assert_eq!(err.parameter(), Some("zAblock"));

        let err = SymmetryBlocks { kblock: Some(0), zbblock: Some(1), a: 3, ..blocks() }.resolve(6, 2, None, true).unwrap_err();
        assert_eq!(err.parameter(), Some("a"));

        let err = SymmetryBlocks::new().resolve(4, 2, Some(5), true).unwrap_err();
        assert_eq!(err.parameter(), Some("Np"));
    }

    #[test]
    fn test_half_filling_allows_flip() -> Result<(), BasisError> {
        let b = SymmetryBlocks { zblock: Some(1), ..blocks() }.resolve(4, 2, Some(2), true)?;
        assert_eq!(b.zblock, Some(1));
        Ok(())
    }
}
