// src/basis/norms.rs

//! Normalization factors of the basis states.

use super::Basis;
use crate::core::constants::basis_constants::PI;
use crate::core::{Dtype, Sector};
use crate::kernels::momentum_is_real;

/// Splits a packed `M = m1 + (L+1)·m2 + (L+1)²·c` into `(c, m1, m2)`.
fn unpack(m: i32, l: usize) -> (i32, f64, f64) {
    let stride = (l + 1) as i32;
    let rest = m % (stride * stride);
    (m / (stride * stride), f64::from(rest % stride), f64::from(rest / stride))
}

impl Basis {
    /// Per-state normalization: dividing the symmetrized full-space amplitude of a
    /// representative by `norms[i]` gives the unit-norm basis state `i`.
    ///
    /// With `Lc = L/a`, `k = 2π·kblock/Lc`, `R = |N|`, `σ = sign(N)` and `m` decoded from `M`:
    ///
    /// | sector | squared norm |
    /// |---|---|
    /// | none | `1` |
    /// | point group only | `N` |
    /// | T | `Lc²/R` |
    /// | T & P, T & PZ | `c·Lc²/R · (1 + σχ cos km)` |
    /// | T & Z, T & ZA, T & ZB | `2Lc²/R · (1 + χ cos km)` |
    /// | T & P & Z | `2c·Lc²/R ·` case factor |
    /// | T & ZA & ZB | `4Lc²/R ·` case factor |
    ///
    /// where `c = 2` when `sin k = 0` and `1` otherwise. Corrections only apply when the orbit
    /// is closed under the point-group element (`M >= 0`).
    pub fn get_norms(&self, dtype: Dtype) -> Vec<f64> {
        let lc = self.l / self.blocks.a;
        let kb = self.sector.momentum().unwrap_or(0);
        let k = 2.0 * PI * kb as f64 / lc as f64;
        let real_k = momentum_is_real(kb, lc);
        let lc2 = (lc * lc) as f64;
        let cos = |m: f64| (k * m).cos();

        let norm_sq = |i: usize| -> f64 {
            let n = self.n.as_ref().map_or(1.0, |n| f64::from(n[i]));
            let m = self.m.as_ref().map_or(-1, |m| m[i]);
            let sign = n.signum();
            match self.sector {
                Sector::Full => 1.0,
                Sector::Parity { .. }
                | Sector::Flip { .. }
                | Sector::FlipA { .. }
                | Sector::FlipB { .. }
                | Sector::ParityFlip { .. }
                | Sector::ParityAndFlip { .. }
                | Sector::FlipAAndFlipB { .. } => n,
                Sector::Translation { .. } => lc2 / n,
                Sector::TranslationParity { p: chi, .. } | Sector::TranslationParityFlip { pz: chi, .. } => {
                    let base = if real_k { 2.0 * lc2 } else { lc2 };
                    let mut v = base * sign / n;
                    if m >= 0 {
                        v *= 1.0 + sign * f64::from(chi) * cos(f64::from(m));
                    }
                    v
                }
                Sector::TranslationFlip { z: chi, .. }
                | Sector::TranslationFlipA { za: chi, .. }
                | Sector::TranslationFlipB { zb: chi, .. } => {
                    let mut v = 2.0 * lc2 / n;
                    if m >= 0 {
                        v *= 1.0 + f64::from(chi) * cos(f64::from(m));
                    }
                    v
                }
                Sector::TranslationParityAndFlip { p, z, .. } => {
                    let (p, z) = (f64::from(p), f64::from(z));
                    let base = if real_k { 4.0 * lc2 } else { 2.0 * lc2 };
                    let (c, mp, mz) = unpack(m, self.l);
                    let factor = match c {
                        2 => 1.0 + sign * p * cos(mp),
                        3 => 1.0 + z * cos(mz),
                        4 => 1.0 + sign * p * z * cos(mp),
                        5 => (1.0 + sign * p * cos(mp)) * (1.0 + z * cos(mz)),
                        _ => 1.0,
                    };
                    base * sign / n * factor
                }
                Sector::TranslationFlipAAndFlipB { za, zb, .. } => {
                    let (za, zb) = (f64::from(za), f64::from(zb));
                    let (c, m1, m2) = unpack(m, self.l);
                    let factor = match c {
                        2 => 1.0 + za * cos(m1),
                        3 => 1.0 + zb * cos(m1),
                        4 => 1.0 + za * zb * cos(m1),
                        5 => (1.0 + za * cos(m1)) * (1.0 + zb * cos(m2)),
                        _ => 1.0,
                    };
                    4.0 * lc2 / n * factor
                }
            }
        };

        (0..self.ns).map(|i| dtype.round_real(norm_sq(i).sqrt())).collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::basis::BasisBuilder;
    use crate::core::{BasisError, Dtype};

    #[test]
    fn test_no_symmetry_is_all_ones() -> Result<(), BasisError> {
        let basis = BasisBuilder::new(5).build()?;
        assert!(basis.get_norms(Dtype::Float64).iter().all(|&n| n == 1.0));
        Ok(())
    }

    #[test]
    fn test_translation_norms() -> Result<(), BasisError> {
        // periods 1, 4, 4, 2, 4, 1 on four sites
        let basis = BasisBuilder::new(4).kblock(0).build()?;
        let norms = basis.get_norms(Dtype::Float64);
        let expected = [4.0, 2.0, 2.0, 8f64.sqrt(), 2.0, 4.0];
        for (n, e) in norms.iter().zip(expected) {
            assert!((n - e).abs() < 1e-12);
        }
        Ok(())
    }

    #[test]
    fn test_norms_positive_in_every_sector() -> Result<(), BasisError> {
        let builders = [
            BasisBuilder::new(6).kblock(1).pblock(1),
            BasisBuilder::new(6).kblock(2).pblock(-1).zblock(1),
            BasisBuilder::new(6).kblock(0).pzblock(-1),
            BasisBuilder::new(8).unit_cell(2).kblock(1).zablock(1).zbblock(-1),
            BasisBuilder::new(6).pblock(1).zblock(-1),
        ];
        for builder in builders {
            let basis = builder.build()?;
            assert!(basis.ns() > 0);
            assert!(basis.get_norms(Dtype::Float32).iter().all(|&n| n.is_finite() && n > 0.0));
        }
        Ok(())
    }
}
