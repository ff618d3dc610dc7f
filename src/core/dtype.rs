// src/core/dtype.rs

//! Numeric output types.

use num_complex::Complex64;

/// Numeric type requested for matrix elements, norms and embedded vectors.
///
/// All arithmetic is carried out in double precision; single precision types round the
/// results through `f32` on the way out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dtype {
    Float32,
    Float64,
    Complex64,
    Complex128,
}

impl Dtype {
    pub fn is_complex(&self) -> bool {
        matches!(self, Dtype::Complex64 | Dtype::Complex128)
    }

    pub fn is_single(&self) -> bool {
        matches!(self, Dtype::Float32 | Dtype::Complex64)
    }

    /// Machine epsilon of the underlying real type.
    pub fn eps(&self) -> f64 {
        if self.is_single() { f32::EPSILON as f64 } else { f64::EPSILON }
    }

    /// Rounds a real value to this dtype's precision.
    pub fn round_real(&self, x: f64) -> f64 {
        if self.is_single() { x as f32 as f64 } else { x }
    }

    /// Rounds a complex value to this dtype's precision, dropping the imaginary part for real dtypes.
    pub fn round(&self, c: Complex64) -> Complex64 {
        let im = if self.is_complex() { c.im } else { 0.0 };
        Complex64::new(self.round_real(c.re), self.round_real(im))
    }
}

impl Default for Dtype {
    fn default() -> Self {
        Dtype::Complex128
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_precision_rounding() {
        let x = 0.1_f64;
        assert_eq!(Dtype::Float32.round_real(x), 0.1_f32 as f64);
        assert_eq!(Dtype::Float64.round_real(x), x);
        assert_eq!(Dtype::Float64.round(Complex64::new(1.0, 2.0)), Complex64::new(1.0, 0.0));
    }
}
