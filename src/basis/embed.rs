// src/basis/embed.rs

//! Expansion of reduced vectors into the full `sps^L` dimensional space.
//!
//! Every sector goes through one routine: for each of the `L/a` translation steps the current
//! (translated) representatives receive the character-weighted amplitudes, then each active
//! point-group transform is applied in the order `ZA, ZB, Z, P, PZ`, scattered with its
//! eigenvalue and undone. Dense and sparse targets only differ in the [`Sink`].

use super::Basis;
use crate::core::{BasisError, Dtype};
use crate::kernels::{character, momentum_is_real};
use crate::sparse::{CooMatrix, CsrMatrix};
use nalgebra::DMatrix;
use num_complex::Complex64;
use num_traits::Zero;

/// A full-space vector (or batch of column vectors).
#[derive(Debug, Clone, PartialEq)]
pub enum Embedded {
    Dense(DMatrix<Complex64>),
    Sparse(CsrMatrix<Complex64>),
}

impl Embedded {
    pub fn shape(&self) -> (usize, usize) {
        match self {
            Embedded::Dense(m) => m.shape(),
            Embedded::Sparse(m) => (m.nrows(), m.ncols()),
        }
    }

    pub fn to_dense(&self) -> DMatrix<Complex64> {
        match self {
            Embedded::Dense(m) => m.clone(),
            Embedded::Sparse(m) => m.to_dense(),
        }
    }
}

/// Target of the scattered amplitudes.
trait Sink {
    fn add(&mut self, row: usize, col: usize, value: Complex64);

    /// Called after every translation step.
    fn flush(&mut self) {}
}

struct DenseSink(DMatrix<Complex64>);

impl Sink for DenseSink {
    fn add(&mut self, row: usize, col: usize, value: Complex64) {
        self.0[(row, col)] += value;
    }
}

struct SparseSink(CooMatrix<Complex64>);

impl Sink for SparseSink {
    fn add(&mut self, row: usize, col: usize, value: Complex64) {
        if !value.is_zero() {
            self.0.push(row, col, value);
        }
    }

    fn flush(&mut self) {
        self.0.sum_duplicates();
        self.0.eliminate_zeros();
    }
}

/// Reduced-basis amplitudes feeding the embedding.
enum Source<'a> {
    /// Column `i` holds basis state `i`.
    Identity,
    Vectors(&'a DMatrix<Complex64>),
}

impl Source<'_> {
    fn ncols(&self, ns: usize) -> usize {
        match self {
            Source::Identity => ns,
            Source::Vectors(v) => v.ncols(),
        }
    }

    fn entries(&self, i: usize) -> Vec<(usize, Complex64)> {
        match self {
            Source::Identity => vec![(i, Complex64::new(1.0, 0.0))],
            Source::Vectors(v) => (0..v.ncols()).map(|c| (c, v[(i, c)])).filter(|(_, x)| !x.is_zero()).collect(),
        }
    }
}

impl Basis {
    fn check_real_characters(&self, dtype: Dtype) -> Result<(), BasisError> {
        if dtype.is_complex() || self.sector.has_parity_branch() {
            return Ok(());
        }
        let lc = self.l / self.blocks.a;
        match self.sector.momentum() {
            Some(kb) if !momentum_is_real(kb, lc) => Err(BasisError::TypeConsistency {
                message: "attemping to use real type for complex elements".to_string(),
            }),
            _ => Ok(()),
        }
    }

    fn embed_into<S: Sink>(&self, source: &Source<'_>, dtype: Dtype, sink: &mut S) {
        let ops = self.kernels.bitops();
        let lc = self.l / self.blocks.a;
        let steps = if self.sector.momentum().is_some() { lc } else { 1 };
        let group = self.sector.point_group();
        let norms = self.get_norms(dtype);
        let negative: Vec<bool> = match &self.n {
            Some(n) if self.sector.has_parity_branch() => n.iter().map(|&x| x < 0).collect(),
            _ => vec![false; self.ns],
        };
        let entries: Vec<Vec<(usize, Complex64)>> = (0..self.ns).map(|i| source.entries(i)).collect();

        let scatter = |sink: &mut S, states: &[u64], weights: &[Complex64], chi: f64| {
            for (i, &s) in states.iter().enumerate() {
                for &(col, v) in &entries[i] {
                    sink.add(s as usize, col, weights[i] * v * chi);
                }
            }
        };

        let mut states = self.representatives.clone();
        for r in 0..steps {
            let weights: Vec<Complex64> =
                (0..self.ns).map(|i| character(&self.sector, r, negative[i], lc) / norms[i]).collect();
            scatter(sink, &states, &weights, 1.0);
            for &(transform, chi) in &group {
                ops.apply(transform, &mut states, &self.pars);
                scatter(sink, &states, &weights, f64::from(chi));
                ops.apply(transform, &mut states, &self.pars);
            }
            sink.flush();
            ops.shift(&mut states, self.blocks.a, &self.pars);
        }
    }

    fn embed_sparse(&self, source: Source<'_>, dtype: Dtype) -> Result<CsrMatrix<Complex64>, BasisError> {
        self.check_real_characters(dtype)?;
        let full = self.pars.full_dim() as usize;
        let ncols = source.ncols(self.ns);
        log::debug!("sparse embedding of {} x {} reduced amplitudes into {} rows", self.ns, ncols, full);

        let mut sink = SparseSink(CooMatrix::new(full, ncols));
        self.embed_into(&source, dtype, &mut sink);
        let mut rounded = CooMatrix::new(full, ncols);
        for (i, j, v) in sink.0.to_csr().triplets() {
            rounded.push(i, j, dtype.round(v));
        }
        Ok(rounded.to_csr())
    }

    fn embed_dense(&self, source: Source<'_>, dtype: Dtype) -> Result<DMatrix<Complex64>, BasisError> {
        self.check_real_characters(dtype)?;
        let full = self.pars.full_dim() as usize;
        let ncols = source.ncols(self.ns);
        log::debug!("dense embedding of {} x {} reduced amplitudes into {} rows", self.ns, ncols, full);

        let mut sink = DenseSink(DMatrix::zeros(full, ncols));
        self.embed_into(&source, dtype, &mut sink);
        Ok(sink.0.map(|v| dtype.round(v)))
    }

    fn check_rows(&self, v0: &DMatrix<Complex64>) -> Result<(), BasisError> {
        if v0.nrows() != self.ns {
            return Err(BasisError::argument(
                "v0",
                format!("v0 has incompatible dimensions with basis: {} rows, Ns = {}", v0.nrows(), self.ns),
            ));
        }
        Ok(())
    }

    /// Expands the columns of `v0` (shape `Ns × m`) into the full space.
    ///
    /// # Errors
    /// * `InvalidArgument` when `v0` does not have `Ns` rows.
    /// * `TypeConsistency` when a real `dtype` cannot carry the momentum phases.
    pub fn get_vec(&self, v0: &DMatrix<Complex64>, sparse: bool, dtype: Dtype) -> Result<Embedded, BasisError> {
        if sparse {
            self.get_vec_sparse(v0, dtype).map(Embedded::Sparse)
        } else {
            self.get_vec_dense(v0, dtype).map(Embedded::Dense)
        }
    }

    pub fn get_vec_dense(&self, v0: &DMatrix<Complex64>, dtype: Dtype) -> Result<DMatrix<Complex64>, BasisError> {
        self.check_rows(v0)?;
        self.embed_dense(Source::Vectors(v0), dtype)
    }

    pub fn get_vec_sparse(&self, v0: &DMatrix<Complex64>, dtype: Dtype) -> Result<CsrMatrix<Complex64>, BasisError> {
        self.check_rows(v0)?;
        self.embed_sparse(Source::Vectors(v0), dtype)
    }

    /// Projector `P` of shape `sps^L × Ns`: column `i` is basis state `i` in the full space.
    pub fn get_proj(&self, dtype: Dtype) -> Result<CsrMatrix<Complex64>, BasisError> {
        self.embed_sparse(Source::Identity, dtype)
    }
}

#[cfg(test)]
mod tests {
    use crate::basis::BasisBuilder;
    use crate::core::{BasisError, Dtype};
    use nalgebra::DMatrix;
    use num_complex::Complex64;

    #[test]
    fn test_full_space_projector_is_identity() -> Result<(), BasisError> {
        let basis = BasisBuilder::new(3).build()?;
        let proj = basis.get_proj(Dtype::Float64)?.to_dense();
        assert_eq!(proj, DMatrix::identity(8, 8));
        Ok(())
    }

    #[test]
    fn test_dense_and_sparse_agree() -> Result<(), BasisError> {
        let basis = BasisBuilder::new(6).kblock(1).pblock(1).build()?;
        let v0 = DMatrix::from_fn(basis.ns(), 2, |i, j| Complex64::new((i + 2 * j) as f64, 1.0 - j as f64));
        let dense = basis.get_vec_dense(&v0, Dtype::Complex128)?;
        let sparse = basis.get_vec_sparse(&v0, Dtype::Complex128)?.to_dense();
        assert!((dense - sparse).norm() < 1e-12);
        Ok(())
    }

    #[test]
    fn test_momentum_state_spreads_over_orbit() -> Result<(), BasisError> {
        let basis = BasisBuilder::new(4).kblock(0).build()?;
        let i = basis.index_of("0001")?;
        let mut v0 = DMatrix::zeros(basis.ns(), 1);
        v0[(i, 0)] = Complex64::new(1.0, 0.0);
        let full = basis.get_vec_dense(&v0, Dtype::Float64)?;
        for s in ["0001", "0010", "0100", "1000"] {
            let x = basis.state_to_int(s)? as usize;
            assert!((full[(x, 0)].re - 0.5).abs() < 1e-12);
        }
        assert!((full.norm() - 1.0).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn test_shape_and_type_errors() -> Result<(), BasisError> {
        let basis = BasisBuilder::new(4).kblock(1).build()?;
        let wrong = DMatrix::zeros(basis.ns() + 1, 1);
        assert_eq!(basis.get_vec(&wrong, false, Dtype::Complex128).unwrap_err().parameter(), Some("v0"));
        assert!(matches!(basis.get_proj(Dtype::Float64), Err(BasisError::TypeConsistency { .. })));
        assert!(basis.get_proj(Dtype::Complex128).is_ok());
        Ok(())
    }
}
