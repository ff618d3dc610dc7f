// src/basis/op.rs

//! Matrix elements of operator strings.

use super::Basis;
use crate::core::{BasisError, Dtype};
use crate::kernels::{OpBuffers, OpStatus};
use crate::sparse::{CooMatrix, CsrMatrix};
use num_complex::Complex64;

/// Matrix elements `me[i]` at `(row[i], col[i])` of one operator string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OpElements {
    pub me: Vec<Complex64>,
    pub row: Vec<usize>,
    pub col: Vec<usize>,
}

impl OpElements {
    pub fn len(&self) -> usize {
        self.me.len()
    }

    pub fn is_empty(&self) -> bool {
        self.me.is_empty()
    }

    /// Adds the elements to an `ns × ns` coordinate matrix.
    pub fn add_to(&self, matrix: &mut CooMatrix<Complex64>) {
        for ((&me, &row), &col) in self.me.iter().zip(&self.row).zip(&self.col) {
            matrix.push(row, col, me);
        }
    }

    /// Assembles the elements into an `ns × ns` sparse matrix.
    pub fn to_csr(&self, ns: usize) -> CsrMatrix<Complex64> {
        let mut coo = CooMatrix::new(ns, ns);
        self.add_to(&mut coo);
        coo.to_csr()
    }
}

impl Basis {
    /// Computes the matrix elements of `coupling · opstr`, where `opstr[j]` acts on site
    /// `indx[j]` and the string acts right to left.
    ///
    /// # Errors
    /// * `InvalidOperator` when the lengths differ, a site lies outside the chain, or the string
    ///   has characters outside [`Basis::allowed_ops`] (all of them are listed).
    /// * `TypeConsistency` when a real `dtype` is requested for complex matrix elements.
    pub fn op(&self, opstr: &str, indx: &[usize], coupling: Complex64, dtype: Dtype) -> Result<OpElements, BasisError> {
        if opstr.chars().count() != indx.len() {
            return Err(BasisError::operator("length of opstr does not match length of indx"));
        }
        if indx.iter().any(|&i| i >= self.l) {
            return Err(BasisError::operator("values in indx falls outside of system"));
        }
        let allowed = self.allowed_ops();
        let mut extra: Vec<char> = opstr.chars().filter(|c| !allowed.contains(c)).collect();
        extra.sort_unstable();
        extra.dedup();
        if !extra.is_empty() {
            let message = format!("unrecognized characters {:?} in operator string", extra);
            return Err(BasisError::InvalidOperator { unrecognized: extra, message });
        }

        if self.ns == 0 {
            return Ok(OpElements::default());
        }

        let len = if self.unique_me { self.ns } else { 2 * self.ns };
        let norms = self.get_norms(Dtype::Complex128);
        let mut buffers = OpBuffers::new(len);
        let status = self.kernels.apply_op(
            &self.op_args(&norms),
            opstr,
            indx,
            coupling,
            !dtype.is_complex(),
            &mut buffers,
        );
        match status {
            OpStatus::Ok => {}
            OpStatus::UnrecognizedChar(c) => {
                return Err(BasisError::InvalidOperator {
                    unrecognized: vec![c],
                    message: format!("opstr character '{}' not recognized", c),
                });
            }
            OpStatus::RealComplexMismatch => {
                return Err(BasisError::TypeConsistency {
                    message: "attemping to use real type for complex matrix elements".to_string(),
                });
            }
            OpStatus::SiteOutOfRange(site) => {
                return Err(BasisError::operator(format!("site index {} out of range", site)));
            }
        }

        let OpBuffers { me, row, col } = buffers;
        let mut out = OpElements::default();
        for ((me, row), col) in me.into_iter().zip(row).zip(col) {
            if me.is_nan() {
                continue;
            }
            out.me.push(dtype.round(me));
            out.row.push(row);
            out.col.push(col);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use crate::basis::BasisBuilder;
    use crate::core::{BasisError, Dtype};
    use num_complex::Complex64;
    use num_traits::One;

    #[test]
    fn test_unrecognized_characters_are_listed() -> Result<(), BasisError> {
        let basis = BasisBuilder::new(4).sps(3).build()?;
        match basis.op("xqzx", &[0, 1, 2, 3], Complex64::one(), Dtype::Float64) {
            Err(BasisError::InvalidOperator { unrecognized, .. }) => assert_eq!(unrecognized, vec!['q', 'x']),
            other => panic!("expected an operator error, got {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn test_argument_checks() -> Result<(), BasisError> {
        let basis = BasisBuilder::new(4).build()?;
        assert!(matches!(
            basis.op("zz", &[0], Complex64::one(), Dtype::Float64),
            Err(BasisError::InvalidOperator { .. })
        ));
        assert!(matches!(
            basis.op("z", &[4], Complex64::one(), Dtype::Float64),
            Err(BasisError::InvalidOperator { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_empty_basis_gives_empty_elements() -> Result<(), BasisError> {
        // the only empty configuration is reflection symmetric
        let basis = BasisBuilder::new(2).particles(0).pblock(-1).build()?;
        assert_eq!(basis.ns(), 0);
        let elements = basis.op("+-", &[0, 1], Complex64::one(), Dtype::Float64)?;
        assert!(elements.is_empty() && elements.row.is_empty() && elements.col.is_empty());
        Ok(())
    }

    #[test]
    fn test_diagonal_elements() -> Result<(), BasisError> {
        let basis = BasisBuilder::new(3).build()?;
        let elements = basis.op("z", &[0], Complex64::new(2.0, 0.0), Dtype::Float64)?;
        assert_eq!(elements.len(), 8);
        for ((me, row), col) in elements.me.iter().zip(&elements.row).zip(&elements.col) {
            assert_eq!(row, col);
            let up = basis.site_params().digit(basis.representatives()[*col], 0) == 1;
            assert_eq!(me.re, if up { 1.0 } else { -1.0 });
        }
        Ok(())
    }

    #[test]
    fn test_real_dtype_rejects_complex_momentum() -> Result<(), BasisError> {
        let basis = BasisBuilder::new(4).kblock(1).build()?;
        let result = basis.op("+-", &[0, 1], Complex64::one(), Dtype::Float64);
        assert!(matches!(result, Err(BasisError::TypeConsistency { .. })));
        assert!(basis.op("+-", &[0, 1], Complex64::one(), Dtype::Complex128).is_ok());
        Ok(())
    }
}
