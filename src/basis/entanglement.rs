// src/basis/entanglement.rs

//! Reduced density matrices and entanglement entropies.

use super::Basis;
use crate::core::{BasisError, Dtype};
use nalgebra::{DMatrix, DVector};
use num_complex::Complex64;
use std::collections::HashMap;

/// A state expressed in the reduced basis.
#[derive(Debug, Clone, Copy)]
pub enum QuantumState<'a> {
    /// A single pure state of length `Ns`.
    Pure(&'a DVector<Complex64>),
    /// Pure states stored as the columns of an `Ns × m` matrix.
    PureBatch(&'a DMatrix<Complex64>),
    /// An `Ns × Ns` density matrix.
    Mixed(&'a DMatrix<Complex64>),
}

/// Which reduced density matrices to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RdmSelection {
    A,
    B,
    Both,
}

impl RdmSelection {
    fn wants_a(self) -> bool {
        self != RdmSelection::B
    }

    fn wants_b(self) -> bool {
        self != RdmSelection::A
    }
}

/// Reduced density matrices, one per input state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReducedDensityMatrices {
    pub rdm_a: Option<Vec<DMatrix<Complex64>>>,
    pub rdm_b: Option<Vec<DMatrix<Complex64>>>,
}

/// Entropy per input state, with the reduced density matrices that were asked for.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntanglementEntropy {
    pub entropy: Vec<f64>,
    pub rdm_a: Option<Vec<DMatrix<Complex64>>>,
    pub rdm_b: Option<Vec<DMatrix<Complex64>>>,
}

/// Bipartition of the chain into the sites of `A` (in the given order) and the rest.
struct Bipartition {
    a: Vec<usize>,
    b: Vec<usize>,
    sps: usize,
}

impl Bipartition {
    fn dim(&self, sites: &[usize]) -> usize {
        self.sps.pow(sites.len() as u32)
    }

    fn dims(&self) -> (usize, usize) {
        (self.dim(&self.a), self.dim(&self.b))
    }

    /// Splits a full-space index into its `(A, B)` indices.
    fn split(&self, digits: &[u64]) -> (usize, usize) {
        let index = |sites: &[usize]| sites.iter().fold(0usize, |acc, &i| acc * self.sps + digits[i] as usize);
        (index(&self.a), index(&self.b))
    }
}

/// `-Σ λ ln λ` for `alpha == 1`, `ln(Σ λ^alpha) / (1 - alpha)` otherwise.
fn entropy(eigenvalues: &[f64], alpha: f64, eps: f64) -> f64 {
    let lambdas = eigenvalues.iter().map(|&l| l.max(0.0) + eps);
    if alpha == 1.0 {
        -lambdas.map(|l| l * l.ln()).sum::<f64>()
    } else {
        lambdas.map(|l| l.powf(alpha)).sum::<f64>().ln() / (1.0 - alpha)
    }
}

/// `ρ[(i, j)] += Σ v_i v_j*` over entries sharing the traced-out index.
fn accumulate(rho: &mut DMatrix<Complex64>, groups: &HashMap<usize, Vec<(usize, Complex64)>>) {
    for entries in groups.values() {
        for &(i, vi) in entries {
            for &(j, vj) in entries {
                rho[(i, j)] += vi * vj.conj();
            }
        }
    }
}

impl Basis {
    fn bipartition(&self, sub_sys_a: Option<&[usize]>) -> Result<Bipartition, BasisError> {
        let a: Vec<usize> = match sub_sys_a {
            Some(sites) => sites.to_vec(),
            None => (0..self.l / 2).collect(),
        };
        if a.iter().any(|&i| i >= self.l) {
            return Err(BasisError::argument(
                "sub_sys_A",
                format!("sub_sys_A must contain site indices in 0..{}", self.l),
            ));
        }
        let mut sorted = a.clone();
        sorted.sort_unstable();
        sorted.dedup();
        if sorted.len() != a.len() {
            return Err(BasisError::argument("sub_sys_A", "sub_sys_A must not repeat sites"));
        }
        let b = (0..self.l).filter(|i| !a.contains(i)).collect();
        Ok(Bipartition { a, b, sps: self.sps })
    }

    fn check_state_rows(&self, rows: usize) -> Result<(), BasisError> {
        if rows != self.ns {
            return Err(BasisError::argument(
                "state",
                format!("state shape ({} rows) not compatible with Ns={}", rows, self.ns),
            ));
        }
        Ok(())
    }

    /// Reduced density matrices of the bipartition `A | B`, with `A` defaulting to the first
    /// `L/2` sites.
    ///
    /// # Errors
    /// * `InvalidArgument` for out-of-range or repeated sites and for states of the wrong shape.
    /// * `NotImplemented` for a mixed state with `sparse` set.
    pub fn partial_trace(
        &self,
        state: QuantumState<'_>,
        sub_sys_a: Option<&[usize]>,
        which: RdmSelection,
        sparse: bool,
    ) -> Result<ReducedDensityMatrices, BasisError> {
        let parts = self.bipartition(sub_sys_a)?;
        let (dim_a, dim_b) = parts.dims();
        let split: Vec<(usize, usize)> =
            (0..self.pars.full_dim()).map(|x| parts.split(&self.pars.digits(x))).collect();

        let mut rdm_a = Vec::new();
        let mut rdm_b = Vec::new();
        match state {
            QuantumState::Mixed(rho) => {
                if sparse {
                    return Err(BasisError::NotImplemented {
                        message: "only pure state calculation implemeted for sparse arrays".to_string(),
                    });
                }
                if rho.nrows() != rho.ncols() {
                    return Err(BasisError::argument("state", "mixed state input must be a square matrix"));
                }
                self.check_state_rows(rho.nrows())?;
                // <x1| P rho P^dagger |x2>, read off the rows of P rho and of P
                let proj = self.get_proj(Dtype::Complex128)?;
                let half = proj.mul_dense(rho);
                let element =
                    |x1: usize, x2: usize| -> Complex64 { proj.row(x2).map(|(j, p)| half[(x1, j)] * p.conj()).sum() };

                let mut index = vec![vec![0usize; dim_b]; dim_a];
                for (s, &(ia, ib)) in split.iter().enumerate() {
                    index[ia][ib] = s;
                }
                if which.wants_a() {
                    rdm_a.push(DMatrix::from_fn(dim_a, dim_a, |i, j| {
                        (0..dim_b).map(|b| element(index[i][b], index[j][b])).sum()
                    }));
                }
                if which.wants_b() {
                    rdm_b.push(DMatrix::from_fn(dim_b, dim_b, |i, j| {
                        (0..dim_a).map(|a| element(index[a][i], index[a][j])).sum()
                    }));
                }
            }
            QuantumState::Pure(v) => {
                let columns = DMatrix::from_column_slice(v.len(), 1, v.as_slice());
                self.trace_pure(&columns, &split, (dim_a, dim_b), which, sparse, &mut rdm_a, &mut rdm_b)?;
            }
            QuantumState::PureBatch(columns) => {
                self.trace_pure(columns, &split, (dim_a, dim_b), which, sparse, &mut rdm_a, &mut rdm_b)?;
            }
        }

        log::debug!("partial trace over {} | {} sites", parts.a.len(), parts.b.len());
        Ok(ReducedDensityMatrices {
            rdm_a: which.wants_a().then_some(rdm_a),
            rdm_b: which.wants_b().then_some(rdm_b),
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn trace_pure(
        &self,
        columns: &DMatrix<Complex64>,
        split: &[(usize, usize)],
        (dim_a, dim_b): (usize, usize),
        which: RdmSelection,
        sparse: bool,
        rdm_a: &mut Vec<DMatrix<Complex64>>,
        rdm_b: &mut Vec<DMatrix<Complex64>>,
    ) -> Result<(), BasisError> {
        self.check_state_rows(columns.nrows())?;
        if sparse {
            let full = self.get_vec_sparse(columns, Dtype::Complex128)?;
            let mut per_column: Vec<Vec<(usize, Complex64)>> = vec![Vec::new(); columns.ncols()];
            for (x, c, v) in full.triplets() {
                per_column[c].push((x, v));
            }
            for entries in per_column {
                if which.wants_a() {
                    let mut groups: HashMap<usize, Vec<(usize, Complex64)>> = HashMap::new();
                    for &(x, v) in &entries {
                        let (ia, ib) = split[x];
                        groups.entry(ib).or_default().push((ia, v));
                    }
                    let mut rho = DMatrix::zeros(dim_a, dim_a);
                    accumulate(&mut rho, &groups);
                    rdm_a.push(rho);
                }
                if which.wants_b() {
                    let mut groups: HashMap<usize, Vec<(usize, Complex64)>> = HashMap::new();
                    for &(x, v) in &entries {
                        let (ia, ib) = split[x];
                        groups.entry(ia).or_default().push((ib, v));
                    }
                    let mut rho = DMatrix::zeros(dim_b, dim_b);
                    accumulate(&mut rho, &groups);
                    rdm_b.push(rho);
                }
            }
        } else {
            let full = self.get_vec_dense(columns, Dtype::Complex128)?;
            for c in 0..full.ncols() {
                let mut psi = DMatrix::<Complex64>::zeros(dim_a, dim_b);
                for (x, &(ia, ib)) in split.iter().enumerate() {
                    psi[(ia, ib)] = full[(x, c)];
                }
                if which.wants_a() {
                    rdm_a.push(&psi * psi.adjoint());
                }
                if which.wants_b() {
                    rdm_b.push(psi.transpose() * psi.conjugate());
                }
            }
        }
        Ok(())
    }

    /// Entanglement entropy of the bipartition `A | B`.
    ///
    /// The entropy is computed from the smaller subsystem. `alpha == 1` gives the von Neumann
    /// entropy, other values `alpha >= 0` the Renyi entropy. `return_rdm` selects which
    /// reduced density matrices are returned alongside.
    pub fn ent_entropy(
        &self,
        state: QuantumState<'_>,
        sub_sys_a: Option<&[usize]>,
        return_rdm: Option<RdmSelection>,
        sparse: bool,
        alpha: f64,
    ) -> Result<EntanglementEntropy, BasisError> {
        if alpha.is_nan() || alpha < 0.0 {
            return Err(BasisError::argument("alpha", "alpha >= 0"));
        }
        if sub_sys_a.is_some_and(|sites| sites.len() == self.l) {
            return Err(BasisError::argument(
                "sub_sys_A",
                "Size of subsystem must be strictly smaller than total system size L!",
            ));
        }
        let l_a = sub_sys_a.map_or(self.l / 2, <[usize]>::len);
        let l_b = self.l.saturating_sub(l_a);

        let selection = match return_rdm {
            None if l_a <= l_b => RdmSelection::A,
            None => RdmSelection::B,
            Some(RdmSelection::A) if l_a <= l_b => RdmSelection::A,
            Some(RdmSelection::B) if l_b <= l_a => RdmSelection::B,
            Some(_) => RdmSelection::Both,
        };
        let rdms = self.partial_trace(state, sub_sys_a, selection, sparse)?;
        let use_a = match selection {
            RdmSelection::A => true,
            RdmSelection::B => false,
            RdmSelection::Both => l_a < l_b,
        };
        let source = if use_a { rdms.rdm_a.as_ref() } else { rdms.rdm_b.as_ref() };

        let eps = Dtype::Complex128.eps();
        let entropy = source
            .map(|rdms| {
                rdms.iter()
                    .map(|rho| {
                        let eigenvalues: Vec<f64> = rho.clone().symmetric_eigenvalues().iter().copied().collect();
                        entropy(&eigenvalues, alpha, eps)
                    })
                    .collect()
            })
            .unwrap_or_default();

        let (rdm_a, rdm_b) = match return_rdm {
            None => (None, None),
            Some(RdmSelection::A) => (rdms.rdm_a, None),
            Some(RdmSelection::B) => (None, rdms.rdm_b),
            Some(RdmSelection::Both) => (rdms.rdm_a, rdms.rdm_b),
        };
        Ok(EntanglementEntropy { entropy, rdm_a, rdm_b })
    }
}
