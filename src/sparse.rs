// src/sparse.rs

//! Coordinate and compressed-row sparse matrices.
//!
//! Only what the embedding and the partial trace need: additive construction with
//! duplicate summation, zero elimination, and products against dense matrices.

use nalgebra::{DMatrix, Scalar};
use num_traits::Zero;
use std::ops::{Add, Mul};

/// Sparse matrix in coordinate format. Entries may repeat until [`CooMatrix::sum_duplicates`].
#[derive(Debug, Clone, PartialEq)]
pub struct CooMatrix<T> {
    nrows: usize,
    ncols: usize,
    rows: Vec<usize>,
    cols: Vec<usize>,
    values: Vec<T>,
}

impl<T> CooMatrix<T>
where
    T: Copy + Zero + PartialEq + Add<Output = T>,
{
    pub fn new(nrows: usize, ncols: usize) -> Self {
        Self { nrows, ncols, rows: Vec::new(), cols: Vec::new(), values: Vec::new() }
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Number of stored entries, duplicates included.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Adds `value` at `(row, col)`; entries at the same position are summed later.
    pub fn push(&mut self, row: usize, col: usize, value: T) {
        debug_assert!(row < self.nrows && col < self.ncols);
        self.rows.push(row);
        self.cols.push(col);
        self.values.push(value);
    }

    /// Sorts by `(row, col)` and merges repeated positions.
    pub fn sum_duplicates(&mut self) {
        let mut order: Vec<usize> = (0..self.values.len()).collect();
        order.sort_by_key(|&i| (self.rows[i], self.cols[i]));

        let mut rows = Vec::with_capacity(order.len());
        let mut cols = Vec::with_capacity(order.len());
        let mut values: Vec<T> = Vec::with_capacity(order.len());
        for i in order {
            let (r, c, v) = (self.rows[i], self.cols[i], self.values[i]);
            if rows.last() == Some(&r) && cols.last() == Some(&c) {
                if let Some(last) = values.last_mut() {
                    *last = *last + v;
                }
                continue;
            }
            rows.push(r);
            cols.push(c);
            values.push(v);
        }
        self.rows = rows;
        self.cols = cols;
        self.values = values;
    }

    /// Drops explicitly stored zeros.
    pub fn eliminate_zeros(&mut self) {
        let keep: Vec<usize> = (0..self.values.len()).filter(|&i| !self.values[i].is_zero()).collect();
        self.rows = keep.iter().map(|&i| self.rows[i]).collect();
        self.cols = keep.iter().map(|&i| self.cols[i]).collect();
        self.values = keep.iter().map(|&i| self.values[i]).collect();
    }

    /// Converts to compressed-row format, summing duplicates and dropping zeros.
    pub fn to_csr(mut self) -> CsrMatrix<T> {
        self.sum_duplicates();
        self.eliminate_zeros();
        let mut row_ptr = vec![0usize; self.nrows + 1];
        for &r in &self.rows {
            row_ptr[r + 1] += 1;
        }
        for i in 0..self.nrows {
            row_ptr[i + 1] += row_ptr[i];
        }
        CsrMatrix { nrows: self.nrows, ncols: self.ncols, row_ptr, col_indices: self.cols, values: self.values }
    }
}

/// Sparse matrix in Compressed Sparse Row format.
#[derive(Debug, Clone, PartialEq)]
pub struct CsrMatrix<T> {
    nrows: usize,
    ncols: usize,
    row_ptr: Vec<usize>,
    col_indices: Vec<usize>,
    values: Vec<T>,
}

impl<T> CsrMatrix<T>
where
    T: Copy + Zero + PartialEq + Add<Output = T> + Mul<Output = T>,
{
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Number of non-zero entries.
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Entries of row `i` as `(col, value)` pairs.
    pub fn row(&self, i: usize) -> impl Iterator<Item = (usize, T)> + '_ {
        let (start, end) = (self.row_ptr[i], self.row_ptr[i + 1]);
        self.col_indices[start..end].iter().copied().zip(self.values[start..end].iter().copied())
    }

    /// All entries as `(row, col, value)` triplets in row-major order.
    pub fn triplets(&self) -> impl Iterator<Item = (usize, usize, T)> + '_ {
        (0..self.nrows).flat_map(move |i| self.row(i).map(move |(j, v)| (i, j, v)))
    }
}

impl<T> CsrMatrix<T>
where
    T: Scalar + Copy + Zero + PartialEq + Add<Output = T> + Mul<Output = T>,
{
    /// Compute A * B for a dense `B`.
    pub fn mul_dense(&self, b: &DMatrix<T>) -> DMatrix<T> {
        let mut out = DMatrix::from_element(self.nrows, b.ncols(), T::zero());
        for i in 0..self.nrows {
            for (k, v) in self.row(i) {
                for j in 0..b.ncols() {
                    out[(i, j)] = out[(i, j)] + v * b[(k, j)];
                }
            }
        }
        out
    }

    pub fn to_dense(&self) -> DMatrix<T> {
        let mut out = DMatrix::from_element(self.nrows, self.ncols, T::zero());
        for (i, j, v) in self.triplets() {
            out[(i, j)] = v;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicates_are_summed() {
        let mut coo = CooMatrix::new(3, 2);
        coo.push(2, 1, 1.0);
        coo.push(0, 0, 2.0);
        coo.push(2, 1, 3.0);
        coo.push(1, 1, 0.0);
        coo.sum_duplicates();
        assert_eq!(coo.len(), 3);
        coo.eliminate_zeros();
        assert_eq!(coo.len(), 2);

        let csr = coo.to_csr();
        assert_eq!(csr.nnz(), 2);
        assert_eq!(csr.row(2).collect::<Vec<_>>(), vec![(1, 4.0)]);
        assert_eq!(csr.row(1).count(), 0);
    }

    #[test]
    fn test_cancelling_entries_vanish() {
        let mut coo = CooMatrix::new(2, 2);
        coo.push(0, 1, 1.5);
        coo.push(0, 1, -1.5);
        let csr = coo.to_csr();
        assert_eq!(csr.nnz(), 0);
    }

    #[test]
    fn test_products_match_dense() {
        let mut coo = CooMatrix::new(2, 3);
        coo.push(0, 0, 1.0);
        coo.push(0, 2, 2.0);
        coo.push(1, 1, -1.0);
        let csr = coo.to_csr();
        let b = DMatrix::from_row_slice(3, 1, &[1.0, 2.0, 3.0]);
        assert_eq!(csr.mul_dense(&b), DMatrix::from_row_slice(2, 1, &[7.0, -2.0]));
        assert_eq!(csr.to_dense()[(0, 2)], 2.0);
        assert_eq!(csr.triplets().collect::<Vec<_>>(), vec![(0, 0, 1.0), (0, 2, 2.0), (1, 1, -1.0)]);
    }
}
