//! Compressed sparse row matrices.

use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::kernels::PAR_THRESHOLD;

/// A sparse matrix in compressed-sparse-row layout.
///
/// Row `i` occupies `col_idx[row_ptr[i]..row_ptr[i+1]]` and the matching
/// slice of `values`. Column indices within a row are not required to be
/// sorted; matrix-vector products do not depend on their order.
#[derive(Debug, Clone)]
pub struct CsrMatrix {
    nrows: usize,
    ncols: usize,
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
    values: Vec<f64>,
}

impl CsrMatrix {
    /// Build from raw CSR arrays, validating the structure.
    pub fn from_raw_parts(
        nrows: usize,
        ncols: usize,
        row_ptr: Vec<usize>,
        col_idx: Vec<usize>,
        values: Vec<f64>,
    ) -> Result<Self> {
        if row_ptr.len() != nrows + 1 {
            return Err(Error::InvalidStructure(format!(
                "row_ptr has {} entries, expected {}",
                row_ptr.len(),
                nrows + 1
            )));
        }
        if row_ptr[0] != 0 || row_ptr[nrows] != col_idx.len() {
            return Err(Error::InvalidStructure(
                "row_ptr must start at 0 and end at nnz".into(),
            ));
        }
        if row_ptr.windows(2).any(|w| w[0] > w[1]) {
            return Err(Error::InvalidStructure("row_ptr is not monotone".into()));
        }
        if col_idx.len() != values.len() {
            return Err(Error::DimensionMismatch {
                expected: col_idx.len(),
                actual: values.len(),
            });
        }
        if let Some(&bad) = col_idx.iter().find(|&&c| c >= ncols) {
            return Err(Error::InvalidStructure(format!(
                "column index {bad} out of range for {ncols} columns"
            )));
        }
        Ok(Self {
            nrows,
            ncols,
            row_ptr,
            col_idx,
            values,
        })
    }

    /// Build from `(row, col, value)` triplets. Duplicate entries at the
    /// same position are summed.
    pub fn from_triplets(
        nrows: usize,
        ncols: usize,
        triplets: &[(usize, usize, f64)],
    ) -> Result<Self> {
        for &(r, c, _) in triplets {
            if r >= nrows || c >= ncols {
                return Err(Error::EntryOutOfBounds {
                    row: r,
                    col: c,
                    nrows,
                    ncols,
                });
            }
        }

        // Bucket triplets per row, then merge duplicates within each row.
        let mut rows: Vec<Vec<(usize, f64)>> = vec![Vec::new(); nrows];
        for &(r, c, v) in triplets {
            rows[r].push((c, v));
        }

        let mut row_ptr = Vec::with_capacity(nrows + 1);
        let mut col_idx = Vec::with_capacity(triplets.len());
        let mut values = Vec::with_capacity(triplets.len());
        row_ptr.push(0);
        for row in rows.iter_mut() {
            row.sort_unstable_by_key(|&(c, _)| c);
            let mut it = row.iter().copied();
            if let Some((mut cur_c, mut cur_v)) = it.next() {
                for (c, v) in it {
                    if c == cur_c {
                        cur_v += v;
                    } else {
                        col_idx.push(cur_c);
                        values.push(cur_v);
                        cur_c = c;
                        cur_v = v;
                    }
                }
                col_idx.push(cur_c);
                values.push(cur_v);
            }
            row_ptr.push(col_idx.len());
        }

        Ok(Self {
            nrows,
            ncols,
            row_ptr,
            col_idx,
            values,
        })
    }

    /// The `n x n` identity matrix.
    pub fn identity(n: usize) -> Self {
        Self {
            nrows: n,
            ncols: n,
            row_ptr: (0..=n).collect(),
            col_idx: (0..n).collect(),
            values: vec![1.0; n],
        }
    }

    /// A diagonal matrix from the given entries.
    pub fn from_diagonal(diag: &[f64]) -> Self {
        let n = diag.len();
        Self {
            nrows: n,
            ncols: n,
            row_ptr: (0..=n).collect(),
            col_idx: (0..n).collect(),
            values: diag.to_vec(),
        }
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Number of stored entries.
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Main diagonal, with zeros where no entry is stored.
    pub fn diagonal(&self) -> Vec<f64> {
        let mut diag = vec![0.0; self.nrows.min(self.ncols)];
        for i in 0..diag.len() {
            for idx in self.row_ptr[i]..self.row_ptr[i + 1] {
                if self.col_idx[idx] == i {
                    diag[i] += self.values[idx];
                }
            }
        }
        diag
    }

    #[inline]
    fn row_dot(&self, i: usize, x: &[f64]) -> f64 {
        let mut acc = 0.0;
        for idx in self.row_ptr[i]..self.row_ptr[i + 1] {
            acc += self.values[idx] * x[self.col_idx[idx]];
        }
        acc
    }

    /// Matrix-vector product: `y = A * x`.
    pub fn spmv(&self, x: &[f64], y: &mut [f64]) {
        debug_assert_eq!(x.len(), self.ncols);
        debug_assert_eq!(y.len(), self.nrows);
        if self.nnz() >= PAR_THRESHOLD {
            y.par_iter_mut()
                .enumerate()
                .for_each(|(i, yi)| *yi = self.row_dot(i, x));
        } else {
            for (i, yi) in y.iter_mut().enumerate() {
                *yi = self.row_dot(i, x);
            }
        }
    }

    /// Accumulating product: `y += alpha * A * x`.
    pub fn spmv_acc(&self, alpha: f64, x: &[f64], y: &mut [f64]) {
        debug_assert_eq!(x.len(), self.ncols);
        debug_assert_eq!(y.len(), self.nrows);
        if self.nnz() >= PAR_THRESHOLD {
            y.par_iter_mut()
                .enumerate()
                .for_each(|(i, yi)| *yi += alpha * self.row_dot(i, x));
        } else {
            for (i, yi) in y.iter_mut().enumerate() {
                *yi += alpha * self.row_dot(i, x);
            }
        }
    }
}
