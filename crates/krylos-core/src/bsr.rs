//! Block compressed sparse row matrices.
//!
//! A BSR matrix stores small dense square blocks instead of scalars; the
//! row-pointer and column-index arrays address block rows and block columns.
//! Blocks are stored row-major in one contiguous buffer, `bs * bs` entries
//! per block.

use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::kernels::PAR_THRESHOLD;

/// A sparse matrix of dense `bs x bs` blocks in block-CSR layout.
#[derive(Debug, Clone)]
pub struct BsrMatrix {
    nrowsb: usize,
    ncolsb: usize,
    block_size: usize,
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
    values: Vec<f64>,
}

impl BsrMatrix {
    /// Build from raw block-CSR arrays, validating the structure.
    pub fn from_raw_parts(
        nrowsb: usize,
        ncolsb: usize,
        block_size: usize,
        row_ptr: Vec<usize>,
        col_idx: Vec<usize>,
        values: Vec<f64>,
    ) -> Result<Self> {
        if block_size == 0 {
            return Err(Error::InvalidStructure("block size must be positive".into()));
        }
        if row_ptr.len() != nrowsb + 1 {
            return Err(Error::InvalidStructure(format!(
                "row_ptr has {} entries, expected {}",
                row_ptr.len(),
                nrowsb + 1
            )));
        }
        if row_ptr[0] != 0 || row_ptr[nrowsb] != col_idx.len() {
            return Err(Error::InvalidStructure(
                "row_ptr must start at 0 and end at nnzb".into(),
            ));
        }
        if row_ptr.windows(2).any(|w| w[0] > w[1]) {
            return Err(Error::InvalidStructure("row_ptr is not monotone".into()));
        }
        if let Some(&bad) = col_idx.iter().find(|&&c| c >= ncolsb) {
            return Err(Error::InvalidStructure(format!(
                "block column index {bad} out of range for {ncolsb} block columns"
            )));
        }
        let expected = col_idx.len() * block_size * block_size;
        if values.len() != expected {
            return Err(Error::DimensionMismatch {
                expected,
                actual: values.len(),
            });
        }
        Ok(Self {
            nrowsb,
            ncolsb,
            block_size,
            row_ptr,
            col_idx,
            values,
        })
    }

    /// Build from `(block_row, block_col, block)` triplets. Each block is a
    /// row-major `bs * bs` slice; duplicate positions are summed entrywise.
    pub fn from_block_triplets(
        nrowsb: usize,
        ncolsb: usize,
        block_size: usize,
        blocks: &[(usize, usize, Vec<f64>)],
    ) -> Result<Self> {
        let bs2 = block_size * block_size;
        for (r, c, block) in blocks {
            if *r >= nrowsb || *c >= ncolsb {
                return Err(Error::EntryOutOfBounds {
                    row: *r,
                    col: *c,
                    nrows: nrowsb,
                    ncols: ncolsb,
                });
            }
            if block.len() != bs2 {
                return Err(Error::DimensionMismatch {
                    expected: bs2,
                    actual: block.len(),
                });
            }
        }

        let mut rows: Vec<Vec<(usize, &[f64])>> = vec![Vec::new(); nrowsb];
        for (r, c, block) in blocks {
            rows[*r].push((*c, block.as_slice()));
        }

        let mut row_ptr = Vec::with_capacity(nrowsb + 1);
        let mut col_idx = Vec::new();
        let mut values = Vec::new();
        row_ptr.push(0);
        for row in rows.iter_mut() {
            row.sort_unstable_by_key(|&(c, _)| c);
            let mut iter = row.iter();
            if let Some(&(first_c, first_b)) = iter.next() {
                let mut cur_c = first_c;
                let mut cur_b = first_b.to_vec();
                for &(c, b) in iter {
                    if c == cur_c {
                        for (acc, &v) in cur_b.iter_mut().zip(b.iter()) {
                            *acc += v;
                        }
                    } else {
                        col_idx.push(cur_c);
                        values.extend_from_slice(&cur_b);
                        cur_c = c;
                        cur_b = b.to_vec();
                    }
                }
                col_idx.push(cur_c);
                values.extend_from_slice(&cur_b);
            }
            row_ptr.push(col_idx.len());
        }

        Ok(Self {
            nrowsb,
            ncolsb,
            block_size,
            row_ptr,
            col_idx,
            values,
        })
    }

    /// Scalar row count (`nrowsb * block_size`).
    pub fn nrows(&self) -> usize {
        self.nrowsb * self.block_size
    }

    /// Scalar column count (`ncolsb * block_size`).
    pub fn ncols(&self) -> usize {
        self.ncolsb * self.block_size
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Number of stored blocks.
    pub fn nnzb(&self) -> usize {
        self.col_idx.len()
    }

    /// Compute one scalar block-row of the product into `y_row`.
    #[inline]
    fn block_row_mv(&self, ib: usize, x: &[f64], y_row: &mut [f64]) {
        let bs = self.block_size;
        for idx in self.row_ptr[ib]..self.row_ptr[ib + 1] {
            let jb = self.col_idx[idx];
            let block = &self.values[idx * bs * bs..(idx + 1) * bs * bs];
            let xb = &x[jb * bs..(jb + 1) * bs];
            for r in 0..bs {
                let mut acc = 0.0;
                for c in 0..bs {
                    acc += block[r * bs + c] * xb[c];
                }
                y_row[r] += acc;
            }
        }
    }

    /// Matrix-vector product: `y = A * x`.
    pub fn spmv(&self, x: &[f64], y: &mut [f64]) {
        debug_assert_eq!(x.len(), self.ncols());
        debug_assert_eq!(y.len(), self.nrows());
        let bs = self.block_size;
        if self.values.len() >= PAR_THRESHOLD {
            y.par_chunks_mut(bs).enumerate().for_each(|(ib, y_row)| {
                y_row.fill(0.0);
                self.block_row_mv(ib, x, y_row);
            });
        } else {
            for (ib, y_row) in y.chunks_mut(bs).enumerate() {
                y_row.fill(0.0);
                self.block_row_mv(ib, x, y_row);
            }
        }
    }

    /// Accumulating product: `y += alpha * A * x`.
    pub fn spmv_acc(&self, alpha: f64, x: &[f64], y: &mut [f64]) {
        debug_assert_eq!(x.len(), self.ncols());
        debug_assert_eq!(y.len(), self.nrows());
        let bs = self.block_size;
        let mut scratch = vec![0.0; bs];
        for (ib, y_row) in y.chunks_mut(bs).enumerate() {
            scratch.fill(0.0);
            self.block_row_mv(ib, x, &mut scratch);
            for (yi, &si) in y_row.iter_mut().zip(scratch.iter()) {
                *yi += alpha * si;
            }
        }
    }
}
