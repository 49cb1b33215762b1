//! Block-composite matrices for multi-field systems.
//!
//! A block-composite matrix is a coarse grid of independent CSR blocks, the
//! layout that arises from saddle-point problems such as Stokes or mixed
//! formulations:
//!
//! ```text
//!   [ A  B^T ]
//!   [ B   0  ]
//! ```
//!
//! Missing (structurally zero) blocks are simply absent.

use crate::csr::CsrMatrix;
use crate::error::{Error, Result};

/// A matrix assembled from a `brows x bcols` grid of optional CSR blocks.
#[derive(Debug, Clone)]
pub struct BlockMatrix {
    brows: usize,
    bcols: usize,
    blocks: Vec<Option<CsrMatrix>>,
    /// Scalar offset of each block row; `row_offsets[brows]` is the total row count.
    row_offsets: Vec<usize>,
    /// Scalar offset of each block column; `col_offsets[bcols]` is the total column count.
    col_offsets: Vec<usize>,
}

impl BlockMatrix {
    /// Assemble from a grid of optional blocks, given row-major.
    ///
    /// All present blocks in a grid row must share their row count, and all
    /// present blocks in a grid column must share their column count. A grid
    /// row or column with no present block has undefined extent and is
    /// rejected.
    pub fn new(grid: Vec<Vec<Option<CsrMatrix>>>) -> Result<Self> {
        let brows = grid.len();
        if brows == 0 {
            return Err(Error::InvalidStructure("empty block grid".into()));
        }
        let bcols = grid[0].len();
        if bcols == 0 || grid.iter().any(|row| row.len() != bcols) {
            return Err(Error::InvalidStructure(
                "block grid rows must be non-empty and equally sized".into(),
            ));
        }

        let mut row_dims = vec![None; brows];
        let mut col_dims = vec![None; bcols];
        for (i, row) in grid.iter().enumerate() {
            for (j, block) in row.iter().enumerate() {
                let Some(a) = block else { continue };
                match row_dims[i] {
                    None => row_dims[i] = Some(a.nrows()),
                    Some(r) if r != a.nrows() => {
                        return Err(Error::DimensionMismatch {
                            expected: r,
                            actual: a.nrows(),
                        });
                    }
                    _ => {}
                }
                match col_dims[j] {
                    None => col_dims[j] = Some(a.ncols()),
                    Some(c) if c != a.ncols() => {
                        return Err(Error::DimensionMismatch {
                            expected: c,
                            actual: a.ncols(),
                        });
                    }
                    _ => {}
                }
            }
        }

        let mut row_offsets = Vec::with_capacity(brows + 1);
        row_offsets.push(0);
        for (i, dim) in row_dims.iter().enumerate() {
            let Some(r) = dim else {
                return Err(Error::InvalidStructure(format!(
                    "block row {i} has no blocks, extent is undefined"
                )));
            };
            row_offsets.push(row_offsets[i] + r);
        }
        let mut col_offsets = Vec::with_capacity(bcols + 1);
        col_offsets.push(0);
        for (j, dim) in col_dims.iter().enumerate() {
            let Some(c) = dim else {
                return Err(Error::InvalidStructure(format!(
                    "block column {j} has no blocks, extent is undefined"
                )));
            };
            col_offsets.push(col_offsets[j] + c);
        }

        let blocks = grid.into_iter().flatten().collect();
        Ok(Self {
            brows,
            bcols,
            blocks,
            row_offsets,
            col_offsets,
        })
    }

    /// Scalar row count of the assembled matrix.
    pub fn nrows(&self) -> usize {
        self.row_offsets[self.brows]
    }

    /// Scalar column count of the assembled matrix.
    pub fn ncols(&self) -> usize {
        self.col_offsets[self.bcols]
    }

    /// The block at grid position (i, j), if present.
    pub fn block(&self, i: usize, j: usize) -> Option<&CsrMatrix> {
        self.blocks[i * self.bcols + j].as_ref()
    }

    /// Matrix-vector product: `y = A * x`.
    pub fn spmv(&self, x: &[f64], y: &mut [f64]) {
        debug_assert_eq!(x.len(), self.ncols());
        debug_assert_eq!(y.len(), self.nrows());
        y.fill(0.0);
        self.spmv_acc(1.0, x, y);
    }

    /// Accumulating product: `y += alpha * A * x`.
    pub fn spmv_acc(&self, alpha: f64, x: &[f64], y: &mut [f64]) {
        debug_assert_eq!(x.len(), self.ncols());
        debug_assert_eq!(y.len(), self.nrows());
        for i in 0..self.brows {
            let y_range = self.row_offsets[i]..self.row_offsets[i + 1];
            for j in 0..self.bcols {
                let Some(a) = self.block(i, j) else { continue };
                let xj = &x[self.col_offsets[j]..self.col_offsets[j + 1]];
                a.spmv_acc(alpha, xj, &mut y[y_range.clone()]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn saddle_point() -> BlockMatrix {
        // [ 2I  B^T ]        [2 0 | 1]
        // [ B    0  ]  ==>   [0 2 | 1]
        //                    [1 1 | 0]
        let a = CsrMatrix::from_diagonal(&[2.0, 2.0]);
        let bt = CsrMatrix::from_triplets(2, 1, &[(0, 0, 1.0), (1, 0, 1.0)]).unwrap();
        let b = CsrMatrix::from_triplets(1, 2, &[(0, 0, 1.0), (0, 1, 1.0)]).unwrap();
        BlockMatrix::new(vec![vec![Some(a), Some(bt)], vec![Some(b), None]]).unwrap()
    }

    #[test]
    fn block_dimensions() {
        let m = saddle_point();
        assert_eq!(m.nrows(), 3);
        assert_eq!(m.ncols(), 3);
    }

    #[test]
    fn block_spmv_matches_flat_csr() {
        let m = saddle_point();
        let flat = CsrMatrix::from_triplets(
            3,
            3,
            &[
                (0, 0, 2.0),
                (1, 1, 2.0),
                (0, 2, 1.0),
                (1, 2, 1.0),
                (2, 0, 1.0),
                (2, 1, 1.0),
            ],
        )
        .unwrap();

        let x = vec![1.0, -2.0, 3.0];
        let mut y_block = vec![0.0; 3];
        let mut y_flat = vec![0.0; 3];
        m.spmv(&x, &mut y_block);
        flat.spmv(&x, &mut y_flat);
        for (a, b) in y_block.iter().zip(y_flat.iter()) {
            assert!((a - b).abs() < 1e-14);
        }
    }

    #[test]
    fn rejects_inconsistent_block_rows() {
        let a = CsrMatrix::identity(2);
        let b = CsrMatrix::identity(3);
        let result = BlockMatrix::new(vec![vec![Some(a), Some(b)]]);
        assert!(result.is_err());
    }

    #[test]
    fn rejects_empty_block_row() {
        let a = CsrMatrix::identity(2);
        let result = BlockMatrix::new(vec![vec![Some(a), None], vec![None, None]]);
        assert!(result.is_err());
    }
}
