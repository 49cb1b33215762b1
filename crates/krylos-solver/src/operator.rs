//! The operator abstraction the Krylov engines iterate against.

use krylos_core::{BlockMatrix, BsrMatrix, CsrMatrix};

/// A square linear operator exposing only its action `y = A * x`.
///
/// The engines never inspect the operator's storage; CSR, block-CSR,
/// block-composite, and matrix-free operators all go through this one
/// method. The operator is never mutated during a solve.
pub trait LinearOperator: Send + Sync {
    /// Row (and column) dimension.
    fn dim(&self) -> usize;

    /// Compute `y = A * x`. Both slices have length [`LinearOperator::dim`].
    fn apply(&self, x: &[f64], y: &mut [f64]);
}

impl LinearOperator for CsrMatrix {
    fn dim(&self) -> usize {
        self.nrows()
    }

    fn apply(&self, x: &[f64], y: &mut [f64]) {
        self.spmv(x, y);
    }
}

impl LinearOperator for BsrMatrix {
    fn dim(&self) -> usize {
        self.nrows()
    }

    fn apply(&self, x: &[f64], y: &mut [f64]) {
        self.spmv(x, y);
    }
}

impl LinearOperator for BlockMatrix {
    fn dim(&self) -> usize {
        self.nrows()
    }

    fn apply(&self, x: &[f64], y: &mut [f64]) {
        self.spmv(x, y);
    }
}

/// A matrix-free operator: the caller supplies the action as a closure and
/// never materializes the matrix. The closure owns whatever state it needs.
pub struct MatFreeOperator {
    n: usize,
    apply_fn: Box<dyn Fn(&[f64], &mut [f64]) + Send + Sync>,
}

impl MatFreeOperator {
    /// Wrap an apply function for an `n x n` operator.
    pub fn new<F>(n: usize, apply_fn: F) -> Self
    where
        F: Fn(&[f64], &mut [f64]) + Send + Sync + 'static,
    {
        Self {
            n,
            apply_fn: Box::new(apply_fn),
        }
    }
}

impl LinearOperator for MatFreeOperator {
    fn dim(&self) -> usize {
        self.n
    }

    fn apply(&self, x: &[f64], y: &mut [f64]) {
        (self.apply_fn)(x, y);
    }
}
