//! Preconditioners for the Krylov engines.
//!
//! A preconditioner approximates `M^-1 ~ A^-1`; applying it to the residual
//! steers the search directions toward better-conditioned subspaces. The
//! engines accept `Option<&dyn Preconditioner>` and treat `None` as the
//! identity, so unpreconditioned solves carry no trait-object overhead in
//! the hot loop beyond a vector copy.
//!
//! The engines call `apply` exactly once per direction per iteration; an
//! expensive preconditioner (a multigrid V-cycle, say) is never invoked
//! redundantly. Because the solvers are *flexible*, the preconditioner may
//! change its action between applications.

use krylos_core::CsrMatrix;

/// Approximate inverse action `z = M^-1 * r`.
pub trait Preconditioner: Send + Sync {
    /// Apply the preconditioner to `r`, writing the result to `z`.
    fn apply(&self, r: &[f64], z: &mut [f64]);

    /// Dimension of the preconditioner.
    fn dim(&self) -> usize;
}

/// Identity preconditioner (no-op). Useful as a baseline and for testing
/// that the preconditioned path matches the unpreconditioned one.
pub struct IdentityPreconditioner {
    size: usize,
}

impl IdentityPreconditioner {
    /// Create an identity preconditioner of the given size.
    pub fn new(size: usize) -> Self {
        Self { size }
    }
}

impl Preconditioner for IdentityPreconditioner {
    fn apply(&self, r: &[f64], z: &mut [f64]) {
        z.copy_from_slice(r);
    }

    fn dim(&self) -> usize {
        self.size
    }
}

/// Jacobi (diagonal) preconditioner: `M = diag(A)`.
///
/// Near-zero diagonal entries are treated as 1.0 so they pass the residual
/// through unscaled instead of producing infinities.
pub struct JacobiPreconditioner {
    inv_diag: Vec<f64>,
}

impl JacobiPreconditioner {
    /// Create from a diagonal vector.
    pub fn from_diagonal(diag: &[f64]) -> Self {
        let inv_diag = diag
            .iter()
            .map(|&d| if d.abs() < 1e-30 { 1.0 } else { 1.0 / d })
            .collect();
        Self { inv_diag }
    }

    /// Create from a CSR matrix by extracting its diagonal.
    pub fn from_csr(a: &CsrMatrix) -> Self {
        Self::from_diagonal(&a.diagonal())
    }
}

impl Preconditioner for JacobiPreconditioner {
    fn apply(&self, r: &[f64], z: &mut [f64]) {
        debug_assert_eq!(r.len(), self.inv_diag.len());
        debug_assert_eq!(z.len(), self.inv_diag.len());
        for ((zi, &ri), &inv_di) in z.iter_mut().zip(r.iter()).zip(self.inv_diag.iter()) {
            *zi = ri * inv_di;
        }
    }

    fn dim(&self) -> usize {
        self.inv_diag.len()
    }
}
