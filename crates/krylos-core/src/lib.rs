//! Dense vector kernels and sparse matrix storage for the Krylos solvers.
//!
//! This crate holds the numerical leaves: slice-based BLAS-1 kernels
//! ([`kernels`]) and the three sparse storage layouts the iterative solvers
//! operate on (compressed sparse row, block compressed sparse row, and
//! block-composite matrices for multi-field saddle-point systems).
//!
//! All matrix types expose the same matrix-vector products (`spmv` for
//! `y = A*x` and `spmv_acc` for `y += alpha*A*x`); the solver crate erases
//! the storage distinction behind its operator trait.

pub mod block;
pub mod bsr;
pub mod csr;
pub mod kernels;

mod error;

pub use block::BlockMatrix;
pub use bsr::BsrMatrix;
pub use csr::CsrMatrix;
pub use error::{Error, Result};
