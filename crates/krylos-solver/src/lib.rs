//! Preconditioned Krylov subspace solvers.
//!
//! The two engines here solve large sparse systems `A*x = b` by right
//! preconditioning:
//!
//! - [`vfgmres`] - flexible GMRES with a variable restart parameter that is
//!   adapted between restart cycles from the observed convergence rate
//!   (Baker, Jessup, Kolev, "A Simple Strategy for Varying the Restart
//!   Parameter in GMRES(m)", J. Comput. Appl. Math. 230, 2009).
//! - [`gcr`] - the generalized conjugate residual method, which skips basis
//!   renormalization and Givens rotations in favor of direct residual
//!   updates with cheap incremental norm tracking.
//!
//! Both engines are written once against the [`LinearOperator`] trait, so
//! CSR, block-CSR, block-composite, and matrix-free operators all share the
//! same iteration code. The [`dispatch::solve`] entry point erases the
//! storage distinction entirely.
//!
//! # Usage
//!
//! ```ignore
//! use krylos_core::CsrMatrix;
//! use krylos_solver::{solve, Method, OperatorKind, SolverConfig};
//!
//! let a = CsrMatrix::from_diagonal(&[1.0, 2.0, 3.0, 4.0]);
//! let b = vec![1.0; 4];
//! let mut x = vec![0.0; 4];
//! let sol = solve(OperatorKind::Csr(&a), &b, &mut x, None,
//!                 Method::Vfgmres, &SolverConfig::default())?;
//! println!("converged in {} iterations", sol.iterations);
//! ```

pub mod dispatch;
pub mod gcr;
pub mod monitor;
pub mod operator;
pub mod preconditioner;
pub mod vfgmres;

mod config;
mod error;
mod helpers;

pub use config::{SolverConfig, StopType, Verbosity};
pub use dispatch::{Method, OperatorKind, solve};
pub use error::{Error, Result, Solution};
pub use monitor::ResidualMonitor;
pub use operator::{LinearOperator, MatFreeOperator};
pub use preconditioner::{IdentityPreconditioner, JacobiPreconditioner, Preconditioner};
pub use gcr::gcr;
pub use vfgmres::vfgmres;
