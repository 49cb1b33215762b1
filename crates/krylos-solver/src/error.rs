//! Error and outcome types for the solver crate.

use thiserror::Error;

/// Successful solve outcome.
#[derive(Debug, Clone)]
pub struct Solution {
    /// Number of iterations performed.
    pub iterations: usize,
    /// Final relative residual under the configured stopping criterion.
    pub residual: f64,
    /// Residual-norm history, one entry per recorded iteration (entry 0 is
    /// the initial residual). VFGMRES records absolute norms; GCR records
    /// squared relative norms, matching its internal tracking.
    pub history: Vec<f64>,
}

/// Errors that can occur during an iterative solve.
#[derive(Debug, Error)]
pub enum Error {
    /// The iteration budget ran out before the tolerance was met. Carries
    /// the work performed so callers can treat it as a soft failure.
    #[error("Did not converge in {iterations} iterations (residual {residual:.4e})")]
    DidNotConverge { iterations: usize, residual: f64 },

    /// Workspace allocation failed even at the minimum restart length.
    #[error("Workspace allocation of {requested} values failed at the minimum restart length")]
    OutOfMemory { requested: usize },

    /// An algorithm name did not match any known method.
    #[error("Unknown solver method '{0}'")]
    UnknownMethod(String),

    /// A stopping-criterion name did not match any known type.
    #[error("Unknown stopping type '{0}'")]
    UnknownStopType(String),

    /// Vector or preconditioner sizes disagree with the operator.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Result type for solver operations.
pub type Result<T> = std::result::Result<T, Error>;
