//! Residual-norm bookkeeping shared by both engines.

use crate::config::Verbosity;

/// Tracks the residual-norm history of one solve and renders progress.
///
/// Pure bookkeeping: the monitor never influences the iteration, it only
/// records what the engine tells it and answers the "is the tolerance met"
/// question. The engines decide what they record (VFGMRES appends absolute
/// norms; GCR appends squared relative norms).
#[derive(Debug, Clone)]
pub struct ResidualMonitor {
    norms: Vec<f64>,
    verbosity: Verbosity,
}

impl ResidualMonitor {
    /// Create a monitor sized for `max_iter` iterations plus the initial
    /// residual, recording the initial value immediately.
    pub fn new(max_iter: usize, initial: f64, verbosity: Verbosity) -> Self {
        let mut norms = Vec::with_capacity(max_iter + 1);
        norms.push(initial);
        Self { norms, verbosity }
    }

    /// Append the norm for the next completed iteration.
    pub fn record(&mut self, norm: f64) {
        self.norms.push(norm);
    }

    /// The most recently recorded norm.
    pub fn last(&self) -> f64 {
        *self.norms.last().unwrap_or(&f64::INFINITY)
    }

    /// Contraction factor between the last two recorded norms, or 0 when
    /// fewer than two values have been recorded.
    pub fn contraction(&self) -> f64 {
        match self.norms.as_slice() {
            [.., prev, last] if *prev != 0.0 => last / prev,
            _ => 0.0,
        }
    }

    /// Has the most recent norm met the given threshold?
    pub fn met(&self, threshold: f64) -> bool {
        self.last() <= threshold
    }

    /// Number of recorded values (including the initial residual).
    pub fn len(&self) -> usize {
        self.norms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.norms.is_empty()
    }

    /// Consume the monitor and return the recorded history.
    pub fn into_history(self) -> Vec<f64> {
        self.norms
    }

    /// Report one iteration at `Verbosity::More`.
    pub fn report_iteration(&self, iter: usize, relres: f64, absres: f64) {
        if self.verbosity >= Verbosity::More {
            log::debug!(
                "iter {iter:5}  relres {relres:13.6e}  absres {absres:13.6e}  factor {:.4}",
                self.contraction()
            );
        }
    }

    /// Report a named norm once at `Verbosity::Some` (initial norms).
    pub fn report_norm(&self, label: &str, value: f64) {
        if self.verbosity >= Verbosity::Some {
            log::debug!("2-norm of {label} = {value:.6e}");
        }
    }

    /// Report the final outcome at `Verbosity::Min` and above.
    pub fn report_final(&self, iterations: usize, max_iter: usize, relres: f64) {
        if self.verbosity < Verbosity::Min {
            return;
        }
        if iterations >= max_iter {
            log::info!("Maximal iteration {max_iter} reached, relative residual {relres:.6e}");
        } else {
            log::info!("Converged in {iterations} iterations, relative residual {relres:.6e}");
        }
    }
}
