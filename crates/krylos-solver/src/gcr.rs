//! Preconditioned generalized conjugate residual method.
//!
//! Restarted GCR after Notay, "An Aggregation-Based Algebraic Multigrid
//! Method", ETNA 37 (2010). The residual norm is tracked incrementally in
//! squared form and recomputed exactly whenever it drops near the
//! cancellation threshold, so one inner iteration costs a single operator
//! application and a single preconditioner application.

use krylos_core::kernels::{axpy, copy, dot};

use crate::config::SolverConfig;
use crate::error::{Error, Result, Solution};
use crate::helpers::{check_dims, shrink_restart, try_vec};
use crate::monitor::ResidualMonitor;
use crate::operator::LinearOperator;
use crate::preconditioner::Preconditioner;

/// Per-solve scratch buffers, sized by the effective restart length.
struct Workspace {
    /// Preconditioned directions, `restart` vectors of length n.
    z: Vec<Vec<f64>>,
    /// Conjugate directions `A*z`, orthogonalized, parallel to `z`.
    c: Vec<Vec<f64>>,
    /// Orthogonalization coefficients, lower triangular with the squared
    /// direction norms on the diagonal.
    h: Vec<Vec<f64>>,
    /// Projection coefficients, one per inner iteration.
    alp: Vec<f64>,
    /// Combination coefficients after the triangular solve.
    tmpx: Vec<f64>,
    /// Current residual.
    r: Vec<f64>,
}

impl Workspace {
    /// Total f64 count for a given size, used in the fatal-error report.
    fn len_for(n: usize, restart: usize) -> usize {
        2 * restart * n + restart * restart + 2 * restart + n
    }

    fn try_new(n: usize, restart: usize) -> Option<Self> {
        let mut z = Vec::new();
        z.try_reserve_exact(restart).ok()?;
        let mut c = Vec::new();
        c.try_reserve_exact(restart).ok()?;
        let mut h = Vec::new();
        h.try_reserve_exact(restart).ok()?;
        for _ in 0..restart {
            z.push(try_vec(n)?);
            c.push(try_vec(n)?);
            h.push(try_vec(restart)?);
        }
        Some(Self {
            z,
            c,
            h,
            alp: try_vec(restart)?,
            tmpx: try_vec(restart)?,
            r: try_vec(n)?,
        })
    }

    fn allocate(n: usize, requested: usize) -> Result<(Self, usize)> {
        let mut restart = requested;
        loop {
            if let Some(ws) = Self::try_new(n, restart) {
                return Ok((ws, restart));
            }
            match shrink_restart(restart) {
                Some(smaller) => restart = smaller,
                None => {
                    return Err(Error::OutOfMemory {
                        requested: Self::len_for(n, restart),
                    });
                }
            }
        }
    }
}

/// Solve `A*x = b` by restarted preconditioned GCR.
///
/// `x` carries the initial guess in and the solution out; on the first
/// restart cycle the accumulated correction overwrites `x`, so a zero
/// initial guess is assumed. `pc` of `None` means no preconditioning.
pub fn gcr(
    op: &dyn LinearOperator,
    b: &[f64],
    x: &mut [f64],
    pc: Option<&dyn Preconditioner>,
    config: &SolverConfig,
) -> Result<Solution> {
    let n = op.dim();
    check_dims(n, b, x, pc)?;

    if config.max_iter == 0 {
        return Err(Error::DidNotConverge {
            iterations: 0,
            residual: f64::INFINITY,
        });
    }

    let requested = config.restart.max(1).min(config.max_iter);
    let (mut ws, restart_eff) = Workspace::allocate(n, requested)?;
    if restart_eff < requested && config.verbosity.reports_warnings() {
        log::warn!("GCR restart length reduced to {restart_eff}");
    }

    let mut iter: usize = 0;

    // r = b - A*x0, using c[0] as scratch for the operator product.
    op.apply(x, &mut ws.c[0]);
    copy(b, &mut ws.r);
    axpy(-1.0, &ws.c[0], &mut ws.r);

    let mut absres = dot(&ws.r, &ws.r);
    let absres0 = f64::EPSILON.max(absres);
    let mut relres = absres / absres0;

    let mut monitor = ResidualMonitor::new(config.max_iter, relres, config.verbosity);
    monitor.report_norm("residual", absres0.sqrt());

    // Below this the incrementally tracked squared norm has lost too many
    // digits to cancellation and gets recomputed from the vector.
    let mut checktol = (config.tol * config.tol * absres0).max(absres * 1.0e-4);

    let mut first_cycle = true;

    while iter < config.max_iter && relres.sqrt() > config.tol {
        let mut used: usize = 0;

        while used < restart_eff && iter < config.max_iter {
            let i = used;
            used += 1;
            iter += 1;

            match pc {
                None => copy(&ws.r, &mut ws.z[i]),
                Some(m) => m.apply(&ws.r, &mut ws.z[i]),
            }

            {
                let (head, tail) = ws.c.split_at_mut(i);
                let ci = &mut tail[0];
                op.apply(&ws.z[i], ci);

                // Orthogonalize against the previous directions.
                for j in 0..i {
                    let g = dot(&head[j], ci);
                    ws.h[i][j] = g / ws.h[j][j];
                    axpy(-ws.h[i][j], &head[j], ci);
                }
                let gamma = dot(ci, ci);
                ws.h[i][i] = gamma;

                let alpha = dot(ci, &ws.r);
                let beta = alpha / gamma;
                ws.alp[i] = beta;

                axpy(-beta, ci, &mut ws.r);

                // Incremental update of ||r||^2.
                absres -= alpha * alpha / gamma;
            }

            if absres < checktol {
                absres = dot(&ws.r, &ws.r);
                checktol = (config.tol * config.tol * absres0).max(absres * 1.0e-4);
            }

            relres = absres / absres0;
            monitor.record(relres);
            monitor.report_iteration(iter, relres.sqrt(), absres.sqrt());

            if relres.sqrt() < config.tol {
                break;
            }
        }

        // Triangular solve turning the projection coefficients into
        // combination coefficients for the z directions.
        for k in (0..used).rev() {
            ws.tmpx[k] = ws.alp[k];
            for j in 0..k {
                ws.alp[j] -= ws.h[k][j] * ws.tmpx[k];
            }
        }

        if first_cycle {
            x.fill(0.0);
            first_cycle = false;
        }
        for k in 0..used {
            axpy(ws.tmpx[k], &ws.z[k], x);
        }
    }

    let final_relres = relres.sqrt();
    monitor.report_final(iter, config.max_iter, final_relres);

    if final_relres <= config.tol {
        Ok(Solution {
            iterations: iter,
            residual: final_relres,
            history: monitor.into_history(),
        })
    } else {
        Err(Error::DidNotConverge {
            iterations: iter,
            residual: final_relres,
        })
    }
}
