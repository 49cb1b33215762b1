//! Variable-restart flexible preconditioned GMRES.
//!
//! Right-preconditioned restarted GMRES in which the restart parameter is
//! adapted between cycles from the observed convergence rate, after Baker,
//! Jessup, and Kolev, "A Simple Strategy for Varying the Restart Parameter
//! in GMRES(m)", J. Comput. Appl. Math. 230 (2009), pp. 751-761.
//!
//! "Flexible" means the preconditioner may change its action between
//! applications, so the preconditioned directions `z[k]` are stored
//! alongside the orthonormal basis `p[k]` and the solution update combines
//! the `z` vectors, not the `p` vectors.

use krylos_core::kernels::{axpby, axpy, copy, dot, norm2, scale};

use crate::config::{SolverConfig, StopType};
use crate::error::{Error, Result, Solution};
use crate::helpers::{check_dims, shrink_restart, try_vec};
use crate::monitor::ResidualMonitor;
use crate::operator::LinearOperator;
use crate::preconditioner::Preconditioner;

/// Convergence-rate ceiling: above this the iteration has stalled and the
/// next cycle resets to the full restart length. Roughly cos(8 degrees).
const CR_MAX: f64 = 0.99;
/// Convergence-rate floor: below this the iteration converges fast and the
/// current (shortened) restart is kept. Roughly cos(80 degrees).
const CR_MIN: f64 = 0.174;
/// Step by which the restart length shrinks between cycles.
const RESTART_DECREMENT: usize = 3;
/// The adapted restart length never goes below this.
const RESTART_MIN: usize = 3;

/// Pick the restart length for the next cycle from the convergence rate of
/// the previous one.
fn adapt_restart(cr: f64, current: usize, restart_max: usize, first_cycle: bool) -> usize {
    if cr > CR_MAX || first_cycle {
        restart_max
    } else if cr < CR_MIN {
        current
    } else if current > RESTART_DECREMENT + RESTART_MIN {
        current - RESTART_DECREMENT
    } else {
        restart_max
    }
}

/// Per-solve scratch buffers, sized by the effective restart length.
struct Workspace {
    /// Krylov basis, `restart + 1` vectors of length n.
    p: Vec<Vec<f64>>,
    /// Preconditioned directions, parallel to `p`.
    z: Vec<Vec<f64>>,
    /// Hessenberg coefficients, `(restart + 1) x restart`.
    hh: Vec<Vec<f64>>,
    /// Givens cosines, one per completed inner iteration.
    c: Vec<f64>,
    /// Givens sines.
    s: Vec<f64>,
    /// Residual projection in the rotated basis, `restart + 1`.
    rs: Vec<f64>,
    /// Scratch residual vector.
    r: Vec<f64>,
}

impl Workspace {
    /// Total f64 count for a given size, used in the fatal-error report.
    fn len_for(n: usize, restart: usize) -> usize {
        2 * (restart + 1) * n + (restart + 1) * restart + 3 * restart + 2 + n
    }

    fn try_new(n: usize, restart: usize) -> Option<Self> {
        let mut p = Vec::new();
        p.try_reserve_exact(restart + 1).ok()?;
        let mut z = Vec::new();
        z.try_reserve_exact(restart + 1).ok()?;
        for _ in 0..=restart {
            p.push(try_vec(n)?);
            z.push(try_vec(n)?);
        }
        let mut hh = Vec::new();
        hh.try_reserve_exact(restart + 1).ok()?;
        for _ in 0..=restart {
            hh.push(try_vec(restart)?);
        }
        Some(Self {
            p,
            z,
            hh,
            c: try_vec(restart)?,
            s: try_vec(restart)?,
            rs: try_vec(restart + 1)?,
            r: try_vec(n)?,
        })
    }

    /// Allocate at the requested restart, shrinking on failure until the
    /// floor is hit. Returns the workspace together with the restart
    /// length it was actually sized for.
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

/// Solve `A*x = b` by variable-restart flexible preconditioned GMRES.
///
/// `x` carries the initial guess in and the solution out. `pc` of `None`
/// means no preconditioning (identity). Returns the iteration count and
/// final relative residual, or [`Error::DidNotConverge`] when the budget
/// runs out.
pub fn vfgmres(
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

    let (mut ws, restart_eff) = Workspace::allocate(n, config.restart.max(1))?;
    if restart_eff < config.restart && config.verbosity.reports_warnings() {
        log::warn!("vFGMRES restart length reduced to {restart_eff}");
    }
    let restart_max = restart_eff;

    let mut iter: usize = 0;

    // r0 = b - A*x0, stored in p[0]
    op.apply(x, &mut ws.p[0]);
    axpby(1.0, b, -1.0, &mut ws.p[0]);

    let b_norm = norm2(b);
    let mut r_norm = norm2(&ws.p[0]);
    let mut monitor = ResidualMonitor::new(config.max_iter, r_norm, config.verbosity);
    monitor.report_norm("right-hand side", b_norm);
    monitor.report_norm("residual", r_norm);

    let den_norm = if b_norm > 0.0 { b_norm } else { r_norm };
    let epsilon = config.tol * den_norm;

    // Already converged at the initial guess.
    if r_norm < epsilon || r_norm < 1e-3 * config.tol {
        let relres = if den_norm > 0.0 { r_norm / den_norm } else { 0.0 };
        monitor.report_final(0, config.max_iter, relres);
        return Ok(Solution {
            iterations: 0,
            residual: relres,
            history: monitor.into_history(),
        });
    }

    let mut cr: f64 = 1.0;
    let mut restart_cur = restart_eff;
    let mut relres = r_norm / den_norm;
    let mut converged = false;

    'outer: while iter < config.max_iter {
        ws.rs[0] = r_norm;
        let r_norm_old = r_norm;
        if r_norm == 0.0 {
            relres = 0.0;
            converged = true;
            break;
        }

        restart_cur = adapt_restart(cr, restart_cur, restart_max, iter == 0);

        scale(1.0 / r_norm, &mut ws.p[0]);
        let mut i: usize = 0;

        // Restart cycle (right preconditioning).
        while i < restart_cur && iter < config.max_iter {
            i += 1;
            iter += 1;

            match pc {
                None => copy(&ws.p[i - 1], &mut ws.z[i - 1]),
                Some(m) => m.apply(&ws.p[i - 1], &mut ws.z[i - 1]),
            }

            {
                let (head, tail) = ws.p.split_at_mut(i);
                let pi = &mut tail[0];
                op.apply(&ws.z[i - 1], pi);

                // Modified Gram-Schmidt, in increasing j order.
                for j in 0..i {
                    let hji = dot(&head[j], pi);
                    ws.hh[j][i - 1] = hji;
                    axpy(-hji, &head[j], pi);
                }
                let t = norm2(pi);
                ws.hh[i][i - 1] = t;
                if t != 0.0 {
                    scale(1.0 / t, pi);
                }
            }

            // Apply the accumulated rotations to the new Hessenberg column,
            // in increasing row order.
            for j in 1..i {
                let t = ws.hh[j - 1][i - 1];
                ws.hh[j - 1][i - 1] = ws.s[j - 1] * ws.hh[j][i - 1] + ws.c[j - 1] * t;
                ws.hh[j][i - 1] = -ws.s[j - 1] * t + ws.c[j - 1] * ws.hh[j][i - 1];
            }

            // New rotation zeroing the subdiagonal entry. A zero gamma is
            // replaced with machine epsilon to keep the division defined.
            let mut gamma =
                (ws.hh[i][i - 1] * ws.hh[i][i - 1] + ws.hh[i - 1][i - 1] * ws.hh[i - 1][i - 1])
                    .sqrt();
            if gamma == 0.0 {
                gamma = f64::EPSILON;
            }
            ws.c[i - 1] = ws.hh[i - 1][i - 1] / gamma;
            ws.s[i - 1] = ws.hh[i][i - 1] / gamma;
            ws.rs[i] = -ws.s[i - 1] * ws.rs[i - 1];
            ws.rs[i - 1] = ws.c[i - 1] * ws.rs[i - 1];
            ws.hh[i - 1][i - 1] =
                ws.s[i - 1] * ws.hh[i][i - 1] + ws.c[i - 1] * ws.hh[i - 1][i - 1];

            r_norm = ws.rs[i].abs();
            monitor.record(r_norm);
            relres = if b_norm > 0.0 { r_norm / b_norm } else { r_norm };
            monitor.report_iteration(iter, relres, r_norm);

            if r_norm <= epsilon {
                break;
            }
        }

        // Back substitution through the rotated (upper triangular) Hessenberg
        // block; rs becomes the combination coefficients.
        ws.rs[i - 1] /= ws.hh[i - 1][i - 1];
        for k in (0..i - 1).rev() {
            let mut t = 0.0;
            for j in k + 1..i {
                t -= ws.hh[k][j] * ws.rs[j];
            }
            t += ws.rs[k];
            ws.rs[k] = t / ws.hh[k][k];
        }

        // x += sum_k rs[k] * z[k]: the flexible update combines the
        // preconditioned directions.
        copy(&ws.z[i - 1], &mut ws.r);
        scale(ws.rs[i - 1], &mut ws.r);
        for j in (0..i - 1).rev() {
            axpy(ws.rs[j], &ws.z[j], &mut ws.r);
        }
        axpy(1.0, &ws.r, x);

        if r_norm <= epsilon {
            // The projected residual can drift from the true one after many
            // rotations; recompute b - A*x before declaring convergence.
            op.apply(x, &mut ws.r);
            axpby(1.0, b, -1.0, &mut ws.r);
            r_norm = norm2(&ws.r);

            relres = match config.stop_type {
                StopType::RelRes => r_norm / den_norm,
                StopType::RelPrecRes => {
                    match pc {
                        None => copy(&ws.r, &mut ws.p[0]),
                        Some(m) => m.apply(&ws.r, &mut ws.p[0]),
                    }
                    dot(&ws.p[0], &ws.r).sqrt() / den_norm
                }
                StopType::ModRelRes => {
                    let normu = f64::EPSILON.max(norm2(x));
                    r_norm / normu
                }
            };

            if relres <= config.tol {
                converged = true;
                break 'outer;
            }
            if config.verbosity.reports_warnings() {
                log::warn!(
                    "vFGMRES false convergence at iteration {iter}, restarting from the true residual"
                );
            }
            copy(&ws.r, &mut ws.p[0]);
            i = 0;
        }

        // Rebuild the residual vector inside the basis by undoing the
        // rotation sequence, so the next cycle starts without an extra
        // operator application.
        for j in (1..=i).rev() {
            ws.rs[j - 1] = -ws.s[j - 1] * ws.rs[j];
            ws.rs[j] = ws.c[j - 1] * ws.rs[j];
        }

        if i > 0 {
            scale(ws.rs[i], &mut ws.p[i]);
            {
                let (head, tail) = ws.p.split_at_mut(i);
                let pi = &mut tail[0];
                for j in (1..i).rev() {
                    axpy(ws.rs[j], &head[j], pi);
                }
            }
            scale(ws.rs[0], &mut ws.p[0]);
            {
                let (head, tail) = ws.p.split_at_mut(i);
                axpy(1.0, &tail[0], &mut head[0]);
            }
        }

        cr = r_norm / r_norm_old;
    }

    monitor.report_final(iter, config.max_iter, relres);

    if converged {
        Ok(Solution {
            iterations: iter,
            residual: relres,
            history: monitor.into_history(),
        })
    } else {
        Err(Error::DidNotConverge {
            iterations: iter,
            residual: relres,
        })
    }
}
