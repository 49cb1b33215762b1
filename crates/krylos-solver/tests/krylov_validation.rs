//! End-to-end validation of the Krylov engines against systems with known
//! solutions.
//!
//! The tests cross-check three things:
//! 1. Solutions against analytical values (diagonal systems, Poisson).
//! 2. The four operator representations against each other on the same
//!    system.
//! 3. Both engines against the true residual `b - A*x` computed outside
//!    the solver.

use krylos_core::{BlockMatrix, BsrMatrix, CsrMatrix};
use krylos_solver::{
    gcr, solve, vfgmres, Error, JacobiPreconditioner, MatFreeOperator, Method, OperatorKind,
    SolverConfig, StopType,
};

/// Tolerance for solution-vector comparisons.
const X_TOL: f64 = 1e-8;

/// Five-point Laplacian on an `nx` by `nx` interior grid (Dirichlet
/// boundary), the standard 2D Poisson test matrix.
fn poisson2d(nx: usize) -> CsrMatrix {
    let n = nx * nx;
    let mut triplets = Vec::with_capacity(5 * n);
    for row in 0..nx {
        for col in 0..nx {
            let k = row * nx + col;
            triplets.push((k, k, 4.0));
            if col > 0 {
                triplets.push((k, k - 1, -1.0));
            }
            if col + 1 < nx {
                triplets.push((k, k + 1, -1.0));
            }
            if row > 0 {
                triplets.push((k, k - nx, -1.0));
            }
            if row + 1 < nx {
                triplets.push((k, k + nx, -1.0));
            }
        }
    }
    CsrMatrix::from_triplets(n, n, &triplets).expect("valid Poisson triplets")
}

/// True relative residual ||b - A*x|| / ||b||.
fn true_relres(a: &CsrMatrix, x: &[f64], b: &[f64]) -> f64 {
    let mut ax = vec![0.0; b.len()];
    a.spmv(x, &mut ax);
    let rnorm: f64 = ax
        .iter()
        .zip(b)
        .map(|(axi, bi)| (bi - axi) * (bi - axi))
        .sum::<f64>()
        .sqrt();
    let bnorm: f64 = b.iter().map(|bi| bi * bi).sum::<f64>().sqrt();
    rnorm / bnorm
}

// ============================================================================
// Analytical solutions
// ============================================================================

#[test]
fn test_vfgmres_diagonal_analytical() {
    let a = CsrMatrix::from_diagonal(&[1.0, 2.0, 3.0, 4.0]);
    let b = vec![1.0; 4];
    let mut x = vec![0.0; 4];
    let config = SolverConfig::default().with_tol(1e-10).with_restart(4);

    let sol = vfgmres(&a, &b, &mut x, None, &config).expect("solve failed");
    assert!(sol.iterations <= 4);
    assert!(sol.residual <= 1e-10);

    let expected = [1.0, 0.5, 1.0 / 3.0, 0.25];
    for (xi, ei) in x.iter().zip(expected.iter()) {
        assert!((xi - ei).abs() < X_TOL);
    }
}

#[test]
fn test_gcr_diagonal_analytical() {
    let a = CsrMatrix::from_diagonal(&[1.0, 2.0, 3.0, 4.0]);
    let b = vec![1.0; 4];
    let mut x = vec![0.0; 4];
    let config = SolverConfig::default().with_tol(1e-10).with_restart(4);

    let sol = gcr(&a, &b, &mut x, None, &config).expect("solve failed");
    assert!(sol.iterations <= 4);

    let expected = [1.0, 0.5, 1.0 / 3.0, 0.25];
    for (xi, ei) in x.iter().zip(expected.iter()) {
        assert!((xi - ei).abs() < X_TOL);
    }
}

#[test]
fn test_poisson_finite_termination() {
    // With restart >= n, GMRES terminates within n iterations in exact
    // arithmetic; the Poisson 4x4 system is well enough conditioned that
    // floating point gets there too.
    let nx = 4;
    let a = poisson2d(nx);
    let n = nx * nx;
    let b = vec![1.0; n];
    let mut x = vec![0.0; n];
    let config = SolverConfig::default()
        .with_tol(1e-12)
        .with_restart(n)
        .with_max_iter(2 * n);

    let sol = vfgmres(&a, &b, &mut x, None, &config).expect("solve failed");
    assert!(sol.iterations <= n, "took {} iterations", sol.iterations);
    assert!(true_relres(&a, &x, &b) < 1e-10);
}

// ============================================================================
// Representation cross-checks
// ============================================================================

#[test]
fn test_all_representations_agree() {
    // The same 2x2-blocked tridiagonal system in all four representations.
    let nb = 6;
    let bs = 2;
    let n = nb * bs;

    let diag_block = vec![4.0, -1.0, -1.0, 4.0];
    let off_block = vec![-1.0, 0.0, 0.0, -1.0];
    let mut blocks = Vec::new();
    for i in 0..nb {
        blocks.push((i, i, diag_block.clone()));
        if i + 1 < nb {
            blocks.push((i, i + 1, off_block.clone()));
            blocks.push((i + 1, i, off_block.clone()));
        }
    }
    let bsr = BsrMatrix::from_block_triplets(nb, nb, bs, &blocks).expect("valid blocks");

    // Same entries as scalar CSR.
    let mut triplets = Vec::new();
    for (bi, bj, block) in &blocks {
        for r in 0..bs {
            for c in 0..bs {
                let v = block[r * bs + c];
                if v != 0.0 {
                    triplets.push((bi * bs + r, bj * bs + c, v));
                }
            }
        }
    }
    let csr = CsrMatrix::from_triplets(n, n, &triplets).expect("valid triplets");

    // 1x1 composite wrapping the CSR matrix.
    let block = BlockMatrix::new(vec![vec![Some(csr.clone())]]).expect("valid grid");

    // Matrix-free closure over the CSR spmv.
    let csr_for_closure = csr.clone();
    let matfree = MatFreeOperator::new(n, move |x, y| csr_for_closure.spmv(x, y));

    let b: Vec<f64> = (0..n).map(|i| (i % 3) as f64 + 1.0).collect();
    let config = SolverConfig::default().with_tol(1e-12).with_restart(10);

    let mut reference = vec![0.0; n];
    solve(
        OperatorKind::Csr(&csr),
        &b,
        &mut reference,
        None,
        Method::Vfgmres,
        &config,
    )
    .expect("CSR solve failed");

    let others = [
        OperatorKind::Bsr(&bsr),
        OperatorKind::Block(&block),
        OperatorKind::MatFree(&matfree),
    ];
    for kind in others {
        let mut x = vec![0.0; n];
        solve(kind, &b, &mut x, None, Method::Vfgmres, &config).expect("solve failed");
        for (xi, ri) in x.iter().zip(reference.iter()) {
            assert!((xi - ri).abs() < X_TOL);
        }
    }
}

#[test]
fn test_engines_agree_on_poisson() {
    let a = poisson2d(5);
    let n = 25;
    let b: Vec<f64> = (0..n).map(|i| ((i * 7 + 3) % 5) as f64).collect();
    let config = SolverConfig::default()
        .with_tol(1e-11)
        .with_restart(12)
        .with_max_iter(300);

    let mut x_g = vec![0.0; n];
    vfgmres(&a, &b, &mut x_g, None, &config).expect("vfgmres failed");
    let mut x_c = vec![0.0; n];
    gcr(&a, &b, &mut x_c, None, &config).expect("gcr failed");

    for (g, c) in x_g.iter().zip(x_c.iter()) {
        assert!((g - c).abs() < 1e-7);
    }
}

// ============================================================================
// Preconditioning
// ============================================================================

#[test]
fn test_jacobi_reduces_iterations_on_scaled_system() {
    // Badly row-scaled SPD system where diagonal scaling is essentially
    // the exact inverse.
    let n = 50;
    let diag: Vec<f64> = (0..n).map(|i| 10f64.powi((i % 7) as i32)).collect();
    let a = CsrMatrix::from_diagonal(&diag);
    let b: Vec<f64> = diag.iter().map(|d| d * 3.0).collect();
    let config = SolverConfig::default()
        .with_tol(1e-10)
        .with_restart(20)
        .with_max_iter(200);

    let mut x_plain = vec![0.0; n];
    let plain = vfgmres(&a, &b, &mut x_plain, None, &config).expect("plain solve failed");

    let pc = JacobiPreconditioner::from_csr(&a);
    let mut x_pc = vec![0.0; n];
    let preconditioned =
        vfgmres(&a, &b, &mut x_pc, Some(&pc), &config).expect("preconditioned solve failed");

    assert!(preconditioned.iterations <= plain.iterations);
    assert!(preconditioned.iterations <= 2);
    for xi in &x_pc {
        assert!((xi - 3.0).abs() < 1e-8);
    }
}

#[test]
fn test_stop_types_all_converge() {
    let a = poisson2d(4);
    let n = 16;
    let b = vec![1.0; n];
    let pc = JacobiPreconditioner::from_csr(&a);

    for stop_type in [StopType::RelRes, StopType::RelPrecRes, StopType::ModRelRes] {
        let config = SolverConfig::default()
            .with_tol(1e-9)
            .with_restart(8)
            .with_stop_type(stop_type)
            .with_max_iter(200);
        let mut x = vec![0.0; n];
        vfgmres(&a, &b, &mut x, Some(&pc), &config).expect("solve failed");
        assert!(
            true_relres(&a, &x, &b) < 1e-7,
            "stop type {stop_type:?} left a large residual"
        );
    }
}

// ============================================================================
// Budget and restart behavior
// ============================================================================

#[test]
fn test_zero_budget_solves_nothing() {
    let op = MatFreeOperator::new(4, |_x, _y| {
        panic!("operator applied despite a zero iteration budget");
    });
    let b = vec![1.0; 4];
    let config = SolverConfig::default().with_max_iter(0);

    for method in [Method::Vfgmres, Method::Gcr] {
        let mut x = vec![0.0; 4];
        let err = solve(OperatorKind::MatFree(&op), &b, &mut x, None, method, &config)
            .expect_err("zero budget must not converge");
        match err {
            Error::DidNotConverge { iterations, .. } => assert_eq!(iterations, 0),
            other => panic!("unexpected error: {other}"),
        }
        assert!(x.iter().all(|&xi| xi == 0.0), "x was modified");
    }
}

#[test]
fn test_short_restart_still_converges() {
    // Restart far below the dimension forces many cycles and exercises the
    // between-cycle residual reconstruction and restart adaptation.
    let a = poisson2d(6);
    let n = 36;
    let b = vec![1.0; n];
    let config = SolverConfig::default()
        .with_tol(1e-10)
        .with_restart(5)
        .with_max_iter(500);

    let mut x = vec![0.0; n];
    let sol = vfgmres(&a, &b, &mut x, None, &config).expect("solve failed");
    assert!(sol.iterations > 5, "expected more than one cycle");
    assert!(true_relres(&a, &x, &b) < 1e-9);
}

#[test]
fn test_vfgmres_history_monotone_per_cycle() {
    // The projected residual norm never increases between consecutive
    // iterations of one restart cycle. With restart >= dimension there is
    // a single cycle, so the whole history is monotone.
    let a = poisson2d(4);
    let n = 16;
    let b = vec![1.0; n];
    let config = SolverConfig::default()
        .with_tol(1e-11)
        .with_restart(n)
        .with_max_iter(100);

    let mut x = vec![0.0; n];
    let sol = vfgmres(&a, &b, &mut x, None, &config).expect("solve failed");
    for w in sol.history.windows(2) {
        assert!(w[1] <= w[0] * (1.0 + 1e-12), "history not monotone: {w:?}");
    }
}

#[test]
fn test_nonzero_initial_guess_vfgmres() {
    let a = poisson2d(4);
    let n = 16;
    let b = vec![2.0; n];
    let config = SolverConfig::default().with_tol(1e-10).with_restart(8);

    let mut x_zero = vec![0.0; n];
    vfgmres(&a, &b, &mut x_zero, None, &config).expect("solve failed");

    // Start from a perturbed copy of the solution; must land in the same
    // place, faster.
    let mut x_warm: Vec<f64> = x_zero.iter().map(|xi| xi + 0.01).collect();
    let warm = vfgmres(&a, &b, &mut x_warm, None, &config).expect("warm solve failed");
    assert!(warm.iterations <= n);
    for (w, z) in x_warm.iter().zip(x_zero.iter()) {
        assert!((w - z).abs() < 1e-6);
    }
}
