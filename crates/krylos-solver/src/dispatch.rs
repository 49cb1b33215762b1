//! Routing from operator representation and method name to an engine.
//!
//! Both engines iterate against `&dyn LinearOperator`, so the dispatcher
//! only erases the storage type and forwards; there is no per-format
//! iteration code behind it.

use krylos_core::{BlockMatrix, BsrMatrix, CsrMatrix};

use crate::config::SolverConfig;
use crate::error::{Error, Result, Solution};
use crate::gcr::gcr;
use crate::operator::{LinearOperator, MatFreeOperator};
use crate::preconditioner::Preconditioner;
use crate::vfgmres::vfgmres;

/// The operator representations the dispatcher accepts.
pub enum OperatorKind<'a> {
    /// Scalar compressed sparse row.
    Csr(&'a CsrMatrix),
    /// Block compressed sparse row with dense blocks.
    Bsr(&'a BsrMatrix),
    /// Composite block matrix with CSR sub-blocks.
    Block(&'a BlockMatrix),
    /// Caller-supplied apply closure.
    MatFree(&'a MatFreeOperator),
}

impl<'a> OperatorKind<'a> {
    /// The uniform operator view the engines consume.
    pub fn as_operator(&self) -> &'a dyn LinearOperator {
        match self {
            Self::Csr(a) => *a,
            Self::Bsr(a) => *a,
            Self::Block(a) => *a,
            Self::MatFree(a) => *a,
        }
    }
}

/// Which Krylov engine to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    /// Variable-restart flexible GMRES.
    #[default]
    Vfgmres,
    /// Generalized conjugate residual.
    Gcr,
}

impl Method {
    /// Parse from a string.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "vfgmres" | "vgmres" | "fgmres" => Some(Self::Vfgmres),
            "gcr" => Some(Self::Gcr),
            _ => None,
        }
    }
}

impl std::str::FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s).ok_or_else(|| Error::UnknownMethod(s.to_string()))
    }
}

/// Solve `A*x = b` with the chosen engine over any operator representation.
///
/// `x` carries the initial guess in and the solution out. `pc` of `None`
/// means no preconditioning.
pub fn solve(
    op: OperatorKind<'_>,
    b: &[f64],
    x: &mut [f64],
    pc: Option<&dyn Preconditioner>,
    method: Method,
    config: &SolverConfig,
) -> Result<Solution> {
    let op = op.as_operator();
    match method {
        Method::Vfgmres => vfgmres(op, b, x, pc, config),
        Method::Gcr => gcr(op, b, x, pc, config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_from_name() {
        assert_eq!(Method::from_name("vfgmres"), Some(Method::Vfgmres));
        assert_eq!(Method::from_name("VGMRES"), Some(Method::Vfgmres));
        assert_eq!(Method::from_name("gcr"), Some(Method::Gcr));
        assert_eq!(Method::from_name("bicgstab"), None);
    }

    #[test]
    fn method_from_str_reports_the_name() {
        let err = "cgnr".parse::<Method>().unwrap_err();
        match err {
            Error::UnknownMethod(name) => assert_eq!(name, "cgnr"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn dispatch_over_csr() {
        let a = CsrMatrix::from_diagonal(&[1.0, 2.0, 3.0]);
        let b = vec![2.0, 4.0, 6.0];
        let config = SolverConfig::default().with_tol(1e-12);

        for method in [Method::Vfgmres, Method::Gcr] {
            let mut x = vec![0.0; 3];
            solve(OperatorKind::Csr(&a), &b, &mut x, None, method, &config).unwrap();
            assert!((x[0] - 2.0).abs() < 1e-9);
            assert!((x[1] - 2.0).abs() < 1e-9);
            assert!((x[2] - 2.0).abs() < 1e-9);
        }
    }

    #[test]
    fn dispatch_over_matfree() {
        let op = MatFreeOperator::new(2, |x, y| {
            y[0] = 2.0 * x[0];
            y[1] = 5.0 * x[1];
        });
        let b = vec![2.0, 5.0];
        let mut x = vec![0.0; 2];
        let config = SolverConfig::default().with_tol(1e-12);

        solve(
            OperatorKind::MatFree(&op),
            &b,
            &mut x,
            None,
            Method::Vfgmres,
            &config,
        )
        .unwrap();
        assert!((x[0] - 1.0).abs() < 1e-10);
        assert!((x[1] - 1.0).abs() < 1e-10);
    }
}
