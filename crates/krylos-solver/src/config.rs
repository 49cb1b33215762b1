//! Solver configuration.

use crate::error::{Error, Result};

/// Residual metric used to decide convergence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StopType {
    /// `||b - A*x|| / den`, where `den` is `||b||` (or `||r0||` when b is zero).
    #[default]
    RelRes,
    /// `sqrt(<M^-1 r, r>) / den` - the preconditioned residual norm.
    RelPrecRes,
    /// `||b - A*x|| / max(eps, ||x||)` - residual relative to the solution size.
    ModRelRes,
}

impl StopType {
    /// Parse from a string.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "relres" | "rel_res" => Some(Self::RelRes),
            "relprecres" | "rel_precres" => Some(Self::RelPrecRes),
            "modrelres" | "mod_rel_res" => Some(Self::ModRelRes),
            _ => None,
        }
    }
}

impl std::str::FromStr for StopType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s).ok_or_else(|| Error::UnknownStopType(s.to_string()))
    }
}

/// How much information the solver reports through `log`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Verbosity {
    /// Silent; outcomes are reported only through the returned value.
    #[default]
    None,
    /// The final summary (iteration count, relative residual).
    Min,
    /// Plus initial norms and warnings (shrunk restart, false convergence).
    Some,
    /// Plus every inner-iteration residual.
    More,
}

impl Verbosity {
    /// Whether shrunk-restart and false-convergence warnings are emitted.
    pub fn reports_warnings(self) -> bool {
        self >= Self::Some
    }
}

/// Configuration shared by both Krylov engines.
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Convergence tolerance under [`StopType`].
    pub tol: f64,
    /// Hard cap on the total (global) iteration count.
    pub max_iter: usize,
    /// Requested restart length (Krylov subspace dimension per cycle).
    pub restart: usize,
    /// Residual metric for the convergence decision.
    pub stop_type: StopType,
    /// Per-iteration reporting level.
    pub verbosity: Verbosity,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            tol: 1e-6,
            max_iter: 500,
            restart: 30,
            stop_type: StopType::RelRes,
            verbosity: Verbosity::None,
        }
    }
}

impl SolverConfig {
    /// Set the convergence tolerance.
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Set the global iteration cap.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set the requested restart length.
    pub fn with_restart(mut self, restart: usize) -> Self {
        self.restart = restart;
        self
    }

    /// Set the stopping criterion.
    pub fn with_stop_type(mut self, stop_type: StopType) -> Self {
        self.stop_type = stop_type;
        self
    }

    /// Set the reporting level.
    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = SolverConfig::default();
        assert!((config.tol - 1e-6).abs() < 1e-15);
        assert_eq!(config.max_iter, 500);
        assert_eq!(config.restart, 30);
        assert_eq!(config.stop_type, StopType::RelRes);
        assert_eq!(config.verbosity, Verbosity::None);
    }

    #[test]
    fn builder_chain() {
        let config = SolverConfig::default()
            .with_tol(1e-10)
            .with_max_iter(50)
            .with_restart(10)
            .with_stop_type(StopType::ModRelRes)
            .with_verbosity(Verbosity::More);
        assert!((config.tol - 1e-10).abs() < 1e-25);
        assert_eq!(config.max_iter, 50);
        assert_eq!(config.restart, 10);
        assert_eq!(config.stop_type, StopType::ModRelRes);
        assert_eq!(config.verbosity, Verbosity::More);
    }

    #[test]
    fn stop_type_from_name() {
        assert_eq!(StopType::from_name("relres"), Some(StopType::RelRes));
        assert_eq!(StopType::from_name("REL_RES"), Some(StopType::RelRes));
        assert_eq!(
            StopType::from_name("relprecres"),
            Some(StopType::RelPrecRes)
        );
        assert_eq!(
            StopType::from_name("mod_rel_res"),
            Some(StopType::ModRelRes)
        );
        assert_eq!(StopType::from_name("bogus"), None);
    }

    #[test]
    fn stop_type_from_str_reports_the_name() {
        let err = "energy".parse::<StopType>().unwrap_err();
        match err {
            Error::UnknownStopType(name) => assert_eq!(name, "energy"),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!("mod_rel_res".parse::<StopType>().unwrap(), StopType::ModRelRes);
    }

    #[test]
    fn verbosity_is_ordered() {
        assert!(Verbosity::None < Verbosity::Min);
        assert!(Verbosity::Min < Verbosity::Some);
        assert!(Verbosity::Some < Verbosity::More);
    }

    #[test]
    fn warnings_start_above_the_minimal_level() {
        assert!(!Verbosity::None.reports_warnings());
        assert!(!Verbosity::Min.reports_warnings());
        assert!(Verbosity::Some.reports_warnings());
        assert!(Verbosity::More.reports_warnings());
    }
}
