//! Solver configuration.

use crate::math::{Point, Real};

/// What a [`SolverOptions::callback`] returns after observing an iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlFlow {
    /// Keep iterating.
    Continue,
    /// Stop after this iteration; the solver returns `Ok` with state
    /// `Aborted`.
    Abort,
}

/// Tunables for [`crate::solver::dr_solve`].
///
/// Build with [`SolverOptions::default`] and override individual fields, or
/// start from the [`SolverOptions::fast`] / [`SolverOptions::precise`]
/// presets.
pub struct SolverOptions {
    /// Maximum number of iterations before giving up with state
    /// `Exhausted`.
    pub kmax: usize,
    /// Integration time step.
    pub dt: Real,
    /// Convergence tolerance on the free-vertex residual norm.
    pub tol1: Real,
    /// Convergence tolerance on the free-vertex displacement norm.
    pub tol2: Real,
    /// Damping parameter in `[0, 2)`; `a = (1 - c/2) / (1 + c/2)`,
    /// `b = (1 + a) / 2`.
    pub c: Real,
    /// Runge-Kutta stage count, one of `1`, `2`, `4`.
    pub rk_steps: usize,
    /// Optional per-iteration observer; `Abort` stops the loop after the
    /// iteration that produced the callback invocation.
    pub callback: Option<Box<dyn FnMut(usize, &[Point], Real, Real) -> ControlFlow>>,
}

impl std::fmt::Debug for SolverOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolverOptions")
            .field("kmax", &self.kmax)
            .field("dt", &self.dt)
            .field("tol1", &self.tol1)
            .field("tol2", &self.tol2)
            .field("c", &self.c)
            .field("rk_steps", &self.rk_steps)
            .field("callback", &self.callback.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            kmax: 10_000,
            dt: 1.0,
            tol1: 1.0e-3,
            tol2: 1.0e-6,
            c: 0.1,
            rk_steps: 2,
            callback: None,
        }
    }
}

impl SolverOptions {
    /// Looser tolerances and a lower iteration cap, for quick interactive
    /// previews.
    pub fn fast() -> Self {
        Self {
            kmax: 500,
            tol1: 1.0e-2,
            tol2: 1.0e-4,
            ..Self::default()
        }
    }

    /// Tighter tolerances and a higher iteration cap, for final results.
    pub fn precise() -> Self {
        Self {
            kmax: 50_000,
            tol1: 1.0e-6,
            tol2: 1.0e-9,
            ..Self::default()
        }
    }

    /// Derived damping coefficients `(a, b)` from `c`.
    pub(crate) fn damping_coefficients(&self) -> (Real, Real) {
        let a = (1.0 - self.c / 2.0) / (1.0 + self.c / 2.0);
        let b = (1.0 + a) / 2.0;
        (a, b)
    }
}
