//! Error types returned by the solver core.

use thiserror::Error;

/// All failure modes the solver core can report.
///
/// `Aborted` is intentionally absent: a callback-requested stop is a
/// successful, ordinary return (see [`crate::solver::SolverState::Aborted`]),
/// not an error.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DrError {
    /// Shape or cardinality mismatch, an out-of-range edge index, a
    /// self-loop edge, or an unsupported Runge-Kutta stage count.
    #[error("invalid input: {detail}")]
    InvalidInput {
        /// Human-readable description of what was wrong.
        detail: String,
    },

    /// A constraint's projection failed because its host locus is
    /// degenerate (zero-length line, null plane normal, degenerate NURBS
    /// parametrization, ...).
    #[error("geometric error at vertex {vertex}: {detail}")]
    GeometricError {
        /// Index of the vertex whose constraint failed to project.
        vertex: usize,
        /// Human-readable description of the degeneracy.
        detail: String,
    },

    /// A non-finite value (`NaN` or `±inf`) was produced somewhere other
    /// than the explicitly branched zero-divisor slots of `q_lpre`/`q_EA`.
    #[error("numeric blowup in `{field}` at iteration {iteration}")]
    NumericBlowup {
        /// Iteration at which the blowup was detected.
        iteration: usize,
        /// Name of the offending array (`"x"`, `"v"`, `"r"`, or `"l"`).
        field: &'static str,
    },
}

/// Convenience result alias used throughout the crate.
pub type DrResult<T> = Result<T, DrError>;
