//! The internal iteration state machine. Not part of the public API beyond
//! the `Result<ResultData, DrError>` it collapses to.

/// Where a solve currently stands. Collapses to `Ok(ResultData)` for every
/// terminal state except `Failed`, which collapses to `Err(DrError)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SolverState {
    Initialized,
    Iterating,
    Converged,
    Exhausted,
    Aborted,
}

impl SolverState {
    pub(crate) fn label(self) -> &'static str {
        match self {
            SolverState::Initialized => "initialized",
            SolverState::Iterating => "iterating",
            SolverState::Converged => "converged",
            SolverState::Exhausted => "exhausted",
            SolverState::Aborted => "aborted",
        }
    }
}
