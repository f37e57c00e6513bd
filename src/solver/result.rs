//! The value object returned by a completed (or cleanly terminated) solve.

use crate::math::{DVector, Point, Vector};

/// Owned snapshot of the solver's state at the end of a call: converged,
/// exhausted, or aborted. Immutable after construction.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde-serialize",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct ResultData {
    /// Final vertex positions.
    pub xyz: Vec<Point>,
    /// Final force density per edge.
    pub q: DVector,
    /// Final axial force per edge (`q * lengths`, elementwise).
    pub forces: DVector,
    /// Final edge length per edge.
    pub lengths: DVector,
    /// Final residual (unbalanced force) per vertex.
    pub residuals: Vec<Vector>,
}
