//! NURBS curve constraint: a vertex is pulled toward its closest point on a
//! parametric curve.

use crate::error::DrResult;
use crate::math::{Point, Real, Vector};

use super::nurbs::NurbsCurve;

/// Constrains a vertex to a NURBS curve.
#[derive(Debug, Clone)]
#[cfg_attr(
    feature = "serde-serialize",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct CurveConstraint {
    curve: NurbsCurve,
}

impl CurveConstraint {
    /// Builds a curve constraint from a clamped NURBS curve definition.
    pub fn new(
        degree: usize,
        knots: Vec<Real>,
        control_points: Vec<Point>,
        weights: Vec<Real>,
    ) -> DrResult<Self> {
        Ok(Self {
            curve: NurbsCurve::new(degree, knots, control_points, weights)?,
        })
    }

    /// Returns the closest point on the curve to `p` and the unit tangent
    /// there.
    pub(super) fn project(&self, p: &Point) -> DrResult<(Point, Vector)> {
        self.curve.closest_point(p)
    }

    /// Distance from `p` to its closest point on the curve; useful for
    /// callers (and tests) checking how well a constrained vertex satisfies
    /// its locus.
    pub fn distance_to(&self, p: &Point) -> DrResult<Real> {
        let (closest, _tangent) = self.curve.closest_point(p)?;
        Ok((p - closest).norm())
    }
}
