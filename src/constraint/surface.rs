//! NURBS surface constraint: a vertex is pulled toward its closest point on
//! a parametric surface.

use crate::error::DrResult;
use crate::math::{Point, Real, Vector};

use super::nurbs::NurbsSurface;

/// Constrains a vertex to a NURBS surface.
#[derive(Debug, Clone)]
#[cfg_attr(
    feature = "serde-serialize",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct SurfaceConstraint {
    surface: NurbsSurface,
}

impl SurfaceConstraint {
    /// Builds a surface constraint from a clamped tensor-product NURBS
    /// definition.
    pub fn new(
        degree_u: usize,
        degree_v: usize,
        knots_u: Vec<Real>,
        knots_v: Vec<Real>,
        control_points: Vec<Vec<Point>>,
        weights: Vec<Vec<Real>>,
    ) -> DrResult<Self> {
        Ok(Self {
            surface: NurbsSurface::new(
                degree_u,
                degree_v,
                knots_u,
                knots_v,
                control_points,
                weights,
            )?,
        })
    }

    /// Returns the closest point on the surface to `p` and the unit normal
    /// there.
    pub(super) fn project(&self, p: &Point) -> DrResult<(Point, Vector)> {
        self.surface.closest_point(p)
    }

    /// Distance from `p` to its closest point on the surface.
    pub fn distance_to(&self, p: &Point) -> DrResult<Real> {
        let (closest, _normal) = self.surface.closest_point(p)?;
        Ok((p - closest).norm())
    }
}
