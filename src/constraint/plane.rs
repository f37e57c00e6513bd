//! Plane constraint: a vertex is projected onto an infinite plane.

use crate::error::{DrError, DrResult};
use crate::math::{Point, Vector};

/// Constrains a vertex to an infinite plane through `origin` with unit
/// `normal`.
#[derive(Debug, Clone)]
#[cfg_attr(
    feature = "serde-serialize",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct PlaneConstraint {
    origin: Point,
    normal: Vector,
}

impl PlaneConstraint {
    /// Builds a plane constraint, normalizing `normal`. Errors if `normal`
    /// is (numerically) zero.
    pub fn new(origin: Point, normal: Vector) -> DrResult<Self> {
        let norm = normal.norm();
        if norm < 1.0e-12 {
            return Err(DrError::InvalidInput {
                detail: "plane constraint normal must be nonzero".to_string(),
            });
        }
        Ok(Self {
            origin,
            normal: normal / norm,
        })
    }

    pub(super) fn project(&self, p: &Point) -> Point {
        let d = (p - self.origin).dot(&self.normal);
        p - self.normal * d
    }

    pub(super) fn tangent(&self, residual: &Vector) -> Vector {
        residual - self.normal * residual.dot(&self.normal)
    }
}
