//! Circle constraint: a vertex is projected onto a circle of fixed radius
//! lying in a plane.

use crate::error::{DrError, DrResult};
use crate::math::{Point, Real, Vector};

/// Constrains a vertex to a circle of `radius` centered at `center`, lying
/// in the plane with unit `normal`.
#[derive(Debug, Clone)]
#[cfg_attr(
    feature = "serde-serialize",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct CircleConstraint {
    center: Point,
    normal: Vector,
    radius: Real,
}

impl CircleConstraint {
    /// Builds a circle constraint, normalizing `normal`. Errors if `normal`
    /// is (numerically) zero or `radius` is not strictly positive.
    pub fn new(center: Point, normal: Vector, radius: Real) -> DrResult<Self> {
        let norm = normal.norm();
        if norm < 1.0e-12 {
            return Err(DrError::InvalidInput {
                detail: "circle constraint normal must be nonzero".to_string(),
            });
        }
        if radius <= 0.0 {
            return Err(DrError::InvalidInput {
                detail: "circle constraint radius must be positive".to_string(),
            });
        }
        Ok(Self {
            center,
            normal: normal / norm,
            radius,
        })
    }

    /// Projects `p` onto the plane first, then pushes it radially out (or
    /// in) to `radius`. Degenerate when the in-plane projection lands
    /// exactly on the center, since the radial direction is then undefined.
    pub(super) fn project(&self, p: &Point) -> DrResult<Point> {
        let d = (p - self.center).dot(&self.normal);
        let in_plane = p - self.normal * d;
        let radial = in_plane - self.center;
        let radial_norm = radial.norm();
        if radial_norm < 1.0e-10 {
            return Err(DrError::GeometricError {
                vertex: 0,
                detail: "circle constraint projection is exactly at the center".to_string(),
            });
        }
        Ok(self.center + radial * (self.radius / radial_norm))
    }

    /// Tangent direction at the point `p` currently occupies (must already
    /// lie close to the circle, i.e. `p` is typically the projected point).
    pub(super) fn tangent(&self, p: &Point, residual: &Vector) -> DrResult<Vector> {
        let radial = p - self.center;
        let radial_norm = radial.norm();
        if radial_norm < 1.0e-10 {
            return Err(DrError::GeometricError {
                vertex: 0,
                detail: "circle constraint tangent is undefined at the center".to_string(),
            });
        }
        let tangent_dir = self.normal.cross(&(radial / radial_norm));
        Ok(tangent_dir * residual.dot(&tangent_dir))
    }
}
