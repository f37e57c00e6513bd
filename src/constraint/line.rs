//! Straight-line constraint: a vertex is projected onto an infinite line.

use crate::error::{DrError, DrResult};
use crate::math::{Point, Vector};

/// Constrains a vertex to an infinite line through `origin` along `dir`.
#[derive(Debug, Clone)]
#[cfg_attr(
    feature = "serde-serialize",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct LineConstraint {
    origin: Point,
    dir: Vector,
}

impl LineConstraint {
    /// Builds a line constraint, normalizing `dir`. Errors if `dir` is
    /// (numerically) zero.
    pub fn new(origin: Point, dir: Vector) -> DrResult<Self> {
        let norm = dir.norm();
        if norm < 1.0e-12 {
            return Err(DrError::InvalidInput {
                detail: "line constraint direction must be nonzero".to_string(),
            });
        }
        Ok(Self {
            origin,
            dir: dir / norm,
        })
    }

    pub(super) fn project(&self, p: &Point) -> Point {
        let t = (p - self.origin).dot(&self.dir);
        self.origin + self.dir * t
    }

    pub(super) fn tangent(&self, residual: &Vector) -> Vector {
        self.dir * residual.dot(&self.dir)
    }
}
