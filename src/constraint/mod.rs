//! Geometric constraints: closed tagged sum of the loci a vertex can be
//! pinned to, dispatched by match rather than dynamic trait dispatch (the
//! same shape rapier uses for its `AnyVelocityConstraint`).

mod circle;
mod curve;
mod line;
mod nurbs;
mod plane;
mod surface;

pub use circle::CircleConstraint;
pub use curve::CurveConstraint;
pub use line::LineConstraint;
pub use nurbs::{NurbsCurve, NurbsSurface};
pub use plane::PlaneConstraint;
pub use surface::SurfaceConstraint;

use crate::error::DrResult;
use crate::math::{Point, Real, Vector};

/// One of the loci a vertex can be constrained to during dynamic
/// relaxation.
///
/// A closed enum by design: new *kinds* of constraint are added by a new
/// variant here (and a corresponding `GeometryKind` arm), not by
/// implementing a trait from outside the crate.
#[derive(Debug, Clone)]
#[cfg_attr(
    feature = "serde-serialize",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum Constraint {
    Line(LineConstraint),
    Plane(PlaneConstraint),
    Circle(CircleConstraint),
    Curve(CurveConstraint),
    Surface(SurfaceConstraint),
}

impl Constraint {
    /// Overwrites `*location` with its projection onto the constraint's
    /// locus, and `*residual` with `(1 - damping) * tangent`, where
    /// `tangent` is the in-locus component of the *original* residual.
    ///
    /// This is the only entry point the solver uses; no state is kept on
    /// the `Constraint` value between calls.
    pub fn update(&self, location: &mut Point, residual: &mut Vector, damping: Real) -> DrResult<()> {
        let tangent = match self {
            Constraint::Line(c) => {
                let tangent = c.tangent(residual);
                *location = c.project(location);
                tangent
            }
            Constraint::Plane(c) => {
                let tangent = c.tangent(residual);
                *location = c.project(location);
                tangent
            }
            Constraint::Circle(c) => {
                let projected = c.project(location)?;
                let tangent = c.tangent(&projected, residual)?;
                *location = projected;
                tangent
            }
            Constraint::Curve(c) => {
                let (projected, tangent_dir) = c.project(location)?;
                let tangent = tangent_dir * residual.dot(&tangent_dir);
                *location = projected;
                tangent
            }
            Constraint::Surface(c) => {
                let (projected, normal) = c.project(location)?;
                let tangent = *residual - normal * residual.dot(&normal);
                *location = projected;
                tangent
            }
        };
        *residual = tangent * (1.0 - damping);
        Ok(())
    }
}

/// Identifies which kind of locus a host-geometry value represents. Callers
/// building their own geometry-to-constraint registry switch on this to pick
/// the matching `Constraint` variant's own `::new` constructor.
///
/// A closed registry: every arm here must name a [`Constraint`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryKind {
    Line,
    Plane,
    Circle,
    Curve,
    Surface,
}

impl Constraint {
    /// Returns which [`GeometryKind`] this constraint was built from.
    pub fn kind(&self) -> GeometryKind {
        match self {
            Constraint::Line(_) => GeometryKind::Line,
            Constraint::Plane(_) => GeometryKind::Plane,
            Constraint::Circle(_) => GeometryKind::Circle,
            Constraint::Curve(_) => GeometryKind::Curve,
            Constraint::Surface(_) => GeometryKind::Surface,
        }
    }
}
