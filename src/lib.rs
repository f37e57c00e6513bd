//! Dynamic relaxation for form-finding of axial-force networks: cable nets,
//! tensile membranes approximated as bar networks, and prestressed bar
//! systems, solved by damped pseudo-dynamic relaxation to static
//! equilibrium.
//!
//! Build a problem with [`InputData::new`] or [`InputData::from_mesh`],
//! optionally attach [`Constraint`]s to vertices that must stay on a
//! geometric locus, then call [`dr_solve`].

pub mod constraint;
pub mod data;
pub mod error;
mod integrator;
pub mod math;
pub mod solver;

pub use constraint::{Constraint, GeometryKind};
pub use data::{InputData, MeshTopology, OptionalEdgeArrays};
pub use error::{DrError, DrResult};
pub use solver::{dr_solve, dr_solve_unconstrained, ControlFlow, ResultData, SolverOptions};

/// Re-exports the crate's full public surface for glob-importing callers.
pub mod prelude {
    pub use crate::constraint::{
        CircleConstraint, Constraint, CurveConstraint, GeometryKind, LineConstraint,
        PlaneConstraint, SurfaceConstraint,
    };
    pub use crate::data::{InputData, MeshTopology, OptionalEdgeArrays};
    pub use crate::error::{DrError, DrResult};
    pub use crate::math::{Point, Real, Vector};
    pub use crate::solver::{dr_solve, dr_solve_unconstrained, ControlFlow, ResultData, SolverOptions};
}
