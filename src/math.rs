//! Scalar and vector type aliases used throughout the solver.
//!
//! Centralizing these aliases here (rather than spelling out `nalgebra`
//! types everywhere) makes it straightforward to retarget the crate to a
//! different floating point width later, mirroring how this crate's sibling
//! physics engines expose a single `math` module instead of hard-coding
//! `f32`/`f64` at every call site.

/// The scalar type used for all solver arithmetic.
pub type Real = f64;

/// A 3D vector (displacement, velocity, residual, load).
pub type Vector = nalgebra::Vector3<Real>;

/// A 3D point (vertex position).
pub type Point = nalgebra::Point3<Real>;

/// A dense column vector of scalars, one entry per edge or per free vertex
/// component.
pub type DVector = nalgebra::DVector<Real>;

/// A dense matrix of scalars.
pub type DMatrix = nalgebra::DMatrix<Real>;

/// Sparse matrix storage used for the connectivity operator `C` and the
/// assembled stiffness-like operator `D = Ciᵀ Q C`.
pub type CsrMatrix = nalgebra_sparse::CsrMatrix<Real>;

/// Sparse matrix builder used while assembling `C` edge by edge.
pub type CooMatrix = nalgebra_sparse::CooMatrix<Real>;
