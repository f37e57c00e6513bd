//! The minimal topology view `InputData::from_mesh` needs from a caller's
//! mesh/graph data structure. Mesh construction itself is out of scope for
//! this crate (§1); this trait is the entire surface the solver core
//! requires from that external collaborator.

use crate::math::Point;

/// A read-only view over a mesh-like graph with arbitrary (not necessarily
/// dense `0..n`) vertex keys.
///
/// Implement this for whatever mesh/graph type the caller already has;
/// `InputData::from_mesh` renumbers vertices to a dense `[0, n)` index
/// space and extracts edges accordingly.
pub trait MeshTopology {
    /// Opaque vertex key used by the host mesh data structure.
    type VertexKey: Copy + Eq + std::hash::Hash;

    /// Iterates over every vertex key together with its position.
    fn vertices(&self) -> Box<dyn Iterator<Item = (Self::VertexKey, Point)> + '_>;

    /// Iterates over every edge as a pair of vertex keys.
    fn edges(&self) -> Box<dyn Iterator<Item = (Self::VertexKey, Self::VertexKey)> + '_>;
}
