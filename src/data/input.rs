//! The immutable problem description consumed by [`crate::solver::dr_solve`].

use std::collections::BTreeSet;

use crate::data::sparse::{build_connectivity, build_free_restricted, spmv_vec3, square_transpose};
use crate::error::{DrError, DrResult};
use crate::math::{CsrMatrix, DVector, Point, Real, Vector};

use super::mesh::MeshTopology;

/// Optional per-edge arrays grouped together so `InputData::new` does not
/// grow an ever-longer flat argument list as the model picks up more
/// optional prestress/elasticity parameters; each field defaults to a
/// zero-length-`m` vector when left `None`, exactly like the positional
/// optional arguments of the historical solver this crate replaces.
#[derive(Debug, Clone, Default)]
#[cfg_attr(
    feature = "serde-serialize",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct OptionalEdgeArrays {
    /// Prescribed axial force per edge (`fpre`).
    pub fpre: Option<Vec<Real>>,
    /// Prescribed rest length per edge (`lpre`).
    pub lpre: Option<Vec<Real>>,
    /// Initial (unstressed) length per edge (`linit`).
    pub linit: Option<Vec<Real>>,
    /// Young's modulus per edge (`E`).
    pub e: Option<Vec<Real>>,
    /// Cross-section radius per edge (`radius`).
    pub radius: Option<Vec<Real>>,
}

/// An immutable description of a dynamic-relaxation problem: topology,
/// loads, prestress, and the derived connectivity/kinematic quantities the
/// solver reuses on every iteration.
///
/// All derived quantities are computed once, here, at construction time —
/// there are no lazily-populated caches to invalidate (Design Note: prefer
/// canonical dense/sparse arrays computed once over lazily cached typed
/// views).
#[derive(Debug, Clone)]
#[cfg_attr(
    feature = "serde-serialize",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct InputData {
    pub(crate) vertices: Vec<Point>,
    pub(crate) edges: Vec<[usize; 2]>,
    pub(crate) fixed: BTreeSet<usize>,
    pub(crate) free: Vec<usize>,
    pub(crate) loads: Vec<Vector>,
    pub(crate) qpre: DVector,
    pub(crate) fpre: DVector,
    pub(crate) lpre: DVector,
    pub(crate) linit: DVector,
    pub(crate) e: DVector,
    pub(crate) radius: DVector,
    pub(crate) ea: DVector,

    pub(crate) c: CsrMatrix,
    pub(crate) ct: CsrMatrix,
    pub(crate) ci: CsrMatrix,
    pub(crate) cit: CsrMatrix,
    pub(crate) ct2: CsrMatrix,

    pub(crate) q0: DVector,
    pub(crate) l0: DVector,
    pub(crate) v0: Vec<Vector>,
    pub(crate) r0: Vec<Vector>,
}

impl InputData {
    /// Builds a new [`InputData`], validating cardinalities and edge
    /// indices and deriving `C`, `free`, and the initial kinematic state.
    ///
    /// # Errors
    ///
    /// Returns [`DrError::InvalidInput`] if `vertices.len() != loads.len()`,
    /// if `edges.len() != qpre.len()`, if any edge references a vertex
    /// outside `[0, vertices.len())`, if an edge is a self-loop, or if an
    /// optional array in `optional` has a length other than `edges.len()`.
    pub fn new(
        vertices: Vec<Point>,
        edges: Vec<[usize; 2]>,
        fixed: impl IntoIterator<Item = usize>,
        loads: Vec<Vector>,
        qpre: Vec<Real>,
        optional: OptionalEdgeArrays,
    ) -> DrResult<Self> {
        let n = vertices.len();
        let m = edges.len();

        if loads.len() != n {
            return Err(DrError::InvalidInput {
                detail: format!(
                    "loads has length {} but there are {} vertices",
                    loads.len(),
                    n
                ),
            });
        }
        if qpre.len() != m {
            return Err(DrError::InvalidInput {
                detail: format!("qpre has length {} but there are {} edges", qpre.len(), m),
            });
        }
        for (e, &[u, v]) in edges.iter().enumerate() {
            if u >= n || v >= n {
                return Err(DrError::InvalidInput {
                    detail: format!(
                        "edge {e} references vertex out of range (u={u}, v={v}, n={n})"
                    ),
                });
            }
            if u == v {
                return Err(DrError::InvalidInput {
                    detail: format!("edge {e} is a self-loop (u = v = {u})"),
                });
            }
        }

        let fpre = Self::optional_or_zero(optional.fpre, m, "fpre")?;
        let lpre = Self::optional_or_zero(optional.lpre, m, "lpre")?;
        let mut linit = Self::optional_or_zero(optional.linit, m, "linit")?;
        let e_mod = Self::optional_or_zero(optional.e, m, "E")?;
        let radius = Self::optional_or_zero(optional.radius, m, "radius")?;

        let fixed: BTreeSet<usize> = fixed.into_iter().collect();
        for &i in &fixed {
            if i >= n {
                return Err(DrError::InvalidInput {
                    detail: format!("fixed vertex index {i} is out of range (n={n})"),
                });
            }
        }
        let free: Vec<usize> = (0..n).filter(|i| !fixed.contains(i)).collect();

        let mut free_index_of = vec![None; n];
        for (idx, &v) in free.iter().enumerate() {
            free_index_of[v] = Some(idx);
        }

        let ea = DVector::from_iterator(
            m,
            e_mod
                .iter()
                .zip(radius.iter())
                .map(|(&ei, &ri)| ei * std::f64::consts::PI * ri * ri),
        );

        let (c, ct) = build_connectivity(&edges, n);
        let (ci, cit) = build_free_restricted(&edges, &free_index_of, free.len());
        let ct2 = square_transpose(&ct);

        let q0 = DVector::from_element(m, 1.0);
        let position_vectors: Vec<Vector> = vertices.iter().map(|p| p.coords).collect();
        let u0 = spmv_vec3(&c, &position_vectors);
        let l0 = DVector::from_iterator(m, u0.iter().map(|u| u.norm()));

        if linit.iter().all(|&x| x == 0.0) {
            linit = l0.clone();
        }

        let v0 = vec![Vector::zeros(); n];
        let r0 = vec![Vector::zeros(); n];

        Ok(InputData {
            vertices,
            edges,
            fixed,
            free,
            loads,
            qpre: DVector::from_vec(qpre),
            fpre,
            lpre,
            linit,
            e: e_mod,
            radius,
            ea,
            c,
            ct,
            ci,
            cit,
            ct2,
            q0,
            l0,
            v0,
            r0,
        })
    }

    /// Builds an [`InputData`] from any [`MeshTopology`], renumbering its
    /// (possibly sparse/opaque) vertex keys to a dense `[0, n)` index space.
    pub fn from_mesh<M: MeshTopology>(
        mesh: &M,
        fixed_keys: impl IntoIterator<Item = M::VertexKey>,
        loads_by_key: impl Fn(M::VertexKey) -> Vector,
        qpre: Vec<Real>,
        optional: OptionalEdgeArrays,
    ) -> DrResult<Self> {
        use std::collections::HashMap;

        let mut index_of: HashMap<M::VertexKey, usize> = HashMap::new();
        let mut vertices = Vec::new();
        for (key, position) in mesh.vertices() {
            index_of.insert(key, vertices.len());
            vertices.push(position);
        }

        let loads: Vec<Vector> = mesh
            .vertices()
            .map(|(key, _)| loads_by_key(key))
            .collect();

        let mut edges = Vec::new();
        for (ku, kv) in mesh.edges() {
            let u = *index_of.get(&ku).ok_or_else(|| DrError::InvalidInput {
                detail: "edge references a vertex key absent from the mesh".to_string(),
            })?;
            let v = *index_of.get(&kv).ok_or_else(|| DrError::InvalidInput {
                detail: "edge references a vertex key absent from the mesh".to_string(),
            })?;
            edges.push([u, v]);
        }

        let fixed: Vec<usize> = fixed_keys
            .into_iter()
            .map(|key| {
                index_of.get(&key).copied().ok_or_else(|| DrError::InvalidInput {
                    detail: "fixed vertex key absent from the mesh".to_string(),
                })
            })
            .collect::<DrResult<_>>()?;

        Self::new(vertices, edges, fixed, loads, qpre, optional)
    }

    fn optional_or_zero(
        values: Option<Vec<Real>>,
        expected_len: usize,
        name: &'static str,
    ) -> DrResult<DVector> {
        match values {
            None => Ok(DVector::zeros(expected_len)),
            Some(v) if v.len() == expected_len => Ok(DVector::from_vec(v)),
            Some(v) => Err(DrError::InvalidInput {
                detail: format!(
                    "{name} has length {} but {expected_len} edges were given",
                    v.len()
                ),
            }),
        }
    }

    /// Number of vertices, `n`.
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Number of edges, `m`.
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Current (initial) vertex positions.
    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    /// Edges as `(u, v)` index pairs.
    pub fn edges(&self) -> &[[usize; 2]] {
        &self.edges
    }

    /// Indices of fixed vertices, in ascending order.
    pub fn fixed(&self) -> &BTreeSet<usize> {
        &self.fixed
    }

    /// Indices of free vertices, in ascending order.
    pub fn free(&self) -> &[usize] {
        &self.free
    }

    /// External load per vertex.
    pub fn loads(&self) -> &[Vector] {
        &self.loads
    }

    /// `q0`: a vector of ones, one per edge.
    ///
    /// This property is carried over from the original implementation for
    /// API parity; the working force density `q` the solver actually
    /// iterates is *not* derived from it (§9, Open Question).
    pub fn q0(&self) -> &DVector {
        &self.q0
    }

    /// `l0`: the edge lengths at the vertex positions the `InputData` was
    /// constructed with.
    pub fn l0(&self) -> &DVector {
        &self.l0
    }

    /// `v0`: zero-initialized vertex velocities.
    pub fn v0(&self) -> &[Vector] {
        &self.v0
    }

    /// `r0`: zero-initialized vertex residuals.
    pub fn r0(&self) -> &[Vector] {
        &self.r0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_bar() -> InputData {
        InputData::new(
            vec![Point::origin(), Point::new(1.0, 0.0, 0.0)],
            vec![[0, 1]],
            vec![0],
            vec![Vector::zeros(), Vector::zeros()],
            vec![1.0],
            OptionalEdgeArrays::default(),
        )
        .unwrap()
    }

    #[test]
    fn derives_free_set_and_initial_length() {
        let data = unit_bar();
        assert_eq!(data.free(), &[1]);
        assert_eq!(data.l0()[0], 1.0);
        assert_eq!(data.q0()[0], 1.0);
    }

    #[test]
    fn rejects_cardinality_mismatch() {
        let err = InputData::new(
            vec![Point::origin(), Point::new(1.0, 0.0, 0.0)],
            vec![[0, 1]],
            vec![0],
            vec![Vector::zeros()],
            vec![1.0],
            OptionalEdgeArrays::default(),
        )
        .unwrap_err();
        assert!(matches!(err, DrError::InvalidInput { .. }));
    }

    #[test]
    fn rejects_out_of_range_edge() {
        let err = InputData::new(
            vec![Point::origin(), Point::new(1.0, 0.0, 0.0)],
            vec![[0, 5]],
            vec![0],
            vec![Vector::zeros(), Vector::zeros()],
            vec![1.0],
            OptionalEdgeArrays::default(),
        )
        .unwrap_err();
        assert!(matches!(err, DrError::InvalidInput { .. }));
    }

    #[test]
    fn rejects_self_loop() {
        let err = InputData::new(
            vec![Point::origin(), Point::new(1.0, 0.0, 0.0)],
            vec![[0, 0]],
            vec![0],
            vec![Vector::zeros(), Vector::zeros()],
            vec![1.0],
            OptionalEdgeArrays::default(),
        )
        .unwrap_err();
        assert!(matches!(err, DrError::InvalidInput { .. }));
    }

    #[test]
    fn linit_defaults_to_l0_when_all_zero() {
        let data = unit_bar();
        assert_eq!(data.linit[0], data.l0[0]);
    }
}
