//! Construction and application of the connectivity operators.
//!
//! The connectivity matrix `C` is ±1/0 and never needs to be factorized, so
//! a compressed-sparse-row representation is enough (Design Note, §9 of the
//! specification this crate implements). Rather than ever materializing the
//! assembled operator `D = Ciᵀ Q C`, the solver applies it as a pair of
//! sparse matrix-vector products (`spmv_vec3`/`spmv_scalar`), which is both
//! cheaper and keeps every product expressed through the same small,
//! reviewable primitive.

use crate::math::{CooMatrix, CsrMatrix, DVector, Real, Vector};

/// Builds the full connectivity matrix `C` (`m x n`) and its transpose `Cᵀ`
/// (`n x m`) from the edge list. Row `e` of `C` has `+1` at column `u(e)`
/// and `-1` at column `v(e)`.
pub(crate) fn build_connectivity(edges: &[[usize; 2]], n: usize) -> (CsrMatrix, CsrMatrix) {
    let m = edges.len();
    let mut coo_c = CooMatrix::new(m, n);
    let mut coo_ct = CooMatrix::new(n, m);

    for (e, &[u, v]) in edges.iter().enumerate() {
        coo_c.push(e, u, 1.0);
        coo_c.push(e, v, -1.0);
        coo_ct.push(u, e, 1.0);
        coo_ct.push(v, e, -1.0);
    }

    (CsrMatrix::from(&coo_c), CsrMatrix::from(&coo_ct))
}

/// Builds `Ci = C[:, free]` (`m x n_free`) and its transpose `Ciᵀ`
/// (`n_free x m`), remapping each free vertex index to its position in
/// `free`. Columns for fixed vertices are simply dropped, matching the
/// Python source's `C[:, free]` slice.
pub(crate) fn build_free_restricted(
    edges: &[[usize; 2]],
    free_index_of: &[Option<usize>],
    n_free: usize,
) -> (CsrMatrix, CsrMatrix) {
    let m = edges.len();
    let mut coo_ci = CooMatrix::new(m, n_free);
    let mut coo_cit = CooMatrix::new(n_free, m);

    for (e, &[u, v]) in edges.iter().enumerate() {
        if let Some(ui) = free_index_of[u] {
            coo_ci.push(e, ui, 1.0);
            coo_cit.push(ui, e, 1.0);
        }
        if let Some(vi) = free_index_of[v] {
            coo_ci.push(e, vi, -1.0);
            coo_cit.push(vi, e, -1.0);
        }
    }

    (CsrMatrix::from(&coo_ci), CsrMatrix::from(&coo_cit))
}

/// Builds `Cᵀ²`, the element-wise square of `Cᵀ`. Since every entry of `Cᵀ`
/// is `±1`, this has the same sparsity pattern with every value replaced by
/// `1.0`; it is used to lump edge masses onto incident vertices regardless
/// of edge orientation.
pub(crate) fn square_transpose(ct: &CsrMatrix) -> CsrMatrix {
    let pattern = ct.pattern().clone();
    let values = vec![1.0; ct.nnz()];
    CsrMatrix::try_from_pattern_and_values(pattern, values)
        .expect("squaring preserves the sparsity pattern")
}

/// Sparse matrix times a dense scalar vector: `y = A x`.
pub(crate) fn spmv_scalar(a: &CsrMatrix, x: &DVector) -> DVector {
    let mut y = DVector::zeros(a.nrows());
    for (row, mut row_out) in y.iter_mut().enumerate() {
        let r = a.row(row);
        let mut sum = 0.0 as Real;
        for (col, val) in r.col_indices().iter().zip(r.values()) {
            sum += val * x[*col];
        }
        *row_out = sum;
    }
    y
}

/// Sparse matrix times a slice of 3D vectors, applied component-wise:
/// `y[i] = sum_j A[i, j] * x[j]`.
pub(crate) fn spmv_vec3(a: &CsrMatrix, x: &[Vector]) -> Vec<Vector> {
    let mut y = vec![Vector::zeros(); a.nrows()];
    for (row, y_row) in y.iter_mut().enumerate() {
        let r = a.row(row);
        let mut sum = Vector::zeros();
        for (col, val) in r.col_indices().iter().zip(r.values()) {
            sum += x[*col] * *val;
        }
        *y_row = sum;
    }
    y
}
