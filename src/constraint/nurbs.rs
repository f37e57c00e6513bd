//! Minimal NURBS curve/surface evaluation and closest-point search.
//!
//! Only what [`super::curve::CurveConstraint`] and
//! [`super::surface::SurfaceConstraint`] need is implemented: point
//! evaluation via the standard de Boor recursion, derivatives by central
//! finite difference (simple and robust rather than the analytic recursive
//! derivative formulas, which this crate has no need to carry), and
//! closest-point search by coarse sampling followed by ternary-search
//! refinement (unimodal in a small enough neighborhood of the sampled
//! minimum, and derivative-free).

use crate::error::{DrError, DrResult};
use crate::math::{Point, Real, Vector};

const DEGENERACY_EPS: Real = 1.0e-10;
const FINITE_DIFF_H: Real = 1.0e-6;

/// A NURBS curve: degree, clamped knot vector, control points, and weights.
#[derive(Debug, Clone)]
#[cfg_attr(
    feature = "serde-serialize",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct NurbsCurve {
    pub(crate) degree: usize,
    pub(crate) knots: Vec<Real>,
    pub(crate) control_points: Vec<Point>,
    pub(crate) weights: Vec<Real>,
}

impl NurbsCurve {
    /// Builds a curve, validating the knot/control-point/weight cardinalities.
    pub fn new(
        degree: usize,
        knots: Vec<Real>,
        control_points: Vec<Point>,
        weights: Vec<Real>,
    ) -> DrResult<Self> {
        let n = control_points.len();
        if n < degree + 1 {
            return Err(DrError::InvalidInput {
                detail: format!("NURBS curve needs at least {} control points", degree + 1),
            });
        }
        if weights.len() != n {
            return Err(DrError::InvalidInput {
                detail: "NURBS curve weights length must match control points".to_string(),
            });
        }
        if knots.len() != n + degree + 1 {
            return Err(DrError::InvalidInput {
                detail: format!(
                    "NURBS curve knot vector must have length {}, got {}",
                    n + degree + 1,
                    knots.len()
                ),
            });
        }
        Ok(Self {
            degree,
            knots,
            control_points,
            weights,
        })
    }

    fn domain(&self) -> (Real, Real) {
        (self.knots[self.degree], self.knots[self.control_points.len()])
    }

    /// Evaluates the curve at parameter `u` (clamped to the curve's domain).
    pub fn point_at(&self, u: Real) -> Point {
        let (lo, hi) = self.domain();
        let u = u.clamp(lo, hi);
        let span = find_span(self.control_points.len() - 1, self.degree, u, &self.knots);
        let basis = basis_funs(span, u, self.degree, &self.knots);

        let mut num = Vector::zeros();
        let mut den = 0.0;
        for i in 0..=self.degree {
            let ctrl_idx = span - self.degree + i;
            let w = self.weights[ctrl_idx];
            num += self.control_points[ctrl_idx].coords * (basis[i] * w);
            den += basis[i] * w;
        }
        Point::from(num / den)
    }

    fn tangent_at(&self, u: Real) -> Vector {
        let (lo, hi) = self.domain();
        let span = hi - lo;
        let h = (FINITE_DIFF_H * span.max(1.0)).min(span / 4.0).max(1.0e-9);
        let a = (u - h).max(lo);
        let b = (u + h).min(hi);
        (self.point_at(b) - self.point_at(a)) / (b - a)
    }

    /// Finds the closest point on the curve to `target`, returning its
    /// position and unit tangent there.
    pub(crate) fn closest_point(&self, target: &Point) -> DrResult<(Point, Vector)> {
        let (lo, hi) = self.domain();
        let u = ternary_search_min(lo, hi, 64, |u| (self.point_at(u) - target).norm_squared());
        let point = self.point_at(u);
        let tangent = self.tangent_at(u);
        let norm = tangent.norm();
        if norm < DEGENERACY_EPS {
            return Err(DrError::GeometricError {
                vertex: 0,
                detail: "NURBS curve tangent degenerates to zero at closest point".to_string(),
            });
        }
        Ok((point, tangent / norm))
    }
}

/// A NURBS surface: two degrees, two clamped knot vectors, a control point
/// grid (`rows x cols`), and matching weights.
#[derive(Debug, Clone)]
#[cfg_attr(
    feature = "serde-serialize",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct NurbsSurface {
    pub(crate) degree_u: usize,
    pub(crate) degree_v: usize,
    pub(crate) knots_u: Vec<Real>,
    pub(crate) knots_v: Vec<Real>,
    pub(crate) control_points: Vec<Vec<Point>>,
    pub(crate) weights: Vec<Vec<Real>>,
}

impl NurbsSurface {
    /// Builds a surface, validating knot/control-grid/weight cardinalities.
    pub fn new(
        degree_u: usize,
        degree_v: usize,
        knots_u: Vec<Real>,
        knots_v: Vec<Real>,
        control_points: Vec<Vec<Point>>,
        weights: Vec<Vec<Real>>,
    ) -> DrResult<Self> {
        let rows = control_points.len();
        if rows < degree_u + 1 {
            return Err(DrError::InvalidInput {
                detail: "NURBS surface needs enough control rows for its u-degree".to_string(),
            });
        }
        let cols = control_points[0].len();
        if cols < degree_v + 1 {
            return Err(DrError::InvalidInput {
                detail: "NURBS surface needs enough control columns for its v-degree".to_string(),
            });
        }
        if control_points.iter().any(|row| row.len() != cols)
            || weights.len() != rows
            || weights.iter().any(|row| row.len() != cols)
        {
            return Err(DrError::InvalidInput {
                detail: "NURBS surface control/weight grid is not rectangular".to_string(),
            });
        }
        if knots_u.len() != rows + degree_u + 1 {
            return Err(DrError::InvalidInput {
                detail: "NURBS surface u-knot vector has the wrong length".to_string(),
            });
        }
        if knots_v.len() != cols + degree_v + 1 {
            return Err(DrError::InvalidInput {
                detail: "NURBS surface v-knot vector has the wrong length".to_string(),
            });
        }
        Ok(Self {
            degree_u,
            degree_v,
            knots_u,
            knots_v,
            control_points,
            weights,
        })
    }

    fn domain(&self) -> (Real, Real, Real, Real) {
        (
            self.knots_u[self.degree_u],
            self.knots_u[self.control_points.len()],
            self.knots_v[self.degree_v],
            self.knots_v[self.control_points[0].len()],
        )
    }

    /// Evaluates the surface at `(u, v)` (clamped to the surface's domain).
    pub fn point_at(&self, u: Real, v: Real) -> Point {
        let (u_lo, u_hi, v_lo, v_hi) = self.domain();
        let u = u.clamp(u_lo, u_hi);
        let v = v.clamp(v_lo, v_hi);

        let rows = self.control_points.len();
        let cols = self.control_points[0].len();
        let span_u = find_span(rows - 1, self.degree_u, u, &self.knots_u);
        let span_v = find_span(cols - 1, self.degree_v, v, &self.knots_v);
        let basis_u = basis_funs(span_u, u, self.degree_u, &self.knots_u);
        let basis_v = basis_funs(span_v, v, self.degree_v, &self.knots_v);

        let mut num = Vector::zeros();
        let mut den = 0.0;
        for i in 0..=self.degree_u {
            let ri = span_u - self.degree_u + i;
            for j in 0..=self.degree_v {
                let cj = span_v - self.degree_v + j;
                let w = self.weights[ri][cj];
                let b = basis_u[i] * basis_v[j] * w;
                num += self.control_points[ri][cj].coords * b;
                den += b;
            }
        }
        Point::from(num / den)
    }

    fn partials_at(&self, u: Real, v: Real) -> (Vector, Vector) {
        let (u_lo, u_hi, v_lo, v_hi) = self.domain();
        let span_u = u_hi - u_lo;
        let span_v = v_hi - v_lo;
        let hu = (FINITE_DIFF_H * span_u.max(1.0)).min(span_u / 4.0).max(1.0e-9);
        let hv = (FINITE_DIFF_H * span_v.max(1.0)).min(span_v / 4.0).max(1.0e-9);

        let au = (u - hu).max(u_lo);
        let bu = (u + hu).min(u_hi);
        let du = (self.point_at(bu, v) - self.point_at(au, v)) / (bu - au);

        let av = (v - hv).max(v_lo);
        let bv = (v + hv).min(v_hi);
        let dv = (self.point_at(u, bv) - self.point_at(u, av)) / (bv - av);

        (du, dv)
    }

    /// Finds the closest point on the surface to `target`, returning its
    /// position and unit normal there.
    pub(crate) fn closest_point(&self, target: &Point) -> DrResult<(Point, Vector)> {
        let (u_lo, u_hi, v_lo, v_hi) = self.domain();

        let mut best = (u_lo, v_lo, Real::INFINITY);
        const GRID: usize = 16;
        for iu in 0..=GRID {
            let u = u_lo + (u_hi - u_lo) * (iu as Real) / (GRID as Real);
            for iv in 0..=GRID {
                let v = v_lo + (v_hi - v_lo) * (iv as Real) / (GRID as Real);
                let d2 = (self.point_at(u, v) - target).norm_squared();
                if d2 < best.2 {
                    best = (u, v, d2);
                }
            }
        }

        let (mut u, mut v, _) = best;
        for _ in 0..6 {
            let win_u = (u_hi - u_lo) / (GRID as Real);
            let win_v = (v_hi - v_lo) / (GRID as Real);
            u = ternary_search_min(
                (u - win_u).max(u_lo),
                (u + win_u).min(u_hi),
                24,
                |u| (self.point_at(u, v) - target).norm_squared(),
            );
            v = ternary_search_min(
                (v - win_v).max(v_lo),
                (v + win_v).min(v_hi),
                24,
                |v| (self.point_at(u, v) - target).norm_squared(),
            );
        }

        let point = self.point_at(u, v);
        let (du, dv) = self.partials_at(u, v);
        let normal = du.cross(&dv);
        let norm = normal.norm();
        if norm < DEGENERACY_EPS {
            return Err(DrError::GeometricError {
                vertex: 0,
                detail: "NURBS surface normal degenerates to zero at closest point".to_string(),
            });
        }
        Ok((point, normal / norm))
    }
}

/// Finds the knot span index containing `u` (standard NURBS book algorithm
/// A2.1, adapted to clamp at the last span for `u == knots[n+1]`).
fn find_span(n: usize, degree: usize, u: Real, knots: &[Real]) -> usize {
    if u >= knots[n + 1] {
        return n;
    }
    let mut low = degree;
    let mut high = n + 1;
    let mut mid = (low + high) / 2;
    while u < knots[mid] || u >= knots[mid + 1] {
        if u < knots[mid] {
            high = mid;
        } else {
            low = mid;
        }
        mid = (low + high) / 2;
    }
    mid
}

/// Evaluates the `degree + 1` non-zero B-spline basis functions at `u`
/// (standard NURBS book algorithm A2.2).
fn basis_funs(span: usize, u: Real, degree: usize, knots: &[Real]) -> Vec<Real> {
    let mut basis = vec![0.0; degree + 1];
    let mut left = vec![0.0; degree + 1];
    let mut right = vec![0.0; degree + 1];
    basis[0] = 1.0;
    for j in 1..=degree {
        left[j] = u - knots[span + 1 - j];
        right[j] = knots[span + j] - u;
        let mut saved = 0.0;
        for r in 0..j {
            let temp = basis[r] / (right[r + 1] + left[j - r]);
            basis[r] = saved + right[r + 1] * temp;
            saved = left[j - r] * temp;
        }
        basis[j] = saved;
    }
    basis
}

/// Minimizes a unimodal scalar function over `[lo, hi]` by ternary search.
fn ternary_search_min(mut lo: Real, mut hi: Real, iterations: usize, f: impl Fn(Real) -> Real) -> Real {
    for _ in 0..iterations {
        if hi - lo < 1.0e-14 {
            break;
        }
        let m1 = lo + (hi - lo) / 3.0;
        let m2 = hi - (hi - lo) / 3.0;
        if f(m1) <= f(m2) {
            hi = m2;
        } else {
            lo = m1;
        }
    }
    0.5 * (lo + hi)
}
