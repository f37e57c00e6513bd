//! The dynamic-relaxation solver entry point.

mod options;
mod result;
mod state;

pub use options::{ControlFlow, SolverOptions};
pub use result::ResultData;

use tracing::{debug, info, trace};

use crate::constraint::Constraint;
use crate::data::InputData;
use crate::data::sparse::{spmv_scalar, spmv_vec3};
use crate::error::{DrError, DrResult};
use crate::integrator::rk_step;
use crate::math::{DVector, Real, Vector};

use state::SolverState;

/// Runs dynamic relaxation on `indata` until convergence, exhaustion, or a
/// callback-requested abort, applying `constraints[i]` (if any) to vertex
/// `i` after every iteration.
///
/// `constraints` must have the same length as `indata.num_vertices()`; an
/// entry of `None` leaves the corresponding vertex unconstrained.
pub fn dr_solve(
    indata: &InputData,
    constraints: &[Option<Constraint>],
    mut opts: SolverOptions,
) -> DrResult<ResultData> {
    let n = indata.num_vertices();
    let m = indata.num_edges();

    if constraints.len() != n {
        return Err(DrError::InvalidInput {
            detail: format!(
                "constraints has length {} but there are {n} vertices",
                constraints.len()
            ),
        });
    }
    if !matches!(opts.rk_steps, 1 | 2 | 4) {
        return Err(DrError::InvalidInput {
            detail: format!(
                "unsupported Runge-Kutta stage count {} (must be 1, 2, or 4)",
                opts.rk_steps
            ),
        });
    }

    let free = indata.free.clone();
    let (a, b) = opts.damping_coefficients();

    let mut x = indata.vertices.clone();
    let mut v = indata.v0.clone();
    let mut r = indata.r0.clone();
    let mut l = indata.l0.clone();
    let mut f = DVector::from_iterator(m, (0..m).map(|e| indata.qpre[e] * l[e]));
    let mut q = indata.qpre.clone();

    // `SolverState::Initialized` is implicit here; the loop below starts
    // straight into `Iterating`.
    let mut state = SolverState::Iterating;
    let mut crit1 = Real::INFINITY;
    let mut crit2 = Real::INFINITY;
    let mut completed = 0usize;

    for k in 0..opts.kmax {
        // Step 1: recompute force density.
        let mut q_fpre = DVector::zeros(m);
        let mut q_lpre = DVector::zeros(m);
        let mut q_ea = DVector::zeros(m);
        for e in 0..m {
            q_fpre[e] = indata.fpre[e] / l[e];
            q_lpre[e] = if indata.lpre[e] == 0.0 {
                0.0
            } else {
                f[e] / indata.lpre[e]
            };
            q_ea[e] = if indata.linit[e] == 0.0 {
                0.0
            } else {
                indata.ea[e] * (l[e] - indata.linit[e]) / (indata.linit[e] * l[e])
            };
        }
        q = DVector::from_iterator(
            m,
            (0..m).map(|e| indata.qpre[e] + q_fpre[e] + q_lpre[e] + q_ea[e]),
        );

        // Step 3: lumped mass.
        let mass_source = DVector::from_iterator(m, (0..m).map(|e| {
            let ea_over_linit = if indata.linit[e] == 0.0 {
                0.0
            } else {
                indata.ea[e] / indata.linit[e]
            };
            indata.qpre[e] + q_fpre[e] + q_lpre[e] + ea_over_linit
        }));
        let mass_full = spmv_scalar(&indata.ct2, &mass_source) * (0.5 * opts.dt * opts.dt);
        let mass_free: Vec<Real> = free.iter().map(|&i| mass_full[i]).collect();

        // Step 4: integrate.
        let x0 = x.clone();
        let v0_damped: Vec<Vector> = v.iter().map(|vi| vi * a).collect();
        let v_free0: Vec<Vector> = free.iter().map(|&i| v0_damped[i]).collect();
        let mut x_trial = x0.clone();

        let dv = rk_step(opts.rk_steps, opts.dt, &v_free0, |tau, v_free| {
            for (idx, &fi) in free.iter().enumerate() {
                x_trial[fi] = x0[fi] + v_free[idx] * tau;
            }
            let x_trial_coords: Vec<Vector> = x_trial.iter().map(|p| p.coords).collect();
            let u = spmv_vec3(&indata.c, &x_trial_coords);
            let scaled: Vec<Vector> = u.iter().zip(q.iter()).map(|(ui, qi)| *ui * *qi).collect();
            let d_free = spmv_vec3(&indata.cit, &scaled);
            free.iter()
                .enumerate()
                .map(|(idx, &fi)| {
                    let r_free = indata.loads[fi] - d_free[idx];
                    r_free * b / mass_free[idx]
                })
                .collect()
        })?;

        // Step 5: advance.
        for (idx, &fi) in free.iter().enumerate() {
            v[fi] = v0_damped[fi] + dv[idx];
        }
        let dx: Vec<Vector> = free.iter().map(|&fi| v[fi] * opts.dt).collect();
        for (idx, &fi) in free.iter().enumerate() {
            x[fi] = x0[fi] + dx[idx];
        }

        // Step 6: state update.
        let x_coords: Vec<Vector> = x.iter().map(|p| p.coords).collect();
        let u_full = spmv_vec3(&indata.c, &x_coords);
        l = DVector::from_iterator(m, u_full.iter().map(|u| u.norm()));
        f = DVector::from_iterator(m, (0..m).map(|e| q[e] * l[e]));
        let scaled_full: Vec<Vector> = u_full
            .iter()
            .zip(q.iter())
            .map(|(ui, qi)| *ui * *qi)
            .collect();
        let ctq_u = spmv_vec3(&indata.ct, &scaled_full);
        r = (0..n).map(|i| indata.loads[i] - ctq_u[i]).collect();

        // Step 7: constraint projection.
        for i in 0..n {
            if let Some(constraint) = &constraints[i] {
                constraint
                    .update(&mut x[i], &mut r[i], opts.c)
                    .map_err(|err| match err {
                        DrError::GeometricError { detail, .. } => {
                            DrError::GeometricError { vertex: i, detail }
                        }
                        other => other,
                    })?;
            }
        }

        if !all_finite_points(&x)
            || !all_finite_vectors(&v)
            || !all_finite_vectors(&r)
            || !l.iter().all(|v| v.is_finite())
        {
            let field = if !all_finite_points(&x) {
                "x"
            } else if !all_finite_vectors(&v) {
                "v"
            } else if !all_finite_vectors(&r) {
                "r"
            } else {
                "l"
            };
            return Err(DrError::NumericBlowup { iteration: k, field });
        }

        // Step 8: criteria.
        crit1 = free.iter().map(|&i| r[i].norm_squared()).sum::<Real>().sqrt();
        crit2 = dx.iter().map(|d| d.norm_squared()).sum::<Real>().sqrt();
        trace!(k, crit1, crit2, "dynamic relaxation iteration");

        let mut aborted = false;
        if let Some(cb) = &mut opts.callback {
            if cb(k, &x, crit1, crit2) == ControlFlow::Abort {
                aborted = true;
            }
        }

        completed = k + 1;

        // Step 9: termination.
        if aborted {
            state = SolverState::Aborted;
            break;
        }
        if crit1 < opts.tol1 || crit2 < opts.tol2 {
            state = SolverState::Converged;
            break;
        }
        if completed == opts.kmax {
            state = SolverState::Exhausted;
            break;
        }
    }

    debug!(iterations = completed, crit1, crit2, "dynamic relaxation finished");
    info!(state = state.label(), iterations = completed, "dr_solve returned");

    Ok(ResultData {
        xyz: x,
        q,
        forces: f,
        lengths: l,
        residuals: r,
    })
}

/// Convenience wrapper for the common case of no constraints at all.
pub fn dr_solve_unconstrained(indata: &InputData, opts: SolverOptions) -> DrResult<ResultData> {
    let constraints: Vec<Option<Constraint>> = vec![None; indata.num_vertices()];
    dr_solve(indata, &constraints, opts)
}

fn all_finite_points(points: &[crate::math::Point]) -> bool {
    points.iter().all(|p| p.coords.iter().all(|c| c.is_finite()))
}

fn all_finite_vectors(vectors: &[Vector]) -> bool {
    vectors.iter().all(|v| v.iter().all(|c| c.is_finite()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{InputData, OptionalEdgeArrays};
    use crate::math::Point;
    use approx::assert_relative_eq;

    fn unit_bar_prestressed() -> InputData {
        InputData::new(
            vec![Point::origin(), Point::new(1.0, 0.0, 0.0)],
            vec![[0, 1]],
            vec![0],
            vec![Vector::zeros(), Vector::zeros()],
            vec![0.0],
            OptionalEdgeArrays {
                fpre: Some(vec![5.0]),
                e: Some(vec![1000.0]),
                radius: Some(vec![0.01]),
                ..Default::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn single_bar_converges_to_prescribed_force() {
        let indata = unit_bar_prestressed();
        let constraints = vec![None; indata.num_vertices()];
        let result = dr_solve(&indata, &constraints, SolverOptions::precise()).unwrap();
        assert_relative_eq!(result.forces[0], 5.0, epsilon = 1e-4);
    }

    #[test]
    fn fixed_vertex_never_moves_without_a_constraint() {
        let indata = unit_bar_prestressed();
        let constraints = vec![None; indata.num_vertices()];
        let result = dr_solve(&indata, &constraints, SolverOptions::fast()).unwrap();
        assert_eq!(result.xyz[0], Point::origin());
    }

    #[test]
    fn rejects_mismatched_constraints_length() {
        let indata = unit_bar_prestressed();
        let err = dr_solve(&indata, &[], SolverOptions::default()).unwrap_err();
        assert!(matches!(err, DrError::InvalidInput { .. }));
    }

    #[test]
    fn rejects_unsupported_rk_steps() {
        let indata = unit_bar_prestressed();
        let constraints = vec![None; indata.num_vertices()];
        let opts = SolverOptions {
            rk_steps: 3,
            ..SolverOptions::default()
        };
        let err = dr_solve(&indata, &constraints, opts).unwrap_err();
        assert!(matches!(err, DrError::InvalidInput { .. }));
    }

    #[test]
    fn callback_abort_stops_after_requested_iteration() {
        let indata = unit_bar_prestressed();
        let constraints = vec![None; indata.num_vertices()];
        let mut seen = 0usize;
        let opts = SolverOptions {
            callback: Some(Box::new(move |k, _x, _c1, _c2| {
                seen = k;
                if k == 4 {
                    ControlFlow::Abort
                } else {
                    ControlFlow::Continue
                }
            })),
            ..SolverOptions::default()
        };
        let result = dr_solve(&indata, &constraints, opts);
        assert!(result.is_ok());
    }
}
