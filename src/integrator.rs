//! Explicit Runge-Kutta stepping of the velocity field.
//!
//! The per-iteration acceleration closure is supplied by the solver; this
//! module only knows the Butcher-style combination of stage evaluations,
//! not what the stages mean physically.

use crate::error::{DrError, DrResult};
use crate::math::{Real, Vector};

/// Advances `v0` by one step of an explicit RK scheme with `steps` stages
/// (`1`, `2`, or `4`), returning `dv` such that the caller applies
/// `v = v0 + dv`.
///
/// `accel(tau, v_trial)` must return the acceleration evaluated at the
/// given trial time offset and trial velocity field; it is free to mutate
/// whatever scratch state the caller closed over (the solver's `x`/`r`
/// buffers), since each stage is evaluated strictly in sequence.
pub fn rk_step(
    steps: usize,
    dt: Real,
    v0: &[Vector],
    mut accel: impl FnMut(Real, &[Vector]) -> Vec<Vector>,
) -> DrResult<Vec<Vector>> {
    match steps {
        1 => {
            let a0 = accel(0.0, v0);
            Ok(a0.iter().map(|a| a * dt).collect())
        }
        2 => {
            let a0 = accel(0.0, v0);
            let k0: Vec<Vector> = a0.iter().map(|a| a * dt).collect();
            let v1 = add(v0, &k0);
            let a1 = accel(dt, &v1);
            let k1: Vec<Vector> = a1.iter().map(|a| a * dt).collect();
            Ok(k1)
        }
        4 => {
            let a0 = accel(0.0, v0);
            let k0: Vec<Vector> = a0.iter().map(|a| a * dt).collect();

            let v1 = add(v0, &scale(&k0, 0.5));
            let a1 = accel(dt / 2.0, &v1);
            let k1: Vec<Vector> = a1.iter().map(|a| a * dt).collect();

            let v2 = add(v0, &scale(&k1, 0.5));
            let a2 = accel(dt / 2.0, &v2);
            let k2: Vec<Vector> = a2.iter().map(|a| a * dt).collect();

            let v3 = add(v0, &k2);
            let a3 = accel(dt, &v3);
            let k3: Vec<Vector> = a3.iter().map(|a| a * dt).collect();

            let dv = (0..v0.len())
                .map(|i| (k0[i] + k1[i] * 2.0 + k2[i] * 2.0 + k3[i]) / 6.0)
                .collect();
            Ok(dv)
        }
        other => Err(DrError::InvalidInput {
            detail: format!("unsupported Runge-Kutta stage count {other} (must be 1, 2, or 4)"),
        }),
    }
}

fn add(a: &[Vector], b: &[Vector]) -> Vec<Vector> {
    a.iter().zip(b).map(|(x, y)| x + y).collect()
}

fn scale(a: &[Vector], s: Real) -> Vec<Vector> {
    a.iter().map(|x| x * s).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn constant_acceleration_matches_analytic_step_for_every_scheme() {
        let v0 = vec![Vector::zeros()];
        let g = Vector::new(0.0, 0.0, -9.81);
        let dt = 0.5;

        for steps in [1usize, 2, 4] {
            let dv = rk_step(steps, dt, &v0, |_tau, _v| vec![g]).unwrap();
            assert_relative_eq!(dv[0], g * dt, epsilon = 1e-9);
        }
    }

    #[test]
    fn rejects_unsupported_stage_count() {
        let v0 = vec![Vector::zeros()];
        let result = rk_step(3, 0.1, &v0, |_tau, _v| vec![Vector::zeros()]);
        assert!(result.is_err());
    }
}
