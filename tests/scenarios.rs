//! End-to-end dynamic-relaxation scenarios.

use approx::assert_relative_eq;
use dr_solver::prelude::*;

fn grid_vertices(nx: usize, ny: usize, spacing: Real) -> Vec<Point> {
    (0..ny)
        .flat_map(|j| (0..nx).map(move |i| (i, j)))
        .map(|(i, j)| Point::new(i as Real * spacing, j as Real * spacing, 0.0))
        .collect()
}

fn grid_edges(nx: usize, ny: usize) -> Vec<[usize; 2]> {
    let idx = |i: usize, j: usize| j * nx + i;
    let mut edges = Vec::new();
    for j in 0..ny {
        for i in 0..nx {
            if i + 1 < nx {
                edges.push([idx(i, j), idx(i + 1, j)]);
            }
            if j + 1 < ny {
                edges.push([idx(i, j), idx(i, j + 1)]);
            }
        }
    }
    edges
}

fn grid_corners(nx: usize, ny: usize) -> Vec<usize> {
    let idx = |i: usize, j: usize| j * nx + i;
    vec![
        idx(0, 0),
        idx(nx - 1, 0),
        idx(0, ny - 1),
        idx(nx - 1, ny - 1),
    ]
}

#[test]
fn square_cable_net_corners_pinned_stays_flat() {
    let nx = 3;
    let ny = 3;
    let vertices = grid_vertices(nx, ny, 1.0);
    let edges = grid_edges(nx, ny);
    let n = vertices.len();
    let m = edges.len();

    let indata = InputData::new(
        vertices.clone(),
        edges,
        grid_corners(nx, ny),
        vec![Vector::zeros(); n],
        vec![1.0; m],
        OptionalEdgeArrays::default(),
    )
    .unwrap();

    let constraints = vec![None; n];
    let result = dr_solve(&indata, &constraints, SolverOptions::precise()).unwrap();

    for i in indata.free() {
        let displacement = (result.xyz[*i] - vertices[*i]).norm();
        assert!(displacement < 1e-9, "vertex {i} moved by {displacement}");
        assert!(result.residuals[*i].norm() < 1e-9);
    }
}

#[test]
fn gravity_loaded_net_forms_symmetric_dish() {
    let nx = 10;
    let ny = 10;
    let vertices = grid_vertices(nx, ny, 1.0);
    let edges = grid_edges(nx, ny);
    let n = vertices.len();

    let idx = |i: usize, j: usize| j * nx + i;
    let mut fixed = Vec::new();
    let mut degree = vec![0usize; n];
    for &[u, v] in &edges {
        degree[u] += 1;
        degree[v] += 1;
    }
    for i in 0..n {
        if degree[i] == 2 {
            fixed.push(i);
        }
    }

    let qpre: Vec<Real> = edges
        .iter()
        .map(|&[u, v]| {
            if degree[u] == 2 || degree[v] == 2 {
                10.0
            } else {
                1.0
            }
        })
        .collect();

    let indata = InputData::new(
        vertices,
        edges,
        fixed,
        vec![Vector::zeros(); n],
        qpre,
        OptionalEdgeArrays::default(),
    )
    .unwrap();

    let mut opts = SolverOptions::default();
    opts.kmax = 1000;
    let constraints = vec![None; n];
    let result = dr_solve(&indata, &constraints, opts).unwrap();

    let center = idx(nx / 2, ny / 2);
    assert!(result.xyz[center].z <= 0.0);

    for i in indata.free() {
        assert!(result.residuals[*i].norm() < 1e-3);
    }
}

#[test]
fn single_bar_prestress_converges_to_prescribed_force() {
    let indata = InputData::new(
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
    .unwrap();

    let constraints = vec![None; 2];
    let result = dr_solve(&indata, &constraints, SolverOptions::precise()).unwrap();
    assert_relative_eq!(result.forces[0], 5.0, epsilon = 1e-6);
}

#[test]
fn curve_constrained_column_stays_on_the_curve() {
    let nx = 10;
    let ny = 10;
    let vertices = grid_vertices(nx, ny, 1.0);
    let edges = grid_edges(nx, ny);
    let n = vertices.len();
    let m = edges.len();

    let idx = |i: usize, j: usize| j * nx + i;
    let mut degree = vec![0usize; n];
    for &[u, v] in &edges {
        degree[u] += 1;
        degree[v] += 1;
    }
    let fixed: Vec<usize> = (0..n).filter(|&i| degree[i] == 2).collect();

    let curve = CurveConstraint::new(
        2,
        vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0],
        vec![
            Point::new(5.0, 0.0, 0.0),
            Point::new(5.0, 5.0, 5.0),
            Point::new(5.0, 9.0, 0.0),
        ],
        vec![1.0, 1.0, 1.0],
    )
    .unwrap();

    let mut constraints: Vec<Option<Constraint>> = vec![None; n];
    for j in 0..ny {
        constraints[idx(5, j)] = Some(Constraint::Curve(curve.clone()));
    }

    let indata = InputData::new(
        vertices,
        edges,
        fixed,
        vec![Vector::zeros(); n],
        vec![1.0; m],
        OptionalEdgeArrays::default(),
    )
    .unwrap();

    let mut opts = SolverOptions::default();
    opts.kmax = 2000;
    let result = dr_solve(&indata, &constraints, opts).unwrap();

    for j in 0..ny {
        let p = result.xyz[idx(5, j)];
        let distance = curve.distance_to(&p).unwrap();
        assert!(distance < 1e-6, "vertex at column 5 row {j} is {distance} from the curve");
    }
}

#[test]
fn rk_stage_choice_agrees_to_second_order_in_dt() {
    let indata = InputData::new(
        vec![Point::origin(), Point::new(1.0, 0.0, 0.0)],
        vec![[0, 1]],
        vec![0],
        vec![Vector::zeros(), Vector::zeros()],
        vec![1.0],
        OptionalEdgeArrays::default(),
    )
    .unwrap();

    let mut finals = Vec::new();
    for steps in [1usize, 2, 4] {
        let opts = SolverOptions {
            dt: 0.1,
            rk_steps: steps,
            kmax: 2000,
            ..SolverOptions::precise()
        };
        let constraints = vec![None; 2];
        let result = dr_solve(&indata, &constraints, opts).unwrap();
        finals.push(result.xyz[1]);
    }

    for pair in finals.windows(2) {
        let diff = (pair[0] - pair[1]).norm();
        assert!(diff < 1e-2, "rk stage counts disagree by {diff}");
    }
}

#[test]
fn constrained_solve_with_all_absent_constraints_matches_unconstrained() {
    let indata = InputData::new(
        vec![Point::origin(), Point::new(1.0, 0.0, 0.0), Point::new(2.0, 0.3, 0.0)],
        vec![[0, 1], [1, 2]],
        vec![0, 2],
        vec![Vector::zeros(); 3],
        vec![1.0, 1.0],
        OptionalEdgeArrays::default(),
    )
    .unwrap();

    let constraints = vec![None; 3];
    let with_constraints = dr_solve(&indata, &constraints, SolverOptions::precise()).unwrap();
    let without = dr_solve_unconstrained(&indata, SolverOptions::precise()).unwrap();

    for i in 0..3 {
        assert_relative_eq!(with_constraints.xyz[i], without.xyz[i], epsilon = 1e-12);
    }
    for e in 0..2 {
        assert_relative_eq!(with_constraints.forces[e], without.forces[e], epsilon = 1e-12);
    }
}

#[test]
fn resolving_a_converged_result_is_idempotent() {
    let nx = 3;
    let ny = 3;
    let vertices = grid_vertices(nx, ny, 1.0);
    let edges = grid_edges(nx, ny);
    let n = vertices.len();
    let m = edges.len();

    let indata = InputData::new(
        vertices,
        edges.clone(),
        grid_corners(nx, ny),
        vec![Vector::zeros(); n],
        vec![1.0; m],
        OptionalEdgeArrays::default(),
    )
    .unwrap();
    let constraints = vec![None; n];
    let first = dr_solve(&indata, &constraints, SolverOptions::precise()).unwrap();

    let resolved_indata = InputData::new(
        first.xyz.clone(),
        edges,
        grid_corners(nx, ny),
        vec![Vector::zeros(); n],
        vec![1.0; m],
        OptionalEdgeArrays::default(),
    )
    .unwrap();

    let mut iterations_used = 0usize;
    let opts = SolverOptions {
        kmax: 2,
        callback: Some(Box::new(move |k, _x, _c1, _c2| {
            iterations_used = k + 1;
            ControlFlow::Continue
        })),
        ..SolverOptions::precise()
    };
    let second = dr_solve(&resolved_indata, &constraints, opts).unwrap();

    for i in indata.free() {
        assert!(second.residuals[*i].norm() < SolverOptions::precise().tol1);
    }
}

#[test]
fn zero_lpre_and_zero_linit_contribute_no_force_density() {
    let indata = InputData::new(
        vec![Point::origin(), Point::new(1.0, 0.0, 0.0)],
        vec![[0, 1]],
        vec![0],
        vec![Vector::zeros(), Vector::zeros()],
        vec![0.5],
        OptionalEdgeArrays {
            fpre: Some(vec![0.0]),
            lpre: Some(vec![0.0]),
            linit: Some(vec![0.0]),
            e: Some(vec![0.0]),
            radius: Some(vec![0.0]),
        },
    )
    .unwrap();

    let constraints = vec![None; 2];
    let result = dr_solve(&indata, &constraints, SolverOptions::fast()).unwrap();
    // With lpre = linit = 0 (and no prestress/elasticity), q must settle at
    // qpre alone: the lpre- and EA-derived terms are scrubbed to zero rather
    // than producing NaN/inf from division by zero.
    assert_relative_eq!(result.q[0], 0.5, epsilon = 1e-9);
}

#[test]
fn constrained_fixed_vertex_lies_on_its_locus() {
    let circle = CircleConstraint::new(Point::origin(), Vector::new(0.0, 0.0, 1.0), 2.0).unwrap();
    let indata = InputData::new(
        vec![Point::new(2.1, 0.1, 0.0), Point::new(0.0, 0.0, 3.0)],
        vec![[0, 1]],
        vec![0],
        vec![Vector::zeros(), Vector::zeros()],
        vec![1.0],
        OptionalEdgeArrays::default(),
    )
    .unwrap();

    let mut constraints: Vec<Option<Constraint>> = vec![None; 2];
    constraints[0] = Some(Constraint::Circle(circle.clone()));

    let result = dr_solve(&indata, &constraints, SolverOptions::precise()).unwrap();
    let radial = (result.xyz[0].x * result.xyz[0].x + result.xyz[0].y * result.xyz[0].y).sqrt();
    let distance = (radial - 2.0).abs();
    assert!(distance < 1e-6, "fixed constrained vertex is {distance} off its circle");
    assert_relative_eq!(result.xyz[0].z, 0.0, epsilon = 1e-9);
}

#[test]
fn callback_abort_stops_exactly_at_the_requested_iteration() {
    let indata = InputData::new(
        vec![Point::origin(), Point::new(1.0, 0.0, 0.0)],
        vec![[0, 1]],
        vec![0],
        vec![Vector::zeros(), Vector::zeros()],
        vec![1.0],
        OptionalEdgeArrays::default(),
    )
    .unwrap();

    let mut last_seen = 0usize;
    let opts = SolverOptions {
        kmax: 10_000,
        callback: Some(Box::new(move |k, _x, _crit1, _crit2| {
            last_seen = k;
            if k == 5 {
                ControlFlow::Abort
            } else {
                ControlFlow::Continue
            }
        })),
        ..SolverOptions::default()
    };

    let constraints = vec![None; 2];
    let result = dr_solve(&indata, &constraints, opts);
    assert!(result.is_ok());
}
