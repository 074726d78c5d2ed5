//! Property-based tests for the graphical solver
//!
//! Random problems use small integer coefficients so that vertices are well
//! separated relative to the default tolerance.

use graphlp_solver::{
    centroid, dedup_points, is_feasible, Constraint, ConstraintOp, Direction, LpProblem, Objective, Point,
    SolutionStatus, Solver, EPSILON,
};
use proptest::prelude::*;

fn op_strategy() -> impl Strategy<Value = ConstraintOp> {
    prop_oneof![Just(ConstraintOp::Le), Just(ConstraintOp::Ge), Just(ConstraintOp::Eq)]
}

fn problem_strategy() -> impl Strategy<Value = LpProblem> {
    let row = (-10i32..=10, -10i32..=10, op_strategy(), 0i32..=50)
        .prop_filter("degenerate row", |(a, b, _, _)| *a != 0 || *b != 0);
    (
        prop::collection::vec(row, 1..6),
        -10i32..=10,
        -10i32..=10,
        any::<bool>(),
    )
        .prop_map(|(rows, oa, ob, maximize)| {
            let direction = if maximize { Direction::Maximize } else { Direction::Minimize };
            let mut problem = LpProblem::new(Objective::new(oa as f64, ob as f64, direction));
            for (i, (a, b, op, rhs)) in rows.into_iter().enumerate() {
                problem.add_constraint(format!("c{}", i + 1), a as f64, b as f64, op, rhs as f64);
            }
            problem
        })
}

fn points_strategy() -> impl Strategy<Value = Vec<Point>> {
    prop::collection::vec((0.0f64..5.0, 0.0f64..5.0), 0..20)
        .prop_map(|xs| xs.into_iter().map(|(x, y)| Point::new(x, y)).collect())
}

proptest! {
    /// Every vertex is feasible, non-negative and distinct from the others.
    #[test]
    fn vertices_are_feasible_and_distinct(problem in problem_strategy()) {
        let solution = Solver::new().solve(&problem).unwrap();
        for (i, v) in solution.vertices.iter().enumerate() {
            prop_assert!(v.is_non_negative());
            prop_assert!(is_feasible(v, &problem.constraints, EPSILON));
            for w in &solution.vertices[i + 1..] {
                prop_assert!(!v.approx_eq(w, EPSILON));
            }
        }
    }

    /// Boundary angles around the centroid never decrease.
    #[test]
    fn region_is_angle_ordered(problem in problem_strategy()) {
        let solution = Solver::new().solve(&problem).unwrap();
        if solution.vertices.len() >= 3 {
            let center = centroid(&solution.vertices).unwrap();
            let angles: Vec<f64> = solution.vertices.iter().map(|v| v.angle_from(&center)).collect();
            for pair in angles.windows(2) {
                prop_assert!(pair[0] <= pair[1]);
            }
        }
    }

    /// Running the deduplicator on its own output changes nothing.
    #[test]
    fn dedup_is_idempotent(points in points_strategy()) {
        let once = dedup_points(&points, EPSILON);
        let twice = dedup_points(&once, EPSILON);
        prop_assert_eq!(once, twice);
    }

    /// The optimum is one of the vertices and none of them is strictly better.
    #[test]
    fn optimum_is_best_vertex(problem in problem_strategy()) {
        let solution = Solver::new().solve(&problem).unwrap();
        match solution.optimum {
            None => {
                prop_assert_eq!(solution.status, SolutionStatus::Infeasible);
                prop_assert!(solution.vertices.is_empty());
            }
            Some(optimum) => {
                prop_assert!(solution.vertices.contains(&optimum.point));
                for v in &solution.vertices {
                    let value = problem.objective.value_at(v);
                    prop_assert!(!problem.objective.improves(value, optimum.value));
                }
            }
        }
    }

    /// Negating the objective and flipping the direction keeps the point and negates the value.
    #[test]
    fn negated_objective_is_symmetric(problem in problem_strategy()) {
        let mut mirrored = problem.clone();
        mirrored.objective = Objective::new(
            -problem.objective.a,
            -problem.objective.b,
            problem.objective.direction.flipped(),
        );
        let original = Solver::new().solve(&problem).unwrap();
        let flipped = Solver::new().solve(&mirrored).unwrap();
        prop_assert_eq!(original.point(), flipped.point());
        prop_assert_eq!(original.value(), flipped.value().map(|v| -v));
    }
}

#[test]
fn parallel_constraints_scenario() {
    let mut problem = LpProblem::new(Objective::maximize(1.0, 1.0));
    problem.add_constraint("wide", 1.0, 1.0, ConstraintOp::Le, 10.0);
    problem.add_constraint("narrow", 1.0, 1.0, ConstraintOp::Le, 5.0);
    let solution = graphlp_solver::solve(&problem).unwrap();
    assert_eq!(solution.vertices.len(), 3);
    for v in [Point::new(0.0, 0.0), Point::new(5.0, 0.0), Point::new(0.0, 5.0)] {
        assert!(solution.vertices.iter().any(|p| p.approx_eq(&v, EPSILON)));
    }
    assert_eq!(solution.value(), Some(5.0));
}

#[test]
fn constraint_free_problem_is_just_the_origin() {
    let problem = LpProblem::new(Objective::maximize(2.0, 3.0));
    let solution = graphlp_solver::solve(&problem).unwrap();
    assert_eq!(solution.vertices, vec![Point::ORIGIN]);
    assert_eq!(solution.value(), Some(0.0));
}

#[test]
fn vertex_lists_do_not_depend_on_objective() {
    let constraints = vec![
        Constraint::new("c1", 1.0, 2.0, ConstraintOp::Le, 8.0),
        Constraint::new("c2", 3.0, 1.0, ConstraintOp::Le, 9.0),
    ];
    let mut a = LpProblem::new(Objective::maximize(1.0, 0.0));
    a.constraints = constraints.clone();
    let mut b = LpProblem::new(Objective::minimize(0.0, -1.0));
    b.constraints = constraints;
    let sa = graphlp_solver::solve(&a).unwrap();
    let sb = graphlp_solver::solve(&b).unwrap();
    assert_eq!(sa.vertices, sb.vertices);
}
