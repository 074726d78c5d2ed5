use tracing::debug;

use crate::error::SolveError;
use crate::optimizer::{alternative_optima, optimize, Optimum};
use crate::point::{Point, EPSILON};
use crate::problem::{Constraint, ConstraintOp, LpProblem};
use crate::region::feasible_region;
use crate::solution::{Analysis, ConstraintConflict, ConstraintSlack, Solution};

/// Graphical-method solver for two-variable linear programs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Solver {
    /// Tolerance shared by every floating point comparison
    tolerance: f64,
}

impl Default for Solver {
    fn default() -> Self {
        Self { tolerance: EPSILON }
    }
}

impl Solver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Enumerate the feasible region's vertices and pick the optimal one.
    ///
    /// Infeasible problems are an `Ok` solution with [`crate::SolutionStatus::Infeasible`].
    /// If the region is unbounded in the optimizing direction the result is the
    /// best generated vertex; unboundedness is not detected.
    pub fn solve(&self, problem: &LpProblem) -> Result<Solution, SolveError> {
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(SolveError::InvalidTolerance(self.tolerance));
        }
        problem.validate()?;

        debug!(
            event = "solve_start",
            constraints = problem.num_constraints(),
            direction = %problem.objective.direction,
            tolerance = self.tolerance,
        );

        let vertices = feasible_region(&problem.constraints, self.tolerance);

        let Some(optimum) = optimize(&vertices, &problem.objective) else {
            let conflicts = self.analyze_conflicts(problem);
            debug!(event = "solve_end", status = "infeasible", conflicts = conflicts.len());
            return Ok(Solution::infeasible_with_conflicts(conflicts));
        };

        let analysis = self.analyze(problem, &vertices, &optimum);
        debug!(
            event = "solve_end",
            status = "optimal",
            vertices = vertices.len(),
            value = optimum.value,
        );
        Ok(Solution::optimal(optimum, vertices, analysis))
    }

    fn analyze(&self, problem: &LpProblem, vertices: &[Point], optimum: &Optimum) -> Analysis {
        let slacks: Vec<ConstraintSlack> = problem
            .constraints
            .iter()
            .map(|c| {
                let lhs = c.lhs_at(&optimum.point);
                let slack = match c.op {
                    ConstraintOp::Le => c.rhs - lhs,
                    ConstraintOp::Ge => lhs - c.rhs,
                    ConstraintOp::Eq => (lhs - c.rhs).abs(),
                };
                ConstraintSlack {
                    constraint: c.name.clone(),
                    lhs,
                    slack,
                    binding: (lhs - c.rhs).abs() < self.tolerance,
                }
            })
            .collect();

        let binding_constraints = slacks
            .iter()
            .filter(|s| s.binding)
            .map(|s| s.constraint.clone())
            .collect();

        Analysis {
            binding_constraints,
            slacks,
            alternative_optima: alternative_optima(vertices, &problem.objective, optimum, self.tolerance),
        }
    }

    /// Explain an empty region where the cause is local: one constraint that
    /// cannot hold in the non-negative quadrant, or two parallel constraints
    /// whose bounds do not overlap. Joint infeasibility of three or more
    /// constraints yields no entries.
    fn analyze_conflicts(&self, problem: &LpProblem) -> Vec<ConstraintConflict> {
        let mut conflicts = Vec::new();

        for c in &problem.constraints {
            if self.excludes_quadrant(c) {
                conflicts.push(ConstraintConflict {
                    constraints: vec![c.name.clone()],
                    description: format!(
                        "{} requires {}, which no point with non-negative {} and {} satisfies",
                        c.name,
                        problem.describe_constraint(c),
                        problem.variables[0],
                        problem.variables[1]
                    ),
                });
            }
        }

        for (i, c1) in problem.constraints.iter().enumerate() {
            for c2 in &problem.constraints[i + 1..] {
                if let Some((lower, upper)) = self.parallel_bounds(c1, c2) {
                    if lower > upper + self.tolerance {
                        conflicts.push(ConstraintConflict {
                            constraints: vec![c1.name.clone(), c2.name.clone()],
                            description: format!(
                                "Conflict: {} ({}) and {} ({}) are parallel and leave no room between them",
                                c1.name,
                                problem.describe_constraint(c1),
                                c2.name,
                                problem.describe_constraint(c2)
                            ),
                        });
                    }
                }
            }
        }

        conflicts
    }

    /// `a*x + b*y` is `>= 0` everywhere in the quadrant when both coefficients
    /// are non-negative, and `<= 0` when both are non-positive.
    fn excludes_quadrant(&self, c: &Constraint) -> bool {
        let all_non_negative = c.a >= 0.0 && c.b >= 0.0;
        let all_non_positive = c.a <= 0.0 && c.b <= 0.0;
        let below_zero = all_non_negative && c.rhs < -self.tolerance;
        let above_zero = all_non_positive && c.rhs > self.tolerance;
        match c.op {
            ConstraintOp::Le => below_zero,
            ConstraintOp::Ge => above_zero,
            ConstraintOp::Eq => below_zero || above_zero,
        }
    }

    /// For parallel constraints, the tightest lower and upper bound both put
    /// on `c1.a*x + c1.b*y`. `None` when the lines are not parallel.
    fn parallel_bounds(&self, c1: &Constraint, c2: &Constraint) -> Option<(f64, f64)> {
        let det = c1.a * c2.b - c2.a * c1.b;
        if det.abs() >= self.tolerance {
            return None;
        }
        // c2 = k * c1 on the coefficients; use the larger coefficient for the ratio
        let k = if c1.a.abs() >= c1.b.abs() { c2.a / c1.a } else { c2.b / c1.b };
        if !k.is_finite() || k == 0.0 {
            return None;
        }

        let mut lower = f64::NEG_INFINITY;
        let mut upper = f64::INFINITY;
        for (op, bound) in [(c1.op, c1.rhs), (flip_if_negative(c2.op, k), c2.rhs / k)] {
            match op {
                ConstraintOp::Le => upper = upper.min(bound),
                ConstraintOp::Ge => lower = lower.max(bound),
                ConstraintOp::Eq => {
                    upper = upper.min(bound);
                    lower = lower.max(bound);
                }
            }
        }
        Some((lower, upper))
    }
}

fn flip_if_negative(op: ConstraintOp, k: f64) -> ConstraintOp {
    if k > 0.0 {
        return op;
    }
    match op {
        ConstraintOp::Le => ConstraintOp::Ge,
        ConstraintOp::Ge => ConstraintOp::Le,
        ConstraintOp::Eq => ConstraintOp::Eq,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::{Direction, Objective};
    use crate::solution::SolutionStatus;
    use approx::assert_abs_diff_eq;

    fn contains(points: &[Point], target: Point) -> bool {
        points.iter().any(|p| p.approx_eq(&target, EPSILON))
    }

    fn production() -> LpProblem {
        // Maximize: x1 + x2
        // Subject to:
        //   x1 + x2 <= 10
        //   2x1 + x2 <= 15
        let mut problem = LpProblem::new(Objective::maximize(1.0, 1.0));
        problem.add_constraint("capacity", 1.0, 1.0, ConstraintOp::Le, 10.0);
        problem.add_constraint("labor", 2.0, 1.0, ConstraintOp::Le, 15.0);
        problem
    }

    #[test]
    fn test_simple_maximization() {
        // Maximize: 3x + 2y
        // Subject to:
        //   x + y <= 4
        //   x <= 3
        //   y <= 3
        // Optimal: x=3, y=1, obj=11
        let mut problem = LpProblem::new(Objective::maximize(3.0, 2.0));
        problem.add_constraint("sum", 1.0, 1.0, ConstraintOp::Le, 4.0);
        problem.add_constraint("x_max", 1.0, 0.0, ConstraintOp::Le, 3.0);
        problem.add_constraint("y_max", 0.0, 1.0, ConstraintOp::Le, 3.0);

        let solution = Solver::new().solve(&problem).unwrap();

        assert_eq!(solution.status, SolutionStatus::Optimal);
        let optimum = solution.optimum.unwrap();
        assert_abs_diff_eq!(optimum.point.x, 3.0, epsilon = 1e-9);
        assert_abs_diff_eq!(optimum.point.y, 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(optimum.value, 11.0, epsilon = 1e-9);
        assert_eq!(solution.vertices.len(), 5);
    }

    #[test]
    fn test_minimization_with_ge() {
        // Minimize: 2x + 3y
        // Subject to:
        //   x + y >= 4
        //   x <= 3
        //   y <= 3
        // Optimal: x=3, y=1, obj=9
        let mut problem = LpProblem::new(Objective::minimize(2.0, 3.0));
        problem.add_constraint("sum", 1.0, 1.0, ConstraintOp::Ge, 4.0);
        problem.add_constraint("x_max", 1.0, 0.0, ConstraintOp::Le, 3.0);
        problem.add_constraint("y_max", 0.0, 1.0, ConstraintOp::Le, 3.0);

        let solution = Solver::new().solve(&problem).unwrap();

        let optimum = solution.optimum.unwrap();
        assert_abs_diff_eq!(optimum.point.x, 3.0, epsilon = 1e-9);
        assert_abs_diff_eq!(optimum.point.y, 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(optimum.value, 9.0, epsilon = 1e-9);
    }

    #[test]
    fn test_production_mix() {
        let solution = Solver::new().solve(&production()).unwrap();
        assert!(solution.is_optimal());
        for v in [
            Point::new(0.0, 0.0),
            Point::new(7.5, 0.0),
            Point::new(5.0, 5.0),
            Point::new(0.0, 10.0),
        ] {
            assert!(contains(&solution.vertices, v), "missing vertex {}", v);
        }
        assert_eq!(solution.vertices.len(), 4);
        assert_eq!(solution.point(), Some(Point::new(5.0, 5.0)));
        assert_eq!(solution.value(), Some(10.0));
    }

    #[test]
    fn test_analysis_binding_and_slack() {
        let solution = Solver::new().solve(&production()).unwrap();
        assert_eq!(solution.analysis.binding_constraints, vec!["capacity", "labor"]);
        assert!(solution.analysis.slacks.iter().all(|s| s.slack.abs() < 1e-9));

        let mut problem = production();
        problem.add_constraint("x2_cap", 0.0, 1.0, ConstraintOp::Le, 8.0);
        let solution = Solver::new().solve(&problem).unwrap();
        let x2_cap = &solution.analysis.slacks[2];
        assert_eq!(x2_cap.constraint, "x2_cap");
        assert!(!x2_cap.binding);
        assert_abs_diff_eq!(x2_cap.slack, 3.0, epsilon = 1e-9);
    }

    #[test]
    fn test_alternative_optima_reported() {
        // x1 + x2 is 10 along the whole capacity edge from (5, 5) to (0, 10)
        let solution = Solver::new().solve(&production()).unwrap();
        assert_eq!(solution.analysis.alternative_optima.len(), 1);
        assert!(solution.analysis.alternative_optima[0].approx_eq(&Point::new(0.0, 10.0), EPSILON));
    }

    #[test]
    fn test_unbounded_region_picks_generated_vertex() {
        // x1 + x2 >= 10 has no upper limit; minimizing still has a true optimum
        let mut problem = LpProblem::new(Objective::minimize(1.0, 1.0));
        problem.add_constraint("floor", 1.0, 1.0, ConstraintOp::Ge, 10.0);
        let solution = Solver::new().solve(&problem).unwrap();
        assert_eq!(solution.value(), Some(10.0));

        // Maximizing is unbounded, yet a finite vertex comes back
        problem.set_objective(1.0, 1.0, Direction::Maximize);
        let solution = Solver::new().solve(&problem).unwrap();
        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert_eq!(solution.value(), Some(10.0));
    }

    #[test]
    fn test_infeasible() {
        // x1 >= 10
        // x1 <= 5
        let mut problem = LpProblem::new(Objective::maximize(1.0, 1.0));
        problem.add_constraint("lower", 1.0, 0.0, ConstraintOp::Ge, 10.0);
        problem.add_constraint("upper", 1.0, 0.0, ConstraintOp::Le, 5.0);

        let solution = Solver::new().solve(&problem).unwrap();

        assert_eq!(solution.status, SolutionStatus::Infeasible);
        assert!(solution.optimum.is_none());
        assert!(solution.vertices.is_empty());
        assert_eq!(solution.conflicts.len(), 1);
        assert_eq!(solution.conflicts[0].constraints, vec!["lower", "upper"]);
    }

    #[test]
    fn test_conflict_with_scaled_and_flipped_parallel() {
        // 2x1 + 2x2 >= 30 and -x1 - x2 >= -5 (that is, x1 + x2 <= 5)
        let mut problem = LpProblem::new(Objective::minimize(1.0, 1.0));
        problem.add_constraint("big", 2.0, 2.0, ConstraintOp::Ge, 30.0);
        problem.add_constraint("small", -1.0, -1.0, ConstraintOp::Ge, -5.0);
        let solution = Solver::new().solve(&problem).unwrap();
        assert_eq!(solution.status, SolutionStatus::Infeasible);
        assert_eq!(solution.conflicts.len(), 1);
        assert!(solution.conflicts[0].description.contains("big"));
    }

    #[test]
    fn test_conflict_with_quadrant() {
        let mut problem = LpProblem::new(Objective::maximize(1.0, 1.0));
        problem.add_constraint("negative", 1.0, 1.0, ConstraintOp::Le, -5.0);
        let solution = Solver::new().solve(&problem).unwrap();
        assert_eq!(solution.status, SolutionStatus::Infeasible);
        assert_eq!(solution.conflicts.len(), 1);
        assert_eq!(solution.conflicts[0].constraints, vec!["negative"]);
    }

    #[test]
    fn test_compatible_parallels_are_not_conflicts() {
        let mut problem = LpProblem::new(Objective::maximize(1.0, 1.0));
        problem.add_constraint("band_low", 1.0, 1.0, ConstraintOp::Ge, 2.0);
        problem.add_constraint("band_high", 1.0, 1.0, ConstraintOp::Le, 6.0);
        let solver = Solver::new();
        assert!(solver.parallel_bounds(&problem.constraints[0], &problem.constraints[1]).is_some());
        assert!(solver.analyze_conflicts(&problem).is_empty());
        assert!(solver.solve(&problem).unwrap().is_optimal());
    }

    #[test]
    fn test_invalid_tolerance() {
        let err = Solver::new().with_tolerance(0.0).solve(&production()).unwrap_err();
        assert_eq!(err, SolveError::InvalidTolerance(0.0));
        assert!(Solver::new().with_tolerance(f64::NAN).solve(&production()).is_err());
    }

    #[test]
    fn test_tolerance_widens_feasibility() {
        let mut problem = LpProblem::new(Objective::maximize(1.0, 0.0));
        problem.add_constraint("floor", 1.0, 0.0, ConstraintOp::Ge, 10.005);
        problem.add_constraint("cap", 1.0, 0.0, ConstraintOp::Le, 10.0);

        let strict = Solver::new();
        assert_eq!(strict.tolerance(), EPSILON);
        assert_eq!(strict.solve(&problem).unwrap().status, SolutionStatus::Infeasible);

        let loose = Solver::new().with_tolerance(0.01);
        assert_eq!(loose.tolerance(), 0.01);
        let solution = loose.solve(&problem).unwrap();
        assert!(solution.is_optimal());
        assert_eq!(solution.vertices.len(), 1);
    }

    #[test]
    fn test_degenerate_constraint_is_rejected() {
        let mut problem = production();
        problem.add_constraint("empty", 0.0, 0.0, ConstraintOp::Ge, 1.0);
        assert!(matches!(
            Solver::new().solve(&problem),
            Err(SolveError::DegenerateConstraint { index: 2, .. })
        ));
    }
}
