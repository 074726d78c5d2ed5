//! Graphical-method solver for linear programs in two variables.
//!
//! Candidate vertices come from the origin, each constraint line's axis
//! intercepts and every pairwise line crossing. The feasible ones are
//! deduplicated, ordered around their centroid, and the objective is
//! evaluated at each of them.

mod error;
mod feasibility;
mod intersection;
mod optimizer;
mod point;
mod problem;
mod region;
mod solution;
mod solver;

pub use error::SolveError;
pub use feasibility::{is_feasible, violated_by};
pub use intersection::{axis_intercepts, candidate_points, line_intersection};
pub use optimizer::{alternative_optima, optimize, Optimum};
pub use point::{centroid, Point, EPSILON};
pub use problem::{Constraint, ConstraintOp, Direction, LpProblem, Objective};
pub use region::{collect_vertices, dedup_points, feasible_region, order_by_angle};
pub use solution::{Analysis, ConstraintConflict, ConstraintSlack, Solution, SolutionStatus};
pub use solver::Solver;

/// Solve `problem` with the default tolerance.
pub fn solve(problem: &LpProblem) -> Result<Solution, SolveError> {
    Solver::new().solve(problem)
}
