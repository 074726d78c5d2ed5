use crate::point::Point;
use crate::problem::Constraint;

/// True when `point` satisfies every constraint within `eps`.
///
/// Non-negativity is not checked here; candidates are generated in the
/// non-negative quadrant already.
pub fn is_feasible(point: &Point, constraints: &[Constraint], eps: f64) -> bool {
    constraints.iter().all(|c| c.is_satisfied_by(point, eps))
}

/// Constraints that `point` violates, in input order.
pub fn violated_by<'a>(point: &Point, constraints: &'a [Constraint], eps: f64) -> Vec<&'a Constraint> {
    constraints
        .iter()
        .filter(|c| !c.is_satisfied_by(point, eps))
        .collect()
}
