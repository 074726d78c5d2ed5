//! Candidate vertex generation.
//!
//! Candidates are the origin, every constraint line's intercepts with the two
//! axes, and every pairwise crossing of constraint lines. Only points in the
//! non-negative quadrant are produced; feasibility against the full
//! constraint set is checked by the caller.

use crate::point::Point;
use crate::problem::Constraint;

/// Intercepts of the constraint line with the X1 axis and the X2 axis.
///
/// A zero coefficient has no intercept on that axis. Intercepts with a
/// negative coordinate are dropped.
pub fn axis_intercepts(c: &Constraint) -> (Option<Point>, Option<Point>) {
    let x_axis = if c.a != 0.0 {
        Some(Point::new(c.rhs / c.a, 0.0)).filter(Point::is_non_negative)
    } else {
        None
    };
    let y_axis = if c.b != 0.0 {
        Some(Point::new(0.0, c.rhs / c.b)).filter(Point::is_non_negative)
    } else {
        None
    };
    (x_axis, y_axis)
}

/// Crossing point of two constraint lines, or `None` when `|det| < eps`
/// (parallel or coincident lines).
pub fn line_intersection(c1: &Constraint, c2: &Constraint, eps: f64) -> Option<Point> {
    let det = c1.a * c2.b - c2.a * c1.b;
    if det.abs() < eps {
        return None;
    }
    let x = (c1.rhs * c2.b - c2.rhs * c1.b) / det;
    let y = (c1.a * c2.rhs - c2.a * c1.rhs) / det;
    Some(Point::new(x, y))
}

/// All non-negative candidate points, in generation order: origin,
/// intercepts by constraint, then pairwise intersections by `(i, j)`.
pub fn candidate_points(constraints: &[Constraint], eps: f64) -> Vec<Point> {
    let n = constraints.len();
    let mut points = Vec::with_capacity(1 + 2 * n + n * n.saturating_sub(1) / 2);

    points.push(Point::ORIGIN);

    for c in constraints.iter().filter(|c| !c.is_degenerate()) {
        let (x_axis, y_axis) = axis_intercepts(c);
        points.extend(x_axis);
        points.extend(y_axis);
    }

    for (i, c1) in constraints.iter().enumerate() {
        for c2 in &constraints[i + 1..] {
            if let Some(p) = line_intersection(c1, c2, eps) {
                if p.is_non_negative() {
                    points.push(p);
                }
            }
        }
    }

    points
}
