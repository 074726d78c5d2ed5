//! Feasible-region assembly: filter, deduplicate, order.

use tracing::trace;

use crate::feasibility::is_feasible;
use crate::intersection::candidate_points;
use crate::point::{centroid, Point};
use crate::problem::Constraint;

/// Remove near-duplicates, keeping the first occurrence of each point.
pub fn dedup_points(points: &[Point], eps: f64) -> Vec<Point> {
    let mut unique: Vec<Point> = Vec::with_capacity(points.len());
    for p in points {
        if !unique.iter().any(|u| u.approx_eq(p, eps)) {
            unique.push(*p);
        }
    }
    unique
}

/// Sort points by angle around their centroid, ascending.
///
/// The sort is stable, so points at the same angle keep their input order.
/// The result is a simple boundary traversal for any convex point set, which
/// the intersection of half-planes with the non-negative quadrant always is.
pub fn order_by_angle(points: &[Point]) -> Vec<Point> {
    let Some(center) = centroid(points) else {
        return Vec::new();
    };
    let mut keyed: Vec<(f64, Point)> = points.iter().map(|p| (p.angle_from(&center), *p)).collect();
    keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
    keyed.into_iter().map(|(_, p)| p).collect()
}

/// Feasible candidate points in generation order, duplicates included.
pub fn collect_vertices(constraints: &[Constraint], eps: f64) -> Vec<Point> {
    let candidates = candidate_points(constraints, eps);
    let total = candidates.len();
    let feasible: Vec<Point> = candidates
        .into_iter()
        .filter(|p| is_feasible(p, constraints, eps))
        .collect();
    trace!(candidates = total, feasible = feasible.len(), "filtered candidates");
    feasible
}

/// Ordered boundary of the feasible region. Empty when no candidate is feasible.
pub fn feasible_region(constraints: &[Constraint], eps: f64) -> Vec<Point> {
    let vertices = dedup_points(&collect_vertices(constraints, eps), eps);
    order_by_angle(&vertices)
}
