use crate::point::Point;
use crate::problem::Objective;

/// The selected vertex and its objective value.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Optimum {
    pub point: Point,
    pub value: f64,
}

/// Best vertex under `objective`, scanning in order.
///
/// A later vertex replaces the incumbent only when strictly better, so ties
/// resolve to the earliest vertex. Checking vertices alone is enough: a
/// linear objective over a convex polygon attains its optimum at a vertex.
pub fn optimize(vertices: &[Point], objective: &Objective) -> Option<Optimum> {
    let (first, rest) = vertices.split_first()?;
    let mut best = Optimum {
        point: *first,
        value: objective.value_at(first),
    };
    for v in rest {
        let value = objective.value_at(v);
        if objective.improves(value, best.value) {
            best = Optimum { point: *v, value };
        }
    }
    Some(best)
}

/// Vertices other than `optimum.point` whose value is within `eps` of the optimum.
pub fn alternative_optima(vertices: &[Point], objective: &Objective, optimum: &Optimum, eps: f64) -> Vec<Point> {
    vertices
        .iter()
        .filter(|v| !v.approx_eq(&optimum.point, eps))
        .filter(|v| (objective.value_at(v) - optimum.value).abs() < eps)
        .copied()
        .collect()
}
