use std::fmt;

/// Shared tolerance for feasibility, parallel-line and duplicate checks.
pub const EPSILON: f64 = 1e-3;

/// A point in the (X1, X2) plane.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// True when both coordinates differ by less than `eps`.
    pub fn approx_eq(&self, other: &Point, eps: f64) -> bool {
        (self.x - other.x).abs() < eps && (self.y - other.y).abs() < eps
    }

    pub fn is_non_negative(&self) -> bool {
        self.x >= 0.0 && self.y >= 0.0
    }

    /// Angle of the vector from `center` to this point, in `(-π, π]`.
    pub fn angle_from(&self, center: &Point) -> f64 {
        (self.y - center.y).atan2(self.x - center.x)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match f.precision() {
            Some(p) => write!(f, "({:.*}, {:.*})", p, self.x, p, self.y),
            None => write!(f, "({}, {})", self.x, self.y),
        }
    }
}

/// Coordinate-wise mean of `points`, or `None` when empty.
pub fn centroid(points: &[Point]) -> Option<Point> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    Some(Point::new(sx / n, sy / n))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_approx_eq_requires_both_coordinates() {
        let p = Point::new(1.0, 1.0);
        assert!(p.approx_eq(&Point::new(1.0005, 0.9995), EPSILON));
        assert!(!p.approx_eq(&Point::new(1.0005, 1.002), EPSILON));
        assert!(!p.approx_eq(&Point::new(1.002, 1.0), EPSILON));
    }

    #[test]
    fn test_centroid() {
        let pts = [
            Point::new(0.0, 0.0),
            Point::new(4.0, 0.0),
            Point::new(4.0, 2.0),
            Point::new(0.0, 2.0),
        ];
        let c = centroid(&pts).unwrap();
        assert_abs_diff_eq!(c.x, 2.0);
        assert_abs_diff_eq!(c.y, 1.0);
        assert!(centroid(&[]).is_none());
    }

    #[test]
    fn test_display_precision() {
        let p = Point::new(7.5, 1.0 / 3.0);
        assert_eq!(format!("{:.2}", p), "(7.50, 0.33)");
        assert_eq!(format!("{}", Point::new(5.0, 0.5)), "(5, 0.5)");
    }
}
