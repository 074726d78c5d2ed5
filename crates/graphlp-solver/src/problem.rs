use std::fmt;

use crate::error::SolveError;
use crate::point::Point;

/// A two-variable linear program.
///
/// Non-negativity of both variables is implicit and never stored as a constraint.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct LpProblem {
    /// Display names for X1 and X2
    pub variables: [String; 2],
    /// Objective function and direction
    pub objective: Objective,
    /// Constraints, in input order
    pub constraints: Vec<Constraint>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Objective {
    /// Coefficient of X1
    pub a: f64,
    /// Coefficient of X2
    pub b: f64,
    /// Whether to maximize or minimize
    pub direction: Direction,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Maximize,
    Minimize,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    /// Name/label for the constraint (for diagnostics)
    pub name: String,
    /// Coefficient of X1
    pub a: f64,
    /// Coefficient of X2
    pub b: f64,
    /// Comparison operator
    pub op: ConstraintOp,
    /// Right-hand side value
    pub rhs: f64,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintOp {
    /// Less than or equal (<=)
    Le,
    /// Greater than or equal (>=)
    Ge,
    /// Equal (=)
    Eq,
}

impl Objective {
    pub fn new(a: f64, b: f64, direction: Direction) -> Self {
        Self { a, b, direction }
    }

    pub fn maximize(a: f64, b: f64) -> Self {
        Self::new(a, b, Direction::Maximize)
    }

    pub fn minimize(a: f64, b: f64) -> Self {
        Self::new(a, b, Direction::Minimize)
    }

    pub fn value_at(&self, p: &Point) -> f64 {
        self.a * p.x + self.b * p.y
    }

    /// Whether `candidate` strictly beats `incumbent` in this objective's direction.
    pub fn improves(&self, candidate: f64, incumbent: f64) -> bool {
        match self.direction {
            Direction::Maximize => candidate > incumbent,
            Direction::Minimize => candidate < incumbent,
        }
    }

    /// `maximize 3x1 - 2x2`
    pub fn describe(&self, x: &str, y: &str) -> String {
        let sign = if self.b < 0.0 { '-' } else { '+' };
        format!("{} {}{} {} {}{}", self.direction, self.a, x, sign, self.b.abs(), y)
    }
}

impl Direction {
    pub fn flipped(self) -> Self {
        match self {
            Direction::Maximize => Direction::Minimize,
            Direction::Minimize => Direction::Maximize,
        }
    }
}

impl Constraint {
    pub fn new(name: impl Into<String>, a: f64, b: f64, op: ConstraintOp, rhs: f64) -> Self {
        Self {
            name: name.into(),
            a,
            b,
            op,
            rhs,
        }
    }

    pub fn lhs_at(&self, p: &Point) -> f64 {
        self.a * p.x + self.b * p.y
    }

    /// Whether `p` lies in this constraint's half-plane (or on its line for `Eq`).
    pub fn is_satisfied_by(&self, p: &Point, eps: f64) -> bool {
        let lhs = self.lhs_at(p);
        match self.op {
            ConstraintOp::Le => lhs <= self.rhs + eps,
            ConstraintOp::Ge => lhs >= self.rhs - eps,
            ConstraintOp::Eq => (lhs - self.rhs).abs() < eps,
        }
    }

    /// Both coefficients zero: the boundary is not a line.
    pub fn is_degenerate(&self) -> bool {
        self.a == 0.0 && self.b == 0.0
    }

    pub fn is_finite(&self) -> bool {
        self.a.is_finite() && self.b.is_finite() && self.rhs.is_finite()
    }

    /// Render with the given variable names, e.g. `2x1 + 1x2 <= 15`.
    pub fn describe(&self, x: &str, y: &str) -> String {
        let sign = if self.b < 0.0 { '-' } else { '+' };
        format!(
            "{}{} {} {}{} {} {}",
            self.a,
            x,
            sign,
            self.b.abs(),
            y,
            self.op,
            self.rhs
        )
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe("x1", "x2"))
    }
}

impl fmt::Display for ConstraintOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintOp::Le => write!(f, "<="),
            ConstraintOp::Ge => write!(f, ">="),
            ConstraintOp::Eq => write!(f, "="),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Maximize => write!(f, "maximize"),
            Direction::Minimize => write!(f, "minimize"),
        }
    }
}

impl LpProblem {
    pub fn new(objective: Objective) -> Self {
        Self {
            variables: ["x1".to_string(), "x2".to_string()],
            objective,
            constraints: Vec::new(),
        }
    }

    pub fn with_variables(mut self, x: impl Into<String>, y: impl Into<String>) -> Self {
        self.variables = [x.into(), y.into()];
        self
    }

    pub fn set_objective(&mut self, a: f64, b: f64, direction: Direction) {
        self.objective = Objective::new(a, b, direction);
    }

    pub fn add_constraint(&mut self, name: impl Into<String>, a: f64, b: f64, op: ConstraintOp, rhs: f64) {
        self.constraints.push(Constraint::new(name, a, b, op, rhs));
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn describe_constraint(&self, c: &Constraint) -> String {
        c.describe(&self.variables[0], &self.variables[1])
    }

    /// Reject non-finite numbers and degenerate constraints before any geometry runs.
    pub fn validate(&self) -> Result<(), SolveError> {
        if !self.objective.a.is_finite() || !self.objective.b.is_finite() {
            return Err(SolveError::NonFinite {
                location: "objective".to_string(),
            });
        }
        for (index, c) in self.constraints.iter().enumerate() {
            if !c.is_finite() {
                return Err(SolveError::NonFinite {
                    location: format!("constraint {}", c.name),
                });
            }
            if c.is_degenerate() {
                return Err(SolveError::DegenerateConstraint {
                    index,
                    name: c.name.clone(),
                });
            }
        }
        Ok(())
    }
}
