use crate::optimizer::Optimum;
use crate::point::Point;

/// The result of solving a two-variable LP graphically
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    /// Solution status
    pub status: SolutionStatus,
    /// Optimal vertex and objective value (None when infeasible)
    pub optimum: Option<Optimum>,
    /// Feasible region boundary, ordered by angle around its centroid
    pub vertices: Vec<Point>,
    /// Post-optimal analysis (empty when infeasible)
    pub analysis: Analysis,
    /// Constraint conflicts (populated when infeasible)
    pub conflicts: Vec<ConstraintConflict>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolutionStatus {
    /// A feasible vertex optimizing the objective was found
    Optimal,
    /// No candidate vertex satisfies every constraint
    Infeasible,
}

/// What the optimum looks like relative to each constraint
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Analysis {
    /// Constraints whose boundary passes through the optimum
    pub binding_constraints: Vec<String>,
    /// Slack of every constraint at the optimum, in input order
    pub slacks: Vec<ConstraintSlack>,
    /// Other vertices attaining the optimal value (multiple optima along an edge)
    pub alternative_optima: Vec<Point>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintSlack {
    /// Constraint name
    pub constraint: String,
    /// Left-hand side evaluated at the optimum
    pub lhs: f64,
    /// Distance from the bound; zero for a binding constraint
    pub slack: f64,
    /// Is the optimum on this constraint's line?
    pub binding: bool,
}

/// Constraints that cannot hold together, or one that cannot hold with x1, x2 >= 0
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintConflict {
    /// Names of the constraints involved (one or two)
    pub constraints: Vec<String>,
    /// Human-readable description of what's wrong
    pub description: String,
}

impl Solution {
    pub fn optimal(optimum: Optimum, vertices: Vec<Point>, analysis: Analysis) -> Self {
        Self {
            status: SolutionStatus::Optimal,
            optimum: Some(optimum),
            vertices,
            analysis,
            conflicts: Vec::new(),
        }
    }

    pub fn infeasible_with_conflicts(conflicts: Vec<ConstraintConflict>) -> Self {
        Self {
            status: SolutionStatus::Infeasible,
            optimum: None,
            vertices: Vec::new(),
            analysis: Analysis::default(),
            conflicts,
        }
    }

    pub fn is_optimal(&self) -> bool {
        self.status == SolutionStatus::Optimal
    }

    pub fn point(&self) -> Option<Point> {
        self.optimum.map(|o| o.point)
    }

    pub fn value(&self) -> Option<f64> {
        self.optimum.map(|o| o.value)
    }
}
