use thiserror::Error;

/// Input the geometric core refuses to process.
///
/// Infeasibility is not an error: it is reported through [`crate::SolutionStatus`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolveError {
    #[error("Non-finite value in {location}")]
    NonFinite { location: String },
    #[error("Constraint {name} (#{index}) has both coefficients zero")]
    DegenerateConstraint { index: usize, name: String },
    #[error("Tolerance must be positive and finite, got {0}")]
    InvalidTolerance(f64),
}
