use std::collections::HashSet;

use graphlp_solver::{ConstraintOp, Direction, LpProblem, Objective, SolveError};
use thiserror::Error;
use tracing::debug;

use crate::ast::*;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("Unknown problem: {0}")]
    UnknownProblem(String),
    #[error("Duplicate problem definition: {0}")]
    DuplicateProblem(String),
    #[error("No problem defined")]
    NoProblems,
    #[error("Several problems defined, pick one of: {}", .0.join(", "))]
    AmbiguousProblem(Vec<String>),
    #[error("Problem {problem} declares {count} variables; exactly two are needed")]
    VariableCount { problem: String, count: usize },
    #[error("Problem {problem} declares variable {name} twice")]
    DuplicateVariable { problem: String, name: String },
    #[error("Unknown variable {name} in problem {problem}")]
    UnknownVariable { problem: String, name: String },
    #[error("Duplicate constraint label {label} in problem {problem}")]
    DuplicateConstraint { problem: String, label: String },
    #[error("Missing objective in problem {0}")]
    MissingObjective(String),
    #[error("Problem {0} has more than one objective")]
    MultipleObjectives(String),
    #[error("Objective of problem {problem} has a constant term: {expr}")]
    ConstantInObjective { problem: String, expr: String },
    #[error("Expression is not linear: {0}")]
    NonLinear(String),
    #[error("Division by zero in expression")]
    DivisionByZero,
    #[error("Invalid problem {problem}: {source}")]
    Invalid {
        problem: String,
        #[source]
        source: SolveError,
    },
}

/// Compiled problem ready for solving
#[derive(Debug, Clone)]
pub struct CompiledProblem {
    pub name: String,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub lp_problem: LpProblem,
}

/// `a*v1 + b*v2 + c`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct Linear {
    a: f64,
    b: f64,
    c: f64,
}

impl Linear {
    fn constant(c: f64) -> Self {
        Self { a: 0.0, b: 0.0, c }
    }

    fn is_finite(&self) -> bool {
        self.a.is_finite() && self.b.is_finite() && self.c.is_finite()
    }

    fn is_constant(&self) -> bool {
        self.a == 0.0 && self.b == 0.0
    }

    fn scale(self, k: f64) -> Self {
        Self {
            a: self.a * k,
            b: self.b * k,
            c: self.c * k,
        }
    }

    fn add(self, other: Linear) -> Self {
        Self {
            a: self.a + other.a,
            b: self.b + other.b,
            c: self.c + other.c,
        }
    }

    fn sub(self, other: Linear) -> Self {
        self.add(other.scale(-1.0))
    }
}

/// Compiler for converting AST to LP problems
#[derive(Debug, Default)]
pub struct Compiler {
    /// Loaded problems, in source order
    problems: Vec<Problem>,
}

impl Compiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every problem in `program`, rejecting duplicate names.
    pub fn load(&mut self, program: &Program) -> Result<(), CompileError> {
        for problem in &program.problems {
            if self.problems.iter().any(|p| p.name == problem.name) {
                return Err(CompileError::DuplicateProblem(problem.name.clone()));
            }
            self.problems.push(problem.clone());
        }
        Ok(())
    }

    pub fn problem_names(&self) -> Vec<String> {
        self.problems.iter().map(|p| p.name.clone()).collect()
    }

    /// The only problem loaded; an error when there are none or several.
    pub fn default_problem_name(&self) -> Result<String, CompileError> {
        match self.problems.as_slice() {
            [] => Err(CompileError::NoProblems),
            [only] => Ok(only.name.clone()),
            _ => Err(CompileError::AmbiguousProblem(self.problem_names())),
        }
    }

    /// Compile a problem by name into an LP problem
    pub fn compile_problem(&self, name: &str) -> Result<CompiledProblem, CompileError> {
        let problem = self
            .problems
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| CompileError::UnknownProblem(name.to_string()))?;

        let variables = self.resolve_variables(problem)?;

        let objective_decl = match problem.objectives.as_slice() {
            [] => return Err(CompileError::MissingObjective(problem.name.clone())),
            [only] => only,
            _ => return Err(CompileError::MultipleObjectives(problem.name.clone())),
        };
        let objective = self.lower(&objective_decl.expr, &variables, &problem.name)?;
        if !objective.is_finite() {
            return Err(CompileError::Invalid {
                problem: problem.name.clone(),
                source: SolveError::NonFinite {
                    location: "objective".to_string(),
                },
            });
        }
        if objective.c != 0.0 {
            return Err(CompileError::ConstantInObjective {
                problem: problem.name.clone(),
                expr: objective_decl.expr.to_string(),
            });
        }
        let direction = match objective_decl.sense {
            Sense::Max => Direction::Maximize,
            Sense::Min => Direction::Minimize,
        };

        let mut lp = LpProblem::new(Objective::new(clean(objective.a), clean(objective.b), direction))
            .with_variables(variables[0].clone(), variables[1].clone());

        let mut labels: HashSet<String> = HashSet::new();
        for (i, decl) in problem.constraints.iter().enumerate() {
            let label = decl.label.clone().unwrap_or_else(|| format!("c{}", i + 1));
            if !labels.insert(label.clone()) {
                return Err(CompileError::DuplicateConstraint {
                    problem: problem.name.clone(),
                    label,
                });
            }

            // lhs REL rhs  =>  (lhs - rhs).a*x + (lhs - rhs).b*y REL -(lhs - rhs).c
            let lhs = self.lower(&decl.lhs, &variables, &problem.name)?;
            let rhs = self.lower(&decl.rhs, &variables, &problem.name)?;
            let diff = lhs.sub(rhs);
            let op = match decl.relation {
                Relation::Le => ConstraintOp::Le,
                Relation::Ge => ConstraintOp::Ge,
                Relation::Eq => ConstraintOp::Eq,
            };
            lp.add_constraint(label, clean(diff.a), clean(diff.b), op, clean(0.0 - diff.c));
        }

        lp.validate().map_err(|source| CompileError::Invalid {
            problem: problem.name.clone(),
            source,
        })?;

        debug!(
            event = "compiled",
            problem = %problem.name,
            constraints = lp.num_constraints(),
        );

        Ok(CompiledProblem {
            name: problem.name.clone(),
            display_name: problem.string_property("name").map(str::to_string),
            description: problem.string_property("description").map(str::to_string),
            lp_problem: lp,
        })
    }

    /// Compile every loaded problem, stopping at the first error.
    pub fn compile_all(&self) -> Result<Vec<CompiledProblem>, CompileError> {
        self.problems.iter().map(|p| self.compile_problem(&p.name)).collect()
    }

    fn resolve_variables(&self, problem: &Problem) -> Result<[String; 2], CompileError> {
        let Some(vars) = &problem.vars else {
            return Ok(["x1".to_string(), "x2".to_string()]);
        };
        match vars.names.as_slice() {
            [x, y] if x == y => Err(CompileError::DuplicateVariable {
                problem: problem.name.clone(),
                name: x.clone(),
            }),
            [x, y] => Ok([x.clone(), y.clone()]),
            names => Err(CompileError::VariableCount {
                problem: problem.name.clone(),
                count: names.len(),
            }),
        }
    }

    fn lower(&self, expr: &Expr, variables: &[String; 2], problem: &str) -> Result<Linear, CompileError> {
        match expr {
            Expr::Number(n) => Ok(Linear::constant(*n)),
            Expr::Variable { name, .. } => {
                if name == &variables[0] {
                    Ok(Linear { a: 1.0, ..Linear::default() })
                } else if name == &variables[1] {
                    Ok(Linear { b: 1.0, ..Linear::default() })
                } else {
                    Err(CompileError::UnknownVariable {
                        problem: problem.to_string(),
                        name: name.clone(),
                    })
                }
            }
            Expr::Neg(inner) => Ok(self.lower(inner, variables, problem)?.scale(-1.0)),
            Expr::Paren(inner) => self.lower(inner, variables, problem),
            Expr::BinaryOp { left, op, right } => {
                let l = self.lower(left, variables, problem)?;
                let r = self.lower(right, variables, problem)?;
                match op {
                    BinaryOp::Add => Ok(l.add(r)),
                    BinaryOp::Sub => Ok(l.sub(r)),
                    BinaryOp::Mul if l.is_constant() => Ok(r.scale(l.c)),
                    BinaryOp::Mul if r.is_constant() => Ok(l.scale(r.c)),
                    BinaryOp::Mul => Err(CompileError::NonLinear(expr.to_string())),
                    BinaryOp::Div if !r.is_constant() => Err(CompileError::NonLinear(expr.to_string())),
                    BinaryOp::Div if r.c == 0.0 => Err(CompileError::DivisionByZero),
                    BinaryOp::Div => Ok(l.scale(1.0 / r.c)),
                }
            }
        }
    }
}

/// Fold `-0.0` into `0.0` so displayed coefficients never read `-0`.
fn clean(v: f64) -> f64 {
    if v == 0.0 { 0.0 } else { v }
}
