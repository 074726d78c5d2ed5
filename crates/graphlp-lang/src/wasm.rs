//! WASM bindings for the problem language
//!
//! JavaScript-friendly APIs for editors and for the canvas that draws the
//! feasible region.

use wasm_bindgen::prelude::*;

use crate::ast::*;
use crate::compiler::{CompileError, CompiledProblem, Compiler};
use crate::lexer::{Lexer, TokenKind};
use crate::parser::Parser;
use graphlp_solver::{Analysis, ConstraintConflict, Optimum, Point, Solver, SolutionStatus};

fn to_js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Parse source code and return the AST as JSON
#[wasm_bindgen]
pub fn parse(source: &str) -> Result<JsValue, JsValue> {
    let program = Parser::parse(source).map_err(to_js_error)?;
    serde_wasm_bindgen::to_value(&program).map_err(to_js_error)
}

/// Tokenize source code and return tokens as JSON
#[wasm_bindgen]
pub fn tokenize(source: &str) -> Result<JsValue, JsValue> {
    let tokens: Vec<TokenInfo> = Lexer::tokenize(source)
        .into_iter()
        .map(|t| TokenInfo {
            kind: format!("{:?}", t.kind),
            text: t.text,
            start: t.span.start,
            end: t.span.end,
        })
        .collect();
    serde_wasm_bindgen::to_value(&tokens).map_err(to_js_error)
}

#[derive(serde::Serialize)]
struct TokenInfo {
    kind: String,
    text: String,
    start: usize,
    end: usize,
}

/// Validate source code and return diagnostics as JSON
#[wasm_bindgen]
pub fn validate(source: &str) -> JsValue {
    let diagnostics = get_diagnostics(source);
    serde_wasm_bindgen::to_value(&diagnostics).unwrap_or(JsValue::NULL)
}

/// Get semantic tokens for syntax highlighting
#[wasm_bindgen]
pub fn get_semantic_tokens(source: &str) -> Result<JsValue, JsValue> {
    let tokens: Vec<SemanticToken> = Lexer::tokenize(source)
        .into_iter()
        .filter(|t| !matches!(t.kind, TokenKind::Newline | TokenKind::Eof))
        .map(|t| SemanticToken {
            start: t.span.start,
            end: t.span.end,
            token_type: semantic_type(t.kind).to_string(),
        })
        .collect();
    serde_wasm_bindgen::to_value(&tokens).map_err(to_js_error)
}

fn semantic_type(kind: TokenKind) -> &'static str {
    match kind {
        TokenKind::Problem | TokenKind::Vars | TokenKind::Constraints => "keyword",
        TokenKind::Max | TokenKind::Min => "keyword",
        TokenKind::Ident => "variable",
        TokenKind::Number => "number",
        TokenKind::String => "string",
        TokenKind::Comment => "comment",
        TokenKind::Plus | TokenKind::Minus | TokenKind::Star | TokenKind::Slash => "operator",
        TokenKind::Le | TokenKind::Ge | TokenKind::Eq => "operator",
        TokenKind::Colon | TokenKind::Comma => "delimiter",
        TokenKind::LBrace | TokenKind::RBrace | TokenKind::LParen | TokenKind::RParen => "delimiter",
        TokenKind::Newline => "whitespace",
        TokenKind::Error | TokenKind::Eof => "error",
    }
}

#[derive(serde::Serialize)]
struct SemanticToken {
    start: usize,
    end: usize,
    token_type: String,
}

#[derive(Debug, serde::Serialize)]
struct Diagnostic {
    start: usize,
    end: usize,
    severity: String,
    message: String,
}

impl Diagnostic {
    fn error(start: usize, end: usize, message: impl Into<String>) -> Self {
        Self {
            start,
            end,
            severity: "error".to_string(),
            message: message.into(),
        }
    }
}

fn get_diagnostics(source: &str) -> Vec<Diagnostic> {
    let program = match Parser::parse(source) {
        Ok(program) => program,
        Err(e) => {
            let (start, end) = e.span().map_or((0, source.len()), |s| (s.start, s.end));
            return vec![Diagnostic::error(start, end, e.to_string())];
        }
    };

    let mut diagnostics = Vec::new();
    let mut compiler = Compiler::new();
    for problem in &program.problems {
        // Load one at a time so a duplicate is reported at its own span
        let single = Program {
            problems: vec![problem.clone()],
        };
        if let Err(e) = compiler.load(&single) {
            diagnostics.push(Diagnostic::error(problem.span.start, problem.span.end, e.to_string()));
            continue;
        }
        if let Err(e) = compiler.compile_problem(&problem.name) {
            let span = error_span(problem, &e);
            diagnostics.push(Diagnostic::error(span.start, span.end, e.to_string()));
        }
    }
    diagnostics
}

/// Narrow a compile error to the declaration it concerns, when one can be found.
fn error_span(problem: &Problem, error: &CompileError) -> crate::lexer::Span {
    match error {
        CompileError::VariableCount { .. } | CompileError::DuplicateVariable { .. } => {
            problem.vars.as_ref().map_or(problem.span, |v| v.span)
        }
        CompileError::MultipleObjectives(_) | CompileError::ConstantInObjective { .. } => {
            problem.objectives.last().map_or(problem.span, |o| o.span)
        }
        CompileError::Invalid {
            source: graphlp_solver::SolveError::DegenerateConstraint { index, .. },
            ..
        } => problem.constraints.get(*index).map_or(problem.span, |c| c.span),
        _ => problem.span,
    }
}

fn compile_named(source: &str, problem: &str) -> Result<CompiledProblem, JsValue> {
    let program = Parser::parse(source).map_err(to_js_error)?;
    let mut compiler = Compiler::new();
    compiler.load(&program).map_err(to_js_error)?;
    let name = if problem.is_empty() {
        compiler.default_problem_name().map_err(to_js_error)?
    } else {
        problem.to_string()
    };
    compiler.compile_problem(&name).map_err(to_js_error)
}

/// Solve a problem and return the result as JSON. An empty name selects the only problem.
#[wasm_bindgen]
pub fn solve(source: &str, problem: &str) -> Result<JsValue, JsValue> {
    let compiled = compile_named(source, problem)?;
    let lp = &compiled.lp_problem;
    let solution = Solver::new().solve(lp).map_err(to_js_error)?;

    let result = SolveResult {
        status: match solution.status {
            SolutionStatus::Optimal => "optimal".to_string(),
            SolutionStatus::Infeasible => "infeasible".to_string(),
        },
        problem: compiled.display_name.unwrap_or(compiled.name),
        description: compiled.description,
        variables: lp.variables.clone(),
        objective: lp.objective.describe(&lp.variables[0], &lp.variables[1]),
        constraints: lp
            .constraints
            .iter()
            .map(|c| ConstraintResult {
                name: c.name.clone(),
                text: lp.describe_constraint(c),
            })
            .collect(),
        vertices: solution.vertices,
        optimum: solution.optimum,
        analysis: (solution.status == SolutionStatus::Optimal).then_some(solution.analysis),
        conflicts: solution.conflicts,
    };

    serde_wasm_bindgen::to_value(&result).map_err(to_js_error)
}

/// Ordered region vertices as a flat `[x0, y0, x1, y1, ...]` array for canvas drawing
#[wasm_bindgen]
pub fn region_coordinates(source: &str, problem: &str) -> Result<js_sys::Float64Array, JsValue> {
    let compiled = compile_named(source, problem)?;
    let solution = Solver::new().solve(&compiled.lp_problem).map_err(to_js_error)?;
    let coords = flatten(&solution.vertices);
    Ok(js_sys::Float64Array::from(coords.as_slice()))
}

fn flatten(points: &[Point]) -> Vec<f64> {
    points.iter().flat_map(|p| [p.x, p.y]).collect()
}

#[derive(serde::Serialize)]
struct SolveResult {
    status: String,
    problem: String,
    description: Option<String>,
    variables: [String; 2],
    objective: String,
    constraints: Vec<ConstraintResult>,
    vertices: Vec<Point>,
    optimum: Option<Optimum>,
    analysis: Option<Analysis>,
    conflicts: Vec<ConstraintConflict>,
}

#[derive(serde::Serialize)]
struct ConstraintResult {
    name: String,
    text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostics_clean_source() {
        let source = "problem p {\n max x1 + x2\n constraints {\n x1 + x2 <= 4\n }\n}";
        assert!(get_diagnostics(source).is_empty());
    }

    #[test]
    fn test_parse_error_diagnostic_has_token_span() {
        let diagnostics = get_diagnostics("maximize x1");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!((diagnostics[0].start, diagnostics[0].end), (0, 8));
    }

    #[test]
    fn test_degenerate_constraint_diagnostic_points_at_constraint() {
        let source = "problem p {\n max x1\n constraints {\n x1 <= 4\n 0 x1 <= 2\n }\n}";
        let diagnostics = get_diagnostics(source);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(&source[diagnostics[0].start..diagnostics[0].end], "0 x1 <= 2");
    }

    #[test]
    fn test_duplicate_problem_diagnostic() {
        let source = "problem a { max x1 }\nproblem a { min x1 }";
        let diagnostics = get_diagnostics(source);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].start, 21);
    }

    #[test]
    fn test_flatten_coordinates() {
        let points = [Point::new(0.0, 0.0), Point::new(4.0, 0.0), Point::new(0.0, 4.0)];
        assert_eq!(flatten(&points), vec![0.0, 0.0, 4.0, 0.0, 0.0, 4.0]);
    }

    #[test]
    fn test_semantic_types() {
        assert_eq!(semantic_type(TokenKind::Problem), "keyword");
        assert_eq!(semantic_type(TokenKind::Ge), "operator");
        assert_eq!(semantic_type(TokenKind::Ident), "variable");
    }
}
