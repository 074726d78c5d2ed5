use crate::ast::*;
use crate::lexer::{Span, Token, TokenKind};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Unexpected token: expected {expected}, found {found} at position {span:?}")]
    UnexpectedToken {
        expected: String,
        found: String,
        span: Span,
    },
    #[error("Unexpected end of file")]
    UnexpectedEof,
    #[error("Invalid number: {0}")]
    InvalidNumber(String),
}

impl ParseError {
    pub fn span(&self) -> Option<Span> {
        match self {
            ParseError::UnexpectedToken { span, .. } => Some(*span),
            _ => None,
        }
    }
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// Newlines end expressions, except inside parentheses
    paren_depth: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            paren_depth: 0,
        }
    }

    pub fn parse(source: &str) -> Result<Program, ParseError> {
        let tokens = crate::lexer::Lexer::tokenize(source);
        let mut parser = Parser::new(tokens);
        parser.parse_program()
    }

    fn current(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> TokenKind {
        self.current().map(|t| t.kind).unwrap_or(TokenKind::Eof)
    }

    fn peek_kind_at(&self, offset: usize) -> TokenKind {
        self.tokens
            .get(self.pos + offset)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    fn advance(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.pos);
        self.pos += 1;
        token
    }

    fn prev_end(&self, fallback: usize) -> usize {
        self.tokens
            .get(self.pos.saturating_sub(1))
            .map(|t| t.span.end)
            .unwrap_or(fallback)
    }

    fn skip_newlines_and_comments(&mut self) {
        while matches!(self.peek_kind(), TokenKind::Newline | TokenKind::Comment) {
            self.advance();
        }
    }

    /// Inside an expression only comments are skipped, plus newlines within parentheses.
    fn skip_expr_trivia(&mut self) {
        loop {
            match self.peek_kind() {
                TokenKind::Comment => {}
                TokenKind::Newline if self.paren_depth > 0 => {}
                _ => break,
            }
            self.advance();
        }
    }

    fn unexpected<T>(&self, expected: &str) -> Result<T, ParseError> {
        match self.current() {
            Some(t) if t.kind != TokenKind::Eof => Err(ParseError::UnexpectedToken {
                expected: expected.to_string(),
                found: format!("{:?}", t.kind),
                span: t.span,
            }),
            _ => Err(ParseError::UnexpectedEof),
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        self.skip_newlines_and_comments();
        let token = self.current().cloned();
        match token {
            Some(t) if t.kind == kind => {
                self.advance();
                Ok(t)
            }
            Some(t) if t.kind != TokenKind::Eof => Err(ParseError::UnexpectedToken {
                expected: format!("{:?}", kind),
                found: format!("{:?}", t.kind),
                span: t.span,
            }),
            _ => Err(ParseError::UnexpectedEof),
        }
    }

    fn parse_program(&mut self) -> Result<Program, ParseError> {
        let mut problems = Vec::new();

        loop {
            self.skip_newlines_and_comments();

            match self.peek_kind() {
                TokenKind::Eof => break,
                TokenKind::Problem => problems.push(self.parse_problem()?),
                _ => return self.unexpected("problem"),
            }
        }

        Ok(Program { problems })
    }

    fn parse_problem(&mut self) -> Result<Problem, ParseError> {
        let start = self.expect(TokenKind::Problem)?.span;
        let name = self.expect(TokenKind::Ident)?.text;
        self.expect(TokenKind::LBrace)?;

        let mut properties = Vec::new();
        let mut vars = None;
        let mut objectives = Vec::new();
        let mut constraints = Vec::new();

        loop {
            self.skip_newlines_and_comments();
            match self.peek_kind() {
                TokenKind::RBrace => break,
                TokenKind::Max | TokenKind::Min => objectives.push(self.parse_objective()?),
                TokenKind::Vars => vars = Some(self.parse_vars()?),
                TokenKind::Constraints => constraints.extend(self.parse_constraints_block()?),
                TokenKind::Ident => properties.push(self.parse_property()?),
                _ => return self.unexpected("property, vars, objective, or constraints block"),
            }
        }

        let end = self.expect(TokenKind::RBrace)?.span;

        Ok(Problem {
            span: start.merge(end),
            name,
            properties,
            vars,
            objectives,
            constraints,
        })
    }

    fn parse_property(&mut self) -> Result<Property, ParseError> {
        let name_token = self.expect(TokenKind::Ident)?;
        if self.peek_kind() == TokenKind::Colon {
            self.advance();
        }

        let value = match self.peek_kind() {
            TokenKind::String => {
                let text = self.advance().map(|t| t.text.clone()).unwrap_or_default();
                PropertyValue::String(text.trim_matches('"').to_string())
            }
            TokenKind::Number => {
                let text = self.advance().map(|t| t.text.clone()).unwrap_or_default();
                let value = text.parse().map_err(|_| ParseError::InvalidNumber(text))?;
                PropertyValue::Number(value)
            }
            TokenKind::Ident => {
                let text = self.advance().map(|t| t.text.clone()).unwrap_or_default();
                PropertyValue::Ident(text)
            }
            _ => return self.unexpected("string, number, or identifier"),
        };

        Ok(Property {
            span: Span::new(name_token.span.start, self.prev_end(name_token.span.end)),
            name: name_token.text,
            value,
        })
    }

    fn parse_vars(&mut self) -> Result<VarList, ParseError> {
        let start = self.expect(TokenKind::Vars)?.span;
        let mut names = vec![self.expect(TokenKind::Ident)?.text];

        while self.peek_kind() == TokenKind::Comma {
            self.advance();
            names.push(self.expect(TokenKind::Ident)?.text);
        }
        self.expect_line_end()?;

        Ok(VarList {
            span: Span::new(start.start, self.prev_end(start.end)),
            names,
        })
    }

    fn parse_objective(&mut self) -> Result<ObjectiveDecl, ParseError> {
        self.skip_newlines_and_comments();
        let start = self.current().map(|t| t.span).unwrap_or(Span::new(0, 0));
        let sense = match self.peek_kind() {
            TokenKind::Max => Sense::Max,
            TokenKind::Min => Sense::Min,
            _ => return self.unexpected("max or min"),
        };
        self.advance();
        let expr = self.parse_expr()?;
        self.expect_line_end()?;

        Ok(ObjectiveDecl {
            span: Span::new(start.start, self.prev_end(start.end)),
            sense,
            expr,
        })
    }

    fn parse_constraints_block(&mut self) -> Result<Vec<ConstraintDecl>, ParseError> {
        self.expect(TokenKind::Constraints)?;
        self.expect(TokenKind::LBrace)?;

        let mut constraints = Vec::new();
        loop {
            self.skip_newlines_and_comments();
            if self.peek_kind() == TokenKind::RBrace {
                break;
            }
            constraints.push(self.parse_constraint()?);
        }
        self.expect(TokenKind::RBrace)?;

        Ok(constraints)
    }

    fn parse_constraint(&mut self) -> Result<ConstraintDecl, ParseError> {
        self.skip_newlines_and_comments();
        let start = self.current().map(|t| t.span).unwrap_or(Span::new(0, 0));

        let mut label = None;
        if self.peek_kind() == TokenKind::Ident && self.peek_kind_at(1) == TokenKind::Colon {
            label = self.advance().map(|t| t.text.clone());
            self.advance(); // :
        }

        let lhs = self.parse_expr()?;
        self.skip_expr_trivia();
        let relation = match self.peek_kind() {
            TokenKind::Le => Relation::Le,
            TokenKind::Ge => Relation::Ge,
            TokenKind::Eq => Relation::Eq,
            _ => return self.unexpected("<=, >=, or ="),
        };
        self.advance();
        let rhs = self.parse_expr()?;
        self.expect_line_end()?;

        Ok(ConstraintDecl {
            span: Span::new(start.start, self.prev_end(start.end)),
            label,
            lhs,
            relation,
            rhs,
        })
    }

    /// Objectives and constraints occupy one line each.
    fn expect_line_end(&mut self) -> Result<(), ParseError> {
        self.skip_expr_trivia();
        match self.peek_kind() {
            TokenKind::Newline | TokenKind::RBrace | TokenKind::Eof => Ok(()),
            _ => self.unexpected("end of line"),
        }
    }

    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.parse_additive()
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_multiplicative()?;

        loop {
            self.skip_expr_trivia();
            let op = match self.peek_kind() {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = Expr::binary(left, op, right);
        }

        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary()?;

        loop {
            self.skip_expr_trivia();
            let op = match self.peek_kind() {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = Expr::binary(left, op, right);
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        self.skip_expr_trivia();
        match self.peek_kind() {
            TokenKind::Minus => {
                self.advance();
                Ok(Expr::Neg(Box::new(self.parse_unary()?)))
            }
            TokenKind::Plus => {
                self.advance();
                self.parse_unary()
            }
            _ => self.parse_implicit_product(),
        }
    }

    /// `2 x1` and `3(x1 + x2)`: a number directly followed by a variable or
    /// a parenthesis on the same line multiplies it.
    fn parse_implicit_product(&mut self) -> Result<Expr, ParseError> {
        let primary = self.parse_primary()?;
        if matches!(primary, Expr::Number(_)) && matches!(self.peek_kind(), TokenKind::Ident | TokenKind::LParen) {
            let right = self.parse_primary()?;
            return Ok(Expr::binary(primary, BinaryOp::Mul, right));
        }
        Ok(primary)
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        self.skip_expr_trivia();

        match self.peek_kind() {
            TokenKind::Number => {
                let text = self.advance().map(|t| t.text.clone()).unwrap_or_default();
                let value: f64 = text.parse().map_err(|_| ParseError::InvalidNumber(text.clone()))?;
                Ok(Expr::Number(value))
            }
            TokenKind::Ident => {
                let token = self.advance().cloned();
                match token {
                    Some(t) => Ok(Expr::Variable {
                        span: t.span,
                        name: t.text,
                    }),
                    None => Err(ParseError::UnexpectedEof),
                }
            }
            TokenKind::LParen => {
                self.advance();
                self.paren_depth += 1;
                let expr = self.parse_expr();
                self.skip_expr_trivia();
                self.paren_depth -= 1;
                let expr = expr?;
                self.expect(TokenKind::RParen)?;
                Ok(Expr::Paren(Box::new(expr)))
            }
            _ => self.unexpected("number, variable, or ("),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_problem(source: &str) -> Problem {
        let mut program = Parser::parse(source).unwrap();
        assert_eq!(program.problems.len(), 1);
        program.problems.remove(0)
    }

    #[test]
    fn test_parse_problem() {
        let source = r#"problem production {
            name "Chairs and tables"
            vars chairs, tables
            maximize chairs + tables
            constraints {
                assembly: chairs + tables <= 10
                2 chairs + tables <= 15
            }
        }"#;
        let problem = single_problem(source);
        assert_eq!(problem.name, "production");
        assert_eq!(problem.string_property("name"), Some("Chairs and tables"));
        assert_eq!(problem.vars.as_ref().unwrap().names, vec!["chairs", "tables"]);
        assert_eq!(problem.objectives.len(), 1);
        assert_eq!(problem.objectives[0].sense, Sense::Max);
        assert_eq!(problem.constraints.len(), 2);
        assert_eq!(problem.constraints[0].label.as_deref(), Some("assembly"));
        assert_eq!(problem.constraints[1].label, None);
        assert_eq!(problem.constraints[1].relation, Relation::Le);
    }

    #[test]
    fn test_implicit_multiplication() {
        let problem = single_problem("problem p {\n min 2x1 - 3(x2 + 1)\n}");
        let expr = &problem.objectives[0].expr;
        assert_eq!(expr.to_string(), "2 * x1 - 3 * (x2 + 1)");
    }

    #[test]
    fn test_newline_ends_constraint() {
        let source = "problem p {\n max x1\n constraints {\n x1 <= 4\n -x1 + x2 >= -2\n }\n}";
        let problem = single_problem(source);
        assert_eq!(problem.constraints.len(), 2);
        assert!(matches!(problem.constraints[1].lhs, Expr::BinaryOp { .. }));
        assert_eq!(problem.constraints[1].rhs, Expr::Neg(Box::new(Expr::Number(2.0))));
    }

    #[test]
    fn test_parentheses_span_lines() {
        let source = "problem p {\n max (x1 +\n x2)\n}";
        let problem = single_problem(source);
        assert_eq!(problem.objectives[0].expr.to_string(), "(x1 + x2)");
    }

    #[test]
    fn test_unicode_relations_and_equality() {
        let source = "problem p {\n min x1\n constraints {\n x1 + x2 ≥ 2\n x1 == 1\n }\n}";
        let problem = single_problem(source);
        assert_eq!(problem.constraints[0].relation, Relation::Ge);
        assert_eq!(problem.constraints[1].relation, Relation::Eq);
    }

    #[test]
    fn test_multiple_problems_and_comments() {
        let source = r#"
            // first
            problem a { max x1 }
            /* second */
            problem b {
                min x2 // trailing comment
            }
        "#;
        let program = Parser::parse(source).unwrap();
        let names: Vec<_> = program.problems.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_missing_relation() {
        let err = Parser::parse("problem p {\n constraints {\n x1 + x2 10\n }\n}").unwrap_err();
        match err {
            ParseError::UnexpectedToken { expected, .. } => assert_eq!(expected, "<=, >=, or ="),
            other => panic!("Expected unexpected token, got {:?}", other),
        }
    }

    #[test]
    fn test_two_constraints_on_one_line_rejected() {
        let err = Parser::parse("problem p {\n constraints {\n x1 <= 1 x2 <= 2\n }\n}").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedToken { ref expected, .. } if expected == "end of line"));
    }

    #[test]
    fn test_vars_need_separating_commas() {
        let err = Parser::parse("problem p {\n vars a b\n max a\n}").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedToken { ref expected, .. } if expected == "end of line"));

        let err = Parser::parse("problem p {\n vars a,\n max a\n}").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedToken { ref expected, ref found, .. }
            if expected == "Ident" && found == "Max"));

        let program = Parser::parse("problem p {\n vars a, b\n max a\n}").unwrap();
        assert_eq!(program.problems[0].vars.as_ref().unwrap().names, vec!["a", "b"]);
    }

    #[test]
    fn test_unexpected_eof() {
        assert_eq!(Parser::parse("problem p {\n max x1").unwrap_err(), ParseError::UnexpectedEof);
    }

    #[test]
    fn test_top_level_garbage() {
        let err = Parser::parse("maximize x1").unwrap_err();
        assert_eq!(err.span(), Some(Span::new(0, 8)));
    }
}
