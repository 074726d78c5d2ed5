//! The `.glp` problem language: lexer, parser and compiler to two-variable
//! LP problems, with optional WASM bindings for web front ends.

pub mod ast;
pub mod compiler;
pub mod lexer;
pub mod parser;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use ast::*;
pub use compiler::{CompileError, CompiledProblem, Compiler};
pub use lexer::{Lexer, Span, Token, TokenKind};
pub use parser::{ParseError, Parser};
