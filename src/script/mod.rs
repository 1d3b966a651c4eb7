//! Embedded script language
//!
//! Generated program text is written in a small statement/expression
//! language with JavaScript-like syntax and truthiness. [`parse`] turns the
//! text into an immutable [`Program`]; [`Interpreter`] executes it against
//! a data object and a helper set.

pub mod ast;
pub mod interp;
pub mod lexer;
pub mod parser;

use std::fmt;

pub use ast::{Expr, Program, Stmt};
pub use interp::{Interpreter, CONTEXT_VAR, HELPERS_VAR};
pub use parser::parse;

/// Program text failed to parse
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    /// Line in the program text (1-based)
    pub line: u32,
    /// What went wrong
    pub message: String,
}

impl SyntaxError {
    /// Create a new syntax error
    pub fn new(line: u32, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Syntax error at line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for SyntaxError {}
