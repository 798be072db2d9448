//! RaScheme - a tree-walking interpreter for a small Scheme dialect
//!
//! This crate evaluates a subset of Scheme with exact rational arithmetic,
//! lexically scoped mutable environments, closures, and mutable pairs.
//!
//! ```scheme
//! (+ 1/2 1/3)                          ; => 5/6
//! (define (fact n)
//!   (if (= n 0) 1 (* n (fact (- n 1)))))
//! (fact 5)                             ; => 120
//! (let ((p (cons 1 2)))
//!   (set-car! p 9)
//!   (car p))                           ; => 9
//! ```
//!
//! ## Pipeline
//!
//! Source text flows through four stages:
//!
//! 1. `reader`: text to [`syntax::Syntax`] trees (S-expressions).
//! 2. `parser`: syntax to [`expr::Expr`] trees. The head symbol of every
//!    list is resolved once, against the primitive and reserved-word
//!    tables in `builtinops`, so evaluation never looks up special forms
//!    by name.
//! 3. `evaluator`: recursive descent over the expression tree, threading
//!    an [`env::Env`] of shared mutable bindings.
//! 4. [`value::Value`]: the result algebra, with rationals kept in lowest
//!    terms and collapsed to integers when the denominator reaches 1.
//!
//! Primitives remain first class: an unbound variable reference that names
//! a primitive evaluates to a procedure wrapping it, so `(define plus +)`
//! and `((lambda (op) (op 1 2)) +)` both work.
//!
//! ## Modules
//!
//! - `syntax`: the S-expression tree handed over by the reader
//! - `reader`: S-expression parsing from text
//! - `builtinops`: primitive and reserved-word tables, primitive application
//! - `expr`: the evaluable expression tree
//! - `parser`: syntax-to-expression elaboration
//! - `value`: runtime values and exact rational arithmetic
//! - `env`: the frame-chain environment
//! - `evaluator`: expression evaluation

use std::fmt;

/// Maximum nesting depth accepted by the reader. Exceeding it is a read
/// error rather than a reader stack overflow.
pub const MAX_READ_DEPTH: usize = 64;

/// The single error type of the interpreter. Read errors, elaboration
/// errors and evaluation errors all travel through this channel; the
/// driver prints the message and resumes at the next top-level form.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeError {
    message: String,
}

impl RuntimeError {
    pub fn new(message: impl Into<String>) -> Self {
        RuntimeError {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for RuntimeError {}

pub mod builtinops;
pub mod env;
pub mod evaluator;
pub mod expr;
pub mod parser;
pub mod reader;
pub mod syntax;
pub mod value;
