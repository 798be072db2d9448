//! The evaluable expression tree produced by the parser.
//!
//! Primitive calls are already resolved: an `Expr` carries the operator
//! kind, never a name to look up again. The natural-arity-2 arithmetic
//! and comparison primitives appear in both a binary and a variadic form;
//! the parser picks the binary one when a call site has exactly two
//! operands.

use crate::builtinops::{BinaryOp, UnaryOp, VariadicOp};
use crate::syntax::Syntax;
use crate::value::NumberType;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Integer literal
    Fixnum(NumberType),
    /// Rational literal, normalized when evaluated
    RationalNum(NumberType, NumberType),
    /// String literal
    StringLit(String),
    True,
    False,
    /// `(void)`
    MakeVoid,
    /// `(exit)`
    Exit,
    /// Variable reference, resolved at evaluation time
    Var(String),
    /// Quoted datum, converted to a value at evaluation time
    Quote(Syntax),
    /// One-argument primitive call
    Unary(UnaryOp, Box<Expr>),
    /// Two-argument primitive call
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    /// Any-arity primitive call
    Variadic(VariadicOp, Vec<Expr>),
    /// Short-circuit conjunction
    And(Vec<Expr>),
    /// Short-circuit disjunction
    Or(Vec<Expr>),
    If(Box<Expr>, Box<Expr>, Box<Expr>),
    /// Clauses in order; each clause is non-empty (test, then body)
    Cond(Vec<Vec<Expr>>),
    Begin(Vec<Expr>),
    /// Parameter names and the `Begin`-wrapped body
    Lambda(Vec<String>, Box<Expr>),
    /// Procedure application: operator expression and operands
    Apply(Box<Expr>, Vec<Expr>),
    Define(String, Box<Expr>),
    /// Bindings evaluated in the outer scope, then bound all at once
    Let(Vec<(String, Expr)>, Box<Expr>),
    /// Bindings pre-declared as placeholders, then filled in order
    Letrec(Vec<(String, Expr)>, Box<Expr>),
    Set(String, Box<Expr>),
}
