//! Syntax-to-expression elaboration.
//!
//! The head symbol of every list is resolved here, once, against an
//! ordered set of rules: the empty list is the empty-list datum; a
//! non-symbol head is an application; a head bound in the environment is
//! an application (a bound variable shadows primitives and reserved words
//! alike); a primitive head compiles to its expression node, with arity
//! checked for the fixed-arity primitives; a reserved word dispatches to
//! its special-form builder; anything else is an application through a
//! free variable, resolved at evaluation time.
//!
//! The environment argument is only consulted for which names are bound;
//! the binder forms do not extend it while descending into their bodies,
//! so a `let`-bound `car` does not shadow the primitive at call heads
//! inside the body (the runtime variable path still resolves bindings
//! first for everything that elaborates to a variable reference).

use crate::RuntimeError;
use crate::builtinops::{NullaryOp, OpKind, PrimOp, Reserved, find_primitive, find_reserved};
use crate::env::Env;
use crate::expr::Expr;
use crate::syntax::Syntax;

/// Rewrite one syntax tree into an evaluable expression tree.
pub fn parse(stx: &Syntax, env: &Env) -> Result<Expr, RuntimeError> {
    match stx {
        Syntax::Integer(n) => Ok(Expr::Fixnum(*n)),
        Syntax::Rational(p, q) => Ok(Expr::RationalNum(*p, *q)),
        Syntax::String(s) => Ok(Expr::StringLit(s.clone())),
        Syntax::Symbol(s) => Ok(Expr::Var(s.clone())),
        Syntax::True => Ok(Expr::True),
        Syntax::False => Ok(Expr::False),
        Syntax::List(stxs) => parse_list(stxs, env),
    }
}

fn parse_list(stxs: &[Syntax], env: &Env) -> Result<Expr, RuntimeError> {
    let [head, rands @ ..] = stxs else {
        // () is the empty list as a datum
        return Ok(Expr::Quote(Syntax::List(Vec::new())));
    };

    let Syntax::Symbol(op) = head else {
        return parse_apply(head, rands, env);
    };

    // A bound variable shadows primitives and reserved words
    if env.find(op).is_some() {
        return parse_apply(head, rands, env);
    }

    if let Some(prim) = find_primitive(op) {
        let rands = parse_all(rands, env)?;
        return build_primitive(prim, rands);
    }

    if let Some(word) = find_reserved(op) {
        return parse_special_form(word, stxs, env);
    }

    // Free variable head; deferred to the runtime variable path, which
    // may still resolve it to a binding made by a later define
    parse_apply(head, rands, env)
}

fn parse_apply(head: &Syntax, rands: &[Syntax], env: &Env) -> Result<Expr, RuntimeError> {
    Ok(Expr::Apply(
        Box::new(parse(head, env)?),
        parse_all(rands, env)?,
    ))
}

fn parse_all(stxs: &[Syntax], env: &Env) -> Result<Vec<Expr>, RuntimeError> {
    stxs.iter().map(|stx| parse(stx, env)).collect()
}

fn wrong_arity(name: &str) -> RuntimeError {
    RuntimeError::new(format!("Wrong number of arguments for {name}"))
}

fn build_primitive(op: &'static PrimOp, rands: Vec<Expr>) -> Result<Expr, RuntimeError> {
    match op.kind {
        OpKind::Nullary(n) => {
            if !rands.is_empty() {
                return Err(wrong_arity(op.name));
            }
            Ok(match n {
                NullaryOp::MakeVoid => Expr::MakeVoid,
                NullaryOp::Exit => Expr::Exit,
            })
        }
        OpKind::Unary(u) => match <[Expr; 1]>::try_from(rands) {
            Ok([rand]) => Ok(Expr::Unary(u, Box::new(rand))),
            Err(_) => Err(wrong_arity(op.name)),
        },
        OpKind::Binary(b) => match <[Expr; 2]>::try_from(rands) {
            Ok([rand1, rand2]) => Ok(Expr::Binary(b, Box::new(rand1), Box::new(rand2))),
            Err(_) => Err(wrong_arity(op.name)),
        },
        OpKind::BinaryOrVariadic(b, v) => match <[Expr; 2]>::try_from(rands) {
            Ok([rand1, rand2]) => Ok(Expr::Binary(b, Box::new(rand1), Box::new(rand2))),
            Err(rands) => Ok(Expr::Variadic(v, rands)),
        },
        OpKind::Variadic(v) => Ok(Expr::Variadic(v, rands)),
    }
}

fn parse_special_form(word: Reserved, stxs: &[Syntax], env: &Env) -> Result<Expr, RuntimeError> {
    match word {
        Reserved::Begin => Ok(Expr::Begin(parse_all(&stxs[1..], env)?)),
        Reserved::Quote => {
            if stxs.len() != 2 {
                return Err(wrong_arity("quote"));
            }
            Ok(Expr::Quote(stxs[1].clone()))
        }
        Reserved::If => {
            if stxs.len() != 4 {
                return Err(wrong_arity("if"));
            }
            Ok(Expr::If(
                Box::new(parse(&stxs[1], env)?),
                Box::new(parse(&stxs[2], env)?),
                Box::new(parse(&stxs[3], env)?),
            ))
        }
        Reserved::Cond => {
            let mut clauses = Vec::new();
            for clause_stx in &stxs[1..] {
                let Syntax::List(parts) = clause_stx else {
                    return Err(RuntimeError::new("cond clause must be a list"));
                };
                if parts.is_empty() {
                    return Err(RuntimeError::new("cond clause must be a non-empty list"));
                }
                clauses.push(parse_all(parts, env)?);
            }
            Ok(Expr::Cond(clauses))
        }
        Reserved::Lambda => {
            if stxs.len() < 3 {
                return Err(wrong_arity("lambda"));
            }
            let params = parse_params(&stxs[1])?;
            Ok(Expr::Lambda(params, Box::new(parse_body(&stxs[2..], env)?)))
        }
        Reserved::Define => parse_define(stxs, env),
        Reserved::Let => {
            if stxs.len() < 3 {
                return Err(wrong_arity("let"));
            }
            let bindings = parse_bindings(&stxs[1], env, "let")?;
            Ok(Expr::Let(bindings, Box::new(parse_body(&stxs[2..], env)?)))
        }
        Reserved::Letrec => {
            if stxs.len() < 3 {
                return Err(wrong_arity("letrec"));
            }
            let bindings = parse_bindings(&stxs[1], env, "letrec")?;
            Ok(Expr::Letrec(
                bindings,
                Box::new(parse_body(&stxs[2..], env)?),
            ))
        }
        Reserved::Set => {
            if stxs.len() != 3 {
                return Err(wrong_arity("set!"));
            }
            let Syntax::Symbol(name) = &stxs[1] else {
                return Err(RuntimeError::new("set! variable must be a symbol"));
            };
            Ok(Expr::Set(name.clone(), Box::new(parse(&stxs[2], env)?)))
        }
        Reserved::And => Ok(Expr::And(parse_all(&stxs[1..], env)?)),
        Reserved::Or => Ok(Expr::Or(parse_all(&stxs[1..], env)?)),
    }
}

/// Bodies of more than one expression evaluate in order; wrapping in
/// `Begin` gives every body a single expression node.
fn parse_body(stxs: &[Syntax], env: &Env) -> Result<Expr, RuntimeError> {
    Ok(Expr::Begin(parse_all(stxs, env)?))
}

fn parse_params(stx: &Syntax) -> Result<Vec<String>, RuntimeError> {
    let Syntax::List(params) = stx else {
        return Err(RuntimeError::new("lambda parameters must be a list"));
    };
    params
        .iter()
        .map(|param| match param {
            Syntax::Symbol(name) => Ok(name.clone()),
            _ => Err(RuntimeError::new("lambda parameter must be a symbol")),
        })
        .collect()
}

fn parse_bindings(
    stx: &Syntax,
    env: &Env,
    form: &str,
) -> Result<Vec<(String, Expr)>, RuntimeError> {
    let Syntax::List(bindings) = stx else {
        return Err(RuntimeError::new(format!("{form} bindings must be a list")));
    };
    bindings
        .iter()
        .map(|binding| {
            let Syntax::List(parts) = binding else {
                return Err(RuntimeError::new(format!("{form} binding must be a pair")));
            };
            let [name_stx, init_stx] = parts.as_slice() else {
                return Err(RuntimeError::new(format!("{form} binding must be a pair")));
            };
            let Syntax::Symbol(name) = name_stx else {
                return Err(RuntimeError::new(format!("{form} variable must be a symbol")));
            };
            Ok((name.clone(), parse(init_stx, env)?))
        })
        .collect()
}

fn parse_define(stxs: &[Syntax], env: &Env) -> Result<Expr, RuntimeError> {
    if stxs.len() < 3 {
        return Err(wrong_arity("define"));
    }
    match &stxs[1] {
        // (define name body...)
        Syntax::Symbol(name) => Ok(Expr::Define(
            name.clone(),
            Box::new(parse_body(&stxs[2..], env)?),
        )),
        // (define (name params...) body...) expands to a lambda
        Syntax::List(header) => {
            let [name_stx, param_stxs @ ..] = header.as_slice() else {
                return Err(RuntimeError::new("Invalid define syntax"));
            };
            let Syntax::Symbol(name) = name_stx else {
                return Err(RuntimeError::new("Function name must be a symbol"));
            };
            let params = param_stxs
                .iter()
                .map(|param| match param {
                    Syntax::Symbol(s) => Ok(s.clone()),
                    _ => Err(RuntimeError::new("Function parameter must be a symbol")),
                })
                .collect::<Result<Vec<_>, _>>()?;
            let body = parse_body(&stxs[2..], env)?;
            Ok(Expr::Define(
                name.clone(),
                Box::new(Expr::Lambda(params, Box::new(body))),
            ))
        }
        _ => Err(RuntimeError::new("Invalid define syntax")),
    }
}
