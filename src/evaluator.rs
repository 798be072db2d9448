use crate::RuntimeError;
use crate::builtinops::{
    apply_primitive, binary_rator, find_primitive, is_primitive_or_reserved, unary_rator,
    variadic_rator,
};
use crate::env::Env;
use crate::expr::Expr;
use crate::parser::parse;
use crate::reader::read_program;
use crate::syntax::Syntax;
use crate::value::{Closure, Value};
use std::rc::Rc;

/// Evaluate one expression in the given environment.
pub fn eval(expr: &Expr, env: &Env) -> Result<Value, RuntimeError> {
    match expr {
        Expr::Fixnum(n) => Ok(Value::Integer(*n)),
        Expr::RationalNum(p, q) => Value::rational(*p, *q),
        Expr::StringLit(s) => Ok(Value::String(s.clone())),
        Expr::True => Ok(Value::Boolean(true)),
        Expr::False => Ok(Value::Boolean(false)),
        Expr::MakeVoid => Ok(Value::Void),
        Expr::Exit => Ok(Value::Terminate),
        Expr::Var(name) => eval_var(name, env),
        Expr::Quote(stx) => syntax_to_value(stx),
        Expr::Unary(op, rand) => {
            let rand = eval(rand, env)?;
            unary_rator(*op, &rand)
        }
        Expr::Binary(op, rand1, rand2) => {
            let rand1 = eval(rand1, env)?;
            let rand2 = eval(rand2, env)?;
            binary_rator(*op, &rand1, &rand2)
        }
        Expr::Variadic(op, rands) => {
            let args = eval_args(rands, env)?;
            variadic_rator(*op, &args)
        }
        Expr::And(rands) => eval_and(rands, env),
        Expr::Or(rands) => eval_or(rands, env),
        Expr::If(cond, conseq, alter) => {
            if eval(cond, env)?.is_false() {
                eval(alter, env)
            } else {
                eval(conseq, env)
            }
        }
        Expr::Cond(clauses) => eval_cond(clauses, env),
        Expr::Begin(exprs) => eval_sequence(exprs, env),
        Expr::Lambda(params, body) => Ok(Value::Procedure(Rc::new(Closure {
            params: params.clone(),
            body: (**body).clone(),
            env: env.clone(),
        }))),
        Expr::Apply(rator, rands) => eval_apply(rator, rands, env),
        Expr::Define(name, init) => eval_define(name, init, env),
        Expr::Let(bindings, body) => eval_let(bindings, body, env),
        Expr::Letrec(bindings, body) => eval_letrec(bindings, body, env),
        Expr::Set(name, init) => eval_set(name, init, env),
    }
}

fn eval_args(rands: &[Expr], env: &Env) -> Result<Vec<Value>, RuntimeError> {
    rands.iter().map(|rand| eval(rand, env)).collect()
}

/// Variable reference. An unbound name that matches a primitive becomes
/// a procedure wrapping that primitive, so primitives stay first class;
/// application re-dispatches it through the primitive table.
fn eval_var(name: &str, env: &Env) -> Result<Value, RuntimeError> {
    if let Some(value) = env.find(name) {
        return Ok(value);
    }
    if find_primitive(name).is_some() {
        return Ok(Value::Procedure(Rc::new(Closure {
            params: Vec::new(),
            body: Expr::Var(name.to_owned()),
            env: env.clone(),
        })));
    }
    Err(RuntimeError::new(format!("Undefined variable: {name}")))
}

fn eval_apply(rator: &Expr, rands: &[Expr], env: &Env) -> Result<Value, RuntimeError> {
    let rator_val = eval(rator, env)?;
    let Value::Procedure(closure) = rator_val else {
        return Err(RuntimeError::new("Attempt to apply a non-procedure"));
    };

    let args = eval_args(rands, env)?;

    // A parameterless procedure whose body is a bare primitive reference
    // is a reified primitive; re-dispatch through the table. User
    // lambdas never have this shape (their bodies are Begin-wrapped).
    if closure.params.is_empty()
        && let Expr::Var(name) = &closure.body
        && let Some(op) = find_primitive(name)
    {
        return apply_primitive(op, &args);
    }

    if args.len() != closure.params.len() {
        return Err(RuntimeError::new("Wrong number of arguments"));
    }

    let mut call_env = closure.env.clone();
    for (param, arg) in closure.params.iter().zip(args) {
        call_env = call_env.extend(param, arg);
    }
    eval(&closure.body, &call_env)
}

/// `and`: #t when empty; otherwise left to right, #f short-circuits,
/// the last value wins.
fn eval_and(rands: &[Expr], env: &Env) -> Result<Value, RuntimeError> {
    let mut result = Value::Boolean(true);
    for rand in rands {
        result = eval(rand, env)?;
        if result.is_false() {
            return Ok(Value::Boolean(false));
        }
    }
    Ok(result)
}

/// `or`: #f when empty; otherwise the first non-#f value.
fn eval_or(rands: &[Expr], env: &Env) -> Result<Value, RuntimeError> {
    for rand in rands {
        let result = eval(rand, env)?;
        if !result.is_false() {
            return Ok(result);
        }
    }
    Ok(Value::Boolean(false))
}

fn eval_cond(clauses: &[Vec<Expr>], env: &Env) -> Result<Value, RuntimeError> {
    for clause in clauses {
        let [test, body @ ..] = clause.as_slice() else {
            continue;
        };

        // The literal symbol `else` as a test is unconditional
        if let Expr::Var(name) = test
            && name == "else"
        {
            return eval_sequence(body, env);
        }

        let test_val = eval(test, env)?;
        if !test_val.is_false() {
            // A single-element clause yields the test value itself
            if body.is_empty() {
                return Ok(test_val);
            }
            return eval_sequence(body, env);
        }
    }
    Ok(Value::Void)
}

fn eval_sequence(exprs: &[Expr], env: &Env) -> Result<Value, RuntimeError> {
    let mut result = Value::Void;
    for expr in exprs {
        result = eval(expr, env)?;
    }
    Ok(result)
}

fn eval_define(name: &str, init: &Expr, env: &Env) -> Result<Value, RuntimeError> {
    if is_primitive_or_reserved(name) {
        return Err(RuntimeError::new(format!(
            "Cannot redefine primitive or reserved word: {name}"
        )));
    }
    let value = eval(init, env)?;
    if env.find(name).is_some() {
        env.modify(name, value);
    } else {
        // First definition: insert into the innermost frame in place, so
        // closures that captured this chain (including the one just
        // evaluated) can see the binding
        env.define(name, value);
    }
    Ok(Value::Void)
}

fn eval_let(
    bindings: &[(String, Expr)],
    body: &Expr,
    env: &Env,
) -> Result<Value, RuntimeError> {
    // All initializers evaluate in the outer environment
    let mut values = Vec::with_capacity(bindings.len());
    for (_, init) in bindings {
        values.push(eval(init, env)?);
    }
    let mut inner = env.clone();
    for ((name, _), value) in bindings.iter().zip(values) {
        inner = inner.extend(name, value);
    }
    eval(body, &inner)
}

fn eval_letrec(
    bindings: &[(String, Expr)],
    body: &Expr,
    env: &Env,
) -> Result<Value, RuntimeError> {
    // Declare every name first as an unassigned placeholder, then fill
    // them in order; initializers may forward-reference later names
    let mut inner = env.clone();
    for (name, _) in bindings {
        inner = inner.extend_unassigned(name);
    }
    for (name, init) in bindings {
        let value = eval(init, &inner)?;
        inner.modify(name, value);
    }
    eval(body, &inner)
}

fn eval_set(name: &str, init: &Expr, env: &Env) -> Result<Value, RuntimeError> {
    let value = eval(init, env)?;
    if env.find(name).is_none() {
        return Err(RuntimeError::new(format!(
            "Undefined variable in set!: {name}"
        )));
    }
    env.modify(name, value);
    Ok(Value::Void)
}

/// Structural conversion of a quoted datum to a value; lists become
/// right-nested pair chains terminated by Null.
fn syntax_to_value(stx: &Syntax) -> Result<Value, RuntimeError> {
    Ok(match stx {
        Syntax::Integer(n) => Value::Integer(*n),
        Syntax::Rational(p, q) => Value::rational(*p, *q)?,
        Syntax::String(s) => Value::String(s.clone()),
        Syntax::Symbol(s) => Value::Symbol(s.clone()),
        Syntax::True => Value::Boolean(true),
        Syntax::False => Value::Boolean(false),
        Syntax::List(stxs) => {
            let mut result = Value::Null;
            for stx in stxs.iter().rev() {
                result = Value::pair(syntax_to_value(stx)?, result);
            }
            result
        }
    })
}

/// Read, elaborate and evaluate every form in `source`, returning the
/// last result. Stops early when a form evaluates to the terminate
/// sentinel; the caller decides what to do with it.
pub fn eval_source(source: &str, env: &Env) -> Result<Value, RuntimeError> {
    let mut result = Value::Void;
    for form in read_program(source)? {
        let expr = parse(&form, env)?;
        result = eval(&expr, env)?;
        if matches!(result, Value::Terminate) {
            break;
        }
    }
    Ok(result)
}
