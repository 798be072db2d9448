//! Primitive and reserved-word tables, and primitive application.
//!
//! Every primitive the language knows is one entry in the registry: its
//! surface name and an [`OpKind`] describing how calls to it are shaped.
//! The parser resolves head symbols against this table once, at
//! elaboration time, and picks the matching expression node; arity
//! mismatches for fixed-arity primitives are reported there, before any
//! evaluation happens.
//!
//! The same table also backs the runtime path: a primitive used as a
//! first-class value (passed around, stored, applied later) is re-routed
//! through [`apply_primitive`], which validates the argument count and
//! dispatches to the shared application functions below.
//!
//! Reserved words (special forms) live in their own table. Their
//! arguments are not evaluated in the standard fashion, so the evaluator
//! owns their semantics; the parser only needs to know the name and
//! which builder to run.

use crate::RuntimeError;
use crate::value::{
    Value, add_values, compare_numeric, divide_values, eq_values, expt_values, is_proper_list,
    modulo_values, multiply_values, negate_value, subtract_values,
};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Primitives taking no arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullaryOp {
    MakeVoid,
    Exit,
}

/// Primitives taking exactly one argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Car,
    Cdr,
    Not,
    IsBoolean,
    IsNumber,
    IsNull,
    IsPair,
    IsProcedure,
    IsSymbol,
    IsList,
    IsString,
    Display,
}

/// Primitives taking exactly two arguments, including the two-argument
/// specializations of the arithmetic and comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Plus,
    Minus,
    Mult,
    Div,
    Modulo,
    Expt,
    Less,
    LessEq,
    NumEqual,
    GreaterEq,
    Greater,
    Cons,
    SetCar,
    SetCdr,
    IsEq,
}

/// Primitives accepting any number of arguments. The arithmetic and
/// comparison entries are the semantic reference forms; their binary
/// counterparts are a specialization picked at elaboration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariadicOp {
    Plus,
    Minus,
    Mult,
    Div,
    Less,
    LessEq,
    NumEqual,
    GreaterEq,
    Greater,
    List,
}

/// Call shape of a primitive. Fixed shapes double as arity metadata.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OpKind {
    Nullary(NullaryOp),
    Unary(UnaryOp),
    Binary(BinaryOp),
    /// Two arguments compile to the binary node, any other count to the
    /// variadic one.
    BinaryOrVariadic(BinaryOp, VariadicOp),
    Variadic(VariadicOp),
}

/// One entry of the primitive table.
#[derive(Debug)]
pub struct PrimOp {
    /// The surface name of this primitive
    pub name: &'static str,
    /// How calls to it are shaped
    pub kind: OpKind,
}

/// Special forms. Their argument handling is owned by the parser and the
/// evaluator; `else` is deliberately not here, it is recognized only in
/// `cond` position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reserved {
    Begin,
    Quote,
    If,
    Cond,
    Lambda,
    Define,
    Let,
    Letrec,
    Set,
    And,
    Or,
}

/// Process-wide registry of all primitives.
static PRIMITIVE_OPS: &[PrimOp] = &[
    // Arithmetic
    PrimOp {
        name: "+",
        kind: OpKind::BinaryOrVariadic(BinaryOp::Plus, VariadicOp::Plus),
    },
    PrimOp {
        name: "-",
        kind: OpKind::BinaryOrVariadic(BinaryOp::Minus, VariadicOp::Minus),
    },
    PrimOp {
        name: "*",
        kind: OpKind::BinaryOrVariadic(BinaryOp::Mult, VariadicOp::Mult),
    },
    PrimOp {
        name: "/",
        kind: OpKind::BinaryOrVariadic(BinaryOp::Div, VariadicOp::Div),
    },
    PrimOp {
        name: "modulo",
        kind: OpKind::Binary(BinaryOp::Modulo),
    },
    PrimOp {
        name: "expt",
        kind: OpKind::Binary(BinaryOp::Expt),
    },
    // Comparison
    PrimOp {
        name: "<",
        kind: OpKind::BinaryOrVariadic(BinaryOp::Less, VariadicOp::Less),
    },
    PrimOp {
        name: "<=",
        kind: OpKind::BinaryOrVariadic(BinaryOp::LessEq, VariadicOp::LessEq),
    },
    PrimOp {
        name: "=",
        kind: OpKind::BinaryOrVariadic(BinaryOp::NumEqual, VariadicOp::NumEqual),
    },
    PrimOp {
        name: ">=",
        kind: OpKind::BinaryOrVariadic(BinaryOp::GreaterEq, VariadicOp::GreaterEq),
    },
    PrimOp {
        name: ">",
        kind: OpKind::BinaryOrVariadic(BinaryOp::Greater, VariadicOp::Greater),
    },
    // Pairs and lists
    PrimOp {
        name: "cons",
        kind: OpKind::Binary(BinaryOp::Cons),
    },
    PrimOp {
        name: "car",
        kind: OpKind::Unary(UnaryOp::Car),
    },
    PrimOp {
        name: "cdr",
        kind: OpKind::Unary(UnaryOp::Cdr),
    },
    PrimOp {
        name: "list",
        kind: OpKind::Variadic(VariadicOp::List),
    },
    PrimOp {
        name: "set-car!",
        kind: OpKind::Binary(BinaryOp::SetCar),
    },
    PrimOp {
        name: "set-cdr!",
        kind: OpKind::Binary(BinaryOp::SetCdr),
    },
    // Logic and identity
    PrimOp {
        name: "not",
        kind: OpKind::Unary(UnaryOp::Not),
    },
    PrimOp {
        name: "eq?",
        kind: OpKind::Binary(BinaryOp::IsEq),
    },
    // Type predicates
    PrimOp {
        name: "boolean?",
        kind: OpKind::Unary(UnaryOp::IsBoolean),
    },
    PrimOp {
        name: "number?",
        kind: OpKind::Unary(UnaryOp::IsNumber),
    },
    PrimOp {
        name: "null?",
        kind: OpKind::Unary(UnaryOp::IsNull),
    },
    PrimOp {
        name: "pair?",
        kind: OpKind::Unary(UnaryOp::IsPair),
    },
    PrimOp {
        name: "procedure?",
        kind: OpKind::Unary(UnaryOp::IsProcedure),
    },
    PrimOp {
        name: "symbol?",
        kind: OpKind::Unary(UnaryOp::IsSymbol),
    },
    PrimOp {
        name: "list?",
        kind: OpKind::Unary(UnaryOp::IsList),
    },
    PrimOp {
        name: "string?",
        kind: OpKind::Unary(UnaryOp::IsString),
    },
    // Effects and control
    PrimOp {
        name: "void",
        kind: OpKind::Nullary(NullaryOp::MakeVoid),
    },
    PrimOp {
        name: "exit",
        kind: OpKind::Nullary(NullaryOp::Exit),
    },
    PrimOp {
        name: "display",
        kind: OpKind::Unary(UnaryOp::Display),
    },
];

/// Lazy map from primitive name to its table entry
static PRIMITIVES: LazyLock<HashMap<&'static str, &'static PrimOp>> =
    LazyLock::new(|| PRIMITIVE_OPS.iter().map(|op| (op.name, op)).collect());

/// Lazy map from reserved word to its special form
static RESERVED_WORDS: LazyLock<HashMap<&'static str, Reserved>> = LazyLock::new(|| {
    HashMap::from([
        ("begin", Reserved::Begin),
        ("quote", Reserved::Quote),
        ("if", Reserved::If),
        ("cond", Reserved::Cond),
        ("lambda", Reserved::Lambda),
        ("define", Reserved::Define),
        ("let", Reserved::Let),
        ("letrec", Reserved::Letrec),
        ("set!", Reserved::Set),
        ("and", Reserved::And),
        ("or", Reserved::Or),
    ])
});

/// Find a primitive by its surface name
pub(crate) fn find_primitive(name: &str) -> Option<&'static PrimOp> {
    PRIMITIVES.get(name).copied()
}

/// Find a reserved word by its surface name
pub(crate) fn find_reserved(name: &str) -> Option<Reserved> {
    RESERVED_WORDS.get(name).copied()
}

/// Names that `define` refuses to rebind
pub(crate) fn is_primitive_or_reserved(name: &str) -> bool {
    PRIMITIVES.contains_key(name) || RESERVED_WORDS.contains_key(name)
}

fn wrong_arity(name: &str) -> RuntimeError {
    RuntimeError::new(format!("Wrong number of arguments for {name}"))
}

/// Apply a primitive to already-evaluated arguments. This is the runtime
/// path for primitives used as first-class procedures; the argument count
/// is validated here because no elaboration-time check has seen the call.
pub(crate) fn apply_primitive(op: &PrimOp, args: &[Value]) -> Result<Value, RuntimeError> {
    match op.kind {
        OpKind::Nullary(n) => match args {
            [] => Ok(nullary_rator(n)),
            _ => Err(wrong_arity(op.name)),
        },
        OpKind::Unary(u) => match args {
            [rand] => unary_rator(u, rand),
            _ => Err(wrong_arity(op.name)),
        },
        OpKind::Binary(b) => match args {
            [rand1, rand2] => binary_rator(b, rand1, rand2),
            _ => Err(wrong_arity(op.name)),
        },
        OpKind::BinaryOrVariadic(b, v) => match args {
            [rand1, rand2] => binary_rator(b, rand1, rand2),
            _ => variadic_rator(v, args),
        },
        OpKind::Variadic(v) => variadic_rator(v, args),
    }
}

pub(crate) fn nullary_rator(op: NullaryOp) -> Value {
    match op {
        NullaryOp::MakeVoid => Value::Void,
        NullaryOp::Exit => Value::Terminate,
    }
}

pub(crate) fn unary_rator(op: UnaryOp, rand: &Value) -> Result<Value, RuntimeError> {
    match op {
        UnaryOp::Car => match rand {
            Value::Pair(cell) => Ok(cell.car.borrow().clone()),
            _ => Err(RuntimeError::new("car: argument must be a pair")),
        },
        UnaryOp::Cdr => match rand {
            Value::Pair(cell) => Ok(cell.cdr.borrow().clone()),
            _ => Err(RuntimeError::new("cdr: argument must be a pair")),
        },
        UnaryOp::Not => Ok(Value::Boolean(rand.is_false())),
        UnaryOp::IsBoolean => Ok(Value::Boolean(matches!(rand, Value::Boolean(_)))),
        // number? is an integer test; rationals are not number? here
        UnaryOp::IsNumber => Ok(Value::Boolean(matches!(rand, Value::Integer(_)))),
        UnaryOp::IsNull => Ok(Value::Boolean(matches!(rand, Value::Null))),
        UnaryOp::IsPair => Ok(Value::Boolean(matches!(rand, Value::Pair(_)))),
        UnaryOp::IsProcedure => Ok(Value::Boolean(matches!(rand, Value::Procedure(_)))),
        UnaryOp::IsSymbol => Ok(Value::Boolean(matches!(rand, Value::Symbol(_)))),
        UnaryOp::IsList => Ok(Value::Boolean(is_proper_list(rand))),
        UnaryOp::IsString => Ok(Value::Boolean(matches!(rand, Value::String(_)))),
        UnaryOp::Display => {
            match rand {
                Value::String(s) => print!("{s}"),
                other => print!("{other}"),
            }
            Ok(Value::Void)
        }
    }
}

pub(crate) fn binary_rator(
    op: BinaryOp,
    rand1: &Value,
    rand2: &Value,
) -> Result<Value, RuntimeError> {
    match op {
        BinaryOp::Plus => add_values(rand1, rand2),
        BinaryOp::Minus => subtract_values(rand1, rand2),
        BinaryOp::Mult => multiply_values(rand1, rand2),
        BinaryOp::Div => divide_values(rand1, rand2),
        BinaryOp::Modulo => modulo_values(rand1, rand2),
        BinaryOp::Expt => expt_values(rand1, rand2),
        BinaryOp::Less => Ok(Value::Boolean(compare_numeric(rand1, rand2)?.is_lt())),
        BinaryOp::LessEq => Ok(Value::Boolean(compare_numeric(rand1, rand2)?.is_le())),
        BinaryOp::NumEqual => Ok(Value::Boolean(compare_numeric(rand1, rand2)?.is_eq())),
        BinaryOp::GreaterEq => Ok(Value::Boolean(compare_numeric(rand1, rand2)?.is_ge())),
        BinaryOp::Greater => Ok(Value::Boolean(compare_numeric(rand1, rand2)?.is_gt())),
        BinaryOp::Cons => Ok(Value::pair(rand1.clone(), rand2.clone())),
        BinaryOp::SetCar => match rand1 {
            Value::Pair(cell) => {
                *cell.car.borrow_mut() = rand2.clone();
                Ok(Value::Void)
            }
            _ => Err(RuntimeError::new("set-car!: first argument must be a pair")),
        },
        BinaryOp::SetCdr => match rand1 {
            Value::Pair(cell) => {
                *cell.cdr.borrow_mut() = rand2.clone();
                Ok(Value::Void)
            }
            _ => Err(RuntimeError::new("set-cdr!: first argument must be a pair")),
        },
        BinaryOp::IsEq => Ok(Value::Boolean(eq_values(rand1, rand2))),
    }
}

/// Require the ordering between every adjacent pair of arguments; fewer
/// than two arguments is vacuously true.
fn chained_comparison(args: &[Value], holds: fn(Ordering) -> bool) -> Result<Value, RuntimeError> {
    for window in args.windows(2) {
        if !holds(compare_numeric(&window[0], &window[1])?) {
            return Ok(Value::Boolean(false));
        }
    }
    Ok(Value::Boolean(true))
}

pub(crate) fn variadic_rator(op: VariadicOp, args: &[Value]) -> Result<Value, RuntimeError> {
    match op {
        VariadicOp::Plus => match args {
            [] => Ok(Value::Integer(0)),
            [first, rest @ ..] => {
                let mut result = first.clone();
                for arg in rest {
                    result = add_values(&result, arg)?;
                }
                Ok(result)
            }
        },
        VariadicOp::Minus => match args {
            [] => Err(wrong_arity("-")),
            [rand] => negate_value(rand),
            [first, rest @ ..] => {
                let mut result = first.clone();
                for arg in rest {
                    result = subtract_values(&result, arg)?;
                }
                Ok(result)
            }
        },
        VariadicOp::Mult => match args {
            [] => Ok(Value::Integer(1)),
            [first, rest @ ..] => {
                let mut result = first.clone();
                for arg in rest {
                    result = multiply_values(&result, arg)?;
                }
                Ok(result)
            }
        },
        VariadicOp::Div => match args {
            [] => Err(wrong_arity("/")),
            [rand] => divide_values(&Value::Integer(1), rand),
            [first, rest @ ..] => {
                let mut result = first.clone();
                for arg in rest {
                    result = divide_values(&result, arg)?;
                }
                Ok(result)
            }
        },
        VariadicOp::Less => chained_comparison(args, Ordering::is_lt),
        VariadicOp::LessEq => chained_comparison(args, Ordering::is_le),
        VariadicOp::NumEqual => chained_comparison(args, Ordering::is_eq),
        VariadicOp::GreaterEq => chained_comparison(args, Ordering::is_ge),
        VariadicOp::Greater => chained_comparison(args, Ordering::is_gt),
        VariadicOp::List => Ok(Value::list_from(args.to_vec())),
    }
}
