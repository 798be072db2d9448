//! Runtime values and the exact numeric tower.
//!
//! [`Value`] is a tagged sum over the nine runtime types plus the
//! `Terminate` sentinel produced by `(exit)`. Pairs are shared mutable
//! cells (`set-car!`/`set-cdr!` write through aliases, and `eq?` compares
//! their identity), procedures pair a parameter list, a body expression
//! and the captured environment.
//!
//! Numbers are exact: every arithmetic constructor restores the rational
//! invariants (denominator positive, numerator and denominator coprime)
//! and collapses to an integer when the denominator reaches 1. Arithmetic
//! is checked; overflowing the integer range is a runtime error, not a
//! wrap-around.

use crate::RuntimeError;
use crate::env::Env;
use crate::expr::Expr;
use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

/// Type alias for integer values in the interpreter
pub type NumberType = i64;

/// A runtime value.
#[derive(Debug, Clone)]
pub enum Value {
    /// Exact integer
    Integer(NumberType),
    /// Exact rational in lowest terms with positive denominator
    Rational(NumberType, NumberType),
    /// Boolean
    Boolean(bool),
    /// String
    String(String),
    /// Symbol
    Symbol(String),
    /// The empty list
    Null,
    /// The unspecified value (result of `define`, `set!`, `(void)`, ...)
    Void,
    /// Sentinel produced by `(exit)`; the driver stops when it sees one
    Terminate,
    /// Mutable pair; identity is the allocation, stable across mutation
    Pair(Rc<PairCell>),
    /// Closure: parameters, body, captured environment
    Procedure(Rc<Closure>),
}

/// The shared mutable cell behind a pair value.
#[derive(Debug)]
pub struct PairCell {
    pub car: RefCell<Value>,
    pub cdr: RefCell<Value>,
}

/// A procedure value. The environment is captured by aliasing: bindings
/// modified through the chain after capture stay visible to the closure.
#[derive(Debug)]
pub struct Closure {
    pub params: Vec<String>,
    pub body: Expr,
    pub env: Env,
}

impl Value {
    /// Construct a normalized rational: lowest terms, positive
    /// denominator, collapsed to `Integer` when the denominator is 1.
    /// A zero denominator is a division-by-zero error.
    pub fn rational(num: NumberType, den: NumberType) -> Result<Value, RuntimeError> {
        if den == 0 {
            return Err(RuntimeError::new("Division by zero"));
        }
        let g = gcd(num, den);
        let mut num = num / g;
        let mut den = den / g;
        if den < 0 {
            num = checked("rational normalization", num.checked_neg())?;
            den = checked("rational normalization", den.checked_neg())?;
        }
        if den == 1 {
            Ok(Value::Integer(num))
        } else {
            Ok(Value::Rational(num, den))
        }
    }

    /// Allocate a fresh pair.
    pub fn pair(car: Value, cdr: Value) -> Value {
        Value::Pair(Rc::new(PairCell {
            car: RefCell::new(car),
            cdr: RefCell::new(cdr),
        }))
    }

    /// Build a proper list: a right-nested pair chain terminated by Null.
    pub fn list_from(values: Vec<Value>) -> Value {
        let mut result = Value::Null;
        for value in values.into_iter().rev() {
            result = Value::pair(value, result);
        }
        result
    }

    /// Only the literal `#f` is false; every other value is truthy.
    pub fn is_false(&self) -> bool {
        matches!(self, Value::Boolean(false))
    }
}

fn gcd(a: NumberType, b: NumberType) -> NumberType {
    let (mut a, mut b) = (a.unsigned_abs(), b.unsigned_abs());
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    a as NumberType
}

fn checked(op: &str, value: Option<NumberType>) -> Result<NumberType, RuntimeError> {
    value.ok_or_else(|| RuntimeError::new(format!("Integer overflow in {op}")))
}

/// View a value as a `(numerator, denominator)` pair; integers promote to
/// denominator 1.
fn numeric_parts(value: &Value) -> Option<(NumberType, NumberType)> {
    match value {
        Value::Integer(n) => Some((*n, 1)),
        Value::Rational(p, q) => Some((*p, *q)),
        _ => None,
    }
}

fn numeric_pair(
    rand1: &Value,
    rand2: &Value,
    op: &str,
) -> Result<((NumberType, NumberType), (NumberType, NumberType)), RuntimeError> {
    match (numeric_parts(rand1), numeric_parts(rand2)) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(RuntimeError::new(format!("Wrong typename in {op}"))),
    }
}

pub(crate) fn add_values(rand1: &Value, rand2: &Value) -> Result<Value, RuntimeError> {
    let ((p1, q1), (p2, q2)) = numeric_pair(rand1, rand2, "addition")?;
    let left = checked("addition", p1.checked_mul(q2))?;
    let right = checked("addition", p2.checked_mul(q1))?;
    let num = checked("addition", left.checked_add(right))?;
    let den = checked("addition", q1.checked_mul(q2))?;
    Value::rational(num, den)
}

pub(crate) fn subtract_values(rand1: &Value, rand2: &Value) -> Result<Value, RuntimeError> {
    let ((p1, q1), (p2, q2)) = numeric_pair(rand1, rand2, "subtraction")?;
    let left = checked("subtraction", p1.checked_mul(q2))?;
    let right = checked("subtraction", p2.checked_mul(q1))?;
    let num = checked("subtraction", left.checked_sub(right))?;
    let den = checked("subtraction", q1.checked_mul(q2))?;
    Value::rational(num, den)
}

pub(crate) fn multiply_values(rand1: &Value, rand2: &Value) -> Result<Value, RuntimeError> {
    let ((p1, q1), (p2, q2)) = numeric_pair(rand1, rand2, "multiplication")?;
    let num = checked("multiplication", p1.checked_mul(p2))?;
    let den = checked("multiplication", q1.checked_mul(q2))?;
    Value::rational(num, den)
}

pub(crate) fn divide_values(rand1: &Value, rand2: &Value) -> Result<Value, RuntimeError> {
    let ((p1, q1), (p2, q2)) = numeric_pair(rand1, rand2, "division")?;
    if p2 == 0 {
        return Err(RuntimeError::new("Division by zero"));
    }
    let num = checked("division", p1.checked_mul(q2))?;
    let den = checked("division", q1.checked_mul(p2))?;
    Value::rational(num, den)
}

pub(crate) fn negate_value(rand: &Value) -> Result<Value, RuntimeError> {
    match rand {
        Value::Integer(n) => Ok(Value::Integer(checked("negation", n.checked_neg())?)),
        Value::Rational(p, q) => Ok(Value::Rational(checked("negation", p.checked_neg())?, *q)),
        _ => Err(RuntimeError::new("Wrong typename")),
    }
}

/// Total order on the numeric tower. Cross-multiplication keeps the
/// comparison exact; both denominators are positive so the direction is
/// preserved.
pub(crate) fn compare_numeric(rand1: &Value, rand2: &Value) -> Result<Ordering, RuntimeError> {
    let ((p1, q1), (p2, q2)) = numeric_pair(rand1, rand2, "numeric comparison")?;
    let left = checked("numeric comparison", p1.checked_mul(q2))?;
    let right = checked("numeric comparison", p2.checked_mul(q1))?;
    Ok(left.cmp(&right))
}

pub(crate) fn modulo_values(rand1: &Value, rand2: &Value) -> Result<Value, RuntimeError> {
    let (Value::Integer(dividend), Value::Integer(divisor)) = (rand1, rand2) else {
        return Err(RuntimeError::new("modulo is only defined for integers"));
    };
    if *divisor == 0 {
        return Err(RuntimeError::new("Division by zero"));
    }
    Ok(Value::Integer(checked(
        "modulo",
        dividend.checked_rem(*divisor),
    )?))
}

/// Integer exponentiation by squaring. Negative exponents and `0^0` are
/// rejected; intermediate overflow is a runtime error.
pub(crate) fn expt_values(rand1: &Value, rand2: &Value) -> Result<Value, RuntimeError> {
    let (Value::Integer(base), Value::Integer(exponent)) = (rand1, rand2) else {
        return Err(RuntimeError::new("Wrong typename"));
    };
    if *exponent < 0 {
        return Err(RuntimeError::new(
            "Negative exponent not supported for integers",
        ));
    }
    if *base == 0 && *exponent == 0 {
        return Err(RuntimeError::new("0^0 is undefined"));
    }

    let mut result: NumberType = 1;
    let mut base = *base;
    let mut exponent = *exponent;
    while exponent > 0 {
        if exponent % 2 == 1 {
            result = checked("expt", result.checked_mul(base))?;
        }
        exponent /= 2;
        if exponent > 0 {
            base = checked("expt", base.checked_mul(base))?;
        }
    }
    Ok(Value::Integer(result))
}

/// `eq?` identity: integers, booleans and symbols compare by content,
/// Null and Void are singletons, pairs and procedures compare by
/// allocation. Strings and rationals are copied scalars with no tracked
/// identity and are never `eq?`.
pub(crate) fn eq_values(rand1: &Value, rand2: &Value) -> bool {
    match (rand1, rand2) {
        (Value::Integer(a), Value::Integer(b)) => a == b,
        (Value::Boolean(a), Value::Boolean(b)) => a == b,
        (Value::Symbol(a), Value::Symbol(b)) => a == b,
        (Value::Null, Value::Null) | (Value::Void, Value::Void) => true,
        (Value::Pair(a), Value::Pair(b)) => Rc::ptr_eq(a, b),
        (Value::Procedure(a), Value::Procedure(b)) => Rc::ptr_eq(a, b),
        _ => false,
    }
}

/// Proper-list test: walks the cdr chain and checks the terminator.
/// Does not terminate on cyclic pair graphs.
pub(crate) fn is_proper_list(value: &Value) -> bool {
    let mut current = value.clone();
    loop {
        match current {
            Value::Null => return true,
            Value::Pair(cell) => {
                let next = cell.cdr.borrow().clone();
                current = next;
            }
            _ => return false,
        }
    }
}

// Structural equality, used by tests and by nothing at runtime: `eq?` and
// the numeric `=` have their own definitions above.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Rational(p1, q1), Value::Rational(p2, q2)) => p1 == p2 && q1 == q2,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Null, Value::Null)
            | (Value::Void, Value::Void)
            | (Value::Terminate, Value::Terminate) => true,
            (Value::Pair(a), Value::Pair(b)) => {
                Rc::ptr_eq(a, b)
                    || (*a.car.borrow() == *b.car.borrow() && *a.cdr.borrow() == *b.cdr.borrow())
            }
            (Value::Procedure(a), Value::Procedure(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{n}"),
            Value::Rational(p, q) => write!(f, "{p}/{q}"),
            Value::Boolean(b) => write!(f, "{}", if *b { "#t" } else { "#f" }),
            Value::String(s) => {
                write!(f, "\"")?;
                for ch in s.chars() {
                    match ch {
                        '"' => write!(f, "\\\"")?,
                        '\\' => write!(f, "\\\\")?,
                        '\n' => write!(f, "\\n")?,
                        '\t' => write!(f, "\\t")?,
                        '\r' => write!(f, "\\r")?,
                        c => write!(f, "{c}")?,
                    }
                }
                write!(f, "\"")
            }
            Value::Symbol(s) => write!(f, "{s}"),
            Value::Null => write!(f, "()"),
            Value::Void => write!(f, "#<void>"),
            Value::Terminate => write!(f, "#<terminate>"),
            Value::Procedure(_) => write!(f, "#<procedure>"),
            Value::Pair(cell) => {
                write!(f, "({}", cell.car.borrow())?;
                let mut current = cell.cdr.borrow().clone();
                loop {
                    match current {
                        Value::Pair(next) => {
                            write!(f, " {}", next.car.borrow())?;
                            let tail = next.cdr.borrow().clone();
                            current = tail;
                        }
                        Value::Null => break write!(f, ")"),
                        other => break write!(f, " . {other})"),
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used)] // test code OK
mod tests {
    use super::*;

    #[test]
    fn test_rational_normalization() {
        // (input num, input den, expected value)
        let cases = vec![
            (1, 2, Value::Rational(1, 2)),
            (2, 4, Value::Rational(1, 2)),
            (-3, 6, Value::Rational(-1, 2)),
            (3, -6, Value::Rational(-1, 2)),
            (-3, -6, Value::Rational(1, 2)),
            (4, 2, Value::Integer(2)),
            (-4, 2, Value::Integer(-2)),
            (0, 5, Value::Integer(0)),
            (7, 1, Value::Integer(7)),
            (6, 9, Value::Rational(2, 3)),
        ];
        for (num, den, expected) in cases {
            assert_eq!(Value::rational(num, den).unwrap(), expected, "{num}/{den}");
        }

        assert!(Value::rational(1, 0).is_err());
        assert!(Value::rational(0, 0).is_err());
    }

    #[test]
    fn test_arithmetic_on_the_numeric_tower() {
        let half = Value::Rational(1, 2);
        let third = Value::Rational(1, 3);
        let two = Value::Integer(2);

        assert_eq!(add_values(&half, &third).unwrap(), Value::Rational(5, 6));
        assert_eq!(add_values(&two, &half).unwrap(), Value::Rational(5, 2));
        assert_eq!(add_values(&half, &half).unwrap(), Value::Integer(1));
        assert_eq!(
            subtract_values(&half, &third).unwrap(),
            Value::Rational(1, 6)
        );
        assert_eq!(
            multiply_values(&half, &third).unwrap(),
            Value::Rational(1, 6)
        );
        assert_eq!(multiply_values(&two, &half).unwrap(), Value::Integer(1));
        assert_eq!(
            divide_values(&Value::Integer(3), &Value::Integer(6)).unwrap(),
            Value::Rational(1, 2)
        );
        assert_eq!(
            divide_values(&Value::Integer(-3), &Value::Integer(6)).unwrap(),
            Value::Rational(-1, 2)
        );
        assert_eq!(negate_value(&half).unwrap(), Value::Rational(-1, 2));
        assert_eq!(negate_value(&two).unwrap(), Value::Integer(-2));

        // Type errors carry the operation name
        let err = add_values(&Value::String("x".into()), &two).unwrap_err();
        assert!(err.message().contains("Wrong typename in addition"));
        let err = divide_values(&two, &Value::Integer(0)).unwrap_err();
        assert_eq!(err.message(), "Division by zero");
        let err = divide_values(&two, &Value::Rational(0, 1)).unwrap_err();
        assert_eq!(err.message(), "Division by zero");

        // Overflow is reported, not wrapped
        let err = add_values(&Value::Integer(NumberType::MAX), &Value::Integer(1)).unwrap_err();
        assert!(err.message().contains("Integer overflow in addition"));
        let err = negate_value(&Value::Integer(NumberType::MIN)).unwrap_err();
        assert!(err.message().contains("Integer overflow in negation"));
    }

    #[test]
    fn test_comparison_is_a_total_order() {
        let cases = vec![
            (Value::Integer(1), Value::Integer(2), Ordering::Less),
            (Value::Integer(2), Value::Integer(2), Ordering::Equal),
            (Value::Integer(3), Value::Integer(2), Ordering::Greater),
            (Value::Rational(1, 2), Value::Rational(2, 3), Ordering::Less),
            (Value::Rational(1, 2), Value::Integer(1), Ordering::Less),
            (Value::Integer(1), Value::Rational(1, 2), Ordering::Greater),
            (Value::Rational(2, 4), Value::Rational(1, 2), Ordering::Equal),
            (
                Value::Rational(-1, 2),
                Value::Rational(1, 2),
                Ordering::Less,
            ),
        ];
        for (a, b, expected) in cases {
            assert_eq!(compare_numeric(&a, &b).unwrap(), expected, "{a} vs {b}");
            // Trichotomy: the reverse comparison is the reverse ordering
            assert_eq!(compare_numeric(&b, &a).unwrap(), expected.reverse());
        }

        assert!(compare_numeric(&Value::Integer(1), &Value::Boolean(true)).is_err());
    }

    #[test]
    fn test_modulo_and_expt() {
        assert_eq!(
            modulo_values(&Value::Integer(10), &Value::Integer(3)).unwrap(),
            Value::Integer(1)
        );
        // Truncated remainder keeps the dividend's sign
        assert_eq!(
            modulo_values(&Value::Integer(-10), &Value::Integer(3)).unwrap(),
            Value::Integer(-1)
        );
        let err = modulo_values(&Value::Integer(10), &Value::Integer(0)).unwrap_err();
        assert_eq!(err.message(), "Division by zero");
        let err = modulo_values(&Value::Rational(1, 2), &Value::Integer(3)).unwrap_err();
        assert_eq!(err.message(), "modulo is only defined for integers");

        assert_eq!(
            expt_values(&Value::Integer(2), &Value::Integer(10)).unwrap(),
            Value::Integer(1024)
        );
        assert_eq!(
            expt_values(&Value::Integer(5), &Value::Integer(0)).unwrap(),
            Value::Integer(1)
        );
        assert_eq!(
            expt_values(&Value::Integer(-3), &Value::Integer(3)).unwrap(),
            Value::Integer(-27)
        );
        let err = expt_values(&Value::Integer(0), &Value::Integer(0)).unwrap_err();
        assert_eq!(err.message(), "0^0 is undefined");
        let err = expt_values(&Value::Integer(2), &Value::Integer(-1)).unwrap_err();
        assert_eq!(err.message(), "Negative exponent not supported for integers");
        let err = expt_values(&Value::Integer(2), &Value::Integer(200)).unwrap_err();
        assert_eq!(err.message(), "Integer overflow in expt");
    }

    #[test]
    fn test_eq_identity() {
        assert!(eq_values(&Value::Integer(3), &Value::Integer(3)));
        assert!(!eq_values(&Value::Integer(3), &Value::Integer(4)));
        assert!(eq_values(&Value::Boolean(true), &Value::Boolean(true)));
        assert!(eq_values(&Value::Symbol("a".into()), &Value::Symbol("a".into())));
        assert!(eq_values(&Value::Null, &Value::Null));
        assert!(eq_values(&Value::Void, &Value::Void));
        assert!(!eq_values(&Value::Null, &Value::Void));

        // Copied scalars carry no identity
        assert!(!eq_values(
            &Value::String("a".into()),
            &Value::String("a".into())
        ));
        assert!(!eq_values(&Value::Rational(1, 2), &Value::Rational(1, 2)));

        // Pairs compare by allocation, stable across mutation
        let p = Value::pair(Value::Integer(1), Value::Integer(2));
        let alias = p.clone();
        let same_shape = Value::pair(Value::Integer(1), Value::Integer(2));
        assert!(eq_values(&p, &alias));
        assert!(!eq_values(&p, &same_shape));
        if let Value::Pair(cell) = &p {
            *cell.car.borrow_mut() = Value::Integer(9);
        }
        assert!(eq_values(&p, &alias));
    }

    #[test]
    fn test_proper_list_walk() {
        assert!(is_proper_list(&Value::Null));
        assert!(is_proper_list(&Value::list_from(vec![
            Value::Integer(1),
            Value::Integer(2),
        ])));
        assert!(!is_proper_list(&Value::pair(
            Value::Integer(1),
            Value::Integer(2)
        )));
        assert!(!is_proper_list(&Value::Integer(1)));
    }

    #[test]
    fn test_printer() {
        let cases = vec![
            (Value::Integer(-3), "-3"),
            (Value::Rational(5, 6), "5/6"),
            (Value::Boolean(true), "#t"),
            (Value::Boolean(false), "#f"),
            (Value::String("a\"b".into()), "\"a\\\"b\""),
            (Value::Symbol("cons".into()), "cons"),
            (Value::Null, "()"),
            (Value::Void, "#<void>"),
            (
                Value::list_from(vec![
                    Value::Integer(1),
                    Value::Rational(1, 2),
                    Value::Symbol("x".into()),
                ]),
                "(1 1/2 x)",
            ),
            (Value::pair(Value::Integer(1), Value::Integer(2)), "(1 . 2)"),
            (
                Value::pair(
                    Value::Integer(1),
                    Value::pair(Value::Integer(2), Value::Integer(3)),
                ),
                "(1 2 . 3)",
            ),
            (
                Value::list_from(vec![Value::list_from(vec![Value::Integer(1)]), Value::Null]),
                "((1) ())",
            ),
        ];
        for (value, expected) in cases {
            assert_eq!(format!("{value}"), expected);
        }
    }
}
