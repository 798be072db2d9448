use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, multispace1},
    combinator::value,
    error::ErrorKind,
    multi::many0,
    sequence::{pair, terminated},
};

use crate::MAX_READ_DEPTH;
use crate::RuntimeError;
use crate::syntax::Syntax;
use crate::value::NumberType;

/// Allowed non-alphanumeric characters in symbol names. Covers every
/// primitive name (`set-car!`, `eq?`, `<=`, ...) plus `_` for user code.
pub(crate) const SYMBOL_SPECIAL_CHARS: &str = "+-*/<>=!?_";

/// Check if a token is a valid symbol name.
/// Valid: non-empty, no leading digit, no "-digit" prefix (those are
/// numeric literals), alphanumeric + SYMBOL_SPECIAL_CHARS.
pub(crate) fn is_valid_symbol(name: &str) -> bool {
    let mut chars = name.chars();

    match chars.next() {
        None => false,
        Some(first_char) => {
            if first_char.is_ascii_digit() {
                return false;
            }

            if first_char == '-'
                && let Some(second_char) = chars.next()
                && second_char.is_ascii_digit()
            {
                return false;
            }

            name.chars()
                .all(|c| c.is_alphanumeric() || SYMBOL_SPECIAL_CHARS.contains(c))
        }
    }
}

/// Convert nom errors to user-facing messages
fn read_error_message(input: &str, error: nom::Err<nom::error::Error<&str>>) -> String {
    match error {
        nom::Err::Error(e) | nom::Err::Failure(e) => {
            let position = input.len().saturating_sub(e.input.len());
            match e.code {
                ErrorKind::TooLarge => {
                    format!("Expression too deeply nested (max depth: {MAX_READ_DEPTH})")
                }
                _ => {
                    if position < input.len() {
                        let remaining: String = input.chars().skip(position).take(10).collect();
                        format!("Invalid syntax near '{remaining}'")
                    } else {
                        "Unexpected end of input".into()
                    }
                }
            }
        }
        nom::Err::Incomplete(_) => "Incomplete input".into(),
    }
}

/// `;` runs to end of line and counts as whitespace
fn comment(input: &str) -> IResult<&str, ()> {
    value((), pair(char(';'), take_while(|c| c != '\n'))).parse(input)
}

fn whitespace(input: &str) -> IResult<&str, ()> {
    value((), many0(alt((value((), multispace1), comment)))).parse(input)
}

fn datum(input: &str, depth: usize) -> IResult<&str, Syntax> {
    if depth >= MAX_READ_DEPTH {
        // Failure, not Error: backtracking must not swallow the depth cap
        return Err(nom::Err::Failure(nom::error::Error::new(
            input,
            ErrorKind::TooLarge,
        )));
    }
    let (input, _) = whitespace(input)?;
    alt((
        |i| quoted(i, depth),
        |i| list(i, depth),
        boolean,
        string_literal,
        atom,
    ))
    .parse(input)
}

/// `'datum` is shorthand for `(quote datum)`
fn quoted(input: &str, depth: usize) -> IResult<&str, Syntax> {
    let (input, _) = char('\'').parse(input)?;
    let (input, quoted) = datum(input, depth + 1)?;
    Ok((
        input,
        Syntax::List(vec![Syntax::Symbol("quote".into()), quoted]),
    ))
}

fn list(input: &str, depth: usize) -> IResult<&str, Syntax> {
    let (input, _) = char('(').parse(input)?;
    let (input, elements) = many0(|i| datum(i, depth + 1)).parse(input)?;
    let (input, _) = whitespace(input)?;
    let (input, _) = char(')').parse(input)?;
    Ok((input, Syntax::List(elements)))
}

fn boolean(input: &str) -> IResult<&str, Syntax> {
    alt((
        value(Syntax::True, tag("#t")),
        value(Syntax::False, tag("#f")),
    ))
    .parse(input)
}

fn string_literal(input: &str) -> IResult<&str, Syntax> {
    let (mut remaining, _) = char('"').parse(input)?;
    let mut chars = Vec::new();

    loop {
        let mut char_iter = remaining.chars();
        match char_iter.next() {
            Some('"') => {
                return Ok((char_iter.as_str(), Syntax::String(chars.into_iter().collect())));
            }
            Some('\\') => {
                match char_iter.next() {
                    Some('n') => chars.push('\n'),
                    Some('t') => chars.push('\t'),
                    Some('r') => chars.push('\r'),
                    Some('\\') => chars.push('\\'),
                    Some('"') => chars.push('"'),
                    _ => {
                        // Unknown or incomplete escape sequence
                        return Err(nom::Err::Error(nom::error::Error::new(
                            remaining,
                            ErrorKind::Char,
                        )));
                    }
                }
                remaining = char_iter.as_str();
            }
            Some(ch) => {
                chars.push(ch);
                remaining = char_iter.as_str();
            }
            None => {
                // End of input without a closing quote
                return Err(nom::Err::Error(nom::error::Error::new(
                    remaining,
                    ErrorKind::Char,
                )));
            }
        }
    }
}

/// Read one maximal run of symbol characters and classify it as an
/// integer, a rational literal, or a symbol. Anything else (e.g.
/// `123abc`, an out-of-range integer) is a read error.
fn atom(input: &str) -> IResult<&str, Syntax> {
    let (remaining, token) =
        take_while1(|c: char| c.is_alphanumeric() || SYMBOL_SPECIAL_CHARS.contains(c))
            .parse(input)?;
    match classify_atom(token) {
        Some(stx) => Ok((remaining, stx)),
        None => Err(nom::Err::Error(nom::error::Error::new(
            input,
            ErrorKind::Alpha,
        ))),
    }
}

fn classify_atom(token: &str) -> Option<Syntax> {
    if is_integer_literal(token) {
        return token.parse::<NumberType>().ok().map(Syntax::Integer);
    }
    if let Some((num, den)) = token.split_once('/')
        && is_integer_literal(num)
        && !den.is_empty()
        && den.chars().all(|c| c.is_ascii_digit())
    {
        let num = num.parse::<NumberType>().ok()?;
        let den = den.parse::<NumberType>().ok()?;
        return Some(Syntax::Rational(num, den));
    }
    if is_valid_symbol(token) {
        return Some(Syntax::Symbol(token.to_owned()));
    }
    None
}

fn is_integer_literal(token: &str) -> bool {
    let digits = token.strip_prefix('-').unwrap_or(token);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

/// Read exactly one datum; trailing content other than whitespace and
/// comments is an error.
pub fn read_syntax(input: &str) -> Result<Syntax, RuntimeError> {
    match terminated(|i| datum(i, 0), whitespace).parse(input) {
        Ok(("", stx)) => Ok(stx),
        Ok((remaining, _)) => Err(RuntimeError::new(format!(
            "Unexpected trailing input: '{remaining}'"
        ))),
        Err(e) => Err(RuntimeError::new(read_error_message(input, e))),
    }
}

/// Read a whole program: zero or more data.
pub fn read_program(input: &str) -> Result<Vec<Syntax>, RuntimeError> {
    match terminated(many0(|i| datum(i, 0)), whitespace).parse(input) {
        Ok(("", forms)) => Ok(forms),
        Ok((remaining, _)) => {
            // Re-read the leftover to surface the underlying error
            match datum(remaining, 0) {
                Err(e) => Err(RuntimeError::new(read_error_message(input, e))),
                Ok(_) => Err(RuntimeError::new(format!(
                    "Unexpected trailing input: '{remaining}'"
                ))),
            }
        }
        Err(e) => Err(RuntimeError::new(read_error_message(input, e))),
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used)] // test code OK
mod tests {
    use super::*;
    use crate::syntax::{int, lst, sym};

    /// Expected outcomes for data-driven read tests
    #[derive(Debug)]
    enum ReadResult {
        Success(Syntax),
        Error,
    }
    use ReadResult::*;

    fn run_read_tests(cases: Vec<(&str, ReadResult)>) {
        for (i, (input, expected)) in cases.iter().enumerate() {
            let test_id = format!("Read test #{}", i + 1);
            match (read_syntax(input), expected) {
                (Ok(actual), Success(expected_stx)) => {
                    assert_eq!(&actual, expected_stx, "{test_id}: for '{input}'");
                }
                (Err(_), Error) => {}
                (Ok(actual), Error) => {
                    panic!("{test_id}: expected error for '{input}', got {actual:?}");
                }
                (Err(e), Success(_)) => {
                    panic!("{test_id}: expected success for '{input}', got error: {e}");
                }
            }
        }
    }

    #[test]
    #[expect(clippy::too_many_lines)] // data-driven coverage of the whole grammar
    fn test_reader_comprehensive() {
        let cases = vec![
            // ===== INTEGERS =====
            ("42", Success(int(42))),
            ("-5", Success(int(-5))),
            ("0", Success(int(0))),
            ("-0", Success(int(0))),
            ("9223372036854775807", Success(int(i64::MAX))),
            ("-9223372036854775808", Success(int(i64::MIN))),
            ("99999999999999999999", Error), // out of range
            ("123abc", Error),               // neither number nor symbol
            ("3.14", Error),                 // no floats in this dialect
            // ===== RATIONAL LITERALS =====
            ("1/2", Success(Syntax::Rational(1, 2))),
            ("-3/6", Success(Syntax::Rational(-3, 6))), // kept as written
            ("10/4", Success(Syntax::Rational(10, 4))),
            ("1/0", Success(Syntax::Rational(1, 0))), // rejected at evaluation
            ("1/2/3", Error),
            ("1/-2", Error),
            // ===== SYMBOLS =====
            ("foo", Success(sym("foo"))),
            ("+", Success(sym("+"))),
            ("-", Success(sym("-"))),
            ("/", Success(sym("/"))),
            ("<=", Success(sym("<="))),
            ("set-car!", Success(sym("set-car!"))),
            ("eq?", Success(sym("eq?"))),
            ("list->x", Success(sym("list->x"))),
            ("-abc", Success(sym("-abc"))),
            ("var123", Success(sym("var123"))),
            ("with_underscore", Success(sym("with_underscore"))),
            ("-42name", Error),
            ("has@sign", Error),
            ("%percent", Error),
            // ===== BOOLEANS =====
            ("#t", Success(Syntax::True)),
            ("#f", Success(Syntax::False)),
            ("#q", Error),
            // ===== STRINGS =====
            ("\"hello\"", Success(Syntax::String("hello".into()))),
            ("\"\"", Success(Syntax::String(String::new()))),
            (
                r#""line\nbreak""#,
                Success(Syntax::String("line\nbreak".into())),
            ),
            (r#""tab\there""#, Success(Syntax::String("tab\there".into()))),
            (
                r#""quote\"in\"middle""#,
                Success(Syntax::String("quote\"in\"middle".into())),
            ),
            (
                r#""back\\slash""#,
                Success(Syntax::String("back\\slash".into())),
            ),
            (r#""bad\zescape""#, Error),
            (r#""unterminated"#, Error),
            (r#""trailing\"#, Error),
            // ===== LISTS =====
            ("()", Success(lst([]))),
            ("(   )", Success(lst([]))),
            ("(42)", Success(lst([int(42)]))),
            ("(+ 1 2)", Success(lst([sym("+"), int(1), int(2)]))),
            (
                "(foo \"bar\" #t 1/2)",
                Success(lst([
                    sym("foo"),
                    Syntax::String("bar".into()),
                    Syntax::True,
                    Syntax::Rational(1, 2),
                ])),
            ),
            (
                "((1 2) (3 4))",
                Success(lst([lst([int(1), int(2)]), lst([int(3), int(4)])])),
            ),
            ("(((1)))", Success(lst([lst([lst([int(1)])])]))),
            ("( 1   2\t\n3 )", Success(lst([int(1), int(2), int(3)]))),
            ("(1 2", Error),
            ("1 2)", Error),
            (")", Error),
            ("", Error),
            ("   ", Error),
            // ===== QUOTE SHORTHAND =====
            ("'foo", Success(lst([sym("quote"), sym("foo")]))),
            (
                "'(1 2)",
                Success(lst([sym("quote"), lst([int(1), int(2)])])),
            ),
            ("'()", Success(lst([sym("quote"), lst([])]))),
            (
                "''x",
                Success(lst([
                    sym("quote"),
                    lst([sym("quote"), sym("x")]),
                ])),
            ),
            // ===== COMMENTS =====
            ("42 ; the answer", Success(int(42))),
            ("; leading comment\n42", Success(int(42))),
            (
                "(+ 1 ; one\n   2) ; two",
                Success(lst([sym("+"), int(1), int(2)])),
            ),
            ("; only a comment", Error), // no datum at all
            // ===== TRAILING CONTENT =====
            ("1 2", Error),
            ("(+ 1 2) (+ 3 4)", Error), // read_syntax takes exactly one
        ];

        run_read_tests(cases);
    }

    #[test]
    fn test_reader_depth_limit() {
        let under = format!(
            "{}1{}",
            "(".repeat(MAX_READ_DEPTH - 1),
            ")".repeat(MAX_READ_DEPTH - 1)
        );
        let over = format!(
            "{}1{}",
            "(".repeat(MAX_READ_DEPTH),
            ")".repeat(MAX_READ_DEPTH)
        );

        assert!(read_syntax(&under).is_ok());
        let err = read_syntax(&over).unwrap_err();
        assert!(err.message().contains("deeply nested"), "{err}");
    }

    #[test]
    fn test_read_program() {
        let forms = read_program("(define x 1) ; setup\n(+ x 2)").unwrap();
        assert_eq!(
            forms,
            vec![
                lst([sym("define"), sym("x"), int(1)]),
                lst([sym("+"), sym("x"), int(2)]),
            ]
        );

        assert_eq!(read_program("").unwrap(), vec![]);
        assert_eq!(read_program("  ; nothing\n").unwrap(), vec![]);
        assert!(read_program("(1 2").is_err());
        assert!(read_program("(+ 1 2))").is_err());
    }
}
