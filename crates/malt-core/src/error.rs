use std::fmt;

use crate::context::ErrorPolicy;
use crate::value::Value;

/// Check arity of a native function's arguments, returning `MaltError::Arity` on mismatch.
///
/// # Forms
///
/// ```ignore
/// check_arity!(args, "fn-name", 2);        // exactly 2
/// check_arity!(args, "fn-name", 1..=3);    // 1 to 3 inclusive
/// check_arity!(args, "fn-name", 2..);      // 2 or more
/// ```
#[macro_export]
macro_rules! check_arity {
    ($args:expr, $name:expr, $exact:literal) => {
        if $args.len() != $exact {
            return Err($crate::MaltError::arity(
                $name,
                stringify!($exact),
                $args.len(),
            ));
        }
    };
    ($args:expr, $name:expr, $lo:literal ..= $hi:literal) => {
        if $args.len() < $lo || $args.len() > $hi {
            return Err($crate::MaltError::arity(
                $name,
                concat!(stringify!($lo), "-", stringify!($hi)),
                $args.len(),
            ));
        }
    };
    ($args:expr, $name:expr, $lo:literal ..) => {
        if $args.len() < $lo {
            return Err($crate::MaltError::arity(
                $name,
                concat!(stringify!($lo), "+"),
                $args.len(),
            ));
        }
    };
}

/// A 1-based source position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub line: usize,
    pub col: usize,
}

impl Span {
    pub fn point(line: usize, col: usize) -> Self {
        Span { line, col }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// Failures produced while turning text into values.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReadError {
    /// The text ended before a form was complete. A REPL should ask for
    /// another line and retry with the concatenated input.
    #[error("expected {expected}, got EOF (opened at {span})")]
    UnbalancedInput { expected: &'static str, span: Span },

    #[error("unexpected '{found}' at {span}")]
    UnexpectedCloseDelimiter { found: char, span: Span },

    /// Blank or comment-only input: not an error for callers, just nothing to do.
    #[error("empty input")]
    EmptyInput,

    #[error("{message} at {span}")]
    Malformed { message: String, span: Span },
}

impl ReadError {
    /// True when more input could complete the form.
    pub fn is_incomplete(&self) -> bool {
        matches!(self, ReadError::UnbalancedInput { .. })
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum MaltError {
    #[error("Reader error: {0}")]
    Read(#[from] ReadError),

    #[error("'{0}' not found")]
    Unbound(String),

    #[error("Arity error: {name} expects {expected} args, got {got}")]
    Arity {
        name: String,
        expected: String,
        got: usize,
    },

    #[error("Type error: expected {expected}, got {got}")]
    Type { expected: String, got: String },

    #[error("Division by zero")]
    DivisionByZero,

    #[error("{0} is not applicable")]
    NotApplicable(String),

    #[error("Eval error: {0}")]
    Eval(String),

    /// A value raised by `throw`.
    #[error("Uncaught exception: {0}")]
    Exception(Value),

    /// Invariant violations and resource exhaustion. Never visible to `catch*`.
    #[error("Fatal: {0}")]
    Fatal(String),
}

impl MaltError {
    pub fn eval(msg: impl Into<String>) -> Self {
        MaltError::Eval(msg.into())
    }

    pub fn fatal(msg: impl Into<String>) -> Self {
        MaltError::Fatal(msg.into())
    }

    pub fn type_error(expected: impl Into<String>, got: impl Into<String>) -> Self {
        MaltError::Type {
            expected: expected.into(),
            got: got.into(),
        }
    }

    pub fn arity(name: impl Into<String>, expected: impl Into<String>, got: usize) -> Self {
        MaltError::Arity {
            name: name.into(),
            expected: expected.into(),
            got,
        }
    }

    pub fn not_applicable(value: &Value) -> Self {
        MaltError::NotApplicable(value.to_string())
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, MaltError::Fatal(_))
    }

    /// The value a `catch*` clause binds for this error, or `None` when the
    /// error must keep propagating under `policy`.
    pub fn caught_value(&self, policy: ErrorPolicy) -> Option<Value> {
        match self {
            MaltError::Exception(val) => Some(val.clone()),
            MaltError::Read(ReadError::EmptyInput) => Some(Value::Nil),
            MaltError::Fatal(_) => None,
            other => match policy {
                ErrorPolicy::Catchable => Some(Value::string(&other.to_string())),
                ErrorPolicy::Propagate => None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_display() {
        assert_eq!(Span::point(3, 7).to_string(), "3:7");
    }

    #[test]
    fn arity_error() {
        let e = MaltError::arity("my-fn", "2", 5);
        assert_eq!(e.to_string(), "Arity error: my-fn expects 2 args, got 5");
    }

    #[test]
    fn type_error() {
        let e = MaltError::type_error("string", "int");
        assert_eq!(e.to_string(), "Type error: expected string, got int");
    }

    #[test]
    fn unbound_message() {
        assert_eq!(MaltError::Unbound("abc".into()).to_string(), "'abc' not found");
    }

    #[test]
    fn read_error_converts() {
        let e: MaltError = ReadError::EmptyInput.into();
        assert!(matches!(e, MaltError::Read(ReadError::EmptyInput)));
    }

    #[test]
    fn incomplete_only_for_unbalanced() {
        let open = ReadError::UnbalancedInput {
            expected: "')'",
            span: Span::point(1, 1),
        };
        assert_eq!(open.to_string(), "expected ')', got EOF (opened at 1:1)");
        let stray = ReadError::UnexpectedCloseDelimiter {
            found: ')',
            span: Span::point(1, 1),
        };
        assert!(open.is_incomplete());
        assert!(!stray.is_incomplete());
        assert!(!ReadError::EmptyInput.is_incomplete());
    }

    #[test]
    fn exceptions_always_caught() {
        let e = MaltError::Exception(Value::int(7));
        assert_eq!(e.caught_value(ErrorPolicy::Propagate), Some(Value::int(7)));
        assert_eq!(e.caught_value(ErrorPolicy::Catchable), Some(Value::int(7)));
    }

    #[test]
    fn empty_input_caught_as_nil() {
        let e = MaltError::Read(ReadError::EmptyInput);
        assert_eq!(e.caught_value(ErrorPolicy::Propagate), Some(Value::Nil));
    }

    #[test]
    fn structural_errors_follow_policy() {
        let e = MaltError::Unbound("x".into());
        assert_eq!(
            e.caught_value(ErrorPolicy::Catchable),
            Some(Value::string("'x' not found"))
        );
        assert_eq!(e.caught_value(ErrorPolicy::Propagate), None);
    }

    #[test]
    fn fatal_never_caught() {
        let e = MaltError::fatal("stack");
        assert!(e.is_fatal());
        assert_eq!(e.caught_value(ErrorPolicy::Catchable), None);
    }

    #[test]
    fn check_arity_forms() {
        fn exact(args: &[Value]) -> Result<(), MaltError> {
            check_arity!(args, "exact", 2);
            Ok(())
        }
        fn range(args: &[Value]) -> Result<(), MaltError> {
            check_arity!(args, "range", 1..=3);
            Ok(())
        }
        fn open(args: &[Value]) -> Result<(), MaltError> {
            check_arity!(args, "open", 2..);
            Ok(())
        }
        assert!(exact(&[Value::Nil, Value::Nil]).is_ok());
        assert!(exact(&[Value::Nil]).is_err());
        assert!(range(&[]).is_err());
        assert!(range(&[Value::Nil, Value::Nil, Value::Nil]).is_ok());
        assert!(open(&[Value::Nil]).is_err());
        assert!(open(&[Value::Nil, Value::Nil, Value::Nil]).is_ok());
    }
}
