//! Script-level exceptions
//!
//! Exceptions raised while a script runs are ordinary values: a kind (the
//! exception class) plus the constructor arguments. The executor propagates
//! them through `Result<_, Exception>` so `?` unwinds the Rust stack the same
//! way a raise unwinds the script's.

use super::stdlib::format::{py_repr, py_str};
use super::types::Val;

/* ===================== Exception Kinds ===================== */

/// Built-in exception classes available to scripts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExcKind {
    BaseException,
    Exception,
    ArithmeticError,
    LookupError,
    ValueError,
    TypeError,
    KeyError,
    IndexError,
    ZeroDivisionError,
    OverflowError,
    NameError,
    UnboundLocalError,
    AttributeError,
    RuntimeError,
    RecursionError,
    AssertionError,
    StopIteration,
    NotImplementedError,
}

const ALL_KINDS: &[ExcKind] = &[
    ExcKind::BaseException,
    ExcKind::Exception,
    ExcKind::ArithmeticError,
    ExcKind::LookupError,
    ExcKind::ValueError,
    ExcKind::TypeError,
    ExcKind::KeyError,
    ExcKind::IndexError,
    ExcKind::ZeroDivisionError,
    ExcKind::OverflowError,
    ExcKind::NameError,
    ExcKind::UnboundLocalError,
    ExcKind::AttributeError,
    ExcKind::RuntimeError,
    ExcKind::RecursionError,
    ExcKind::AssertionError,
    ExcKind::StopIteration,
    ExcKind::NotImplementedError,
];

impl ExcKind {
    pub fn name(self) -> &'static str {
        match self {
            ExcKind::BaseException => "BaseException",
            ExcKind::Exception => "Exception",
            ExcKind::ArithmeticError => "ArithmeticError",
            ExcKind::LookupError => "LookupError",
            ExcKind::ValueError => "ValueError",
            ExcKind::TypeError => "TypeError",
            ExcKind::KeyError => "KeyError",
            ExcKind::IndexError => "IndexError",
            ExcKind::ZeroDivisionError => "ZeroDivisionError",
            ExcKind::OverflowError => "OverflowError",
            ExcKind::NameError => "NameError",
            ExcKind::UnboundLocalError => "UnboundLocalError",
            ExcKind::AttributeError => "AttributeError",
            ExcKind::RuntimeError => "RuntimeError",
            ExcKind::RecursionError => "RecursionError",
            ExcKind::AssertionError => "AssertionError",
            ExcKind::StopIteration => "StopIteration",
            ExcKind::NotImplementedError => "NotImplementedError",
        }
    }

    pub fn from_name(name: &str) -> Option<ExcKind> {
        ALL_KINDS.iter().copied().find(|kind| kind.name() == name)
    }

    /// Direct base class, `None` for the root
    pub fn parent(self) -> Option<ExcKind> {
        match self {
            ExcKind::BaseException => None,
            ExcKind::Exception => Some(ExcKind::BaseException),
            ExcKind::ZeroDivisionError | ExcKind::OverflowError => Some(ExcKind::ArithmeticError),
            ExcKind::KeyError | ExcKind::IndexError => Some(ExcKind::LookupError),
            ExcKind::UnboundLocalError => Some(ExcKind::NameError),
            ExcKind::RecursionError | ExcKind::NotImplementedError => Some(ExcKind::RuntimeError),
            _ => Some(ExcKind::Exception),
        }
    }

    /// True when `self` is `other` or one of its subclasses
    pub fn is_subclass_of(self, other: ExcKind) -> bool {
        let mut current = Some(self);
        while let Some(kind) = current {
            if kind == other {
                return true;
            }
            current = kind.parent();
        }
        false
    }
}

/* ===================== Exception Value ===================== */

/// A raised (or raisable) exception instance
#[derive(Debug, Clone)]
pub struct Exception {
    pub kind: ExcKind,
    pub args: Vec<Val>,
}

impl Exception {
    pub fn new(kind: ExcKind, message: impl Into<String>) -> Self {
        Exception {
            kind,
            args: vec![Val::Str(message.into())],
        }
    }

    pub fn with_args(kind: ExcKind, args: Vec<Val>) -> Self {
        Exception { kind, args }
    }

    /// Text of `str(exc)`
    ///
    /// KeyError shows the repr of its key, every other kind shows its single
    /// argument as-is; several arguments render as a tuple.
    pub fn message(&self) -> String {
        match self.args.as_slice() {
            [] => String::new(),
            [arg] if self.kind == ExcKind::KeyError => py_repr(arg),
            [arg] => py_str(arg),
            args => py_repr(&Val::tuple(args.to_vec())),
        }
    }

    /// Text of `repr(exc)`, e.g. `ValueError('boom')`
    pub fn repr(&self) -> String {
        let args: Vec<String> = self.args.iter().map(py_repr).collect();
        format!("{}({})", self.kind.name(), args.join(", "))
    }
}

impl std::fmt::Display for Exception {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let message = self.message();
        if message.is_empty() {
            write!(f, "{}", self.kind.name())
        } else {
            write!(f, "{}: {}", self.kind.name(), message)
        }
    }
}

impl std::error::Error for Exception {}

/// Result of evaluating anything that may raise
pub type EvalResult<T = Val> = Result<T, Exception>;

/* ===================== Constructors ===================== */

pub fn type_error(message: impl Into<String>) -> Exception {
    Exception::new(ExcKind::TypeError, message)
}

pub fn value_error(message: impl Into<String>) -> Exception {
    Exception::new(ExcKind::ValueError, message)
}

pub fn index_error(message: impl Into<String>) -> Exception {
    Exception::new(ExcKind::IndexError, message)
}

pub fn key_error(key: Val) -> Exception {
    Exception::with_args(ExcKind::KeyError, vec![key])
}

pub fn zero_division(message: impl Into<String>) -> Exception {
    Exception::new(ExcKind::ZeroDivisionError, message)
}

pub fn recursion_error(message: impl Into<String>) -> Exception {
    Exception::new(ExcKind::RecursionError, message)
}

pub fn overflow_error() -> Exception {
    Exception::new(ExcKind::OverflowError, "integer overflow")
}

pub fn name_error(name: &str) -> Exception {
    Exception::new(ExcKind::NameError, format!("name '{}' is not defined", name))
}

pub fn attribute_error(val: &Val, attr: &str) -> Exception {
    Exception::new(
        ExcKind::AttributeError,
        format!("'{}' object has no attribute '{}'", val.type_name(), attr),
    )
}
