//! Runtime value types

use std::cell::RefCell;
use std::rc::Rc;

use super::ast::FunctionDef;
use super::dict::Dict;
use crate::interpreter::errors::{ExcKind, Exception};
use crate::interpreter::executor::env::Scope;
use crate::interpreter::executor::iterators::IterObject;
use crate::interpreter::stdlib::Builtin;

/// Runtime value type
///
/// Lists and dicts are shared mutable references, so aliasing behaves the way
/// scripts expect (`b = a; b.append(1)` is visible through `a`).
#[derive(Debug, Clone)]
pub enum Val {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Rc<RefCell<Vec<Val>>>),
    Tuple(Rc<Vec<Val>>),
    Dict(Rc<RefCell<Dict>>),
    Range(RangeVal),
    Iter(Rc<IterObject>),
    Function(Rc<Function>),
    Builtin(Builtin),
    Method(Rc<BoundMethod>),
    Type(PyType),
    Exception(Rc<Exception>),
}

impl Val {
    pub fn list(items: Vec<Val>) -> Val {
        Val::List(Rc::new(RefCell::new(items)))
    }

    pub fn tuple(items: Vec<Val>) -> Val {
        Val::Tuple(Rc::new(items))
    }

    pub fn dict(dict: Dict) -> Val {
        Val::Dict(Rc::new(RefCell::new(dict)))
    }

    pub fn str(s: impl Into<String>) -> Val {
        Val::Str(s.into())
    }

    /// The value's class
    pub fn py_type(&self) -> PyType {
        match self {
            Val::None => PyType::NoneType,
            Val::Bool(_) => PyType::Bool,
            Val::Int(_) => PyType::Int,
            Val::Float(_) => PyType::Float,
            Val::Str(_) => PyType::Str,
            Val::List(_) => PyType::List,
            Val::Tuple(_) => PyType::Tuple,
            Val::Dict(_) => PyType::Dict,
            Val::Range(_) => PyType::Range,
            Val::Iter(object) => PyType::Iterator(object.name()),
            Val::Function(_) => PyType::Function,
            Val::Builtin(_) => PyType::BuiltinFunction,
            Val::Method(_) => PyType::Method,
            Val::Type(_) => PyType::Type,
            Val::Exception(exc) => PyType::Exception(exc.kind),
        }
    }

    /// Class name as shown in error messages
    pub fn type_name(&self) -> &'static str {
        self.py_type().name()
    }

    /// Check if value is truthy (for conditionals)
    pub fn is_truthy(&self) -> bool {
        match self {
            Val::None => false,
            Val::Bool(b) => *b,
            Val::Int(i) => *i != 0,
            Val::Float(f) => *f != 0.0,
            Val::Str(s) => !s.is_empty(),
            Val::List(items) => !items.borrow().is_empty(),
            Val::Tuple(items) => !items.is_empty(),
            Val::Dict(dict) => !dict.borrow().is_empty(),
            Val::Range(range) => !range.is_empty(),
            _ => true,
        }
    }

    /// Identity comparison (`is`)
    ///
    /// Containers compare by reference; immutable scalars compare by value.
    pub fn is_same(&self, other: &Val) -> bool {
        match (self, other) {
            (Val::None, Val::None) => true,
            (Val::Bool(a), Val::Bool(b)) => a == b,
            (Val::Int(a), Val::Int(b)) => a == b,
            (Val::Float(a), Val::Float(b)) => a.to_bits() == b.to_bits(),
            (Val::Str(a), Val::Str(b)) => a == b,
            (Val::List(a), Val::List(b)) => Rc::ptr_eq(a, b),
            (Val::Tuple(a), Val::Tuple(b)) => Rc::ptr_eq(a, b),
            (Val::Dict(a), Val::Dict(b)) => Rc::ptr_eq(a, b),
            (Val::Range(a), Val::Range(b)) => a == b,
            (Val::Iter(a), Val::Iter(b)) => Rc::ptr_eq(a, b),
            (Val::Function(a), Val::Function(b)) => Rc::ptr_eq(a, b),
            (Val::Builtin(a), Val::Builtin(b)) => a == b,
            (Val::Method(a), Val::Method(b)) => Rc::ptr_eq(a, b),
            (Val::Type(a), Val::Type(b)) => a == b,
            (Val::Exception(a), Val::Exception(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/* ===================== Range ===================== */

/// Lazy integer range produced by `range()`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeVal {
    pub start: i64,
    pub stop: i64,
    pub step: i64,
}

impl RangeVal {
    /// Number of items, exact even when the span exceeds `i64`
    pub fn count(&self) -> i128 {
        let (lo, hi, step) = if self.step > 0 {
            (self.start as i128, self.stop as i128, self.step as i128)
        } else {
            (self.stop as i128, self.start as i128, -(self.step as i128))
        };
        if hi <= lo {
            0
        } else {
            (hi - lo + step - 1) / step
        }
    }

    /// `len(range)`, which must fit a machine-sized integer
    pub fn len(&self) -> Result<usize, Exception> {
        let count = self.count();
        if count > i64::MAX as i128 {
            return Err(Exception::new(
                ExcKind::OverflowError,
                "Python int too large to convert to C ssize_t",
            ));
        }
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Item at `idx`; `idx` must be below `count()`
    pub fn get(&self, idx: i128) -> i64 {
        (self.start as i128 + self.step as i128 * idx) as i64
    }

    pub fn contains(&self, value: i64) -> bool {
        let in_bounds = if self.step > 0 {
            value >= self.start && value < self.stop
        } else {
            value <= self.start && value > self.stop
        };
        in_bounds && (value as i128 - self.start as i128) % self.step as i128 == 0
    }
}

/* ===================== Callables ===================== */

/// User-defined function (from `def` or `lambda`)
pub struct Function {
    pub def: Rc<FunctionDef>,
    /// Default values, evaluated once at definition time, aligned to the
    /// trailing parameters
    pub defaults: Vec<Val>,
    /// Scope the function was defined in; `None` for module-level functions
    pub closure: Option<Rc<Scope>>,
}

impl std::fmt::Debug for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Function({})", self.def.name)
    }
}

/// A method looked up on a value, e.g. `items.append`
#[derive(Debug)]
pub struct BoundMethod {
    pub receiver: Val,
    pub name: String,
}

/* ===================== Types ===================== */

/// Classes visible to scripts (returned by `type()`, accepted by `isinstance`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PyType {
    NoneType,
    Bool,
    Int,
    Float,
    Str,
    List,
    Tuple,
    Dict,
    Range,
    /// Iterator objects, named by their class (`map`, `generator`, ...)
    Iterator(&'static str),
    Function,
    BuiltinFunction,
    Method,
    Type,
    Exception(ExcKind),
}

impl PyType {
    pub fn name(self) -> &'static str {
        match self {
            PyType::NoneType => "NoneType",
            PyType::Bool => "bool",
            PyType::Int => "int",
            PyType::Float => "float",
            PyType::Str => "str",
            PyType::List => "list",
            PyType::Tuple => "tuple",
            PyType::Dict => "dict",
            PyType::Range => "range",
            PyType::Iterator(name) => name,
            PyType::Function => "function",
            PyType::BuiltinFunction => "builtin_function_or_method",
            PyType::Method => "method",
            PyType::Type => "type",
            PyType::Exception(kind) => kind.name(),
        }
    }

    /// Types reachable by name from scripts
    pub fn from_name(name: &str) -> Option<PyType> {
        let ty = match name {
            "bool" => PyType::Bool,
            "int" => PyType::Int,
            "float" => PyType::Float,
            "str" => PyType::Str,
            "list" => PyType::List,
            "tuple" => PyType::Tuple,
            "dict" => PyType::Dict,
            "range" => PyType::Range,
            "type" => PyType::Type,
            _ => return ExcKind::from_name(name).map(PyType::Exception),
        };
        Some(ty)
    }

    /// True when instances of `self` are also instances of `other`
    pub fn is_subtype_of(self, other: PyType) -> bool {
        match (self, other) {
            (PyType::Bool, PyType::Int) => true,
            (PyType::Exception(a), PyType::Exception(b)) => a.is_subclass_of(b),
            (a, b) => a == b,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthiness() {
        assert!(!Val::None.is_truthy());
        assert!(!Val::Int(0).is_truthy());
        assert!(!Val::Float(0.0).is_truthy());
        assert!(!Val::str("").is_truthy());
        assert!(!Val::list(vec![]).is_truthy());
        assert!(Val::list(vec![Val::None]).is_truthy());
        assert!(Val::str("0").is_truthy());
    }

    #[test]
    fn test_range_len_and_contains() {
        let r = RangeVal { start: 0, stop: 10, step: 3 };
        assert_eq!(r.len().unwrap(), 4);
        assert!(r.contains(9));
        assert!(!r.contains(10));
        let down = RangeVal { start: 5, stop: 0, step: -2 };
        assert_eq!(down.len().unwrap(), 3);
        assert_eq!(down.get(2), 1);
        assert_eq!(RangeVal { start: 3, stop: 1, step: 1 }.len().unwrap(), 0);
    }

    #[test]
    fn test_range_near_integer_limits() {
        let wide = RangeVal { start: -i64::MAX, stop: i64::MAX, step: 3 };
        assert!(wide.contains(5));
        assert!(!wide.contains(6));
        assert_eq!(wide.get(5), -9223372036854775792);
        assert_eq!(wide.count(), 6148914691236517205);
        assert_eq!(wide.len().unwrap(), 6148914691236517205);

        let full = RangeVal { start: i64::MIN, stop: i64::MAX, step: 1 };
        let err = full.len().unwrap_err();
        assert_eq!(err.to_string(), "OverflowError: Python int too large to convert to C ssize_t");
        assert!(!full.is_empty());

        let down = RangeVal { start: i64::MAX, stop: i64::MIN, step: -1 };
        assert!(down.contains(-1));
        assert_eq!(down.get(1), i64::MAX - 1);
    }

    #[test]
    fn test_list_identity_is_by_reference() {
        let a = Val::list(vec![Val::Int(1)]);
        let b = a.clone();
        let c = Val::list(vec![Val::Int(1)]);
        assert!(a.is_same(&b));
        assert!(!a.is_same(&c));
    }

    #[test]
    fn test_bool_is_int_subtype() {
        assert!(PyType::Bool.is_subtype_of(PyType::Int));
        assert!(!PyType::Int.is_subtype_of(PyType::Bool));
        assert_eq!(PyType::from_name("ValueError"), Some(PyType::Exception(ExcKind::ValueError)));
    }
}
