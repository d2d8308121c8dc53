//! Standard library: built-in functions, types and methods
//!
//! Builtins are plain enum values stored in the global namespace; calling one
//! routes through [`call_builtin`]. Type objects (`int`, `list`,
//! `ValueError`, ...) are callable too and dispatch through [`construct`].

pub mod convert;
pub mod format;
pub mod functions;
pub mod methods;

use super::errors::{type_error, EvalResult};
use super::executor::Interpreter;
use super::types::{PyType, Val};

/* ===================== Builtin Function Types ===================== */

/// Built-in function identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Print,
    Len,
    Repr,
    Abs,
    Min,
    Max,
    Sum,
    Sorted,
    Reversed,
    Enumerate,
    Zip,
    Round,
    Any,
    All,
    Isinstance,
    Map,
    Filter,
    Chr,
    Ord,
    Divmod,
    Format,
    Iter,
    Next,
    Pow,
    Hex,
    Oct,
    Bin,
}

const ALL_BUILTINS: &[Builtin] = &[
    Builtin::Print,
    Builtin::Len,
    Builtin::Repr,
    Builtin::Abs,
    Builtin::Min,
    Builtin::Max,
    Builtin::Sum,
    Builtin::Sorted,
    Builtin::Reversed,
    Builtin::Enumerate,
    Builtin::Zip,
    Builtin::Round,
    Builtin::Any,
    Builtin::All,
    Builtin::Isinstance,
    Builtin::Map,
    Builtin::Filter,
    Builtin::Chr,
    Builtin::Ord,
    Builtin::Divmod,
    Builtin::Format,
    Builtin::Iter,
    Builtin::Next,
    Builtin::Pow,
    Builtin::Hex,
    Builtin::Oct,
    Builtin::Bin,
];

impl Builtin {
    pub fn name(self) -> &'static str {
        match self {
            Builtin::Print => "print",
            Builtin::Len => "len",
            Builtin::Repr => "repr",
            Builtin::Abs => "abs",
            Builtin::Min => "min",
            Builtin::Max => "max",
            Builtin::Sum => "sum",
            Builtin::Sorted => "sorted",
            Builtin::Reversed => "reversed",
            Builtin::Enumerate => "enumerate",
            Builtin::Zip => "zip",
            Builtin::Round => "round",
            Builtin::Any => "any",
            Builtin::All => "all",
            Builtin::Isinstance => "isinstance",
            Builtin::Map => "map",
            Builtin::Filter => "filter",
            Builtin::Chr => "chr",
            Builtin::Ord => "ord",
            Builtin::Divmod => "divmod",
            Builtin::Format => "format",
            Builtin::Iter => "iter",
            Builtin::Next => "next",
            Builtin::Pow => "pow",
            Builtin::Hex => "hex",
            Builtin::Oct => "oct",
            Builtin::Bin => "bin",
        }
    }

    pub fn from_name(name: &str) -> Option<Builtin> {
        ALL_BUILTINS.iter().copied().find(|b| b.name() == name)
    }
}

/// Resolve a name in the builtin namespace
pub fn lookup(name: &str) -> Option<Val> {
    Builtin::from_name(name)
        .map(Val::Builtin)
        .or_else(|| PyType::from_name(name).map(Val::Type))
}

/* ===================== Call Arguments ===================== */

/// Evaluated arguments of a call
#[derive(Debug, Clone, Default)]
pub struct CallArgs {
    pub positional: Vec<Val>,
    pub keywords: Vec<(String, Val)>,
}

impl CallArgs {
    pub fn positional(values: Vec<Val>) -> Self {
        CallArgs {
            positional: values,
            keywords: Vec::new(),
        }
    }

    /// Remove and return a keyword argument
    pub fn take_keyword(&mut self, name: &str) -> Option<Val> {
        let idx = self.keywords.iter().position(|(k, _)| k == name)?;
        Some(self.keywords.remove(idx).1)
    }

    /// Positional arguments, failing on any keyword not already taken
    pub fn finish(self, func: &str) -> EvalResult<Vec<Val>> {
        if let Some((name, _)) = self.keywords.first() {
            return Err(type_error(format!(
                "'{}' is an invalid keyword argument for {}()",
                name, func
            )));
        }
        Ok(self.positional)
    }

    /// Like [`CallArgs::finish`], also checking the positional count
    pub fn finish_between(self, func: &str, min: usize, max: usize) -> EvalResult<Vec<Val>> {
        let values = self.finish(func)?;
        check_count(func, values.len(), min, max)?;
        Ok(values)
    }
}

pub fn check_count(func: &str, given: usize, min: usize, max: usize) -> EvalResult<()> {
    let plural = |n: usize| if n == 1 { "" } else { "s" };
    if min == max && given != min {
        return Err(type_error(format!(
            "{}() takes exactly {} argument{} ({} given)",
            func,
            min,
            plural(min),
            given
        )));
    }
    if given < min {
        return Err(type_error(format!(
            "{}() expected at least {} argument{}, got {}",
            func,
            min,
            plural(min),
            given
        )));
    }
    if given > max {
        return Err(type_error(format!(
            "{}() expected at most {} argument{}, got {}",
            func,
            max,
            plural(max),
            given
        )));
    }
    Ok(())
}

/* ===================== Dispatch ===================== */

/// Call a builtin function
pub fn call_builtin(interp: &mut Interpreter, builtin: Builtin, args: CallArgs) -> EvalResult {
    match builtin {
        Builtin::Print => functions::print(interp, args),
        Builtin::Len => functions::len(args),
        Builtin::Repr => functions::repr(args),
        Builtin::Abs => functions::abs(args),
        Builtin::Min => functions::min(interp, args),
        Builtin::Max => functions::max(interp, args),
        Builtin::Sum => functions::sum(interp, args),
        Builtin::Sorted => functions::sorted(interp, args),
        Builtin::Reversed => functions::reversed(args),
        Builtin::Enumerate => functions::enumerate(interp, args),
        Builtin::Zip => functions::zip(interp, args),
        Builtin::Round => functions::round(args),
        Builtin::Any => functions::any(interp, args),
        Builtin::All => functions::all(interp, args),
        Builtin::Isinstance => functions::isinstance(args),
        Builtin::Map => functions::map(interp, args),
        Builtin::Filter => functions::filter(interp, args),
        Builtin::Chr => functions::chr(args),
        Builtin::Ord => functions::ord(args),
        Builtin::Divmod => functions::divmod(args),
        Builtin::Format => functions::format(args),
        Builtin::Iter => functions::iter(args),
        Builtin::Next => functions::next(interp, args),
        Builtin::Pow => functions::pow(args),
        Builtin::Hex => functions::radix(args, "hex", 16),
        Builtin::Oct => functions::radix(args, "oct", 8),
        Builtin::Bin => functions::radix(args, "bin", 2),
    }
}

/// Call a type object, e.g. `int("3")` or `ValueError("bad")`
pub fn construct(interp: &mut Interpreter, ty: PyType, args: CallArgs) -> EvalResult {
    functions::construct(interp, ty, args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_resolves_functions_and_types() {
        assert!(matches!(lookup("len"), Some(Val::Builtin(Builtin::Len))));
        assert!(matches!(lookup("int"), Some(Val::Type(PyType::Int))));
        assert!(matches!(lookup("KeyError"), Some(Val::Type(PyType::Exception(_)))));
        assert!(lookup("open").is_none());
        assert!(lookup("eval").is_none());
    }

    #[test]
    fn test_builtin_names_round_trip() {
        for builtin in ALL_BUILTINS {
            assert_eq!(Builtin::from_name(builtin.name()), Some(*builtin));
        }
    }

    #[test]
    fn test_unknown_keyword_rejected() {
        let mut args = CallArgs::positional(vec![Val::Int(1)]);
        args.keywords.push(("bogus".to_string(), Val::None));
        let err = args.finish("len").unwrap_err();
        assert_eq!(err.message(), "'bogus' is an invalid keyword argument for len()");
    }

    #[test]
    fn test_count_messages() {
        assert_eq!(
            check_count("len", 2, 1, 1).unwrap_err().message(),
            "len() takes exactly 1 argument (2 given)"
        );
        assert_eq!(
            check_count("range", 0, 1, 3).unwrap_err().message(),
            "range() expected at least 1 argument, got 0"
        );
    }
}
