//! Built-in functions and type constructors
//!
//! Iterator-producing builtins (`map`, `filter`, `zip`, `enumerate`,
//! `reversed`, `iter`) return lazy iterator objects; consumers such as `sum`
//! and `any` pull items one at a time.

use std::num::IntErrorKind;
use std::rc::Rc;

use super::format::{format_value, str_repr, try_repr, try_str};
use super::methods::is_space;
use super::CallArgs;
use crate::interpreter::errors::{
    overflow_error, type_error, value_error, EvalResult, ExcKind, Exception,
};
use crate::interpreter::executor::iterators::{Cursor, IterObject};
use crate::interpreter::executor::operators::{
    self, as_index, binary_op, compare, len_of, py_cmp, ValIter,
};
use crate::interpreter::executor::Interpreter;
use crate::interpreter::types::{BinOp, CmpOp, Dict, PyType, RangeVal, Val};

/// Positional arguments of a call taking exactly `N`
fn exactly<const N: usize>(func: &str, args: CallArgs) -> EvalResult<[Val; N]> {
    let values = args.finish_between(func, N, N)?;
    values
        .try_into()
        .map_err(|_| type_error(format!("{}() takes exactly {} arguments", func, N)))
}

fn call1(interp: &mut Interpreter, func: &Val, arg: Val) -> EvalResult {
    interp.call_value(func, CallArgs::positional(vec![arg]))
}

/// A `key=` argument; `None` means no key
fn key_function(args: &mut CallArgs) -> Option<Val> {
    args.take_keyword("key").filter(|k| !matches!(k, Val::None))
}

/* ===================== Output ===================== */

pub fn print(interp: &mut Interpreter, mut args: CallArgs) -> EvalResult {
    let sep = text_option(args.take_keyword("sep"), " ", "sep")?;
    let end = text_option(args.take_keyword("end"), "\n", "end")?;
    args.take_keyword("flush");
    let values = args.finish("print")?;

    let parts = values.iter().map(try_str).collect::<EvalResult<Vec<_>>>()?;
    let text = format!("{}{}", parts.join(&sep), end);
    interp.console().write_str(&text).map_err(|err| {
        Exception::new(ExcKind::RuntimeError, format!("print failed: {}", err))
    })?;
    Ok(Val::None)
}

fn text_option(value: Option<Val>, default: &str, name: &str) -> EvalResult<String> {
    match value {
        None | Some(Val::None) => Ok(default.to_string()),
        Some(Val::Str(s)) => Ok(s),
        Some(other) => Err(type_error(format!(
            "{} must be None or a string, not {}",
            name,
            other.type_name()
        ))),
    }
}

/* ===================== Inspection ===================== */

pub fn len(args: CallArgs) -> EvalResult {
    let [value] = exactly("len", args)?;
    Ok(Val::Int(len_of(&value)? as i64))
}

pub fn repr(args: CallArgs) -> EvalResult {
    let [value] = exactly("repr", args)?;
    Ok(Val::Str(try_repr(&value)?))
}

pub fn isinstance(args: CallArgs) -> EvalResult {
    let [value, classes] = exactly("isinstance", args)?;
    Ok(Val::Bool(instance_of(&value.py_type(), &classes)?))
}

fn instance_of(ty: &PyType, classes: &Val) -> EvalResult<bool> {
    match classes {
        Val::Type(class) => Ok(ty.is_subtype_of(*class)),
        Val::Tuple(options) => {
            for option in options.iter() {
                if instance_of(ty, option)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        _ => Err(type_error(
            "isinstance() arg 2 must be a type, a tuple of types, or a union",
        )),
    }
}

pub fn format(args: CallArgs) -> EvalResult {
    let values = args.finish_between("format", 1, 2)?;
    let spec = match values.get(1) {
        None => String::new(),
        Some(Val::Str(spec)) => spec.clone(),
        Some(other) => {
            return Err(type_error(format!(
                "format() argument 2 must be str, not {}",
                other.type_name()
            )))
        }
    };
    Ok(Val::Str(format_value(&values[0], &spec)?))
}

/* ===================== Numbers ===================== */

pub fn abs(args: CallArgs) -> EvalResult {
    let [value] = exactly("abs", args)?;
    match value {
        Val::Int(i) => i.checked_abs().map(Val::Int).ok_or_else(overflow_error),
        Val::Bool(b) => Ok(Val::Int(b as i64)),
        Val::Float(f) => Ok(Val::Float(f.abs())),
        other => Err(type_error(format!(
            "bad operand type for abs(): '{}'",
            other.type_name()
        ))),
    }
}

pub fn divmod(args: CallArgs) -> EvalResult {
    let [a, b] = exactly("divmod", args)?;
    let quotient = binary_op(BinOp::FloorDiv, &a, &b)?;
    let remainder = binary_op(BinOp::Mod, &a, &b)?;
    Ok(Val::tuple(vec![quotient, remainder]))
}

/// `pow(base, exp[, mod])`; the three-argument form is integer-only
pub fn pow(mut args: CallArgs) -> EvalResult {
    let mod_kw = args.take_keyword("mod");
    let mut values = args.finish_between("pow", 2, 3)?;
    let modulus = if values.len() == 3 {
        values.pop()
    } else {
        mod_kw
    };
    let modulus = match modulus {
        None | Some(Val::None) => return binary_op(BinOp::Pow, &values[0], &values[1]),
        Some(modulus) => modulus,
    };
    let int = |value: &Val| match value {
        Val::Int(i) => Some(*i),
        Val::Bool(b) => Some(*b as i64),
        _ => None,
    };
    match (int(&values[0]), int(&values[1]), int(&modulus)) {
        (Some(base), Some(exp), Some(modulus)) => mod_pow(base, exp, modulus).map(Val::Int),
        _ => Err(type_error(
            "pow() 3rd argument not allowed unless all arguments are integers",
        )),
    }
}

/// `base ** exp % modulus` without overflow; the result takes the sign of
/// `modulus`
fn mod_pow(base: i64, exp: i64, modulus: i64) -> EvalResult<i64> {
    if modulus == 0 {
        return Err(value_error("pow() 3rd argument cannot be 0"));
    }
    let m = modulus.unsigned_abs() as i128;
    let mut base = (base as i128).rem_euclid(m);
    if exp < 0 {
        base = mod_inverse(base, m)
            .ok_or_else(|| value_error("base is not invertible for the given modulus"))?;
    }
    let mut exp = exp.unsigned_abs();
    let mut result = 1 % m;
    while exp > 0 {
        if exp & 1 == 1 {
            result = result * base % m;
        }
        base = base * base % m;
        exp >>= 1;
    }
    if modulus < 0 && result != 0 {
        result -= m;
    }
    Ok(result as i64)
}

fn mod_inverse(value: i128, modulus: i128) -> Option<i128> {
    let (mut old_r, mut r) = (value, modulus);
    let (mut old_s, mut s) = (1i128, 0i128);
    while r != 0 {
        let q = old_r / r;
        (old_r, r) = (r, old_r - q * r);
        (old_s, s) = (s, old_s - q * s);
    }
    (old_r == 1).then(|| old_s.rem_euclid(modulus))
}

/// `hex()`, `oct()` and `bin()`
pub fn radix(args: CallArgs, func: &str, base: u32) -> EvalResult {
    let [value] = exactly(func, args)?;
    let n = as_index(&value)?;
    let magnitude = n.unsigned_abs();
    let (prefix, digits) = match base {
        16 => ("0x", format!("{:x}", magnitude)),
        8 => ("0o", format!("{:o}", magnitude)),
        _ => ("0b", format!("{:b}", magnitude)),
    };
    let sign = if n < 0 { "-" } else { "" };
    Ok(Val::Str(format!("{}{}{}", sign, prefix, digits)))
}

pub fn round(mut args: CallArgs) -> EvalResult {
    let ndigits_kw = args.take_keyword("ndigits");
    let mut values = args.finish_between("round", 1, 2)?;
    let ndigits = if values.len() == 2 {
        values.pop()
    } else {
        ndigits_kw
    };
    let ndigits = match ndigits {
        None | Some(Val::None) => None,
        Some(n) => Some(as_index(&n)?),
    };

    match (&values[0], ndigits) {
        (Val::Int(i), None) => Ok(Val::Int(*i)),
        (Val::Bool(b), None) => Ok(Val::Int(*b as i64)),
        (Val::Int(i), Some(n)) => Ok(Val::Int(round_int(*i, n))),
        (Val::Bool(b), Some(n)) => Ok(Val::Int(round_int(*b as i64, n))),
        (Val::Float(f), None) => float_to_int(f.round_ties_even()),
        (Val::Float(f), Some(n)) => Ok(Val::Float(round_float(*f, n))),
        (other, _) => Err(type_error(format!(
            "type {} doesn't define __round__ method",
            other.type_name()
        ))),
    }
}

/// Round to a multiple of `10**-ndigits`, ties to even
fn round_int(value: i64, ndigits: i64) -> i64 {
    if ndigits >= 0 {
        return value;
    }
    let Some(unit) = u32::try_from(-ndigits).ok().and_then(|e| 10i64.checked_pow(e)) else {
        return 0;
    };
    let quotient = value.div_euclid(unit);
    let remainder = value.rem_euclid(unit);
    let rounded = match (remainder * 2).cmp(&unit) {
        std::cmp::Ordering::Greater => quotient + 1,
        std::cmp::Ordering::Equal if quotient % 2 != 0 => quotient + 1,
        _ => quotient,
    };
    rounded.saturating_mul(unit)
}

fn round_float(value: f64, ndigits: i64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    if ndigits >= 0 {
        // Decimal formatting rounds on the exact binary value
        let digits = ndigits.min(330) as usize;
        return format!("{:.*}", digits, value).parse().unwrap_or(value);
    }
    if ndigits < -308 {
        return 0.0 * value;
    }
    let unit = 10f64.powi((-ndigits) as i32);
    (value / unit).round_ties_even() * unit
}

fn float_to_int(value: f64) -> EvalResult {
    if value.is_nan() {
        return Err(value_error("cannot convert float NaN to integer"));
    }
    if value.is_infinite() {
        return Err(Exception::new(
            ExcKind::OverflowError,
            "cannot convert float infinity to integer",
        ));
    }
    let truncated = value.trunc();
    if truncated < i64::MIN as f64 || truncated >= i64::MAX as f64 {
        return Err(overflow_error());
    }
    Ok(Val::Int(truncated as i64))
}

pub fn sum(interp: &mut Interpreter, mut args: CallArgs) -> EvalResult {
    let start_kw = args.take_keyword("start");
    let mut values = args.finish_between("sum", 1, 2)?;
    let start = if values.len() == 2 {
        values.pop()
    } else {
        start_kw
    };
    let mut total = start.unwrap_or(Val::Int(0));
    if matches!(total, Val::Str(_)) {
        return Err(type_error(
            "sum() can't sum strings [use ''.join(seq) instead]",
        ));
    }
    let mut items = interp.iterate(&values[0])?;
    while let Some(item) = interp.next_item(&mut items)? {
        total = binary_op(BinOp::Add, &total, &item)?;
    }
    Ok(total)
}

/* ===================== Ordering ===================== */

pub fn min(interp: &mut Interpreter, args: CallArgs) -> EvalResult {
    extreme(interp, args, "min", std::cmp::Ordering::Less)
}

pub fn max(interp: &mut Interpreter, args: CallArgs) -> EvalResult {
    extreme(interp, args, "max", std::cmp::Ordering::Greater)
}

fn extreme(
    interp: &mut Interpreter,
    mut args: CallArgs,
    func: &str,
    wanted: std::cmp::Ordering,
) -> EvalResult {
    let key = key_function(&mut args);
    let default = args.take_keyword("default");
    let values = args.finish(func)?;

    let candidates = match values.len() {
        0 => {
            return Err(type_error(format!(
                "{} expected at least 1 argument, got 0",
                func
            )))
        }
        1 => interp.collect(&values[0])?,
        _ => {
            if default.is_some() {
                return Err(type_error(format!(
                    "Cannot specify a default for {}() with multiple positional arguments",
                    func
                )));
            }
            values
        }
    };

    // The first of several equal extremes wins
    let mut best: Option<(Val, Val)> = None;
    for item in candidates {
        let rank = match &key {
            Some(key) => call1(interp, key, item.clone())?,
            None => item.clone(),
        };
        let better = match &best {
            None => true,
            Some((_, best_rank)) => py_cmp(&rank, best_rank)? == wanted,
        };
        if better {
            best = Some((item, rank));
        }
    }

    match best {
        Some((item, _)) => Ok(item),
        None => default.ok_or_else(|| value_error(format!("{}() iterable argument is empty", func))),
    }
}

pub fn sorted(interp: &mut Interpreter, mut args: CallArgs) -> EvalResult {
    let key = key_function(&mut args);
    let reverse = args
        .take_keyword("reverse")
        .map_or(false, |flag| flag.is_truthy());
    let [iterable] = exactly("sorted", args)?;

    let mut items = interp.collect(&iterable)?;
    sort_values(interp, &mut items, key, reverse)?;
    Ok(Val::list(items))
}

/// Stable sort by `<`, shared by `sorted()` and `list.sort()`
///
/// Comparison errors (e.g. `int` vs `str`) abort the sort and leave `items`
/// untouched.
pub fn sort_values(
    interp: &mut Interpreter,
    items: &mut Vec<Val>,
    key: Option<Val>,
    reverse: bool,
) -> EvalResult<()> {
    let keys = match &key {
        Some(key) => items
            .iter()
            .map(|item| call1(interp, key, item.clone()))
            .collect::<EvalResult<Vec<_>>>()?,
        None => items.clone(),
    };

    let order = merge_sort(items.len(), |a, b| {
        if reverse {
            compare(CmpOp::Lt, &keys[b], &keys[a])
        } else {
            compare(CmpOp::Lt, &keys[a], &keys[b])
        }
    })?;

    let sorted: Vec<Val> = order.into_iter().map(|idx| items[idx].clone()).collect();
    *items = sorted;
    Ok(())
}

/// Bottom-up merge sort over indices with a fallible `is_less`
fn merge_sort(
    len: usize,
    mut is_less: impl FnMut(usize, usize) -> EvalResult<bool>,
) -> EvalResult<Vec<usize>> {
    let mut order: Vec<usize> = (0..len).collect();
    let mut merged = Vec::with_capacity(len);
    let mut width = 1;
    while width < len {
        merged.clear();
        let mut start = 0;
        while start < len {
            let mid = (start + width).min(len);
            let end = (start + 2 * width).min(len);
            let (mut left, mut right) = (start, mid);
            while left < mid && right < end {
                // Right side only wins when strictly smaller
                if is_less(order[right], order[left])? {
                    merged.push(order[right]);
                    right += 1;
                } else {
                    merged.push(order[left]);
                    left += 1;
                }
            }
            merged.extend_from_slice(&order[left..mid]);
            merged.extend_from_slice(&order[right..end]);
            start = end;
        }
        std::mem::swap(&mut order, &mut merged);
        width *= 2;
    }
    Ok(order)
}

/* ===================== Iteration ===================== */

pub fn reversed(args: CallArgs) -> EvalResult {
    let [value] = exactly("reversed", args)?;
    let name = match &value {
        Val::List(_) => "list_reverseiterator",
        Val::Tuple(_) | Val::Str(_) => "reversed",
        Val::Dict(_) => "dict_reversekeyiterator",
        Val::Range(_) => "range_iterator",
        other => {
            return Err(type_error(format!(
                "'{}' object is not reversible",
                other.type_name()
            )))
        }
    };
    let values = match operators::iterate(&value)? {
        ValIter::Range { range, len, .. } => ValIter::RangeBack { range, left: len },
        ValIter::Items(items) => {
            let mut items: Vec<Val> = items.collect();
            items.reverse();
            ValIter::Items(items.into_iter())
        }
        back => back,
    };
    Ok(IterObject::values(name, values))
}

pub fn enumerate(interp: &mut Interpreter, mut args: CallArgs) -> EvalResult {
    let start_kw = args.take_keyword("start");
    let mut values = args.finish_between("enumerate", 1, 2)?;
    let start = if values.len() == 2 {
        values.pop()
    } else {
        start_kw
    };
    let start = match start {
        Some(start) => as_index(&start)?,
        None => 0,
    };
    let source = interp.iterate(&values[0])?;
    Ok(IterObject::enumerate(source, start))
}

pub fn zip(interp: &mut Interpreter, mut args: CallArgs) -> EvalResult {
    args.take_keyword("strict");
    let values = args.finish("zip")?;
    let sources = values
        .iter()
        .map(|value| interp.iterate(value))
        .collect::<EvalResult<Vec<_>>>()?;
    Ok(IterObject::zip(sources))
}

pub fn any(interp: &mut Interpreter, args: CallArgs) -> EvalResult {
    let [value] = exactly("any", args)?;
    let mut items = interp.iterate(&value)?;
    while let Some(item) = interp.next_item(&mut items)? {
        if item.is_truthy() {
            return Ok(Val::Bool(true));
        }
    }
    Ok(Val::Bool(false))
}

pub fn all(interp: &mut Interpreter, args: CallArgs) -> EvalResult {
    let [value] = exactly("all", args)?;
    let mut items = interp.iterate(&value)?;
    while let Some(item) = interp.next_item(&mut items)? {
        if !item.is_truthy() {
            return Ok(Val::Bool(false));
        }
    }
    Ok(Val::Bool(true))
}

pub fn map(interp: &mut Interpreter, args: CallArgs) -> EvalResult {
    let mut values = args.finish("map")?;
    if values.len() < 2 {
        return Err(type_error("map() must have at least two arguments."));
    }
    let func = values.remove(0);
    let sources = values
        .iter()
        .map(|value| interp.iterate(value))
        .collect::<EvalResult<Vec<_>>>()?;
    Ok(IterObject::map(func, sources))
}

pub fn filter(interp: &mut Interpreter, args: CallArgs) -> EvalResult {
    let [func, iterable] = exactly("filter", args)?;
    let source = interp.iterate(&iterable)?;
    Ok(IterObject::filter(func, source))
}

/// `iter(x)`; iterators return themselves
pub fn iter(args: CallArgs) -> EvalResult {
    let [value] = exactly("iter", args)?;
    if let Val::Iter(_) = value {
        return Ok(value);
    }
    let name = match &value {
        Val::List(_) => "list_iterator",
        Val::Tuple(_) => "tuple_iterator",
        Val::Str(s) if s.is_ascii() => "str_ascii_iterator",
        Val::Str(_) => "str_iterator",
        Val::Dict(_) => "dict_keyiterator",
        Val::Range(_) => "range_iterator",
        other => {
            return Err(type_error(format!(
                "'{}' object is not iterable",
                other.type_name()
            )))
        }
    };
    Ok(IterObject::values(name, operators::iterate(&value)?))
}

/// `next(iterator[, default])`
pub fn next(interp: &mut Interpreter, args: CallArgs) -> EvalResult {
    let mut values = args.finish_between("next", 1, 2)?;
    let default = if values.len() == 2 { values.pop() } else { None };
    let Val::Iter(object) = &values[0] else {
        return Err(type_error(format!(
            "'{}' object is not an iterator",
            values[0].type_name()
        )));
    };
    let mut cursor = Cursor::Object(object.clone());
    match interp.next_item(&mut cursor)? {
        Some(item) => Ok(item),
        None => default.ok_or_else(|| Exception::with_args(ExcKind::StopIteration, Vec::new())),
    }
}

/* ===================== Characters ===================== */

pub fn chr(args: CallArgs) -> EvalResult {
    let [code] = exactly("chr", args)?;
    let code = as_index(&code)?;
    u32::try_from(code)
        .ok()
        .and_then(char::from_u32)
        .map(|c| Val::Str(c.to_string()))
        .ok_or_else(|| value_error("chr() arg not in range(0x110000)"))
}

pub fn ord(args: CallArgs) -> EvalResult {
    let [value] = exactly("ord", args)?;
    match &value {
        Val::Str(s) => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(Val::Int(c as i64)),
                _ => Err(type_error(format!(
                    "ord() expected a character, but string of length {} found",
                    s.chars().count()
                ))),
            }
        }
        other => Err(type_error(format!(
            "ord() expected string of length 1, but {} found",
            other.type_name()
        ))),
    }
}

/* ===================== Type Constructors ===================== */

/// Call a type object
pub fn construct(interp: &mut Interpreter, ty: PyType, args: CallArgs) -> EvalResult {
    match ty {
        PyType::Bool => {
            let values = args.finish_between("bool", 0, 1)?;
            Ok(Val::Bool(values.first().map_or(false, Val::is_truthy)))
        }
        PyType::Int => to_int(args),
        PyType::Float => to_float(args),
        PyType::Str => {
            let values = args.finish_between("str", 0, 1)?;
            Ok(Val::Str(values.first().map(try_str).transpose()?.unwrap_or_default()))
        }
        PyType::List => {
            let values = args.finish_between("list", 0, 1)?;
            match values.first() {
                Some(source) => Ok(Val::list(interp.collect(source)?)),
                None => Ok(Val::list(Vec::new())),
            }
        }
        PyType::Tuple => {
            let values = args.finish_between("tuple", 0, 1)?;
            match values.first() {
                Some(Val::Tuple(items)) => Ok(Val::Tuple(items.clone())),
                Some(source) => Ok(Val::tuple(interp.collect(source)?)),
                None => Ok(Val::tuple(Vec::new())),
            }
        }
        PyType::Dict => to_dict(interp, args),
        PyType::Range => to_range(args),
        PyType::Type => {
            let [value] = exactly("type", args)?;
            Ok(Val::Type(value.py_type()))
        }
        PyType::Exception(kind) => {
            let values = args.finish(kind.name())?;
            Ok(Val::Exception(Rc::new(Exception::with_args(kind, values))))
        }
        other => Err(type_error(format!(
            "cannot create '{}' instances",
            other.name()
        ))),
    }
}

fn to_int(mut args: CallArgs) -> EvalResult {
    let base_kw = args.take_keyword("base");
    let mut values = args.finish_between("int", 0, 2)?;
    let base = if values.len() == 2 {
        values.pop()
    } else {
        base_kw
    };
    let Some(value) = values.pop() else {
        return Ok(Val::Int(0));
    };

    if let Some(base) = base {
        let base = as_index(&base)?;
        return match &value {
            Val::Str(text) => parse_int(text, base),
            _ => Err(type_error("int() can't convert non-string with explicit base")),
        };
    }

    match value {
        Val::Int(i) => Ok(Val::Int(i)),
        Val::Bool(b) => Ok(Val::Int(b as i64)),
        Val::Float(f) => float_to_int(f),
        Val::Str(text) => parse_int(&text, 10),
        other => Err(type_error(format!(
            "int() argument must be a string, a bytes-like object or a real number, not '{}'",
            other.type_name()
        ))),
    }
}

/// `int(text, base)`, including `0x`/`0o`/`0b` prefixes and underscores
fn parse_int(text: &str, base: i64) -> EvalResult {
    if base != 0 && !(2..=36).contains(&base) {
        return Err(value_error("int() base must be >= 2 and <= 36, or 0"));
    }
    let invalid = || {
        value_error(format!(
            "invalid literal for int() with base {}: {}",
            base,
            str_repr(text)
        ))
    };

    let trimmed = text.trim_matches(is_space);
    let (negative, unsigned) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let lower = unsigned.to_ascii_lowercase();

    let prefixed = |prefix: &str, radix: i64| {
        (base == 0 || base == radix)
            .then(|| lower.strip_prefix(prefix).map(|rest| (radix, rest.trim_start_matches('_'))))
            .flatten()
    };
    let (radix, digits) = prefixed("0x", 16)
        .or_else(|| prefixed("0o", 8))
        .or_else(|| prefixed("0b", 2))
        .unwrap_or((if base == 0 { 10 } else { base }, lower.as_str()));

    let well_formed = !digits.is_empty()
        && !digits.starts_with('_')
        && !digits.ends_with('_')
        && !digits.contains("__")
        && digits.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !well_formed {
        return Err(invalid());
    }
    let digits = digits.replace('_', "");
    // Base 0 follows literal rules: no leading zeros on decimals
    if base == 0 && radix == 10 && digits.len() > 1 && digits.starts_with('0')
        && digits.chars().any(|c| c != '0')
    {
        return Err(invalid());
    }

    let magnitude = i128::from_str_radix(&digits, radix as u32).map_err(|err| match err.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => overflow_error(),
        _ => invalid(),
    })?;
    let value = if negative { -magnitude } else { magnitude };
    i64::try_from(value).map(Val::Int).map_err(|_| overflow_error())
}

fn to_float(args: CallArgs) -> EvalResult {
    let values = args.finish_between("float", 0, 1)?;
    match values.first() {
        None => Ok(Val::Float(0.0)),
        Some(Val::Float(f)) => Ok(Val::Float(*f)),
        Some(Val::Int(i)) => Ok(Val::Float(*i as f64)),
        Some(Val::Bool(b)) => Ok(Val::Float(*b as i64 as f64)),
        Some(Val::Str(text)) => parse_float(text),
        Some(other) => Err(type_error(format!(
            "float() argument must be a string or a real number, not '{}'",
            other.type_name()
        ))),
    }
}

fn parse_float(text: &str) -> EvalResult {
    let invalid = || value_error(format!("could not convert string to float: {}", str_repr(text)));
    let trimmed = text.trim_matches(is_space);
    let valid_underscores = !trimmed.starts_with('_')
        && !trimmed.ends_with('_')
        && !trimmed.contains("__")
        && trimmed
            .match_indices('_')
            .all(|(idx, _)| {
                let before = trimmed[..idx].chars().next_back();
                let after = trimmed[idx + 1..].chars().next();
                before.map_or(false, |c| c.is_ascii_digit())
                    && after.map_or(false, |c| c.is_ascii_digit())
            });
    if !valid_underscores {
        return Err(invalid());
    }
    trimmed
        .replace('_', "")
        .parse::<f64>()
        .map(Val::Float)
        .map_err(|_| invalid())
}

fn to_dict(interp: &mut Interpreter, mut args: CallArgs) -> EvalResult {
    let keywords = std::mem::take(&mut args.keywords);
    let values = args.finish_between("dict", 0, 1)?;
    let mut dict = Dict::new();
    if let Some(source) = values.first() {
        for (key, value) in mapping_items(interp, source)? {
            dict.insert(key, value)?;
        }
    }
    for (key, value) in keywords {
        dict.insert(Val::Str(key), value)?;
    }
    Ok(Val::dict(dict))
}

/// Key/value pairs of a dict or of an iterable of pairs
pub fn mapping_items(interp: &mut Interpreter, source: &Val) -> EvalResult<Vec<(Val, Val)>> {
    if let Val::Dict(dict) = source {
        return Ok(dict.borrow().items());
    }
    let mut pairs = Vec::new();
    for (idx, item) in interp.collect(source)?.into_iter().enumerate() {
        let pair = interp.collect(&item).map_err(|_| {
            type_error(format!(
                "cannot convert dictionary update sequence element #{} to a sequence",
                idx
            ))
        })?;
        let [key, value]: [Val; 2] = pair.try_into().map_err(|pair: Vec<Val>| {
            value_error(format!(
                "dictionary update sequence element #{} has length {}; 2 is required",
                idx,
                pair.len()
            ))
        })?;
        pairs.push((key, value));
    }
    Ok(pairs)
}

fn to_range(args: CallArgs) -> EvalResult {
    let values = args.finish_between("range", 1, 3)?;
    let bounds = values
        .iter()
        .map(as_index)
        .collect::<EvalResult<Vec<i64>>>()?;
    let (start, stop, step) = match bounds.as_slice() {
        [stop] => (0, *stop, 1),
        [start, stop] => (*start, *stop, 1),
        [start, stop, step] => (*start, *stop, *step),
        _ => return Err(type_error("range expected at most 3 arguments")),
    };
    if step == 0 {
        return Err(value_error("range() arg 3 must not be zero"));
    }
    Ok(Val::Range(RangeVal { start, stop, step }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::Console;

    fn ints(values: &[i64]) -> Vec<Val> {
        values.iter().map(|v| Val::Int(*v)).collect()
    }

    fn interpreter() -> Interpreter {
        Interpreter::new(Rc::new(Console::new(Box::new(std::io::sink()))))
    }

    #[test]
    fn test_parse_int_forms() {
        assert!(matches!(parse_int(" 42 ", 10), Ok(Val::Int(42))));
        assert!(matches!(parse_int("-1_000", 10), Ok(Val::Int(-1000))));
        assert!(matches!(parse_int("0xff", 0), Ok(Val::Int(255))));
        assert!(matches!(parse_int("ff", 16), Ok(Val::Int(255))));
        assert!(matches!(parse_int("0b101", 2), Ok(Val::Int(5))));
        let err = parse_int("abc", 10).unwrap_err();
        assert_eq!(err.message(), "invalid literal for int() with base 10: 'abc'");
        assert!(parse_int("1__0", 10).is_err());
        assert!(parse_int("--5", 10).is_err());
        assert!(parse_int("010", 0).is_err());
    }

    #[test]
    fn test_parse_float_forms() {
        assert!(matches!(parse_float("1.5"), Ok(Val::Float(f)) if f == 1.5));
        assert!(matches!(parse_float(" -2e3 "), Ok(Val::Float(f)) if f == -2000.0));
        assert!(matches!(parse_float("inf"), Ok(Val::Float(f)) if f.is_infinite()));
        let err = parse_float("abc").unwrap_err();
        assert_eq!(err.message(), "could not convert string to float: 'abc'");
    }

    #[test]
    fn test_round_half_even() {
        assert_eq!(round_int(25, -1), 20);
        assert_eq!(round_int(35, -1), 40);
        assert_eq!(round_int(-25, -1), -20);
        assert_eq!(round_float(2.675, 2), 2.67);
        assert_eq!(round_float(1234.5, -2), 1200.0);
        assert!(matches!(float_to_int(2.5f64.round_ties_even()), Ok(Val::Int(2))));
    }

    #[test]
    fn test_merge_sort_is_stable() {
        let keys = [3, 1, 2, 1, 3];
        let order = merge_sort(keys.len(), |a, b| Ok(keys[a] < keys[b])).unwrap();
        assert_eq!(order, vec![1, 3, 2, 0, 4]);
    }

    #[test]
    fn test_range_arguments() {
        let range = to_range(CallArgs::positional(ints(&[1, 10, 3]))).unwrap();
        assert!(matches!(range, Val::Range(RangeVal { start: 1, stop: 10, step: 3 })));
        let err = to_range(CallArgs::positional(ints(&[1, 10, 0]))).unwrap_err();
        assert_eq!(err.message(), "range() arg 3 must not be zero");
        let err = to_range(CallArgs::positional(vec![Val::Float(1.5)])).unwrap_err();
        assert_eq!(err.message(), "'float' object cannot be interpreted as an integer");
    }

    #[test]
    fn test_dict_from_pairs_and_keywords() {
        let pairs = Val::list(vec![Val::tuple(vec![Val::str("a"), Val::Int(1)])]);
        let mut args = CallArgs::positional(vec![pairs]);
        args.keywords.push(("b".to_string(), Val::Int(2)));
        let mut interp = interpreter();
        let Val::Dict(dict) = to_dict(&mut interp, args).unwrap() else {
            panic!("expected dict");
        };
        assert_eq!(dict.borrow().len(), 2);

        let bad = Val::list(vec![Val::tuple(ints(&[1, 2, 3]))]);
        let err = mapping_items(&mut interp, &bad).unwrap_err();
        assert_eq!(
            err.message(),
            "dictionary update sequence element #0 has length 3; 2 is required"
        );
    }

    #[test]
    fn test_modular_pow() {
        assert_eq!(mod_pow(3, 4, 5).unwrap(), 1);
        assert_eq!(mod_pow(2, 10, -7).unwrap(), -5);
        assert_eq!(mod_pow(3, -1, 7).unwrap(), 5);
        assert_eq!(mod_pow(i64::MAX, i64::MAX, i64::MAX - 1).unwrap(), 1);
        assert_eq!(mod_pow(5, 0, 1).unwrap(), 0);
        assert_eq!(
            mod_pow(2, -1, 4).unwrap_err().message(),
            "base is not invertible for the given modulus"
        );
        assert_eq!(mod_pow(2, 3, 0).unwrap_err().message(), "pow() 3rd argument cannot be 0");
    }

    #[test]
    fn test_radix_prefixes() {
        let text = |value: i64, func: &str, base: u32| {
            match radix(CallArgs::positional(vec![Val::Int(value)]), func, base).unwrap() {
                Val::Str(s) => s,
                other => panic!("expected str, got {:?}", other),
            }
        };
        assert_eq!(text(255, "hex", 16), "0xff");
        assert_eq!(text(-31, "hex", 16), "-0x1f");
        assert_eq!(text(8, "oct", 8), "0o10");
        assert_eq!(text(-5, "bin", 2), "-0b101");
        assert_eq!(text(0, "bin", 2), "0b0");
        assert_eq!(text(i64::MIN, "hex", 16), "-0x8000000000000000");
    }

    #[test]
    fn test_exception_construction() {
        let mut interp = interpreter();
        let exc = construct(
            &mut interp,
            PyType::Exception(ExcKind::ValueError),
            CallArgs::positional(vec![Val::str("boom")]),
        )
        .unwrap();
        let Val::Exception(exc) = exc else {
            panic!("expected exception");
        };
        assert_eq!(exc.to_string(), "ValueError: boom");
    }
}
