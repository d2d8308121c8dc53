//! Operator semantics
//!
//! Pure functions over values: arithmetic, comparison, containment,
//! subscripting and iteration. Used by the evaluator and by builtins such as
//! `sum`, `sorted` and `min`.

use std::cmp::Ordering;
use std::rc::Rc;

use crate::interpreter::errors::{
    index_error, key_error, overflow_error, type_error, value_error, zero_division, EvalResult,
    ExcKind, Exception,
};
use crate::interpreter::stdlib::format::percent_format;
use crate::interpreter::types::{BinOp, CmpOp, Dict, RangeVal, UnaryOp, Val};

/// Upper bound on elements produced by sequence repetition
const MAX_REPEAT_LEN: usize = 1 << 28;

/* ===================== Iteration ===================== */

/// Iterator over a value's items
///
/// Lists, tuples, strings and dicts are snapshotted when iteration starts;
/// ranges are produced lazily.
pub enum ValIter {
    Items(std::vec::IntoIter<Val>),
    Range { range: RangeVal, next: i128, len: i128 },
    /// Range walked from its last element, `left` items remaining
    RangeBack { range: RangeVal, left: i128 },
}

impl Iterator for ValIter {
    type Item = Val;

    fn next(&mut self) -> Option<Val> {
        match self {
            ValIter::Items(items) => items.next(),
            ValIter::Range { range, next, len } => {
                if *next >= *len {
                    return None;
                }
                let value = range.get(*next);
                *next += 1;
                Some(Val::Int(value))
            }
            ValIter::RangeBack { range, left } => {
                if *left <= 0 {
                    return None;
                }
                *left -= 1;
                Some(Val::Int(range.get(*left)))
            }
        }
    }
}

pub fn iterate(val: &Val) -> EvalResult<ValIter> {
    let items = match val {
        Val::List(items) => items.borrow().clone(),
        Val::Tuple(items) => items.to_vec(),
        Val::Str(s) => s.chars().map(|c| Val::Str(c.to_string())).collect(),
        Val::Dict(dict) => dict.borrow().keys(),
        Val::Range(range) => {
            return Ok(ValIter::Range {
                range: *range,
                next: 0,
                len: range.count(),
            })
        }
        other => {
            return Err(type_error(format!(
                "'{}' object is not iterable",
                other.type_name()
            )))
        }
    };
    Ok(ValIter::Items(items.into_iter()))
}

/// All items of an iterable
pub fn collect(val: &Val) -> EvalResult<Vec<Val>> {
    Ok(iterate(val)?.collect())
}

pub fn len_of(val: &Val) -> EvalResult<usize> {
    match val {
        Val::Str(s) => Ok(s.chars().count()),
        Val::List(items) => Ok(items.borrow().len()),
        Val::Tuple(items) => Ok(items.len()),
        Val::Dict(dict) => Ok(dict.borrow().len()),
        Val::Range(range) => range.len(),
        other => Err(type_error(format!(
            "object of type '{}' has no len()",
            other.type_name()
        ))),
    }
}

/// Integer argument where only integers make sense (`range`, `chr`, ...)
pub fn as_index(val: &Val) -> EvalResult<i64> {
    match val {
        Val::Int(i) => Ok(*i),
        Val::Bool(b) => Ok(*b as i64),
        other => Err(type_error(format!(
            "'{}' object cannot be interpreted as an integer",
            other.type_name()
        ))),
    }
}

/* ===================== Numbers ===================== */

#[derive(Debug, Clone, Copy)]
enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn to_f64(self) -> f64 {
        match self {
            Num::Int(i) => i as f64,
            Num::Float(f) => f,
        }
    }
}

fn as_num(val: &Val) -> Option<Num> {
    match val {
        Val::Bool(b) => Some(Num::Int(*b as i64)),
        Val::Int(i) => Some(Num::Int(*i)),
        Val::Float(f) => Some(Num::Float(*f)),
        _ => None,
    }
}

fn num_cmp(a: Num, b: Num) -> Option<Ordering> {
    match (a, b) {
        (Num::Int(x), Num::Int(y)) => Some(x.cmp(&y)),
        (x, y) => x.to_f64().partial_cmp(&y.to_f64()),
    }
}

fn unsupported(op: BinOp, left: &Val, right: &Val) -> Exception {
    type_error(format!(
        "unsupported operand type(s) for {}: '{}' and '{}'",
        op.symbol(),
        left.type_name(),
        right.type_name()
    ))
}

fn int_op(op: BinOp, a: i64, b: i64) -> EvalResult {
    let result = match op {
        BinOp::Add => a.checked_add(b),
        BinOp::Sub => a.checked_sub(b),
        BinOp::Mul => a.checked_mul(b),
        BinOp::Div => {
            if b == 0 {
                return Err(zero_division("division by zero"));
            }
            return Ok(Val::Float(a as f64 / b as f64));
        }
        BinOp::FloorDiv => {
            if b == 0 {
                return Err(zero_division("integer division or modulo by zero"));
            }
            a.checked_div(b).zip(a.checked_rem(b)).map(|(q, r)| {
                if r != 0 && (r < 0) != (b < 0) {
                    q - 1
                } else {
                    q
                }
            })
        }
        BinOp::Mod => {
            if b == 0 {
                return Err(zero_division("integer modulo by zero"));
            }
            a.checked_rem(b).map(|r| {
                if r != 0 && (r < 0) != (b < 0) {
                    r + b
                } else {
                    r
                }
            })
        }
        BinOp::Pow => {
            if b < 0 {
                if a == 0 {
                    return Err(zero_division("0.0 cannot be raised to a negative power"));
                }
                return Ok(Val::Float((a as f64).powf(b as f64)));
            }
            u32::try_from(b).ok().and_then(|exp| a.checked_pow(exp))
        }
        BinOp::BitOr => Some(a | b),
        BinOp::BitXor => Some(a ^ b),
        BinOp::BitAnd => Some(a & b),
        BinOp::LShift | BinOp::RShift => return shift(op, a, b),
    };
    result.map(Val::Int).ok_or_else(overflow_error)
}

fn shift(op: BinOp, value: i64, count: i64) -> EvalResult {
    if count < 0 {
        return Err(value_error("negative shift count"));
    }
    let count = count.min(63) as u32;
    if op == BinOp::RShift {
        return Ok(Val::Int(value >> count));
    }
    let shifted = value << count;
    if shifted >> count != value {
        return Err(overflow_error());
    }
    Ok(Val::Int(shifted))
}

fn float_op(op: BinOp, a: f64, b: f64, left: &Val, right: &Val) -> EvalResult {
    let result = match op {
        BinOp::Add => a + b,
        BinOp::Sub => a - b,
        BinOp::Mul => a * b,
        BinOp::Div => {
            if b == 0.0 {
                return Err(zero_division("float division by zero"));
            }
            a / b
        }
        BinOp::FloorDiv => {
            if b == 0.0 {
                return Err(zero_division("float floor division by zero"));
            }
            (a / b).floor()
        }
        BinOp::Mod => {
            if b == 0.0 {
                return Err(zero_division("float modulo"));
            }
            let r = a % b;
            if r != 0.0 && (r < 0.0) != (b < 0.0) {
                r + b
            } else {
                r
            }
        }
        BinOp::Pow => {
            if a == 0.0 && b < 0.0 {
                return Err(zero_division("0.0 cannot be raised to a negative power"));
            }
            if a < 0.0 && b.fract() != 0.0 {
                return Err(value_error("math domain error"));
            }
            let r = a.powf(b);
            if r.is_infinite() && a.is_finite() && b.is_finite() {
                return Err(Exception::new(
                    ExcKind::OverflowError,
                    "(34, 'Numerical result out of range')",
                ));
            }
            r
        }
        BinOp::BitOr | BinOp::BitXor | BinOp::BitAnd | BinOp::LShift | BinOp::RShift => {
            return Err(unsupported(op, left, right))
        }
    };
    Ok(Val::Float(result))
}

/* ===================== Binary / Unary ===================== */

pub fn binary_op(op: BinOp, left: &Val, right: &Val) -> EvalResult {
    if let (Some(a), Some(b)) = (as_num(left), as_num(right)) {
        if let (Val::Bool(x), Val::Bool(y)) = (left, right) {
            match op {
                BinOp::BitAnd => return Ok(Val::Bool(x & y)),
                BinOp::BitOr => return Ok(Val::Bool(x | y)),
                BinOp::BitXor => return Ok(Val::Bool(x ^ y)),
                _ => {}
            }
        }
        return match (a, b) {
            (Num::Int(x), Num::Int(y)) => int_op(op, x, y),
            (x, y) => float_op(op, x.to_f64(), y.to_f64(), left, right),
        };
    }

    if op == BinOp::Mul {
        match (left, right) {
            (Val::Str(_) | Val::List(_) | Val::Tuple(_), Val::Int(_) | Val::Bool(_)) => {
                return repeat(left, as_index(right)?)
            }
            (Val::Int(_) | Val::Bool(_), Val::Str(_) | Val::List(_) | Val::Tuple(_)) => {
                return repeat(right, as_index(left)?)
            }
            _ => {}
        }
    }

    match (op, left, right) {
        (BinOp::Add, Val::Str(a), Val::Str(b)) => Ok(Val::Str(format!("{}{}", a, b))),
        (BinOp::Add, Val::List(a), Val::List(b)) => {
            let mut items = a.borrow().clone();
            items.extend(b.borrow().iter().cloned());
            Ok(Val::list(items))
        }
        (BinOp::Add, Val::Tuple(a), Val::Tuple(b)) => {
            Ok(Val::tuple(a.iter().chain(b.iter()).cloned().collect()))
        }
        (BinOp::Add, Val::Str(_), other) => Err(type_error(format!(
            "can only concatenate str (not \"{}\") to str",
            other.type_name()
        ))),
        (BinOp::Add, Val::List(_), other) => Err(type_error(format!(
            "can only concatenate list (not \"{}\") to list",
            other.type_name()
        ))),
        (BinOp::Add, Val::Tuple(_), other) => Err(type_error(format!(
            "can only concatenate tuple (not \"{}\") to tuple",
            other.type_name()
        ))),
        (BinOp::Mod, Val::Str(template), args) => Ok(Val::Str(percent_format(template, args)?)),
        (BinOp::BitOr, Val::Dict(a), Val::Dict(b)) => {
            let mut merged = a.borrow().clone();
            for (key, value) in b.borrow().items() {
                merged.insert(key, value)?;
            }
            Ok(Val::dict(merged))
        }
        _ => Err(unsupported(op, left, right)),
    }
}

fn repeat(seq: &Val, count: i64) -> EvalResult {
    let times = count.max(0) as usize;
    let unit = len_of(seq)?;
    if unit.saturating_mul(times) > MAX_REPEAT_LEN {
        return Err(Exception::new(
            ExcKind::OverflowError,
            "repeated sequence is too long",
        ));
    }
    match seq {
        Val::Str(s) => Ok(Val::Str(s.repeat(times))),
        Val::List(items) => {
            let items = items.borrow();
            Ok(Val::list(
                std::iter::repeat(items.iter()).take(times).flatten().cloned().collect(),
            ))
        }
        Val::Tuple(items) => Ok(Val::tuple(
            std::iter::repeat(items.iter()).take(times).flatten().cloned().collect(),
        )),
        other => Err(type_error(format!(
            "can't multiply sequence of type '{}'",
            other.type_name()
        ))),
    }
}

pub fn unary_op(op: UnaryOp, operand: &Val) -> EvalResult {
    let bad = |symbol: &str| {
        type_error(format!(
            "bad operand type for unary {}: '{}'",
            symbol,
            operand.type_name()
        ))
    };
    match (op, operand) {
        (UnaryOp::Not, v) => Ok(Val::Bool(!v.is_truthy())),
        (UnaryOp::Neg, Val::Int(i)) => i.checked_neg().map(Val::Int).ok_or_else(overflow_error),
        (UnaryOp::Neg, Val::Bool(b)) => Ok(Val::Int(-(*b as i64))),
        (UnaryOp::Neg, Val::Float(f)) => Ok(Val::Float(-f)),
        (UnaryOp::Neg, _) => Err(bad("-")),
        (UnaryOp::Pos, Val::Int(i)) => Ok(Val::Int(*i)),
        (UnaryOp::Pos, Val::Bool(b)) => Ok(Val::Int(*b as i64)),
        (UnaryOp::Pos, Val::Float(f)) => Ok(Val::Float(*f)),
        (UnaryOp::Pos, _) => Err(bad("+")),
        (UnaryOp::Invert, Val::Int(i)) => Ok(Val::Int(!i)),
        (UnaryOp::Invert, Val::Bool(b)) => Ok(Val::Int(!(*b as i64))),
        (UnaryOp::Invert, _) => Err(bad("~")),
    }
}

/* ===================== Comparison ===================== */

/// `a == b`
pub fn py_eq(a: &Val, b: &Val) -> bool {
    if let (Some(x), Some(y)) = (as_num(a), as_num(b)) {
        return num_cmp(x, y) == Some(Ordering::Equal);
    }
    match (a, b) {
        (Val::Str(x), Val::Str(y)) => x == y,
        (Val::List(x), Val::List(y)) => Rc::ptr_eq(x, y) || seq_eq(&x.borrow(), &y.borrow()),
        (Val::Tuple(x), Val::Tuple(y)) => seq_eq(x, y),
        (Val::Dict(x), Val::Dict(y)) => Rc::ptr_eq(x, y) || dict_eq(&x.borrow(), &y.borrow()),
        (Val::Range(x), Val::Range(y)) => {
            let (lx, ly) = (x.count(), y.count());
            lx == ly && (lx == 0 || (x.start == y.start && (lx == 1 || x.step == y.step)))
        }
        (Val::Type(x), Val::Type(y)) => x == y,
        _ => a.is_same(b),
    }
}

fn seq_eq(x: &[Val], y: &[Val]) -> bool {
    x.len() == y.len() && x.iter().zip(y).all(|(a, b)| py_eq(a, b))
}

fn dict_eq(x: &Dict, y: &Dict) -> bool {
    x.len() == y.len()
        && x.items().iter().all(|(key, value)| match y.get(key) {
            Ok(Some(other)) => py_eq(value, &other),
            _ => false,
        })
}

/// Ordering used by `sorted`, `min` and `max`
///
/// NaN compares equal to everything here, which keeps sorting total.
pub fn py_cmp(a: &Val, b: &Val) -> EvalResult<Ordering> {
    if let (Some(x), Some(y)) = (as_num(a), as_num(b)) {
        return Ok(num_cmp(x, y).unwrap_or(Ordering::Equal));
    }
    match (a, b) {
        (Val::Str(x), Val::Str(y)) => Ok(x.cmp(y)),
        (Val::List(x), Val::List(y)) => seq_cmp(&x.borrow(), &y.borrow()),
        (Val::Tuple(x), Val::Tuple(y)) => seq_cmp(x, y),
        _ => Err(not_supported("<", a, b)),
    }
}

fn seq_cmp(x: &[Val], y: &[Val]) -> EvalResult<Ordering> {
    for (a, b) in x.iter().zip(y) {
        if !py_eq(a, b) {
            return py_cmp(a, b);
        }
    }
    Ok(x.len().cmp(&y.len()))
}

fn not_supported(symbol: &str, a: &Val, b: &Val) -> Exception {
    type_error(format!(
        "'{}' not supported between instances of '{}' and '{}'",
        symbol,
        a.type_name(),
        b.type_name()
    ))
}

/// Evaluate one link of a comparison chain
pub fn compare(op: CmpOp, a: &Val, b: &Val) -> EvalResult<bool> {
    match op {
        CmpOp::Eq => Ok(py_eq(a, b)),
        CmpOp::NotEq => Ok(!py_eq(a, b)),
        CmpOp::Is => Ok(a.is_same(b)),
        CmpOp::IsNot => Ok(!a.is_same(b)),
        CmpOp::In => contains(b, a),
        CmpOp::NotIn => Ok(!contains(b, a)?),
        CmpOp::Lt | CmpOp::LtE | CmpOp::Gt | CmpOp::GtE => {
            let ord = match (as_num(a), as_num(b)) {
                (Some(x), Some(y)) => match num_cmp(x, y) {
                    Some(ord) => ord,
                    None => return Ok(false),
                },
                _ => match (a, b) {
                    (Val::Str(_), Val::Str(_))
                    | (Val::List(_), Val::List(_))
                    | (Val::Tuple(_), Val::Tuple(_)) => py_cmp(a, b)?,
                    _ => return Err(not_supported(op.symbol(), a, b)),
                },
            };
            Ok(match op {
                CmpOp::Lt => ord == Ordering::Less,
                CmpOp::LtE => ord != Ordering::Greater,
                CmpOp::Gt => ord == Ordering::Greater,
                _ => ord != Ordering::Less,
            })
        }
    }
}

/// `item in container`
pub fn contains(container: &Val, item: &Val) -> EvalResult<bool> {
    match container {
        Val::Str(s) => match item {
            Val::Str(sub) => Ok(s.contains(sub.as_str())),
            other => Err(type_error(format!(
                "'in <string>' requires string as left operand, not {}",
                other.type_name()
            ))),
        },
        Val::List(items) => Ok(items.borrow().iter().any(|v| py_eq(v, item))),
        Val::Tuple(items) => Ok(items.iter().any(|v| py_eq(v, item))),
        Val::Dict(dict) => dict.borrow().contains(item),
        Val::Range(range) => Ok(match item {
            Val::Int(i) => range.contains(*i),
            Val::Bool(b) => range.contains(*b as i64),
            Val::Float(f) if f.fract() == 0.0 => range.contains(*f as i64),
            _ => false,
        }),
        other => Err(type_error(format!(
            "argument of type '{}' is not iterable",
            other.type_name()
        ))),
    }
}

/* ===================== Subscripts ===================== */

fn normalize(index: i64, len: usize) -> Option<usize> {
    let len = len as i64;
    let idx = if index < 0 { index + len } else { index };
    (0..len).contains(&idx).then_some(idx as usize)
}

fn sequence_index(index: &Val, kind: &str) -> EvalResult<i64> {
    match index {
        Val::Int(i) => Ok(*i),
        Val::Bool(b) => Ok(*b as i64),
        other => Err(type_error(format!(
            "{} indices must be integers or slices, not {}",
            kind,
            other.type_name()
        ))),
    }
}

/// `container[index]`
pub fn getitem(container: &Val, index: &Val) -> EvalResult {
    match container {
        Val::List(items) => {
            let items = items.borrow();
            let idx = sequence_index(index, "list")?;
            normalize(idx, items.len())
                .map(|i| items[i].clone())
                .ok_or_else(|| index_error("list index out of range"))
        }
        Val::Tuple(items) => {
            let idx = sequence_index(index, "tuple")?;
            normalize(idx, items.len())
                .map(|i| items[i].clone())
                .ok_or_else(|| index_error("tuple index out of range"))
        }
        Val::Str(s) => {
            let idx = match index {
                Val::Int(i) => *i,
                Val::Bool(b) => *b as i64,
                other => {
                    return Err(type_error(format!(
                        "string indices must be integers, not '{}'",
                        other.type_name()
                    )))
                }
            };
            normalize(idx, s.chars().count())
                .and_then(|i| s.chars().nth(i))
                .map(|c| Val::Str(c.to_string()))
                .ok_or_else(|| index_error("string index out of range"))
        }
        Val::Dict(dict) => dict
            .borrow()
            .get(index)?
            .ok_or_else(|| key_error(index.clone())),
        Val::Range(range) => {
            let idx = sequence_index(index, "range")? as i128;
            let count = range.count();
            let idx = if idx < 0 { idx + count } else { idx };
            if (0..count).contains(&idx) {
                Ok(Val::Int(range.get(idx)))
            } else {
                Err(index_error("range object index out of range"))
            }
        }
        other => Err(type_error(format!(
            "'{}' object is not subscriptable",
            other.type_name()
        ))),
    }
}

/// Positions selected by `[lower:upper:step]` on a sequence of `len` items
pub fn slice_indices(
    len: usize,
    lower: Option<i64>,
    upper: Option<i64>,
    step: Option<i64>,
) -> EvalResult<Vec<usize>> {
    let step = step.unwrap_or(1);
    if step == 0 {
        return Err(value_error("slice step cannot be zero"));
    }
    let len = len as i64;
    let bound = |v: i64, lo: i64, hi: i64| {
        let v = if v < 0 { v.saturating_add(len) } else { v };
        v.clamp(lo, hi)
    };

    let mut out = Vec::new();
    if step > 0 {
        let start = lower.map_or(0, |v| bound(v, 0, len));
        let stop = upper.map_or(len, |v| bound(v, 0, len));
        let mut i = start;
        while i < stop {
            out.push(i as usize);
            i = i.saturating_add(step);
        }
    } else {
        let start = lower.map_or(len - 1, |v| bound(v, -1, len - 1));
        let stop = upper.map_or(-1, |v| bound(v, -1, len - 1));
        let mut i = start;
        while i > stop {
            out.push(i as usize);
            i = i.saturating_add(step);
        }
    }
    Ok(out)
}

/// Slicing a range yields another range, computed without materializing items
fn slice_range(
    range: &RangeVal,
    lower: Option<i64>,
    upper: Option<i64>,
    step: Option<i64>,
) -> EvalResult {
    let step = step.unwrap_or(1) as i128;
    if step == 0 {
        return Err(value_error("slice step cannot be zero"));
    }
    let len = range.count();
    let bound = |v: i64, lo: i128, hi: i128| {
        let v = v as i128;
        let v = if v < 0 { v + len } else { v };
        v.clamp(lo, hi)
    };
    let (first, last) = if step > 0 {
        (lower.map_or(0, |v| bound(v, 0, len)), upper.map_or(len, |v| bound(v, 0, len)))
    } else {
        (
            lower.map_or(len - 1, |v| bound(v, -1, len - 1)),
            upper.map_or(-1, |v| bound(v, -1, len - 1)),
        )
    };
    let at = |idx: i128| range.start as i128 + range.step as i128 * idx;
    let fits = |v: i128| i64::try_from(v).map_err(|_| overflow_error());
    Ok(Val::Range(RangeVal {
        start: at(first).clamp(i64::MIN as i128, i64::MAX as i128) as i64,
        stop: at(last).clamp(i64::MIN as i128, i64::MAX as i128) as i64,
        step: fits(range.step as i128 * step)?,
    }))
}

/// `container[lower:upper:step]`
pub fn get_slice(
    container: &Val,
    lower: Option<i64>,
    upper: Option<i64>,
    step: Option<i64>,
) -> EvalResult {
    match container {
        Val::List(items) => {
            let items = items.borrow();
            let picked = slice_indices(items.len(), lower, upper, step)?;
            Ok(Val::list(picked.into_iter().map(|i| items[i].clone()).collect()))
        }
        Val::Tuple(items) => {
            let picked = slice_indices(items.len(), lower, upper, step)?;
            Ok(Val::tuple(picked.into_iter().map(|i| items[i].clone()).collect()))
        }
        Val::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            let picked = slice_indices(chars.len(), lower, upper, step)?;
            Ok(Val::Str(picked.into_iter().map(|i| chars[i]).collect()))
        }
        Val::Range(range) => slice_range(range, lower, upper, step),
        other => Err(type_error(format!(
            "'{}' object is not subscriptable",
            other.type_name()
        ))),
    }
}

/// `container[index] = value`
pub fn setitem(container: &Val, index: &Val, value: Val) -> EvalResult<()> {
    match container {
        Val::List(items) => {
            let mut items = items.borrow_mut();
            let idx = sequence_index(index, "list")?;
            let slot = normalize(idx, items.len())
                .ok_or_else(|| index_error("list assignment index out of range"))?;
            items[slot] = value;
            Ok(())
        }
        Val::Dict(dict) => dict.borrow_mut().insert(index.clone(), value),
        other => Err(type_error(format!(
            "'{}' object does not support item assignment",
            other.type_name()
        ))),
    }
}

/// `container[lower:upper:step] = value`
pub fn set_slice(
    container: &Val,
    lower: Option<i64>,
    upper: Option<i64>,
    step: Option<i64>,
    value: &Val,
) -> EvalResult<()> {
    let Val::List(items) = container else {
        return Err(type_error(format!(
            "'{}' object does not support item assignment",
            container.type_name()
        )));
    };
    let replacement = collect(value)?;
    let mut items = items.borrow_mut();

    if step.unwrap_or(1) == 1 {
        let picked = slice_indices(items.len(), lower, upper, None)?;
        let start = picked.first().copied().unwrap_or_else(|| {
            let len = items.len() as i64;
            let v = lower.unwrap_or(0);
            let v = if v < 0 { v.saturating_add(len) } else { v };
            v.clamp(0, len) as usize
        });
        let end = start + picked.len();
        items.splice(start..end, replacement);
        return Ok(());
    }

    let picked = slice_indices(items.len(), lower, upper, step)?;
    if picked.len() != replacement.len() {
        return Err(value_error(format!(
            "attempt to assign sequence of size {} to extended slice of size {}",
            replacement.len(),
            picked.len()
        )));
    }
    for (slot, item) in picked.into_iter().zip(replacement) {
        items[slot] = item;
    }
    Ok(())
}

/// `del container[index]`
pub fn delitem(container: &Val, index: &Val) -> EvalResult<()> {
    match container {
        Val::List(items) => {
            let mut items = items.borrow_mut();
            let idx = sequence_index(index, "list")?;
            let slot = normalize(idx, items.len())
                .ok_or_else(|| index_error("list assignment index out of range"))?;
            items.remove(slot);
            Ok(())
        }
        Val::Dict(dict) => match dict.borrow_mut().remove(index)? {
            Some(_) => Ok(()),
            None => Err(key_error(index.clone())),
        },
        other => Err(type_error(format!(
            "'{}' object doesn't support item deletion",
            other.type_name()
        ))),
    }
}

/// `del items[lower:upper:step]`
pub fn del_slice(
    container: &Val,
    lower: Option<i64>,
    upper: Option<i64>,
    step: Option<i64>,
) -> EvalResult<()> {
    let Val::List(items) = container else {
        return Err(type_error(format!(
            "'{}' object doesn't support item deletion",
            container.type_name()
        )));
    };
    let mut items = items.borrow_mut();
    let mut picked = slice_indices(items.len(), lower, upper, step)?;
    picked.sort_unstable();
    for slot in picked.into_iter().rev() {
        items.remove(slot);
    }
    Ok(())
}
