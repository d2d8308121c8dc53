//! Methods of built-in types
//!
//! `value.name` on a str, list, dict or tuple yields a bound method when
//! `name` is listed here; calling it dispatches through [`call_method`].

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::OnceLock;

use regex::Regex;

use super::format::{py_repr, str_format};
use super::functions::{mapping_items, sort_values};
use super::CallArgs;
use crate::interpreter::errors::{
    attribute_error, index_error, key_error, type_error, value_error, EvalResult,
};
use crate::interpreter::executor::operators::{as_index, py_eq, slice_indices};
use crate::interpreter::executor::Interpreter;
use crate::interpreter::types::{Dict, Val};

const STR_METHODS: &[&str] = &[
    "upper", "lower", "strip", "lstrip", "rstrip", "split", "rsplit", "join", "replace",
    "startswith", "endswith", "find", "rfind", "index", "count", "format", "title",
    "capitalize", "isdigit", "isalpha", "isalnum", "isspace", "isupper", "islower", "zfill",
    "center", "ljust", "rjust", "splitlines", "partition",
];

const LIST_METHODS: &[&str] = &[
    "append", "extend", "insert", "pop", "remove", "index", "count", "sort", "reverse", "copy",
    "clear",
];

const DICT_METHODS: &[&str] = &[
    "get", "keys", "values", "items", "pop", "popitem", "setdefault", "update", "copy", "clear",
];

const TUPLE_METHODS: &[&str] = &["count", "index"];

pub fn has_method(receiver: &Val, name: &str) -> bool {
    let table = match receiver {
        Val::Str(_) => STR_METHODS,
        Val::List(_) => LIST_METHODS,
        Val::Dict(_) => DICT_METHODS,
        Val::Tuple(_) => TUPLE_METHODS,
        _ => return false,
    };
    table.contains(&name)
}

/// Call `receiver.name(*args)`
pub fn call_method(
    interp: &mut Interpreter,
    receiver: &Val,
    name: &str,
    args: CallArgs,
) -> EvalResult {
    match receiver {
        Val::Str(s) => str_method(interp, s, name, args),
        Val::List(items) => list_method(interp, items, name, args),
        Val::Dict(dict) => dict_method(interp, dict, name, args),
        Val::Tuple(items) => tuple_method(items, name, args),
        other => Err(attribute_error(other, name)),
    }
}

fn qualified(owner: &str, name: &str) -> String {
    format!("{}.{}", owner, name)
}

fn no_args(owner: &str, name: &str, args: CallArgs) -> EvalResult<()> {
    args.finish_between(&qualified(owner, name), 0, 0)?;
    Ok(())
}

fn str_arg(value: &Val, what: &str) -> EvalResult<String> {
    match value {
        Val::Str(s) => Ok(s.clone()),
        other => Err(type_error(format!(
            "{} must be str, not {}",
            what,
            other.type_name()
        ))),
    }
}

/// Optional `chars` / `sep` argument where `None` means the default
fn optional_str(value: Option<&Val>, what: &str) -> EvalResult<Option<String>> {
    match value {
        None | Some(Val::None) => Ok(None),
        Some(other) => str_arg(other, what).map(Some),
    }
}

/* ===================== str ===================== */

fn str_method(interp: &mut Interpreter, s: &str, name: &str, mut args: CallArgs) -> EvalResult {
    let owner = "str";
    match name {
        "upper" => {
            no_args(owner, name, args)?;
            Ok(Val::Str(s.to_uppercase()))
        }
        "lower" => {
            no_args(owner, name, args)?;
            Ok(Val::Str(s.to_lowercase()))
        }
        "title" => {
            no_args(owner, name, args)?;
            Ok(Val::Str(title_case(s)))
        }
        "capitalize" => {
            no_args(owner, name, args)?;
            let mut chars = s.chars();
            let out = match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.as_str().to_lowercase().chars()).collect(),
                None => String::new(),
            };
            Ok(Val::Str(out))
        }
        "isdigit" | "isalpha" | "isalnum" | "isspace" | "isupper" | "islower" => {
            no_args(owner, name, args)?;
            Ok(Val::Bool(char_class(s, name)))
        }
        "strip" | "lstrip" | "rstrip" => {
            let values = args.finish_between(&qualified(owner, name), 0, 1)?;
            let chars = optional_str(values.first(), "strip arg")?;
            let matches = |c: char| match &chars {
                Some(set) => set.contains(c),
                None => is_space(c),
            };
            let out = match name {
                "strip" => s.trim_matches(matches),
                "lstrip" => s.trim_start_matches(matches),
                _ => s.trim_end_matches(matches),
            };
            Ok(Val::Str(out.to_string()))
        }
        "split" | "rsplit" => {
            let sep_kw = args.take_keyword("sep");
            let maxsplit_kw = args.take_keyword("maxsplit");
            let values = args.finish_between(&qualified(owner, name), 0, 2)?;
            let sep = optional_str(values.first().or(sep_kw.as_ref()), "sep")?;
            let maxsplit = match values.get(1).or(maxsplit_kw.as_ref()) {
                Some(n) => as_index(n)?,
                None => -1,
            };
            let parts = split(s, sep.as_deref(), maxsplit, name == "rsplit")?;
            Ok(Val::list(parts.into_iter().map(Val::Str).collect()))
        }
        "splitlines" => {
            let keepends = args.take_keyword("keepends");
            let values = args.finish_between(&qualified(owner, name), 0, 1)?;
            let keepends = values.first().or(keepends.as_ref()).map_or(false, Val::is_truthy);
            Ok(Val::list(
                split_lines(s, keepends).into_iter().map(Val::Str).collect(),
            ))
        }
        "partition" => {
            let [sep] = exactly(owner, name, args)?;
            let sep = str_arg(&sep, "sep")?;
            if sep.is_empty() {
                return Err(value_error("empty separator"));
            }
            let parts = match s.split_once(sep.as_str()) {
                Some((head, tail)) => [head.to_string(), sep, tail.to_string()],
                None => [s.to_string(), String::new(), String::new()],
            };
            Ok(Val::tuple(parts.into_iter().map(Val::Str).collect()))
        }
        "join" => {
            let [iterable] = exactly(owner, name, args)?;
            let mut pieces = Vec::new();
            for (idx, item) in interp.collect(&iterable)?.into_iter().enumerate() {
                match item {
                    Val::Str(piece) => pieces.push(piece),
                    other => {
                        return Err(type_error(format!(
                            "sequence item {}: expected str instance, {} found",
                            idx,
                            other.type_name()
                        )))
                    }
                }
            }
            Ok(Val::Str(pieces.join(s)))
        }
        "replace" => {
            let values = args.finish_between(&qualified(owner, name), 2, 3)?;
            let old = str_arg(&values[0], "replace() argument 1")?;
            let new = str_arg(&values[1], "replace() argument 2")?;
            let count = match values.get(2) {
                Some(n) => as_index(n)?,
                None => -1,
            };
            let out = if count < 0 {
                s.replace(&old, &new)
            } else {
                s.replacen(&old, &new, count as usize)
            };
            Ok(Val::Str(out))
        }
        "startswith" | "endswith" => {
            let [affix] = exactly(owner, name, args)?;
            let candidates = match &affix {
                Val::Tuple(items) => items.iter().map(|v| str_arg(v, "tuple item")).collect::<EvalResult<Vec<_>>>()?,
                Val::Str(text) => vec![text.clone()],
                other => {
                    return Err(type_error(format!(
                        "{} first arg must be str or a tuple of str, not {}",
                        name,
                        other.type_name()
                    )))
                }
            };
            let hit = candidates.iter().any(|c| {
                if name == "startswith" {
                    s.starts_with(c.as_str())
                } else {
                    s.ends_with(c.as_str())
                }
            });
            Ok(Val::Bool(hit))
        }
        "find" | "rfind" | "index" | "count" => {
            let values = args.finish_between(&qualified(owner, name), 1, 3)?;
            let needle: Vec<char> = str_arg(&values[0], "must be str")?.chars().collect();
            let hay: Vec<char> = s.chars().collect();
            let bound = |idx: usize| -> EvalResult<Option<i64>> {
                match values.get(idx) {
                    None | Some(Val::None) => Ok(None),
                    Some(v) => as_index(v).map(Some),
                }
            };
            let (start, end) = clamp_range(hay.len(), bound(1)?, bound(2)?);
            let window = if start <= end { &hay[start..end] } else { &hay[0..0] };

            if name == "count" {
                return Ok(Val::Int(count_chars(window, &needle, start > end) as i64));
            }
            let found = if start > end {
                None
            } else if name == "rfind" {
                rfind_chars(window, &needle)
            } else {
                find_chars(window, &needle)
            };
            match (found, name) {
                (Some(pos), _) => Ok(Val::Int((pos + start) as i64)),
                (None, "index") => Err(value_error("substring not found")),
                (None, _) => Ok(Val::Int(-1)),
            }
        }
        "format" => {
            let positional = std::mem::take(&mut args.positional);
            Ok(Val::Str(str_format(s, &positional, &args.keywords)?))
        }
        "zfill" => {
            let [width] = exactly(owner, name, args)?;
            let width = as_index(&width)?.max(0) as usize;
            let len = s.chars().count();
            if len >= width {
                return Ok(Val::Str(s.to_string()));
            }
            let zeros = "0".repeat(width - len);
            let out = match s.chars().next() {
                Some(sign @ ('+' | '-')) => format!("{}{}{}", sign, zeros, &s[1..]),
                _ => format!("{}{}", zeros, s),
            };
            Ok(Val::Str(out))
        }
        "center" | "ljust" | "rjust" => {
            let values = args.finish_between(&qualified(owner, name), 1, 2)?;
            let width = as_index(&values[0])?.max(0) as usize;
            let fill = match values.get(1) {
                Some(value) => {
                    let fill = str_arg(value, "fill character")?;
                    let mut chars = fill.chars();
                    match (chars.next(), chars.next()) {
                        (Some(c), None) => c,
                        _ => {
                            return Err(type_error(
                                "The fill character must be exactly one character long",
                            ))
                        }
                    }
                }
                None => ' ',
            };
            Ok(Val::Str(justify(s, name, width, fill)))
        }
        _ => Err(attribute_error(&Val::str(s), name)),
    }
}

fn exactly<const N: usize>(owner: &str, name: &str, args: CallArgs) -> EvalResult<[Val; N]> {
    let func = qualified(owner, name);
    let values = args.finish_between(&func, N, N)?;
    values
        .try_into()
        .map_err(|_| type_error(format!("{}() takes exactly {} arguments", func, N)))
}

fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_word = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

fn char_class(s: &str, name: &str) -> bool {
    if s.is_empty() {
        return false;
    }
    match name {
        "isdigit" => s.chars().all(is_digit),
        "isalpha" => s.chars().all(char::is_alphabetic),
        "isalnum" => s.chars().all(char::is_alphanumeric),
        "isspace" => s.chars().all(is_space),
        "isupper" => s.chars().any(char::is_uppercase) && !s.chars().any(char::is_lowercase),
        _ => s.chars().any(char::is_lowercase) && !s.chars().any(char::is_uppercase),
    }
}

/// `str.isspace` for one character
pub fn is_space(c: char) -> bool {
    c.is_whitespace() || ('\x1c'..='\x1f').contains(&c)
}

/// Characters with a digit value that are not decimal digits
const DIGIT_RANGES: &[(char, char)] = &[
    ('\u{b2}', '\u{b3}'),
    ('\u{b9}', '\u{b9}'),
    ('\u{1369}', '\u{1371}'),
    ('\u{19da}', '\u{19da}'),
    ('\u{2070}', '\u{2070}'),
    ('\u{2074}', '\u{2079}'),
    ('\u{2080}', '\u{2089}'),
    ('\u{2460}', '\u{2468}'),
    ('\u{2474}', '\u{247c}'),
    ('\u{2488}', '\u{2490}'),
    ('\u{24ea}', '\u{24ea}'),
    ('\u{24f5}', '\u{24fd}'),
    ('\u{24ff}', '\u{24ff}'),
    ('\u{2776}', '\u{277e}'),
    ('\u{2780}', '\u{2788}'),
    ('\u{278a}', '\u{2792}'),
    ('\u{10a40}', '\u{10a43}'),
    ('\u{10e60}', '\u{10e68}'),
    ('\u{11052}', '\u{1105a}'),
    ('\u{1f100}', '\u{1f10a}'),
];

/// `str.isdigit` for one character: decimal digits in any script, plus
/// superscripts, subscripts and enclosed digits
pub fn is_digit(c: char) -> bool {
    static DECIMAL: OnceLock<Option<Regex>> = OnceLock::new();
    if c.is_ascii() {
        return c.is_ascii_digit();
    }
    if DIGIT_RANGES.iter().any(|(lo, hi)| (*lo..=*hi).contains(&c)) {
        return true;
    }
    DECIMAL
        .get_or_init(|| Regex::new(r"^\p{Nd}$").ok())
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(c.encode_utf8(&mut [0; 4])))
}

fn split(s: &str, sep: Option<&str>, maxsplit: i64, from_right: bool) -> EvalResult<Vec<String>> {
    let limit = usize::try_from(maxsplit).ok();
    let Some(sep) = sep else {
        return Ok(split_whitespace(s, limit, from_right));
    };
    if sep.is_empty() {
        return Err(value_error("empty separator"));
    }
    let parts: Vec<String> = match (limit, from_right) {
        (None, _) => s.split(sep).map(str::to_string).collect(),
        (Some(n), false) => s.splitn(n + 1, sep).map(str::to_string).collect(),
        (Some(n), true) => {
            let mut parts: Vec<String> = s.rsplitn(n + 1, sep).map(str::to_string).collect();
            parts.reverse();
            parts
        }
    };
    Ok(parts)
}

/// Split on runs of whitespace, ignoring leading and trailing whitespace;
/// the unsplit remainder keeps its own whitespace
fn split_whitespace(s: &str, limit: Option<usize>, from_right: bool) -> Vec<String> {
    let mut out = Vec::new();
    if from_right {
        let mut rest = s.trim_end_matches(is_space);
        while !rest.is_empty() {
            if limit == Some(out.len()) {
                out.push(rest.to_string());
                break;
            }
            let start = rest
                .char_indices()
                .rev()
                .find(|(_, c)| is_space(*c))
                .map_or(0, |(idx, c)| idx + c.len_utf8());
            out.push(rest[start..].to_string());
            rest = rest[..start].trim_end_matches(is_space);
        }
        out.reverse();
    } else {
        let mut rest = s.trim_start_matches(is_space);
        while !rest.is_empty() {
            if limit == Some(out.len()) {
                out.push(rest.to_string());
                break;
            }
            let end = rest.find(is_space).unwrap_or(rest.len());
            out.push(rest[..end].to_string());
            rest = rest[end..].trim_start_matches(is_space);
        }
    }
    out
}

fn split_lines(s: &str, keepends: bool) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\n' || c == '\r' {
            let mut ending = c.to_string();
            if c == '\r' && chars.peek() == Some(&'\n') {
                chars.next();
                ending.push('\n');
            }
            if keepends {
                current.push_str(&ending);
            }
            out.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

/// Python slice-style clamping of optional `start`/`end` char positions
fn clamp_range(len: usize, start: Option<i64>, end: Option<i64>) -> (usize, usize) {
    let len = len as i64;
    let fix = |v: i64| {
        let v = if v < 0 { v.saturating_add(len) } else { v };
        v.clamp(0, len) as usize
    };
    let start = start.map_or(0, fix);
    let end = end.map_or(len as usize, fix);
    (start, end)
}

fn find_chars(hay: &[char], needle: &[char]) -> Option<usize> {
    if needle.len() > hay.len() {
        return None;
    }
    (0..=hay.len() - needle.len()).find(|&i| &hay[i..i + needle.len()] == needle)
}

fn rfind_chars(hay: &[char], needle: &[char]) -> Option<usize> {
    if needle.len() > hay.len() {
        return None;
    }
    (0..=hay.len() - needle.len())
        .rev()
        .find(|&i| &hay[i..i + needle.len()] == needle)
}

fn count_chars(hay: &[char], needle: &[char], empty_range: bool) -> usize {
    if empty_range {
        return 0;
    }
    if needle.is_empty() {
        return hay.len() + 1;
    }
    let mut count = 0;
    let mut i = 0;
    while i + needle.len() <= hay.len() {
        if &hay[i..i + needle.len()] == needle {
            count += 1;
            i += needle.len();
        } else {
            i += 1;
        }
    }
    count
}

fn justify(s: &str, name: &str, width: usize, fill: char) -> String {
    let len = s.chars().count();
    if len >= width {
        return s.to_string();
    }
    let pad = width - len;
    let (left, right) = match name {
        "ljust" => (0, pad),
        "rjust" => (pad, 0),
        _ => {
            let left = pad / 2 + (pad & width & 1);
            (left, pad - left)
        }
    };
    let fill = |n: usize| std::iter::repeat(fill).take(n).collect::<String>();
    format!("{}{}{}", fill(left), s, fill(right))
}

/* ===================== list ===================== */

fn list_method(
    interp: &mut Interpreter,
    items: &Rc<RefCell<Vec<Val>>>,
    name: &str,
    mut args: CallArgs,
) -> EvalResult {
    let owner = "list";
    match name {
        "append" => {
            let [value] = exactly(owner, name, args)?;
            items.borrow_mut().push(value);
            Ok(Val::None)
        }
        "extend" => {
            let [iterable] = exactly(owner, name, args)?;
            let extra = interp.collect(&iterable)?;
            items.borrow_mut().extend(extra);
            Ok(Val::None)
        }
        "insert" => {
            let [index, value] = exactly(owner, name, args)?;
            let index = as_index(&index)?;
            let mut items = items.borrow_mut();
            let len = items.len() as i64;
            let slot = if index < 0 {
                index.saturating_add(len).max(0)
            } else {
                index.min(len)
            };
            items.insert(slot as usize, value);
            Ok(Val::None)
        }
        "pop" => {
            let values = args.finish_between(&qualified(owner, name), 0, 1)?;
            let index = match values.first() {
                Some(v) => as_index(v)?,
                None => -1,
            };
            let mut items = items.borrow_mut();
            if items.is_empty() {
                return Err(index_error("pop from empty list"));
            }
            let len = items.len() as i64;
            let slot = if index < 0 { index + len } else { index };
            if !(0..len).contains(&slot) {
                return Err(index_error("pop index out of range"));
            }
            Ok(items.remove(slot as usize))
        }
        "remove" => {
            let [value] = exactly(owner, name, args)?;
            let position = items.borrow().iter().position(|item| py_eq(item, &value));
            match position {
                Some(idx) => {
                    items.borrow_mut().remove(idx);
                    Ok(Val::None)
                }
                None => Err(value_error("list.remove(x): x not in list")),
            }
        }
        "index" => {
            let values = args.finish_between(&qualified(owner, name), 1, 3)?;
            let snapshot = items.borrow().clone();
            match sequence_index(&snapshot, &values)? {
                Some(idx) => Ok(Val::Int(idx as i64)),
                None => Err(value_error(format!("{} is not in list", py_repr(&values[0])))),
            }
        }
        "count" => {
            let [value] = exactly(owner, name, args)?;
            let count = items.borrow().iter().filter(|item| py_eq(item, &value)).count();
            Ok(Val::Int(count as i64))
        }
        "sort" => {
            let key = args.take_keyword("key").filter(|k| !matches!(k, Val::None));
            let reverse = args.take_keyword("reverse").map_or(false, |r| r.is_truthy());
            no_args(owner, name, args)?;
            // Key functions may touch the list, so sort a copy
            let mut sorted = items.borrow().clone();
            sort_values(interp, &mut sorted, key, reverse)?;
            *items.borrow_mut() = sorted;
            Ok(Val::None)
        }
        "reverse" => {
            no_args(owner, name, args)?;
            items.borrow_mut().reverse();
            Ok(Val::None)
        }
        "copy" => {
            no_args(owner, name, args)?;
            Ok(Val::list(items.borrow().clone()))
        }
        "clear" => {
            no_args(owner, name, args)?;
            items.borrow_mut().clear();
            Ok(Val::None)
        }
        _ => Err(attribute_error(&Val::List(items.clone()), name)),
    }
}

/// Position of `values[0]` within the optional `values[1]..values[2]` range
fn sequence_index(items: &[Val], values: &[Val]) -> EvalResult<Option<usize>> {
    let bound = |idx: usize| -> EvalResult<Option<i64>> {
        values.get(idx).map(as_index).transpose()
    };
    let candidates = slice_indices(items.len(), bound(1)?, bound(2)?, None)?;
    Ok(candidates.into_iter().find(|&idx| py_eq(&items[idx], &values[0])))
}

/* ===================== tuple ===================== */

fn tuple_method(items: &Rc<Vec<Val>>, name: &str, args: CallArgs) -> EvalResult {
    let owner = "tuple";
    match name {
        "count" => {
            let [value] = exactly(owner, name, args)?;
            Ok(Val::Int(items.iter().filter(|item| py_eq(item, &value)).count() as i64))
        }
        "index" => {
            let values = args.finish_between(&qualified(owner, name), 1, 3)?;
            match sequence_index(items, &values)? {
                Some(idx) => Ok(Val::Int(idx as i64)),
                None => Err(value_error("tuple.index(x): x not in tuple")),
            }
        }
        _ => Err(attribute_error(&Val::Tuple(items.clone()), name)),
    }
}

/* ===================== dict ===================== */

fn dict_method(
    interp: &mut Interpreter,
    dict: &Rc<RefCell<Dict>>,
    name: &str,
    mut args: CallArgs,
) -> EvalResult {
    let owner = "dict";
    match name {
        "get" => {
            let values = args.finish_between(&qualified(owner, name), 1, 2)?;
            let found = dict.borrow().get(&values[0])?;
            Ok(found.unwrap_or_else(|| values.get(1).cloned().unwrap_or(Val::None)))
        }
        "keys" => {
            no_args(owner, name, args)?;
            Ok(Val::list(dict.borrow().keys()))
        }
        "values" => {
            no_args(owner, name, args)?;
            Ok(Val::list(dict.borrow().values()))
        }
        "items" => {
            no_args(owner, name, args)?;
            let items = dict.borrow().items();
            Ok(Val::list(
                items.into_iter().map(|(k, v)| Val::tuple(vec![k, v])).collect(),
            ))
        }
        "pop" => {
            let values = args.finish_between(&qualified(owner, name), 1, 2)?;
            let removed = dict.borrow_mut().remove(&values[0])?;
            match (removed, values.get(1)) {
                (Some(value), _) => Ok(value),
                (None, Some(default)) => Ok(default.clone()),
                (None, None) => Err(key_error(values[0].clone())),
            }
        }
        "popitem" => {
            no_args(owner, name, args)?;
            let last = dict.borrow_mut().pop_last();
            match last {
                Some((key, value)) => Ok(Val::tuple(vec![key, value])),
                None => Err(key_error(Val::str("popitem(): dictionary is empty"))),
            }
        }
        "setdefault" => {
            let values = args.finish_between(&qualified(owner, name), 1, 2)?;
            let existing = dict.borrow().get(&values[0])?;
            match existing {
                Some(value) => Ok(value),
                None => {
                    let default = values.get(1).cloned().unwrap_or(Val::None);
                    dict.borrow_mut().insert(values[0].clone(), default.clone())?;
                    Ok(default)
                }
            }
        }
        "update" => {
            let keywords = std::mem::take(&mut args.keywords);
            let values = args.finish_between(&qualified(owner, name), 0, 1)?;
            let mut pairs = match values.first() {
                Some(source) => mapping_items(interp, source)?,
                None => Vec::new(),
            };
            pairs.extend(keywords.into_iter().map(|(k, v)| (Val::Str(k), v)));
            let mut dict = dict.borrow_mut();
            for (key, value) in pairs {
                dict.insert(key, value)?;
            }
            Ok(Val::None)
        }
        "copy" => {
            no_args(owner, name, args)?;
            Ok(Val::dict(dict.borrow().clone()))
        }
        "clear" => {
            no_args(owner, name, args)?;
            dict.borrow_mut().clear();
            Ok(Val::None)
        }
        _ => Err(attribute_error(&Val::Dict(dict.clone()), name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_split_variants() {
        assert_eq!(split("  a b  c ", None, -1, false).unwrap(), strings(&["a", "b", "c"]));
        assert_eq!(split("a b  c  ", None, 1, false).unwrap(), strings(&["a", "b  c  "]));
        assert_eq!(split("a,b,,c", Some(","), -1, false).unwrap(), strings(&["a", "b", "", "c"]));
        assert_eq!(split("a,b,c", Some(","), 1, true).unwrap(), strings(&["a,b", "c"]));
        assert_eq!(split("  a b c", None, 1, true).unwrap(), strings(&["  a b", "c"]));
        assert!(split("abc", Some(""), -1, false).is_err());
    }

    #[test]
    fn test_split_lines() {
        assert_eq!(split_lines("a\nb\r\nc", false), strings(&["a", "b", "c"]));
        assert_eq!(split_lines("a\n", true), strings(&["a\n"]));
        assert!(split_lines("", false).is_empty());
    }

    #[test]
    fn test_title_and_char_classes() {
        assert_eq!(title_case("hello wORLD 2nd"), "Hello World 2Nd");
        assert!(char_class("123", "isdigit"));
        assert!(!char_class("", "isdigit"));
        assert!(char_class("\u{661}\u{662}", "isdigit"));
        assert!(char_class("\u{b2}", "isdigit"));
        assert!(!char_class("\u{bd}", "isdigit"));
        assert!(char_class(" \t\x1c\x1f\u{a0}", "isspace"));
        assert!(char_class("ABC1", "isupper"));
        assert!(!char_class("123", "islower"));
    }

    #[test]
    fn test_find_and_count() {
        let hay: Vec<char> = "banana".chars().collect();
        let na: Vec<char> = "na".chars().collect();
        assert_eq!(find_chars(&hay, &na), Some(2));
        assert_eq!(rfind_chars(&hay, &na), Some(4));
        assert_eq!(count_chars(&hay, &na, false), 2);
        assert_eq!(count_chars(&hay, &[], false), 7);
    }

    #[test]
    fn test_justify() {
        assert_eq!(justify("ab", "center", 5, '*'), "**ab*");
        assert_eq!(justify("abc", "center", 6, ' '), " abc  ");
        assert_eq!(justify("x", "rjust", 3, '0'), "00x");
        assert_eq!(justify("toolong", "ljust", 3, ' '), "toolong");
    }

    #[test]
    fn test_has_method_tables() {
        assert!(has_method(&Val::str(""), "upper"));
        assert!(has_method(&Val::list(vec![]), "append"));
        assert!(!has_method(&Val::list(vec![]), "upper"));
        assert!(!has_method(&Val::Int(1), "bit_length"));
    }
}
