//! Text rendering of values
//!
//! `str()`/`repr()` forms, the format-spec mini-language used by f-strings
//! and `format()`, printf-style `%` formatting, and `str.format`.

use std::rc::Rc;
use std::sync::OnceLock;

use regex::Regex;

use crate::interpreter::errors::{
    key_error, recursion_error, type_error, value_error, EvalResult, ExcKind, Exception,
};
use crate::interpreter::executor::expressions::get_attribute;
use crate::interpreter::executor::operators::getitem;
use crate::interpreter::types::Val;

/* ===================== str / repr ===================== */

/// Containers nested deeper than this cannot be rendered
const MAX_REPR_DEPTH: usize = 1000;

/// `str(val)`
pub fn try_str(val: &Val) -> EvalResult<String> {
    match val {
        Val::Str(s) => Ok(s.clone()),
        Val::Exception(exc) => Ok(exc.message()),
        other => try_repr(other),
    }
}

/// `repr(val)`
pub fn try_repr(val: &Val) -> EvalResult<String> {
    let mut out = String::new();
    repr_into(val, &mut out, &mut Vec::new(), 0)?;
    Ok(out)
}

/// `str(val)` for messages; over-deep structures render as `...`
pub fn py_str(val: &Val) -> String {
    try_str(val).unwrap_or_else(|_| "...".to_string())
}

/// `repr(val)` for messages; over-deep structures render as `...`
pub fn py_repr(val: &Val) -> String {
    try_repr(val).unwrap_or_else(|_| "...".to_string())
}

// `seen` holds the containers currently being rendered, so a list that
// contains itself prints as `[...]`.
fn repr_into(val: &Val, out: &mut String, seen: &mut Vec<usize>, depth: usize) -> EvalResult<()> {
    if depth > MAX_REPR_DEPTH {
        return Err(recursion_error(
            "maximum recursion depth exceeded while getting the repr of an object",
        ));
    }
    match val {
        Val::None => out.push_str("None"),
        Val::Bool(true) => out.push_str("True"),
        Val::Bool(false) => out.push_str("False"),
        Val::Int(i) => out.push_str(&i.to_string()),
        Val::Float(f) => out.push_str(&float_repr(*f)),
        Val::Str(s) => out.push_str(&str_repr(s)),
        Val::List(items) => {
            let id = Rc::as_ptr(items) as usize;
            if seen.contains(&id) {
                out.push_str("[...]");
                return Ok(());
            }
            seen.push(id);
            out.push('[');
            let joined = join_into(&items.borrow(), out, seen, depth + 1);
            seen.pop();
            joined?;
            out.push(']');
        }
        Val::Tuple(items) => {
            out.push('(');
            join_into(items, out, seen, depth + 1)?;
            if items.len() == 1 {
                out.push(',');
            }
            out.push(')');
        }
        Val::Dict(dict) => {
            let id = Rc::as_ptr(dict) as usize;
            if seen.contains(&id) {
                out.push_str("{...}");
                return Ok(());
            }
            seen.push(id);
            out.push('{');
            let items = dict.borrow().items();
            let joined = items.iter().enumerate().try_for_each(|(i, (key, value))| {
                if i > 0 {
                    out.push_str(", ");
                }
                repr_into(key, out, seen, depth + 1)?;
                out.push_str(": ");
                repr_into(value, out, seen, depth + 1)
            });
            seen.pop();
            joined?;
            out.push('}');
        }
        Val::Range(r) if r.step == 1 => out.push_str(&format!("range({}, {})", r.start, r.stop)),
        Val::Range(r) => out.push_str(&format!("range({}, {}, {})", r.start, r.stop, r.step)),
        Val::Iter(object) => out.push_str(&format!("<{} object>", object.name())),
        Val::Function(func) => out.push_str(&format!("<function {}>", func.def.name)),
        Val::Builtin(builtin) => out.push_str(&format!("<built-in function {}>", builtin.name())),
        Val::Method(method) => out.push_str(&format!(
            "<built-in method {} of {} object>",
            method.name,
            method.receiver.type_name()
        )),
        Val::Type(ty) => out.push_str(&format!("<class '{}'>", ty.name())),
        Val::Exception(exc) => out.push_str(&exc.repr()),
    }
    Ok(())
}

fn join_into(items: &[Val], out: &mut String, seen: &mut Vec<usize>, depth: usize) -> EvalResult<()> {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        repr_into(item, out, seen, depth)?;
    }
    Ok(())
}

/// Quote a string the way `repr` does: single quotes unless the text
/// contains a single quote and no double quote
pub fn str_repr(s: &str) -> String {
    let quote = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if is_printable(c) => out.push(c),
            c if (c as u32) <= 0xff => out.push_str(&format!("\\x{:02x}", c as u32)),
            c if (c as u32) <= 0xffff => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push_str(&format!("\\U{:08x}", c as u32)),
        }
    }
    out.push(quote);
    out
}

/// `str.isprintable` for one character: anything outside the Unicode
/// "Other" and "Separator" categories (space aside)
pub fn is_printable(c: char) -> bool {
    static NON_PRINTABLE: OnceLock<Option<Regex>> = OnceLock::new();
    if c == ' ' {
        return true;
    }
    if c.is_ascii() {
        return !c.is_ascii_control();
    }
    match NON_PRINTABLE.get_or_init(|| Regex::new(r"^[\p{C}\p{Z}]$").ok()) {
        Some(pattern) => !pattern.is_match(c.encode_utf8(&mut [0; 4])),
        None => !c.is_control() && !c.is_whitespace(),
    }
}

/// Shortest round-tripping float text, switching to exponent notation
/// outside `1e-4 <= |f| < 1e16`
pub fn float_repr(f: f64) -> String {
    if f.is_nan() {
        return "nan".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if f == 0.0 {
        return if f.is_sign_negative() { "-0.0" } else { "0.0" }.to_string();
    }

    let abs = f.abs();
    if !(1e-4..1e16).contains(&abs) {
        return exponent_form(&format!("{:e}", f));
    }
    let text = f.to_string();
    if text.contains('.') {
        text
    } else {
        format!("{}.0", text)
    }
}

/// Rewrite Rust's `1.5e-7` exponent style into `1.5e-07`
fn exponent_form(text: &str) -> String {
    match text.split_once(['e', 'E']) {
        Some((mantissa, exp)) => {
            let marker = if text.contains('E') { 'E' } else { 'e' };
            let exp: i32 = exp.parse().unwrap_or(0);
            let sign = if exp < 0 { '-' } else { '+' };
            format!("{}{}{}{:02}", mantissa, marker, sign, exp.abs())
        }
        None => text.to_string(),
    }
}

/* ===================== Format Spec ===================== */

/// Parsed `[[fill]align][sign][#][0][width][grouping][.precision][type]`
#[derive(Debug, Clone, Copy, PartialEq)]
struct FormatSpec {
    fill: char,
    align: Option<char>,
    sign: char,
    alternate: bool,
    zero: bool,
    width: usize,
    grouping: Option<char>,
    precision: Option<usize>,
    kind: Option<char>,
}

impl Default for FormatSpec {
    fn default() -> Self {
        FormatSpec {
            fill: ' ',
            align: None,
            sign: '-',
            alternate: false,
            zero: false,
            width: 0,
            grouping: None,
            precision: None,
            kind: None,
        }
    }
}

fn parse_spec(spec: &str, val: &Val) -> EvalResult<FormatSpec> {
    let chars: Vec<char> = spec.chars().collect();
    let mut parsed = FormatSpec::default();
    let mut i = 0;
    let is_align = |c: char| matches!(c, '<' | '>' | '=' | '^');

    if chars.len() >= 2 && is_align(chars[1]) {
        parsed.fill = chars[0];
        parsed.align = Some(chars[1]);
        i = 2;
    } else if !chars.is_empty() && is_align(chars[0]) {
        parsed.align = Some(chars[0]);
        i = 1;
    }
    if let Some(&c @ ('+' | '-' | ' ')) = chars.get(i) {
        parsed.sign = c;
        i += 1;
    }
    if chars.get(i) == Some(&'#') {
        parsed.alternate = true;
        i += 1;
    }
    if chars.get(i) == Some(&'0') {
        parsed.zero = true;
        i += 1;
    }
    let start = i;
    while chars.get(i).is_some_and(|c| c.is_ascii_digit()) {
        i += 1;
    }
    parsed.width = digits_value(&chars[start..i]);
    if let Some(&c @ (',' | '_')) = chars.get(i) {
        parsed.grouping = Some(c);
        i += 1;
    }
    if chars.get(i) == Some(&'.') {
        i += 1;
        let start = i;
        while chars.get(i).is_some_and(|c| c.is_ascii_digit()) {
            i += 1;
        }
        if start == i {
            return Err(value_error("Format specifier missing precision"));
        }
        parsed.precision = Some(digits_value(&chars[start..i]));
    }
    if let Some(&c) = chars.get(i) {
        parsed.kind = Some(c);
        i += 1;
    }
    if i != chars.len() {
        return Err(value_error(format!(
            "Invalid format specifier '{}' for object of type '{}'",
            spec,
            val.type_name()
        )));
    }

    Ok(parsed)
}

fn digits_value(digits: &[char]) -> usize {
    digits
        .iter()
        .filter_map(|c| c.to_digit(10))
        .fold(0usize, |acc, d| acc.saturating_mul(10).saturating_add(d as usize))
}

/// `format(val, spec)`
pub fn format_value(val: &Val, spec: &str) -> EvalResult<String> {
    if spec.is_empty() {
        return try_str(val);
    }
    let parsed = parse_spec(spec, val)?;

    match val {
        Val::Str(s) => format_str(s, &parsed),
        Val::Bool(b) if parsed.kind.is_none() => {
            let text = if *b { "True" } else { "False" };
            Ok(pad("", text, &parsed, '>'))
        }
        Val::Bool(b) => format_number(*b as i64, &parsed),
        Val::Int(i) => format_number(*i, &parsed),
        Val::Float(f) => format_float(*f, &parsed),
        other => Err(type_error(format!(
            "unsupported format string passed to {}.__format__",
            other.type_name()
        ))),
    }
}

fn unknown_code(kind: char, val_type: &str) -> Exception {
    value_error(format!(
        "Unknown format code '{}' for object of type '{}'",
        kind, val_type
    ))
}

fn format_str(s: &str, spec: &FormatSpec) -> EvalResult<String> {
    if let Some(kind) = spec.kind.filter(|k| *k != 's') {
        return Err(unknown_code(kind, "str"));
    }
    if spec.sign != '-' {
        return Err(value_error("Sign not allowed in string format specifier"));
    }
    let text: String = match spec.precision {
        Some(p) => s.chars().take(p).collect(),
        None => s.to_string(),
    };
    Ok(pad("", &text, spec, '<'))
}

/// Integer presentation types; float types convert first
fn format_number(i: i64, spec: &FormatSpec) -> EvalResult<String> {
    if let Some('e' | 'E' | 'f' | 'F' | 'g' | 'G' | '%') = spec.kind {
        return format_float(i as f64, spec);
    }
    if spec.precision.is_some() {
        return Err(value_error("Precision not allowed in integer format specifier"));
    }

    let magnitude = i.unsigned_abs();
    let (body, prefix, group_every) = match spec.kind {
        None | Some('d') | Some('n') => (magnitude.to_string(), "", 3),
        Some('b') => (format!("{:b}", magnitude), "0b", 4),
        Some('o') => (format!("{:o}", magnitude), "0o", 4),
        Some('x') => (format!("{:x}", magnitude), "0x", 4),
        Some('X') => (format!("{:X}", magnitude), "0X", 4),
        Some('c') => {
            let c = u32::try_from(i)
                .ok()
                .and_then(char::from_u32)
                .ok_or_else(|| Exception::new(ExcKind::OverflowError, "%c arg not in range(0x110000)"))?;
            return Ok(pad("", &c.to_string(), spec, '<'));
        }
        Some(kind) => return Err(unknown_code(kind, "int")),
    };

    let body = match spec.grouping {
        Some(sep) => group_digits(&body, sep, group_every),
        None => body,
    };
    let mut lead = sign_prefix(i < 0, spec.sign).to_string();
    if spec.alternate {
        lead.push_str(prefix);
    }
    Ok(pad(&lead, &body, spec, '>'))
}

fn format_float(f: f64, spec: &FormatSpec) -> EvalResult<String> {
    let upper = matches!(spec.kind, Some('E' | 'F' | 'G'));
    let negative = f.is_sign_negative() && !f.is_nan();
    let abs = f.abs();

    let body = if !abs.is_finite() {
        let text = if abs.is_nan() { "nan" } else { "inf" };
        let text = if spec.kind == Some('%') { format!("{}%", text) } else { text.to_string() };
        if upper {
            text.to_uppercase()
        } else {
            text
        }
    } else {
        let text = match spec.kind {
            Some('f' | 'F') => format!("{:.*}", spec.precision.unwrap_or(6), abs),
            Some('e' | 'E') => exponent_form(&format!("{:.*e}", spec.precision.unwrap_or(6), abs)),
            Some('%') => format!("{:.*}%", spec.precision.unwrap_or(6), abs * 100.0),
            Some('g' | 'G') => general_form(abs, spec.precision.unwrap_or(6), spec.alternate),
            None => match spec.precision {
                Some(p) => {
                    let text = general_form(abs, p, spec.alternate);
                    if text.contains(['.', 'e', 'n', 'i']) {
                        text
                    } else {
                        format!("{}.0", text)
                    }
                }
                None => float_repr(abs),
            },
            Some(kind) => return Err(unknown_code(kind, "float")),
        };
        if upper {
            text.to_uppercase()
        } else {
            text
        }
    };

    let body = match spec.grouping {
        Some(sep) => {
            let split = body.find(|c: char| !c.is_ascii_digit()).unwrap_or(body.len());
            format!("{}{}", group_digits(&body[..split], sep, 3), &body[split..])
        }
        None => body,
    };
    Ok(pad(sign_prefix(negative, spec.sign), &body, spec, '>'))
}

/// `g` presentation: fixed or exponent form depending on magnitude, with
/// trailing zeros removed unless `#` was given
fn general_form(abs: f64, precision: usize, alternate: bool) -> String {
    let precision = precision.max(1);
    let sci = format!("{:.*e}", precision - 1, abs);
    let exp: i32 = sci
        .split_once('e')
        .and_then(|(_, e)| e.parse().ok())
        .unwrap_or(0);

    let text = if exp >= -4 && exp < precision as i32 {
        let decimals = (precision as i32 - 1 - exp).max(0) as usize;
        format!("{:.*}", decimals, abs)
    } else {
        exponent_form(&sci)
    };
    if alternate {
        return text;
    }

    match text.split_once('e') {
        Some((mantissa, exp)) => format!("{}e{}", strip_zeros(mantissa), exp),
        None => strip_zeros(&text).to_string(),
    }
}

fn strip_zeros(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}

fn sign_prefix(negative: bool, sign: char) -> &'static str {
    match (negative, sign) {
        (true, _) => "-",
        (false, '+') => "+",
        (false, ' ') => " ",
        _ => "",
    }
}

fn group_digits(digits: &str, sep: char, every: usize) -> String {
    let chars: Vec<char> = digits.chars().collect();
    let mut out = String::with_capacity(chars.len() + chars.len() / every);
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % every == 0 {
            out.push(sep);
        }
        out.push(*c);
    }
    out
}

/// Apply width, fill and alignment; `=` pads between sign and digits
fn pad(prefix: &str, body: &str, spec: &FormatSpec, default_align: char) -> String {
    let len = prefix.chars().count() + body.chars().count();
    if spec.width <= len {
        return format!("{}{}", prefix, body);
    }
    let missing = spec.width - len;
    let (fill, align) = match spec.align {
        Some(align) => (spec.fill, align),
        None if spec.zero => ('0', '='),
        None => (spec.fill, default_align),
    };
    let fill_str = |n: usize| fill.to_string().repeat(n);

    match align {
        '<' => format!("{}{}{}", prefix, body, fill_str(missing)),
        '^' => {
            let left = missing / 2;
            format!("{}{}{}{}", fill_str(left), prefix, body, fill_str(missing - left))
        }
        '=' => format!("{}{}{}", prefix, fill_str(missing), body),
        _ => format!("{}{}{}", fill_str(missing), prefix, body),
    }
}

/* ===================== printf-style ===================== */

/// `template % args`
pub fn percent_format(template: &str, args: &Val) -> EvalResult<String> {
    let mapping = match args {
        Val::Dict(dict) => Some(dict.clone()),
        _ => None,
    };
    let values: Vec<Val> = match args {
        Val::Tuple(items) => items.to_vec(),
        Val::Dict(_) => Vec::new(),
        other => vec![other.clone()],
    };
    let mut next_value = values.into_iter();
    let chars: Vec<char> = template.chars().collect();
    let mut out = String::with_capacity(template.len());
    let mut i = 0;

    while i < chars.len() {
        if chars[i] != '%' {
            out.push(chars[i]);
            i += 1;
            continue;
        }
        i += 1;

        // Optional mapping key
        let mut keyed = None;
        if chars.get(i) == Some(&'(') {
            let close = chars[i..]
                .iter()
                .position(|c| *c == ')')
                .ok_or_else(|| value_error("incomplete format key"))?;
            keyed = Some(chars[i + 1..i + close].iter().collect::<String>());
            i += close + 1;
        }

        let mut spec = FormatSpec::default();
        while let Some(&flag @ ('-' | '+' | ' ' | '0' | '#')) = chars.get(i) {
            match flag {
                '-' => spec.align = Some('<'),
                '+' | ' ' => spec.sign = flag,
                '0' => spec.zero = true,
                _ => spec.alternate = true,
            }
            i += 1;
        }
        let start = i;
        while chars.get(i).is_some_and(|c| c.is_ascii_digit()) {
            i += 1;
        }
        spec.width = digits_value(&chars[start..i]);
        if chars.get(i) == Some(&'.') {
            i += 1;
            let start = i;
            while chars.get(i).is_some_and(|c| c.is_ascii_digit()) {
                i += 1;
            }
            spec.precision = Some(digits_value(&chars[start..i]));
        }
        // Conversions right-align unless `-` is given
        if spec.align.is_some() {
            spec.zero = false;
        } else if !spec.zero {
            spec.align = Some('>');
        }

        let conversion = *chars
            .get(i)
            .ok_or_else(|| value_error("incomplete format"))?;
        i += 1;
        if conversion == '%' {
            out.push('%');
            continue;
        }

        let value = match (&keyed, &mapping) {
            (Some(key), Some(dict)) => dict
                .borrow()
                .get(&Val::str(key.clone()))?
                .ok_or_else(|| crate::interpreter::errors::key_error(Val::str(key.clone())))?,
            (Some(_), None) => return Err(type_error("format requires a mapping")),
            (None, _) => next_value
                .next()
                .ok_or_else(|| type_error("not enough arguments for format string"))?,
        };

        let text = match conversion {
            's' => format_str(&try_str(&value)?, &FormatSpec { sign: '-', ..spec })?,
            'r' | 'a' => format_str(&try_repr(&value)?, &FormatSpec { sign: '-', ..spec })?,
            'd' | 'i' | 'u' => {
                let n = percent_int(&value, conversion)?;
                format_number(n, &FormatSpec { precision: None, ..spec })?
            }
            'x' | 'X' | 'o' => {
                let n = percent_int(&value, conversion)?;
                format_number(
                    n,
                    &FormatSpec {
                        kind: Some(conversion),
                        precision: None,
                        ..spec
                    },
                )?
            }
            'f' | 'F' | 'e' | 'E' | 'g' | 'G' => {
                let f = match value {
                    Val::Int(n) => n as f64,
                    Val::Bool(b) => b as i64 as f64,
                    Val::Float(f) => f,
                    other => {
                        return Err(type_error(format!(
                            "must be real number, not {}",
                            other.type_name()
                        )))
                    }
                };
                format_float(
                    f,
                    &FormatSpec {
                        kind: Some(conversion),
                        ..spec
                    },
                )?
            }
            other => {
                return Err(value_error(format!(
                    "unsupported format character '{}' (0x{:x}) at index {}",
                    other,
                    other as u32,
                    i - 1
                )))
            }
        };
        out.push_str(&text);
    }

    if mapping.is_none() && next_value.next().is_some() {
        return Err(type_error(
            "not all arguments converted during string formatting",
        ));
    }
    Ok(out)
}

fn percent_int(value: &Val, conversion: char) -> EvalResult<i64> {
    match value {
        Val::Int(n) => Ok(*n),
        Val::Bool(b) => Ok(*b as i64),
        Val::Float(f) if matches!(conversion, 'd' | 'i' | 'u') && f.is_finite() => Ok(f.trunc() as i64),
        other => Err(type_error(format!(
            "%{} format: a real number is required, not {}",
            conversion,
            other.type_name()
        ))),
    }
}

/* ===================== str.format ===================== */

/// `template.format(*args, **kwargs)`
pub fn str_format(template: &str, args: &[Val], kwargs: &[(String, Val)]) -> EvalResult<String> {
    let mut fields = FieldSource {
        args,
        kwargs,
        auto_index: 0,
        numbering: None,
    };
    fields.render(template, 2)
}

/// Arguments of a `str.format` call and the numbering state shared by its
/// top-level and nested fields
struct FieldSource<'a> {
    args: &'a [Val],
    kwargs: &'a [(String, Val)],
    auto_index: usize,
    /// `Some(true)` once `{}` is used, `Some(false)` once `{0}` is used
    numbering: Option<bool>,
}

impl FieldSource<'_> {
    /// Expand `template`; format specs may nest fields `depth - 1` more times
    fn render(&mut self, template: &str, depth: usize) -> EvalResult<String> {
        if depth == 0 {
            return Err(value_error("Max string recursion exceeded"));
        }
        let chars: Vec<char> = template.chars().collect();
        let mut out = String::with_capacity(template.len());
        let mut i = 0;

        while i < chars.len() {
            match chars[i] {
                '{' if chars.get(i + 1) == Some(&'{') => {
                    out.push('{');
                    i += 2;
                }
                '}' if chars.get(i + 1) == Some(&'}') => {
                    out.push('}');
                    i += 2;
                }
                '}' => return Err(value_error("Single '}' encountered in format string")),
                '{' => {
                    let close = matching_brace(&chars, i)
                        .ok_or_else(|| value_error("Single '{' encountered in format string"))?;
                    let field: String = chars[i + 1..close].iter().collect();
                    i = close + 1;
                    out.push_str(&self.replace_field(&field, depth)?);
                }
                c => {
                    out.push(c);
                    i += 1;
                }
            }
        }

        Ok(out)
    }

    /// `name[key].attr!conv:spec` without its braces
    fn replace_field(&mut self, field: &str, depth: usize) -> EvalResult<String> {
        let (name, spec) = match field.split_once(':') {
            Some((name, spec)) => (name, spec),
            None => (field, ""),
        };
        let (name, conversion) = match name.split_once('!') {
            Some((name, conv)) => (name, conv.chars().next()),
            None => (name, None),
        };

        let split = name.find(['.', '[']).unwrap_or(name.len());
        let mut value = self.argument(&name[..split])?;
        let mut rest = &name[split..];
        while !rest.is_empty() {
            if let Some(tail) = rest.strip_prefix('[') {
                let close = tail
                    .find(']')
                    .ok_or_else(|| value_error("Missing ']' in format string"))?;
                let key = &tail[..close];
                let key = match key.parse::<i64>() {
                    Ok(index) => Val::Int(index),
                    Err(_) => Val::str(key),
                };
                value = getitem(&value, &key)?;
                rest = &tail[close + 1..];
            } else if let Some(tail) = rest.strip_prefix('.') {
                let end = tail.find(['.', '[']).unwrap_or(tail.len());
                if end == 0 {
                    return Err(value_error("Empty attribute in format string"));
                }
                value = get_attribute(&value, &tail[..end])?;
                rest = &tail[end..];
            } else {
                return Err(value_error(
                    "Only '.' or '[' may follow ']' in format field specifier",
                ));
            }
        }

        let value = match conversion {
            Some('r') | Some('a') => Val::Str(try_repr(&value)?),
            Some('s') => Val::Str(try_str(&value)?),
            Some(other) => {
                return Err(value_error(format!(
                    "Unknown conversion specifier {}",
                    other
                )))
            }
            None => value,
        };
        let spec = if spec.contains('{') {
            self.render(spec, depth - 1)?
        } else {
            spec.to_string()
        };
        format_value(&value, &spec)
    }

    fn argument(&mut self, name: &str) -> EvalResult<Val> {
        if name.is_empty() {
            if self.numbering == Some(false) {
                return Err(value_error(
                    "cannot switch from manual field specification to automatic field numbering",
                ));
            }
            self.numbering = Some(true);
            let index = self.auto_index;
            self.auto_index += 1;
            positional(self.args, index)
        } else if let Ok(index) = name.parse::<usize>() {
            if self.numbering == Some(true) {
                return Err(value_error(
                    "cannot switch from automatic field numbering to manual field specification",
                ));
            }
            self.numbering = Some(false);
            positional(self.args, index)
        } else {
            self.kwargs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone())
                .ok_or_else(|| key_error(Val::str(name)))
        }
    }
}

/// Index of the `}` closing the field opened at `open`
fn matching_brace(chars: &[char], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (idx, c) in chars.iter().enumerate().skip(open) {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
    }
    None
}

fn positional(args: &[Val], index: usize) -> EvalResult<Val> {
    args.get(index).cloned().ok_or_else(|| {
        Exception::new(
            ExcKind::IndexError,
            format!(
                "Replacement index {} out of range for positional args tuple",
                index
            ),
        )
    })
}
