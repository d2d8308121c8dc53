//! String literal decoding
//!
//! The grammar only delimits literals; prefixes, escapes and f-string
//! replacement fields are resolved here.

use super::{ParseError, ParseResult};

/// A decoded literal
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Plain(String),
    Formatted(Vec<RawPart>),
}

/// Piece of an f-string before its field expressions are parsed
#[derive(Debug, Clone, PartialEq)]
pub enum RawPart {
    Text(String),
    Field {
        source: String,
        conversion: Option<char>,
        spec: String,
    },
}

/// Decode one literal token such as `'a\n'`, `r"\d"` or `f'{x:>4}'`
pub fn decode_literal(token: &str, line: usize) -> ParseResult<Literal> {
    let quote_at = token
        .find(['\'', '"'])
        .ok_or_else(|| ParseError::syntax("invalid string literal", line))?;
    let prefix = token[..quote_at].to_ascii_lowercase();
    let raw = prefix.contains('r');
    let formatted = prefix.contains('f');

    let quoted = &token[quote_at..];
    let delimiter = if quoted.starts_with("\"\"\"") || quoted.starts_with("'''") {
        3
    } else {
        1
    };
    if quoted.len() < delimiter * 2 {
        return Err(ParseError::syntax("invalid string literal", line));
    }
    let body = &quoted[delimiter..quoted.len() - delimiter];

    if formatted {
        let parts = split_fstring(body, line)?
            .into_iter()
            .map(|part| match part {
                RawPart::Text(text) if !raw => Ok(RawPart::Text(unescape(&text, line)?)),
                other => Ok(other),
            })
            .collect::<ParseResult<Vec<_>>>()?;
        Ok(Literal::Formatted(parts))
    } else if raw {
        Ok(Literal::Plain(body.to_string()))
    } else {
        Ok(Literal::Plain(unescape(body, line)?))
    }
}

/// Resolve backslash escapes
pub fn unescape(body: &str, line: usize) -> ParseResult<String> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(esc) = chars.next() else {
            out.push('\\');
            break;
        };
        match esc {
            '\n' => {}
            '\\' => out.push('\\'),
            '\'' => out.push('\''),
            '"' => out.push('"'),
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'a' => out.push('\x07'),
            'b' => out.push('\x08'),
            'f' => out.push('\x0c'),
            'v' => out.push('\x0b'),
            '0'..='7' => {
                let mut value = esc.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match chars.peek().and_then(|d| d.to_digit(8)) {
                        Some(digit) => {
                            value = value * 8 + digit;
                            chars.next();
                        }
                        None => break,
                    }
                }
                out.push(char::from_u32(value).unwrap_or('\u{fffd}'));
            }
            'x' => out.push(hex_escape(&mut chars, 2, "\\xXX", line)?),
            'u' => out.push(hex_escape(&mut chars, 4, "\\uXXXX", line)?),
            'U' => out.push(hex_escape(&mut chars, 8, "\\UXXXXXXXX", line)?),
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }

    Ok(out)
}

fn hex_escape(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    width: usize,
    form: &str,
    line: usize,
) -> ParseResult<char> {
    let digits: String = (0..width).filter_map(|_| chars.next()).collect();
    let truncated = || {
        ParseError::syntax(
            format!("(unicode error) 'unicodeescape' codec can't decode bytes: truncated {} escape", form),
            line,
        )
    };
    if digits.len() != width {
        return Err(truncated());
    }
    let value = u32::from_str_radix(&digits, 16).map_err(|_| truncated())?;
    char::from_u32(value).ok_or_else(truncated)
}

/// Split an f-string body into literal text and replacement fields
///
/// `{{` and `}}` are literal braces. A field runs to its matching `}`;
/// brackets and quotes inside the expression are skipped over, a top-level
/// `!` introduces a conversion and a top-level `:` the format spec.
pub fn split_fstring(body: &str, line: usize) -> ParseResult<Vec<RawPart>> {
    let chars: Vec<char> = body.chars().collect();
    let mut parts = Vec::new();
    let mut text = String::new();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '{' if chars.get(i + 1) == Some(&'{') => {
                text.push('{');
                i += 2;
            }
            '}' if chars.get(i + 1) == Some(&'}') => {
                text.push('}');
                i += 2;
            }
            '}' => {
                return Err(ParseError::syntax("f-string: single '}' is not allowed", line));
            }
            '{' => {
                if !text.is_empty() {
                    parts.push(RawPart::Text(std::mem::take(&mut text)));
                }
                let (field, next) = read_field(&chars, i + 1, line)?;
                parts.push(field);
                i = next;
            }
            c => {
                text.push(c);
                i += 1;
            }
        }
    }
    if !text.is_empty() {
        parts.push(RawPart::Text(text));
    }

    Ok(parts)
}

/// Read one replacement field starting just after its `{`
///
/// Returns the field and the index just past its closing `}`.
fn read_field(chars: &[char], start: usize, line: usize) -> ParseResult<(RawPart, usize)> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut i = start;
    let mut expr_end = None;
    let mut conversion = None;

    while i < chars.len() {
        let c = chars[i];
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            i += 1;
            continue;
        }
        match c {
            '\'' | '"' => quote = Some(c),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            '}' if depth > 0 => depth -= 1,
            '!' if depth == 0 && chars.get(i + 1) != Some(&'=') => {
                expr_end = Some(i);
                let conv = chars
                    .get(i + 1)
                    .copied()
                    .ok_or_else(|| ParseError::syntax("f-string: expecting '}'", line))?;
                if !matches!(conv, 's' | 'r' | 'a') {
                    return Err(ParseError::syntax(
                        format!(
                            "f-string: invalid conversion character '{}': expected 's', 'r', or 'a'",
                            conv
                        ),
                        line,
                    ));
                }
                conversion = Some(conv);
                i += 2;
                break;
            }
            ':' | '}' if depth == 0 => {
                expr_end = Some(i);
                break;
            }
            _ => {}
        }
        i += 1;
    }

    let end = expr_end.ok_or_else(|| ParseError::syntax("f-string: expecting '}'", line))?;
    let source: String = chars[start..end].iter().collect();
    if source.trim().is_empty() {
        return Err(ParseError::syntax("f-string: empty expression not allowed", line));
    }

    // Optional format spec, up to the closing brace
    let mut spec = String::new();
    if chars.get(i) == Some(&':') {
        i += 1;
        let mut nested = 0usize;
        while i < chars.len() {
            match chars[i] {
                '{' => nested += 1,
                '}' if nested > 0 => nested -= 1,
                '}' => break,
                _ => {}
            }
            spec.push(chars[i]);
            i += 1;
        }
    }
    if chars.get(i) != Some(&'}') {
        return Err(ParseError::syntax("f-string: expecting '}'", line));
    }

    Ok((
        RawPart::Field {
            source: source.trim().to_string(),
            conversion,
            spec,
        },
        i + 1,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_escapes() {
        assert_eq!(
            decode_literal(r#"'a\tb\n\x41é'"#, 1).unwrap(),
            Literal::Plain("a\tb\nA\u{e9}".to_string())
        );
    }

    #[test]
    fn test_raw_string_keeps_backslashes() {
        assert_eq!(
            decode_literal(r#"r'\d+\n'"#, 1).unwrap(),
            Literal::Plain("\\d+\\n".to_string())
        );
    }

    #[test]
    fn test_triple_quoted() {
        assert_eq!(
            decode_literal("\"\"\"one\ntwo\"\"\"", 1).unwrap(),
            Literal::Plain("one\ntwo".to_string())
        );
    }

    #[test]
    fn test_unknown_escape_is_kept() {
        assert_eq!(unescape(r"\d", 1).unwrap(), "\\d");
    }

    #[test]
    fn test_fstring_fields() {
        let Literal::Formatted(parts) = decode_literal("f'x={x!r:>5} {{lit}} {d[\"k\"]}'", 1).unwrap() else {
            panic!("expected formatted literal");
        };
        assert_eq!(
            parts,
            vec![
                RawPart::Text("x=".to_string()),
                RawPart::Field {
                    source: "x".to_string(),
                    conversion: Some('r'),
                    spec: ">5".to_string(),
                },
                RawPart::Text(" {lit} ".to_string()),
                RawPart::Field {
                    source: "d[\"k\"]".to_string(),
                    conversion: None,
                    spec: String::new(),
                },
            ]
        );
    }

    #[test]
    fn test_fstring_errors() {
        assert!(split_fstring("a } b", 1).is_err());
        assert!(split_fstring("{}", 1).is_err());
        assert!(split_fstring("{x", 1).is_err());
        assert!(split_fstring("{x!z}", 1).is_err());
    }
}
