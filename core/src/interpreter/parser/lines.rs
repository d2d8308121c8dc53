//! Logical line splitting
//!
//! Turns source text into logical lines before the grammar sees it: comments
//! and blank lines are dropped, lines joined by open brackets or a trailing
//! backslash are merged, and each line records its indentation width. String
//! literals are tracked so quotes, `#` and brackets inside them are inert.

use super::ParseError;

/// Open brackets allowed at once
pub const MAX_BRACKET_DEPTH: usize = 200;

/// One logical line of source
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalLine {
    /// Indentation width in columns (tabs advance to the next multiple of 8)
    pub indent: usize,
    /// Indentation width counting each tab as a single column
    pub alt_indent: usize,
    /// Line text without indentation, comments or line breaks
    pub text: String,
    /// 1-based physical line where the logical line starts
    pub line: usize,
}

#[derive(Clone, Copy)]
struct OpenString {
    quote: char,
    triple: bool,
    line: usize,
}

pub fn logical_lines(source: &str) -> Result<Vec<LogicalLine>, ParseError> {
    let chars: Vec<char> = source.chars().filter(|c| *c != '\r').collect();
    let mut lines = Vec::new();
    let mut text = String::new();
    let mut indent = (0, 0);
    let mut start_line = 1;
    let mut line_no = 1;
    let mut brackets: Vec<(char, usize)> = Vec::new();
    let mut string: Option<OpenString> = None;
    let mut at_line_start = true;
    let mut i = 0;

    while i < chars.len() {
        if at_line_start {
            // Measure indentation; blank and comment-only lines are skipped
            let (mut col, mut alt) = (0, 0);
            while i < chars.len() {
                match chars[i] {
                    ' ' => col += 1,
                    '\t' => col = (col / 8 + 1) * 8,
                    '\x0c' => (col, alt) = (0, 0),
                    _ => break,
                }
                if chars[i] != '\x0c' {
                    alt += 1;
                }
                i += 1;
            }
            if i >= chars.len() {
                break;
            }
            if chars[i] == '\n' || chars[i] == '#' {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
                i += 1;
                line_no += 1;
                continue;
            }
            indent = (col, alt);
            start_line = line_no;
            at_line_start = false;
        }

        let c = chars[i];

        if let Some(open) = string {
            match c {
                '\\' => {
                    text.push(c);
                    if let Some(&next) = chars.get(i + 1) {
                        text.push(next);
                        if next == '\n' {
                            line_no += 1;
                        }
                        i += 1;
                    }
                }
                '\n' if !open.triple => {
                    return Err(ParseError::syntax(
                        format!("unterminated string literal (detected at line {})", open.line),
                        open.line,
                    ));
                }
                '\n' => {
                    text.push(c);
                    line_no += 1;
                }
                _ if c == open.quote => {
                    if !open.triple {
                        text.push(c);
                        string = None;
                    } else if chars.get(i + 1) == Some(&c) && chars.get(i + 2) == Some(&c) {
                        text.push_str(&c.to_string().repeat(3));
                        i += 2;
                        string = None;
                    } else {
                        text.push(c);
                    }
                }
                _ => text.push(c),
            }
            i += 1;
            continue;
        }

        match c {
            '#' => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
                continue;
            }
            '\'' | '"' => {
                let triple = chars.get(i + 1) == Some(&c) && chars.get(i + 2) == Some(&c);
                if triple {
                    text.push_str(&c.to_string().repeat(3));
                    i += 2;
                } else {
                    text.push(c);
                }
                string = Some(OpenString {
                    quote: c,
                    triple,
                    line: line_no,
                });
            }
            '(' | '[' | '{' => {
                if brackets.len() >= MAX_BRACKET_DEPTH {
                    return Err(ParseError::syntax("too many nested parentheses", line_no));
                }
                brackets.push((c, line_no));
                text.push(c);
            }
            ')' | ']' | '}' => {
                let Some((open, _)) = brackets.pop() else {
                    return Err(ParseError::syntax(format!("unmatched '{}'", c), line_no));
                };
                if closing_for(open) != c {
                    return Err(ParseError::syntax(
                        format!(
                            "closing parenthesis '{}' does not match opening parenthesis '{}'",
                            c, open
                        ),
                        line_no,
                    ));
                }
                text.push(c);
            }
            '\\' if chars.get(i + 1) == Some(&'\n') => {
                text.push(' ');
                line_no += 1;
                i += 1;
            }
            '\\' => {
                return Err(ParseError::syntax(
                    "unexpected character after line continuation character",
                    line_no,
                ));
            }
            '\n' => {
                line_no += 1;
                if brackets.is_empty() {
                    finish_line(&mut lines, &mut text, indent, start_line);
                    at_line_start = true;
                } else {
                    text.push(' ');
                }
            }
            _ => text.push(c),
        }
        i += 1;
    }

    if let Some(open) = string {
        // A final line break does not start another line
        let last_line = if chars.last() == Some(&'\n') { line_no - 1 } else { line_no };
        let message = if open.triple {
            format!("unterminated triple-quoted string literal (detected at line {})", last_line)
        } else {
            format!("unterminated string literal (detected at line {})", open.line)
        };
        return Err(ParseError::syntax(message, open.line));
    }
    if let Some((open, line)) = brackets.first() {
        return Err(ParseError::syntax(format!("'{}' was never closed", open), *line));
    }
    finish_line(&mut lines, &mut text, indent, start_line);

    check_tabs(&lines)?;
    Ok(lines)
}

fn finish_line(
    lines: &mut Vec<LogicalLine>,
    text: &mut String,
    (indent, alt_indent): (usize, usize),
    line: usize,
) {
    let trimmed = text.trim_end();
    if !trimmed.is_empty() {
        lines.push(LogicalLine {
            indent,
            alt_indent,
            text: trimmed.to_string(),
            line,
        });
    }
    text.clear();
}

/// Indentation levels must order the same whether a tab counts as eight
/// columns or one; otherwise the block structure depends on tab width.
fn check_tabs(lines: &[LogicalLine]) -> Result<(), ParseError> {
    let mut levels = vec![(0, 0)];
    for line in lines {
        let (col, alt) = (line.indent, line.alt_indent);
        while let Some(&(top, top_alt)) = levels.last() {
            if col > top {
                if alt <= top_alt {
                    return Err(tab_error(line.line));
                }
                levels.push((col, alt));
                break;
            }
            if col == top {
                if alt != top_alt {
                    return Err(tab_error(line.line));
                }
                break;
            }
            levels.pop();
        }
        if levels.is_empty() {
            // Dedent to an unknown level; the block parser reports it
            return Ok(());
        }
    }
    Ok(())
}

fn tab_error(line: usize) -> ParseError {
    ParseError::indentation("inconsistent use of tabs and spaces in indentation", line)
}

fn closing_for(open: char) -> char {
    match open {
        '(' => ')',
        '[' => ']',
        _ => '}',
    }
}
