//! Script wrapping
//!
//! A script is the body of an implicit zero-argument function: every line is
//! indented one level under `def __user_func__():`, so a top-level `return`
//! produces the script's output.

use std::rc::Rc;

use tracing::debug;

use super::parser::{parse_module, ParseError, ParseResult};
use super::types::{FunctionDef, Stmt};

/// Name the wrapped script is defined under
pub const USER_FUNCTION: &str = "__user_func__";

const INDENT: &str = "    ";

/// Indent each line of `script` under the wrapper function header
///
/// Lines are split on `\n`, `\r\n` and `\r`; a trailing line break does not
/// produce an extra empty line.
pub fn wrap_source(script: &str) -> String {
    let mut wrapped = format!("def {}():\n", USER_FUNCTION);
    for line in script_lines(script) {
        wrapped.push_str(INDENT);
        wrapped.push_str(line);
        wrapped.push('\n');
    }
    wrapped
}

fn script_lines(script: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut rest = script;
    while !rest.is_empty() {
        match rest.find(['\n', '\r']) {
            Some(idx) => {
                lines.push(&rest[..idx]);
                let skip = if rest[idx..].starts_with("\r\n") { 2 } else { 1 };
                rest = &rest[idx + skip..];
            }
            None => {
                lines.push(rest);
                rest = "";
            }
        }
    }
    lines
}

/// Wrap and parse a script, returning the wrapper function's definition
pub fn define_user_function(script: &str) -> ParseResult<Rc<FunctionDef>> {
    let wrapped = wrap_source(script);
    let mut module = parse_module(&wrapped)?;
    debug!(lines = wrapped.lines().count(), "Parsed wrapped script");

    match (module.pop(), module.is_empty()) {
        (Some(Stmt::FunctionDef(def)), true) if def.name == USER_FUNCTION => Ok(def),
        _ => Err(ParseError::syntax("invalid syntax", 1)),
    }
}
