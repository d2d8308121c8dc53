//! Result payloads
//!
//! Every run ends in exactly one JSON object on stdout. Payloads are rendered
//! the way Python's `json.dumps` renders them with default settings: `", "`
//! and `": "` separators, non-ASCII escaped as `\uXXXX`, and floats in their
//! shortest round-trip form (`1e-05`, `1e+16`).

use std::io::{self, Write};

use serde::Serialize;
use serde_json::ser::Formatter;
use serde_json::{json, Value as JsonValue};

use crate::interpreter::stdlib::format::float_repr;

/// Prefix for scripts that failed to parse or define
pub const DEFINITION_ERROR_PREFIX: &str = "Error interpreting user code: ";

/// Outcome of evaluating one script
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionResult {
    /// The script returned normally
    Success { logs: Vec<String>, output: JsonValue },
    /// The script raised, or its return value could not be serialized
    RuntimeFailure { logs: Vec<String>, error: String },
    /// The wrapped script did not parse or define
    DefinitionFailure { error: String },
}

impl ExecutionResult {
    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionResult::Success { .. })
    }

    pub fn exit_code(&self) -> u8 {
        if self.is_success() {
            0
        } else {
            1
        }
    }

    pub fn to_payload(&self) -> JsonValue {
        match self {
            ExecutionResult::Success { logs, output } => json!({
                "logs": logs,
                "output": output,
            }),
            ExecutionResult::RuntimeFailure { logs, error } => json!({
                "logs": logs,
                "error": error,
            }),
            ExecutionResult::DefinitionFailure { error } => json!({
                "error": format!("{}{}", DEFINITION_ERROR_PREFIX, error),
            }),
        }
    }
}

/// Write `payload` in `json.dumps` form
pub fn write_payload<W: Write>(writer: W, payload: &JsonValue) -> serde_json::Result<()> {
    let mut serializer = serde_json::Serializer::with_formatter(writer, DumpsFormatter);
    payload.serialize(&mut serializer)
}

/// Render `payload` in `json.dumps` form
pub fn render(payload: &JsonValue) -> serde_json::Result<String> {
    let mut out = Vec::new();
    write_payload(&mut out, payload)?;
    // Only ASCII is ever written
    Ok(String::from_utf8_lossy(&out).into_owned())
}

struct DumpsFormatter;

impl Formatter for DumpsFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        writer.write_all(b": ")
    }

    fn write_f64<W>(&mut self, writer: &mut W, value: f64) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        writer.write_all(float_repr(value).as_bytes())
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        if fragment.bytes().all(|b| (b' '..=b'~').contains(&b)) {
            return writer.write_all(fragment.as_bytes());
        }
        let mut units = [0u16; 2];
        for ch in fragment.chars() {
            if (' '..='~').contains(&ch) {
                writer.write_all(&[ch as u8])?;
            } else {
                for unit in ch.encode_utf16(&mut units) {
                    write!(writer, "\\u{:04x}", unit)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_payload() {
        let result = ExecutionResult::Success {
            logs: vec!["hi".to_string()],
            output: json!(2),
        };
        assert_eq!(result.exit_code(), 0);
        assert_eq!(
            render(&result.to_payload()).unwrap(),
            r#"{"logs": ["hi"], "output": 2}"#
        );
    }

    #[test]
    fn test_failure_payloads() {
        let runtime = ExecutionResult::RuntimeFailure {
            logs: vec![],
            error: "division by zero".to_string(),
        };
        assert_eq!(runtime.exit_code(), 1);
        assert_eq!(
            render(&runtime.to_payload()).unwrap(),
            r#"{"logs": [], "error": "division by zero"}"#
        );

        let definition = ExecutionResult::DefinitionFailure {
            error: "invalid syntax (<string>, line 2)".to_string(),
        };
        assert_eq!(definition.exit_code(), 1);
        assert_eq!(
            definition.to_payload(),
            json!({"error": "Error interpreting user code: invalid syntax (<string>, line 2)"})
        );
    }

    #[test]
    fn test_floats_use_python_repr() {
        let payload = json!([1.0, 0.1, 1e-5, 1e16, -2.5]);
        assert_eq!(render(&payload).unwrap(), "[1.0, 0.1, 1e-05, 1e+16, -2.5]");
    }

    #[test]
    fn test_non_ascii_is_escaped() {
        let payload = json!({"s": "caf\u{e9} \u{1f600}\u{7f}", "q": "a\"b\n"});
        assert_eq!(
            render(&payload).unwrap(),
            r#"{"s": "caf\u00e9 \ud83d\ude00\u007f", "q": "a\"b\n"}"#
        );
    }

    #[test]
    fn test_nested_containers() {
        let payload = json!({"a": {"b": [1, [2, 3], {}]}, "c": []});
        assert_eq!(
            render(&payload).unwrap(),
            r#"{"a": {"b": [1, [2, 3], {}]}, "c": []}"#
        );
    }
}
