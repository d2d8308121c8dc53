//! Conversion between JSON documents and script values
//!
//! `from_json` builds the initial namespace from scope bindings; `to_json`
//! serializes a script's return value the way `json.dumps` would.

use serde_json::{Map, Number, Value as JsonValue};

use super::format::float_repr;
use crate::interpreter::errors::{recursion_error, type_error, value_error, EvalResult};
use crate::interpreter::types::{Dict, Val};

/// JSON value to script value
///
/// Integers outside the i64 range become floats.
pub fn from_json(value: &JsonValue) -> Val {
    match value {
        JsonValue::Null => Val::None,
        JsonValue::Bool(b) => Val::Bool(*b),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => Val::Int(i),
            None => Val::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        JsonValue::String(s) => Val::Str(s.clone()),
        JsonValue::Array(items) => Val::list(items.iter().map(from_json).collect()),
        JsonValue::Object(map) => {
            let mut dict = Dict::new();
            for (key, item) in map {
                // String keys always hash
                let _ = dict.insert(Val::Str(key.clone()), from_json(item));
            }
            Val::dict(dict)
        }
    }
}

/// Containers nested deeper than this are not serialized
pub const MAX_JSON_DEPTH: usize = 1000;

/// Script value to JSON
///
/// Non-finite floats become `null`. Functions, types, ranges and exceptions
/// are not serializable.
pub fn to_json(value: &Val) -> EvalResult<JsonValue> {
    to_json_inner(value, &mut Vec::new(), 0)
}

fn to_json_inner(value: &Val, seen: &mut Vec<usize>, depth: usize) -> EvalResult<JsonValue> {
    if depth > MAX_JSON_DEPTH {
        return Err(recursion_error(
            "maximum recursion depth exceeded while encoding a JSON object",
        ));
    }
    match value {
        Val::None => Ok(JsonValue::Null),
        Val::Bool(b) => Ok(JsonValue::Bool(*b)),
        Val::Int(i) => Ok(JsonValue::Number((*i).into())),
        Val::Float(f) => Ok(Number::from_f64(*f).map_or(JsonValue::Null, JsonValue::Number)),
        Val::Str(s) => Ok(JsonValue::String(s.clone())),
        Val::List(items) => {
            let id = std::rc::Rc::as_ptr(items) as usize;
            enter(seen, id)?;
            let out = items
                .borrow()
                .iter()
                .map(|item| to_json_inner(item, seen, depth + 1))
                .collect::<EvalResult<Vec<_>>>();
            seen.pop();
            Ok(JsonValue::Array(out?))
        }
        Val::Tuple(items) => Ok(JsonValue::Array(
            items
                .iter()
                .map(|item| to_json_inner(item, seen, depth + 1))
                .collect::<EvalResult<Vec<_>>>()?,
        )),
        Val::Dict(dict) => {
            let id = std::rc::Rc::as_ptr(dict) as usize;
            enter(seen, id)?;
            let out = dict_to_json(&dict.borrow(), seen, depth + 1);
            seen.pop();
            out
        }
        other => Err(type_error(format!(
            "Object of type {} is not JSON serializable",
            other.type_name()
        ))),
    }
}

fn enter(seen: &mut Vec<usize>, id: usize) -> EvalResult<()> {
    if seen.contains(&id) {
        return Err(value_error("Circular reference detected"));
    }
    seen.push(id);
    Ok(())
}

fn dict_to_json(dict: &Dict, seen: &mut Vec<usize>, depth: usize) -> EvalResult<JsonValue> {
    let mut map = Map::new();
    for (key, item) in dict.items() {
        map.insert(json_key(&key)?, to_json_inner(&item, seen, depth)?);
    }
    Ok(JsonValue::Object(map))
}

/// Object keys are always strings in JSON
fn json_key(key: &Val) -> EvalResult<String> {
    match key {
        Val::Str(s) => Ok(s.clone()),
        Val::Int(i) => Ok(i.to_string()),
        Val::Float(f) if f.is_nan() => Ok("NaN".to_string()),
        Val::Float(f) if f.is_infinite() => {
            Ok(if *f > 0.0 { "Infinity" } else { "-Infinity" }.to_string())
        }
        Val::Float(f) => Ok(float_repr(*f)),
        Val::Bool(b) => Ok(if *b { "true" } else { "false" }.to_string()),
        Val::None => Ok("null".to_string()),
        other => Err(type_error(format!(
            "keys must be str, int, float, bool or None, not {}",
            other.type_name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scope_values_convert() {
        let value = from_json(&json!({"n": 1, "f": 1.5, "s": "x", "l": [true, null]}));
        let Val::Dict(dict) = value else {
            panic!("expected dict");
        };
        let dict = dict.borrow();
        assert!(matches!(dict.get(&Val::str("n")).unwrap(), Some(Val::Int(1))));
        assert!(matches!(dict.get(&Val::str("f")).unwrap(), Some(Val::Float(f)) if f == 1.5));
        assert!(matches!(dict.get(&Val::str("l")).unwrap(), Some(Val::List(_))));
    }

    #[test]
    fn test_large_integers_become_floats() {
        let value = from_json(&json!(u64::MAX));
        assert!(matches!(value, Val::Float(_)));
    }

    #[test]
    fn test_output_conversion() {
        let tuple = Val::tuple(vec![Val::Int(1), Val::Float(f64::INFINITY), Val::None]);
        assert_eq!(to_json(&tuple).unwrap(), json!([1, null, null]));
    }

    #[test]
    fn test_dict_keys_are_stringified_in_order() {
        let mut dict = Dict::new();
        dict.insert(Val::Int(2), Val::str("two")).unwrap();
        dict.insert(Val::Bool(false), Val::str("zero")).unwrap();
        dict.insert(Val::None, Val::Float(0.5)).unwrap();
        dict.insert(Val::Float(1.5), Val::Int(1)).unwrap();

        let out = to_json(&Val::dict(dict)).unwrap();
        assert_eq!(
            serde_json::to_string(&out).unwrap(),
            r#"{"2":"two","false":"zero","null":0.5,"1.5":1}"#
        );
    }

    #[test]
    fn test_unserializable_values() {
        let err = to_json(&Val::Builtin(crate::interpreter::stdlib::Builtin::Len)).unwrap_err();
        assert_eq!(err.message(), "Object of type builtin_function_or_method is not JSON serializable");

        let mut dict = Dict::new();
        dict.insert(Val::tuple(vec![Val::Int(1)]), Val::None).unwrap();
        let err = to_json(&Val::dict(dict)).unwrap_err();
        assert_eq!(err.message(), "keys must be str, int, float, bool or None, not tuple");
    }

    #[test]
    fn test_self_referencing_list() {
        let list = Val::list(vec![]);
        if let Val::List(items) = &list {
            items.borrow_mut().push(list.clone());
        }
        let err = to_json(&list).unwrap_err();
        assert_eq!(err.message(), "Circular reference detected");
    }
}
