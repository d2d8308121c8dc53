//! Scope bindings
//!
//! The initial namespace for a script comes from a JSON object whose keys
//! become global names. A missing, unreadable or malformed scope file is not
//! an error: the script runs with no bindings.

use std::fs;
use std::io;
use std::path::Path;

use serde_json::{Map, Value as JsonValue};
use tracing::{debug, warn};

/// Name/value pairs made visible to the script as globals
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScopeBindings {
    values: Map<String, JsonValue>,
}

impl ScopeBindings {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Accepts only a top-level JSON object
    pub fn from_json(value: JsonValue) -> Option<Self> {
        match value {
            JsonValue::Object(values) => Some(Self { values }),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&JsonValue> {
        self.values.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &JsonValue)> {
        self.values.iter()
    }
}

impl From<Map<String, JsonValue>> for ScopeBindings {
    fn from(values: Map<String, JsonValue>) -> Self {
        Self { values }
    }
}

/// Read scope bindings from `path`, falling back to an empty scope
pub fn load_scope(path: &Path) -> ScopeBindings {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "No scope file, using empty scope");
            return ScopeBindings::empty();
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "Failed to read scope file");
            return ScopeBindings::empty();
        }
    };

    match serde_json::from_str::<JsonValue>(&text) {
        Ok(value) => match ScopeBindings::from_json(value) {
            Some(scope) => {
                debug!(bindings = scope.len(), "Loaded scope");
                scope
            }
            None => {
                warn!(path = %path.display(), "Scope file is not a JSON object, ignoring");
                ScopeBindings::empty()
            }
        },
        Err(err) => {
            warn!(path = %path.display(), error = %err, "Malformed scope file, ignoring");
            ScopeBindings::empty()
        }
    }
}
