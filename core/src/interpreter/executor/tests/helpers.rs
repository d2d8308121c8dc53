//! Test helpers for executor tests
//!
//! Scripts run the way the runner runs them: wrapped under the implicit
//! function, scope bindings installed as globals, prints captured.

use std::collections::HashMap;
use std::rc::Rc;
use std::thread;

use serde_json::Value as JsonValue;

use crate::interpreter::stdlib::format::py_repr;
use crate::interpreter::stdlib::{convert, CallArgs};
use crate::interpreter::{define_user_function, Console, ExcKind, Interpreter};
use crate::runner::OutputCapture;

const STACK_SIZE: usize = 64 * 1024 * 1024;

/// What a script produced; values are reported as their `repr`
#[derive(Debug)]
pub struct Outcome {
    pub result: Result<String, (ExcKind, String)>,
    pub logs: Vec<String>,
}

/// Run `source` with the given scope bindings
///
/// Interpretation happens on a thread with a large stack so recursive
/// scripts behave like they do under the runner.
pub fn run_with_scope(source: &str, scope: HashMap<&str, JsonValue>) -> Outcome {
    let source = source.to_string();
    let scope: Vec<(String, JsonValue)> = scope
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect();
    thread::Builder::new()
        .stack_size(STACK_SIZE)
        .spawn(move || execute(&source, &scope))
        .expect("Failed to spawn interpreter thread")
        .join()
        .expect("Interpreter thread panicked")
}

pub fn run(source: &str) -> Outcome {
    run_with_scope(source, HashMap::new())
}

fn execute(source: &str, scope: &[(String, JsonValue)]) -> Outcome {
    let def = define_user_function(source)
        .unwrap_or_else(|err| panic!("Script failed to parse: {}", err));
    let console = Rc::new(Console::new(Box::new(std::io::sink())));
    let mut interp = Interpreter::new(Rc::clone(&console));
    for (name, value) in scope {
        interp.set_global(name, convert::from_json(value));
    }

    let capture = OutputCapture::begin(&console);
    let result = interp
        .define(&def)
        .and_then(|function| interp.call_value(&function, CallArgs::default()));
    let logs = capture.finish();

    Outcome {
        result: result
            .map(|value| py_repr(&value))
            .map_err(|exc| (exc.kind, exc.message())),
        logs,
    }
}

/// Repr of the script's return value; panics if it raised
pub fn ret(source: &str) -> String {
    match run(source).result {
        Ok(repr) => repr,
        Err((kind, message)) => panic!("Script raised {}: {}", kind.name(), message),
    }
}

/// Kind and message of the exception the script raised
pub fn raises(source: &str) -> (ExcKind, String) {
    match run(source).result {
        Ok(repr) => panic!("Script returned {} instead of raising", repr),
        Err(raised) => raised,
    }
}

/// Printed lines of a script that must not raise
pub fn logs(source: &str) -> Vec<String> {
    let outcome = run(source);
    if let Err((kind, message)) = outcome.result {
        panic!("Script raised {}: {}", kind.name(), message);
    }
    outcome.logs
}
