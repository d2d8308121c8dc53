//! Script runner
//!
//! One evaluation: load scope bindings, read the script, wrap and define it,
//! call it with output captured, then turn the outcome into an
//! [`ExecutionResult`].
//!
//! ## Modules
//! - `capture` - print redirection into log lines
//! - `result` - outcome types and JSON rendering

pub mod capture;
pub mod result;

use std::fs;
use std::io;
use std::panic;
use std::rc::Rc;
use std::thread;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::interpreter::stdlib::{convert, CallArgs};
use crate::interpreter::{define_user_function, Console, Interpreter, DEFAULT_MAX_CALL_DEPTH};
use crate::scope::{load_scope, ScopeBindings};

pub use capture::{LogBuffer, OutputCapture};
pub use result::{render, write_payload, ExecutionResult, DEFINITION_ERROR_PREFIX};

/// Stack reserved for the interpreter thread; deep user recursion walks it
const INTERPRETER_STACK_SIZE: usize = 64 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("Error reading {file}: {source}")]
    ScriptRead {
        file: String,
        #[source]
        source: io::Error,
    },
}

/// Evaluates script text against scope bindings
#[derive(Debug, Clone)]
pub struct ScriptRunner {
    max_call_depth: usize,
}

impl Default for ScriptRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptRunner {
    pub fn new() -> Self {
        ScriptRunner {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }

    pub fn max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    /// Run `source` on a dedicated interpreter thread
    ///
    /// Falls back to the calling thread if the interpreter thread cannot be
    /// spawned.
    pub fn run(&self, source: &str, scope: &ScopeBindings) -> ExecutionResult {
        let max_call_depth = self.max_call_depth;
        let spawned = thread::scope(|s| {
            let handle = thread::Builder::new()
                .name("interpreter".to_string())
                .stack_size(INTERPRETER_STACK_SIZE)
                .spawn_scoped(s, move || execute(source, scope, max_call_depth));
            match handle {
                Ok(handle) => Some(
                    handle
                        .join()
                        .unwrap_or_else(|payload| panic::resume_unwind(payload)),
                ),
                Err(err) => {
                    warn!(error = %err, "Failed to spawn interpreter thread");
                    None
                }
            }
        });
        spawned.unwrap_or_else(|| execute(source, scope, max_call_depth))
    }
}

fn execute(source: &str, scope: &ScopeBindings, max_call_depth: usize) -> ExecutionResult {
    let def = match define_user_function(source) {
        Ok(def) => def,
        Err(err) => {
            info!(error = %err, "Script failed to parse");
            return ExecutionResult::DefinitionFailure {
                error: err.to_string(),
            };
        }
    };

    let console = Rc::new(Console::stdout());
    let mut interp = Interpreter::new(Rc::clone(&console)).max_call_depth(max_call_depth);
    for (name, value) in scope.iter() {
        interp.set_global(name, convert::from_json(value));
    }

    let capture = OutputCapture::begin(&console);
    let returned = interp
        .define(&def)
        .and_then(|function| interp.call_value(&function, CallArgs::default()));
    let logs = capture.finish();

    match returned.and_then(|value| convert::to_json(&value)) {
        Ok(output) => {
            debug!(log_lines = logs.len(), "Script returned");
            ExecutionResult::Success { logs, output }
        }
        Err(exc) => {
            info!(exception = exc.kind.name(), "Script raised");
            ExecutionResult::RuntimeFailure {
                logs,
                error: exc.message(),
            }
        }
    }
}

/// Full evaluation from the configured data directory
///
/// Scope is loaded before the script is read. Only a script that cannot be
/// read is an error here; every other failure is an [`ExecutionResult`].
pub fn evaluate(config: &Config) -> Result<ExecutionResult, RunnerError> {
    let scope = load_scope(&config.scope_path());

    let script_path = config.script_path();
    let source = fs::read_to_string(&script_path).map_err(|source| RunnerError::ScriptRead {
        file: config.script_file.clone(),
        source,
    })?;
    debug!(path = %script_path.display(), bytes = source.len(), "Read script");

    Ok(ScriptRunner::new()
        .max_call_depth(config.max_call_depth)
        .run(&source, &scope))
}
