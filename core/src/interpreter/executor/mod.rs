//! Tree-walking executor
//!
//! Statements and expressions are evaluated directly over the AST. A raised
//! exception is the `Err` side of every evaluation; `break`, `continue` and
//! `return` travel as [`Control`] values out of `exec_block`.
//!
//! ## Modules
//! - `env` - scope chain and name resolution
//! - `statements` - statement execution
//! - `expressions` - expression evaluation
//! - `operators` - value-level operator semantics
//! - `iterators` - lazy iterator objects and generator expressions

pub mod env;
pub mod expressions;
pub mod iterators;
pub mod operators;
pub mod statements;

#[cfg(test)]
mod tests;

use std::rc::Rc;

use tracing::debug;

use super::console::Console;
use super::errors::{recursion_error, type_error, EvalResult, Exception};
use super::stdlib::{self, methods, CallArgs};
use super::types::{Control, Function, FunctionDef, Val};

pub use env::{Globals, Scope, ScopeRef};

/// Call nesting allowed before `RecursionError`
pub const DEFAULT_MAX_CALL_DEPTH: usize = 1000;

/// Interpreter state for one run
pub struct Interpreter {
    globals: Globals,
    console: Rc<Console>,
    depth: usize,
    max_depth: usize,
    /// Exceptions whose `except` block is running, innermost last
    handling: Vec<Rc<Exception>>,
}

impl Interpreter {
    pub fn new(console: Rc<Console>) -> Self {
        Interpreter {
            globals: Globals::default(),
            console,
            depth: 0,
            max_depth: DEFAULT_MAX_CALL_DEPTH,
            handling: Vec::new(),
        }
    }

    pub fn max_call_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn console(&self) -> &Rc<Console> {
        &self.console
    }

    pub fn set_global(&mut self, name: &str, value: Val) {
        self.globals.borrow_mut().insert(name.to_string(), value);
    }

    pub fn global(&self, name: &str) -> Option<Val> {
        self.globals.borrow().get(name).cloned()
    }

    /// Bind a module-level function definition, returning the function value
    pub fn define(&mut self, def: &Rc<FunctionDef>) -> EvalResult {
        debug!(name = %def.name, "Defining function");
        let function = self.make_function(def, None)?;
        self.set_global(&def.name, function.clone());
        Ok(function)
    }

    /* ===================== Calls ===================== */

    /// Call any callable value
    pub fn call_value(&mut self, func: &Val, args: CallArgs) -> EvalResult {
        match func {
            Val::Function(function) => self.call_function(function, args),
            Val::Builtin(builtin) => stdlib::call_builtin(self, *builtin, args),
            Val::Type(ty) => stdlib::construct(self, *ty, args),
            Val::Method(method) => methods::call_method(self, &method.receiver, &method.name, args),
            other => Err(type_error(format!(
                "'{}' object is not callable",
                other.type_name()
            ))),
        }
    }

    fn call_function(&mut self, function: &Rc<Function>, args: CallArgs) -> EvalResult {
        if self.depth >= self.max_depth {
            return Err(recursion_error("maximum recursion depth exceeded"));
        }

        let scope = Scope::function(function.def.clone(), function.closure.clone());
        bind_arguments(function, args, &scope)?;

        self.depth += 1;
        let result = self.exec_block(&function.def.body, Some(&scope));
        self.depth -= 1;

        match result? {
            Control::Return(value) => Ok(value),
            _ => Ok(Val::None),
        }
    }
}

/// Match call arguments to parameters, filling defaults
fn bind_arguments(function: &Function, args: CallArgs, scope: &Scope) -> EvalResult<()> {
    let def = &function.def;
    let params = &def.params;
    let given = args.positional.len();

    if given > params.len() {
        let required = params.len() - function.defaults.len();
        let takes = if required == params.len() {
            params.len().to_string()
        } else {
            format!("from {} to {}", required, params.len())
        };
        return Err(type_error(format!(
            "{}() takes {} positional argument{} but {} {} given",
            def.name,
            takes,
            if params.len() == 1 { "" } else { "s" },
            given,
            if given == 1 { "was" } else { "were" }
        )));
    }

    let mut slots: Vec<Option<Val>> = vec![None; params.len()];
    for (slot, value) in slots.iter_mut().zip(args.positional) {
        *slot = Some(value);
    }

    for (name, value) in args.keywords {
        let idx = params.iter().position(|p| p.name == name).ok_or_else(|| {
            type_error(format!(
                "{}() got an unexpected keyword argument '{}'",
                def.name, name
            ))
        })?;
        if slots[idx].is_some() {
            return Err(type_error(format!(
                "{}() got multiple values for argument '{}'",
                def.name, name
            )));
        }
        slots[idx] = Some(value);
    }

    let first_default = params.len() - function.defaults.len();
    let mut missing = Vec::new();
    for (idx, slot) in slots.iter_mut().enumerate() {
        if slot.is_none() {
            if idx >= first_default {
                *slot = Some(function.defaults[idx - first_default].clone());
            } else {
                missing.push(format!("'{}'", params[idx].name));
            }
        }
    }
    if !missing.is_empty() {
        return Err(type_error(format!(
            "{}() missing {} required positional argument{}: {}",
            def.name,
            missing.len(),
            if missing.len() == 1 { "" } else { "s" },
            join_names(&missing)
        )));
    }

    for (param, value) in params.iter().zip(slots) {
        if let Some(value) = value {
            scope.set_local(&param.name, value);
        }
    }
    Ok(())
}

/// `'a'`, `'a' and 'b'`, `'a', 'b', and 'c'`
fn join_names(names: &[String]) -> String {
    match names {
        [] => String::new(),
        [one] => one.clone(),
        [first, second] => format!("{} and {}", first, second),
        [rest @ .., last] => format!("{}, and {}", rest.join(", "), last),
    }
}
