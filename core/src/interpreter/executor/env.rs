//! Variable scopes
//!
//! Module-level names live in a single globals table. Every function call and
//! every comprehension gets a [`Scope`] whose parent is the scope it was
//! defined in, so nested functions and lambdas close over their enclosing
//! locals. Which names are local to a scope is decided statically by the
//! parser; the lookup rules below only follow those sets.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::interpreter::errors::{name_error, EvalResult, ExcKind, Exception};
use crate::interpreter::stdlib;
use crate::interpreter::types::{Comprehension, FunctionDef, Val};

/// Module namespace shared by every scope of one run
pub type Globals = Rc<RefCell<HashMap<String, Val>>>;

/// The scope an expression or statement runs in; `None` at module level
pub type ScopeRef<'a> = Option<&'a Rc<Scope>>;

#[derive(Debug)]
pub enum ScopeKind {
    Function(Rc<FunctionDef>),
    Comprehension(Rc<Comprehension>),
}

/// One level of local variables
#[derive(Debug)]
pub struct Scope {
    vars: RefCell<HashMap<String, Val>>,
    kind: ScopeKind,
    parent: Option<Rc<Scope>>,
}

impl Scope {
    pub fn function(def: Rc<FunctionDef>, parent: Option<Rc<Scope>>) -> Rc<Scope> {
        Rc::new(Scope {
            vars: RefCell::new(HashMap::new()),
            kind: ScopeKind::Function(def),
            parent,
        })
    }

    pub fn comprehension(comp: Rc<Comprehension>, parent: Option<Rc<Scope>>) -> Rc<Scope> {
        Rc::new(Scope {
            vars: RefCell::new(HashMap::new()),
            kind: ScopeKind::Comprehension(comp),
            parent,
        })
    }

    fn declares_local(&self, name: &str) -> bool {
        match &self.kind {
            ScopeKind::Function(def) => def.locals.contains(name),
            ScopeKind::Comprehension(comp) => comp.locals.contains(name),
        }
    }

    fn declares_global(&self, name: &str) -> bool {
        match &self.kind {
            ScopeKind::Function(def) => def.globals.contains(name),
            ScopeKind::Comprehension(_) => false,
        }
    }

    pub fn get_local(&self, name: &str) -> Option<Val> {
        self.vars.borrow().get(name).cloned()
    }

    pub fn set_local(&self, name: &str, value: Val) {
        self.vars.borrow_mut().insert(name.to_string(), value);
    }
}

fn unbound_local(name: &str) -> Exception {
    Exception::new(
        ExcKind::UnboundLocalError,
        format!(
            "cannot access local variable '{}' where it is not associated with a value",
            name
        ),
    )
}

fn unbound_free(name: &str) -> Exception {
    Exception::new(
        ExcKind::NameError,
        format!(
            "cannot access free variable '{}' where it is not associated with a value in enclosing scope",
            name
        ),
    )
}

/// Resolve a name: enclosing scopes innermost first, then globals, then
/// builtins
pub fn lookup(globals: &Globals, scope: ScopeRef<'_>, name: &str) -> EvalResult {
    let mut current = scope;
    let mut innermost = true;
    while let Some(level) = current {
        if level.declares_global(name) {
            break;
        }
        if level.declares_local(name) {
            return level.get_local(name).ok_or_else(|| {
                if innermost {
                    unbound_local(name)
                } else {
                    unbound_free(name)
                }
            });
        }
        innermost = false;
        current = level.parent.as_ref();
    }

    if let Some(value) = globals.borrow().get(name) {
        return Ok(value.clone());
    }
    stdlib::lookup(name).ok_or_else(|| name_error(name))
}

/// Bind a name in the current scope (or globals when declared `global`)
pub fn store(globals: &Globals, scope: ScopeRef<'_>, name: &str, value: Val) {
    match scope {
        Some(level) if !level.declares_global(name) => level.set_local(name, value),
        _ => {
            globals.borrow_mut().insert(name.to_string(), value);
        }
    }
}

/// `del name`
pub fn delete(globals: &Globals, scope: ScopeRef<'_>, name: &str) -> EvalResult<()> {
    match scope {
        Some(level) if !level.declares_global(name) => {
            match level.vars.borrow_mut().remove(name) {
                Some(_) => Ok(()),
                None => Err(unbound_local(name)),
            }
        }
        _ => match globals.borrow_mut().remove(name) {
            Some(_) => Ok(()),
            None => Err(name_error(name)),
        },
    }
}
