//! Scope analysis for function bodies
//!
//! A name bound anywhere in a function body (assignment, `for` target,
//! `except ... as`, nested `def`, `del`) is local to the whole body unless
//! the body declares it `global`. The executor relies on the sets computed
//! here to tell an unbound local apart from a global of the same name.

use std::collections::HashSet;

use super::{ParseError, ParseResult};
use crate::interpreter::types::ast::{Expr, FunctionDef, Param, Stmt};

/// Build a function definition with its local and global name sets
pub fn function_def(
    name: String,
    params: Vec<Param>,
    body: Vec<Stmt>,
    line: usize,
) -> ParseResult<FunctionDef> {
    let mut assigned = HashSet::new();
    let mut globals = HashSet::new();
    collect_block(&body, &mut assigned, &mut globals);

    if let Some(param) = params.iter().find(|p| globals.contains(&p.name)) {
        return Err(ParseError::syntax(
            format!("name '{}' is parameter and global", param.name),
            line,
        ));
    }

    let mut locals: HashSet<String> = params.iter().map(|p| p.name.clone()).collect();
    locals.extend(assigned.into_iter().filter(|n| !globals.contains(n)));

    Ok(FunctionDef {
        name,
        params,
        body,
        locals,
        globals,
    })
}

/// Names bound by an assignment target (`a`, `a, (b, c)`); subscripts and
/// attributes bind nothing
pub fn target_names(target: &Expr, names: &mut HashSet<String>) {
    match target {
        Expr::Name { name } => {
            names.insert(name.clone());
        }
        Expr::Tuple { items } | Expr::List { items } => {
            for item in items {
                target_names(item, names);
            }
        }
        _ => {}
    }
}

fn collect_block(body: &[Stmt], assigned: &mut HashSet<String>, globals: &mut HashSet<String>) {
    for stmt in body {
        collect_stmt(stmt, assigned, globals);
    }
}

// Nested function bodies are not entered; they get their own analysis.
fn collect_stmt(stmt: &Stmt, assigned: &mut HashSet<String>, globals: &mut HashSet<String>) {
    match stmt {
        Stmt::Assign { targets, .. } => {
            for target in targets {
                target_names(target, assigned);
            }
        }
        Stmt::AugAssign { target, .. } => target_names(target, assigned),
        Stmt::Delete { targets } => {
            for target in targets {
                target_names(target, assigned);
            }
        }
        Stmt::If { then_s, else_s, .. } => {
            collect_block(then_s, assigned, globals);
            collect_block(else_s, assigned, globals);
        }
        Stmt::While { body, orelse, .. } => {
            collect_block(body, assigned, globals);
            collect_block(orelse, assigned, globals);
        }
        Stmt::For {
            target,
            body,
            orelse,
            ..
        } => {
            target_names(target, assigned);
            collect_block(body, assigned, globals);
            collect_block(orelse, assigned, globals);
        }
        Stmt::Try {
            body,
            handlers,
            orelse,
            finalbody,
        } => {
            collect_block(body, assigned, globals);
            for handler in handlers {
                if let Some(name) = &handler.name {
                    assigned.insert(name.clone());
                }
                collect_block(&handler.body, assigned, globals);
            }
            collect_block(orelse, assigned, globals);
            collect_block(finalbody, assigned, globals);
        }
        Stmt::FunctionDef(def) => {
            assigned.insert(def.name.clone());
        }
        Stmt::Global { names } => globals.extend(names.iter().cloned()),
        _ => {}
    }
}
