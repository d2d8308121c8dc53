//! Statement execution

use std::rc::Rc;

use super::env::{self, ScopeRef};
use super::expressions::Subscript;
use super::operators;
use super::Interpreter;
use crate::interpreter::errors::{
    attribute_error, type_error, value_error, EvalResult, ExcKind, Exception,
};
use crate::interpreter::stdlib::methods;
use crate::interpreter::types::{BinOp, Control, ExceptHandler, Expr, PyType, Stmt, Val};

impl Interpreter {
    /// Run statements in order, stopping at the first non-`None` control
    pub(crate) fn exec_block(&mut self, body: &[Stmt], scope: ScopeRef<'_>) -> EvalResult<Control> {
        for stmt in body {
            let control = self.exec_stmt(stmt, scope)?;
            if !control.is_none() {
                return Ok(control);
            }
        }
        Ok(Control::None)
    }

    fn exec_stmt(&mut self, stmt: &Stmt, scope: ScopeRef<'_>) -> EvalResult<Control> {
        match stmt {
            Stmt::Expr { expr } => {
                self.eval(expr, scope)?;
            }
            Stmt::Assign { targets, value } => {
                let value = self.eval(value, scope)?;
                for target in targets {
                    self.assign(target, value.clone(), scope)?;
                }
            }
            Stmt::AugAssign { target, op, value } => self.aug_assign(target, *op, value, scope)?,
            Stmt::If {
                test,
                then_s,
                else_s,
            } => {
                let branch = if self.eval(test, scope)?.is_truthy() {
                    then_s
                } else {
                    else_s
                };
                return self.exec_block(branch, scope);
            }
            Stmt::While { test, body, orelse } => {
                while self.eval(test, scope)?.is_truthy() {
                    match self.exec_block(body, scope)? {
                        Control::Break => return Ok(Control::None),
                        Control::Return(value) => return Ok(Control::Return(value)),
                        Control::Continue | Control::None => {}
                    }
                }
                return self.exec_block(orelse, scope);
            }
            Stmt::For {
                target,
                iter,
                body,
                orelse,
            } => {
                let iterable = self.eval(iter, scope)?;
                let mut items = self.iterate(&iterable)?;
                while let Some(item) = self.next_item(&mut items)? {
                    self.assign(target, item, scope)?;
                    match self.exec_block(body, scope)? {
                        Control::Break => return Ok(Control::None),
                        Control::Return(value) => return Ok(Control::Return(value)),
                        Control::Continue | Control::None => {}
                    }
                }
                return self.exec_block(orelse, scope);
            }
            Stmt::Try {
                body,
                handlers,
                orelse,
                finalbody,
            } => return self.exec_try(body, handlers, orelse, finalbody, scope),
            Stmt::FunctionDef(def) => {
                let function = self.make_function(def, scope)?;
                env::store(&self.globals, scope, &def.name, function);
            }
            Stmt::Return { value } => {
                let value = match value {
                    Some(expr) => self.eval(expr, scope)?,
                    None => Val::None,
                };
                return Ok(Control::Return(value));
            }
            Stmt::Raise { exc } => return Err(self.raised(exc.as_ref(), scope)),
            Stmt::Assert { test, msg } => {
                if !self.eval(test, scope)?.is_truthy() {
                    let args = match msg {
                        Some(msg) => vec![self.eval(msg, scope)?],
                        None => Vec::new(),
                    };
                    return Err(Exception::with_args(ExcKind::AssertionError, args));
                }
            }
            Stmt::Delete { targets } => {
                for target in targets {
                    self.delete(target, scope)?;
                }
            }
            Stmt::Break => return Ok(Control::Break),
            Stmt::Continue => return Ok(Control::Continue),
            Stmt::Global { .. } | Stmt::Pass => {}
        }
        Ok(Control::None)
    }

    /* ===================== Exceptions ===================== */

    fn exec_try(
        &mut self,
        body: &[Stmt],
        handlers: &[ExceptHandler],
        orelse: &[Stmt],
        finalbody: &[Stmt],
        scope: ScopeRef<'_>,
    ) -> EvalResult<Control> {
        let outcome = match self.exec_block(body, scope) {
            Ok(Control::None) => self.exec_block(orelse, scope),
            Ok(control) => Ok(control),
            Err(exc) => self.handle(exc, handlers, scope),
        };

        if finalbody.is_empty() {
            return outcome;
        }
        // A break/continue/return in `finally` discards the pending outcome
        match self.exec_block(finalbody, scope)? {
            Control::None => outcome,
            control => Ok(control),
        }
    }

    fn handle(
        &mut self,
        exc: Exception,
        handlers: &[ExceptHandler],
        scope: ScopeRef<'_>,
    ) -> EvalResult<Control> {
        for handler in handlers {
            if let Some(kind) = &handler.kind {
                let matcher = self.eval(kind, scope)?;
                if !exception_matches(&exc, &matcher)? {
                    continue;
                }
            }

            let exc = Rc::new(exc);
            if let Some(name) = &handler.name {
                env::store(&self.globals, scope, name, Val::Exception(exc.clone()));
            }
            self.handling.push(exc);
            let result = self.exec_block(&handler.body, scope);
            self.handling.pop();
            if let Some(name) = &handler.name {
                // The handler body may already have deleted it
                let _ = env::delete(&self.globals, scope, name);
            }
            return result;
        }
        Err(exc)
    }

    /// The exception a `raise` statement throws
    fn raised(&mut self, exc: Option<&Expr>, scope: ScopeRef<'_>) -> Exception {
        let Some(expr) = exc else {
            return match self.handling.last() {
                Some(active) => (**active).clone(),
                None => Exception::new(ExcKind::RuntimeError, "No active exception to reraise"),
            };
        };
        match self.eval(expr, scope) {
            Err(err) => err,
            Ok(Val::Exception(exc)) => (*exc).clone(),
            Ok(Val::Type(PyType::Exception(kind))) => Exception::with_args(kind, Vec::new()),
            Ok(_) => type_error("exceptions must derive from BaseException"),
        }
    }

    /* ===================== Assignment ===================== */

    pub(super) fn assign(&mut self, target: &Expr, value: Val, scope: ScopeRef<'_>) -> EvalResult<()> {
        match target {
            Expr::Name { name } => {
                env::store(&self.globals, scope, name, value);
                Ok(())
            }
            Expr::Tuple { items } | Expr::List { items } => {
                let mut cursor = self.iterate(&value).map_err(|_| {
                    type_error(format!(
                        "cannot unpack non-iterable {} object",
                        value.type_name()
                    ))
                })?;
                let mut values = Vec::new();
                while let Some(item) = self.next_item(&mut cursor)? {
                    values.push(item);
                }
                if values.len() > items.len() {
                    return Err(value_error(format!(
                        "too many values to unpack (expected {})",
                        items.len()
                    )));
                }
                if values.len() < items.len() {
                    return Err(value_error(format!(
                        "not enough values to unpack (expected {}, got {})",
                        items.len(),
                        values.len()
                    )));
                }
                for (item, value) in items.iter().zip(values) {
                    self.assign(item, value, scope)?;
                }
                Ok(())
            }
            Expr::Subscript { value: container, index } => {
                let container = self.eval(container, scope)?;
                match self.eval_subscript(index, scope)? {
                    Subscript::Item(key) => operators::setitem(&container, &key, value),
                    Subscript::Slice(lower, upper, step) => {
                        let value = match value {
                            Val::Iter(_) => Val::list(self.collect(&value)?),
                            other => other,
                        };
                        operators::set_slice(&container, lower, upper, step, &value)
                    }
                }
            }
            Expr::Attribute { value: object, attr } => {
                let object = self.eval(object, scope)?;
                Err(read_only_attribute(&object, attr))
            }
            _ => Err(type_error("cannot assign to expression")),
        }
    }

    fn aug_assign(
        &mut self,
        target: &Expr,
        op: BinOp,
        value: &Expr,
        scope: ScopeRef<'_>,
    ) -> EvalResult<()> {
        match target {
            Expr::Name { name } => {
                let current = env::lookup(&self.globals, scope, name)?;
                let rhs = self.eval(value, scope)?;
                let result = self.in_place(op, current, &rhs)?;
                env::store(&self.globals, scope, name, result);
                Ok(())
            }
            Expr::Subscript { value: container, index } => {
                let container = self.eval(container, scope)?;
                match self.eval_subscript(index, scope)? {
                    Subscript::Item(key) => {
                        let current = operators::getitem(&container, &key)?;
                        let rhs = self.eval(value, scope)?;
                        let result = self.in_place(op, current, &rhs)?;
                        operators::setitem(&container, &key, result)
                    }
                    Subscript::Slice(lower, upper, step) => {
                        let current = operators::get_slice(&container, lower, upper, step)?;
                        let rhs = self.eval(value, scope)?;
                        let result = self.in_place(op, current, &rhs)?;
                        operators::set_slice(&container, lower, upper, step, &result)
                    }
                }
            }
            Expr::Attribute { value: object, attr } => {
                let object = self.eval(object, scope)?;
                Err(read_only_attribute(&object, attr))
            }
            _ => Err(type_error("illegal expression for augmented assignment")),
        }
    }

    /// `target op= value`; lists extend in place so aliases see the change
    fn in_place(&mut self, op: BinOp, current: Val, rhs: &Val) -> EvalResult {
        if op == BinOp::Add {
            if let Val::List(items) = &current {
                let extra = self.collect(rhs)?;
                items.borrow_mut().extend(extra);
                return Ok(current);
            }
        }
        operators::binary_op(op, &current, rhs)
    }

    fn delete(&mut self, target: &Expr, scope: ScopeRef<'_>) -> EvalResult<()> {
        match target {
            Expr::Name { name } => env::delete(&self.globals, scope, name),
            Expr::Tuple { items } | Expr::List { items } => {
                for item in items {
                    self.delete(item, scope)?;
                }
                Ok(())
            }
            Expr::Subscript { value: container, index } => {
                let container = self.eval(container, scope)?;
                match self.eval_subscript(index, scope)? {
                    Subscript::Item(key) => operators::delitem(&container, &key),
                    Subscript::Slice(lower, upper, step) => {
                        operators::del_slice(&container, lower, upper, step)
                    }
                }
            }
            Expr::Attribute { value: object, attr } => {
                let object = self.eval(object, scope)?;
                Err(read_only_attribute(&object, attr))
            }
            _ => Err(type_error("cannot delete expression")),
        }
    }
}


fn exception_matches(exc: &Exception, matcher: &Val) -> EvalResult<bool> {
    match matcher {
        Val::Type(PyType::Exception(kind)) => Ok(exc.kind.is_subclass_of(*kind)),
        Val::Tuple(options) => {
            for option in options.iter() {
                if exception_matches(exc, option)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        _ => Err(type_error(
            "catching classes that do not inherit from BaseException is not allowed",
        )),
    }
}

fn read_only_attribute(object: &Val, attr: &str) -> Exception {
    if methods::has_method(object, attr) {
        Exception::new(
            ExcKind::AttributeError,
            format!(
                "'{}' object attribute '{}' is read-only",
                object.type_name(),
                attr
            ),
        )
    } else {
        attribute_error(object, attr)
    }
}
