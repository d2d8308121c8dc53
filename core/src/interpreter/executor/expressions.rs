//! Expression evaluation

use std::rc::Rc;

use super::env::{self, Scope, ScopeRef};
use super::operators;
use super::Interpreter;
use crate::interpreter::errors::{attribute_error, type_error, EvalResult};
use crate::interpreter::stdlib::format::{format_value, try_repr, try_str};
use crate::interpreter::stdlib::{methods, CallArgs};
use crate::interpreter::types::{
    Arg, BoolOp, BoundMethod, CmpOp, CompClause, Comprehension, Dict, Expr, FStringPart, Function,
    FunctionDef, Val,
};

/// Evaluated subscript of `value[...]`
pub enum Subscript {
    Item(Val),
    Slice(Option<i64>, Option<i64>, Option<i64>),
}

impl Interpreter {
    pub(crate) fn eval(&mut self, expr: &Expr, scope: ScopeRef<'_>) -> EvalResult {
        match expr {
            Expr::LitNone => Ok(Val::None),
            Expr::LitBool { v } => Ok(Val::Bool(*v)),
            Expr::LitInt { v } => Ok(Val::Int(*v)),
            Expr::LitFloat { v } => Ok(Val::Float(*v)),
            Expr::LitStr { v } => Ok(Val::Str(v.clone())),
            Expr::FString { parts } => self.eval_fstring(parts, scope),
            Expr::Name { name } => env::lookup(&self.globals, scope, name),

            Expr::List { items } => Ok(Val::list(self.eval_all(items, scope)?)),
            Expr::Tuple { items } => Ok(Val::tuple(self.eval_all(items, scope)?)),
            Expr::Dict { items } => {
                let mut dict = Dict::new();
                for (key, value) in items {
                    let key = self.eval(key, scope)?;
                    let value = self.eval(value, scope)?;
                    dict.insert(key, value)?;
                }
                Ok(Val::dict(dict))
            }
            Expr::ListComp { elt, comp } => {
                let mut out = Vec::new();
                self.eval_comprehension(comp, scope, &mut |interp, inner| {
                    out.push(interp.eval(elt, inner)?);
                    Ok(())
                })?;
                Ok(Val::list(out))
            }
            Expr::DictComp { key, value, comp } => {
                let mut dict = Dict::new();
                self.eval_comprehension(comp, scope, &mut |interp, inner| {
                    let k = interp.eval(key, inner)?;
                    let v = interp.eval(value, inner)?;
                    dict.insert(k, v)
                })?;
                Ok(Val::dict(dict))
            }
            Expr::GenExp { elt, comp } => self.make_generator(elt, comp, scope),

            Expr::BinOp { op, left, right } => {
                let left = self.eval(left, scope)?;
                let right = self.eval(right, scope)?;
                operators::binary_op(*op, &left, &right)
            }
            Expr::UnaryOp { op, operand } => {
                let operand = self.eval(operand, scope)?;
                operators::unary_op(*op, &operand)
            }
            Expr::BoolOp { op, left, right } => {
                let left = self.eval(left, scope)?;
                let short_circuit = match op {
                    BoolOp::And => !left.is_truthy(),
                    BoolOp::Or => left.is_truthy(),
                };
                if short_circuit {
                    Ok(left)
                } else {
                    self.eval(right, scope)
                }
            }
            Expr::Compare { left, ops } => {
                let mut left = self.eval(left, scope)?;
                for (op, right) in ops {
                    let right = self.eval(right, scope)?;
                    let holds = match (op, &right) {
                        (CmpOp::In, Val::Iter(object)) => self.iter_contains(object, &left)?,
                        (CmpOp::NotIn, Val::Iter(object)) => !self.iter_contains(object, &left)?,
                        _ => operators::compare(*op, &left, &right)?,
                    };
                    if !holds {
                        return Ok(Val::Bool(false));
                    }
                    left = right;
                }
                Ok(Val::Bool(true))
            }
            Expr::IfExp { test, body, orelse } => {
                if self.eval(test, scope)?.is_truthy() {
                    self.eval(body, scope)
                } else {
                    self.eval(orelse, scope)
                }
            }

            Expr::Call { func, args } => self.eval_call(func, args, scope),
            Expr::Attribute { value, attr } => {
                let value = self.eval(value, scope)?;
                get_attribute(&value, attr)
            }
            Expr::Subscript { value, index } => {
                let container = self.eval(value, scope)?;
                match self.eval_subscript(index, scope)? {
                    Subscript::Item(key) => operators::getitem(&container, &key),
                    Subscript::Slice(lower, upper, step) => {
                        operators::get_slice(&container, lower, upper, step)
                    }
                }
            }
            Expr::Slice { .. } => Err(type_error("slice is only valid inside a subscript")),
            Expr::Lambda(def) => self.make_function(def, scope),
        }
    }

    fn eval_all(&mut self, items: &[Expr], scope: ScopeRef<'_>) -> EvalResult<Vec<Val>> {
        items.iter().map(|item| self.eval(item, scope)).collect()
    }

    fn eval_fstring(&mut self, parts: &[FStringPart], scope: ScopeRef<'_>) -> EvalResult {
        self.render_fstring(parts, scope).map(Val::Str)
    }

    fn render_fstring(&mut self, parts: &[FStringPart], scope: ScopeRef<'_>) -> EvalResult<String> {
        let mut out = String::new();
        for part in parts {
            match part {
                FStringPart::Literal(text) => out.push_str(text),
                FStringPart::Field {
                    expr,
                    conversion,
                    spec,
                } => {
                    let value = self.eval(expr, scope)?;
                    let value = match conversion {
                        Some('r') | Some('a') => Val::Str(try_repr(&value)?),
                        Some('s') => Val::Str(try_str(&value)?),
                        _ => value,
                    };
                    let spec = self.render_fstring(spec, scope)?;
                    out.push_str(&format_value(&value, &spec)?);
                }
            }
        }
        Ok(out)
    }

    /* ===================== Calls ===================== */

    fn eval_call(&mut self, func: &Expr, args: &[Arg], scope: ScopeRef<'_>) -> EvalResult {
        let callee = self.eval(func, scope)?;
        let mut call_args = CallArgs::default();
        for arg in args {
            match arg {
                Arg::Positional(expr) => call_args.positional.push(self.eval(expr, scope)?),
                Arg::Star(expr) => {
                    let value = self.eval(expr, scope)?;
                    let mut items = self.iterate(&value).map_err(|_| {
                        type_error(format!(
                            "{}() argument after * must be an iterable, not {}",
                            callable_name(&callee),
                            value.type_name()
                        ))
                    })?;
                    while let Some(item) = self.next_item(&mut items)? {
                        call_args.positional.push(item);
                    }
                }
                Arg::Keyword(name, expr) => {
                    let value = self.eval(expr, scope)?;
                    call_args.keywords.push((name.clone(), value));
                }
            }
        }
        self.call_value(&callee, call_args)
    }

    /// Function value for a `def` or `lambda`; defaults are evaluated now
    pub(super) fn make_function(&mut self, def: &Rc<FunctionDef>, scope: ScopeRef<'_>) -> EvalResult {
        let mut defaults = Vec::new();
        for param in &def.params {
            if let Some(default) = &param.default {
                defaults.push(self.eval(default, scope)?);
            }
        }
        Ok(Val::Function(Rc::new(Function {
            def: def.clone(),
            defaults,
            closure: scope.cloned(),
        })))
    }

    /* ===================== Subscripts ===================== */

    pub(super) fn eval_subscript(&mut self, index: &Expr, scope: ScopeRef<'_>) -> EvalResult<Subscript> {
        if let Expr::Slice { lower, upper, step } = index {
            let lower = self.slice_bound(lower.as_deref(), scope)?;
            let upper = self.slice_bound(upper.as_deref(), scope)?;
            let step = self.slice_bound(step.as_deref(), scope)?;
            return Ok(Subscript::Slice(lower, upper, step));
        }
        Ok(Subscript::Item(self.eval(index, scope)?))
    }

    fn slice_bound(&mut self, bound: Option<&Expr>, scope: ScopeRef<'_>) -> EvalResult<Option<i64>> {
        let Some(expr) = bound else {
            return Ok(None);
        };
        match self.eval(expr, scope)? {
            Val::None => Ok(None),
            Val::Int(i) => Ok(Some(i)),
            Val::Bool(b) => Ok(Some(b as i64)),
            _ => Err(type_error(
                "slice indices must be integers or None or have an __index__ method",
            )),
        }
    }

    /* ===================== Comprehensions ===================== */

    /// Run the clauses of a comprehension, calling `emit` once per produced
    /// element
    ///
    /// The first iterable is evaluated in the enclosing scope; everything
    /// else runs in a fresh scope holding the loop targets.
    fn eval_comprehension(
        &mut self,
        comp: &Rc<Comprehension>,
        scope: ScopeRef<'_>,
        emit: &mut dyn FnMut(&mut Interpreter, ScopeRef<'_>) -> EvalResult<()>,
    ) -> EvalResult<()> {
        let inner = Scope::comprehension(comp.clone(), scope.cloned());
        self.run_clauses(&comp.clauses, scope, &inner, emit)
    }

    fn run_clauses(
        &mut self,
        clauses: &[CompClause],
        outer: ScopeRef<'_>,
        inner: &Rc<Scope>,
        emit: &mut dyn FnMut(&mut Interpreter, ScopeRef<'_>) -> EvalResult<()>,
    ) -> EvalResult<()> {
        let Some((clause, rest)) = clauses.split_first() else {
            return emit(self, Some(inner));
        };
        match clause {
            CompClause::For { target, iter } => {
                let iterable = self.eval(iter, outer)?;
                let mut items = self.iterate(&iterable)?;
                while let Some(item) = self.next_item(&mut items)? {
                    self.assign(target, item, Some(inner))?;
                    // Later iterables see the loop variables
                    self.run_clauses(rest, Some(inner), inner, emit)?;
                }
                Ok(())
            }
            CompClause::If { test } => {
                if self.eval(test, Some(inner))?.is_truthy() {
                    self.run_clauses(rest, Some(inner), inner, emit)
                } else {
                    Ok(())
                }
            }
        }
    }
}

/// `value.attr`
pub fn get_attribute(value: &Val, attr: &str) -> EvalResult {
    match (value, attr) {
        (Val::Exception(exc), "args") => Ok(Val::tuple(exc.args.clone())),
        (Val::Type(ty), "__name__") => Ok(Val::str(ty.name())),
        (Val::Function(function), "__name__") => Ok(Val::str(function.def.name.as_str())),
        (Val::Builtin(builtin), "__name__") => Ok(Val::str(builtin.name())),
        _ if methods::has_method(value, attr) => Ok(Val::Method(Rc::new(BoundMethod {
            receiver: value.clone(),
            name: attr.to_string(),
        }))),
        _ => Err(attribute_error(value, attr)),
    }
}

fn callable_name(callee: &Val) -> String {
    match callee {
        Val::Function(function) => function.def.name.clone(),
        Val::Builtin(builtin) => builtin.name().to_string(),
        Val::Type(ty) => ty.name().to_string(),
        Val::Method(method) => format!("{}.{}", method.receiver.type_name(), method.name),
        other => other.type_name().to_string(),
    }
}
