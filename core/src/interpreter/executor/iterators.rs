//! Lazy iteration
//!
//! `map`, `filter`, `zip`, `enumerate`, `reversed`, `iter` and generator
//! expressions produce iterator objects that pull one item from their
//! sources per step. Every consumer walks values through a [`Cursor`], so a
//! `for` loop over `map(f, xs)` interleaves calls to `f` with the loop body.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::env::Scope;
use super::operators::{self, ValIter};
use super::Interpreter;
use crate::interpreter::errors::{overflow_error, value_error, EvalResult};
use crate::interpreter::stdlib::CallArgs;
use crate::interpreter::types::{CompClause, Comprehension, Expr, Val};

/// Position in an iteration
pub enum Cursor {
    /// Snapshot or range of a plain value
    Values(ValIter),
    /// Shared iterator object; advancing it is visible to every holder
    Object(Rc<IterObject>),
}

/// A script-visible iterator (`map object`, `generator object`, ...)
pub struct IterObject {
    name: &'static str,
    state: RefCell<IterState>,
}

enum IterState {
    Values(ValIter),
    Map { func: Val, sources: Vec<Cursor> },
    Filter { func: Val, source: Cursor },
    Zip { sources: Vec<Cursor> },
    Enumerate { source: Cursor, count: i64 },
    Generator(Box<Generator>),
    Running,
    Exhausted,
}

/// Suspended generator expression
struct Generator {
    elt: Rc<Expr>,
    comp: Rc<Comprehension>,
    scope: Rc<Scope>,
    /// Open `for` clauses, outermost first, with the clause index of each
    frames: Vec<(usize, Cursor)>,
}

impl IterObject {
    fn new(name: &'static str, state: IterState) -> Val {
        Val::Iter(Rc::new(IterObject {
            name,
            state: RefCell::new(state),
        }))
    }

    /// Class name, e.g. `map` or `generator`
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn map(func: Val, sources: Vec<Cursor>) -> Val {
        IterObject::new("map", IterState::Map { func, sources })
    }

    pub fn filter(func: Val, source: Cursor) -> Val {
        IterObject::new("filter", IterState::Filter { func, source })
    }

    pub fn zip(sources: Vec<Cursor>) -> Val {
        IterObject::new("zip", IterState::Zip { sources })
    }

    pub fn enumerate(source: Cursor, start: i64) -> Val {
        IterObject::new("enumerate", IterState::Enumerate { source, count: start })
    }

    /// Iterator over a snapshot or range, named after its source
    pub fn values(name: &'static str, values: ValIter) -> Val {
        IterObject::new(name, IterState::Values(values))
    }
}

impl fmt::Debug for IterObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} object>", self.name)
    }
}

impl Interpreter {
    /// Start iterating `value`
    pub fn iterate(&mut self, value: &Val) -> EvalResult<Cursor> {
        match value {
            Val::Iter(object) => Ok(Cursor::Object(object.clone())),
            other => Ok(Cursor::Values(operators::iterate(other)?)),
        }
    }

    /// Next item of a cursor, `None` once exhausted
    pub fn next_item(&mut self, cursor: &mut Cursor) -> EvalResult<Option<Val>> {
        match cursor {
            Cursor::Values(values) => Ok(values.next()),
            Cursor::Object(object) => self.advance_object(object),
        }
    }

    /// All remaining items of `value`
    pub fn collect(&mut self, value: &Val) -> EvalResult<Vec<Val>> {
        let mut cursor = self.iterate(value)?;
        let mut out = Vec::new();
        while let Some(item) = self.next_item(&mut cursor)? {
            out.push(item);
        }
        Ok(out)
    }

    /// `needle in iterator`, consuming items up to the first match
    pub fn iter_contains(&mut self, object: &Rc<IterObject>, needle: &Val) -> EvalResult<bool> {
        let mut cursor = Cursor::Object(object.clone());
        while let Some(item) = self.next_item(&mut cursor)? {
            if operators::py_eq(&item, needle) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Generator object for `(elt for ...)`
    ///
    /// The first iterable is evaluated now in the enclosing scope; the rest
    /// of the clauses run as items are requested.
    pub(super) fn make_generator(
        &mut self,
        elt: &Rc<Expr>,
        comp: &Rc<Comprehension>,
        scope: Option<&Rc<Scope>>,
    ) -> EvalResult {
        let mut frames = Vec::new();
        if let Some(CompClause::For { iter, .. }) = comp.clauses.first() {
            let iterable = self.eval(iter, scope)?;
            frames.push((0, self.iterate(&iterable)?));
        }
        let generator = Generator {
            elt: elt.clone(),
            comp: comp.clone(),
            scope: Scope::comprehension(comp.clone(), scope.cloned()),
            frames,
        };
        Ok(IterObject::new(
            "generator",
            IterState::Generator(Box::new(generator)),
        ))
    }

    fn advance_object(&mut self, object: &IterObject) -> EvalResult<Option<Val>> {
        // The state is moved out while stepping so nested use of the same
        // object is caught instead of double-borrowing
        let mut state = object.state.replace(IterState::Running);
        if let IterState::Running = state {
            return Err(value_error(format!("{} already executing", object.name)));
        }
        let result = self.advance_state(&mut state);
        let finished = match &result {
            Ok(None) => true,
            Err(_) => matches!(state, IterState::Generator(_)),
            Ok(Some(_)) => false,
        };
        object
            .state
            .replace(if finished { IterState::Exhausted } else { state });
        result
    }

    fn advance_state(&mut self, state: &mut IterState) -> EvalResult<Option<Val>> {
        match state {
            IterState::Values(values) => Ok(values.next()),
            IterState::Map { func, sources } => {
                let Some(row) = self.next_row(sources)? else {
                    return Ok(None);
                };
                self.call_value(func, CallArgs::positional(row)).map(Some)
            }
            IterState::Filter { func, source } => {
                while let Some(item) = self.next_item(source)? {
                    let keep = match func {
                        Val::None => item.is_truthy(),
                        ref func => self
                            .call_value(func, CallArgs::positional(vec![item.clone()]))?
                            .is_truthy(),
                    };
                    if keep {
                        return Ok(Some(item));
                    }
                }
                Ok(None)
            }
            IterState::Zip { sources } => Ok(self.next_row(sources)?.map(Val::tuple)),
            IterState::Enumerate { source, count } => {
                let Some(item) = self.next_item(source)? else {
                    return Ok(None);
                };
                let idx = *count;
                *count = count.checked_add(1).ok_or_else(overflow_error)?;
                Ok(Some(Val::tuple(vec![Val::Int(idx), item])))
            }
            IterState::Generator(generator) => self.resume(generator),
            IterState::Running | IterState::Exhausted => Ok(None),
        }
    }

    /// One item from each source, stopping at the shortest
    fn next_row(&mut self, sources: &mut [Cursor]) -> EvalResult<Option<Vec<Val>>> {
        if sources.is_empty() {
            return Ok(None);
        }
        let mut row = Vec::with_capacity(sources.len());
        for source in sources.iter_mut() {
            match self.next_item(source)? {
                Some(item) => row.push(item),
                None => return Ok(None),
            }
        }
        Ok(Some(row))
    }

    /// Run a generator until it produces its next element
    fn resume(&mut self, generator: &mut Generator) -> EvalResult<Option<Val>> {
        let comp = generator.comp.clone();
        let scope = Some(&generator.scope);
        'pull: loop {
            let Some((idx, cursor)) = generator.frames.last_mut() else {
                return Ok(None);
            };
            let idx = *idx;
            let Some(item) = self.next_item(cursor)? else {
                generator.frames.pop();
                continue;
            };
            if let CompClause::For { target, .. } = &comp.clauses[idx] {
                self.assign(target, item, scope)?;
            }
            for (pos, clause) in comp.clauses.iter().enumerate().skip(idx + 1) {
                match clause {
                    CompClause::If { test } => {
                        if !self.eval(test, scope)?.is_truthy() {
                            continue 'pull;
                        }
                    }
                    CompClause::For { iter, .. } => {
                        let iterable = self.eval(iter, scope)?;
                        let cursor = self.iterate(&iterable)?;
                        generator.frames.push((pos, cursor));
                        continue 'pull;
                    }
                }
            }
            return self.eval(&generator.elt, scope).map(Some);
        }
    }
}
