//! Insertion-ordered dictionary storage

use indexmap::IndexMap;

use super::values::Val;
use crate::interpreter::errors::{type_error, EvalResult};

/// Hashable projection of a value
///
/// Numbers that compare equal share a key (`1`, `1.0` and `True` are the same
/// dict key), matching script equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DictKey {
    None,
    Int(i64),
    Float(u64),
    Str(String),
    Tuple(Vec<DictKey>),
}

impl DictKey {
    pub fn from_val(val: &Val) -> EvalResult<DictKey> {
        match val {
            Val::None => Ok(DictKey::None),
            Val::Bool(b) => Ok(DictKey::Int(*b as i64)),
            Val::Int(i) => Ok(DictKey::Int(*i)),
            Val::Float(f) => {
                if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64 {
                    Ok(DictKey::Int(*f as i64))
                } else {
                    Ok(DictKey::Float(f.to_bits()))
                }
            }
            Val::Str(s) => Ok(DictKey::Str(s.clone())),
            Val::Tuple(items) => items
                .iter()
                .map(DictKey::from_val)
                .collect::<EvalResult<Vec<_>>>()
                .map(DictKey::Tuple),
            other => Err(type_error(format!("unhashable type: '{}'", other.type_name()))),
        }
    }
}

/// Dictionary keeping keys in insertion order
///
/// Each entry stores the original key value next to its value so iteration
/// yields the key exactly as first inserted.
#[derive(Debug, Clone, Default)]
pub struct Dict {
    entries: IndexMap<DictKey, (Val, Val)>,
}

impl Dict {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &Val) -> EvalResult<Option<Val>> {
        let key = DictKey::from_val(key)?;
        Ok(self.entries.get(&key).map(|(_, v)| v.clone()))
    }

    pub fn contains(&self, key: &Val) -> EvalResult<bool> {
        Ok(self.entries.contains_key(&DictKey::from_val(key)?))
    }

    /// Insert or overwrite; an existing entry keeps its original key
    pub fn insert(&mut self, key: Val, value: Val) -> EvalResult<()> {
        let hashed = DictKey::from_val(&key)?;
        match self.entries.get_mut(&hashed) {
            Some(slot) => slot.1 = value,
            None => {
                self.entries.insert(hashed, (key, value));
            }
        }
        Ok(())
    }

    pub fn remove(&mut self, key: &Val) -> EvalResult<Option<Val>> {
        let hashed = DictKey::from_val(key)?;
        Ok(self.entries.shift_remove(&hashed).map(|(_, v)| v))
    }

    pub fn pop_last(&mut self) -> Option<(Val, Val)> {
        self.entries.pop().map(|(_, entry)| entry)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn keys(&self) -> Vec<Val> {
        self.entries.values().map(|(k, _)| k.clone()).collect()
    }

    pub fn values(&self) -> Vec<Val> {
        self.entries.values().map(|(_, v)| v.clone()).collect()
    }

    pub fn items(&self) -> Vec<(Val, Val)> {
        self.entries.values().cloned().collect()
    }
}
