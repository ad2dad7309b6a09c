//! Bound parameter registry.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::SqlValue;

/// Identity of a query parameter.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParamKey(String);

impl ParamKey {
    /// Creates a parameter key from its name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the parameter name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ":{}", self.0)
    }
}

impl From<&str> for ParamKey {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Mapping from parameter identity to bound value, ordered by key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParamRegistry {
    bindings: BTreeMap<ParamKey, SqlValue>,
}

impl ParamRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `value` to `key`, returning the value it replaced.
    pub fn bind(&mut self, key: ParamKey, value: SqlValue) -> Option<SqlValue> {
        self.bindings.insert(key, value)
    }

    /// Registers every binding in `bindings`, later entries winning.
    pub fn extend(&mut self, bindings: impl IntoIterator<Item = (ParamKey, SqlValue)>) {
        self.bindings.extend(bindings);
    }

    /// Returns the value bound to `key`.
    #[must_use]
    pub fn get(&self, key: &ParamKey) -> Option<&SqlValue> {
        self.bindings.get(key)
    }

    /// Iterates bindings in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&ParamKey, &SqlValue)> {
        self.bindings.iter()
    }

    /// Returns the number of bound parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Returns `true` if nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Returns the underlying map.
    #[must_use]
    pub const fn as_map(&self) -> &BTreeMap<ParamKey, SqlValue> {
        &self.bindings
    }
}

impl<'a> IntoIterator for &'a ParamRegistry {
    type Item = (&'a ParamKey, &'a SqlValue);
    type IntoIter = std::collections::btree_map::Iter<'a, ParamKey, SqlValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.bindings.iter()
    }
}
