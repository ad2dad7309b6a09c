//! Join records and the registry that owns them.
//!
//! Joins live in an arena addressed by [`JoinId`]. The registry keeps the
//! ids in insertion order; the current join is always the last one inserted.
//! Follow-up calls (conditions, flags) reach the record through its id
//! instead of through a shared reference, so cloning the registry is a plain
//! deep copy.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{QueryError, Result};
use crate::expr::{Expression, fold_conjunction, require_all};
use crate::flag::JoinFlag;
use crate::params::ParamKey;
use crate::value::SqlValue;

/// Join type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinType {
    /// Join kind left to the compiler (typically a plain FROM entry).
    #[default]
    Default,
    /// INNER JOIN.
    Inner,
    /// LEFT OUTER JOIN.
    Left,
    /// RIGHT OUTER JOIN.
    Right,
    /// FULL OUTER JOIN.
    Full,
    /// CROSS JOIN.
    Cross,
}

impl JoinType {
    /// Returns a short lowercase name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Inner => "inner",
            Self::Left => "left",
            Self::Right => "right",
            Self::Full => "full",
            Self::Cross => "cross",
        }
    }
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Index of a join record in its registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JoinId(usize);

impl JoinId {
    /// Returns the position of the join in insertion order.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// A single join: type, target, its own flags and an optional condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinExpression<E> {
    join_type: JoinType,
    target: E,
    #[serde(default = "Vec::new", skip_serializing_if = "Vec::is_empty")]
    flags: Vec<JoinFlag<E>>,
    #[serde(default = "Option::default", skip_serializing_if = "Option::is_none")]
    condition: Option<E>,
}

impl<E> JoinExpression<E> {
    /// Creates a join without flags or condition.
    #[must_use]
    pub const fn new(join_type: JoinType, target: E) -> Self {
        Self {
            join_type,
            target,
            flags: Vec::new(),
            condition: None,
        }
    }

    /// Returns the join type.
    #[must_use]
    pub const fn join_type(&self) -> JoinType {
        self.join_type
    }

    /// Returns the join target.
    #[must_use]
    pub const fn target(&self) -> &E {
        &self.target
    }

    /// Returns the join's own flags in insertion order.
    #[must_use]
    pub fn flags(&self) -> &[JoinFlag<E>] {
        &self.flags
    }

    /// Returns the join condition.
    #[must_use]
    pub const fn condition(&self) -> Option<&E> {
        self.condition.as_ref()
    }

    /// Appends a flag to this join.
    pub fn add_flag(&mut self, flag: JoinFlag<E>) {
        self.flags.push(flag);
    }
}

impl<E: PartialEq> JoinExpression<E> {
    /// Returns `true` if this join carries `flag`.
    #[must_use]
    pub fn has_flag(&self, flag: &JoinFlag<E>) -> bool {
        self.flags.contains(flag)
    }
}

impl<E: Expression> JoinExpression<E> {
    /// Folds predicates into the join condition by conjunction.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidArgument`] if no predicate is given or
    /// one of them is missing; the condition is left unchanged.
    pub fn add_condition<I>(&mut self, predicates: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Into<Option<E>>,
    {
        let predicates = require_all("add_join_condition", predicates)?;
        fold_conjunction(&mut self.condition, predicates);
        Ok(())
    }

    /// Parameters bound in the target, flags and condition, in that order.
    pub(crate) fn bound_params(&self) -> Vec<(ParamKey, SqlValue)> {
        let mut params = self.target.bound_params();
        for flag in &self.flags {
            params.extend(flag.payload.bound_params());
        }
        if let Some(condition) = &self.condition {
            params.extend(condition.bound_params());
        }
        params
    }
}

impl<E: fmt::Display> fmt::Display for JoinExpression<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.join_type, self.target)?;
        if let Some(condition) = &self.condition {
            write!(f, " on {condition}")?;
        }
        Ok(())
    }
}

/// Ordered joins of a query.
#[derive(Debug, Clone)]
pub struct JoinRegistry<E> {
    arena: Vec<JoinExpression<E>>,
    order: Vec<JoinId>,
}

impl<E> Default for JoinRegistry<E> {
    fn default() -> Self {
        Self {
            arena: Vec::new(),
            order: Vec::new(),
        }
    }
}

impl<E> JoinRegistry<E> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn from_records(records: Vec<JoinExpression<E>>) -> Self {
        let order = (0..records.len()).map(JoinId).collect();
        Self {
            arena: records,
            order,
        }
    }

    /// Appends a join and makes it the current one.
    pub fn push(&mut self, join: JoinExpression<E>) -> JoinId {
        let id = JoinId(self.arena.len());
        self.arena.push(join);
        self.order.push(id);
        id
    }

    /// Returns the id of the current (last added) join.
    #[must_use]
    pub fn current_id(&self) -> Option<JoinId> {
        self.order.last().copied()
    }

    /// Returns the current join.
    #[must_use]
    pub fn current(&self) -> Option<&JoinExpression<E>> {
        self.current_id().and_then(|id| self.get(id))
    }

    /// Returns the current join mutably.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidState`] if no join has been added.
    pub fn current_mut(&mut self) -> Result<&mut JoinExpression<E>> {
        let id = self
            .current_id()
            .ok_or_else(|| QueryError::invalid_state("no join has been added yet"))?;
        self.get_mut(id)
    }

    /// Returns the join with the given id.
    #[must_use]
    pub fn get(&self, id: JoinId) -> Option<&JoinExpression<E>> {
        self.arena.get(id.0)
    }

    /// Returns the join with the given id mutably.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidArgument`] if the id does not belong to
    /// this registry.
    pub fn get_mut(&mut self, id: JoinId) -> Result<&mut JoinExpression<E>> {
        self.arena
            .get_mut(id.0)
            .ok_or_else(|| QueryError::invalid_argument(format!("unknown join id {}", id.0)))
    }

    /// Iterates joins in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &JoinExpression<E>> {
        self.order.iter().map(|id| &self.arena[id.0])
    }

    /// Returns the join ids in insertion order.
    #[must_use]
    pub fn ids(&self) -> &[JoinId] {
        &self.order
    }

    /// Returns the number of joins.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` if no join has been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl<E: PartialEq> PartialEq for JoinRegistry<E> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<E: Eq> Eq for JoinRegistry<E> {}

impl<E: PartialEq> PartialEq<[JoinExpression<E>]> for JoinRegistry<E> {
    fn eq(&self, other: &[JoinExpression<E>]) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<E: PartialEq> PartialEq<Vec<JoinExpression<E>>> for JoinRegistry<E> {
    fn eq(&self, other: &Vec<JoinExpression<E>>) -> bool {
        *self == **other
    }
}

impl<E: Serialize> Serialize for JoinRegistry<E> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de, E: Deserialize<'de>> Deserialize<'de> for JoinRegistry<E> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Vec::<JoinExpression<E>>::deserialize(deserializer).map(Self::from_records)
    }
}

impl<'a, E> IntoIterator for &'a JoinRegistry<E> {
    type Item = &'a JoinExpression<E>;
    type IntoIter = Box<dyn Iterator<Item = &'a JoinExpression<E>> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}
