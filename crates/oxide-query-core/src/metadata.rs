//! The query metadata aggregate.
//!
//! [`QueryMetadata`] accumulates the clauses of one query while a builder
//! call-chain mutates it, then is handed read-only to a compiler. It owns
//! every container it holds, so [`Clone`] produces a fully independent
//! snapshot.
//!
//! # Example
//!
//! ```rust
//! use oxide_query_core::expr::path;
//! use oxide_query_core::join::JoinType;
//! use oxide_query_core::metadata::QueryMetadata;
//!
//! let name = path("name");
//! let mut metadata = QueryMetadata::new();
//! metadata.add_projection([name.clone()])?;
//! metadata.add_join(JoinType::Default, path("users"));
//! metadata.add_where([name.clone().eq("b"), name.clone().is_not_empty()])?;
//! metadata.set_limit(10)?;
//!
//! assert_eq!(
//!     metadata.where_clause(),
//!     Some(&name.clone().eq("b").and(name.is_not_empty()))
//! );
//! # Ok::<(), oxide_query_core::QueryError>(())
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::error::{QueryError, Result};
use crate::expr::{Expr, Expression, OrderSpecifier, fold_conjunction, require_all};
use crate::flag::{JoinFlag, QueryFlag};
use crate::join::{JoinExpression, JoinId, JoinRegistry, JoinType};
use crate::modifiers::QueryModifiers;
use crate::params::{ParamKey, ParamRegistry};
use crate::value::SqlValue;

fn logged<T>(operation: &'static str, result: std::result::Result<T, QueryError>) -> Result<T> {
    result.inspect_err(|error| warn!(operation, %error, "rejected query metadata mutation"))
}

/// Clauses of a single query under construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryMetadata<E = Expr> {
    flags: Vec<QueryFlag<E>>,
    group_by: Vec<E>,
    having: Option<E>,
    joins: JoinRegistry<E>,
    modifiers: QueryModifiers,
    order_by: Vec<OrderSpecifier<E>>,
    params: ParamRegistry,
    projection: Vec<E>,
    #[serde(rename = "where")]
    where_clause: Option<E>,
    distinct: bool,
    unique: bool,
}

impl<E> Default for QueryMetadata<E> {
    fn default() -> Self {
        Self {
            flags: Vec::new(),
            group_by: Vec::new(),
            having: None,
            joins: JoinRegistry::new(),
            modifiers: QueryModifiers::default(),
            order_by: Vec::new(),
            params: ParamRegistry::new(),
            projection: Vec::new(),
            where_clause: None,
            distinct: false,
            unique: false,
        }
    }
}

impl QueryMetadata<Expr> {
    /// Creates empty metadata over the stock expression type.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<E> QueryMetadata<E> {
    /// Returns the query-level flags in insertion order.
    #[must_use]
    pub fn flags(&self) -> &[QueryFlag<E>] {
        &self.flags
    }

    /// Returns the GROUP BY expressions in insertion order.
    #[must_use]
    pub fn group_by(&self) -> &[E] {
        &self.group_by
    }

    /// Returns the HAVING predicate.
    #[must_use]
    pub const fn having(&self) -> Option<&E> {
        self.having.as_ref()
    }

    /// Returns the joins in insertion order.
    #[must_use]
    pub const fn joins(&self) -> &JoinRegistry<E> {
        &self.joins
    }

    /// Returns the join with the given id.
    #[must_use]
    pub fn join(&self, id: JoinId) -> Option<&JoinExpression<E>> {
        self.joins.get(id)
    }

    /// Returns the current (last added) join.
    #[must_use]
    pub fn current_join(&self) -> Option<&JoinExpression<E>> {
        self.joins.current()
    }

    /// Returns the limit/offset pair.
    #[must_use]
    pub const fn modifiers(&self) -> QueryModifiers {
        self.modifiers
    }

    /// Returns the ORDER BY entries in insertion order.
    #[must_use]
    pub fn order_by(&self) -> &[OrderSpecifier<E>] {
        &self.order_by
    }

    /// Returns the bound parameters.
    #[must_use]
    pub const fn params(&self) -> &ParamRegistry {
        &self.params
    }

    /// Returns the projection in insertion order.
    #[must_use]
    pub fn projection(&self) -> &[E] {
        &self.projection
    }

    /// Returns the WHERE predicate.
    #[must_use]
    pub const fn where_clause(&self) -> Option<&E> {
        self.where_clause.as_ref()
    }

    /// Returns `true` if DISTINCT was requested.
    #[must_use]
    pub const fn is_distinct(&self) -> bool {
        self.distinct
    }

    /// Returns `true` if a unique result was requested.
    #[must_use]
    pub const fn is_unique(&self) -> bool {
        self.unique
    }

    /// Sets the DISTINCT toggle.
    pub fn set_distinct(&mut self, distinct: bool) {
        trace!(distinct, "set distinct");
        self.distinct = distinct;
    }

    /// Sets the unique-result toggle.
    pub fn set_unique(&mut self, unique: bool) {
        trace!(unique, "set unique");
        self.unique = unique;
    }

    /// Replaces the limit/offset pair.
    pub fn set_modifiers(&mut self, modifiers: QueryModifiers) {
        debug!(%modifiers, "set modifiers");
        self.modifiers = modifiers;
    }

    /// Replaces the limit and keeps the offset.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidArgument`] if `limit` is negative; the
    /// modifiers are left unchanged.
    pub fn set_limit(&mut self, limit: i64) -> Result<()> {
        let modifiers = logged("set_limit", self.modifiers.with_limit(limit))?;
        self.set_modifiers(modifiers);
        Ok(())
    }

    /// Replaces the offset and keeps the limit.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidArgument`] if `offset` is negative; the
    /// modifiers are left unchanged.
    pub fn set_offset(&mut self, offset: i64) -> Result<()> {
        let modifiers = logged("set_offset", self.modifiers.with_offset(offset))?;
        self.set_modifiers(modifiers);
        Ok(())
    }

    /// Binds a value to a parameter explicitly.
    pub fn set_param(&mut self, key: ParamKey, value: SqlValue) {
        trace!(%key, "bound parameter");
        self.params.bind(key, value);
    }

    /// Resets the WHERE predicate to absent.
    pub fn clear_where(&mut self) {
        self.where_clause = None;
    }

    /// Removes every ORDER BY entry.
    pub fn clear_order_by(&mut self) {
        self.order_by.clear();
    }

    /// Removes every projection entry.
    pub fn clear_projection(&mut self) {
        self.projection.clear();
    }
}

impl<E: PartialEq> QueryMetadata<E> {
    /// Returns `true` if an equal flag has been added.
    #[must_use]
    pub fn has_flag(&self, flag: &QueryFlag<E>) -> bool {
        self.flags.contains(flag)
    }
}

impl<E: Expression> QueryMetadata<E> {
    /// Creates empty metadata.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    fn register(&mut self, bindings: Vec<(ParamKey, SqlValue)>) {
        self.params.extend(bindings);
    }

    /// Appends a query-level flag. Flags at the same position are kept
    /// side by side.
    pub fn add_flag(&mut self, flag: QueryFlag<E>) {
        trace!(position = ?flag.position, "added flag");
        self.register(flag.payload.bound_params());
        self.flags.push(flag);
    }

    /// Appends GROUP BY expressions in argument order.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidArgument`] if no expression is given or
    /// one of them is missing; nothing is appended.
    pub fn add_group_by<I>(&mut self, expressions: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Into<Option<E>>,
    {
        let expressions = logged("add_group_by", require_all("add_group_by", expressions))?;
        trace!(count = expressions.len(), "added group by");
        for expr in &expressions {
            self.register(expr.bound_params());
        }
        self.group_by.extend(expressions);
        Ok(())
    }

    /// Folds predicates into the HAVING slot by conjunction.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidArgument`] if no predicate is given or
    /// one of them is missing; the slot is left unchanged.
    pub fn add_having<I>(&mut self, predicates: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Into<Option<E>>,
    {
        let predicates = logged("add_having", require_all("add_having", predicates))?;
        trace!(count = predicates.len(), "added having");
        for predicate in &predicates {
            self.register(predicate.bound_params());
        }
        fold_conjunction(&mut self.having, predicates);
        Ok(())
    }

    /// Appends a join and makes it the current join.
    pub fn add_join(&mut self, join_type: JoinType, target: E) -> JoinId {
        let join = JoinExpression::new(join_type, target);
        self.register(join.bound_params());
        let id = self.joins.push(join);
        debug!(%join_type, join = id.index(), "added join");
        id
    }

    /// Folds predicates into the current join's condition by conjunction.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidState`] if no join has been added and
    /// [`QueryError::InvalidArgument`] if no predicate is given or one of
    /// them is missing. Nothing changes on failure.
    pub fn add_join_condition<I>(&mut self, predicates: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Into<Option<E>>,
    {
        logged("add_join_condition", self.current_join_mut()?.add_condition(predicates))
    }

    /// Appends a flag to the current join.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidState`] if no join has been added.
    pub fn add_join_flag(&mut self, flag: JoinFlag<E>) -> Result<()> {
        self.current_join_mut()?.add_flag(flag);
        Ok(())
    }

    /// Returns a mutable handle on the current join.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidState`] if no join has been added.
    pub fn current_join_mut(&mut self) -> Result<JoinMut<'_, E>> {
        let join = logged("current_join_mut", self.joins.current_mut())?;
        Ok(JoinMut {
            join,
            params: &mut self.params,
        })
    }

    /// Returns a mutable handle on the join with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidArgument`] if the id is unknown.
    pub fn join_mut(&mut self, id: JoinId) -> Result<JoinMut<'_, E>> {
        let join = logged("join_mut", self.joins.get_mut(id))?;
        Ok(JoinMut {
            join,
            params: &mut self.params,
        })
    }

    /// Appends ORDER BY entries in argument order.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidArgument`] if no entry is given or one
    /// of them is missing; nothing is appended.
    pub fn add_order_by<I>(&mut self, specifiers: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Into<Option<OrderSpecifier<E>>>,
    {
        let specifiers = logged("add_order_by", require_all("add_order_by", specifiers))?;
        trace!(count = specifiers.len(), "added order by");
        for specifier in &specifiers {
            self.register(specifier.target.bound_params());
        }
        self.order_by.extend(specifiers);
        Ok(())
    }

    /// Appends projection expressions in argument order.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidArgument`] if no expression is given or
    /// one of them is missing; nothing is appended.
    pub fn add_projection<I>(&mut self, expressions: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Into<Option<E>>,
    {
        let expressions = logged("add_projection", require_all("add_projection", expressions))?;
        trace!(count = expressions.len(), "added projection");
        for expr in &expressions {
            self.register(expr.bound_params());
        }
        self.projection.extend(expressions);
        Ok(())
    }

    /// Folds predicates into the WHERE slot by conjunction.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidArgument`] if no predicate is given or
    /// one of them is missing; the slot is left unchanged.
    pub fn add_where<I>(&mut self, predicates: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Into<Option<E>>,
    {
        let predicates = logged("add_where", require_all("add_where", predicates))?;
        trace!(count = predicates.len(), "added where");
        for predicate in &predicates {
            self.register(predicate.bound_params());
        }
        fold_conjunction(&mut self.where_clause, predicates);
        Ok(())
    }
}

/// Mutable access to one join of a [`QueryMetadata`].
///
/// Parameters bound in conditions and flags added through the handle are
/// registered with the metadata.
#[derive(Debug)]
pub struct JoinMut<'a, E> {
    join: &'a mut JoinExpression<E>,
    params: &'a mut ParamRegistry,
}

impl<E: Expression> JoinMut<'_, E> {
    /// Returns the join.
    #[must_use]
    pub fn get(&self) -> &JoinExpression<E> {
        self.join
    }

    /// Appends a flag to this join.
    pub fn add_flag(&mut self, flag: JoinFlag<E>) {
        trace!(position = ?flag.position, "added join flag");
        self.params.extend(flag.payload.bound_params());
        self.join.add_flag(flag);
    }

    /// Folds predicates into this join's condition by conjunction.
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
        let predicates = require_all::<E, _>("add_join_condition", predicates)?;
        trace!(count = predicates.len(), "added join condition");
        for predicate in &predicates {
            self.params.extend(predicate.bound_params());
        }
        self.join.add_condition(predicates)
    }
}

// Snapshots are handed to other threads.
const _: () = {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<QueryMetadata<Expr>>();
};
