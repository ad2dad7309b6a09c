//! # oxide-query-core
//!
//! The query metadata model: the intermediate representation a query DSL
//! fills in clause by clause before handing it to a compiler.
//!
//! This crate provides:
//! - [`QueryMetadata`], the aggregate that accumulates projection, joins,
//!   WHERE/HAVING predicates, GROUP BY, ORDER BY, limit/offset, flags,
//!   toggles and bound parameters
//! - the [`Expression`] capability it stores values through, with [`Expr`]
//!   as the stock implementation
//! - a structural [`codec`] whose only contract is round-trip equality
//!
//! ## Folding predicates
//!
//! Successive WHERE (and HAVING, and join condition) predicates fold into a
//! single left-leaning conjunction:
//!
//! ```rust
//! use oxide_query_core::{QueryMetadata, path};
//!
//! let mut metadata = QueryMetadata::new();
//! metadata.add_where([path("a").is_null()])?;
//! metadata.add_where([path("b").is_null(), path("c").is_null()])?;
//!
//! let expected = path("a").is_null().and(path("b").is_null()).and(path("c").is_null());
//! assert_eq!(metadata.where_clause(), Some(&expected));
//! # Ok::<(), oxide_query_core::QueryError>(())
//! ```
//!
//! ## Snapshots
//!
//! Cloning yields an independent copy; persisting it is a derived,
//! compile-time capability:
//!
//! ```rust
//! use oxide_query_core::{QueryMetadata, codec, path};
//!
//! let mut metadata = QueryMetadata::new();
//! metadata.add_projection([path("id")])?;
//! let snapshot = metadata.clone();
//! metadata.add_projection([path("name")])?;
//!
//! assert_eq!(snapshot.projection().len(), 1);
//! assert_eq!(codec::round_trip(&snapshot)?, snapshot);
//! # Ok::<(), oxide_query_core::QueryError>(())
//! ```

pub mod codec;
pub mod error;
pub mod expr;
pub mod flag;
pub mod join;
pub mod metadata;
pub mod modifiers;
pub mod params;
pub mod value;

pub use codec::Persistable;
pub use error::{QueryError, Result};
pub use expr::{Expr, Expression, OrderSpecifier, constant, param, path};
pub use flag::{FlagPosition, JoinFlag, QueryFlag};
pub use join::{JoinExpression, JoinId, JoinType};
pub use metadata::QueryMetadata;
pub use modifiers::QueryModifiers;
pub use params::ParamKey;
pub use value::{SqlValue, ToSqlValue};
