//! Out-of-band markers that customize downstream output.
//!
//! A flag pairs an insertion point with a payload. The metadata keeps flags
//! in insertion order and never merges flags that share a position.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::expr::Expression;
use crate::params::ParamKey;
use crate::value::SqlValue;

/// Insertion point of a query-level flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagPosition {
    Start,
    StartOverride,
    AfterSelect,
    AfterProjection,
    BeforeFilters,
    AfterFilters,
    BeforeGroupBy,
    AfterGroupBy,
    BeforeHaving,
    AfterHaving,
    BeforeOrder,
    AfterOrder,
    End,
    With,
}

/// Insertion point of a join-level flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinFlagPosition {
    Start,
    Override,
    #[default]
    BeforeTarget,
    BeforeCondition,
    End,
}

/// Content of a flag: an expression or literal text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagPayload<E> {
    /// An expression handed to the compiler as-is.
    Expr(E),
    /// Literal text.
    Text(String),
}

impl<E: Expression> FlagPayload<E> {
    pub(crate) fn bound_params(&self) -> Vec<(ParamKey, SqlValue)> {
        match self {
            Self::Expr(expr) => expr.bound_params(),
            Self::Text(_) => Vec::new(),
        }
    }
}

impl<E> From<&str> for FlagPayload<E> {
    fn from(text: &str) -> Self {
        Self::Text(String::from(text))
    }
}

impl<E> From<String> for FlagPayload<E> {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl<E: fmt::Display> fmt::Display for FlagPayload<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expr(expr) => write!(f, "{expr}"),
            Self::Text(text) => write!(f, "{text:?}"),
        }
    }
}

/// A query-level flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryFlag<E> {
    /// Where the payload is inserted.
    pub position: FlagPosition,
    /// What is inserted.
    pub payload: FlagPayload<E>,
}

impl<E> QueryFlag<E> {
    /// Creates a flag.
    #[must_use]
    pub fn new(position: FlagPosition, payload: impl Into<FlagPayload<E>>) -> Self {
        Self {
            position,
            payload: payload.into(),
        }
    }

    /// Creates a flag carrying an expression.
    #[must_use]
    pub const fn expr(position: FlagPosition, expr: E) -> Self {
        Self {
            position,
            payload: FlagPayload::Expr(expr),
        }
    }
}

/// A flag attached to a single join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinFlag<E> {
    /// Where the payload is inserted.
    pub position: JoinFlagPosition,
    /// What is inserted.
    pub payload: FlagPayload<E>,
}

impl<E> JoinFlag<E> {
    /// Creates a join flag before the join target.
    #[must_use]
    pub fn new(payload: impl Into<FlagPayload<E>>) -> Self {
        Self::at(JoinFlagPosition::default(), payload)
    }

    /// Creates a join flag at an explicit position.
    #[must_use]
    pub fn at(position: JoinFlagPosition, payload: impl Into<FlagPayload<E>>) -> Self {
        Self {
            position,
            payload: payload.into(),
        }
    }
}
