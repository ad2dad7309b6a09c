//! Limit/offset pagination pair.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{QueryError, Result};

/// Limit and offset of a query.
///
/// Immutable once constructed. Partial updates go through
/// [`QueryModifiers::with_limit`] and [`QueryModifiers::with_offset`], which
/// build a new value and leave the other component untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct QueryModifiers {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    limit: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    offset: Option<u64>,
}

fn non_negative(name: &str, value: Option<i64>) -> Result<Option<u64>> {
    value
        .map(|n| {
            u64::try_from(n).map_err(|_| {
                QueryError::invalid_argument(format!("{name} must not be negative, got {n}"))
            })
        })
        .transpose()
}

impl QueryModifiers {
    /// Creates modifiers from an optional limit and offset.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidArgument`] if either component is
    /// negative.
    pub fn new(limit: Option<i64>, offset: Option<i64>) -> Result<Self> {
        Ok(Self {
            limit: non_negative("limit", limit)?,
            offset: non_negative("offset", offset)?,
        })
    }

    /// Modifiers with only a limit.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidArgument`] if `limit` is negative.
    pub fn limit_only(limit: i64) -> Result<Self> {
        Self::new(Some(limit), None)
    }

    /// Modifiers with only an offset.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidArgument`] if `offset` is negative.
    pub fn offset_only(offset: i64) -> Result<Self> {
        Self::new(None, Some(offset))
    }

    /// Returns the limit.
    #[must_use]
    pub const fn limit(&self) -> Option<u64> {
        self.limit
    }

    /// Returns the offset.
    #[must_use]
    pub const fn offset(&self) -> Option<u64> {
        self.offset
    }

    /// Returns a copy with the limit replaced and the offset kept.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidArgument`] if `limit` is negative.
    pub fn with_limit(&self, limit: i64) -> Result<Self> {
        Ok(Self {
            limit: non_negative("limit", Some(limit))?,
            offset: self.offset,
        })
    }

    /// Returns a copy with the offset replaced and the limit kept.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidArgument`] if `offset` is negative.
    pub fn with_offset(&self, offset: i64) -> Result<Self> {
        Ok(Self {
            limit: self.limit,
            offset: non_negative("offset", Some(offset))?,
        })
    }

    /// Returns `true` if either component is set.
    #[must_use]
    pub const fn is_restricting(&self) -> bool {
        self.limit.is_some() || self.offset.is_some()
    }

    /// Applies offset then limit to an in-memory sequence.
    #[must_use]
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = self
            .offset
            .map_or(0, |o| usize::try_from(o).unwrap_or(usize::MAX))
            .min(items.len());
        let rest = &items[start..];
        let len = self
            .limit
            .map_or(rest.len(), |l| usize::try_from(l).unwrap_or(usize::MAX))
            .min(rest.len());
        &rest[..len]
    }
}

impl fmt::Display for QueryModifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.limit, self.offset) {
            (None, None) => write!(f, "unrestricted"),
            (Some(l), None) => write!(f, "limit {l}"),
            (None, Some(o)) => write!(f, "offset {o}"),
            (Some(l), Some(o)) => write!(f, "limit {l} offset {o}"),
        }
    }
}
